use serde::{Deserialize, Serialize};

/// Whether the blur filter can be applied on this platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurCapability {
    SupportsBlur,
    NoBlurFallback,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlurSetting {
    #[default]
    Auto,
    On,
    Off,
}

impl BlurCapability {
    /// Decided once at startup and handed to the renderer.
    pub fn detect(setting: BlurSetting) -> Self {
        match setting {
            BlurSetting::On => BlurCapability::SupportsBlur,
            BlurSetting::Off => BlurCapability::NoBlurFallback,
            BlurSetting::Auto => Self::for_platform(std::env::consts::OS),
        }
    }

    pub fn for_platform(os: &str) -> Self {
        match os {
            "ios" => BlurCapability::NoBlurFallback,
            _ => BlurCapability::SupportsBlur,
        }
    }
}
