use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::Formatter;

pub const DEFAULT_TITLE: &str = "Event";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub event_id: String,
    pub title: String,
    pub raw_start: Option<String>,
    pub raw_end: Option<String>,
    pub formatted_date: String,
    pub formatted_time: String,
    pub image_url: Option<String>,
    pub location: Option<String>,
}

impl EventRecord {
    /// Same record with date and time re-rendered by `formatter`.
    pub fn reformatted(&self, formatter: &Formatter) -> Self {
        Self {
            formatted_date: formatter.format_date(self.raw_start.as_deref()),
            formatted_time: formatter.format_time(self.raw_start.as_deref(), self.raw_end.as_deref()),
            ..self.clone()
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Story,
    Post,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Story, Format::Post];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Story => "story",
            Format::Post => "post",
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Format::Story => (1080, 1920),
            Format::Post => (1080, 1350),
        }
    }

    pub fn file_name(self, event_id: &str) -> String {
        format!("{}-{}.png", self.as_str(), event_id)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundMode {
    Image,
    Gradient,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSpec {
    pub format: Format,
    pub background_mode: BackgroundMode,
    pub overlay_visible: bool,
}

impl RenderSpec {
    pub fn new(format: Format, template: Template, record: &EventRecord) -> Self {
        let background_mode = if template == Template::Image && record.has_image() {
            BackgroundMode::Image
        } else {
            BackgroundMode::Gradient
        };
        Self {
            format,
            background_mode,
            overlay_visible: background_mode == BackgroundMode::Image,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    Image,
    Sunset,
    Ocean,
    Fire,
    Mint,
    Purple,
}

impl Template {
    pub const KEYS: [&'static str; 6] = [
        "image",
        "gradient-sunset",
        "gradient-ocean",
        "gradient-fire",
        "gradient-mint",
        "gradient-purple",
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "image" => Some(Template::Image),
            "gradient-sunset" => Some(Template::Sunset),
            "gradient-ocean" => Some(Template::Ocean),
            "gradient-fire" => Some(Template::Fire),
            "gradient-mint" => Some(Template::Mint),
            "gradient-purple" => Some(Template::Purple),
            _ => None,
        }
    }

    /// Unknown keys fall back to the sunset gradient.
    pub fn resolve(key: &str) -> Self {
        Self::from_key(key).unwrap_or_else(|| {
            tracing::warn!(template = key, "unknown template, using gradient-sunset");
            Template::Sunset
        })
    }

    pub fn key(self) -> &'static str {
        match self {
            Template::Image => "image",
            Template::Sunset => "gradient-sunset",
            Template::Ocean => "gradient-ocean",
            Template::Fire => "gradient-fire",
            Template::Mint => "gradient-mint",
            Template::Purple => "gradient-purple",
        }
    }

    /// Color stops of the 135 degree gradient bound to this template.
    /// `Image` has no gradient of its own and borrows sunset.
    pub fn gradient_stops(self) -> &'static [(f32, [u8; 3])] {
        match self {
            Template::Image | Template::Sunset => &[
                (0.0, [0x66, 0x7e, 0xea]),
                (0.5, [0x76, 0x4b, 0xa2]),
                (1.0, [0xf0, 0x93, 0xfb]),
            ],
            Template::Ocean => &[
                (0.0, [0x0c, 0x0c, 0x0c]),
                (0.5, [0x1a, 0x1a, 0x2e]),
                (1.0, [0x16, 0x21, 0x3e]),
            ],
            Template::Fire => &[(0.0, [0xf1, 0x27, 0x11]), (1.0, [0xf5, 0xaf, 0x19])],
            Template::Mint => &[(0.0, [0x11, 0x99, 0x8e]), (1.0, [0x38, 0xef, 0x7d])],
            Template::Purple => &[(0.0, [0x4a, 0x00, 0xe0]), (1.0, [0x8e, 0x2d, 0xe2])],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Auto,
    Es,
    En,
    Pt,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Language::Auto),
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            "pt" => Ok(Language::Pt),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(image: Option<&str>) -> EventRecord {
        EventRecord {
            event_id: "abc123".into(),
            title: "Launch".into(),
            raw_start: None,
            raw_end: None,
            formatted_date: String::new(),
            formatted_time: String::new(),
            image_url: image.map(str::to_string),
            location: None,
        }
    }

    #[test]
    fn image_template_with_image_uses_image_background() {
        let spec = RenderSpec::new(Format::Story, Template::Image, &record(Some("https://x/y.png")));
        assert_eq!(spec.background_mode, BackgroundMode::Image);
        assert!(spec.overlay_visible);
    }

    #[test]
    fn image_template_without_image_degrades_to_gradient() {
        let spec = RenderSpec::new(Format::Post, Template::Image, &record(None));
        assert_eq!(spec.background_mode, BackgroundMode::Gradient);
        assert!(!spec.overlay_visible);

        let blank = RenderSpec::new(Format::Post, Template::Image, &record(Some("  ")));
        assert_eq!(blank.background_mode, BackgroundMode::Gradient);
    }

    #[test]
    fn gradient_template_ignores_image() {
        let spec = RenderSpec::new(Format::Story, Template::Fire, &record(Some("https://x/y.png")));
        assert_eq!(spec.background_mode, BackgroundMode::Gradient);
        assert!(!spec.overlay_visible);
    }

    #[test]
    fn unknown_template_resolves_to_sunset() {
        assert_eq!(Template::resolve("gradient-neon"), Template::Sunset);
        for key in Template::KEYS {
            assert_eq!(Template::resolve(key).key(), key);
        }
    }

    #[test]
    fn file_names_follow_format_and_id() {
        assert_eq!(Format::Story.file_name("abc123"), "story-abc123.png");
        assert_eq!(Format::Post.file_name("abc123"), "post-abc123.png");
        assert_eq!(Format::Story.dimensions(), (1080, 1920));
        assert_eq!(Format::Post.dimensions(), (1080, 1350));
    }
}
