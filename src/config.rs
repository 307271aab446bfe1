use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::models::Language;
use crate::render::background::DEFAULT_IMAGE_RELAYS;
use crate::render::capability::BlurSetting;
use crate::retriever::DEFAULT_RELAYS;

const DEFAULT_USER_AGENT: &str = "LumaShare/0.1 (+https://github.com/luma-share/luma-share)";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub relays: Vec<String>,
    pub image_relays: Vec<String>,
    pub template: String,
    pub language: Language,
    /// IANA zone for rendered times; empty means the machine's local zone.
    pub time_zone: String,
    pub blur: BlurSetting,
    pub output_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub settle_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            relays: DEFAULT_RELAYS.iter().map(|s| s.to_string()).collect(),
            image_relays: DEFAULT_IMAGE_RELAYS.iter().map(|s| s.to_string()).collect(),
            template: "image".to_string(),
            language: Language::Auto,
            time_zone: String::new(),
            blur: BlurSetting::Auto,
            output_dir: None,
            timeout_secs: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            settle_delay_ms: 100,
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Missing file means defaults; a present but broken file is an error.
pub fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&contents).map_err(|err| format!("{}: {err}", path.display()))
}

pub fn write_config(path: &Path, config: &AppConfig) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            return Err(err.to_string());
        }
    }
    let contents = serde_json::to_string_pretty(config).map_err(|err| err.to_string())?;
    fs::write(path, contents).map_err(|err| err.to_string())
}
