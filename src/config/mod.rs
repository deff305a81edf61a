use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    coach::{CoachSettings, DEFAULT_ENDPOINT},
    errors::ConfigError,
    utils::atomic_file::write_atomic,
};

pub const HOME_ENV: &str = "ZENITH_HOME";
const DEFAULT_DIR_NAME: &str = ".zenith";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const DATA_DIR: &str = "data";

/// Application directory: `$ZENITH_HOME`, else `~/.zenith`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub tip_max_tokens: u32,
    pub tip_temperature: f32,
    /// Load `name` on startup.
    pub auto_load: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let coach = CoachSettings::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            name: None,
            max_tokens: coach.max_tokens,
            temperature: coach.temperature,
            tip_max_tokens: coach.tip_max_tokens,
            tip_temperature: coach.tip_temperature,
            auto_load: false,
        }
    }
}

impl ModelSettings {
    pub fn coach_settings(&self) -> CoachSettings {
        CoachSettings {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tip_max_tokens: self.tip_max_tokens,
            tip_temperature: self.tip_temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where ledger documents live; `<app dir>/data` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub model: ModelSettings,
}

impl Config {
    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| base.join(DATA_DIR))
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let config_root = base.join(CONFIG_DIR);
        fs::create_dir_all(&config_root)?;
        Ok(Self {
            path: config_root.join(CONFIG_FILE),
            base,
        })
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn data_dir(&self, config: &Config) -> PathBuf {
        config.resolve_data_dir(&self.base)
    }
}
