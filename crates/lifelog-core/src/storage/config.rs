//! TOML-based application configuration.
//!
//! Holds everything a run needs besides credentials:
//! - Timezone and the late-wake threshold
//! - Sync pacing and fetch padding
//! - Collection and calendar aliases used by the registry
//! - API bases for the HTTP adapters
//!
//! Configuration is stored at `~/.config/lifelog/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::data_dir;
use crate::error::ConfigError;
use crate::registry::Registry;
use crate::sync::Backoff;

/// Top-level keys whose children are free-form aliases.
const ALIAS_SECTIONS: [&str; 2] = ["collections", "calendars"];

/// Sync pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause before every external call, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Days added on both sides of a window when fetching.
    #[serde(default = "default_padding_days")]
    pub fetch_padding_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_base")]
    pub api_base: String,
    /// Login whose commits are searched.
    #[serde(default)]
    pub author: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/lifelog/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// IANA zone used for civil dates.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_late_wake_threshold")]
    pub late_wake_threshold_hour: u32,
    /// Registry file replacing the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<PathBuf>,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Collection alias -> collection id.
    #[serde(default)]
    pub collections: BTreeMap<String, String>,
    /// Calendar alias -> calendar id.
    #[serde(default)]
    pub calendars: BTreeMap<String, String>,
    #[serde(default = "default_notion")]
    pub notion: ApiConfig,
    #[serde(default = "default_google")]
    pub google: ApiConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

// Default functions
fn default_timezone() -> String {
    "UTC".into()
}
fn default_late_wake_threshold() -> u32 {
    9
}
fn default_delay_ms() -> u64 {
    350
}
fn default_padding_days() -> i64 {
    1
}
fn default_github_base() -> String {
    "https://api.github.com".into()
}
fn default_notion() -> ApiConfig {
    ApiConfig {
        api_base: "https://api.notion.com".into(),
    }
}
fn default_google() -> ApiConfig {
    ApiConfig {
        api_base: "https://www.googleapis.com/calendar/v3".into(),
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            fetch_padding_days: default_padding_days(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_base(),
            author: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            late_wake_threshold_hour: default_late_wake_threshold(),
            registry_path: None,
            sync: SyncConfig::default(),
            collections: BTreeMap::new(),
            calendars: BTreeMap::new(),
            notion: default_notion(),
            google: default_google(),
            github: GitHubConfig::default(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(invalid(key, "config key is empty"));
        }
        let open = ALIAS_SECTIONS.iter().any(|s| key.starts_with(&format!("{s}.")))
            || key == "registry_path";

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid(key, "unknown config key"))?;

                let new_value = match obj.get(part) {
                    Some(Value::Bool(_)) => Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(key, e.to_string()))?,
                    ),
                    Some(Value::Number(_)) => {
                        if let Ok(n) = value.parse::<i64>() {
                            Value::Number(n.into())
                        } else {
                            return Err(invalid(key, format!("cannot parse '{value}' as number")));
                        }
                    }
                    Some(Value::Object(_)) | Some(Value::Array(_)) => {
                        serde_json::from_str(value).map_err(|e| invalid(key, e.to_string()))?
                    }
                    Some(_) => Value::String(value.into()),
                    None if open => Value::String(value.into()),
                    None => return Err(invalid(key, "unknown config key")),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| invalid(key, "unknown config key"))?;
        }

        Err(invalid(key, "unknown config key"))
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Alias sections accept new keys; any other
    /// unknown key is rejected. The caller decides when to save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(key, e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Value of `key`, or [`ConfigError::MissingKey`] when unset or empty.
    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .filter(|v| !v.is_empty() && v != "null")
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn collection(&self, alias: &str) -> Result<&str, ConfigError> {
        self.collections
            .get(alias)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigError::MissingKey(format!("collections.{alias}")))
    }

    pub fn calendar(&self, alias: &str) -> Result<&str, ConfigError> {
        self.calendars
            .get(alias)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigError::MissingKey(format!("calendars.{alias}")))
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| invalid("timezone", e.to_string()))
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::from_millis(self.sync.delay_ms)
    }

    /// The configured registry file, or the built-in registry.
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        match &self.registry_path {
            Some(path) => Registry::load(path),
            None => Registry::builtin(),
        }
    }

    /// Check values that serde alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        if self.late_wake_threshold_hour > 23 {
            return Err(invalid(
                "late_wake_threshold_hour",
                format!("{} is not an hour of the day", self.late_wake_threshold_hour),
            ));
        }
        if self.sync.fetch_padding_days < 0 {
            return Err(invalid("sync.fetch_padding_days", "must not be negative"));
        }
        Ok(())
    }
}
