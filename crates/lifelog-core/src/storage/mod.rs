mod config;
pub mod credentials;

pub use config::{ApiConfig, Config, GitHubConfig, SyncConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/lifelog[-dev]/` based on LIFELOG_ENV.
///
/// Set LIFELOG_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LIFELOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lifelog-dev")
    } else {
        base_dir.join("lifelog")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
