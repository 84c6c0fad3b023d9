//! API tokens: environment first, then the OS keyring.
//!
//! `notion_token` is read from `LIFELOG_NOTION_TOKEN` when set, otherwise
//! from the keyring entry `lifelog/notion_token`.

use crate::error::ConfigError;

const SERVICE: &str = "lifelog";

/// Token names the CLI knows how to use.
pub const KNOWN: [&str; 3] = ["notion_token", "google_token", "github_token"];

/// Environment variable consulted for `name`.
pub fn env_var(name: &str) -> String {
    format!("LIFELOG_{}", name.to_ascii_uppercase())
}

pub fn get(name: &str) -> Result<Option<String>, ConfigError> {
    if let Ok(value) = std::env::var(env_var(name)) {
        if !value.is_empty() {
            return Ok(Some(value));
        }
    }
    let entry = keyring::Entry::new(SERVICE, name)?;
    match entry.get_password() {
        Ok(pw) => Ok(Some(pw)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Like [`get`], but a missing token is [`ConfigError::MissingKey`].
pub fn require(name: &str) -> Result<String, ConfigError> {
    get(name)?.ok_or_else(|| ConfigError::MissingKey(env_var(name)))
}

pub fn set(name: &str, value: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(SERVICE, name)?;
    entry.set_password(value)?;
    Ok(())
}

pub fn delete(name: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(SERVICE, name)?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_names() {
        assert_eq!(env_var("notion_token"), "LIFELOG_NOTION_TOKEN");
    }

    #[test]
    fn environment_wins() {
        std::env::set_var("LIFELOG_TEST_ONLY_TOKEN", "from-env");
        assert_eq!(get("test_only_token").unwrap().as_deref(), Some("from-env"));
        std::env::remove_var("LIFELOG_TEST_ONLY_TOKEN");
    }
}
