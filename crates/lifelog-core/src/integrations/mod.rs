//! HTTP adapters for the store and feed ports.
//!
//! Each adapter owns one `reqwest::Client` and an API base URL taken from
//! configuration, so tests can point them at a local mock server. Tokens are
//! passed in by the caller; see [`crate::storage::credentials`].

pub mod github;
pub mod google;
pub mod notion;

use reqwest::Response;
use url::Url;

use crate::error::ConfigError;
use crate::sync::SyncError;

pub use github::GitHubCommitFeed;
pub use google::GoogleCalendarStore;
pub use notion::NotionStore;

/// Parse an API base, making sure relative joins keep its path.
pub(crate) fn parse_base(key: &str, base: &str) -> Result<Url, ConfigError> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        path.extend(segments);
    }
    url
}

/// Turn a non-success response into [`SyncError::Api`].
pub(crate) async fn check(service: &str, response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(SyncError::Api {
        service: service.to_string(),
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = parse_base("google.api_base", "https://example.test/calendar/v3").unwrap();
        let url = endpoint(&base, &["calendars", "en.usa#holiday@group", "events"]);
        assert_eq!(
            url.as_str(),
            "https://example.test/calendar/v3/calendars/en.usa%23holiday@group/events"
        );
    }

    #[test]
    fn test_bad_base_is_a_config_error() {
        assert!(matches!(
            parse_base("notion.api_base", "not a url"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
