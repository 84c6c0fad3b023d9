//! Commit search as a [`RawFeed`] for the coding source.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{check, endpoint, parse_base};
use crate::calendar::TimeWindow;
use crate::error::ConfigError;
use crate::sync::{RawFeed, SyncError};

const SERVICE: &str = "github";
const PER_PAGE: usize = 100;
/// The search API never returns more than this many results per query.
const SEARCH_CAP: usize = 1000;

pub struct GitHubCommitFeed {
    client: Client,
    token: Option<String>,
    author: String,
    api_base: Url,
}

impl GitHubCommitFeed {
    pub fn new(
        author: impl Into<String>,
        token: Option<String>,
        api_base: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Client::new(),
            token,
            author: author.into(),
            api_base: parse_base("github.api_base", api_base)?,
        })
    }

    fn search_query(&self, window: &TimeWindow) -> String {
        format!(
            "author:{} author-date:{}..{}",
            self.author, window.start, window.end
        )
    }
}

#[async_trait]
impl RawFeed for GitHubCommitFeed {
    async fn fetch_raw(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        let url = endpoint(&self.api_base, &["search", "commits"]);
        let q = self.search_query(window);
        let per_page = PER_PAGE.to_string();

        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let page_param = page.to_string();
            let mut request = self
                .client
                .get(url.clone())
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "lifelog")
                .query(&[
                    ("q", q.as_str()),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ]);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let resp: Value = check(SERVICE, request.send().await?).await?.json().await?;
            let batch = resp["items"].as_array().cloned().unwrap_or_default();
            let total = resp["total_count"]
                .as_u64()
                .map(|n| n as usize)
                .unwrap_or(0);
            let short = batch.len() < PER_PAGE;
            items.extend(batch);

            if short || items.len() >= total || items.len() >= SEARCH_CAP {
                break;
            }
            page += 1;
        }

        debug!(author = %self.author, count = items.len(), "fetched commits");
        Ok(items)
    }
}
