//! Commits from code hosting, rolled up per repository and day.
//!
//! Commit timestamps are UTC; the day a commit counts toward is its civil
//! date in the configured zone. One record is kept per `repository + date`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::aggregate::{truncate_text, TEXT_LIMIT};
use crate::calendar::{source_date_offset, SourceKind, TimeWindow};
use crate::sync::{
    NaturalKey, Properties, PropertyValue, RawFeed, SyncError, SyncItem, SyncSource,
};

pub struct CodingSource {
    feed: Arc<dyn RawFeed>,
    tz: Tz,
}

struct Commit {
    repository: String,
    date: NaiveDate,
    summary: String,
}

impl CodingSource {
    pub fn new(feed: Arc<dyn RawFeed>, tz: Tz) -> Self {
        Self { feed, tz }
    }

    fn parse_commit(&self, item: &Value) -> Result<Commit, SyncError> {
        let repository = item["repository"]["full_name"]
            .as_str()
            .or_else(|| item["repository"]["name"].as_str())
            .ok_or_else(|| SyncError::transform("commit without repository"))?
            .to_string();
        let raw_date = item["commit"]["author"]["date"]
            .as_str()
            .or_else(|| item["commit"]["committer"]["date"].as_str())
            .ok_or_else(|| SyncError::transform(format!("commit in {repository} has no date")))?;
        let at = DateTime::parse_from_rfc3339(raw_date)
            .map_err(|e| SyncError::transform(format!("bad commit date {raw_date}: {e}")))?
            .with_timezone(&Utc);
        let summary = item["commit"]["message"]
            .as_str()
            .and_then(|m| m.lines().next())
            .unwrap_or_default()
            .to_string();
        Ok(Commit {
            repository,
            date: source_date_offset(SourceKind::CodeHosting, at, self.tz),
            summary,
        })
    }
}

#[async_trait]
impl SyncSource for CodingSource {
    fn name(&self) -> &str {
        "coding"
    }

    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        self.feed.fetch_raw(window).await
    }

    fn transform(&self, raw: Vec<Value>) -> Vec<Result<SyncItem, SyncError>> {
        let mut out = Vec::new();
        let mut days: BTreeMap<(String, NaiveDate), Vec<String>> = BTreeMap::new();
        for item in &raw {
            match self.parse_commit(item) {
                Ok(commit) => days
                    .entry((commit.repository, commit.date))
                    .or_default()
                    .push(commit.summary),
                Err(e) => out.push(Err(e)),
            }
        }

        for ((repository, date), summaries) in days {
            let key = NaturalKey::single("Repository", PropertyValue::Title(repository.clone()))
                .with("Date", PropertyValue::Date(date));
            let messages = truncate_text(&summaries.join("\n"), TEXT_LIMIT);
            let properties = Properties::from([
                ("Repository".to_string(), PropertyValue::Title(repository.clone())),
                ("Date".to_string(), PropertyValue::Date(date)),
                (
                    "Commits".to_string(),
                    PropertyValue::Number(summaries.len() as f64),
                ),
                ("Messages".to_string(), PropertyValue::Text(messages)),
            ]);
            out.push(Ok(SyncItem::record(
                key,
                format!("{repository} {date}"),
                properties,
            )
            .on(date)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticFeed;
    use crate::sync::ItemPayload;
    use serde_json::json;

    fn commit(repo: &str, date: &str, message: &str) -> Value {
        json!({
            "sha": "abc",
            "repository": {"full_name": repo},
            "commit": {"author": {"date": date}, "message": message}
        })
    }

    #[test]
    fn test_commits_roll_up_by_repository_and_civil_day() {
        let source = CodingSource::new(Arc::new(StaticFeed::default()), chrono_tz::America::New_York);
        let items = source.transform(vec![
            commit("me/lifelog", "2024-03-05T02:10:00Z", "Fix week math\n\nDetails"),
            commit("me/lifelog", "2024-03-04T15:00:00Z", "Add recap"),
            commit("me/lifelog", "2024-03-05T16:00:00Z", "Next day"),
            commit("me/dotfiles", "2024-03-04T15:00:00Z", "Tweak"),
        ]);
        let items: Vec<SyncItem> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(items.len(), 3);

        let keys: Vec<String> = items.iter().map(|i| i.natural_key.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "Repository=me/dotfiles, Date=2024-03-04",
                "Repository=me/lifelog, Date=2024-03-04",
                "Repository=me/lifelog, Date=2024-03-05",
            ]
        );

        let ItemPayload::Record { properties } = &items[1].payload else {
            panic!("expected record payload");
        };
        assert_eq!(properties["Commits"], PropertyValue::Number(2.0));
        assert_eq!(
            properties["Messages"],
            PropertyValue::Text("Fix week math\nAdd recap".into())
        );
    }

    #[test]
    fn test_commit_without_date_is_reported() {
        let source = CodingSource::new(Arc::new(StaticFeed::default()), chrono_tz::UTC);
        let items = source.transform(vec![json!({"repository": {"name": "x"}, "commit": {}})]);
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
