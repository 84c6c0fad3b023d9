//! Notion-style database API as a [`DestinationStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde_json::{json, Map, Value};
use url::Url;

use super::{check, endpoint, parse_base};
use crate::error::ConfigError;
use crate::sync::{DestinationStore, Filter, Properties, PropertyValue, Record, SyncError};

const NOTION_VERSION: &str = "2022-06-28";
const SERVICE: &str = "notion";
const PAGE_SIZE: u32 = 100;

pub struct NotionStore {
    client: Client,
    token: String,
    api_base: Url,
}

impl NotionStore {
    pub fn new(token: impl Into<String>, api_base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Client::new(),
            token: token.into(),
            api_base: parse_base("notion.api_base", api_base)?,
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send_json(&self, builder: reqwest::RequestBuilder) -> Result<Value, SyncError> {
        let response = check(SERVICE, builder.send().await?).await?;
        Ok(response.json().await?)
    }
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Encode one property in the API's shape.
pub fn property_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Title(s) => json!({ "title": rich_text(s) }),
        PropertyValue::Text(s) => json!({ "rich_text": rich_text(s) }),
        PropertyValue::Number(n) => json!({ "number": n }),
        PropertyValue::Date(d) => json!({ "date": { "start": d.to_string() } }),
        PropertyValue::DateRange { start, end } => {
            json!({ "date": { "start": start.to_string(), "end": end.to_string() } })
        }
        PropertyValue::DateTime(dt) => json!({ "date": { "start": dt.to_rfc3339() } }),
        PropertyValue::Select(s) => json!({ "select": { "name": s } }),
        PropertyValue::Checkbox(b) => json!({ "checkbox": b }),
        PropertyValue::Relation(ids) => {
            let ids: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
            json!({ "relation": ids })
        }
    }
}

pub fn properties_to_json(properties: &Properties) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .map(|(name, value)| (name.clone(), property_to_json(value)))
        .collect();
    Value::Object(map)
}

fn plain_text(parts: &Value) -> String {
    parts
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["plain_text"].as_str().or_else(|| p["text"]["content"].as_str()))
                .collect()
        })
        .unwrap_or_default()
}

fn date_value(date: &Value) -> Option<PropertyValue> {
    let start = date["start"].as_str()?;
    if start.len() > 10 {
        return DateTime::parse_from_rfc3339(start)
            .ok()
            .map(PropertyValue::DateTime);
    }
    let start: NaiveDate = start.parse().ok()?;
    match date["end"].as_str().and_then(|e| e.get(..10)?.parse::<NaiveDate>().ok()) {
        Some(end) => Some(PropertyValue::DateRange { start, end }),
        None => Some(PropertyValue::Date(start)),
    }
}

/// Decode one property. Unsupported or empty properties yield `None`.
pub fn property_from_json(value: &Value) -> Option<PropertyValue> {
    match value["type"].as_str()? {
        "title" => Some(PropertyValue::Title(plain_text(&value["title"]))),
        "rich_text" => Some(PropertyValue::Text(plain_text(&value["rich_text"]))),
        "number" => value["number"].as_f64().map(PropertyValue::Number),
        "date" => date_value(&value["date"]),
        "select" => value["select"]["name"]
            .as_str()
            .map(|s| PropertyValue::Select(s.to_string())),
        "checkbox" => value["checkbox"].as_bool().map(PropertyValue::Checkbox),
        "relation" => Some(PropertyValue::Relation(
            value["relation"]
                .as_array()
                .map(|ids| {
                    ids.iter()
                        .filter_map(|r| r["id"].as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        )),
        _ => None,
    }
}

pub fn record_from_json(page: &Value) -> Result<Record, SyncError> {
    let id = page["id"]
        .as_str()
        .ok_or_else(|| SyncError::transform("page without id"))?
        .to_string();
    let properties = page["properties"]
        .as_object()
        .map(|props| {
            props
                .iter()
                .filter_map(|(name, v)| property_from_json(v).map(|p| (name.clone(), p)))
                .collect()
        })
        .unwrap_or_default();
    Ok(Record { id, properties })
}

fn equals_clause(property: &str, value: &PropertyValue) -> Vec<Value> {
    let mut clause = match value {
        PropertyValue::Title(s) => json!({ "title": { "equals": s } }),
        PropertyValue::Text(s) => json!({ "rich_text": { "equals": s } }),
        PropertyValue::Number(n) => json!({ "number": { "equals": n } }),
        PropertyValue::Date(d) => json!({ "date": { "equals": d.to_string() } }),
        PropertyValue::DateTime(dt) => json!({ "date": { "equals": dt.to_rfc3339() } }),
        PropertyValue::Select(s) => json!({ "select": { "equals": s } }),
        PropertyValue::Checkbox(b) => json!({ "checkbox": { "equals": b } }),
        PropertyValue::Relation(ids) => {
            return ids
                .iter()
                .map(|id| json!({ "property": property, "relation": { "contains": id } }))
                .collect();
        }
        PropertyValue::DateRange { start, end } => {
            return date_range_clauses(property, start, end);
        }
    };
    clause["property"] = json!(property);
    vec![clause]
}

fn date_range_clauses(property: &str, start: &NaiveDate, end: &NaiveDate) -> Vec<Value> {
    vec![
        json!({ "property": property, "date": { "on_or_after": start.to_string() } }),
        json!({ "property": property, "date": { "on_or_before": end.to_string() } }),
    ]
}

fn clauses(filter: &Filter) -> Vec<Value> {
    match filter {
        Filter::And { filters } => filters.iter().flat_map(clauses).collect(),
        Filter::Equals { property, value } => equals_clause(property, value),
        Filter::DateRange {
            property,
            start,
            end,
        } => date_range_clauses(property, start, end),
    }
}

/// Translate a filter tree into the API's compound filter.
pub fn filter_to_json(filter: &Filter) -> Value {
    let mut clauses = clauses(filter);
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        json!({ "and": clauses })
    }
}

#[async_trait]
impl DestinationStore for NotionStore {
    async fn query(&self, collection_id: &str, filter: &Filter) -> Result<Vec<Record>, SyncError> {
        let url = endpoint(&self.api_base, &["v1", "databases", collection_id, "query"]);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({
                "filter": filter_to_json(filter),
                "page_size": PAGE_SIZE,
            });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let resp = self
                .send_json(self.request(reqwest::Method::POST, url.clone()).json(&body))
                .await?;

            if let Some(results) = resp["results"].as_array() {
                for page in results {
                    records.push(record_from_json(page)?);
                }
            }

            cursor = resp["next_cursor"].as_str().map(|s| s.to_string());
            if !resp["has_more"].as_bool().unwrap_or(false) || cursor.is_none() {
                break;
            }
        }

        Ok(records)
    }

    async fn create(
        &self,
        collection_id: &str,
        properties: Properties,
    ) -> Result<Record, SyncError> {
        let url = endpoint(&self.api_base, &["v1", "pages"]);
        let body = json!({
            "parent": { "database_id": collection_id },
            "properties": properties_to_json(&properties),
        });
        let resp = self
            .send_json(self.request(reqwest::Method::POST, url).json(&body))
            .await?;
        record_from_json(&resp)
    }

    async fn update(&self, record_id: &str, properties: Properties) -> Result<Record, SyncError> {
        let url = endpoint(&self.api_base, &["v1", "pages", record_id]);
        let body = json!({ "properties": properties_to_json(&properties) });
        let resp = self
            .send_json(self.request(reqwest::Method::PATCH, url).json(&body))
            .await?;
        record_from_json(&resp)
    }

    async fn retrieve(&self, record_id: &str) -> Result<Record, SyncError> {
        let url = endpoint(&self.api_base, &["v1", "pages", record_id]);
        let resp = self
            .send_json(self.request(reqwest::Method::GET, url))
            .await?;
        record_from_json(&resp)
    }
}
