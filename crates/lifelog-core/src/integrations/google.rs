//! Google-Calendar-style events API as a [`CalendarStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use super::{check, endpoint, parse_base};
use crate::calendar::{CalendarEvent, CalendarEventPayload, EventTime, TimeWindow};
use crate::error::ConfigError;
use crate::sync::{CalendarStore, SyncError};

const SERVICE: &str = "google";

pub struct GoogleCalendarStore {
    client: Client,
    token: String,
    api_base: Url,
}

impl GoogleCalendarStore {
    pub fn new(token: impl Into<String>, api_base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Client::new(),
            token: token.into(),
            api_base: parse_base("google.api_base", api_base)?,
        })
    }
}

fn time_to_json(time: &EventTime) -> Value {
    match time {
        EventTime::Date(d) => json!({ "date": d.to_string() }),
        EventTime::DateTime(dt) => json!({ "dateTime": dt.to_rfc3339() }),
    }
}

fn time_from_json(value: &Value) -> Option<EventTime> {
    if let Some(dt) = value["dateTime"].as_str() {
        return DateTime::parse_from_rfc3339(dt).ok().map(EventTime::DateTime);
    }
    value["date"]
        .as_str()
        .and_then(|d| d.parse::<NaiveDate>().ok())
        .map(EventTime::Date)
}

/// Request body for an event insert.
pub fn event_to_json(payload: &CalendarEventPayload) -> Value {
    let mut body = json!({
        "summary": payload.summary,
        "description": payload.description,
        "start": time_to_json(&payload.start),
        "end": time_to_json(&payload.end),
    });
    if let Some(color) = &payload.color_id {
        body["colorId"] = json!(color);
    }
    if !payload.private.is_empty() {
        body["extendedProperties"] = json!({ "private": payload.private });
    }
    body
}

/// Decode a listed event; cancelled or malformed entries yield `None`.
pub fn event_from_json(item: &Value) -> Option<CalendarEvent> {
    if item["status"].as_str() == Some("cancelled") {
        return None;
    }
    let private: BTreeMap<String, String> = item["extendedProperties"]["private"]
        .as_object()
        .map(|props| {
            props
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();
    Some(CalendarEvent {
        id: item["id"].as_str()?.to_string(),
        summary: item["summary"].as_str().unwrap_or_default().to_string(),
        description: item["description"].as_str().unwrap_or_default().to_string(),
        start: time_from_json(&item["start"])?,
        end: time_from_json(&item["end"])?,
        color_id: item["colorId"].as_str().map(str::to_string),
        private,
    })
}

#[async_trait]
impl CalendarStore for GoogleCalendarStore {
    async fn create_event(
        &self,
        calendar_id: &str,
        payload: &CalendarEventPayload,
    ) -> Result<CalendarEvent, SyncError> {
        let url = endpoint(&self.api_base, &["calendars", calendar_id, "events"]);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&event_to_json(payload))
            .send()
            .await?;
        let created: Value = check(SERVICE, response).await?.json().await?;
        event_from_json(&created)
            .ok_or_else(|| SyncError::transform("created event missing id or times"))
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<CalendarEvent>, SyncError> {
        let url = endpoint(&self.api_base, &["calendars", calendar_id, "events"]);
        let time_min = format!("{}T00:00:00Z", window.start);
        let time_max = format!("{}T00:00:00Z", window.exclusive_end());

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(url.clone()).bearer_auth(&self.token).query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "250"),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let resp: Value = check(SERVICE, request.send().await?).await?.json().await?;

            if let Some(items) = resp["items"].as_array() {
                events.extend(items.iter().filter_map(event_from_json));
            }

            page_token = resp["nextPageToken"].as_str().map(|s| s.to_string());
            if page_token.is_none() {
                break;
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_all_day_payload_encoding() {
        let payload = CalendarEventPayload::all_day("Week 10 recap", date(3), date(9))
            .with_color("5")
            .with_private("lifelog_key", "Title=Week 10 2024");
        let body = event_to_json(&payload);
        assert_eq!(body["start"], json!({ "date": "2024-03-03" }));
        assert_eq!(body["end"], json!({ "date": "2024-03-10" }));
        assert_eq!(body["colorId"], "5");
        assert_eq!(
            body["extendedProperties"]["private"]["lifelog_key"],
            "Title=Week 10 2024"
        );
    }

    #[test]
    fn test_event_decoding() {
        let event = event_from_json(&json!({
            "id": "e1",
            "summary": "Dinner",
            "colorId": "11",
            "start": { "dateTime": "2024-03-04T20:00:00-05:00" },
            "end": { "dateTime": "2024-03-04T21:30:00-05:00" }
        }))
        .unwrap();
        assert_eq!(event.color_id.as_deref(), Some("11"));
        assert_eq!(event.duration_hours(), Some(1.5));
        assert!(event_from_json(&json!({ "id": "e2", "status": "cancelled" })).is_none());
    }

    #[tokio::test]
    async fn test_list_follows_page_tokens() {
        let mut server = mockito::Server::new_async().await;
        let events_path = || Matcher::Regex(r"^/calendars/cal1/events".to_string());
        // The follow-up request is registered first so it wins when both match.
        let second = server
            .mock("GET", events_path())
            .match_query(Matcher::UrlEncoded("pageToken".into(), "t2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "items": [{ "id": "e2", "start": { "date": "2024-03-06" }, "end": { "date": "2024-03-07" } }]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let first = server
            .mock("GET", events_path())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("timeMin".into(), "2024-03-03T00:00:00Z".into()),
                Matcher::UrlEncoded("timeMax".into(), "2024-03-10T00:00:00Z".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "items": [{ "id": "e1", "start": { "date": "2024-03-04" }, "end": { "date": "2024-03-05" } }],
                    "nextPageToken": "t2"
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let store = GoogleCalendarStore::new("token", &server.url()).unwrap();
        let window = TimeWindow::new(date(3), date(9)).unwrap();
        let events = store.list_events("cal1", &window).await.unwrap();

        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_event_returns_listed_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calendars/cal1/events")
            .match_header("authorization", "Bearer token")
            .match_body(Matcher::PartialJson(json!({ "summary": "Run" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "new",
                    "summary": "Run",
                    "start": { "date": "2024-03-04" },
                    "end": { "date": "2024-03-05" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = GoogleCalendarStore::new("token", &server.url()).unwrap();
        let payload = CalendarEventPayload::all_day("Run", date(4), date(4));
        let created = store.create_event("cal1", &payload).await.unwrap();
        assert_eq!(created.id, "new");
        assert!(created.is_all_day());
        mock.assert_async().await;
    }
}
