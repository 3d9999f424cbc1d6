//! Google Calendar adapter — read-only event listing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use omnichat_core::adapter::{
    int_arg, AdapterDescriptor, AdapterError, OperationSpec, ParamSpec, ToolAdapter,
};
use omnichat_core::config::GoogleConfig;

use crate::auth::bearer_token;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Event {
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: EventTime,
    end: EventTime,
}

/// Timed events carry `dateTime`; all-day events carry `date`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<String>,
    date: Option<String>,
}

// ─────────────────────────────────────────────
// CalendarAdapter
// ─────────────────────────────────────────────

/// Handles Google Calendar API interactions.
#[derive(Debug)]
pub struct CalendarAdapter {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl CalendarAdapter {
    pub const NAME: &'static str = "google_calendar";

    /// Static metadata used for catalog seeding.
    pub fn descriptor() -> AdapterDescriptor {
        AdapterDescriptor {
            name: Self::NAME.into(),
            kind: "CalendarAdapter".into(),
            description: "Google Calendar integration for managing events".into(),
            operations: vec![OperationSpec::new(
                "list_events",
                "List upcoming events from Google Calendar",
            )
            .with_example(json!({"days": 7}))
            .with_params(vec![ParamSpec::optional("days", json!(7))])],
        }
    }

    /// Construct from stored credentials. Fails with a credentials error
    /// when no token is available.
    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        let token = bearer_token(config)?;
        let api_base = config
            .calendar_api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Ok(CalendarAdapter {
            client: reqwest::Client::new(),
            api_base,
            token,
        })
    }

    /// List upcoming events on the primary calendar over the next `days`.
    async fn list_events(&self, days: i64) -> Result<Value> {
        let now = Utc::now();
        let end = now + Duration::days(days);
        let url = format!(
            "{}/calendars/primary/events",
            self.api_base.trim_end_matches('/')
        );

        debug!(days, "listing calendar events");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", now.to_rfc3339()),
                ("timeMax", end.to_rfc3339()),
                ("singleEvents", "true".into()),
                ("orderBy", "startTime".into()),
            ])
            .send()
            .await
            .map_err(|e| AdapterError::Api(format!("calendar request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api(format!(
                "calendar API returned {status}: {body}"
            ))
            .into());
        }

        let events: EventsResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Api(format!("invalid calendar response: {e}")))?;

        let formatted: Vec<Value> = events.items.iter().map(format_event).collect();
        Ok(Value::Array(formatted))
    }
}

/// Flatten an API event into the fields the model needs.
fn format_event(event: &Event) -> Value {
    let (start, end) = match (&event.start.date_time, &event.end.date_time) {
        (Some(start), Some(end)) => (start.clone(), end.clone()),
        _ => {
            // All-day event: the API end date is exclusive, so surface the
            // last day the event actually covers.
            let start = event.start.date.clone().unwrap_or_default();
            let end = event
                .end
                .date
                .as_deref()
                .and_then(inclusive_end_date)
                .or_else(|| event.end.date.clone())
                .unwrap_or_default();
            (start, end)
        }
    };

    json!({
        "title": event.summary.clone().unwrap_or_else(|| "(No title)".into()),
        "start": start,
        "end": end,
        "description": event.description.clone().unwrap_or_default(),
        "location": event.location.clone().unwrap_or_default(),
    })
}

fn inclusive_end_date(exclusive: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(exclusive, "%Y-%m-%d").ok()?;
    Some((date - Duration::days(1)).format("%Y-%m-%d").to_string())
}

#[async_trait]
impl ToolAdapter for CalendarAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Google Calendar integration for managing events"
    }

    fn operations(&self) -> Vec<OperationSpec> {
        Self::descriptor().operations
    }

    async fn invoke(&self, operation: &str, args: Map<String, Value>) -> Result<Value> {
        match operation {
            "list_events" => {
                let days = int_arg(&args, "days")?;
                self.list_events(days).await
            }
            other => Err(AdapterError::InvalidArgument(format!(
                "unknown operation: {other}"
            ))
            .into()),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
