use crate::error::{Error, Result};
use anyhow::Context as _;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// A created meeting event as reported by the calendar gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub event_id: String,
    pub join_link: String,
}

/// Client for the calendar gateway. A timeout or error here is the gateway's
/// failure mode, never the request's: a confirmed interview stays confirmed
/// and the event can be re-created later.
#[derive(Clone)]
pub struct CalendarService {
    client: Client,
    api_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct CreateEventRequest<'a> {
    summary: &'a str,
    participants: &'a [String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl CalendarService {
    pub fn new(client: Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }

    pub async fn create_event(
        &self,
        summary: &str,
        participants: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CalendarEvent> {
        let request = CreateEventRequest {
            summary,
            participants,
            start,
            end,
        };
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("calendar gateway unreachable: {}", e)))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "calendar gateway status {}: {}",
                status.as_u16(),
                body
            )));
        }
        let event: CalendarEvent =
            serde_json::from_str(&body).context("calendar gateway response parse failed")?;
        Ok(event)
    }
}
