use crate::error::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

/// Thin client for the outbound email gateway: one JSON POST per message,
/// bounded timeout, 2xx means delivered. Anything else is an upstream failure
/// the caller handles per stage (outreach writes no row, scheduling leaves
/// the row re-sendable).
#[derive(Clone)]
pub struct EmailService {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

impl EmailService {
    pub fn new(client: Client, api_url: String, api_key: String, from: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            from,
        }
    }

    pub async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = SendMessage {
            from: &self.from,
            to,
            subject,
            html_body,
        };
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("email gateway unreachable: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(to, status = status.as_u16(), "email gateway rejected message");
            return Err(Error::Upstream(format!(
                "email gateway status {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}
