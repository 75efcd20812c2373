use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// A structured job description. Immutable after creation; it is a read-only
/// input to ranking and outreach.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescription {
    pub id: Uuid,
    pub title: String,
    pub canonical_json: Option<JsonValue>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl JobDescription {
    /// Display role, falling back to the title when the structured fields
    /// carry no `role`.
    pub fn role(&self) -> &str {
        self.canonical_json
            .as_ref()
            .and_then(|json| json.get("role"))
            .and_then(|role| role.as_str())
            .unwrap_or(&self.title)
    }
}
