use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// A candidate profile extracted from a resume. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub canonical_json: Option<JsonValue>,
    pub metadata: Option<JsonValue>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Resume {
    pub fn display_name(&self) -> &str {
        self.candidate_name.as_deref().unwrap_or("Candidate")
    }
}
