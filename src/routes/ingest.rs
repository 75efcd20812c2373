use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::job_description::JobDescription;
use crate::models::resume::Resume;
use crate::AppState;

// Structured ingest: documents arrive already parsed (title/fields/embedding);
// text extraction and field structuring happen upstream.

#[derive(Deserialize, Validate)]
pub struct CreateJdRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub canonical_json: Option<JsonValue>,
    pub embedding: Option<Vec<f32>>,
}

pub async fn create_jd(
    State(state): State<AppState>,
    Json(payload): Json<CreateJdRequest>,
) -> Result<Json<JobDescription>> {
    payload.validate()?;
    let jd = sqlx::query_as::<_, JobDescription>(
        "INSERT INTO job_descriptions (id, title, canonical_json, embedding)
         VALUES ($1, $2, $3, $4)
         RETURNING id, title, canonical_json, embedding, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.title)
    .bind(&payload.canonical_json)
    .bind(&payload.embedding)
    .fetch_one(&state.pool)
    .await?;
    Ok(Json(jd))
}

pub async fn list_jds(State(state): State<AppState>) -> Result<Json<Vec<JobDescription>>> {
    let jds = sqlx::query_as::<_, JobDescription>(
        "SELECT id, title, canonical_json, embedding, created_at
         FROM job_descriptions ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(jds))
}

#[derive(Deserialize, Serialize)]
pub struct CreateResumeRequest {
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub canonical_json: Option<JsonValue>,
    pub metadata: Option<JsonValue>,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Deserialize, Validate)]
pub struct CreateResumeBatch {
    #[validate(length(min = 1, message = "items must not be empty"))]
    pub items: Vec<CreateResumeRequest>,
}

#[derive(Serialize)]
pub struct CreateResumeResult {
    pub status: String,
    pub resume_id: Option<Uuid>,
    pub candidate_name: Option<String>,
    pub message: Option<String>,
}

/// Batch resume ingest with per-item results; a bad item never aborts its
/// siblings.
pub async fn create_resumes(
    State(state): State<AppState>,
    Json(payload): Json<CreateResumeBatch>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;

    let mut results = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO resumes (id, candidate_name, email, canonical_json, metadata, embedding)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&item.candidate_name)
        .bind(&item.email)
        .bind(&item.canonical_json)
        .bind(&item.metadata)
        .bind(&item.embedding)
        .fetch_one(&state.pool)
        .await;

        results.push(match inserted {
            Ok(id) => CreateResumeResult {
                status: "ok".to_string(),
                resume_id: Some(id),
                candidate_name: item.candidate_name.clone(),
                message: None,
            },
            Err(e) => CreateResumeResult {
                status: "error".to_string(),
                resume_id: None,
                candidate_name: item.candidate_name.clone(),
                message: Some(e.to_string()),
            },
        });
    }

    Ok(Json(serde_json::json!({
        "count": results.len(),
        "items": results,
    })))
}

pub async fn list_resumes(State(state): State<AppState>) -> Result<Json<Vec<Resume>>> {
    let resumes = sqlx::query_as::<_, Resume>(
        "SELECT id, candidate_name, email, canonical_json, metadata, embedding, created_at
         FROM resumes ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(resumes))
}
