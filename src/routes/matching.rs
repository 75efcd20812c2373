use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::AppState;

fn default_top_k() -> i64 {
    3
}

#[derive(Deserialize, Validate)]
pub struct TopMatchesRequest {
    pub jd_id: Uuid,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

pub async fn top_matches_by_jd(
    State(state): State<AppState>,
    Json(payload): Json<TopMatchesRequest>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    let matches = state
        .ranking_service
        .top_matches_for_jd(payload.jd_id, payload.top_k as usize)
        .await?;
    Ok(Json(json!({
        "jd_id": payload.jd_id,
        "top_k": payload.top_k,
        "matches": matches,
    })))
}

#[derive(Deserialize, Validate)]
pub struct TopMatchesByRoleRequest {
    #[validate(length(min = 1, message = "role_name must not be empty"))]
    pub role_name: String,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

pub async fn top_matches_by_role(
    State(state): State<AppState>,
    Json(payload): Json<TopMatchesByRoleRequest>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    let matches = state
        .ranking_service
        .top_matches_for_role(&payload.role_name, payload.top_k as usize)
        .await?;
    Ok(Json(json!({
        "role_name": payload.role_name,
        "top_k": payload.top_k,
        "matches": matches,
    })))
}
