use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::outreach::Acknowledgement;
use crate::routes::pages;
use crate::services::outreach_service::{AckOutcome, OutreachReport};
use crate::AppState;

#[derive(Deserialize, Validate)]
pub struct SendOutreachRequest {
    pub jd_id: Uuid,
    #[validate(length(min = 1, message = "candidate_ids must not be empty"))]
    pub candidate_ids: Vec<Uuid>,
}

pub async fn send_outreach(
    State(state): State<AppState>,
    Json(payload): Json<SendOutreachRequest>,
) -> Result<Json<OutreachReport>> {
    payload.validate()?;
    let report = state
        .outreach_service
        .send_outreach(payload.jd_id, &payload.candidate_ids)
        .await?;
    Ok(Json(report))
}

pub async fn outreach_logs(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let logs = state.outreach_service.list_logs().await?;
    Ok(Json(json!({ "total": logs.len(), "logs": logs })))
}

#[derive(Deserialize)]
pub struct AcknowledgeQuery {
    pub response: String,
}

/// One-click acknowledgement landing page. Email clients may prefetch this
/// link, so the underlying update is idempotent; repeats land on the
/// "already recorded" page.
pub async fn acknowledge(
    State(state): State<AppState>,
    Path(outreach_id): Path<Uuid>,
    Query(query): Query<AcknowledgeQuery>,
) -> impl IntoResponse {
    let Some(response) = Acknowledgement::parse(&query.response) else {
        return (
            StatusCode::BAD_REQUEST,
            Html(pages::response_page(
                "Invalid Response",
                "&#10007;",
                "#dc3545",
                "The response value is not recognised.",
                "",
            )),
        );
    };

    match state
        .outreach_service
        .acknowledge(&state.interview_service, outreach_id, response)
        .await
    {
        Ok(outcome) => {
            let (status, title, icon, color) = match &outcome {
                AckOutcome::NotFound => (
                    StatusCode::NOT_FOUND,
                    "Invitation Not Found",
                    "&#10007;",
                    "#dc3545",
                ),
                AckOutcome::Interested { .. } => {
                    (StatusCode::OK, "Response Recorded", "&#10003;", "#10b981")
                }
                AckOutcome::NotInterested { .. } | AckOutcome::AlreadyAcknowledged { .. } => {
                    (StatusCode::OK, "Response Recorded", "&#10003;", "#6b7280")
                }
            };
            (
                status,
                Html(pages::response_page(title, icon, color, &outcome.message(), "")),
            )
        }
        Err(e) => {
            tracing::error!(error = ?e, outreach_id = %outreach_id, "acknowledgement failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::response_page(
                    "Something Went Wrong",
                    "&#10007;",
                    "#dc3545",
                    "We could not record your response. Please try the link again in a moment.",
                    "",
                )),
            )
        }
    }
}
