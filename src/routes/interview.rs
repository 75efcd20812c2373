use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::routes::pages;
use crate::services::interview_service::{ConfirmOutcome, ScheduleReport};
use crate::AppState;

#[derive(Deserialize)]
pub struct ScheduleInterviewsRequest {
    pub jd_id: Uuid,
    /// `YYYY-MM-DD`, operator-chosen.
    pub interview_date: NaiveDate,
}

pub async fn schedule_interviews(
    State(state): State<AppState>,
    Json(payload): Json<ScheduleInterviewsRequest>,
) -> Result<Json<ScheduleReport>> {
    let report = state
        .interview_service
        .schedule_for_jd(payload.jd_id, payload.interview_date)
        .await?;
    Ok(Json(report))
}

#[derive(Deserialize)]
pub struct ConfirmQuery {
    pub slot: String,
    // The outreach id rides in the link for traceability; confirmation keys
    // off the schedule row alone.
    #[allow(dead_code)]
    pub outreach_id: Option<Uuid>,
}

/// One-click slot confirmation landing page. Multiple slot links are live in
/// the candidate's inbox at once; the conditional update behind this handler
/// lets exactly one of them win.
pub async fn confirm_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> impl IntoResponse {
    match state.interview_service.confirm(interview_id, &query.slot).await {
        Ok(ConfirmOutcome::Confirmed { schedule, event }) => {
            let extra = event
                .as_ref()
                .map(|e| pages::meet_link_block(&e.join_link))
                .unwrap_or_default();
            let when = schedule
                .confirmed_slot_time
                .map(|t| t.format("%A, %d %B %Y at %H:%M UTC").to_string())
                .unwrap_or_else(|| schedule.interview_date.to_string());
            let message = if event.is_some() {
                format!(
                    "Your interview has been confirmed for {}. Check your email for the meeting \
                     link and calendar invitation.",
                    when
                )
            } else {
                format!(
                    "Your interview has been confirmed for {}. The calendar invitation will \
                     follow shortly.",
                    when
                )
            };
            (
                StatusCode::OK,
                Html(pages::response_page(
                    "Interview Confirmed",
                    "&#10003;",
                    "#28a745",
                    &message,
                    &extra,
                )),
            )
        }
        Ok(ConfirmOutcome::AlreadyConfirmed {
            selected_slot,
            confirmed_slot_time,
        }) => {
            let slot = selected_slot.unwrap_or_else(|| "?".to_string());
            let when = confirmed_slot_time
                .map(|t| format!(" ({})", t.format("%A, %d %B %Y at %H:%M UTC")))
                .unwrap_or_default();
            let message = format!(
                "This interview is already confirmed for slot {}{}. No further action is needed.",
                slot, when
            );
            (
                StatusCode::OK,
                Html(pages::response_page(
                    "Already Confirmed",
                    "&#10003;",
                    "#6b7280",
                    &message,
                    "",
                )),
            )
        }
        Err(Error::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Html(pages::response_page(
                "Interview Not Found",
                "&#10007;",
                "#dc3545",
                "We could not find this interview. Please contact our recruiting team.",
                "",
            )),
        ),
        Err(Error::BadRequest(_)) => (
            StatusCode::BAD_REQUEST,
            Html(pages::response_page(
                "Invalid Slot",
                "&#10007;",
                "#dc3545",
                "That time slot is not one of the proposed options. Please use one of the \
                 buttons from your invitation email.",
                "",
            )),
        ),
        Err(Error::Precondition(_)) => (
            StatusCode::CONFLICT,
            Html(pages::response_page(
                "Interview Unavailable",
                "&#10007;",
                "#dc3545",
                "This interview is no longer open for confirmation. Please contact our \
                 recruiting team.",
                "",
            )),
        ),
        Err(e) => {
            tracing::error!(error = ?e, interview_id = %interview_id, "confirmation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::response_page(
                    "Something Went Wrong",
                    "&#10007;",
                    "#dc3545",
                    "We could not confirm your interview. Please try the link again in a moment.",
                    "",
                )),
            )
        }
    }
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub jd_id: Option<Uuid>,
}

pub async fn interviews_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<serde_json::Value>> {
    let interviews = state.interview_service.list_interviews(query.jd_id).await?;
    Ok(Json(json!({
        "total": interviews.len(),
        "interviews": interviews,
    })))
}
