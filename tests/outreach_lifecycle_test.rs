use std::env;
use std::sync::{Arc, Mutex};

use axum::{extract::State, routing::post, Json, Router};
use chrono::{Datelike, Days, Utc, Weekday};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use hiring_backend::error::Error;
use hiring_backend::models::outreach::Acknowledgement;
use hiring_backend::services::interview_service::{ConfirmOutcome, ScheduleOutcome};
use hiring_backend::services::outreach_service::{AckOutcome, SchedulingNote};
use hiring_backend::AppState;

type Captured = Arc<Mutex<Vec<JsonValue>>>;

/// Minimal gateway stub: records every JSON POST and answers with a fixed
/// body.
async fn spawn_capture_server(response: JsonValue) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/",
            post(
                |State((captured, response)): State<(Captured, JsonValue)>,
                 Json(body): Json<JsonValue>| async move {
                    captured.lock().unwrap().push(body);
                    Json(response)
                },
            ),
        )
        .with_state((captured.clone(), response));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    (format!("http://{}", addr), captured)
}

async fn seed_jd(pool: &sqlx::PgPool, title: &str, embedding: &[f32]) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO job_descriptions (id, title, canonical_json, embedding)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(json!({ "role": title }))
    .bind(embedding.to_vec())
    .fetch_one(pool)
    .await
    .expect("seed jd")
}

async fn seed_resume(pool: &sqlx::PgPool, name: &str, email: &str, embedding: &[f32]) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO resumes (id, candidate_name, email, embedding)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(embedding.to_vec())
    .fetch_one(pool)
    .await
    .expect("seed resume")
}

#[tokio::test]
async fn outreach_to_confirmation_lifecycle() {
    dotenvy::dotenv().ok();
    let Ok(_database_url) = env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let (email_url, sent_emails) = spawn_capture_server(json!({ "status": "sent" })).await;
    let (calendar_url, created_events) = spawn_capture_server(json!({
        "event_id": "evt-123",
        "join_link": "https://meet.example.com/abc-defg"
    }))
    .await;

    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("PUBLIC_BASE_URL", "http://app.example.com");
    env::set_var("EMAIL_API_URL", &email_url);
    env::set_var("EMAIL_API_KEY", "test-email-key");
    env::set_var("EMAIL_FROM", "recruiting@example.com");
    env::set_var("CALENDAR_API_URL", &calendar_url);
    env::set_var("CALENDAR_API_KEY", "test-calendar-key");
    env::set_var("INTERVIEWER_EMAIL", "interviewer@example.com");
    let _ = hiring_backend::config::init_config();

    let pool = hiring_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    let state = AppState::new(pool.clone());

    // Embeddings chosen so Jane's cosine against the JD is 0.825 -> ATS 82.
    let jd_id = seed_jd(&pool, "Senior Data Engineer", &[1.0, 0.0, 0.0]).await;
    let jane = seed_resume(
        &pool,
        "Jane Doe",
        "jane.doe@example.com",
        &[0.825, 0.565_132, 0.0],
    )
    .await;
    let john = seed_resume(
        &pool,
        "John Roe",
        "john.roe@example.com",
        &[0.5, 0.866, 0.0],
    )
    .await;

    // Ranking: Jane outranks John, scores within bounds.
    let matches = state
        .ranking_service
        .top_matches_for_jd(jd_id, 10)
        .await
        .expect("ranking");
    let jane_match = matches.iter().find(|m| m.resume_id == jane).expect("jane ranked");
    let john_match = matches.iter().find(|m| m.resume_id == john).expect("john ranked");
    assert_eq!(jane_match.ats_score, 82);
    assert!(jane_match.rank < john_match.rank);

    // Role-keyed ranking resolves the role name (case-insensitively) to the
    // job description and produces the same ordering.
    let by_role = state
        .ranking_service
        .top_matches_for_role("senior data engineer", 10)
        .await
        .expect("role ranking");
    assert_eq!(by_role.first().map(|m| m.resume_id), Some(jane));
    assert_eq!(by_role.first().map(|m| m.ats_score), Some(82));
    let unknown_role = state
        .ranking_service
        .top_matches_for_role("Basket Weaver", 3)
        .await;
    assert!(matches!(unknown_role, Err(Error::NotFound(_))));

    // Outreach: both sends succeed, one row per delivered email.
    let report = state
        .outreach_service
        .send_outreach(jd_id, &[jane, john])
        .await
        .expect("outreach");
    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(sent_emails.lock().unwrap().len(), 2);

    let jane_outreach = report
        .results
        .iter()
        .find(|r| r.resume_id == jane)
        .and_then(|r| r.outreach_id)
        .expect("jane outreach id");
    let john_outreach = report
        .results
        .iter()
        .find(|r| r.resume_id == john)
        .and_then(|r| r.outreach_id)
        .expect("john outreach id");
    assert_eq!(
        report
            .results
            .iter()
            .find(|r| r.resume_id == jane)
            .unwrap()
            .ats_score,
        Some(82)
    );

    // Jane clicks "interested": acknowledgement recorded once, schedule
    // created on the earliest available weekday >= tomorrow, invite emailed.
    let outcome = state
        .outreach_service
        .acknowledge(&state.interview_service, jane_outreach, Acknowledgement::Interested)
        .await
        .expect("acknowledge jane");
    let AckOutcome::Interested { scheduling, .. } = &outcome else {
        panic!("expected interested outcome, got {:?}", outcome);
    };
    let SchedulingNote::Invited { interview_date } = scheduling else {
        panic!("expected invited scheduling note, got {:?}", scheduling);
    };
    let tomorrow = Utc::now().date_naive().checked_add_days(Days::new(1)).unwrap();
    assert!(*interview_date >= tomorrow);
    assert!(!matches!(interview_date.weekday(), Weekday::Sat | Weekday::Sun));
    assert_eq!(sent_emails.lock().unwrap().len(), 3);

    let (schedule_id, slots): (Uuid, JsonValue) = sqlx::query_as(
        "SELECT id, slots FROM interview_schedules WHERE outreach_id = $1",
    )
    .bind(jane_outreach)
    .fetch_one(&pool)
    .await
    .expect("jane schedule row");
    let slot_map = slots.as_object().expect("slots object");
    assert_eq!(
        slot_map.keys().cloned().collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );

    // A second "interested" click is a no-op: no new schedule, no new email.
    let repeat = state
        .outreach_service
        .acknowledge(&state.interview_service, jane_outreach, Acknowledgement::Interested)
        .await
        .expect("repeat acknowledge");
    assert!(matches!(repeat, AckOutcome::AlreadyAcknowledged { .. }));
    let schedule_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM interview_schedules WHERE outreach_id = $1",
    )
    .bind(jane_outreach)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(schedule_count, 1);
    assert_eq!(sent_emails.lock().unwrap().len(), 3);

    // Driving the scheduler directly for the same outreach also collapses to
    // the one existing row.
    let again = state
        .interview_service
        .schedule_for_outreach(jane_outreach)
        .await
        .expect("re-schedule attempt");
    assert!(matches!(again, ScheduleOutcome::AlreadyScheduled { .. }));

    // Unknown slot label is rejected and the row stays pending.
    let invalid = state.interview_service.confirm(schedule_id, "D").await;
    assert!(matches!(invalid, Err(Error::BadRequest(_))));
    let status: String =
        sqlx::query_scalar("SELECT status FROM interview_schedules WHERE id = $1")
            .bind(schedule_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "pending");

    // Confirming slot B wins the pending -> confirmed transition and creates
    // the calendar event.
    let confirmed = state
        .interview_service
        .confirm(schedule_id, "B")
        .await
        .expect("confirm B");
    let ConfirmOutcome::Confirmed { schedule, event } = confirmed else {
        panic!("expected confirmed outcome");
    };
    let event = event.expect("calendar event attached");
    assert_eq!(event.event_id, "evt-123");
    assert_eq!(schedule.selected_slot.as_deref(), Some("B"));
    let proposed_b = schedule.proposed_time("B").expect("slot B time");
    assert_eq!(schedule.confirmed_slot_time, Some(proposed_b));
    assert_eq!(schedule.event_id.as_deref(), Some("evt-123"));
    assert_eq!(created_events.lock().unwrap().len(), 1);

    // A late click on a different slot observes the winner's choice.
    let late = state
        .interview_service
        .confirm(schedule_id, "A")
        .await
        .expect("late confirm");
    let ConfirmOutcome::AlreadyConfirmed { selected_slot, .. } = late else {
        panic!("expected already-confirmed outcome");
    };
    assert_eq!(selected_slot.as_deref(), Some("B"));
    assert_eq!(created_events.lock().unwrap().len(), 1);

    // John declines: terminal state, no schedule ever, and a later scheduling
    // attempt fails its precondition.
    let declined = state
        .outreach_service
        .acknowledge(&state.interview_service, john_outreach, Acknowledgement::NotInterested)
        .await
        .expect("acknowledge john");
    assert!(matches!(declined, AckOutcome::NotInterested { .. }));
    let john_schedules: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM interview_schedules WHERE outreach_id = $1",
    )
    .bind(john_outreach)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(john_schedules, 0);
    let refused = state.interview_service.schedule_for_outreach(john_outreach).await;
    assert!(matches!(refused, Err(Error::Precondition(_))));

    // Acknowledging a random id reports not-found, no side effects.
    let missing = state
        .outreach_service
        .acknowledge(&state.interview_service, Uuid::new_v4(), Acknowledgement::Interested)
        .await
        .expect("missing acknowledge");
    assert!(matches!(missing, AckOutcome::NotFound));
}
