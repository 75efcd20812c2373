use axum::{
    routing::{get, post},
    Router,
};
use hiring_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/jd",
            get(routes::ingest::list_jds).post(routes::ingest::create_jd),
        )
        .route(
            "/api/resumes",
            get(routes::ingest::list_resumes).post(routes::ingest::create_resumes),
        )
        .route(
            "/api/match/top-by-jd",
            post(routes::matching::top_matches_by_jd),
        )
        .route(
            "/api/match/top-by-role",
            post(routes::matching::top_matches_by_role),
        )
        .route("/api/outreach/send", post(routes::outreach::send_outreach))
        .route("/api/outreach/logs", get(routes::outreach::outreach_logs))
        .route(
            "/api/interviews/schedule",
            post(routes::interview::schedule_interviews),
        )
        .route(
            "/api/interviews/status",
            get(routes::interview::interviews_status),
        );

    // Link-based callbacks hit directly from candidates' email clients.
    let callbacks = Router::new()
        .route("/acknowledge/:outreach_id", get(routes::outreach::acknowledge))
        .route(
            "/confirm-interview/:interview_id",
            get(routes::interview::confirm_interview),
        );

    let app = api
        .merge(callbacks)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
