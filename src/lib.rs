pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{
    calendar_service::CalendarService, email_service::EmailService,
    interview_service::InterviewService, outreach_service::OutreachService,
    ranking_service::RankingService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ranking_service: RankingService,
    pub outreach_service: OutreachService,
    pub interview_service: InterviewService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        // Bounded timeout: a hung gateway is that gateway's failure, not the
        // request's.
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("reqwest client");

        let email_service = EmailService::new(
            http_client.clone(),
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        );
        let calendar_service = CalendarService::new(
            http_client,
            config.calendar_api_url.clone(),
            config.calendar_api_key.clone(),
        );

        let ranking_service = RankingService::new(pool.clone());
        let outreach_service = OutreachService::new(pool.clone(), email_service.clone());
        let interview_service =
            InterviewService::new(pool.clone(), email_service, calendar_service);

        Self {
            pool,
            ranking_service,
            outreach_service,
            interview_service,
        }
    }
}
