pub mod calendar_service;
pub mod email_service;
pub mod interview_service;
pub mod mail_template;
pub mod outreach_service;
pub mod ranking_service;
