use crate::config::get_config;
use crate::error::{Error, Result};
use crate::models::job_description::JobDescription;
use crate::models::outreach::{Acknowledgement, OutreachRecord};
use crate::models::resume::Resume;
use crate::services::email_service::EmailService;
use crate::services::interview_service::{InterviewService, ScheduleOutcome};
use crate::services::mail_template;
use crate::services::ranking_service::{ats_score, cosine_similarity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

const OUTREACH_COLUMNS: &str = "id, resume_id, jd_id, candidate_email, candidate_name, \
     email_subject, email_body, rank, ats_score, acknowledgement, sent_at, acknowledged_at, \
     updated_at";

/// Sends the initial outreach emails and records the candidate's one-click
/// response. An outreach row exists only for messages with a delivery
/// receipt: a failed send produces a result entry and no row, so the system
/// never asks a candidate to acknowledge a message they never received.
#[derive(Clone)]
pub struct OutreachService {
    pool: PgPool,
    email: EmailService,
}

#[derive(Debug, Serialize)]
pub struct OutreachResult {
    pub resume_id: Uuid,
    pub outreach_id: Option<Uuid>,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub message: String,
    pub ats_score: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct OutreachReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub results: Vec<OutreachResult>,
}

/// What scheduling did (or could not do) right after an interested click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingNote {
    Invited { interview_date: NaiveDate },
    AlreadyScheduled,
    /// Scheduling failed; the acknowledgement stands and the team follows up.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    NotFound,
    AlreadyAcknowledged {
        candidate_name: String,
        previous: Acknowledgement,
    },
    NotInterested {
        candidate_name: String,
    },
    Interested {
        candidate_name: String,
        scheduling: SchedulingNote,
    },
}

impl AckOutcome {
    /// Candidate-facing wording for the one-click response page. The audience
    /// is an email recipient, so failures read as plain status, never as
    /// errors.
    pub fn message(&self) -> String {
        match self {
            AckOutcome::NotFound => {
                "We could not find this invitation. Please contact our recruiting team.".to_string()
            }
            AckOutcome::AlreadyAcknowledged { candidate_name, .. } => format!(
                "Your response has already been recorded, {}. No further action is needed.",
                candidate_name
            ),
            AckOutcome::NotInterested { candidate_name } => format!(
                "Thank you for your response, {}. We appreciate your time.",
                candidate_name
            ),
            AckOutcome::Interested {
                candidate_name,
                scheduling,
            } => match scheduling {
                SchedulingNote::Invited { interview_date } => format!(
                    "Thank you, {}! We've sent you an interview invitation email for {}. \
                     Please check your inbox and select your preferred time slot.",
                    candidate_name,
                    interview_date.format("%Y-%m-%d")
                ),
                SchedulingNote::AlreadyScheduled => format!(
                    "Thank you, {}! Your interview invitation is already on its way. \
                     Please check your inbox.",
                    candidate_name
                ),
                SchedulingNote::Deferred => format!(
                    "Thank you, {}! We've recorded your interest and our team will contact you soon.",
                    candidate_name
                ),
            },
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, AckOutcome::Interested { .. })
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OutreachLog {
    pub id: Uuid,
    pub candidate_name: Option<String>,
    pub candidate_email: String,
    pub ats_score: i32,
    pub acknowledgement: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub jd_title: Option<String>,
}

impl OutreachService {
    pub fn new(pool: PgPool, email: EmailService) -> Self {
        Self { pool, email }
    }

    /// Contacts each candidate independently; one candidate's failure never
    /// aborts the rest of the batch.
    pub async fn send_outreach(
        &self,
        jd_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> Result<OutreachReport> {
        let jd = sqlx::query_as::<_, JobDescription>(
            "SELECT id, title, canonical_json, embedding, created_at
             FROM job_descriptions WHERE id = $1",
        )
        .bind(jd_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job description not found: {}", jd_id)))?;

        let jd_embedding = jd
            .embedding
            .clone()
            .ok_or_else(|| Error::Precondition("Job description has no embedding".to_string()))?;

        let mut results = Vec::with_capacity(candidate_ids.len());
        for (idx, resume_id) in candidate_ids.iter().enumerate() {
            let rank = (idx + 1) as i32;
            match self.send_one(&jd, &jd_embedding, *resume_id, rank).await {
                Ok(result) => results.push(result),
                Err(e) => results.push(OutreachResult {
                    resume_id: *resume_id,
                    outreach_id: None,
                    candidate_name: None,
                    email: None,
                    status: "error".to_string(),
                    message: e.to_string(),
                    ats_score: None,
                }),
            }
        }

        let sent = results.iter().filter(|r| r.status == "success").count();
        let failed = results.len() - sent;
        Ok(OutreachReport {
            total: candidate_ids.len(),
            sent,
            failed,
            results,
        })
    }

    async fn send_one(
        &self,
        jd: &JobDescription,
        jd_embedding: &[f32],
        resume_id: Uuid,
        rank: i32,
    ) -> Result<OutreachResult> {
        let resume = sqlx::query_as::<_, Resume>(
            "SELECT id, candidate_name, email, canonical_json, metadata, embedding, created_at
             FROM resumes WHERE id = $1",
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        let candidate_email = resume
            .email
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::BadRequest("No email address found".to_string()))?;

        let embedding = resume
            .embedding
            .as_ref()
            .ok_or_else(|| Error::Precondition("Candidate has no embedding".to_string()))?;

        // Score at send time, not at ranking time: embeddings may have
        // changed in between.
        let score = ats_score(cosine_similarity(jd_embedding, embedding));

        // The id goes into the acknowledgement links, so it must exist before
        // any side effect.
        let outreach_id = Uuid::new_v4();

        let config = get_config();
        let content = mail_template::outreach_email(
            &config.public_base_url,
            &config.company_name,
            resume.display_name(),
            jd.role(),
            &jd.title,
            outreach_id,
            rank,
            score,
        );

        self.email
            .send(&candidate_email, &content.subject, &content.body)
            .await?;

        // Persist only after the delivery receipt; a failed send leaves no row.
        sqlx::query(
            "INSERT INTO candidate_outreach
                 (id, resume_id, jd_id, candidate_email, candidate_name,
                  email_subject, email_body, rank, ats_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(outreach_id)
        .bind(resume.id)
        .bind(jd.id)
        .bind(&candidate_email)
        .bind(&resume.candidate_name)
        .bind(&content.subject)
        .bind(&content.body)
        .bind(rank)
        .bind(score)
        .execute(&self.pool)
        .await?;

        info!(
            outreach_id = %outreach_id,
            resume_id = %resume.id,
            jd_id = %jd.id,
            ats_score = score,
            "outreach email sent"
        );

        Ok(OutreachResult {
            resume_id,
            outreach_id: Some(outreach_id),
            candidate_name: resume.candidate_name.clone(),
            email: Some(candidate_email),
            status: "success".to_string(),
            message: "Email sent successfully".to_string(),
            ats_score: Some(score),
        })
    }

    /// Records a one-click response exactly once. The update only matches a
    /// record whose acknowledgement is still unset, so two concurrent clicks
    /// (or a prefetching mail client) cannot both trigger scheduling.
    pub async fn acknowledge(
        &self,
        scheduler: &InterviewService,
        outreach_id: Uuid,
        response: Acknowledgement,
    ) -> Result<AckOutcome> {
        let updated = sqlx::query_as::<_, OutreachRecord>(&format!(
            "UPDATE candidate_outreach
             SET acknowledgement = $2, acknowledged_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND acknowledgement IS NULL
             RETURNING {OUTREACH_COLUMNS}"
        ))
        .bind(outreach_id)
        .bind(response.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = updated else {
            let existing = sqlx::query_as::<_, OutreachRecord>(&format!(
                "SELECT {OUTREACH_COLUMNS} FROM candidate_outreach WHERE id = $1"
            ))
            .bind(outreach_id)
            .fetch_optional(&self.pool)
            .await?;
            return Ok(match existing {
                None => AckOutcome::NotFound,
                Some(rec) => {
                    // The conditional update missed, so the stored state must
                    // already be terminal; the transition function reports it.
                    let previous = match Acknowledgement::transition(rec.acknowledgement(), response)
                    {
                        Err(existing) => existing,
                        Ok(granted) => granted,
                    };
                    AckOutcome::AlreadyAcknowledged {
                        candidate_name: rec.display_name().to_string(),
                        previous,
                    }
                }
            });
        };

        let candidate_name = record.display_name().to_string();
        info!(
            outreach_id = %outreach_id,
            response = response.as_str(),
            "acknowledgement recorded"
        );

        match response {
            Acknowledgement::NotInterested => Ok(AckOutcome::NotInterested { candidate_name }),
            Acknowledgement::Interested => {
                // Scheduling failure never rolls the acknowledgement back;
                // the candidate's action is the truth, delivery can be
                // repaired later.
                let scheduling = match scheduler.schedule_for_record(&record, None).await {
                    Ok(ScheduleOutcome::Invited { interview_date, .. }) => {
                        SchedulingNote::Invited { interview_date }
                    }
                    Ok(ScheduleOutcome::AlreadyScheduled { .. }) => SchedulingNote::AlreadyScheduled,
                    Err(e) => {
                        warn!(
                            error = ?e,
                            outreach_id = %outreach_id,
                            "auto-scheduling failed after acknowledgement"
                        );
                        SchedulingNote::Deferred
                    }
                };
                Ok(AckOutcome::Interested {
                    candidate_name,
                    scheduling,
                })
            }
        }
    }

    pub async fn list_logs(&self) -> Result<Vec<OutreachLog>> {
        let logs = sqlx::query_as::<_, OutreachLog>(
            "SELECT
                co.id,
                co.candidate_name,
                co.candidate_email,
                co.ats_score,
                COALESCE(co.acknowledgement, 'pending') AS acknowledgement,
                co.sent_at,
                co.acknowledged_at,
                m.title AS jd_title
             FROM candidate_outreach co
             LEFT JOIN job_descriptions m ON co.jd_id = m.id
             ORDER BY co.sent_at DESC
             LIMIT 100",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interested_message_names_the_interview_date() {
        let outcome = AckOutcome::Interested {
            candidate_name: "Jane Doe".to_string(),
            scheduling: SchedulingNote::Invited {
                interview_date: NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
            },
        };
        let message = outcome.message();
        assert!(message.contains("Jane Doe"));
        assert!(message.contains("2026-09-07"));
        assert!(outcome.is_positive());
    }

    #[test]
    fn deferred_scheduling_degrades_gracefully() {
        let outcome = AckOutcome::Interested {
            candidate_name: "Jane Doe".to_string(),
            scheduling: SchedulingNote::Deferred,
        };
        assert!(outcome.message().contains("our team will contact you soon"));
        assert!(outcome.is_positive());
    }

    #[test]
    fn terminal_and_repeat_outcomes_read_as_status_not_errors() {
        let declined = AckOutcome::NotInterested {
            candidate_name: "John Roe".to_string(),
        };
        assert!(declined.message().contains("We appreciate your time"));
        assert!(!declined.is_positive());

        let repeat = AckOutcome::AlreadyAcknowledged {
            candidate_name: "John Roe".to_string(),
            previous: Acknowledgement::Interested,
        };
        assert!(repeat.message().contains("already been recorded"));

        assert!(AckOutcome::NotFound.message().contains("could not find"));
    }
}
