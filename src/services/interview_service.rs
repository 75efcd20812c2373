use crate::config::get_config;
use crate::error::{Error, Result};
use crate::models::interview::{InterviewSchedule, ScheduleStatus};
use crate::models::outreach::{Acknowledgement, OutreachRecord};
use crate::services::calendar_service::{CalendarEvent, CalendarService};
use crate::services::email_service::EmailService;
use crate::services::mail_template;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info};
use uuid::Uuid;

const SCHEDULE_COLUMNS: &str = "id, resume_id, jd_id, outreach_id, interview_date, slots, \
     selected_slot, confirmed_slot_time, event_id, event_link, status, notes, invite_sent_at, \
     created_at, updated_at";

const OUTREACH_COLUMNS: &str = "id, resume_id, jd_id, candidate_email, candidate_name, \
     email_subject, email_body, rank, ats_score, acknowledgement, sent_at, acknowledged_at, \
     updated_at";

/// Proposes interview slots for interested candidates and confirms exactly
/// one of them. All exactly-once transitions here are single conditional
/// writes; the unique index on `outreach_id` closes the duplicate-schedule
/// race and the `status = 'pending'` guard closes the double-confirm race.
#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
    email: EmailService,
    calendar: CalendarService,
}

#[derive(Debug)]
pub enum ScheduleOutcome {
    /// A pending schedule exists and its slot invite reached the candidate.
    Invited {
        schedule_id: Uuid,
        interview_date: NaiveDate,
    },
    /// The outreach already has a schedule whose slots were communicated.
    AlreadyScheduled { schedule_id: Uuid },
}

#[derive(Debug)]
pub enum ConfirmOutcome {
    /// This request won the pending -> confirmed transition. `event` is None
    /// when the calendar gateway failed afterwards; the interview stays
    /// confirmed and event creation can be retried manually.
    Confirmed {
        schedule: InterviewSchedule,
        event: Option<CalendarEvent>,
    },
    /// A concurrent (or earlier) request already confirmed; the stored slot
    /// is reported for transparency.
    AlreadyConfirmed {
        selected_slot: Option<String>,
        confirmed_slot_time: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Serialize)]
pub struct ScheduleItem {
    pub outreach_id: Uuid,
    pub candidate_name: Option<String>,
    pub status: String,
    pub message: String,
    pub schedule_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    pub total: usize,
    pub scheduled: usize,
    pub failed: usize,
    pub results: Vec<ScheduleItem>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InterviewStatusRow {
    pub interview_id: Uuid,
    pub interview_date: NaiveDate,
    pub status: String,
    pub selected_slot: Option<String>,
    pub confirmed_time: Option<DateTime<Utc>>,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub jd_title: Option<String>,
    pub event_link: Option<String>,
    pub event_id: Option<String>,
    pub interviewer_email: Option<String>,
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Earliest weekday in `[start, start + lookahead_days)` with fewer than
/// `max_per_day` confirmed interviews. Spreads interviews across days without
/// an explicit capacity model.
pub fn next_available_date(
    start: NaiveDate,
    lookahead_days: u32,
    max_per_day: i64,
    confirmed_per_day: &HashMap<NaiveDate, i64>,
) -> Option<NaiveDate> {
    (0..u64::from(lookahead_days))
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .find(|date| {
            !is_weekend(*date) && confirmed_per_day.get(date).copied().unwrap_or(0) < max_per_day
        })
}

/// Labels the daily template "A", "B", "C", ... on the chosen date. The
/// labels stored here are exactly what the confirmation links encode.
pub fn build_slots(date: NaiveDate, template: &[NaiveTime]) -> BTreeMap<String, DateTime<Utc>> {
    template
        .iter()
        .take(26)
        .enumerate()
        .map(|(i, time)| {
            let label = ((b'A' + i as u8) as char).to_string();
            (label, date.and_time(*time).and_utc())
        })
        .collect()
}

impl InterviewService {
    pub fn new(pool: PgPool, email: EmailService, calendar: CalendarService) -> Self {
        Self {
            pool,
            email,
            calendar,
        }
    }

    async fn find_by_outreach(&self, outreach_id: Uuid) -> Result<Option<InterviewSchedule>> {
        let schedule = sqlx::query_as::<_, InterviewSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM interview_schedules WHERE outreach_id = $1"
        ))
        .bind(outreach_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    async fn find_by_id(&self, schedule_id: Uuid) -> Result<Option<InterviewSchedule>> {
        let schedule = sqlx::query_as::<_, InterviewSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM interview_schedules WHERE id = $1"
        ))
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    /// Single-candidate entry point, by outreach id.
    pub async fn schedule_for_outreach(&self, outreach_id: Uuid) -> Result<ScheduleOutcome> {
        let outreach = sqlx::query_as::<_, OutreachRecord>(&format!(
            "SELECT {OUTREACH_COLUMNS} FROM candidate_outreach WHERE id = $1"
        ))
        .bind(outreach_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Outreach record not found: {}", outreach_id)))?;

        self.schedule_for_record(&outreach, None).await
    }

    /// Core scheduling step shared by the acknowledgement-triggered path
    /// (`date` = None, date chosen automatically) and the operator batch path
    /// (`date` = the chosen day).
    pub async fn schedule_for_record(
        &self,
        outreach: &OutreachRecord,
        date: Option<NaiveDate>,
    ) -> Result<ScheduleOutcome> {
        if outreach.acknowledgement() != Some(Acknowledgement::Interested) {
            return Err(Error::Precondition(
                "Candidate has not expressed interest".to_string(),
            ));
        }

        if let Some(existing) = self.find_by_outreach(outreach.id).await? {
            if existing.is_invite_retriable() {
                // Row persisted but the invite never reached the candidate;
                // re-drive the delivery instead of creating a duplicate.
                self.send_invite(&existing, outreach).await?;
                return Ok(ScheduleOutcome::Invited {
                    schedule_id: existing.id,
                    interview_date: existing.interview_date,
                });
            }
            return Ok(ScheduleOutcome::AlreadyScheduled {
                schedule_id: existing.id,
            });
        }

        let config = get_config();
        let interview_date = match date {
            Some(d) => d,
            None => self.pick_date(outreach.jd_id).await?,
        };
        let slots = build_slots(interview_date, &config.daily_slot_template);

        let inserted = sqlx::query_as::<_, InterviewSchedule>(&format!(
            "INSERT INTO interview_schedules (id, resume_id, jd_id, outreach_id, interview_date, slots, status)
             VALUES ($1, $2, $3, $4, $5, $6, 'pending')
             ON CONFLICT (outreach_id) DO NOTHING
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(outreach.resume_id)
        .bind(outreach.jd_id)
        .bind(outreach.id)
        .bind(interview_date)
        .bind(serde_json::to_value(&slots)?)
        .fetch_optional(&self.pool)
        .await?;

        let Some(schedule) = inserted else {
            // Lost the insert race to a concurrent scheduling attempt.
            let existing = self.find_by_outreach(outreach.id).await?.ok_or_else(|| {
                Error::Internal("Schedule insert conflicted but no row exists".to_string())
            })?;
            return Ok(ScheduleOutcome::AlreadyScheduled {
                schedule_id: existing.id,
            });
        };

        info!(
            outreach_id = %outreach.id,
            schedule_id = %schedule.id,
            interview_date = %interview_date,
            "interview schedule created"
        );

        self.send_invite(&schedule, outreach).await?;
        Ok(ScheduleOutcome::Invited {
            schedule_id: schedule.id,
            interview_date,
        })
    }

    /// Operator batch path: every interested-but-unscheduled candidate of the
    /// job description gets slots on the chosen date. Items are independent;
    /// one failure never touches the others.
    pub async fn schedule_for_jd(
        &self,
        jd_id: Uuid,
        interview_date: NaiveDate,
    ) -> Result<ScheduleReport> {
        let jd_exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM job_descriptions WHERE id = $1",
        )
        .bind(jd_id)
        .fetch_one(&self.pool)
        .await?;
        if jd_exists == 0 {
            return Err(Error::NotFound(format!("Job description not found: {}", jd_id)));
        }

        let pending = sqlx::query_as::<_, OutreachRecord>(&format!(
            "SELECT {OUTREACH_COLUMNS} FROM candidate_outreach co
             WHERE co.jd_id = $1
               AND co.acknowledgement = 'interested'
               AND NOT EXISTS (
                   SELECT 1 FROM interview_schedules i
                   WHERE i.outreach_id = co.id AND i.invite_sent_at IS NOT NULL
               )
             ORDER BY co.rank ASC"
        ))
        .bind(jd_id)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(pending.len());
        for outreach in &pending {
            let item = match self.schedule_for_record(outreach, Some(interview_date)).await {
                Ok(ScheduleOutcome::Invited { schedule_id, .. }) => ScheduleItem {
                    outreach_id: outreach.id,
                    candidate_name: outreach.candidate_name.clone(),
                    status: "success".to_string(),
                    message: "Interview invitation sent".to_string(),
                    schedule_id: Some(schedule_id),
                },
                Ok(ScheduleOutcome::AlreadyScheduled { schedule_id }) => ScheduleItem {
                    outreach_id: outreach.id,
                    candidate_name: outreach.candidate_name.clone(),
                    status: "skipped".to_string(),
                    message: "Already scheduled".to_string(),
                    schedule_id: Some(schedule_id),
                },
                Err(e) => ScheduleItem {
                    outreach_id: outreach.id,
                    candidate_name: outreach.candidate_name.clone(),
                    status: "error".to_string(),
                    message: e.to_string(),
                    schedule_id: None,
                },
            };
            results.push(item);
        }

        let scheduled = results.iter().filter(|r| r.status == "success").count();
        let failed = results.iter().filter(|r| r.status == "error").count();
        Ok(ScheduleReport {
            total: results.len(),
            scheduled,
            failed,
            results,
        })
    }

    /// Confirms exactly one slot. The `status = 'pending'` guard on the
    /// update means that of two concurrent clicks exactly one wins; the loser
    /// observes the winner's stored slot.
    pub async fn confirm(&self, schedule_id: Uuid, slot_label: &str) -> Result<ConfirmOutcome> {
        let schedule = self
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Interview schedule not found: {}", schedule_id)))?;

        let slot_time = schedule.proposed_time(slot_label).ok_or_else(|| {
            Error::BadRequest(format!("Unknown interview slot '{}'", slot_label))
        })?;

        let confirmed = sqlx::query_as::<_, InterviewSchedule>(&format!(
            "UPDATE interview_schedules
             SET status = 'confirmed', selected_slot = $2, confirmed_slot_time = $3, updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(schedule_id)
        .bind(slot_label)
        .bind(slot_time)
        .fetch_optional(&self.pool)
        .await?;

        let Some(schedule) = confirmed else {
            let current = self.find_by_id(schedule_id).await?.ok_or_else(|| {
                Error::NotFound(format!("Interview schedule not found: {}", schedule_id))
            })?;
            // Classify the miss through the status transition: only a
            // non-pending row can have refused the update.
            return match current.status().map(ScheduleStatus::confirm) {
                Some(Err(ScheduleStatus::Confirmed)) => Ok(ConfirmOutcome::AlreadyConfirmed {
                    selected_slot: current.selected_slot,
                    confirmed_slot_time: current.confirmed_slot_time,
                }),
                Some(Err(ScheduleStatus::Cancelled)) => Err(Error::Precondition(
                    "This interview has been cancelled".to_string(),
                )),
                _ => Err(Error::Internal(
                    "Confirmation update matched no row for a pending schedule".to_string(),
                )),
            };
        };

        info!(
            schedule_id = %schedule.id,
            slot = slot_label,
            confirmed_for = %slot_time,
            "interview slot confirmed"
        );

        let event = match self.create_event_for(&schedule, slot_time).await {
            Ok((updated, event)) => {
                return Ok(ConfirmOutcome::Confirmed {
                    schedule: updated,
                    event: Some(event),
                })
            }
            Err(e) => {
                // The candidate has committed to a time; never reopen slot
                // selection because the calendar call failed.
                error!(
                    error = ?e,
                    schedule_id = %schedule.id,
                    "calendar event creation failed; interview stays confirmed"
                );
                None
            }
        };

        Ok(ConfirmOutcome::Confirmed { schedule, event })
    }

    async fn create_event_for(
        &self,
        schedule: &InterviewSchedule,
        start: DateTime<Utc>,
    ) -> Result<(InterviewSchedule, CalendarEvent)> {
        let config = get_config();

        let outreach = sqlx::query_as::<_, OutreachRecord>(&format!(
            "SELECT {OUTREACH_COLUMNS} FROM candidate_outreach WHERE id = $1"
        ))
        .bind(schedule.outreach_id)
        .fetch_one(&self.pool)
        .await?;

        let jd_title =
            sqlx::query_scalar::<_, String>("SELECT title FROM job_descriptions WHERE id = $1")
                .bind(schedule.jd_id)
                .fetch_one(&self.pool)
                .await?;

        let summary = format!("Interview: {} - {}", outreach.display_name(), jd_title);
        let participants = vec![
            outreach.candidate_email.clone(),
            config.interviewer_email.clone(),
        ];
        let end = start + Duration::minutes(config.slot_duration_minutes);

        let event = self
            .calendar
            .create_event(&summary, &participants, start, end)
            .await?;

        let updated = sqlx::query_as::<_, InterviewSchedule>(&format!(
            "UPDATE interview_schedules
             SET event_id = $2, event_link = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(schedule.id)
        .bind(&event.event_id)
        .bind(&event.join_link)
        .fetch_one(&self.pool)
        .await?;

        Ok((updated, event))
    }

    async fn send_invite(
        &self,
        schedule: &InterviewSchedule,
        outreach: &OutreachRecord,
    ) -> Result<()> {
        let config = get_config();
        let jd_title =
            sqlx::query_scalar::<_, String>("SELECT title FROM job_descriptions WHERE id = $1")
                .bind(schedule.jd_id)
                .fetch_one(&self.pool)
                .await?;

        let content = mail_template::slot_invite_email(
            &config.public_base_url,
            &config.company_name,
            outreach.display_name(),
            &jd_title,
            schedule.interview_date,
            &schedule.slot_map(),
            schedule.id,
            outreach.id,
        );

        // Delivery failure leaves invite_sent_at NULL so the row stays
        // re-schedulable.
        self.email
            .send(&outreach.candidate_email, &content.subject, &content.body)
            .await?;

        sqlx::query(
            "UPDATE interview_schedules SET invite_sent_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(schedule.id)
        .execute(&self.pool)
        .await?;

        info!(
            schedule_id = %schedule.id,
            to = %outreach.candidate_email,
            "slot invite delivered"
        );
        Ok(())
    }

    async fn pick_date(&self, jd_id: Uuid) -> Result<NaiveDate> {
        let config = get_config();
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            "SELECT interview_date, COUNT(*) FROM interview_schedules
             WHERE jd_id = $1 AND status = 'confirmed'
             GROUP BY interview_date",
        )
        .bind(jd_id)
        .fetch_all(&self.pool)
        .await?;
        let confirmed_per_day: HashMap<NaiveDate, i64> = rows.into_iter().collect();

        let tomorrow = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::Internal("Date overflow computing tomorrow".to_string()))?;

        next_available_date(
            tomorrow,
            config.lookahead_days,
            config.max_interviews_per_day,
            &confirmed_per_day,
        )
        .ok_or_else(|| {
            Error::Precondition(format!(
                "No available interview date within {} days",
                config.lookahead_days
            ))
        })
    }

    pub async fn list_interviews(&self, jd_id: Option<Uuid>) -> Result<Vec<InterviewStatusRow>> {
        let config = get_config();
        let mut rows = sqlx::query_as::<_, InterviewStatusRow>(
            "SELECT
                i.id AS interview_id,
                i.interview_date,
                i.status,
                i.selected_slot,
                i.confirmed_slot_time AS confirmed_time,
                r.candidate_name,
                r.email AS candidate_email,
                m.title AS jd_title,
                i.event_link,
                i.event_id,
                NULL::text AS interviewer_email
             FROM interview_schedules i
             JOIN resumes r ON r.id = i.resume_id
             JOIN job_descriptions m ON m.id = i.jd_id
             WHERE $1::uuid IS NULL OR i.jd_id = $1
             ORDER BY i.interview_date DESC, i.created_at DESC",
        )
        .bind(jd_id)
        .fetch_all(&self.pool)
        .await?;

        for row in &mut rows {
            row.interviewer_email = Some(config.interviewer_email.clone());
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_picker_skips_weekends() {
        // 2026-09-05 is a Saturday.
        let picked = next_available_date(date(2026, 9, 5), 30, 3, &HashMap::new());
        assert_eq!(picked, Some(date(2026, 9, 7)));
    }

    #[test]
    fn date_picker_skips_full_days() {
        let mut confirmed = HashMap::new();
        confirmed.insert(date(2026, 9, 7), 3);
        confirmed.insert(date(2026, 9, 8), 2);
        let picked = next_available_date(date(2026, 9, 7), 30, 3, &confirmed);
        assert_eq!(picked, Some(date(2026, 9, 8)));
    }

    #[test]
    fn date_picker_gives_up_past_lookahead() {
        // Every weekday in the window is at capacity.
        let mut confirmed = HashMap::new();
        for offset in 0..10 {
            confirmed.insert(
                date(2026, 9, 7).checked_add_days(Days::new(offset)).unwrap(),
                5,
            );
        }
        assert_eq!(next_available_date(date(2026, 9, 7), 10, 5, &confirmed), None);
    }

    #[test]
    fn date_picker_takes_tomorrow_when_free() {
        let picked = next_available_date(date(2026, 9, 8), 30, 3, &HashMap::new());
        assert_eq!(picked, Some(date(2026, 9, 8)));
    }

    #[test]
    fn slots_are_labelled_sequentially_from_template() {
        let template = [
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
        ];
        let slots = build_slots(date(2026, 9, 7), &template);
        assert_eq!(slots.len(), 3);
        assert_eq!(
            slots.keys().cloned().collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        assert_eq!(slots["B"].to_rfc3339(), "2026-09-07T13:00:00+00:00");
        assert_eq!(slots["C"].to_rfc3339(), "2026-09-07T15:30:00+00:00");
    }

    #[test]
    fn weekend_detection() {
        assert!(is_weekend(date(2026, 9, 5)));
        assert!(is_weekend(date(2026, 9, 6)));
        assert!(!is_weekend(date(2026, 9, 7)));
    }
}
