use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Lifecycle of an interview schedule. `pending -> confirmed` happens exactly
/// once via a conditional update; `cancelled` is a status, never a row
/// removal, and a confirmed row is immutable except for notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Confirmed => "confirmed",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ScheduleStatus::Pending),
            "confirmed" => Some(ScheduleStatus::Confirmed),
            "cancelled" => Some(ScheduleStatus::Cancelled),
            _ => None,
        }
    }

    /// The single transition function for confirmation: only a pending
    /// schedule may be confirmed; any other state is reported back.
    pub fn confirm(self) -> std::result::Result<ScheduleStatus, ScheduleStatus> {
        match self {
            ScheduleStatus::Pending => Ok(ScheduleStatus::Confirmed),
            other => Err(other),
        }
    }
}

/// One proposed interview per outreach record (1:1, enforced by a unique
/// index on `outreach_id`). The `slots` object maps slot labels ("A", "B",
/// ...) to proposed timestamps; `selected_slot` must be one of its keys once
/// the row is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSchedule {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    pub outreach_id: Uuid,
    pub interview_date: NaiveDate,
    pub slots: JsonValue,
    pub selected_slot: Option<String>,
    pub confirmed_slot_time: Option<DateTime<Utc>>,
    pub event_id: Option<String>,
    pub event_link: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub invite_sent_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl InterviewSchedule {
    pub fn status(&self) -> Option<ScheduleStatus> {
        ScheduleStatus::parse(&self.status)
    }

    /// The proposed-slot mapping, label -> timestamp, in label order.
    pub fn slot_map(&self) -> BTreeMap<String, DateTime<Utc>> {
        serde_json::from_value(self.slots.clone()).unwrap_or_default()
    }

    pub fn proposed_time(&self, label: &str) -> Option<DateTime<Utc>> {
        self.slot_map().get(label).copied()
    }

    /// A pending row whose invite never went out (and with no slot selected)
    /// may be re-driven through scheduling; a row with slots already in a
    /// candidate's inbox may not.
    pub fn is_invite_retriable(&self) -> bool {
        self.status() == Some(ScheduleStatus::Pending)
            && self.selected_slot.is_none()
            && self.invite_sent_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schedule_with(status: &str, invite_sent: bool, selected: Option<&str>) -> InterviewSchedule {
        InterviewSchedule {
            id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            jd_id: Uuid::new_v4(),
            outreach_id: Uuid::new_v4(),
            interview_date: NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
            slots: json!({
                "A": "2026-09-07T10:00:00Z",
                "B": "2026-09-07T13:00:00Z",
                "C": "2026-09-07T15:30:00Z"
            }),
            selected_slot: selected.map(String::from),
            confirmed_slot_time: None,
            event_id: None,
            event_link: None,
            status: status.to_string(),
            notes: None,
            invite_sent_at: invite_sent.then(Utc::now),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn only_pending_confirms() {
        assert_eq!(
            ScheduleStatus::Pending.confirm(),
            Ok(ScheduleStatus::Confirmed)
        );
        assert_eq!(
            ScheduleStatus::Confirmed.confirm(),
            Err(ScheduleStatus::Confirmed)
        );
        assert_eq!(
            ScheduleStatus::Cancelled.confirm(),
            Err(ScheduleStatus::Cancelled)
        );
    }

    #[test]
    fn slot_map_preserves_labels_and_times() {
        let schedule = schedule_with("pending", false, None);
        let slots = schedule.slot_map();
        assert_eq!(
            slots.keys().cloned().collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        let b = schedule.proposed_time("B").unwrap();
        assert_eq!(b.to_rfc3339(), "2026-09-07T13:00:00+00:00");
        assert!(schedule.proposed_time("D").is_none());
    }

    #[test]
    fn invite_retriable_only_before_any_send() {
        assert!(schedule_with("pending", false, None).is_invite_retriable());
        assert!(!schedule_with("pending", true, None).is_invite_retriable());
        assert!(!schedule_with("pending", false, Some("A")).is_invite_retriable());
        assert!(!schedule_with("confirmed", true, Some("A")).is_invite_retriable());
        assert!(!schedule_with("cancelled", false, None).is_invite_retriable());
    }
}
