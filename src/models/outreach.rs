use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A candidate's one-click response to an outreach email.
///
/// An outreach record starts with no acknowledgement (`NULL` in the database)
/// and moves to exactly one of these values, never back. Concurrent clicks are
/// fenced by a conditional update on the `NULL` state; this enum is the
/// in-process side of that state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    Interested,
    NotInterested,
}

impl Acknowledgement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Acknowledgement::Interested => "interested",
            Acknowledgement::NotInterested => "not_interested",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "interested" => Some(Acknowledgement::Interested),
            "not_interested" => Some(Acknowledgement::NotInterested),
            _ => None,
        }
    }

    /// The single transition function: `unset -> {interested, not_interested}`.
    /// A record that already carries a response rejects any further
    /// transition and reports what is already stored.
    pub fn transition(
        current: Option<Acknowledgement>,
        response: Acknowledgement,
    ) -> std::result::Result<Acknowledgement, Acknowledgement> {
        match current {
            None => Ok(response),
            Some(existing) => Err(existing),
        }
    }
}

/// One logged contact attempt for one candidate about one job description.
/// Rows exist only for emails with an affirmative delivery receipt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OutreachRecord {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    pub candidate_email: String,
    pub candidate_name: Option<String>,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub rank: i32,
    pub ats_score: i32,
    pub acknowledgement: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OutreachRecord {
    pub fn acknowledgement(&self) -> Option<Acknowledgement> {
        self.acknowledgement
            .as_deref()
            .and_then(Acknowledgement::parse)
    }

    pub fn display_name(&self) -> &str {
        self.candidate_name.as_deref().unwrap_or("Candidate")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_round_trips_wire_values() {
        assert_eq!(
            Acknowledgement::parse("interested"),
            Some(Acknowledgement::Interested)
        );
        assert_eq!(
            Acknowledgement::parse("not_interested"),
            Some(Acknowledgement::NotInterested)
        );
        assert_eq!(Acknowledgement::parse("maybe"), None);
        assert_eq!(Acknowledgement::Interested.as_str(), "interested");
    }

    #[test]
    fn unset_accepts_either_response() {
        assert_eq!(
            Acknowledgement::transition(None, Acknowledgement::Interested),
            Ok(Acknowledgement::Interested)
        );
        assert_eq!(
            Acknowledgement::transition(None, Acknowledgement::NotInterested),
            Ok(Acknowledgement::NotInterested)
        );
    }

    #[test]
    fn acknowledged_record_never_reverts() {
        assert_eq!(
            Acknowledgement::transition(
                Some(Acknowledgement::Interested),
                Acknowledgement::NotInterested
            ),
            Err(Acknowledgement::Interested)
        );
        assert_eq!(
            Acknowledgement::transition(
                Some(Acknowledgement::NotInterested),
                Acknowledgement::NotInterested
            ),
            Err(Acknowledgement::NotInterested)
        );
    }
}
