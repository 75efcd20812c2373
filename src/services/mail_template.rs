use crate::models::outreach::Acknowledgement;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use url::Url;
use uuid::Uuid;

/// Rendered subject/body pair handed to the email gateway.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

/// One-click acknowledgement link. The outreach id is generated before any
/// side effect so it can be embedded here.
pub fn acknowledge_link(base_url: &str, outreach_id: Uuid, response: Acknowledgement) -> String {
    let mut url = Url::parse(base_url)
        .unwrap_or_else(|_| Url::parse("http://localhost").expect("static url"));
    url.set_path(&format!("acknowledge/{}", outreach_id));
    url.query_pairs_mut().append_pair("response", response.as_str());
    url.to_string()
}

/// One-click slot confirmation link carrying the schedule id, the slot label
/// and the originating outreach id.
pub fn confirm_link(base_url: &str, schedule_id: Uuid, label: &str, outreach_id: Uuid) -> String {
    let mut url = Url::parse(base_url)
        .unwrap_or_else(|_| Url::parse("http://localhost").expect("static url"));
    url.set_path(&format!("confirm-interview/{}", schedule_id));
    url.query_pairs_mut()
        .append_pair("slot", label)
        .append_pair("outreach_id", &outreach_id.to_string());
    url.to_string()
}

/// Personalized first-contact email with the interested / not interested
/// buttons. Parameterized exactly like the original mailing agent: candidate,
/// role, outreach id, rank and ATS score.
#[allow(clippy::too_many_arguments)]
pub fn outreach_email(
    base_url: &str,
    company: &str,
    candidate_name: &str,
    role: &str,
    jd_title: &str,
    outreach_id: Uuid,
    rank: i32,
    ats_score: i32,
) -> EmailContent {
    let yes = acknowledge_link(base_url, outreach_id, Acknowledgement::Interested);
    let no = acknowledge_link(base_url, outreach_id, Acknowledgement::NotInterested);

    let subject = format!("{} opportunity at {}", role, company);
    let body = format!(
        r#"<html><body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto;">
<h2 style="color: #1f2937;">Hello {candidate_name},</h2>
<p>Your profile stood out for our <b>{jd_title}</b> opening at {company}
(match #{rank}, profile fit {ats_score}%). We would love to hear whether you are open to a conversation.</p>
<p style="margin: 30px 0;">
  <a href="{yes}" style="background-color: #10b981; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none; margin-right: 12px;">I'm interested</a>
  <a href="{no}" style="background-color: #6b7280; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none;">Not right now</a>
</p>
<p style="color: #6b7280; font-size: 13px;">One click is enough; we will take it from there.</p>
<p>Best regards,<br/>{company} Recruiting</p>
</body></html>"#,
    );

    EmailContent { subject, body }
}

/// Slot-selection email: one confirmation button per proposed slot label.
pub fn slot_invite_email(
    base_url: &str,
    company: &str,
    candidate_name: &str,
    jd_title: &str,
    interview_date: NaiveDate,
    slots: &BTreeMap<String, DateTime<Utc>>,
    schedule_id: Uuid,
    outreach_id: Uuid,
) -> EmailContent {
    let mut slot_rows = String::new();
    for (label, time) in slots {
        let link = confirm_link(base_url, schedule_id, label, outreach_id);
        slot_rows.push_str(&format!(
            r#"<p style="margin: 12px 0;"><a href="{link}" style="background-color: #3b82f6; color: white; padding: 10px 20px; border-radius: 6px; text-decoration: none;">Slot {label} &mdash; {}</a></p>
"#,
            time.format("%H:%M UTC"),
        ));
    }

    let subject = format!("Interview invitation: {} at {}", jd_title, company);
    let body = format!(
        r#"<html><body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto;">
<h2 style="color: #1f2937;">Hello {candidate_name},</h2>
<p>Great news! We would like to interview you for <b>{jd_title}</b> on
<b>{}</b>. Please pick the time that suits you best:</p>
{slot_rows}
<p style="color: #6b7280; font-size: 13px;">Selecting a slot confirms your interview; a calendar invitation with the meeting link follows immediately.</p>
<p>Best regards,<br/>{company} Recruiting</p>
</body></html>"#,
        interview_date.format("%A, %d %B %Y"),
    );

    EmailContent { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn acknowledge_links_carry_id_and_response() {
        let id = Uuid::new_v4();
        let link = acknowledge_link("http://app.example.com", id, Acknowledgement::Interested);
        assert!(link.contains(&format!("/acknowledge/{}", id)));
        assert!(link.ends_with("response=interested"));
        let link = acknowledge_link("http://app.example.com", id, Acknowledgement::NotInterested);
        assert!(link.ends_with("response=not_interested"));
    }

    #[test]
    fn confirm_link_carries_schedule_slot_and_outreach() {
        let schedule_id = Uuid::new_v4();
        let outreach_id = Uuid::new_v4();
        let link = confirm_link("http://app.example.com", schedule_id, "B", outreach_id);
        assert!(link.contains(&format!("/confirm-interview/{}", schedule_id)));
        assert!(link.contains("slot=B"));
        assert!(link.contains(&format!("outreach_id={}", outreach_id)));
    }

    #[test]
    fn outreach_email_embeds_both_choices() {
        let id = Uuid::new_v4();
        let content = outreach_email(
            "http://app.example.com",
            "Tek Leaders",
            "Jane Doe",
            "Data Engineer",
            "Senior Data Engineer",
            id,
            1,
            82,
        );
        assert!(content.subject.contains("Data Engineer"));
        assert!(content.body.contains("Jane Doe"));
        assert!(content.body.contains("82%"));
        assert!(content.body.contains("response=interested"));
        assert!(content.body.contains("response=not_interested"));
    }

    #[test]
    fn slot_invite_has_one_link_per_label() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();
        let mut slots = BTreeMap::new();
        for (i, hour) in [10u32, 13, 15].iter().enumerate() {
            let label = ((b'A' + i as u8) as char).to_string();
            slots.insert(label, date.and_hms_opt(*hour, 0, 0).unwrap().and_utc());
        }
        let content = slot_invite_email(
            "http://app.example.com",
            "Tek Leaders",
            "Jane Doe",
            "Senior Data Engineer",
            date,
            &slots,
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        assert_eq!(content.body.matches("slot=").count(), 3);
        for label in ["A", "B", "C"] {
            assert!(content.body.contains(&format!("slot={}", label)));
        }
    }
}
