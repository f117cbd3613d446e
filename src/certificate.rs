//! Completion certificate
//!
//! A certificate is issued once the current streak reaches the full
//! challenge duration. It is rendered as a standalone HTML page.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::habits::{CHALLENGE_DURATION, DAILY_HABITS};
use crate::journal::export::filename_name;
use crate::storage::User;

/// Certificate errors
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Complete all {required} days to earn your certificate ({remaining} days remaining)")]
    NotEligible { required: u32, remaining: u32 },
}

/// Eligibility for the certificate
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CertificateStatus {
    pub eligible: bool,
    pub current_streak: u32,
    pub required: u32,
    pub days_remaining: u32,
}

impl CertificateStatus {
    pub fn for_streak(streak: u32) -> Self {
        Self {
            eligible: streak >= CHALLENGE_DURATION,
            current_streak: streak,
            required: CHALLENGE_DURATION,
            days_remaining: CHALLENGE_DURATION.saturating_sub(streak),
        }
    }
}

/// A rendered certificate
#[derive(Debug, Clone)]
pub struct CertificateDocument {
    pub filename: String,
    pub html: String,
}

/// Render the certificate for `user` if `streak` qualifies
pub fn issue(user: &User, streak: u32, today: NaiveDate) -> Result<CertificateDocument, CertificateError> {
    let status = CertificateStatus::for_streak(streak);
    if !status.eligible {
        return Err(CertificateError::NotEligible {
            required: status.required,
            remaining: status.days_remaining,
        });
    }

    tracing::info!(user_id = %user.id, "Issued completion certificate");
    Ok(CertificateDocument {
        filename: certificate_filename(user.display_name()),
        html: render_html(user.display_name(), today),
    })
}

pub fn certificate_filename(name: &str) -> String {
    format!("AnsuryX-Challenge-Certificate-{}.html", filename_name(name))
}

/// "March 5, 2024"
pub fn completion_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn render_html(name: &str, today: NaiveDate) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>AnsuryX Challenge Certificate</title>
<style>
  body {{ margin: 0; background: #0f172a; font-family: Georgia, serif; color: #f1f5f9; }}
  .certificate {{ width: 800px; margin: 40px auto; padding: 40px; border: 8px solid #a855f7;
    border-radius: 20px; background: linear-gradient(135deg, #1e1b4b, #0f172a); text-align: center; }}
  h1 {{ font-size: 42px; color: #a855f7; margin: 0; }}
  .divider {{ width: 100px; height: 4px; margin: 20px auto; background: linear-gradient(45deg, #a855f7, #06b6d4); }}
  .name {{ font-size: 36px; font-weight: bold; margin: 0 0 20px 0; }}
  .details {{ margin: 30px auto; max-width: 500px; padding: 20px; border: 1px solid #6b21a8; border-radius: 15px; }}
  .row {{ display: flex; justify-content: space-between; margin-bottom: 10px; }}
  .muted {{ color: #cbd5e1; }}
  .quote {{ font-size: 14px; color: #94a3b8; font-style: italic; }}
</style>
</head>
<body>
<div class="certificate">
  <h1>Certificate of Achievement</h1>
  <div class="divider"></div>
  <p class="muted">This is to certify that</p>
  <h2 class="name">{name}</h2>
  <p class="muted">has successfully completed the</p>
  <h3>AnsuryX Challenge</h3>
  <p class="muted">Demonstrating unwavering commitment to personal transformation<br>
  through {days} days of consistent daily habits and spiritual growth</p>
  <div class="details">
    <div class="row"><span class="muted">Challenge Duration:</span><strong>{days} Days</strong></div>
    <div class="row"><span class="muted">Habits Mastered:</span><strong>{pillars} Core Pillars</strong></div>
    <div class="row"><span class="muted">Completion Date:</span><strong>{date}</strong></div>
  </div>
  <p class="quote">"Excellence is not an act, but a habit. We are what we repeatedly do." - Aristotle</p>
</div>
</body>
</html>
"#,
        name = escape_html(name),
        days = CHALLENGE_DURATION,
        pillars = DAILY_HABITS.len(),
        date = completion_date(today),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: Option<&str>) -> User {
        User {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            full_name: name.map(String::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status() {
        let status = CertificateStatus::for_streak(12);
        assert!(!status.eligible);
        assert_eq!(status.days_remaining, 28);

        let status = CertificateStatus::for_streak(40);
        assert!(status.eligible);
        assert_eq!(status.days_remaining, 0);
    }

    #[test]
    fn test_not_eligible() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let err = issue(&user(None), 39, today).unwrap_err();
        assert!(err.to_string().contains("1 days remaining"));
    }

    #[test]
    fn test_issue_certificate() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let doc = issue(&user(Some("Amina Yusuf")), 40, today).unwrap();

        assert_eq!(doc.filename, "AnsuryX-Challenge-Certificate-Amina-Yusuf.html");
        assert!(doc.html.contains("Certificate of Achievement"));
        assert!(doc.html.contains("Amina Yusuf"));
        assert!(doc.html.contains("40 Days"));
        assert!(doc.html.contains("5 Core Pillars"));
        assert!(doc.html.contains("March 5, 2024"));
    }

    #[test]
    fn test_fallback_name_and_escaping() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let doc = issue(&user(None), 41, today).unwrap();
        assert!(doc.html.contains("Challenge Participant"));

        let doc = issue(&user(Some("<b>Omar</b>")), 40, today).unwrap();
        assert!(doc.html.contains("&lt;b&gt;Omar&lt;/b&gt;"));
        assert!(!doc.html.contains("<b>Omar"));
    }
}
