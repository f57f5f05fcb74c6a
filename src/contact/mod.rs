//! Contact form submissions.
//!
//! Submissions are validated and written to the log; nothing is mailed out.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Phrases that mark a short message as spam
const SPAM_KEYWORDS: &[&str] = &["http://", "https://", "www.", "click here", "buy now"];

/// Messages at least this long are never flagged by the keyword check
const SPAM_CHECK_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Message appears to be spam")]
    Spam,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn looks_like_spam(message: &str) -> bool {
    if message.chars().count() >= SPAM_CHECK_MAX_LEN {
        return false;
    }
    let lower = message.to_lowercase();
    SPAM_KEYWORDS.iter().any(|k| lower.contains(k))
}

impl ContactSubmission {
    pub fn validate(&self) -> Result<(), ContactError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(ContactError::MissingFields(missing));
        }

        if !is_valid_email(self.email.trim()) {
            return Err(ContactError::InvalidEmail);
        }

        if looks_like_spam(&self.message) {
            return Err(ContactError::Spam);
        }

        Ok(())
    }
}

/// Validate and record a submission
pub fn submit(submission: &ContactSubmission, client: &str) -> Result<(), ContactError> {
    submission.validate()?;

    info!(
        client = %client,
        name = %submission.name,
        email = %submission.email,
        phone = submission.phone.as_deref().unwrap_or("-"),
        subject = %submission.subject,
        message = %submission.message,
        timestamp = %Utc::now().to_rfc3339(),
        "Contact form submission"
    );
    Ok(())
}
