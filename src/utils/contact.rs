use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

// Optional leading +, then 7-15 digits with common separators.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]{7,20}$").expect("valid phone regex"));

/// Loose shape check for a customer email address.
pub fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(AppError::ValidationError(format!(
            "Invalid customer email: {email}"
        )));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> AppResult<()> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_RE.is_match(phone.trim()) || !(7..=15).contains(&digits) {
        return Err(AppError::ValidationError(format!(
            "Invalid contact phone: {phone}"
        )));
    }
    Ok(())
}
