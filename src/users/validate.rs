use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

/// Emails are stored and looked up trimmed and lower-cased, so lookups are
/// case-insensitive and uniqueness holds across case variants.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Normalizes and checks an email from a request body.
pub fn checked_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email"));
    }
    Ok(email)
}

pub fn checked_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn accepts_and_rejects_emails() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn checked_email_normalizes() {
        assert_eq!(checked_email("A@X.COM").unwrap(), "a@x.com");
        assert!(matches!(
            checked_email("nope").unwrap_err(),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(checked_name("   ").is_err());
        assert_eq!(checked_name(" A ").unwrap(), "A");
    }
}
