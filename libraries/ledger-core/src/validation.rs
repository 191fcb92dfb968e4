//! Account field validation

use crate::error::{LedgerError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

fn username_regex() -> &'static Regex {
    static USERNAME: OnceLock<Regex> = OnceLock::new();
    USERNAME.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("username pattern is valid"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Usernames end up as server path segments and document filenames
pub fn is_valid_username(username: &str) -> bool {
    username_regex().is_match(username)
}

/// Validate registration fields, collecting every problem
///
/// # Errors
/// `ValidationFailed` listing each failing field
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    let mut errors = Vec::new();
    let username = username.trim();

    if username.chars().count() < MIN_USERNAME_LEN {
        errors.push(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        ));
    }

    if !username.is_empty() && !is_valid_username(username) {
        errors.push("username may only contain letters, digits, '.', '_' and '-'".to_string());
    }

    if !is_valid_email(email.trim()) {
        errors.push("email is invalid".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::ValidationFailed(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice example@x.fr"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_username_charset() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("j.doe_2-b"));
        assert!(!is_valid_username("bob#evil"));
        assert!(!is_valid_username("a/b"));
        assert!(!is_valid_username("al ice"));
        assert!(!is_valid_username("élodie"));
    }

    #[test]
    fn test_registration_rejects_unsafe_username() {
        match validate_registration("bob#evil", "bob@example.com", "secret1") {
            Err(LedgerError::ValidationFailed(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("username"));
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_registration_collects_all_errors() {
        match validate_registration("al", "nope", "123") {
            Err(LedgerError::ValidationFailed(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration("alice", "alice@example.com", "secret1").is_ok());
    }
}
