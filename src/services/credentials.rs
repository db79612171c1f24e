//! Registration input rules for usernames, emails and passwords.
//!
//! The duplicate lookups here are a fast path for friendly messages; the
//! unique indexes on `users` remain the authority.

use crate::config::AccountsConfig;
use crate::db::Store;
use crate::services::user_service::UserError;

pub const USERNAME_TAKEN: &str = "Username already exists";
pub const EMAIL_TAKEN: &str = "This email has been used";
pub const EMAIL_INVALID: &str = "Please input a valid email address";

pub struct CredentialValidator<'a> {
    store: &'a Store,
    policy: &'a AccountsConfig,
}

impl<'a> CredentialValidator<'a> {
    #[must_use]
    pub const fn new(store: &'a Store, policy: &'a AccountsConfig) -> Self {
        Self { store, policy }
    }

    pub async fn check_username(&self, username: &str) -> Result<(), UserError> {
        username_length(username, self.policy.username_min_length).map_err(UserError::Validation)?;

        if self.store.username_exists(username).await? {
            return Err(UserError::Validation(USERNAME_TAKEN.to_string()));
        }

        Ok(())
    }

    pub async fn check_email(&self, email: &str) -> Result<(), UserError> {
        email_present(email).map_err(UserError::Validation)?;

        if self.store.email_exists(email).await? {
            return Err(UserError::Validation(EMAIL_TAKEN.to_string()));
        }

        Ok(())
    }

    pub fn check_password(&self, password: &str) -> Result<(), UserError> {
        password_length(password, self.policy.password_min_length).map_err(UserError::Validation)
    }
}

pub fn username_length(username: &str, min: usize) -> Result<(), String> {
    if username.chars().count() < min {
        return Err(format!("Username cannot be less than {min} characters"));
    }
    Ok(())
}

pub fn email_present(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err(EMAIL_INVALID.to_string());
    }
    Ok(())
}

/// Length is the only rule; no complexity requirements.
pub fn password_length(password: &str, min: usize) -> Result<(), String> {
    if password.chars().count() < min {
        return Err(format!("Password cannot be less than {min} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length() {
        assert!(username_length("alice01", 6).is_ok());
        assert!(username_length("abcdef", 6).is_ok());
        assert_eq!(
            username_length("bob", 6),
            Err("Username cannot be less than 6 characters".to_string())
        );
        assert!(username_length("", 6).is_err());
    }

    #[test]
    fn test_username_length_counts_characters() {
        // six characters, twelve bytes
        assert!(username_length("ユーザー名前", 6).is_ok());
        assert!(username_length("ユーザー", 6).is_err());
    }

    #[test]
    fn test_email_present() {
        assert!(email_present("alice@x.com").is_ok());
        assert_eq!(email_present(""), Err(EMAIL_INVALID.to_string()));
    }

    #[test]
    fn test_password_length() {
        assert!(password_length("password123", 8).is_ok());
        assert!(password_length("12345678", 8).is_ok());
        assert_eq!(
            password_length("pw1", 8),
            Err("Password cannot be less than 8 characters".to_string())
        );
    }
}
