//! Domain service for the account lifecycle.
//!
//! Handles registration, email verification, lookup, login and deletion.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::UserStatus;
use crate::services::token::TokenError;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("Cannot find the user")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for UserError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid => Self::Auth(err.to_string()),
            TokenError::Signing(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Public projection of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub status: UserStatus,
    pub authorities: Vec<String>,
    pub created_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            status: user.status,
            authorities: user.authorities,
            created_at: user.created_at,
        }
    }
}

/// Session token plus the user it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: PublicUser,
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Validates, stores an unverified user with a pending email verifier and
    /// dispatches the verification email.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for the first violated rule; nothing
    /// is written in that case.
    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<PublicUser, UserError>;

    /// Consumes a verification token and marks its user verified.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Auth`] for invalid, expired or already consumed
    /// tokens and [`UserError::NotFound`] when the subject no longer exists.
    async fn verify_email(&self, token: &str) -> Result<PublicUser, UserError>;

    /// Deletes a user and any pending verifier.
    async fn delete(&self, user_id: i32) -> Result<(), UserError>;

    async fn get_one(&self, user_id: i32) -> Result<PublicUser, UserError>;

    async fn get_all(&self) -> Result<Vec<PublicUser>, UserError>;

    /// Resolves the subject of a token to its user.
    async fn get_by_token(&self, token: &str) -> Result<PublicUser, UserError>;

    /// Same as [`UserService::get_by_token`], starting from a raw
    /// authorization header value.
    async fn get_by_authorization_header(
        &self,
        header_value: Option<&str>,
    ) -> Result<PublicUser, UserError>;

    /// Checks credentials of a verified user and issues a session token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, UserError>;
}
