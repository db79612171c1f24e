//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::repositories::user::hash_password_blocking;
use crate::db::{NewUser, Store, User, unique_violation};
use crate::services::credentials::{CredentialValidator, EMAIL_TAKEN, USERNAME_TAKEN};
use crate::services::mailer::{VerificationEmail, VerificationMailer};
use crate::services::token::{TokenError, TokenPurpose, TokenService};
use crate::services::user_service::{LoginResult, PublicUser, UserError, UserService};

const MINUTES_PER_DAY: u32 = 24 * 60;

pub struct SeaOrmUserService {
    store: Store,
    config: Arc<Config>,
    tokens: Arc<TokenService>,
    mailer: Arc<dyn VerificationMailer>,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(
        store: Store,
        config: Arc<Config>,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn VerificationMailer>,
    ) -> Self {
        Self {
            store,
            config,
            tokens,
            mailer,
        }
    }

    async fn find_user(&self, user_id: i32) -> Result<User, UserError> {
        self.store.get_user(user_id).await?.ok_or(UserError::NotFound)
    }

    /// Sends the verification email on a detached task. Failures are logged
    /// and counted; the committed user and verifier stay in place.
    fn dispatch_verification(&self, user: &User, token: &str) {
        let email = match VerificationEmail::build(
            &self.config.email,
            user.id,
            &user.username,
            &user.email,
            token,
        ) {
            Ok(email) => email,
            Err(e) => {
                warn!(user_id = user.id, error = %e, "Could not build verification email");
                metrics::counter!("verification_emails_failed_total").increment(1);
                return;
            }
        };

        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_verification(&email).await {
                warn!(user_id = email.user_id, error = %e, "Failed to send verification email");
                metrics::counter!("verification_emails_failed_total").increment(1);
            }
        });
    }

    fn map_registration_error(err: anyhow::Error) -> UserError {
        match unique_violation(&err) {
            Some(message) if message.contains("users.email") => {
                UserError::Validation(EMAIL_TAKEN.to_string())
            }
            Some(_) => UserError::Validation(USERNAME_TAKEN.to_string()),
            None => UserError::from(err),
        }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<PublicUser, UserError> {
        let validator = CredentialValidator::new(&self.store, &self.config.accounts);
        validator.check_username(username).await?;
        validator.check_email(email).await?;
        validator.check_password(password)?;

        let password_hash = hash_password_blocking(password, &self.config.security).await?;
        let token = self
            .tokens
            .issue(
                username,
                TokenPurpose::Verify,
                self.config.email.token_expiration_after_minutes,
            )?;

        let new_user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            authority: self.config.accounts.default_authority.clone(),
        };

        let user = self
            .store
            .create_user_with_verifier(new_user, &token)
            .await
            .map_err(Self::map_registration_error)?;

        metrics::counter!("users_registered_total").increment(1);
        self.dispatch_verification(&user, &token);

        Ok(user.into())
    }

    async fn verify_email(&self, token: &str) -> Result<PublicUser, UserError> {
        let claims = self.tokens.parse_as(token, TokenPurpose::Verify)?;

        let user = self
            .store
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or(UserError::NotFound)?;

        let verifier = self
            .store
            .get_email_verifier_by_token(token)
            .await?
            .filter(|verifier| verifier.user_id == user.id)
            .ok_or_else(|| UserError::from(TokenError::Invalid))?;

        let user = self
            .store
            .mark_user_verified(user.id, verifier)
            .await?
            .ok_or_else(|| UserError::from(TokenError::Invalid))?;

        metrics::counter!("users_verified_total").increment(1);
        Ok(user.into())
    }

    async fn delete(&self, user_id: i32) -> Result<(), UserError> {
        let user = self.find_user(user_id).await?;

        if !self.store.delete_user(user.id).await? {
            return Err(UserError::NotFound);
        }

        info!(user_id, username = %user.username, "Deleted user");
        Ok(())
    }

    async fn get_one(&self, user_id: i32) -> Result<PublicUser, UserError> {
        Ok(self.find_user(user_id).await?.into())
    }

    async fn get_all(&self) -> Result<Vec<PublicUser>, UserError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    async fn get_by_token(&self, token: &str) -> Result<PublicUser, UserError> {
        let claims = self.tokens.parse_as(token, TokenPurpose::Session)?;

        let user = self
            .store
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(user.into())
    }

    async fn get_by_authorization_header(
        &self,
        header_value: Option<&str>,
    ) -> Result<PublicUser, UserError> {
        let token = self.tokens.extract_from_authorization_header(header_value)?;
        self.get_by_token(token).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, UserError> {
        let user = self
            .store
            .verify_user_password(username, password)
            .await?
            .ok_or_else(|| UserError::Auth("Invalid credentials".to_string()))?;

        if !user.status.is_verified() {
            return Err(UserError::Auth("Email not verified".to_string()));
        }

        let ttl = self
            .config
            .auth
            .token_expiration_after_days
            .saturating_mul(MINUTES_PER_DAY);
        let token = self
            .tokens
            .issue(&user.username, TokenPurpose::Session, ttl)?;

        info!(user_id = user.id, "User logged in");
        Ok(LoginResult {
            token,
            user: user.into(),
        })
    }
}
