use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tokio::task;
use tracing::info;

use super::email_verifier::EmailVerifierRepository;
use crate::config::SecurityConfig;
use crate::domain::UserStatus;
use crate::entities::{email_verifiers, user_authorities, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub status: UserStatus,
    pub authorities: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Everything needed to insert a freshly registered account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub authority: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: users::Model, authorities: Vec<user_authorities::Model>) -> Result<User> {
        let status = model
            .status
            .parse::<UserStatus>()
            .map_err(|e| anyhow::anyhow!("User {}: {e}", model.id))?;

        let mut authorities: Vec<String> = authorities.into_iter().map(|a| a.authority).collect();
        authorities.sort();

        Ok(User {
            id: model.id,
            username: model.username,
            email: model.email,
            status,
            authorities,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    async fn with_authorities(&self, model: users::Model) -> Result<User> {
        let authorities = user_authorities::Entity::find()
            .filter(user_authorities::Column::UserId.eq(model.id))
            .all(&self.conn)
            .await
            .context("Failed to query user authorities")?;

        Self::map_model(model, authorities)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        match user {
            Some(model) => Ok(Some(self.with_authorities(model).await?)),
            None => Ok(None),
        }
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        match user {
            Some(model) => Ok(Some(self.with_authorities(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("Failed to count users by username")?;

        Ok(count > 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;

        Ok(count > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .find_with_related(user_authorities::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        rows.into_iter()
            .map(|(user, authorities)| Self::map_model(user, authorities))
            .collect()
    }

    /// Verify password for a user, returning the user on a match.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        if is_valid {
            Ok(Some(self.with_authorities(user).await?))
        } else {
            Ok(None)
        }
    }

    /// Inserts an unverified user, its default authority and the pending
    /// email verifier in one transaction.
    pub async fn create_with_verifier(&self, new_user: NewUser, token: &str) -> Result<User> {
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        let user = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email.clone()),
            password_hash: Set(new_user.password_hash),
            status: Set(UserStatus::Unverified.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        user_authorities::Entity::insert(user_authorities::ActiveModel {
            user_id: Set(user.id),
            authority: Set(new_user.authority.clone()),
        })
        .exec_without_returning(&txn)
        .await?;

        EmailVerifierRepository::create_in(&txn, user.id, &new_user.email, token).await?;

        txn.commit().await?;

        info!(user_id = user.id, username = %user.username, "Registered user");
        let authority = user_authorities::Model {
            user_id: user.id,
            authority: new_user.authority,
        };
        Self::map_model(user, vec![authority])
    }

    /// Consumes the verifier and flips the user to verified in one
    /// transaction. Returns `None` when the verifier no longer exists, in which
    /// case nothing changes.
    pub async fn mark_verified(
        &self,
        user_id: i32,
        verifier: email_verifiers::Model,
    ) -> Result<Option<User>> {
        let txn = self.conn.begin().await?;

        // Must stay the first statement of the transaction.
        if !EmailVerifierRepository::delete_in(&txn, verifier).await? {
            txn.rollback().await?;
            return Ok(None);
        }

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.status = Set(UserStatus::Verified.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let user = active.update(&txn).await?;

        txn.commit().await?;

        info!(user_id, "Verified user email");
        self.with_authorities(user).await.map(Some)
    }

    /// Deletes the user together with its authorities and any pending
    /// verifier. Returns `false` when no such user exists.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        if let Some(verifier) = EmailVerifierRepository::find_by_user_id_in(&txn, id).await? {
            EmailVerifierRepository::delete_in(&txn, verifier).await?;
        }

        user_authorities::Entity::delete_many()
            .filter(user_authorities::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        let result = users::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed user with ID: {}", id);
        }
        Ok(removed)
    }

    pub async fn count(&self) -> Result<u64> {
        users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();

    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn test_hash_is_not_plaintext_and_salted() {
        let first = hash_password("password123", Some(&cheap_params())).unwrap();
        let second = hash_password("password123", Some(&cheap_params())).unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("password123"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_verifies_with_default_verifier() {
        let hash = hash_password("password123", Some(&cheap_params())).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(
            Argon2::default()
                .verify_password(b"password123", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"password124", &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let params = SecurityConfig {
            argon2_memory_cost_kib: 0,
            argon2_time_cost: 0,
            argon2_parallelism: 0,
        };
        assert!(hash_password("password123", Some(&params)).is_err());
    }
}
