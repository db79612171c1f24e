use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use crate::entities::email_verifiers;

pub use crate::entities::email_verifiers::Model as EmailVerifier;

/// Pending email-confirmation records. The unique index on `user_id` keeps
/// at most one live entry per user.
pub struct EmailVerifierRepository {
    conn: DatabaseConnection,
}

impl EmailVerifierRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, email: &str, token: &str) -> Result<EmailVerifier> {
        Self::create_in(&self.conn, user_id, email, token).await
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<EmailVerifier>> {
        email_verifiers::Entity::find()
            .filter(email_verifiers::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query email verifier by token")
    }

    pub async fn find_by_user_id(&self, user_id: i32) -> Result<Option<EmailVerifier>> {
        Self::find_by_user_id_in(&self.conn, user_id).await
    }

    pub async fn delete(&self, entry: EmailVerifier) -> Result<bool> {
        Self::delete_in(&self.conn, entry).await
    }

    // ========================================================================
    // Transaction-scoped forms
    // ========================================================================

    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        email: &str,
        token: &str,
    ) -> Result<EmailVerifier> {
        let model = email_verifiers::ActiveModel {
            user_id: Set(user_id),
            email: Set(email.to_string()),
            token: Set(token.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .context("Failed to insert email verifier")?;

        debug!(user_id, verifier_id = model.id, "Created email verifier");
        Ok(model)
    }

    pub async fn find_by_user_id_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
    ) -> Result<Option<EmailVerifier>> {
        email_verifiers::Entity::find()
            .filter(email_verifiers::Column::UserId.eq(user_id))
            .order_by_desc(email_verifiers::Column::Id)
            .one(conn)
            .await
            .context("Failed to query email verifier by user")
    }

    /// Returns `false` when the entry was already gone, e.g. consumed by a
    /// concurrent verification.
    pub async fn delete_in<C: ConnectionTrait>(conn: &C, entry: EmailVerifier) -> Result<bool> {
        let result = email_verifiers::Entity::delete_by_id(entry.id)
            .exec(conn)
            .await
            .context("Failed to delete email verifier")?;

        let removed = result.rows_affected == 1;
        if removed {
            debug!(verifier_id = entry.id, "Deleted email verifier");
        }
        Ok(removed)
    }
}
