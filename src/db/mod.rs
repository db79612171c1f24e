use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::email_verifier::EmailVerifier;
pub use repositories::item::{Item, ItemFields};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn email_verifier_repo(&self) -> repositories::email_verifier::EmailVerifierRepository {
        repositories::email_verifier::EmailVerifierRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn item_repo(&self) -> repositories::item::ItemRepository {
        repositories::item::ItemRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn create_user_with_verifier(&self, new_user: NewUser, token: &str) -> Result<User> {
        self.user_repo().create_with_verifier(new_user, token).await
    }

    pub async fn mark_user_verified(
        &self,
        user_id: i32,
        verifier: EmailVerifier,
    ) -> Result<Option<User>> {
        self.user_repo().mark_verified(user_id, verifier).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // ========== Email Verifier Repository Methods ==========

    pub async fn create_email_verifier(
        &self,
        user_id: i32,
        email: &str,
        token: &str,
    ) -> Result<EmailVerifier> {
        self.email_verifier_repo().create(user_id, email, token).await
    }

    pub async fn get_email_verifier_by_token(&self, token: &str) -> Result<Option<EmailVerifier>> {
        self.email_verifier_repo().find_by_token(token).await
    }

    pub async fn get_email_verifier_by_user_id(
        &self,
        user_id: i32,
    ) -> Result<Option<EmailVerifier>> {
        self.email_verifier_repo().find_by_user_id(user_id).await
    }

    pub async fn delete_email_verifier(&self, entry: EmailVerifier) -> Result<bool> {
        self.email_verifier_repo().delete(entry).await
    }

    // ========== Item Repository Methods ==========

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.item_repo().list().await
    }

    pub async fn get_item(&self, id: i32) -> Result<Option<Item>> {
        self.item_repo().get(id).await
    }

    pub async fn add_item(&self, fields: ItemFields) -> Result<Item> {
        self.item_repo().add(fields).await
    }

    pub async fn update_item(&self, id: i32, fields: ItemFields) -> Result<Option<Item>> {
        self.item_repo().update(id, fields).await
    }

    pub async fn remove_item(&self, id: i32) -> Result<bool> {
        self.item_repo().remove(id).await
    }
}

/// Returns the violated constraint message when `err` was caused by a
/// unique index rejecting a write.
#[must_use]
pub fn unique_violation(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| match cause.downcast_ref::<DbErr>()?.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    })
}
