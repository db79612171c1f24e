use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::mailer::{self, VerificationMailer};
use crate::services::{
    ItemService, SeaOrmItemService, SeaOrmUserService, TokenService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub item_service: Arc<dyn ItemService>,
}

impl SharedState {
    /// Opens the store and wires services using the mailer selected by
    /// `email.webhook_url`.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer = mailer::from_config(&config.email)?;
        Self::with_mailer(config, mailer).await
    }

    /// Fails on an invalid config, including a missing signing key.
    pub async fn with_mailer(
        config: Config,
        mailer: Arc<dyn VerificationMailer>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config = Arc::new(config);
        let tokens = Arc::new(TokenService::from_config(&config.auth));

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.clone(),
            tokens,
            mailer,
        )) as Arc<dyn UserService>;

        let item_service = Arc::new(SeaOrmItemService::new(store.clone())) as Arc<dyn ItemService>;

        Ok(Self {
            config,
            store,
            user_service,
            item_service,
        })
    }
}
