use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use relaydesk_chat::{NoopEventSource, NoopTransport, PollingRunner, RelayRouter, ReconnectPolicy};
use relaydesk_core::config::{AppConfig, ConfigError, LoadOptions};
use relaydesk_core::domain::UserId;
use relaydesk_db::repositories::{
    OperatorRepository, RepositoryError, SqlClientRepository, SqlMessageRepository,
    SqlOperatorRepository,
};
use relaydesk_db::{connect_with_settings, migrations, DbPool};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runner: PollingRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("owner seeding failed: {0}")]
    OwnerSeed(#[source] RepositoryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let operators = Arc::new(SqlOperatorRepository::new(db_pool.clone()));
    let clients = Arc::new(SqlClientRepository::new(db_pool.clone()));
    let messages = Arc::new(SqlMessageRepository::new(db_pool.clone()));

    // Owner is registered up front so the fan-out path works before the
    // owner ever opens the bot.
    operators
        .add(UserId(config.bot.owner_id), true)
        .await
        .map_err(BootstrapError::OwnerSeed)?;
    info!(
        event_name = "system.bootstrap.owner_seeded",
        owner_id = config.bot.owner_id,
        "bootstrap owner registered as operator"
    );

    let router = RelayRouter::new(operators, clients, messages, config.bot.fanout);
    let runner = PollingRunner::new(
        Arc::new(NoopEventSource),
        Arc::new(NoopTransport),
        router,
        ReconnectPolicy::default(),
    );

    Ok(Application { config, db_pool, runner })
}
