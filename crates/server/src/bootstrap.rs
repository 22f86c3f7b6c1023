use std::sync::Arc;

use docket_core::config::{AppConfig, ConfigError};
use docket_core::{SimilarityRanker, StatisticsAggregator, TokenAuthority, Tokenizer};
use docket_db::{connect_with_config, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;
use crate::service::{EstimateService, Repositories};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<EstimateService>,
    pub authority: Arc<TokenAuthority>,
}

impl Application {
    pub fn api_state(&self) -> ApiState {
        ApiState::new(
            Arc::clone(&self.service),
            Arc::clone(&self.authority),
            &self.config.statistics,
        )
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let tokenizer = Tokenizer::new(&config.estimation.token_split_pattern).map_err(|error| {
        ConfigError::Validation(format!("estimation.token_split_pattern: {error}"))
    })?;
    let service = EstimateService::new(
        Repositories::sql(db_pool.clone()),
        SimilarityRanker::new(tokenizer, config.estimation.top_threshold),
        StatisticsAggregator::new(config.statistics.out_of_window),
    );
    let authority = TokenAuthority::new(config.auth.token_secret.clone());

    Ok(Application { config, db_pool, service: Arc::new(service), authority: Arc::new(authority) })
}
