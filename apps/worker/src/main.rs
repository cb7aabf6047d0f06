//! Gatewarden external access log sync worker.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use gatewarden_application::ExternalAccessLogSyncService;
use gatewarden_core::{AppError, AppResult};
use gatewarden_infrastructure::{
    ExternalAccessLogSourceConfig, PostgresExternalAccessLogRepository, SqlExternalAccessLogSource,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    poll_interval_secs: u64,
    fetch_limit: i64,
    external_source: ExternalAccessLogSourceConfig,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    let repository = Arc::new(PostgresExternalAccessLogRepository::new(pool));
    let source = Arc::new(SqlExternalAccessLogSource::connect(
        config.external_source.clone(),
    )?);
    let sync_service =
        ExternalAccessLogSyncService::new(source, repository, config.fetch_limit)?;

    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    info!(
        poll_interval_secs = config.poll_interval_secs,
        fetch_limit = config.fetch_limit,
        "gatewarden-worker started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // Only the shutdown signal ends the loop; it aborts the sleep and
    // starts no further cycle.
    loop {
        match sync_service.sync_once(None).await {
            Ok(synced) => {
                debug!(synced, "external access log sync cycle completed");
            }
            Err(error @ (AppError::ExternalSource(_) | AppError::Configuration(_))) => {
                error!(error = %error, "failed to sync external access logs");
            }
            Err(error) => {
                error!(error = ?error, "unexpected error while syncing external access logs");
            }
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping external access log sync");
                break;
            }
            () = tokio::time::sleep(poll_interval) => {}
        }
    }

    Ok(())
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let poll_interval_secs = parse_env_u64("SYNC_POLL_INTERVAL_SECS", 30)?;
        let fetch_limit = parse_env_i64("SYNC_FETCH_LIMIT", 50)?;

        if poll_interval_secs == 0 {
            return Err(AppError::Configuration(
                "SYNC_POLL_INTERVAL_SECS must be greater than zero".to_owned(),
            ));
        }

        if fetch_limit <= 0 {
            return Err(AppError::Configuration(
                "SYNC_FETCH_LIMIT must be greater than zero".to_owned(),
            ));
        }

        let external_source = ExternalAccessLogSourceConfig {
            enabled: env::var("EXTERNAL_ACCESS_LOG_ENABLED")
                .map(|value| value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            url: env::var("EXTERNAL_ACCESS_LOG_URL").ok(),
            table: env::var("EXTERNAL_ACCESS_LOG_TABLE").ok(),
        };

        Ok(Self {
            database_url,
            poll_interval_secs,
            fetch_limit,
            external_source,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_i64(name: &str, default: i64) -> AppResult<i64> {
    match env::var(name) {
        Ok(value) => value.parse::<i64>().map_err(|error| {
            AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
