//! Gatewarden API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use gatewarden_application::{
    BatchAuthorizationService, ExternalAccessLogQueryService, ExternalAccessLogSyncService,
    WhitelistService,
};
use gatewarden_core::AppError;
use gatewarden_infrastructure::{
    ExternalAccessLogSourceConfig, PostgresAccessPointRepository, PostgresEventRepository,
    PostgresExternalAccessLogRepository, PostgresPersonRepository, PostgresWhitelistRepository,
    SqlExternalAccessLogSource,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::handlers::external_access::{
    list_external_access_log_handler, trigger_external_access_sync_handler,
};
use crate::handlers::health::health_handler;
use crate::handlers::whitelist::{
    batch_authorization_handler, create_whitelist_entry_handler, delete_whitelist_entry_handler,
    get_whitelist_entry_handler, list_whitelist_entries_handler, update_whitelist_entry_handler,
};
use crate::state::AppState;

#[derive(Debug, Clone)]
struct ApiConfig {
    database_url: String,
    frontend_url: String,
    api_host: String,
    api_port: u16,
    sync_fetch_limit: i64,
    external_source: ExternalAccessLogSourceConfig,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    let whitelist_repository = Arc::new(PostgresWhitelistRepository::new(pool.clone()));
    let person_repository = Arc::new(PostgresPersonRepository::new(pool.clone()));
    let access_point_repository = Arc::new(PostgresAccessPointRepository::new(pool.clone()));
    let event_repository = Arc::new(PostgresEventRepository::new(pool.clone()));
    let external_log_repository = Arc::new(PostgresExternalAccessLogRepository::new(pool.clone()));

    let whitelist_service = WhitelistService::new(
        whitelist_repository.clone(),
        person_repository.clone(),
        access_point_repository.clone(),
        event_repository.clone(),
    );
    let batch_service = BatchAuthorizationService::new(
        whitelist_service.clone(),
        whitelist_repository,
        person_repository,
        access_point_repository,
        event_repository,
    );
    let external_log_query_service =
        ExternalAccessLogQueryService::new(external_log_repository.clone());

    let external_log_sync_service = if config.external_source.enabled {
        let source = Arc::new(SqlExternalAccessLogSource::connect(
            config.external_source.clone(),
        )?);
        Some(ExternalAccessLogSyncService::new(
            source,
            external_log_repository,
            config.sync_fetch_limit,
        )?)
    } else {
        info!("external access log sync disabled (EXTERNAL_ACCESS_LOG_ENABLED is not set)");
        None
    };

    let state = AppState {
        whitelist_service,
        batch_service,
        external_log_query_service,
        external_log_sync_service,
        postgres_pool: pool,
    };

    let cors_origin = HeaderValue::from_str(config.frontend_url.as_str()).map_err(|error| {
        AppError::Validation(format!(
            "FRONTEND_URL is not a valid header value: {error}"
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/whitelist",
            post(create_whitelist_entry_handler).get(list_whitelist_entries_handler),
        )
        .route("/api/whitelist/batch", post(batch_authorization_handler))
        .route(
            "/api/whitelist/{entry_id}",
            get(get_whitelist_entry_handler)
                .put(update_whitelist_entry_handler)
                .delete(delete_whitelist_entry_handler),
        )
        .route(
            "/api/external-access/latest",
            get(list_external_access_log_handler),
        )
        .route(
            "/api/external-access/sync",
            post(trigger_external_access_sync_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let host = IpAddr::from_str(config.api_host.as_str())
        .map_err(|error| AppError::Validation(format!("invalid API_HOST value: {error}")))?;
    let address = SocketAddr::new(host, config.api_port);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "gatewarden-api started");

    axum::serve(listener, router)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}

impl ApiConfig {
    fn load() -> Result<Self, AppError> {
        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let sync_fetch_limit = parse_env_i64("SYNC_FETCH_LIMIT", 50)?;

        if sync_fetch_limit <= 0 {
            return Err(AppError::Configuration(
                "SYNC_FETCH_LIMIT must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            frontend_url,
            api_host,
            api_port,
            sync_fetch_limit,
            external_source: external_source_config(),
        })
    }
}

fn external_source_config() -> ExternalAccessLogSourceConfig {
    let enabled = env::var("EXTERNAL_ACCESS_LOG_ENABLED")
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    ExternalAccessLogSourceConfig {
        enabled,
        url: env::var("EXTERNAL_ACCESS_LOG_URL").ok(),
        table: env::var("EXTERNAL_ACCESS_LOG_TABLE").ok(),
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

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<i64>().map_err(|error| {
            AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
