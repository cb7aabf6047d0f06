//! PostgreSQL repositories and the external movement source adapter.

#![forbid(unsafe_code)]

mod postgres_access_point_repository;
mod postgres_event_repository;
mod postgres_external_log_repository;
mod postgres_person_repository;
mod postgres_whitelist_repository;
mod sql_external_log_source;

pub use postgres_access_point_repository::PostgresAccessPointRepository;
pub use postgres_event_repository::PostgresEventRepository;
pub use postgres_external_log_repository::PostgresExternalAccessLogRepository;
pub use postgres_person_repository::PostgresPersonRepository;
pub use postgres_whitelist_repository::PostgresWhitelistRepository;
pub use sql_external_log_source::{ExternalAccessLogSourceConfig, SqlExternalAccessLogSource};
