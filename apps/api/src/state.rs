use gatewarden_application::{
    BatchAuthorizationService, ExternalAccessLogQueryService, ExternalAccessLogSyncService,
    WhitelistService,
};
use sqlx::PgPool;

/// Shared application state.
///
/// The sync service is absent when the external movement source is not
/// configured; the sync trigger endpoint reports that as a configuration
/// error while everything else keeps working.
#[derive(Clone)]
pub struct AppState {
    pub whitelist_service: WhitelistService,
    pub batch_service: BatchAuthorizationService,
    pub external_log_query_service: ExternalAccessLogQueryService,
    pub external_log_sync_service: Option<ExternalAccessLogSyncService>,
    pub postgres_pool: PgPool,
}
