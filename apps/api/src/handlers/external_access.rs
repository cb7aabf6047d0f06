use axum::Json;
use axum::extract::{Query, State};
use gatewarden_core::AppError;

use crate::dto::{
    ExternalAccessLatestQuery, ExternalAccessLogEntryResponse, ExternalAccessSyncRequest,
    ExternalAccessSyncResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_external_access_log_handler(
    State(state): State<AppState>,
    Query(query): Query<ExternalAccessLatestQuery>,
) -> ApiResult<Json<Vec<ExternalAccessLogEntryResponse>>> {
    let entries = state
        .external_log_query_service
        .list_latest(query.limit)
        .await?
        .into_iter()
        .map(ExternalAccessLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn trigger_external_access_sync_handler(
    State(state): State<AppState>,
    payload: Option<Json<ExternalAccessSyncRequest>>,
) -> ApiResult<Json<ExternalAccessSyncResponse>> {
    let sync_service = state.external_log_sync_service.as_ref().ok_or_else(|| {
        AppError::Configuration("the external access log source is disabled".to_owned())
    })?;

    let limit = payload.and_then(|Json(body)| body.limit);
    let synced = sync_service.sync_once(limit).await?;

    Ok(Json(ExternalAccessSyncResponse { synced }))
}
