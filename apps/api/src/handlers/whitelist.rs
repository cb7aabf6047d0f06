use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use gatewarden_application::WhitelistEntryQuery;
use gatewarden_domain::{AccessPointId, PersonId, WhitelistEntryId};
use uuid::Uuid;

use crate::dto::{
    BatchAuthorizationRequest, BatchAuthorizationResponse, WhitelistEntryRequest,
    WhitelistEntryResponse, WhitelistListQuery,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_whitelist_entry_handler(
    State(state): State<AppState>,
    Json(payload): Json<WhitelistEntryRequest>,
) -> ApiResult<(StatusCode, Json<WhitelistEntryResponse>)> {
    let entry = state
        .whitelist_service
        .create_entry(payload.into_input())
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn list_whitelist_entries_handler(
    State(state): State<AppState>,
    Query(query): Query<WhitelistListQuery>,
) -> ApiResult<Json<Vec<WhitelistEntryResponse>>> {
    let entries = state
        .whitelist_service
        .list_entries(WhitelistEntryQuery {
            person_id: query.person_id.map(PersonId::from_uuid),
            access_point_id: query.access_point_id.map(AccessPointId::from_uuid),
        })
        .await?
        .into_iter()
        .map(WhitelistEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn get_whitelist_entry_handler(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<Json<WhitelistEntryResponse>> {
    let entry = state
        .whitelist_service
        .get_entry(WhitelistEntryId::from_uuid(entry_id))
        .await?;

    Ok(Json(entry.into()))
}

pub async fn update_whitelist_entry_handler(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<WhitelistEntryRequest>,
) -> ApiResult<Json<WhitelistEntryResponse>> {
    let entry = state
        .whitelist_service
        .update_entry(WhitelistEntryId::from_uuid(entry_id), payload.into_input())
        .await?;

    Ok(Json(entry.into()))
}

pub async fn delete_whitelist_entry_handler(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .whitelist_service
        .delete_entry(WhitelistEntryId::from_uuid(entry_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_authorization_handler(
    State(state): State<AppState>,
    Json(payload): Json<BatchAuthorizationRequest>,
) -> ApiResult<Json<BatchAuthorizationResponse>> {
    let outcome = state.batch_service.execute(payload.into_input()).await?;

    Ok(Json(outcome.into()))
}
