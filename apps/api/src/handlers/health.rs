use axum::Json;
use axum::extract::State;
use gatewarden_core::AppError;

use crate::dto::HealthResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    sqlx::query("SELECT 1")
        .execute(&state.postgres_pool)
        .await
        .map_err(|error| AppError::Internal(format!("database health check failed: {error}")))?;

    Ok(Json(HealthResponse { status: "ok" }))
}
