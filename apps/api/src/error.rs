use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatewarden_core::AppError;
use serde::Serialize;

/// API error payload.
///
/// `errors` carries field-keyed validation messages when the failure is a
/// field validation; it is omitted otherwise.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_)
            | AppError::FieldValidation(_)
            | AppError::Configuration(_)
            | AppError::ExternalSource(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let errors = match &self.0 {
            AppError::FieldValidation(field_errors) => Some(field_errors.as_map().clone()),
            _ => None,
        };

        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
            errors,
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
