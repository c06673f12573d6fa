use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A single failed checkout field, reported alongside the other failing
/// fields so the storefront can highlight all of them at once.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("validation failed for {} field(s)", fields.len())]
    Validation { fields: Vec<FieldError> },

    #[error("address is outside the delivery radius ({distance_km:.1} km away)")]
    OutOfDeliveryRange { distance_km: f64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("assignment failed: {0}")]
    AssignmentFailed(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidCoordinate {
                latitude,
                longitude,
            } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "code": "invalid_coordinate",
                    "error": self.to_string(),
                    "latitude": latitude,
                    "longitude": longitude,
                }),
            ),
            AppError::Validation { fields } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "code": "validation",
                    "error": self.to_string(),
                    "fields": fields,
                }),
            ),
            AppError::OutOfDeliveryRange { distance_km } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "code": "out_of_delivery_range",
                    "error": self.to_string(),
                    "distanceKm": distance_km,
                    "distance": crate::geo::format_distance(*distance_km),
                }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "code": "not_found", "error": msg }),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                json!({ "code": "conflict", "error": msg }),
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                json!({ "code": "forbidden", "error": msg }),
            ),
            AppError::StoreUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "code": "store_unavailable", "error": msg }),
            ),
            AppError::AssignmentFailed(msg) => (
                StatusCode::CONFLICT,
                json!({ "code": "assignment_failed", "error": msg }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "code": "bad_request", "error": msg }),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "code": "internal", "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
