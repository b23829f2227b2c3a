use crate::error::AclError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
pub(crate) struct ErrorDetail {
    /// Machine-readable error code (e.g. `DUPLICATE_BLOCK`).
    code: &'static str,
    message: String,
}

/// Admin API error.
///
/// All variants produce `{"error":{"code":"SCREAMING_SNAKE","message":"..."}}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound { code: &'static str, message: String },
    BadRequest { code: &'static str, message: String },
    Forbidden { message: String },
    Conflict { code: &'static str, message: String },
    ServiceUnavailable { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            Self::Forbidden { message } => (StatusCode::FORBIDDEN, "ADDRESS_BLOCKED", message),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                message,
            ),
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<AclError> for ApiError {
    fn from(err: AclError) -> Self {
        if err.is_unavailable() {
            crate::metrics::record_store_error(err.error_code());
        }
        match &err {
            AclError::InvalidAddress(_) => Self::BadRequest {
                code: "INVALID_ADDRESS",
                message: err.to_string(),
            },
            AclError::InvalidExpiry | AclError::ReasonTooLong(_) => Self::BadRequest {
                code: "VALIDATION_ERROR",
                message: err.to_string(),
            },
            AclError::DuplicateBlock(_) => Self::Conflict {
                code: "DUPLICATE_BLOCK",
                message: err.to_string(),
            },
            AclError::NotFound(_) => Self::NotFound {
                code: "BLOCK_NOT_FOUND",
                message: err.to_string(),
            },
            AclError::StoreUnavailable(_) | AclError::Migration(_) => Self::ServiceUnavailable {
                message: err.to_string(),
            },
        }
    }
}
