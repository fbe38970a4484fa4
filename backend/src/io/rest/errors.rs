//! Translation of ledger errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, warn};
use shared::ErrorResponse;

use crate::domain::errors::LedgerError;

pub fn status_for(error: &LedgerError) -> StatusCode {
    match error {
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::Forbidden(_) => StatusCode::FORBIDDEN,
        LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::InvalidState { .. } => StatusCode::CONFLICT,
        LedgerError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a failed operation and build its JSON error response.
///
/// Storage failures are logged in full but answered with a generic message.
pub fn error_response(context: &str, err: LedgerError) -> Response {
    let status = status_for(&err);
    let message = match &err {
        LedgerError::Storage(cause) => {
            error!("{}: {:#}", context, cause);
            "Internal storage error".to_string()
        }
        other => {
            warn!("{}: {}", context, other);
            other.to_string()
        }
    };

    (
        status,
        Json(ErrorResponse {
            kind: err.kind().to_string(),
            message,
        }),
    )
        .into_response()
}
