//! Mapping engine errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use loyalty_core::{Error, ErrorClass};
use serde::Serialize;
use tracing::{debug, error, warn};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error payload `{error: message}` with a status derived from the error class
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match (&err, err.class()) {
            (Error::PlayerNotFound(_), _) | (Error::RaffleNotFound(_), _) => StatusCode::NOT_FOUND,
            (_, ErrorClass::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorClass::Denial) => StatusCode::CONFLICT,
            (_, ErrorClass::Transient) => StatusCode::SERVICE_UNAVAILABLE,
            (_, ErrorClass::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match err.class() {
            ErrorClass::Transient => warn!(error = %err, "request failed, retryable"),
            ErrorClass::Internal => error!(error = %err, "request failed"),
            ErrorClass::Validation | ErrorClass::Denial => debug!(error = %err, "request rejected"),
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
