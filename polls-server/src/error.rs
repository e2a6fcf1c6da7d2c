//! Mapping of poll errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use polls::error::{ErrorKind, PollError};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Poll(PollError),
    Internal(String),
}

impl From<PollError> for ApiError {
    fn from(err: PollError) -> Self {
        ApiError::Poll(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Poll(err) => match err.kind() {
                ErrorKind::Validation | ErrorKind::Input => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidOption => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Inactive => StatusCode::CONFLICT,
                ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Poll(err) => {
                let error = match err.kind() {
                    ErrorKind::Validation => "VALIDATION_ERROR",
                    ErrorKind::Input => "BAD_REQUEST",
                    ErrorKind::NotFound => "NOT_FOUND",
                    ErrorKind::InvalidOption => "INVALID_OPTION",
                    ErrorKind::Inactive => "POLL_INACTIVE",
                    ErrorKind::Persistence => "PERSISTENCE_ERROR",
                };
                let message = if err.kind() == ErrorKind::Persistence {
                    "poll data could not be saved; the change was not applied".to_string()
                } else {
                    err.to_string()
                };
                ErrorBody { error, message }
            }
            ApiError::Internal(_) => ErrorBody {
                error: "INTERNAL_ERROR",
                message: "an internal error occurred".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                ApiError::Poll(err) => error!(error = ?err, "request failed"),
                ApiError::Internal(msg) => error!(error = %msg, "request failed"),
            }
        }
        (status, Json(self.body())).into_response()
    }
}
