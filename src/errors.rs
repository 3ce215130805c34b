use crate::services::{
    auth::AuthError, event_service::EventError, object_store::StorageError,
    record_store::RecordError, upload_orchestrator::UploadError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => AppError::unauthorized(err.to_string()),
            AuthError::Forbidden => AppError::new(StatusCode::FORBIDDEN, err.to_string()),
            AuthError::UserAlreadyExists(_) => AppError::new(StatusCode::CONFLICT, err.to_string()),
            AuthError::Sqlx(_) => {
                tracing::error!("auth lookup failed: {}", err);
                AppError::internal(err.to_string())
            }
        }
    }
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::EventNotFound(_) => AppError::not_found(err.to_string()),
            EventError::MissingFields => AppError::bad_request(err.to_string()),
            EventError::Auth(auth) => auth.into(),
            EventError::Sqlx(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ObjectNotFound(_) => AppError::not_found(err.to_string()),
            StorageError::InvalidObjectKey => AppError::bad_request(err.to_string()),
            StorageError::ObjectAlreadyExists(_) => {
                AppError::new(StatusCode::CONFLICT, err.to_string())
            }
            StorageError::Backend(_) | StorageError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation => AppError::bad_request(err.to_string()),
            _ => AppError::internal(err.to_string()),
        }
    }
}
