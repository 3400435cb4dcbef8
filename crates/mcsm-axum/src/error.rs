//! HTTP error type and its mapping from domain errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mcsm_core::{ProcessError, PropertiesError, SettingsError, SetupError};
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request conflicts with the current lifecycle state.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The target went away mid-request (closed stdin).
    #[error("Gone: {0}")]
    Gone(String),

    /// The version catalogue or download host failed.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Gone(_) => StatusCode::GONE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_message(self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::Gone(msg)
            | Self::BadGateway(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorBody {
            error: self.into_message(),
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<ProcessError> for HttpError {
    fn from(err: ProcessError) -> Self {
        let message = err.to_string();
        match err {
            ProcessError::NotFound(_) => Self::NotFound(message),
            ProcessError::AlreadyRunning(_) | ProcessError::NotRunning(_) => {
                Self::Conflict(message)
            }
            ProcessError::MissingArtifact(_) => Self::BadRequest(message),
            ProcessError::PermissionDenied(_) => Self::Forbidden(message),
            ProcessError::BrokenPipe(_) => Self::Gone(message),
            ProcessError::SpawnFailed { .. } | ProcessError::Io(_) => Self::Internal(message),
        }
    }
}

impl From<PropertiesError> for HttpError {
    fn from(err: PropertiesError) -> Self {
        match err {
            PropertiesError::NotFound(_) => Self::NotFound(err.to_string()),
            PropertiesError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<SetupError> for HttpError {
    fn from(err: SetupError) -> Self {
        match err {
            SetupError::Resolve(_) | SetupError::Download(_) => Self::BadGateway(err.to_string()),
            SetupError::ChecksumMismatch { .. } | SetupError::Io(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<SettingsError> for HttpError {
    fn from(err: SettingsError) -> Self {
        Self::Internal(err.to_string())
    }
}
