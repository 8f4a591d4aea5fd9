use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    state::{
        contest::CorruptContest,
        guard::{Denial, DenialKind},
        state_machine::InvalidCommand,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A resource with the same key already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// The state changed underneath the operation.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The participation gate refused a join or vote.
    #[error(transparent)]
    Denied(Denial),
    /// The command does not apply to the contest's control mode.
    #[error(transparent)]
    InvalidOperation(InvalidCommand),
    /// Stored data violates a domain invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateKey { collection, key } => {
                ServiceError::AlreadyExists(format!("`{key}` already exists in {collection}"))
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<InvalidCommand> for ServiceError {
    fn from(err: InvalidCommand) -> Self {
        ServiceError::InvalidOperation(err)
    }
}

impl From<Denial> for ServiceError {
    fn from(err: Denial) -> Self {
        ServiceError::Denied(err)
    }
}

impl From<CorruptContest> for ServiceError {
    fn from(err: CorruptContest) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Access refused.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Well-formed request that cannot apply to the target.
    #[error("{0}")]
    UnprocessableEntity(String),
    /// Participation gate denial carrying its reason code.
    #[error("{0}")]
    Denied(Denial),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Validation(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::AlreadyExists(message) => AppError::Conflict(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Denied(denial) => AppError::Denied(denial),
            ServiceError::InvalidOperation(invalid) => {
                AppError::UnprocessableEntity(invalid.to_string())
            }
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Denied(denial) => match denial.reason.kind() {
                DenialKind::NotFound => StatusCode::NOT_FOUND,
                DenialKind::Conflict => StatusCode::CONFLICT,
                DenialKind::Forbidden => StatusCode::FORBIDDEN,
            },
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let reason = match &self {
            AppError::Denied(denial) => Some(denial.reason.code()),
            _ => None,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
            reason,
        });

        (status, payload).into_response()
    }
}
