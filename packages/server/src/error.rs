use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

/// Seconds a client should wait before retrying after a storage outage.
const STORAGE_RETRY_AFTER_SECS: u64 = 1;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `VERIFICATION_FAILED`, `UNKNOWN_REFERENCE`, `DUPLICATE_VOTE`,
    /// `STORAGE_UNAVAILABLE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid vote 'x'. Valid values: a, b, t, n")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing request field.
    Validation(String),
    /// The anti-automation token is missing or was rejected.
    VerificationFailed,
    /// The request names a prompt, system or output that does not exist, or
    /// outputs that do not share a prompt.
    UnknownReference(String),
    /// The session already voted on this battle.
    DuplicateVote,
    /// The database could not be reached. Safe to retry.
    StorageUnavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::VerificationFailed => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "VERIFICATION_FAILED",
                    message: "Verification failed".into(),
                },
            ),
            AppError::UnknownReference(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    code: "UNKNOWN_REFERENCE",
                    message: msg,
                },
            ),
            AppError::DuplicateVote => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "DUPLICATE_VOTE",
                    message: "This battle was already voted on in this session".into(),
                },
            ),
            AppError::StorageUnavailable(detail) => {
                tracing::error!("Storage unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "STORAGE_UNAVAILABLE",
                        message: "The vote store is temporarily unavailable".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = matches!(self, AppError::StorageUnavailable(_));

        let (status, body) = self.status_and_body();

        if retryable {
            (
                status,
                [("Retry-After", STORAGE_RETRY_AFTER_SECS.to_string())],
                Json(body),
            )
                .into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                AppError::StorageUnavailable(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
