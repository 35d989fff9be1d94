use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blendfarm_core::error::CoreError;
use blendfarm_scheduler::SubmitError;
use blendfarm_store::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, persistence, and submission errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `blendfarm_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A filesystem or config error from the project store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A job could not be submitted to the scheduler.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Store(store) => classify_store_error(store),

            AppError::Submit(submit) => match submit {
                SubmitError::InvalidRequest(core) => classify_core_error(core),
                SubmitError::SubmissionFailed(err) => {
                    tracing::error!(error = %err, "Scheduler submission failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "SUBMISSION_FAILED",
                        submit.to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} '{id}' not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => internal(msg),
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// - Domain errors map as [`CoreError`] does.
/// - I/O errors and malformed config documents map to 500 with a sanitized
///   message; the detail (including the path) is logged.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::Core(core) => classify_core_error(core),
        other => internal(&other.to_string()),
    }
}

fn internal(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
