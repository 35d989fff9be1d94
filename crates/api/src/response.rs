//! Shared response envelope types for API handlers.
//!
//! Most API responses use a `{ "data": ... }` envelope. The job-state and
//! file-listing endpoints consumed by the polling client are the exceptions.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
