//! GitHub contents API payloads.

use serde::{Deserialize, Serialize};

/// Request body for `PUT /repos/{owner}/{repo}/contents/{path}`.
///
/// No `sha` is sent, so an existing file at the same path is replaced.
#[derive(Debug, Serialize)]
pub struct PutContentRequest {
    pub message: String,
    pub content: String,
    pub branch: String,
}

/// Error body returned by the GitHub REST API.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}
