//! GitHub repository publishing
//!
//! Commits uploaded bytes to `public/<name>` through the repository
//! contents API and derives the raw URL of the committed file.

pub mod client;
pub mod mock;
pub mod types;

pub use client::GithubClient;
pub use mock::MockPublisher;

use crate::models::{UploadRequest, UploadResult};
use async_trait::async_trait;
use base64::Engine as _;

/// Fallback reason when the remote rejects an upload without saying why.
pub const GENERIC_FAILURE: &str = "Upload failed";

#[async_trait]
pub trait RepoPublisher: Send + Sync {
    /// Publish one file. Issues exactly one remote write and never errors;
    /// every failure is folded into [`UploadResult::Failed`].
    async fn publish(&self, request: &UploadRequest) -> UploadResult;
}

/// Standard base64 with padding, as the contents API expects.
pub fn encode_content(content: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(content)
}

pub fn commit_message(name: &str) -> String {
    format!("Upload {} from Telegram bot", name)
}
