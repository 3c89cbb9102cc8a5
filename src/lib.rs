//! Telegram bot that publishes received files to a GitHub repository
//!
//! Files sent to the bot are committed under `public/` in the configured
//! repository and the bot answers with the raw URL of the new file.

pub mod app;
pub mod error;
pub mod github;
pub mod health;
pub mod models;
pub mod telegram;

pub use error::{Error, Result};
