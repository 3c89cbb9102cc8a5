//! Telegram Bot API integration
//!
//! Long-polls for incoming messages, downloads attached files, and sends
//! text replies back to the originating chat.

pub mod client;
pub mod mock;
pub mod types;

pub use client::TelegramClient;
pub use mock::MockBotClient;

use crate::Result;
use async_trait::async_trait;
use types::{Update, User};

#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_me(&self) -> Result<User>;
    /// Fetch updates with `update_id >= offset`, waiting up to `timeout_secs`.
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>>;
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}
