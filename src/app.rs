//! Inbound message handling and the long-polling loop that drives it.

use crate::github::{GithubClient, RepoPublisher};
use crate::models::{Config, UploadRequest, UploadResult};
use crate::telegram::types::{Message, Update};
use crate::telegram::{BotApi, TelegramClient};
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const START_REPLY: &str =
    "👋 Send me any file, and I'll upload it to your GitHub `public/` folder!";
pub const NO_FILE_REPLY: &str = "❌ No file detected.";
pub const UPLOADING_REPLY: &str = "⬆️ Uploading to GitHub...";

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

/// File reference extracted from an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_id: String,
    pub file_unique_id: String,
    pub name: String,
}

impl Attachment {
    /// Prefer a document; otherwise take the largest photo size.
    pub fn from_message(message: &Message) -> Result<Self> {
        if let Some(document) = &message.document {
            let name = document
                .file_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| document.file_unique_id.clone());
            return Ok(Self {
                file_id: document.file_id.clone(),
                file_unique_id: document.file_unique_id.clone(),
                name,
            });
        }

        match message.photo.as_deref().and_then(|sizes| sizes.last()) {
            Some(photo) => Ok(Self {
                file_id: photo.file_id.clone(),
                file_unique_id: photo.file_unique_id.clone(),
                name: format!("{}.jpg", photo.file_unique_id),
            }),
            None => Err(Error::NoAttachment),
        }
    }
}

pub fn success_reply(url: &str) -> String {
    format!("✅ Uploaded!\n{}", url)
}

pub fn failure_reply(reason: &str) -> String {
    format!("❌ Failed to upload:\n{}", reason)
}

fn reply_for_error(err: &Error) -> String {
    match err {
        Error::NoAttachment => NO_FILE_REPLY.to_string(),
        Error::UploadFailed { reason } => failure_reply(reason),
        other => failure_reply(&other.to_string()),
    }
}

/// Split a leading bot command into its name and optional `@username` target.
fn parse_command(text: &str) -> Option<(&str, Option<&str>)> {
    let command = text.split_whitespace().next()?;
    if !command.starts_with('/') {
        return None;
    }

    Some(match command.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (command, None),
    })
}

fn is_own_target(target: Option<&str>, username: Option<&str>) -> bool {
    match target {
        None => true,
        Some(target) => username.is_some_and(|own| own.eq_ignore_ascii_case(target)),
    }
}

/// `/start`, or `/start@<username>` addressed to this bot.
fn is_start_command(text: &str, username: Option<&str>) -> bool {
    parse_command(text)
        .is_some_and(|(name, target)| name == "/start" && is_own_target(target, username))
}

/// Commands written as `/cmd@other_bot` belong to another bot in the same group.
fn is_addressed_elsewhere(text: &str, username: Option<&str>) -> bool {
    parse_command(text).is_some_and(|(_, target)| !is_own_target(target, username))
}

/// Relays files from the bot to the repository publisher.
pub struct App {
    bot: Box<dyn BotApi>,
    publisher: Box<dyn RepoPublisher>,
    username: Option<String>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(bot: Box<dyn BotApi>, publisher: Box<dyn RepoPublisher>) -> Self {
        Self {
            bot,
            publisher,
            username: None,
        }
    }

    /// Username used to recognise `/start@<username>` in group chats.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Build the real clients and look up the bot's own username.
    pub async fn new(config: &Config) -> Result<Self> {
        let bot = TelegramClient::new(
            config.telegram_token.clone(),
            config.telegram_api_url.clone(),
        );
        let publisher = GithubClient::new(config.github_token.clone(), config.target.clone())?;

        info!(
            "Publishing to {}/{} on branch {}",
            config.target.owner, config.target.repo, config.target.branch
        );

        let me = bot.get_me().await?;
        info!(
            "Running as bot {} (@{})",
            me.id,
            me.username.as_deref().unwrap_or("unknown")
        );

        Ok(Self::with_services(Box::new(bot), Box::new(publisher)).with_username(me.username))
    }

    /// Poll for updates until the task is dropped.
    pub async fn run(&self) {
        let mut offset = 0;
        info!("Polling Telegram for updates");

        loop {
            match self.poll_once(offset).await {
                Ok(next) => offset = next,
                Err(e) => {
                    warn!("Polling failed: {}. Pausing before next poll", e);
                    tokio::time::sleep(POLL_ERROR_PAUSE).await;
                }
            }
        }
    }

    /// Fetch and handle one batch of updates, returning the next offset.
    pub async fn poll_once(&self, offset: i64) -> Result<i64> {
        let updates = self.bot.get_updates(offset, POLL_TIMEOUT_SECS).await?;

        let mut next = offset;
        for update in updates {
            next = next.max(update.update_id + 1);
            self.handle_update(update).await;
        }
        Ok(next)
    }

    pub async fn handle_update(&self, update: Update) {
        match update.message {
            Some(message) => self.handle_message(&message).await,
            None => info!("Skipping update {} without a message", update.update_id),
        }
    }

    pub async fn handle_message(&self, message: &Message) {
        let chat_id = message.chat.id;

        let username = self.username.as_deref();
        if let Some(text) = message.text.as_deref() {
            if is_addressed_elsewhere(text, username) {
                debug!("Ignoring command for another bot in chat {}", chat_id);
                return;
            }
            if is_start_command(text, username) {
                self.reply(chat_id, START_REPLY).await;
                return;
            }
        }

        match self.relay(message).await {
            Ok(url) => self.reply(chat_id, &success_reply(&url)).await,
            Err(e) => {
                warn!(
                    "Message {} in chat {} not published: {}",
                    message.message_id, chat_id, e
                );
                self.reply(chat_id, &reply_for_error(&e)).await;
            }
        }
    }

    /// Download the message's attachment and publish it, returning the public URL.
    async fn relay(&self, message: &Message) -> Result<String> {
        let attachment = Attachment::from_message(message)?;
        let content = self.bot.download_file(&attachment.file_id).await?;

        info!(
            "Received {} [{}] ({} bytes)",
            attachment.name,
            attachment.file_unique_id,
            content.len()
        );
        self.reply(message.chat.id, UPLOADING_REPLY).await;

        let request = UploadRequest::new(content, attachment.name);
        match self.publisher.publish(&request).await {
            UploadResult::Published { url } => {
                info!("Published {} to {}", request.name, url);
                Ok(url)
            }
            UploadResult::Failed { reason } => Err(Error::UploadFailed { reason }),
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.bot.send_message(chat_id, text).await {
            error!("Failed to reply to chat {}: {}", chat_id, e);
        }
    }
}
