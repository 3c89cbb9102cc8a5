use super::types::{Update, User};
use super::BotApi;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// In-memory bot that replays queued update batches and records replies.
#[derive(Clone)]
pub struct MockBotClient {
    update_batches: Arc<Mutex<VecDeque<Result<Vec<Update>>>>>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    sent: Arc<Mutex<Vec<(i64, String)>>>,
    offsets: Arc<Mutex<Vec<i64>>>,
    download_count: Arc<Mutex<usize>>,
    username: String,
}

impl MockBotClient {
    pub fn new() -> Self {
        Self {
            update_batches: Arc::new(Mutex::new(VecDeque::new())),
            files: Arc::new(Mutex::new(HashMap::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            offsets: Arc::new(Mutex::new(Vec::new())),
            download_count: Arc::new(Mutex::new(0)),
            username: "mock_bot".to_string(),
        }
    }

    pub fn with_username(mut self, username: String) -> Self {
        self.username = username;
        self
    }

    pub fn with_updates(self, updates: Vec<Update>) -> Self {
        self.update_batches.lock().unwrap().push_back(Ok(updates));
        self
    }

    pub fn with_poll_error(self, message: String) -> Self {
        self.update_batches
            .lock()
            .unwrap()
            .push_back(Err(Error::Telegram(message)));
        self
    }

    pub fn with_file(self, file_id: String, content: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(file_id, content);
        self
    }

    pub fn get_sent_messages(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Offsets passed to `get_updates`, in call order.
    pub fn get_offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn get_download_count(&self) -> usize {
        *self.download_count.lock().unwrap()
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.update_batches.lock().unwrap().is_empty()
    }
}

impl Default for MockBotClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BotApi for MockBotClient {
    async fn get_me(&self) -> Result<User> {
        Ok(User {
            id: 1,
            is_bot: true,
            username: Some(self.username.clone()),
        })
    }

    async fn get_updates(&self, offset: i64, _timeout_secs: u64) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);

        let next = self.update_batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Behave like an idle long poll.
                tokio::task::yield_now().await;
                Ok(Vec::new())
            }
        }
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        *self.download_count.lock().unwrap() += 1;

        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::Telegram(format!("Bad Request: invalid file_id {}", file_id)))
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}
