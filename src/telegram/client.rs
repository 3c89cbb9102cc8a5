use super::types::{
    ApiResponse, File, GetFileRequest, GetUpdatesRequest, SendMessageRequest, Update, User,
};
use super::BotApi;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Slack on top of the long-poll timeout before the request itself is abandoned.
const POLL_GRACE: Duration = Duration::from_secs(10);

pub struct TelegramClient {
    client: Client,
    token: String,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: String, base_url: String) -> Self {
        Self::new_with_client(token, base_url, Client::new())
    }

    pub fn new_with_client(token: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        request: &Req,
        timeout: Option<Duration>,
    ) -> Result<Resp> {
        let mut builder = self.client.post(self.method_url(method)).json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        // The token is part of the URL, so it is stripped from transport errors.
        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to send {} request to Telegram: {}", method, e);
            e
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url())?;
        let envelope: ApiResponse<Resp> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                "Failed to parse Telegram {} response (status {}): {}",
                method,
                status,
                e
            );
            Error::Telegram(format!("Failed to parse {} response: {}", method, e))
        })?;

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| format!("status {}", status));
            tracing::error!("Telegram API error on {}: {}", method, description);
            return Err(Error::Telegram(description));
        }

        envelope
            .result
            .ok_or_else(|| Error::Telegram(format!("No result in {} response", method)))
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message".to_string()],
        };

        self.call(
            "getUpdates",
            &request,
            Some(Duration::from_secs(timeout_secs) + POLL_GRACE),
        )
        .await
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file: File = self
            .call(
                "getFile",
                &GetFileRequest {
                    file_id: file_id.to_string(),
                },
                None,
            )
            .await?;

        let file_path = file.file_path.ok_or_else(|| {
            Error::Telegram(format!("File {} is not available for download", file.file_id))
        })?;

        let response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !response.status().is_success() {
            return Err(Error::Telegram(format!(
                "File download failed (status {})",
                response.status()
            )));
        }

        Ok(response.bytes().await.map_err(|e| e.without_url())?.to_vec())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
        };

        let _: serde_json::Value = self.call("sendMessage", &request, None).await?;
        Ok(())
    }
}
