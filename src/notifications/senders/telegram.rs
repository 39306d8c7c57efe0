use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{NotificationSender, SenderError};
use crate::notifications::models::{AlertEvent, TelegramConfig};

/// A sender for pushing alerts via the Telegram Bot API.
pub struct TelegramSender {
    client: Client,
    config: TelegramConfig,
}

/// Upper bound for one Bot API call, connection included.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Result<Self, SenderError> {
        Self::with_timeout(config, DEFAULT_SEND_TIMEOUT)
    }

    /// Requests exceeding `timeout` fail with a network error.
    pub fn with_timeout(config: TelegramConfig, timeout: Duration) -> Result<Self, SenderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base, self.config.bot_token
        )
    }
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, event: &AlertEvent) -> Result<(), SenderError> {
        let payload = TelegramMessage {
            chat_id: &self.config.chat_id,
            text: &event.text,
            parse_mode: event.parse_mode.as_str(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .form(&payload)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "Telegram API returned non-success status: {status}. Body: {error_body}"
            )));
        }

        Ok(())
    }
}
