use async_trait::async_trait;
use thiserror::Error;

use super::models::AlertEvent;

pub mod telegram;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Delivers rendered alerts to one destination.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, event: &AlertEvent) -> Result<(), SenderError>;
}
