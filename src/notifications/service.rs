use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::models::{AlertEvent, TelegramConfig};
use super::senders::{NotificationSender, SenderError};
use super::senders::telegram::TelegramSender;

/// Queue in front of the alert sender. Polling code hands events over and moves on; a single
/// background task drains the queue and delivers them one by one.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    tx: Option<mpsc::UnboundedSender<AlertEvent>>,
}

impl NotificationDispatcher {
    /// A dispatcher that drops every event.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Starts the delivery task for `sender`. The task ends once every dispatcher clone is dropped.
    pub fn spawn(sender: Arc<dyn NotificationSender>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<AlertEvent>();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match sender.send(&event).await {
                    Ok(()) => debug!(kind = ?event.kind, "Alert delivered."),
                    Err(e) => warn!(kind = ?event.kind, error = %e, "Failed to deliver alert."),
                }
            }
        });
        (Self { tx: Some(tx) }, handle)
    }

    /// Telegram delivery when configured, otherwise a disabled dispatcher.
    pub fn from_config(
        config: Option<TelegramConfig>,
    ) -> Result<(Self, Option<JoinHandle<()>>), SenderError> {
        match config {
            Some(config) => {
                info!(chat_id = %config.chat_id, "Telegram notifications enabled.");
                let sender = TelegramSender::new(config)?;
                let (dispatcher, handle) = Self::spawn(Arc::new(sender));
                Ok((dispatcher, Some(handle)))
            }
            None => {
                info!("Telegram bot token or chat id not set. Notifications are disabled.");
                Ok((Self::disabled(), None))
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queues an event for delivery. Never blocks and never fails.
    pub fn dispatch(&self, event: AlertEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(event).is_err() {
            warn!("Notification task has stopped. Alert dropped.");
        }
    }

    /// A dispatcher whose queue is handed back to the caller instead of a sender task.
    #[cfg(test)]
    pub fn capturing() -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::models::{AlertKind, ParseMode, Severity};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingSender {
        sent: Mutex<Vec<String>>,
        fail_first: bool,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, event: &AlertEvent) -> Result<(), SenderError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(event.text.clone());
            if self.fail_first && sent.len() == 1 {
                return Err(SenderError::SendFailed("boom".to_string()));
            }
            Ok(())
        }
    }

    fn event(text: &str) -> AlertEvent {
        AlertEvent {
            kind: AlertKind::TrafficDrop,
            severity: Severity::Warning,
            text: text.to_string(),
            parse_mode: ParseMode::Markdown,
        }
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_stop_queue() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
            fail_first: true,
        });
        let (dispatcher, handle) = NotificationDispatcher::spawn(sender.clone());

        dispatcher.dispatch(event("first"));
        dispatcher.dispatch(event("second"));
        drop(dispatcher);
        handle.await.unwrap();

        assert_eq!(*sender.sent.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_disabled_dispatcher_drops_silently() {
        let dispatcher = NotificationDispatcher::disabled();
        assert!(!dispatcher.is_enabled());
        dispatcher.dispatch(event("ignored"));
    }
}
