pub mod formatter;
pub mod models;
pub mod senders;
pub mod service;

pub use models::{AlertEvent, AlertKind, ParseMode, Severity, TelegramConfig};
pub use service::NotificationDispatcher;
