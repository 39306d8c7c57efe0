use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    TrafficDrop,
    PingReport,
    DeviceDisconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Warning,
    Critical,
}

/// Formatting dialect a message was rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::Html => "HTML",
        }
    }
}

/// A rendered, self-contained alert. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub severity: Severity,
    pub text: String,
    pub parse_mode: ParseMode,
}

/// Bot credentials and destination for alert delivery.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl TelegramConfig {
    /// `None` unless both the token and the chat id are non-empty.
    pub fn from_parts(
        bot_token: Option<&str>,
        chat_id: Option<&str>,
        api_base: &str,
    ) -> Option<Self> {
        let bot_token = bot_token.map(str::trim).filter(|s| !s.is_empty())?;
        let chat_id = chat_id.map(str::trim).filter(|s| !s.is_empty())?;
        Some(Self {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_or_chat_disables_delivery() {
        assert!(TelegramConfig::from_parts(None, Some("42"), "https://api.telegram.org").is_none());
        assert!(TelegramConfig::from_parts(Some("t"), Some("  "), "https://api.telegram.org").is_none());

        let config =
            TelegramConfig::from_parts(Some("123:abc"), Some("-100200"), "https://api.telegram.org/")
                .unwrap();
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert!(!format!("{config:?}").contains("123:abc"));
    }
}
