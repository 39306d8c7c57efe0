use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::notifications::TelegramConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    /// 64 hex characters (32-byte AES-256 key) used for stored router passwords.
    pub credential_encryption_key: String,
    /// Raw 32-character key of the inventory backend, for passwords it stored in CFB form.
    pub legacy_aes_key: Option<String>,

    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,

    #[serde(default = "default_traffic_sync_interval")]
    pub traffic_sync_interval_secs: u64,

    #[serde(default = "default_ping_check_interval")]
    pub ping_check_interval_secs: u64,

    #[serde(default = "default_ping_target")]
    pub ping_target: String,

    #[serde(default = "default_connect_timeout")]
    pub device_connect_timeout_secs: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    credential_encryption_key: Option<String>,
    legacy_aes_key: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_chat_id: Option<String>,
    telegram_api_base: Option<String>,
    traffic_sync_interval_secs: Option<u64>,
    ping_check_interval_secs: Option<u64>,
    ping_target: Option<String>,
    device_connect_timeout_secs: Option<u64>,
    log_dir: Option<String>,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_traffic_sync_interval() -> u64 {
    3600
}

fn default_ping_check_interval() -> u64 {
    1800
}

fn default_ping_target() -> String {
    "1.1.1.1".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    /// `.env`, then the optional TOML file, then environment variables on top.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) if Path::new(path_str).exists() => read_file(path_str)?,
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()?;

        // 3. Merge: environment overrides file
        merge(env_config, file_config)
    }

    pub fn telegram(&self) -> Option<TelegramConfig> {
        TelegramConfig::from_parts(
            self.telegram_bot_token.as_deref(),
            self.telegram_chat_id.as_deref(),
            &self.telegram_api_base,
        )
    }

    pub fn traffic_sync_interval(&self) -> Duration {
        Duration::from_secs(self.traffic_sync_interval_secs)
    }

    pub fn ping_check_interval(&self) -> Duration {
        Duration::from_secs(self.ping_check_interval_secs)
    }

    pub fn device_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.device_connect_timeout_secs)
    }
}

fn read_file(path: &str) -> Result<PartialServerConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn merge(
    env_config: PartialServerConfig,
    file_config: PartialServerConfig,
) -> Result<ServerConfig, ConfigError> {
    let config = ServerConfig {
        database_url: non_empty(env_config.database_url.or(file_config.database_url))
            .ok_or(ConfigError::Missing("DATABASE_URL"))?,
        credential_encryption_key: non_empty(
            env_config
                .credential_encryption_key
                .or(file_config.credential_encryption_key),
        )
        .ok_or(ConfigError::Missing("CREDENTIAL_ENCRYPTION_KEY"))?,
        legacy_aes_key: non_empty(env_config.legacy_aes_key.or(file_config.legacy_aes_key)),
        telegram_bot_token: non_empty(
            env_config
                .telegram_bot_token
                .or(file_config.telegram_bot_token),
        ),
        telegram_chat_id: non_empty(env_config.telegram_chat_id.or(file_config.telegram_chat_id)),
        telegram_api_base: env_config
            .telegram_api_base
            .or(file_config.telegram_api_base)
            .unwrap_or_else(default_telegram_api_base),
        traffic_sync_interval_secs: env_config
            .traffic_sync_interval_secs
            .or(file_config.traffic_sync_interval_secs)
            .unwrap_or_else(default_traffic_sync_interval),
        ping_check_interval_secs: env_config
            .ping_check_interval_secs
            .or(file_config.ping_check_interval_secs)
            .unwrap_or_else(default_ping_check_interval),
        ping_target: env_config
            .ping_target
            .or(file_config.ping_target)
            .unwrap_or_else(default_ping_target),
        device_connect_timeout_secs: env_config
            .device_connect_timeout_secs
            .or(file_config.device_connect_timeout_secs)
            .unwrap_or_else(default_connect_timeout),
        log_dir: env_config
            .log_dir
            .or(file_config.log_dir)
            .unwrap_or_else(default_log_dir),
    };

    if config.traffic_sync_interval_secs == 0 {
        return Err(ConfigError::ZeroInterval("TRAFFIC_SYNC_INTERVAL_SECS"));
    }
    if config.ping_check_interval_secs == 0 {
        return Err(ConfigError::ZeroInterval("PING_CHECK_INTERVAL_SECS"));
    }
    Ok(config)
}
