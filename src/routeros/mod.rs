//! Client for the RouterOS API, the management protocol spoken by the monitored routers.
//!
//! The protocol exchanges *sentences*: length-prefixed words terminated by an empty word.
//! A request is a command path followed by `=key=value` attribute words; the reply is a
//! series of `!re` records closed by `!done` (or interrupted by `!trap` / `!fatal`).

pub mod client;
pub mod codec;
pub mod command;
pub mod tls;

use thiserror::Error;

pub use client::{Client, Reply};
pub use command::{Command, Record};

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Login failed: {0}")]
    Login(String),
    #[error("Device returned an error: {message}")]
    Trap {
        category: Option<String>,
        message: String,
    },
    #[error("Session terminated by device: {0}")]
    Fatal(String),
    #[error("Timed out after {0} seconds")]
    Timeout(u64),
}
