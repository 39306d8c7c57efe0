use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::DeviceError;
use crate::db::models::TransportKind;
use crate::routeros::{Client, Command, Record};

/// Everything needed to dial one device: address, login and the already-decrypted secret.
#[derive(Clone)]
pub struct DeviceTarget {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub transport: TransportKind,
}

impl DeviceTarget {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Debug for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceTarget")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("transport", &self.transport)
            .finish()
    }
}

/// One open, authenticated connection. Serves the interfaces of a single device for a
/// single job run and is then closed.
#[async_trait]
pub trait DeviceSession: Send {
    /// Runs one command and returns the data records of the reply.
    async fn run(&mut self, command: &Command) -> Result<Vec<Record>, DeviceError>;

    /// Releases the transport.
    async fn close(self: Box<Self>);
}

/// Opens sessions. Sessions are never pooled; every call dials anew.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, DeviceError>;
}

/// Connector for RouterOS API (`plain`) and API-SSL (`tls-insecure`) endpoints.
#[derive(Debug, Clone)]
pub struct RouterOsConnector {
    connect_timeout: Duration,
}

impl RouterOsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl DeviceConnector for RouterOsConnector {
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, DeviceError> {
        let use_tls = matches!(target.transport, TransportKind::TlsInsecure);
        debug!(device = %target.name, endpoint = %target.endpoint(), tls = use_tls, "Opening device session.");

        let client = Client::connect(
            &target.address,
            target.port,
            &target.username,
            &target.password,
            use_tls,
            self.connect_timeout,
        )
        .await
        .map_err(|source| DeviceError::ConnectFailed {
            address: target.endpoint(),
            source,
        })?;

        Ok(Box::new(RouterOsSession { client }))
    }
}

struct RouterOsSession {
    client: Client,
}

#[async_trait]
impl DeviceSession for RouterOsSession {
    async fn run(&mut self, command: &Command) -> Result<Vec<Record>, DeviceError> {
        let reply = self.client.run(command).await?;
        Ok(reply.re)
    }

    async fn close(self: Box<Self>) {
        self.client.close().await;
    }
}
