use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::entities::{interface_monitoring, router};
use super::enums::{LogStatus, LogType};
use crate::device::DeviceTarget;

/// How the management API is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    Plain,
    /// TLS without certificate validation.
    TlsInsecure,
}

impl TransportKind {
    pub fn from_remote_type(remote_type: &str) -> Self {
        if remote_type.trim().eq_ignore_ascii_case("API-SSL") {
            TransportKind::TlsInsecure
        } else {
            TransportKind::Plain
        }
    }
}

/// Read-only snapshot of a router for the duration of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub username: String,
    /// Stored form of the API password; decrypt before dialling.
    pub encrypted_password: String,
    pub transport: TransportKind,
    pub deleted: bool,
}

impl Device {
    pub fn target(&self, password: String) -> DeviceTarget {
        DeviceTarget {
            name: self.name.clone(),
            address: self.address.clone(),
            port: self.port,
            username: self.username.clone(),
            password,
            transport: self.transport,
        }
    }
}

impl TryFrom<router::Model> for Device {
    type Error = String;

    fn try_from(model: router::Model) -> Result<Self, Self::Error> {
        let port = u16::try_from(model.router_port)
            .map_err(|_| format!("invalid API port {}", model.router_port))?;
        Ok(Self {
            id: model.router_id,
            transport: TransportKind::from_remote_type(&model.router_remote_type),
            name: model.router_name,
            address: model.router_address,
            port,
            username: model.router_username,
            encrypted_password: model.router_password,
            deleted: model.is_deleted,
        })
    }
}

/// A monitored interface together with its owning device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredInterface {
    pub id: i32,
    pub name: String,
    pub excluded: bool,
    pub device: Device,
}

impl MonitoredInterface {
    pub fn new(model: interface_monitoring::Model, device: Device) -> Self {
        Self {
            id: model.interface_id,
            name: model.interface_name,
            excluded: model.is_excluded,
            device,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSample {
    pub interface_id: i32,
    pub rx_bps: f64,
    pub tx_bps: f64,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub executor: String,
    pub log_type: LogType,
    pub status: LogStatus,
    pub description: String,
}
