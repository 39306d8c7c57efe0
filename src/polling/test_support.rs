use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::PollingContext;
use crate::db::models::{Device, LogEntry, MonitoredInterface, TrafficSample, TransportKind};
use crate::db::services::{StoreError, TelemetryStore};
use crate::device::testing::ScriptedConnector;
use crate::notifications::{AlertEvent, NotificationDispatcher};
use crate::services::encryption_service::{CredentialDecryptor, EncryptionError};

pub fn device(name: &str, address: &str) -> Device {
    Device {
        id: Uuid::new_v4(),
        name: name.to_string(),
        address: address.to_string(),
        port: 8728,
        username: "monitor".to_string(),
        encrypted_password: format!("enc:{name}-secret"),
        transport: TransportKind::Plain,
        deleted: false,
    }
}

pub fn interface(id: i32, name: &str, device: &Device, excluded: bool) -> MonitoredInterface {
    MonitoredInterface {
        id,
        name: name.to_string(),
        excluded,
        device: device.clone(),
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub interfaces: Vec<MonitoredInterface>,
    pub fail_listing: bool,
    pub fail_inserts: bool,
    pub samples: Mutex<Vec<TrafficSample>>,
    pub logs: Mutex<Vec<LogEntry>>,
}

impl FakeStore {
    pub fn with_interfaces(interfaces: Vec<MonitoredInterface>) -> Self {
        Self {
            interfaces,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TelemetryStore for FakeStore {
    async fn list_active_interfaces_with_device(&self) -> Result<Vec<MonitoredInterface>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Database(sea_orm::DbErr::Custom(
                "connection refused".to_string(),
            )));
        }
        Ok(self.interfaces.clone())
    }

    async fn insert_traffic_sample(&self, sample: &TrafficSample) -> Result<(), StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Database(sea_orm::DbErr::Custom(
                "disk full".to_string(),
            )));
        }
        self.samples.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn append_log(&self, entry: LogEntry) -> Result<(), StoreError> {
        self.logs.lock().unwrap().push(entry);
        Ok(())
    }
}

/// Accepts `enc:<secret>` and rejects everything else.
pub struct FakeDecryptor;

impl CredentialDecryptor for FakeDecryptor {
    fn decrypt_secret(&self, stored: &str) -> Result<String, EncryptionError> {
        stored
            .strip_prefix("enc:")
            .map(str::to_string)
            .ok_or_else(|| EncryptionError::DecryptionFailed("aead::Error".to_string()))
    }
}

pub struct Harness {
    pub context: PollingContext,
    pub store: Arc<FakeStore>,
    pub connector: Arc<ScriptedConnector>,
    alerts: mpsc::UnboundedReceiver<AlertEvent>,
}

impl Harness {
    pub fn new(store: FakeStore, connector: ScriptedConnector) -> Self {
        let store = Arc::new(store);
        let connector = Arc::new(connector);
        let (notifier, alerts) = NotificationDispatcher::capturing();
        let context = PollingContext {
            store: store.clone(),
            connector: connector.clone(),
            credentials: Arc::new(FakeDecryptor),
            notifier,
            ping_target: "1.1.1.1".to_string(),
        };
        Self {
            context,
            store,
            connector,
            alerts,
        }
    }

    /// Alerts queued so far.
    pub fn alerts(&mut self) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.alerts.try_recv() {
            events.push(event);
        }
        events
    }
}
