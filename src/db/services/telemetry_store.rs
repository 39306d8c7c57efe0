use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use thiserror::Error;
use tracing::warn;

use super::log_service;
use crate::db::entities::{interface_monitoring, interface_traffic, prelude::*};
use crate::db::models::{Device, LogEntry, MonitoredInterface, TrafficSample};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Persistence used by the polling jobs.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Every interface that is not soft-deleted, with its owning device. Devices may themselves
    /// be soft-deleted; the caller decides what to do with those.
    async fn list_active_interfaces_with_device(&self) -> Result<Vec<MonitoredInterface>, StoreError>;

    async fn insert_traffic_sample(&self, sample: &TrafficSample) -> Result<(), StoreError>;

    async fn append_log(&self, entry: LogEntry) -> Result<(), StoreError>;
}

pub struct SeaOrmTelemetryStore {
    db: DatabaseConnection,
}

impl SeaOrmTelemetryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TelemetryStore for SeaOrmTelemetryStore {
    async fn list_active_interfaces_with_device(&self) -> Result<Vec<MonitoredInterface>, StoreError> {
        let rows = InterfaceMonitoring::find()
            .filter(interface_monitoring::Column::IsDeleted.eq(false))
            .order_by_asc(interface_monitoring::Column::InterfaceId)
            .find_also_related(Router)
            .all(&self.db)
            .await?;

        let mut interfaces = Vec::with_capacity(rows.len());
        for (interface, router) in rows {
            let Some(router) = router else {
                warn!(interface_id = interface.interface_id, "Monitored interface has no router. Skipping.");
                continue;
            };
            let router_name = router.router_name.clone();
            match Device::try_from(router) {
                Ok(device) => interfaces.push(MonitoredInterface::new(interface, device)),
                Err(e) => warn!(device = %router_name, error = %e, "Router row is unusable. Skipping its interfaces."),
            }
        }
        Ok(interfaces)
    }

    async fn insert_traffic_sample(&self, sample: &TrafficSample) -> Result<(), StoreError> {
        let now = Utc::now();
        let new_sample = interface_traffic::ActiveModel {
            interface_id: Set(sample.interface_id),
            download_speed: Set(sample.rx_bps),
            upload_speed: Set(sample.tx_bps),
            timestamp: Set(sample.captured_at),
            created_at: Set(now),
            updated_at: Set(now),
            is_deleted: Set(false),
            ..Default::default()
        };
        new_sample.insert(&self.db).await?;
        Ok(())
    }

    async fn append_log(&self, entry: LogEntry) -> Result<(), StoreError> {
        log_service::insert_log(&self.db, entry).await?;
        Ok(())
    }
}
