//! Operator-initiated device operations: connectivity checks, inventory reads for onboarding,
//! and pushing bandwidth profiles. Each call opens its own session and closes it before
//! returning.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::encryption_service::{CredentialDecryptor, EncryptionError};
use crate::db::enums::{LogStatus, LogType};
use crate::db::models::{Device, LogEntry};
use crate::db::services::{get_router_by_id, insert_log};
use crate::device::query::{self, InterfaceSummary, ProfileKind, SystemInfo};
use crate::device::{DeviceConnector, DeviceError, DeviceSession};

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Router {0} not found")]
    RouterNotFound(Uuid),
    #[error("Router {id} cannot be used: {reason}")]
    InvalidRouter { id: Uuid, reason: String },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Credential error: {0}")]
    Credential(#[from] EncryptionError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

pub struct DeviceService {
    db: DatabaseConnection,
    connector: Arc<dyn DeviceConnector>,
    credentials: Arc<dyn CredentialDecryptor>,
}

impl DeviceService {
    pub fn new(
        db: DatabaseConnection,
        connector: Arc<dyn DeviceConnector>,
        credentials: Arc<dyn CredentialDecryptor>,
    ) -> Self {
        Self {
            db,
            connector,
            credentials,
        }
    }

    async fn open_session(
        &self,
        router_id: Uuid,
    ) -> Result<(Device, Box<dyn DeviceSession>), OperationError> {
        let router = get_router_by_id(&self.db, router_id)
            .await?
            .ok_or(OperationError::RouterNotFound(router_id))?;
        let device = Device::try_from(router)
            .map_err(|reason| OperationError::InvalidRouter { id: router_id, reason })?;

        let password = self.credentials.decrypt_secret(&device.encrypted_password)?;
        let session = self.connector.open(&device.target(password)).await?;
        Ok((device, session))
    }

    /// Board, firmware and identity of the router. Doubles as the connectivity test.
    pub async fn system_info(&self, router_id: Uuid) -> Result<SystemInfo, OperationError> {
        let (_, mut session) = self.open_session(router_id).await?;
        let result = query::fetch_system_info(session.as_mut()).await;
        session.close().await;
        Ok(result?)
    }

    pub async fn interfaces(&self, router_id: Uuid) -> Result<Vec<InterfaceSummary>, OperationError> {
        let (_, mut session) = self.open_session(router_id).await?;
        let result = query::list_interfaces(session.as_mut()).await;
        session.close().await;
        Ok(result?)
    }

    pub async fn queue_types(&self, router_id: Uuid) -> Result<Vec<String>, OperationError> {
        let (_, mut session) = self.open_session(router_id).await?;
        let result = query::list_queue_types(session.as_mut()).await;
        session.close().await;
        Ok(result?)
    }

    /// Creates a PPPoE or hotspot profile on the router and records the outcome in the
    /// operation log.
    pub async fn apply_profile(
        &self,
        router_id: Uuid,
        kind: &ProfileKind,
        name: &str,
        rate_limit: &str,
        executor: &str,
    ) -> Result<(), OperationError> {
        let result = self.push_profile(router_id, kind, name, rate_limit).await;

        let (status, description) = profile_log_line(kind, name, result.as_ref().err());
        match &result {
            Ok(()) => info!(router_id = %router_id, profile = name, "Profile applied."),
            Err(e) => error!(router_id = %router_id, profile = name, error = %e, "Failed to apply profile."),
        }

        let entry = LogEntry {
            executor: executor.to_string(),
            log_type: LogType::Configuration,
            status,
            description,
        };
        if let Err(e) = insert_log(&self.db, entry).await {
            error!(error = %e, "Failed to write operation log.");
        }
        result
    }

    async fn push_profile(
        &self,
        router_id: Uuid,
        kind: &ProfileKind,
        name: &str,
        rate_limit: &str,
    ) -> Result<(), OperationError> {
        let (_, mut session) = self.open_session(router_id).await?;
        let result = query::apply_profile(session.as_mut(), kind, name, rate_limit).await;
        session.close().await;
        Ok(result?)
    }
}

fn profile_label(kind: &ProfileKind) -> &'static str {
    match kind {
        ProfileKind::Pppoe(_) => "PPPoE",
        ProfileKind::Hotspot => "Hotspot",
    }
}

fn profile_log_line(
    kind: &ProfileKind,
    name: &str,
    error: Option<&OperationError>,
) -> (LogStatus, String) {
    let label = profile_label(kind);
    match error {
        None => (
            LogStatus::Success,
            format!("Created {label} profile '{name}' on router"),
        ),
        Some(e) => (
            LogStatus::Error,
            format!("Failed to create {label} profile '{name}': {e}"),
        ),
    }
}
