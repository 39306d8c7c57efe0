//! The two periodic jobs: traffic sync and reachability check.
//!
//! Both load every monitored interface, group them by owning device, and then walk the groups
//! one device at a time: decrypt the credential, open a session, run the per-interface work,
//! close the session. A failure on one device never stops the others.

pub mod grouping;
pub mod ping_check;
pub mod traffic_sync;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::db::enums::{LogStatus, LogType};
use crate::db::models::LogEntry;
use crate::db::services::{StoreError, TelemetryStore};
use crate::device::DeviceConnector;
use crate::notifications::NotificationDispatcher;
use crate::services::encryption_service::CredentialDecryptor;

pub use ping_check::run_ping_check;
pub use traffic_sync::run_traffic_sync;

#[derive(Error, Debug)]
pub enum PollingError {
    #[error("Failed to load monitored interfaces: {0}")]
    LoadInterfaces(#[source] StoreError),
}

/// Who started a job run. Recorded as the executor of the operation log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Manual,
}

impl Trigger {
    pub fn executor(&self) -> &'static str {
        match self {
            Trigger::Scheduled => "scheduler",
            Trigger::Manual => "operator",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executor())
    }
}

/// Collaborators shared by both jobs. Built once at start-up.
#[derive(Clone)]
pub struct PollingContext {
    pub store: Arc<dyn TelemetryStore>,
    pub connector: Arc<dyn DeviceConnector>,
    pub credentials: Arc<dyn CredentialDecryptor>,
    pub notifier: NotificationDispatcher,
    /// Address every reachability probe is sent to.
    pub ping_target: String,
}

impl PollingContext {
    /// Appends the operation log row for a job run. A failed write is logged and ignored.
    async fn record_run(
        &self,
        log_type: LogType,
        trigger: Trigger,
        status: LogStatus,
        description: String,
    ) {
        let entry = LogEntry {
            executor: trigger.executor().to_string(),
            log_type,
            status,
            description,
        };
        if let Err(e) = self.store.append_log(entry).await {
            error!(error = %e, log_type = %log_type, "Failed to write operation log.");
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrafficSyncSummary {
    pub devices_polled: usize,
    /// Soft-deleted devices and devices whose credential could not be decrypted.
    pub devices_skipped: usize,
    pub devices_unreachable: usize,
    pub samples_stored: usize,
    pub interfaces_failed: usize,
    pub alerts_raised: usize,
}

impl fmt::Display for TrafficSyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Traffic sync: {} device(s) polled, {} skipped, {} unreachable; {} sample(s) stored, {} interface(s) failed, {} alert(s) raised",
            self.devices_polled,
            self.devices_skipped,
            self.devices_unreachable,
            self.samples_stored,
            self.interfaces_failed,
            self.alerts_raised
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PingCheckSummary {
    pub devices_checked: usize,
    pub devices_skipped: usize,
    pub devices_unreachable: usize,
    pub interfaces_probed: usize,
    pub interfaces_with_issues: usize,
    pub reports_sent: usize,
}

impl fmt::Display for PingCheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ping check: {} device(s) checked, {} skipped, {} unreachable; {} interface(s) probed, {} with issues, {} report(s) sent",
            self.devices_checked,
            self.devices_skipped,
            self.devices_unreachable,
            self.interfaces_probed,
            self.interfaces_with_issues,
            self.reports_sent
        )
    }
}
