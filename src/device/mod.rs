//! Sessions to managed routers and the typed queries issued over them.

pub mod query;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

use crate::routeros;

#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device could not be dialled or refused the login. Aborts the whole device group.
    #[error("Failed to connect to {address}: {source}")]
    ConnectFailed {
        address: String,
        #[source]
        source: routeros::Error,
    },
    #[error("No traffic data returned for interface '{0}'")]
    NoData(String),
    #[error("Ping from interface '{interface}' failed: {reason}")]
    ProbeFailed { interface: String, reason: String },
    #[error("Profile '{0}' already exists on the device")]
    ProfileExists(String),
    #[error("Failed to apply profile '{name}': {reason}")]
    ApplyFailed { name: String, reason: String },
    #[error("Command failed: {0}")]
    Command(#[from] routeros::Error),
}

pub use query::{
    InterfaceSummary, PppoeSettings, ProbeStats, ProfileKind, SystemInfo, TrafficSnapshot,
};
pub use session::{DeviceConnector, DeviceSession, DeviceTarget, RouterOsConnector};
