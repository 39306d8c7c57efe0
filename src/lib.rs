//! Telemetry polling and alerting for an ISP's RouterOS access routers.
//!
//! Two periodic jobs walk every monitored interface: one stores throughput samples and warns
//! about traffic drops, the other pings out of each interface and reports loss, errors and
//! unreachable routers to Telegram.

pub mod alerting;
pub mod db;
pub mod device;
pub mod notifications;
pub mod polling;
pub mod routeros;
pub mod server;
pub mod services;
