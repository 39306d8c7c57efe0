//! Data access for the polling jobs and operator operations. Router and interface CRUD lives
//! in the inventory backend; this crate only reads those tables and appends samples and log
//! rows.

pub mod log_service;
pub mod router_service;
pub mod telemetry_store;

pub use log_service::*;
pub use router_service::*;
pub use telemetry_store::*;
