//! SeaORM entities for the router inventory, monitored interfaces, traffic samples and the
//! operation log.

pub mod interface_monitoring;
pub mod interface_traffic;
pub mod log;
pub mod router;

pub mod prelude {
    pub use super::interface_monitoring::Entity as InterfaceMonitoring;
    pub use super::interface_traffic::Entity as InterfaceTraffic;
    pub use super::log::Entity as Log;
    pub use super::router::Entity as Router;
}
