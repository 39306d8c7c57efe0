use std::collections::HashMap;

use uuid::Uuid;

use crate::db::models::{Device, MonitoredInterface};

/// The interfaces of one device, served by a single session.
#[derive(Debug, Clone)]
pub struct DeviceGroup {
    pub device: Device,
    pub interfaces: Vec<MonitoredInterface>,
}

/// Buckets a flat interface list by owning device. Iteration order of the result is not
/// meaningful.
pub fn group_by_device(interfaces: Vec<MonitoredInterface>) -> HashMap<Uuid, DeviceGroup> {
    let mut groups: HashMap<Uuid, DeviceGroup> = HashMap::new();
    for interface in interfaces {
        groups
            .entry(interface.device.id)
            .or_insert_with(|| DeviceGroup {
                device: interface.device.clone(),
                interfaces: Vec::new(),
            })
            .interfaces
            .push(interface);
    }
    groups
}
