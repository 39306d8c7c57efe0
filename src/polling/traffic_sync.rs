use chrono::{Local, Utc};
use tracing::{debug, error, info, warn};

use super::grouping::{DeviceGroup, group_by_device};
use super::{PollingContext, PollingError, TrafficSyncSummary, Trigger};
use crate::alerting::is_low_traffic;
use crate::db::enums::{LogStatus, LogType};
use crate::db::models::TrafficSample;
use crate::device::DeviceSession;
use crate::device::query::fetch_traffic_snapshot;
use crate::notifications::formatter;

/// Samples the current throughput of every monitored interface, stores one sample per
/// interface and raises a traffic drop alert for slow ones.
///
/// Only a failure to load the interface list fails the run; everything else is logged and
/// the run moves on to the next interface or device.
pub async fn run_traffic_sync(
    ctx: &PollingContext,
    trigger: Trigger,
) -> Result<TrafficSyncSummary, PollingError> {
    info!(trigger = %trigger, "Traffic sync started.");

    let interfaces = match ctx.store.list_active_interfaces_with_device().await {
        Ok(interfaces) => interfaces,
        Err(e) => {
            error!(error = %e, "Traffic sync could not load monitored interfaces.");
            ctx.record_run(
                LogType::TrafficSync,
                trigger,
                LogStatus::Error,
                format!("Failed to load monitored interfaces: {e}"),
            )
            .await;
            return Err(PollingError::LoadInterfaces(e));
        }
    };

    let mut summary = TrafficSyncSummary::default();
    for group in group_by_device(interfaces).into_values() {
        let device = &group.device;
        if device.deleted {
            debug!(device = %device.name, "Skipping soft-deleted device.");
            summary.devices_skipped += 1;
            continue;
        }

        let password = match ctx.credentials.decrypt_secret(&device.encrypted_password) {
            Ok(password) => password,
            Err(e) => {
                warn!(device = %device.name, error = %e, "Could not decrypt device credential. Skipping device.");
                summary.devices_skipped += 1;
                continue;
            }
        };

        let mut session = match ctx.connector.open(&device.target(password)).await {
            Ok(session) => session,
            Err(e) => {
                warn!(device = %device.name, error = %e, "Device unreachable. Skipping device.");
                summary.devices_unreachable += 1;
                continue;
            }
        };

        sync_group(ctx, session.as_mut(), &group, &mut summary).await;
        session.close().await;
        summary.devices_polled += 1;
    }

    info!(
        devices = summary.devices_polled,
        samples = summary.samples_stored,
        alerts = summary.alerts_raised,
        "Traffic sync finished."
    );
    ctx.record_run(
        LogType::TrafficSync,
        trigger,
        LogStatus::Success,
        summary.to_string(),
    )
    .await;
    Ok(summary)
}

async fn sync_group(
    ctx: &PollingContext,
    session: &mut dyn DeviceSession,
    group: &DeviceGroup,
    summary: &mut TrafficSyncSummary,
) {
    let device = &group.device;
    for interface in &group.interfaces {
        let snapshot = match fetch_traffic_snapshot(session, &interface.name).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(device = %device.name, interface = %interface.name, error = %e, "Traffic query failed.");
                summary.interfaces_failed += 1;
                continue;
            }
        };

        let sample = TrafficSample {
            interface_id: interface.id,
            rx_bps: snapshot.rx_bps,
            tx_bps: snapshot.tx_bps,
            captured_at: Utc::now(),
        };
        match ctx.store.insert_traffic_sample(&sample).await {
            Ok(()) => summary.samples_stored += 1,
            Err(e) => {
                error!(device = %device.name, interface = %interface.name, error = %e, "Failed to store traffic sample.")
            }
        }

        if is_low_traffic(snapshot.rx_bps, snapshot.tx_bps) {
            debug!(device = %device.name, interface = %interface.name, rx_bps = snapshot.rx_bps, tx_bps = snapshot.tx_bps, "Traffic below threshold.");
            ctx.notifier.dispatch(formatter::traffic_drop(
                &device.name,
                &interface.name,
                snapshot.rx_bps,
                snapshot.tx_bps,
                Local::now().naive_local(),
            ));
            summary.alerts_raised += 1;
        }
    }
}
