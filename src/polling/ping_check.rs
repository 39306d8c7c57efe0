use chrono::Local;
use tracing::{debug, error, info, warn};

use super::grouping::{DeviceGroup, group_by_device};
use super::{PingCheckSummary, PollingContext, PollingError, Trigger};
use crate::alerting::classify_probe;
use crate::alerting::thresholds::PROBE_COUNT;
use crate::db::enums::{LogStatus, LogType};
use crate::device::DeviceSession;
use crate::device::query::probe_reachability;
use crate::notifications::formatter::{self, PingReportLine};

/// Pings the probe target from every non-excluded interface and sends one consolidated report
/// per device that has at least one failing interface. An unreachable device raises a
/// disconnect alert instead.
pub async fn run_ping_check(
    ctx: &PollingContext,
    trigger: Trigger,
) -> Result<PingCheckSummary, PollingError> {
    info!(trigger = %trigger, target = %ctx.ping_target, "Ping check started.");

    let interfaces = match ctx.store.list_active_interfaces_with_device().await {
        Ok(interfaces) => interfaces,
        Err(e) => {
            error!(error = %e, "Ping check could not load monitored interfaces.");
            ctx.record_run(
                LogType::PingCheck,
                trigger,
                LogStatus::Error,
                format!("Failed to load monitored interfaces: {e}"),
            )
            .await;
            return Err(PollingError::LoadInterfaces(e));
        }
    };

    let mut summary = PingCheckSummary::default();
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
                warn!(device = %device.name, error = %e, "Device unreachable. Raising disconnect alert.");
                ctx.notifier.dispatch(formatter::device_disconnected(
                    &device.name,
                    &e.to_string(),
                    Local::now().naive_local(),
                ));
                summary.devices_unreachable += 1;
                continue;
            }
        };

        let lines = probe_group(ctx, session.as_mut(), &group).await;
        session.close().await;
        summary.devices_checked += 1;
        summary.interfaces_probed += lines.len();

        let issues = lines.iter().filter(|l| l.outcome.is_issue()).count();
        if issues == 0 {
            debug!(device = %device.name, "All probed interfaces healthy. No report sent.");
            continue;
        }

        info!(device = %device.name, issues, "Ping issues found. Sending report.");
        summary.interfaces_with_issues += issues;
        ctx.notifier.dispatch(formatter::ping_report(
            &device.name,
            &ctx.ping_target,
            &lines,
            Local::now().naive_local(),
        ));
        summary.reports_sent += 1;
    }

    info!(
        devices = summary.devices_checked,
        unreachable = summary.devices_unreachable,
        reports = summary.reports_sent,
        "Ping check finished."
    );
    ctx.record_run(
        LogType::PingCheck,
        trigger,
        LogStatus::Success,
        summary.to_string(),
    )
    .await;
    Ok(summary)
}

async fn probe_group(
    ctx: &PollingContext,
    session: &mut dyn DeviceSession,
    group: &DeviceGroup,
) -> Vec<PingReportLine> {
    let mut lines = Vec::with_capacity(group.interfaces.len());
    for interface in group.interfaces.iter().filter(|i| !i.excluded) {
        let result =
            probe_reachability(session, &interface.name, &ctx.ping_target, PROBE_COUNT).await;
        if let Err(e) = &result {
            warn!(device = %group.device.name, interface = %interface.name, error = %e, "Ping failed.");
        }

        let outcome = classify_probe(&result);
        debug!(device = %group.device.name, interface = %interface.name, ?outcome, "Interface probed.");
        lines.push(PingReportLine {
            interface: interface.name.clone(),
            outcome,
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::{ScriptedConnector, ScriptedSession};
    use crate::notifications::{AlertKind, ParseMode, Severity};
    use crate::polling::test_support::{FakeStore, Harness, device, interface};

    #[tokio::test]
    async fn test_healthy_and_slow_interfaces_send_nothing() {
        let d = device("core-01", "10.0.0.1");
        let session = ScriptedSession::default()
            .with_ping("ether1", &[Some("10ms"), Some("12ms"), Some("14ms")])
            .with_ping("ether2", &[Some("300ms"), Some("310ms"), Some("320ms")]);
        let mut harness = Harness::new(
            FakeStore::with_interfaces(vec![
                interface(1, "ether1", &d, false),
                interface(2, "ether2", &d, false),
            ]),
            ScriptedConnector::default().with_device("10.0.0.1", session.clone()),
        );

        let summary = run_ping_check(&harness.context, Trigger::Scheduled).await.unwrap();

        assert_eq!(summary.interfaces_probed, 2);
        assert_eq!(summary.reports_sent, 0);
        assert!(harness.alerts().is_empty());
        assert_eq!(session.close_count(), 1);
    }

    #[tokio::test]
    async fn test_partial_loss_sends_one_report() {
        let d = device("core-01", "10.0.0.1");
        let session = ScriptedSession::default()
            .with_ping("ether1", &[Some("10ms"), None, Some("14ms")])
            .with_ping("ether2", &[Some("5ms"), Some("5ms"), Some("5ms")]);
        let mut harness = Harness::new(
            FakeStore::with_interfaces(vec![
                interface(1, "ether1", &d, false),
                interface(2, "ether2", &d, false),
            ]),
            ScriptedConnector::default().with_device("10.0.0.1", session),
        );

        let summary = run_ping_check(&harness.context, Trigger::Scheduled).await.unwrap();

        assert_eq!(summary.reports_sent, 1);
        assert_eq!(summary.interfaces_with_issues, 1);
        let alerts = harness.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::PingReport);
        assert!(alerts[0].text.contains("⚠️ ether1: Loss 33%"));
        assert!(alerts[0].text.contains("✅ ether2: 5ms"));
    }

    #[tokio::test]
    async fn test_probe_without_replies_is_reported_as_error() {
        let d = device("core-01", "10.0.0.1");
        let mut harness = Harness::new(
            FakeStore::with_interfaces(vec![interface(1, "ether1", &d, false)]),
            ScriptedConnector::default().with_device("10.0.0.1", ScriptedSession::default()),
        );

        run_ping_check(&harness.context, Trigger::Scheduled).await.unwrap();

        let alerts = harness.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].text.contains("❌ ether1: Error Exec"));
    }

    #[tokio::test]
    async fn test_excluded_interfaces_are_never_probed() {
        let d = device("core-01", "10.0.0.1");
        let session = ScriptedSession::default()
            .with_ping("ether1", &[None, None, None])
            .with_ping("uplink", &[None, None, None]);
        let mut harness = Harness::new(
            FakeStore::with_interfaces(vec![
                interface(1, "ether1", &d, false),
                interface(2, "uplink", &d, true),
            ]),
            ScriptedConnector::default().with_device("10.0.0.1", session.clone()),
        );

        run_ping_check(&harness.context, Trigger::Scheduled).await.unwrap();

        let issued = session.issued();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].get("interface"), Some("ether1"));
        let alerts = harness.alerts();
        assert!(alerts[0].text.contains("🔴 ether1: RTO (100% Loss)"));
        assert!(!alerts[0].text.contains("uplink"));
    }

    #[tokio::test]
    async fn test_unreachable_device_raises_disconnect_alert_and_siblings_continue() {
        let down = device("edge-07", "10.0.0.7");
        let up = device("core-01", "10.0.0.1");
        let session = ScriptedSession::default().with_ping("ether1", &[None, None, None]);
        let mut harness = Harness::new(
            FakeStore::with_interfaces(vec![
                interface(1, "ether1", &down, false),
                interface(2, "ether1", &up, false),
            ]),
            ScriptedConnector::default().with_device("10.0.0.1", session.clone()),
        );

        let summary = run_ping_check(&harness.context, Trigger::Scheduled).await.unwrap();

        assert_eq!(summary.devices_unreachable, 1);
        assert_eq!(summary.devices_checked, 1);
        assert_eq!(session.close_count(), 1);

        let alerts = harness.alerts();
        assert_eq!(alerts.len(), 2);
        let disconnect = alerts
            .iter()
            .find(|a| a.kind == AlertKind::DeviceDisconnected)
            .unwrap();
        assert_eq!(disconnect.severity, Severity::Critical);
        assert_eq!(disconnect.parse_mode, ParseMode::Html);
        assert!(disconnect.text.contains("edge-07"));
        assert!(disconnect.text.contains("10.0.0.7:8728"));
    }

    #[tokio::test]
    async fn test_decrypt_failure_skips_device_without_alert() {
        let mut d = device("core-01", "10.0.0.1");
        d.encrypted_password = "not-encrypted".to_string();
        let mut harness = Harness::new(
            FakeStore::with_interfaces(vec![interface(1, "ether1", &d, false)]),
            ScriptedConnector::default(),
        );

        let summary = run_ping_check(&harness.context, Trigger::Scheduled).await.unwrap();

        assert_eq!(summary.devices_skipped, 1);
        assert!(harness.connector.opened().is_empty());
        assert!(harness.alerts().is_empty());
        let logs = harness.store.logs.lock().unwrap().clone();
        assert_eq!(logs[0].log_type, LogType::PingCheck);
    }
}
