//! Typed requests over an open [`DeviceSession`].
//!
//! Numeric fields arrive as text and are parsed permissively: anything malformed becomes zero
//! instead of failing the sample.

use serde::Serialize;

use super::{DeviceError, DeviceSession};
use crate::routeros::{Command, Record};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficSnapshot {
    pub rx_bps: f64,
    pub tx_bps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeStats {
    pub sent: u32,
    pub received: u32,
    /// Always within 0..=100.
    pub packet_loss_pct: u8,
    /// Whole milliseconds, 0 when nothing came back.
    pub avg_rtt_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceSummary {
    pub name: String,
    pub kind: String,
    pub disabled: bool,
    pub running: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub board_name: String,
    pub version: String,
    pub cpu: String,
    pub uptime: String,
    pub architecture: String,
    pub identity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PppoeSettings {
    pub dns_primary: Option<String>,
    pub dns_secondary: Option<String>,
    /// Defaults to `yes` when unset.
    pub only_one: Option<String>,
    pub queue_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    Pppoe(PppoeSettings),
    Hotspot,
}

impl ProfileKind {
    fn menu(&self) -> &'static str {
        match self {
            ProfileKind::Pppoe(_) => "/ppp/profile",
            ProfileKind::Hotspot => "/ip/hotspot/user/profile",
        }
    }
}

pub async fn fetch_traffic_snapshot(
    session: &mut dyn DeviceSession,
    interface: &str,
) -> Result<TrafficSnapshot, DeviceError> {
    let command = Command::new("/interface/monitor-traffic")
        .attr("interface", interface)
        .attr("once", "true");
    let records = session.run(&command).await?;
    let record = records
        .first()
        .ok_or_else(|| DeviceError::NoData(interface.to_string()))?;

    Ok(TrafficSnapshot {
        rx_bps: parse_rate(record.field("rx-bits-per-second")),
        tx_bps: parse_rate(record.field("tx-bits-per-second")),
    })
}

/// Sends `count` echo requests from `interface` toward `target`.
pub async fn probe_reachability(
    session: &mut dyn DeviceSession,
    interface: &str,
    target: &str,
    count: u32,
) -> Result<ProbeStats, DeviceError> {
    let command = Command::new("/ping")
        .attr("address", target)
        .attr("interface", interface)
        .attr("count", count.to_string());

    let records = session
        .run(&command)
        .await
        .map_err(|e| DeviceError::ProbeFailed {
            interface: interface.to_string(),
            reason: e.to_string(),
        })?;

    summarize_probe_records(&records).ok_or_else(|| DeviceError::ProbeFailed {
        interface: interface.to_string(),
        reason: "ping returned no replies".to_string(),
    })
}

/// Loss and average latency over the returned probe records. `None` when there are no records.
pub fn summarize_probe_records(records: &[Record]) -> Option<ProbeStats> {
    let sent = u32::try_from(records.len()).unwrap_or(u32::MAX);
    if sent == 0 {
        return None;
    }

    let mut received: u32 = 0;
    let mut total_ms: u64 = 0;
    for record in records {
        let time = record.field("time");
        if time.is_empty() || time.contains("timeout") {
            continue;
        }
        received += 1;
        total_ms += u64::from(parse_rtt_ms(time));
    }

    let loss = u64::from(sent - received) * 100 / u64::from(sent);
    let avg = if received > 0 {
        total_ms / u64::from(received)
    } else {
        0
    };

    Some(ProbeStats {
        sent,
        received,
        packet_loss_pct: u8::try_from(loss).unwrap_or(100),
        avg_rtt_ms: u32::try_from(avg).unwrap_or(u32::MAX),
    })
}

/// Parses a reply duration like `20ms`, `1ms450us` or `1s5ms` into whole milliseconds.
/// A bare number is read as milliseconds. Unrecognised text gives 0.
pub fn parse_rtt_ms(text: &str) -> u32 {
    let mut rest = text.trim();
    let mut total_us: u64 = 0;

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let Ok(value) = rest[..digits].parse::<u64>() else {
            return 0;
        };
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "s" => 1_000_000,
            "ms" | "" => 1_000,
            "us" => 1,
            _ => return 0,
        };
        total_us = total_us.saturating_add(value.saturating_mul(scale));
        rest = &rest[unit_len..];
    }

    u32::try_from(total_us / 1_000).unwrap_or(u32::MAX)
}

/// Bits per second from reply text. Negative, non-finite or unparsable values become 0.
pub fn parse_rate(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn parse_flag(text: &str) -> bool {
    matches!(text, "true" | "yes")
}

pub async fn list_interfaces(
    session: &mut dyn DeviceSession,
) -> Result<Vec<InterfaceSummary>, DeviceError> {
    let command =
        Command::new("/interface/print").proplist(&["name", "type", "disabled", "running"]);
    let records = session.run(&command).await?;

    Ok(records
        .iter()
        .map(|r| InterfaceSummary {
            name: r.field("name").to_string(),
            kind: r.field("type").to_string(),
            disabled: parse_flag(r.field("disabled")),
            running: parse_flag(r.field("running")),
        })
        .collect())
}

pub async fn fetch_system_info(session: &mut dyn DeviceSession) -> Result<SystemInfo, DeviceError> {
    let resource = session
        .run(&Command::new("/system/resource/print"))
        .await?;
    let identity = session
        .run(&Command::new("/system/identity/print"))
        .await?;

    let mut info = SystemInfo::default();
    if let Some(res) = resource.first() {
        info.board_name = res.field("board-name").to_string();
        info.version = res.field("version").to_string();
        info.cpu = res.field("cpu").to_string();
        info.uptime = res.field("uptime").to_string();
        info.architecture = res.field("architecture-name").to_string();
    }
    if let Some(id) = identity.first() {
        info.identity = id.field("name").to_string();
    }
    Ok(info)
}

pub async fn list_queue_types(session: &mut dyn DeviceSession) -> Result<Vec<String>, DeviceError> {
    let records = session
        .run(&Command::new("/queue/type/print").proplist(&["name"]))
        .await?;
    Ok(records
        .iter()
        .map(|r| r.field("name"))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

/// Creates a bandwidth profile on the device. Refuses to touch an existing profile of the
/// same name.
pub async fn apply_profile(
    session: &mut dyn DeviceSession,
    kind: &ProfileKind,
    name: &str,
    rate_limit: &str,
) -> Result<(), DeviceError> {
    let apply_failed = |e: DeviceError| DeviceError::ApplyFailed {
        name: name.to_string(),
        reason: e.to_string(),
    };

    let existing = session
        .run(&Command::new(format!("{}/print", kind.menu())).proplist(&["name"]))
        .await
        .map_err(apply_failed)?;
    if existing.iter().any(|r| r.field("name") == name) {
        return Err(DeviceError::ProfileExists(name.to_string()));
    }

    let command = build_profile_command(kind, name, rate_limit);
    session.run(&command).await.map_err(apply_failed)?;
    Ok(())
}

fn build_profile_command(kind: &ProfileKind, name: &str, rate_limit: &str) -> Command {
    let command = Command::new(format!("{}/add", kind.menu()))
        .attr("name", name)
        .attr("rate-limit", rate_limit);

    match kind {
        ProfileKind::Pppoe(settings) => {
            let mut command = command.attr("change-tcp-mss", "yes");

            let dns: Vec<&str> = [&settings.dns_primary, &settings.dns_secondary]
                .into_iter()
                .flatten()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if !dns.is_empty() {
                command = command.attr("dns-server", dns.join(","));
            }

            let only_one = settings
                .only_one
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("yes");
            command = command.attr("only-one", only_one);

            if let Some(queue) = settings
                .queue_type
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                command = command.attr("queue-type", queue);
            }
            command
        }
        ProfileKind::Hotspot => command
            .attr("status-autorefresh", "1m")
            .attr("add-mac-cookie", "no")
            .attr("shared-users", "unlimited"),
    }
}
