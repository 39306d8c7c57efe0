use super::thresholds::{HIGH_LATENCY_MS, LOW_TRAFFIC_THRESHOLD_BPS};
use crate::device::{DeviceError, ProbeStats};

pub fn is_low_traffic(rx_bps: f64, tx_bps: f64) -> bool {
    rx_bps < LOW_TRAFFIC_THRESHOLD_BPS || tx_bps < LOW_TRAFFIC_THRESHOLD_BPS
}

/// Result of one reachability probe, in decreasing order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    Error,
    TotalLoss,
    PartialLoss(u8),
    HighLatency(u32),
    Healthy(u32),
}

impl PingOutcome {
    /// Whether this outcome forces a report for its device. High latency alone does not.
    pub fn is_issue(&self) -> bool {
        matches!(
            self,
            PingOutcome::Error | PingOutcome::TotalLoss | PingOutcome::PartialLoss(_)
        )
    }
}

pub fn classify_probe(result: &Result<ProbeStats, DeviceError>) -> PingOutcome {
    let stats = match result {
        Ok(stats) => stats,
        Err(_) => return PingOutcome::Error,
    };

    if stats.packet_loss_pct >= 100 {
        PingOutcome::TotalLoss
    } else if stats.packet_loss_pct > 0 {
        PingOutcome::PartialLoss(stats.packet_loss_pct)
    } else if stats.avg_rtt_ms > HIGH_LATENCY_MS {
        PingOutcome::HighLatency(stats.avg_rtt_ms)
    } else {
        PingOutcome::Healthy(stats.avg_rtt_ms)
    }
}
