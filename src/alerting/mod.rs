//! Threshold evaluation for traffic samples and reachability probes. Pure decision logic.

pub mod evaluation;
pub mod thresholds;

pub use evaluation::{PingOutcome, classify_probe, is_low_traffic};
