/// Either direction below this rate (bits/sec) raises a traffic drop alert.
pub const LOW_TRAFFIC_THRESHOLD_BPS: f64 = 1_000_000.0;

/// Average round trip above this is reported as high latency.
pub const HIGH_LATENCY_MS: u32 = 200;

/// Echo requests sent per interface and check.
pub const PROBE_COUNT: u32 = 3;
