//! Update rate control for telemetry subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delivery rate for a telemetry subscription
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum UpdateRate {
    /// Every sample the console receives (the vehicle's send cadence, 10Hz by default)
    Native,

    /// At most this many samples per second, latest sample wins.
    /// A rate at or above the source cadence is treated as Native.
    Max(u32),
}

impl UpdateRate {
    /// Normalize against the source cadence.
    pub fn normalize(self, source_hz: f64) -> Self {
        match self {
            UpdateRate::Native => UpdateRate::Native,
            UpdateRate::Max(0) => UpdateRate::Native,
            UpdateRate::Max(hz) if hz as f64 >= source_hz => UpdateRate::Native,
            UpdateRate::Max(hz) => UpdateRate::Max(hz),
        }
    }

    /// Minimum spacing between emitted samples, if any.
    pub fn throttle_interval(self, source_hz: f64) -> Option<Duration> {
        match self.normalize(source_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }

    /// Cadence in Hz for a sender that emits once per `interval`.
    pub fn source_hz(interval: Duration) -> f64 {
        if interval.is_zero() { f64::INFINITY } else { 1.0 / interval.as_secs_f64() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_above_source_are_native() {
        assert_eq!(UpdateRate::Max(30).normalize(10.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(10).normalize(10.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(0).normalize(10.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(2).normalize(10.0), UpdateRate::Max(2));
    }

    #[test]
    fn throttle_interval_matches_rate() {
        assert_eq!(UpdateRate::Native.throttle_interval(10.0), None);
        assert_eq!(UpdateRate::Max(4).throttle_interval(10.0), Some(Duration::from_millis(250)));
    }

    #[test]
    fn source_hz_from_interval() {
        let hz = UpdateRate::source_hz(Duration::from_millis(100));
        assert!((hz - 10.0).abs() < 1e-9);
    }
}
