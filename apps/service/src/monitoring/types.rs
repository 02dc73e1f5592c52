use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Device, DeviceStatus};

/// Classified result of one probe. Unreachable, timed out and blocked
/// targets are all `Offline`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    Online { latency_ms: f64 },
    Offline,
}

impl ProbeOutcome {
    pub fn status(&self) -> DeviceStatus {
        match self {
            ProbeOutcome::Online { .. } => DeviceStatus::Online,
            ProbeOutcome::Offline => DeviceStatus::Offline,
        }
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Online { latency_ms } => Some(*latency_ms),
            ProbeOutcome::Offline => None,
        }
    }
}

/// Outcome of a completed probe as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingReport {
    pub status: DeviceStatus,
    pub latency_ms: Option<f64>,
    /// Probe completion time
    pub timestamp: DateTime<Utc>,
}

impl PingReport {
    pub fn new(outcome: ProbeOutcome, completed_at: DateTime<Utc>) -> Self {
        Self { status: outcome.status(), latency_ms: outcome.latency_ms(), timestamp: completed_at }
    }
}

/// Result of a manual status check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub device: Device,
    pub ping: PingReport,
}

/// Counters for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Devices in the snapshot taken at sweep start
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    /// Deleted between the snapshot and their write-back
    pub vanished: usize,
    /// Rejected targets or failed write-backs
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_report_has_no_latency() {
        let now = Utc::now();
        let report = PingReport::new(ProbeOutcome::Offline, now);
        assert_eq!(report.status, DeviceStatus::Offline);
        assert_eq!(report.latency_ms, None);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "offline");
        assert!(json["latency_ms"].is_null());
    }

    #[test]
    fn test_online_report_keeps_latency() {
        let report = PingReport::new(ProbeOutcome::Online { latency_ms: 1.25 }, Utc::now());
        assert_eq!(report.status, DeviceStatus::Online);
        assert_eq!(report.latency_ms, Some(1.25));
    }
}
