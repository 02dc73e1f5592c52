use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use super::checker::Prober;
use super::types::{PingReport, StatusReport};
use crate::database::models::timestamp_now;
use crate::error::{DeviceResult, ProbeError, StatusCheckError};
use crate::models::Device;
use crate::repository::{DeviceRepository, parse_device_id};

/// Probe-then-record path shared by manual checks and sweeps
pub struct StatusChecker {
    repository: DeviceRepository,
    prober: Arc<dyn Prober>,
    timeout: Duration,
}

impl StatusChecker {
    pub fn new(repository: DeviceRepository, prober: Arc<dyn Prober>, timeout: Duration) -> Self {
        Self { repository, prober, timeout }
    }

    /// Probe one address and stamp the completion time
    pub async fn probe(&self, ip_address: &str) -> Result<PingReport, ProbeError> {
        let outcome = self.prober.probe(ip_address, self.timeout).await?;
        Ok(PingReport::new(outcome, timestamp_now()))
    }

    /// Write a completed probe back to its device
    pub async fn record(&self, id: Uuid, report: &PingReport) -> DeviceResult<Device> {
        self.repository.apply_probe_result(id, report.status, report.timestamp).await
    }

    /// Probe a device by id and record the result.
    ///
    /// The id is resolved before any probe is sent. The returned `ping`
    /// always describes this call's probe, while `device` is the stored row
    /// afterwards: if a newer result was already recorded, this probe is
    /// discarded and `device` reflects that newer probe instead.
    pub async fn check(&self, id: &str) -> Result<StatusReport, StatusCheckError> {
        let id = parse_device_id(id)?;
        let device = self.repository.get_by_id(id).await?;

        let ping = self.probe(&device.ip_address).await?;
        debug!(device_id = %id, ip = %device.ip_address, status = %ping.status, "Manual status check");

        let device = self.record(id, &ping).await?;
        Ok(StatusReport { device, ping })
    }
}
