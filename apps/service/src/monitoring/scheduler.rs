use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::checker::Prober;
use super::executor::StatusChecker;
use super::types::SweepSummary;
use crate::error::{DeviceError, DeviceResult};
use crate::models::{Device, DeviceFilter, DeviceStatus};
use crate::repository::DeviceRepository;

/// How long `stop` waits for an in-flight sweep before abandoning it
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Sweep scheduler configuration, supplied by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub probe_timeout: Duration,
    /// Maximum probes in flight during one sweep
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            probe_timeout: Duration::from_millis(1000),
            concurrency: 8,
        }
    }
}

enum DeviceOutcome {
    Recorded(DeviceStatus),
    Vanished,
    Failed,
}

struct Sweeper {
    repository: DeviceRepository,
    checker: StatusChecker,
    concurrency: usize,
}

impl Sweeper {
    async fn sweep(&self) -> DeviceResult<SweepSummary> {
        let devices = self.repository.list(&DeviceFilter::default()).await?;
        let mut summary = SweepSummary { total: devices.len(), ..SweepSummary::default() };

        let mut outcomes = stream::iter(devices)
            .map(|device| self.sweep_device(device))
            .buffer_unordered(self.concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                DeviceOutcome::Recorded(DeviceStatus::Online) => summary.online += 1,
                DeviceOutcome::Recorded(_) => summary.offline += 1,
                DeviceOutcome::Vanished => summary.vanished += 1,
                DeviceOutcome::Failed => summary.failed += 1,
            }
        }

        Ok(summary)
    }

    async fn sweep_device(&self, device: Device) -> DeviceOutcome {
        let ping = match self.checker.probe(&device.ip_address).await {
            Ok(ping) => ping,
            Err(e) => {
                warn!(device_id = %device.id, ip = %device.ip_address, error = %e, "Skipping device");
                return DeviceOutcome::Failed;
            }
        };
        debug!(
            device_id = %device.id,
            ip = %device.ip_address,
            status = %ping.status,
            latency_ms = ?ping.latency_ms,
            "Probed device"
        );

        match self.checker.record(device.id, &ping).await {
            Ok(_) => DeviceOutcome::Recorded(ping.status),
            Err(DeviceError::NotFound(_)) => {
                debug!(device_id = %device.id, "Device deleted during sweep");
                DeviceOutcome::Vanished
            }
            Err(e) => {
                warn!(device_id = %device.id, error = %e, "Failed to record probe result");
                DeviceOutcome::Failed
            }
        }
    }

    async fn run(self: Arc<Self>, every: Duration, token: CancellationToken) {
        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = timer.tick() => {}
            }
            if token.is_cancelled() {
                break;
            }

            match self.sweep().await {
                Ok(summary) => info!(
                    total = summary.total,
                    online = summary.online,
                    offline = summary.offline,
                    vanished = summary.vanished,
                    failed = summary.failed,
                    "Sweep completed"
                ),
                Err(e) => error!(error = %e, "Sweep could not read the device list"),
            }
        }
    }
}

struct RunningSweeper {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic liveness sweeps over every device.
///
/// Lifecycle is `stopped -> running -> stopped`; `start` and `stop` are
/// idempotent. The first sweep runs as soon as the scheduler starts.
pub struct LivenessScheduler {
    sweeper: Arc<Sweeper>,
    interval: Duration,
    running: Mutex<Option<RunningSweeper>>,
}

impl LivenessScheduler {
    pub fn new(
        repository: DeviceRepository,
        prober: Arc<dyn Prober>,
        config: SchedulerConfig,
    ) -> Self {
        let checker = StatusChecker::new(repository.clone(), prober, config.probe_timeout);
        Self {
            sweeper: Arc::new(Sweeper { repository, checker, concurrency: config.concurrency }),
            interval: config.interval,
            running: Mutex::new(None),
        }
    }

    /// Start sweeping in the background. Returns `false` if already running
    /// or the interval is zero.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!("Liveness scheduler already running");
            return false;
        }
        if self.interval.is_zero() {
            warn!("Liveness scheduler interval is zero; not starting");
            return false;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(self.sweeper.clone().run(self.interval, token.clone()));
        *running = Some(RunningSweeper { token, handle });

        info!(interval = ?self.interval, "Liveness scheduler started");
        true
    }

    /// Stop sweeping. No new sweep starts after this returns; a sweep in
    /// progress gets a grace period to finish before it is abandoned.
    /// Returns `false` if the scheduler was not running.
    pub async fn stop(&self) -> bool {
        let Some(RunningSweeper { token, mut handle }) = self.running.lock().await.take() else {
            return false;
        };

        token.cancel();
        if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
            warn!("In-flight sweep did not finish in time; abandoning it");
            handle.abort();
        }

        info!("Liveness scheduler stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Run one sweep immediately, independent of the background loop
    pub async fn sweep_once(&self) -> DeviceResult<SweepSummary> {
        self.sweeper.sweep().await
    }
}
