pub mod checker;
/// Liveness monitoring
///
/// This module is responsible for:
/// - Probing a single address with a bounded timeout
/// - Manual status checks against one device
/// - Periodic sweeps over every device
pub mod executor;
pub mod scheduler;
pub mod types;

pub use checker::{IcmpProber, Prober, parse_target};
pub use executor::StatusChecker;
pub use scheduler::{LivenessScheduler, SchedulerConfig};
pub use types::{PingReport, ProbeOutcome, StatusReport, SweepSummary};
