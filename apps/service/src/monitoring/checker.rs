use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, PingIdentifier, PingSequence};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::types::ProbeOutcome;
use crate::error::ProbeError;

/// Echo payload sent with every request
const PAYLOAD: [u8; 56] = [0; 56];

/// Single bounded reachability check against one address
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `ip_address`, waiting at most `timeout`.
    ///
    /// Only a malformed target or a misconfigured prober is an error; every
    /// other failure is [`ProbeOutcome::Offline`].
    async fn probe(&self, ip_address: &str, timeout: Duration) -> Result<ProbeOutcome, ProbeError>;
}

/// Parse a probe target as an IPv4 address
pub fn parse_target(ip_address: &str) -> Result<Ipv4Addr, ProbeError> {
    ip_address.trim().parse().map_err(|_| ProbeError::InvalidTarget(ip_address.to_string()))
}

fn round_latency(rtt: Duration) -> f64 {
    (rtt.as_secs_f64() * 1_000_000.0).round() / 1_000.0
}

/// ICMP echo prober
///
/// When the process may not open an ICMP socket every probe reports
/// `Offline`, the same as an unreachable host.
pub struct IcmpProber {
    client: Option<Client>,
}

impl IcmpProber {
    /// Open the ICMP socket. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        let client = match Client::new(&Config::default()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "ICMP socket unavailable; every probe will report offline");
                None
            }
        };
        Self { client }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(
        &self,
        ip_address: &str,
        probe_timeout: Duration,
    ) -> Result<ProbeOutcome, ProbeError> {
        let target = parse_target(ip_address)?;
        if probe_timeout.is_zero() {
            return Err(ProbeError::Misconfigured("probe timeout must be positive".to_string()));
        }

        let Some(client) = &self.client else {
            return Ok(ProbeOutcome::Offline);
        };

        let mut pinger = client.pinger(IpAddr::V4(target), PingIdentifier(rand::random())).await;
        pinger.timeout(probe_timeout);

        match timeout(probe_timeout, pinger.ping(PingSequence(0), &PAYLOAD)).await {
            Ok(Ok((_, rtt))) => Ok(ProbeOutcome::Online { latency_ms: round_latency(rtt) }),
            Ok(Err(e)) => {
                debug!(ip = %target, error = %e, "Ping failed");
                Ok(ProbeOutcome::Offline)
            }
            Err(_) => {
                debug!(ip = %target, timeout = ?probe_timeout, "Ping timed out");
                Ok(ProbeOutcome::Offline)
            }
        }
    }
}
