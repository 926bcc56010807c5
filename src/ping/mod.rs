pub mod icmp;
pub mod stats;
pub mod sweep;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::PingSettings;
use crate::dns::{ReverseDnsCache, Resolver};
use crate::error::ProbeError;
use crate::log_sink::LogSink;
pub use icmp::{EchoReply, EchoStatus, IcmpProber, SurgePinger, UnavailableProber};
pub use stats::PingStatistics;
pub use sweep::{SweepOutcome, SweepSummary};

/// `rtt_ms` value of a probe that got no echo reply.
pub const RTT_UNAVAILABLE: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingRequest {
    pub host: String,
    pub timeout: Duration,
    pub payload: Vec<u8>,
}

impl PingRequest {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout: Duration::from_millis(3000),
            payload: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Random payload of `size` bytes.
    pub fn with_payload_size(mut self, size: usize) -> Self {
        let mut payload = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut payload);
        self.payload = payload;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    pub hostname: String,
    /// Absent when the host never resolved to an IPv4 address.
    pub address: Option<IpAddr>,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds, or [`RTT_UNAVAILABLE`] unless `success`.
    pub rtt_ms: i64,
    pub success: bool,
    pub status: String,
}

impl PingResult {
    fn failed(hostname: &str, address: Option<IpAddr>, status: String) -> Self {
        Self {
            hostname: hostname.to_string(),
            address,
            timestamp: Utc::now(),
            rtt_ms: RTT_UNAVAILABLE,
            success: false,
            status,
        }
    }

    pub fn rtt(&self) -> Option<u64> {
        if self.success {
            u64::try_from(self.rtt_ms).ok()
        } else {
            None
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// History row shown for every probe, and what a sweep posts per responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingEntry {
    pub hostname: String,
    pub address: Option<IpAddr>,
    pub rtt_ms: u64,
    pub payload_size: usize,
    pub success: u32,
    pub failure: u32,
}

impl PingEntry {
    pub fn from_result(result: &PingResult, payload_size: usize) -> Self {
        Self {
            hostname: result.hostname.clone(),
            address: result.address,
            rtt_ms: result.rtt().unwrap_or(0),
            payload_size,
            success: u32::from(result.success),
            failure: u32::from(!result.success),
        }
    }
}

pub struct PingEngine {
    prober: Arc<dyn IcmpProber>,
    resolver: Arc<dyn Resolver>,
    reverse: ReverseDnsCache,
    log: Arc<dyn LogSink>,
    settings: PingSettings,
}

impl PingEngine {
    pub fn new(
        prober: Arc<dyn IcmpProber>,
        resolver: Arc<dyn Resolver>,
        reverse: ReverseDnsCache,
        log: Arc<dyn LogSink>,
        settings: PingSettings,
    ) -> Self {
        Self { prober, resolver, reverse, log, settings }
    }

    pub fn reverse_cache(&self) -> &ReverseDnsCache {
        &self.reverse
    }

    /// Resolve → probe → reverse-resolve. Never fails: every problem ends up
    /// in the returned result's `success`/`status`.
    pub async fn ping_once(&self, request: &PingRequest) -> PingResult {
        let host = request.host.trim();
        self.log.write(&format!(
            "[PING] Request → Host={}, Timeout={}ms, Buffer={} bytes",
            host,
            request.timeout.as_millis(),
            request.payload.len()
        ));

        let (ip, mut hostname) = match self.resolve(host, request.timeout).await {
            Ok(resolved) => resolved,
            Err(failed) => return failed,
        };

        self.log.write(&format!("[PING] Sending ICMP → {}", ip));
        let reply = match self.prober.echo(ip, request.timeout, &request.payload).await {
            Ok(reply) => reply,
            Err(e) => {
                self.log.write(&format!("[PING][ERROR] {}", e));
                return PingResult::failed(&hostname, Some(ip), e.to_string());
            }
        };

        if reply.is_success() {
            self.log.write(&format!("[PING] Reply from {}: time={}ms", ip, reply.rtt.as_millis()));
        } else {
            self.log.write(&format!("[PING] No reply from {}: status={}", ip, reply.status));
        }

        // Only the displayed name depends on this; the cache falls back to the address text
        hostname = self.reverse.resolve(ip).await;
        self.log.write(&format!("[DNS] Reverse lookup → {}", hostname));

        let success = reply.is_success();
        PingResult {
            hostname,
            address: Some(ip),
            timestamp: Utc::now(),
            rtt_ms: if success {
                i64::try_from(reply.rtt.as_millis()).unwrap_or(i64::MAX)
            } else {
                RTT_UNAVAILABLE
            },
            success,
            status: reply.status.to_string(),
        }
    }

    /// Name resolution shares the probe's timeout budget.
    async fn resolve(
        &self,
        host: &str,
        request_timeout: Duration,
    ) -> std::result::Result<(IpAddr, String), PingResult> {
        if host.is_empty() {
            self.log.write("[PING][ERROR] Hostname is empty");
            return Err(PingResult::failed(host, None, "Hostname is empty".into()));
        }

        if let Ok(ip) = host.parse::<IpAddr>() {
            self.log.write(&format!("[DNS] Parsed IP address: {}", ip));
            return Ok((ip, host.to_string()));
        }

        self.log.write(&format!("[DNS] Resolving hostname: {}", host));
        let lookup = tokio::time::timeout(request_timeout, self.resolver.lookup_host(host)).await;
        let entry = match lookup.unwrap_or_else(|_| Err(ProbeError::Timeout(millis(request_timeout)))) {
            Ok(entry) => entry,
            Err(e) => {
                self.log.write(&format!("[DNS][ERROR] {}", e));
                return Err(PingResult::failed(host, None, format!("DNS lookup failed: {}", e)));
            }
        };

        for addr in &entry.addresses {
            let family = if addr.is_ipv4() { "InterNetwork" } else { "InterNetworkV6" };
            self.log.write(&format!("[DNS] → {}: {}", family, addr));
        }

        match entry.addresses.iter().find(|a| a.is_ipv4()) {
            Some(ip) => Ok((*ip, entry.hostname)),
            None => {
                self.log.write("[DNS] No IPv4 address found");
                self.log.write("[PING][ERROR] No IPv4 address available");
                Err(PingResult::failed(host, None, "No IPv4 address found".into()))
            }
        }
    }

    /// Pings `request.host` every `interval` until `cancel` fires, sending
    /// each result down `results` in probe order.
    ///
    /// A statistics block is logged every `summary_every` probes and once
    /// more on exit. Only results handed to `results` are counted; a probe
    /// or a send interrupted by cancellation is dropped.
    pub async fn continuous(
        &self,
        request: &PingRequest,
        interval: Duration,
        results: mpsc::Sender<PingResult>,
        cancel: &CancellationToken,
    ) -> PingStatistics {
        let mut stats = PingStatistics::new();
        let payload_size = request.payload.len();
        let summary_every = u64::from(self.settings.summary_every.max(1));

        self.log.write(&format!("[PING] Continuous ping started → {}", request.host.trim()));

        while !cancel.is_cancelled() {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.ping_once(request) => result,
            };

            // Only delivered results count toward the statistics
            let rtt = result.rtt();
            let delivered = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = results.send(result) => sent.is_ok(),
            };
            if !delivered {
                tracing::debug!("continuous ping receiver dropped, stopping");
                break;
            }
            stats.record(rtt);
            if stats.sent % summary_every == 0 {
                self.log.write(&stats.summary(payload_size));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        self.log.write("[PING] Continuous ping stopped");
        self.log.write(&stats.summary(payload_size));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_size_is_honored() {
        let request = PingRequest::new("host").with_payload_size(48);
        assert_eq!(request.payload.len(), 48);
        assert_eq!(request.timeout, Duration::from_millis(3000));
    }

    #[test]
    fn test_entry_from_failed_result() {
        let result = PingResult::failed("host", None, "TimedOut".into());
        assert_eq!(result.rtt(), None);

        let entry = PingEntry::from_result(&result, 32);
        assert_eq!(entry.rtt_ms, 0);
        assert_eq!((entry.success, entry.failure), (0, 1));
        assert_eq!(entry.payload_size, 32);
    }
}
