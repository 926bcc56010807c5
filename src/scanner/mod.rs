pub mod tcp;
pub mod ports;
pub mod results;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::PortScanSettings;
use crate::dns::Resolver;
use crate::error::{ProbeError, Result};
use crate::log_sink::LogSink;
pub use results::{PortScanEntry, PortScanReport, PortScanStatus};
pub use ports::{normalize_ports, parse_ports, service_name, PortPreset};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct PortScanRequest {
    pub host: String,
    pub ports: Vec<u16>,
    pub timeout: Duration,
}

impl PortScanRequest {
    pub fn new(host: impl Into<String>, ports: impl IntoIterator<Item = u16>) -> Self {
        Self {
            host: host.into(),
            ports: ports.into_iter().collect(),
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct Scanner {
    parallelism: usize,
    resolver: Arc<dyn Resolver>,
    log: Arc<dyn LogSink>,
}

impl Scanner {
    pub fn new(parallelism: usize, resolver: Arc<dyn Resolver>, log: Arc<dyn LogSink>) -> Self {
        Self {
            parallelism: parallelism.max(1),
            resolver,
            log,
        }
    }

    pub fn from_settings(
        settings: &PortScanSettings,
        resolver: Arc<dyn Resolver>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self::new(settings.parallelism, resolver, log)
    }

    /// Scans `request.ports` in ascending order, streaming each entry into
    /// `results` as soon as it and all lower ports are classified.
    ///
    /// Up to `parallelism` connects are in flight, but entries are always
    /// delivered in port order. Cancellation drops the unscanned remainder
    /// and returns what was already produced.
    pub async fn scan(
        &self,
        request: &PortScanRequest,
        results: Option<mpsc::Sender<PortScanEntry>>,
        cancel: &CancellationToken,
    ) -> Result<PortScanReport> {
        let host = request.host.trim();
        if host.is_empty() {
            self.log.write("[PORTSCAN][ERROR] Hostname is empty");
            return Err(ProbeError::EmptyHostname);
        }
        let port_list = normalize_ports(request.ports.iter().copied().filter(|p| *p != 0));
        if port_list.is_empty() {
            self.log.write("[PORTSCAN][ERROR] No ports to scan");
            return Err(ProbeError::NoPorts);
        }

        let start_time = chrono::Utc::now();
        self.log.write(&format!("[PORTSCAN] Starting scan → {}", host));
        self.log.write(&format!(
            "[PORTSCAN] Ports={}",
            port_list.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(",")
        ));

        let target_ip = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            resolved = resolve_target(self.resolver.as_ref(), host) => Some(resolved),
        };
        let target_ip = match target_ip {
            Some(Ok(ip)) => ip,
            Some(Err(e)) => {
                self.log.write(&format!("[PORTSCAN][ERROR] {}", e));
                return Err(e);
            }
            None => {
                self.log.write("[PORTSCAN] Scan cancelled before any port was probed");
                return Ok(PortScanReport {
                    host: host.to_string(),
                    start_time,
                    end_time: chrono::Utc::now(),
                    requested: port_list.len(),
                    cancelled: true,
                    entries: Vec::new(),
                });
            }
        };
        tracing::debug!(%target_ip, ports = port_list.len(), "port scan target resolved");

        let limit = request.timeout;
        let mut probes = stream::iter(port_list.clone())
            .map(|port| async move {
                let outcome = tcp::connect_scan(SocketAddr::new(target_ip, port), limit).await;
                (port, outcome)
            })
            .buffered(self.parallelism);

        let mut entries = Vec::with_capacity(port_list.len());
        let mut cancelled = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = probes.next() => next,
            };
            let Some((port, outcome)) = next else { break };

            self.log_outcome(port, &outcome);
            let entry = PortScanEntry::new(port, outcome.status);
            if let Some(tx) = &results {
                // A dropped receiver only loses the live feed, not the report
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    sent = tx.send(entry.clone()) => Some(sent),
                };
                if sent.is_none() {
                    cancelled = true;
                    break;
                }
            }
            entries.push(entry);
        }

        if cancelled {
            self.log.write(&format!(
                "[PORTSCAN] Scan cancelled → {} of {} ports",
                entries.len(),
                port_list.len()
            ));
        } else {
            self.log.write(&format!("[PORTSCAN] Scan finished → {} ports", entries.len()));
        }

        Ok(PortScanReport {
            host: host.to_string(),
            start_time,
            end_time: chrono::Utc::now(),
            requested: port_list.len(),
            cancelled,
            entries,
        })
    }

    fn log_outcome(&self, port: u16, outcome: &tcp::ConnectOutcome) {
        let detail = outcome.detail.as_deref().unwrap_or("");
        let line = match outcome.status {
            PortScanStatus::Open => format!("[PORTSCAN] {}/TCP OPEN", port),
            PortScanStatus::TimedOut => format!("[PORTSCAN] {}/TCP timed out", port),
            PortScanStatus::Closed => format!("[PORTSCAN] {}/TCP closed ({})", port, detail),
            PortScanStatus::Error => format!("[PORTSCAN][ERROR] {}/TCP → {}", port, detail),
        };
        self.log.write(&line);
    }
}

/// Literal addresses pass through; names resolve once, preferring IPv4.
async fn resolve_target(resolver: &dyn Resolver, host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let entry = resolver.lookup_host(host).await.map_err(|e| match e {
        ProbeError::Resolution(_) => e,
        other => ProbeError::Resolution(format!("{}: {}", host, other)),
    })?;

    entry
        .addresses
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| entry.addresses.first())
        .copied()
        .ok_or_else(|| ProbeError::Resolution(format!("no address found for {}", host)))
}
