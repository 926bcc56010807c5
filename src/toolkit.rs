// Entry points the command handlers call into
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::dns::{self, DnsLookup, DnsResult, HickoryResolver, Resolver, ReverseDnsCache};
use crate::error::Result;
use crate::log_sink::LogSink;
use crate::network::{self, CidrInfo};
use crate::ping::{
    IcmpProber, PingEngine, PingEntry, PingRequest, PingResult, PingStatistics, SurgePinger,
    SweepSummary, UnavailableProber,
};
use crate::scanner::{PortScanEntry, PortScanReport, PortScanRequest, Scanner};

pub struct Toolkit {
    settings: Settings,
    resolver: Arc<dyn Resolver>,
    ping: PingEngine,
    scanner: Scanner,
    dns: DnsLookup,
}

impl Toolkit {
    pub fn new(
        settings: Settings,
        prober: Arc<dyn IcmpProber>,
        resolver: Arc<dyn Resolver>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let reverse = ReverseDnsCache::with_timeout(resolver.clone(), settings.dns.reverse_timeout());
        let ping = PingEngine::new(prober, resolver.clone(), reverse, log.clone(), settings.ping.clone());
        let scanner = Scanner::from_settings(&settings.port_scan, resolver.clone(), log.clone());
        let dns = DnsLookup::new(resolver.clone(), log);

        Self { settings, resolver, ping, scanner, dns }
    }

    /// Wires the system resolver and a surge-ping prober. Without ICMP rights
    /// every probe reports the socket error instead.
    pub fn system(settings: Settings, log: Arc<dyn LogSink>) -> Self {
        let resolver: Arc<dyn Resolver> = Arc::new(HickoryResolver::new(&settings.dns));
        let prober: Arc<dyn IcmpProber> = match SurgePinger::new() {
            Ok(pinger) => Arc::new(pinger),
            Err(e) => {
                tracing::warn!(error = %e, "ICMP probing unavailable");
                Arc::new(UnavailableProber::new(e.to_string()))
            }
        };
        Self::new(settings, prober, resolver, log)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn reverse_cache(&self) -> &ReverseDnsCache {
        self.ping.reverse_cache()
    }

    pub async fn ping_once(&self, request: &PingRequest) -> PingResult {
        self.ping.ping_once(request).await
    }

    pub async fn start_continuous_ping(
        &self,
        request: &PingRequest,
        interval: Duration,
        results: mpsc::Sender<PingResult>,
        cancel: &CancellationToken,
    ) -> PingStatistics {
        self.ping.continuous(request, interval, results, cancel).await
    }

    /// Parses `target` (range, CIDR or single address) before any probe is sent.
    pub async fn sweep(
        &self,
        target: &str,
        results: mpsc::Sender<PingEntry>,
        cancel: &CancellationToken,
    ) -> Result<SweepSummary> {
        let targets = network::parse_sweep_target(target)?;
        Ok(self.ping.sweep(targets, results, cancel).await)
    }

    pub async fn scan_ports(
        &self,
        request: &PortScanRequest,
        results: Option<mpsc::Sender<PortScanEntry>>,
        cancel: &CancellationToken,
    ) -> Result<PortScanReport> {
        self.scanner.scan(request, results, cancel).await
    }

    pub async fn lookup_dns(&self, hostname: &str, cancel: &CancellationToken) -> DnsResult {
        self.dns.lookup(hostname, cancel).await
    }

    /// CIDR block for `address/prefix_len`, optionally with the address's PTR name.
    pub async fn compute_cidr(&self, address: &str, prefix_len: u8, with_ptr: bool) -> Result<CidrInfo> {
        let mut info = network::compute_cidr(address, prefix_len)?;
        if with_ptr {
            info.ptr_record = self.resolve_ptr(address).await;
        }
        Ok(info)
    }

    pub async fn resolve_ptr(&self, address: &str) -> Option<String> {
        dns::lookup_ptr(self.resolver.as_ref(), address, self.settings.dns.reverse_timeout()).await
    }
}
