// In-process stand-ins for the resolver and ICMP traits
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use netprobe::config::Settings;
use netprobe::dns::{Answer, HostEntry, RecordKind, Resolver};
use netprobe::log_sink::MemorySink;
use netprobe::ping::{EchoReply, IcmpProber};
use netprobe::{ProbeError, Result, Toolkit};

#[derive(Clone)]
pub enum QueryBehavior {
    Answers(Vec<Answer>),
    /// Server answered with an error code for this type.
    AnswerError(String),
    /// The resolver itself failed.
    Failure(String),
}

#[derive(Default)]
pub struct MockResolver {
    pub hosts: HashMap<String, Vec<IpAddr>>,
    pub names: HashMap<IpAddr, String>,
    pub queries: HashMap<RecordKind, QueryBehavior>,
    pub reverse_delay: Option<Duration>,
    pub lookup_delay: Option<Duration>,
    pub reverse_calls: AtomicUsize,
    pub query_log: Mutex<Vec<RecordKind>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, name: &str, addresses: &[&str]) -> Self {
        let parsed = addresses.iter().filter_map(|a| a.parse().ok()).collect();
        self.hosts.insert(name.to_string(), parsed);
        self
    }

    pub fn with_name(mut self, ip: &str, name: &str) -> Self {
        if let Ok(ip) = ip.parse() {
            self.names.insert(ip, name.to_string());
        }
        self
    }

    pub fn with_query(mut self, kind: RecordKind, behavior: QueryBehavior) -> Self {
        self.queries.insert(kind, behavior);
        self
    }

    pub fn with_reverse_delay(mut self, delay: Duration) -> Self {
        self.reverse_delay = Some(delay);
        self
    }

    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    pub fn queried(&self) -> Vec<RecordKind> {
        self.query_log.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Resolver for MockResolver {
    async fn lookup_host(&self, host: &str) -> Result<HostEntry> {
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        match self.hosts.get(host) {
            Some(addresses) => Ok(HostEntry {
                hostname: host.to_string(),
                addresses: addresses.clone(),
            }),
            None => Err(ProbeError::Resolution(format!("{} not found", host))),
        }
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Result<String> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.reverse_delay {
            tokio::time::sleep(delay).await;
        }
        self.names
            .get(&ip)
            .cloned()
            .ok_or_else(|| ProbeError::Resolution(format!("no PTR for {}", ip)))
    }

    async fn query(&self, _host: &str, kind: RecordKind) -> Result<Vec<Answer>> {
        if let Ok(mut log) = self.query_log.lock() {
            log.push(kind);
        }
        match self.queries.get(&kind) {
            None => Ok(Vec::new()),
            Some(QueryBehavior::Answers(answers)) => Ok(answers.clone()),
            Some(QueryBehavior::AnswerError(message)) => Err(ProbeError::Resolution(message.clone())),
            Some(QueryBehavior::Failure(message)) => Err(ProbeError::Transport(message.clone())),
        }
    }
}

/// Replies only from the listed addresses; everyone else stays silent.
#[derive(Default)]
pub struct MockProber {
    pub replies: HashMap<IpAddr, Duration>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub payload_sizes: Mutex<Vec<usize>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(mut self, ip: &str, rtt_ms: u64) -> Self {
        if let Ok(ip) = ip.parse() {
            self.replies.insert(ip, Duration::from_millis(rtt_ms));
        }
        self
    }

    /// Every echo takes this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IcmpProber for MockProber {
    async fn echo(&self, addr: IpAddr, _timeout: Duration, payload: &[u8]) -> Result<EchoReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.payload_sizes.lock() {
            sizes.push(payload.len());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.replies.get(&addr) {
            Some(rtt) => Ok(EchoReply::success(*rtt)),
            None => Ok(EchoReply::timed_out()),
        }
    }
}

pub fn toolkit(prober: Arc<MockProber>, resolver: Arc<MockResolver>) -> (Toolkit, MemorySink) {
    let sink = MemorySink::new();
    let toolkit = Toolkit::new(Settings::default(), prober, resolver, Arc::new(sink.clone()));
    (toolkit, sink)
}
