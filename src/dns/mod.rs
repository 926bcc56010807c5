pub mod records;
pub mod resolver;
pub mod reverse_cache;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::log_sink::LogSink;
pub use records::{describe, Answer, DnsRecordEntry, RecordData, RecordKind, QUERY_ORDER};
pub use resolver::{HickoryResolver, HostEntry, Resolver};
pub use reverse_cache::ReverseDnsCache;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsResult {
    pub hostname: String,
    /// At least one record was found across all queried types.
    pub success: bool,
    pub error: Option<String>,
    pub records: Vec<DnsRecordEntry>,
}

/// Queries every record type for a name and flattens the answers.
pub struct DnsLookup {
    resolver: Arc<dyn Resolver>,
    log: Arc<dyn LogSink>,
}

impl DnsLookup {
    pub fn new(resolver: Arc<dyn Resolver>, log: Arc<dyn LogSink>) -> Self {
        Self { resolver, log }
    }

    /// Runs the A, AAAA, CNAME, MX, NS, TXT, SOA, CAA queries one after
    /// another. Empty answers and answer errors skip that type only; a
    /// resolver failure stops the run but keeps the records collected so far.
    pub async fn lookup(&self, hostname: &str, cancel: &CancellationToken) -> DnsResult {
        let host = hostname.trim();
        let mut result = DnsResult {
            hostname: host.to_string(),
            ..Default::default()
        };

        if host.is_empty() {
            self.log.write("[DNS][ERROR] Hostname is empty");
            result.error = Some(ProbeError::EmptyHostname.to_string());
            return result;
        }

        self.log.write(&format!("[DNS] Starting full lookup for: {}", host));

        for kind in QUERY_ORDER {
            self.log.write(&format!("[DNS] Querying {} records...", kind));

            let answers = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.log.write(&format!("[DNS] Lookup cancelled for {}", host));
                    break;
                }
                answers = self.resolver.query(host, kind) => answers,
            };

            match answers {
                Ok(answers) if answers.is_empty() => {
                    self.log.write(&format!("[DNS] No {} records found", kind));
                }
                Ok(answers) => {
                    for answer in &answers {
                        let entry = DnsRecordEntry::from(answer);
                        self.log.write(&format!(
                            "[DNS] {} record: Name={}, Value={}, TTL={}",
                            entry.record_type, entry.name, entry.value, entry.ttl
                        ));
                        result.records.push(entry);
                    }
                }
                Err(ProbeError::Resolution(message)) => {
                    self.log.write(&format!("[DNS][ERROR] {} query error: {}", kind, message));
                }
                Err(e) => {
                    self.log.write(&format!("[DNS][ERROR] Exception occurred: {}", e));
                    result.error = Some(e.to_string());
                    break;
                }
            }
        }

        result.success = !result.records.is_empty();
        if result.error.is_none() && !cancel.is_cancelled() {
            self.log.write(&format!(
                "[DNS] Lookup completed for {}, {} records found",
                host,
                result.records.len()
            ));
        }
        result
    }
}

/// Uncached PTR lookup for a textual address; `None` when the text is not an
/// address or nothing answers in time.
pub async fn lookup_ptr(resolver: &dyn Resolver, ip: &str, limit: Duration) -> Option<String> {
    let addr: IpAddr = ip.trim().parse().ok()?;
    match tokio::time::timeout(limit, resolver.reverse_lookup(addr)).await {
        Ok(Ok(name)) => Some(name),
        _ => None,
    }
}
