// Shared reverse-DNS cache with sticky fallbacks
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::timeout;

use crate::dns::resolver::Resolver;

pub const DEFAULT_REVERSE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Address → hostname cache shared by every ping and sweep.
///
/// A failed or timed-out lookup caches the address text, so a host stays
/// unnamed until [`ReverseDnsCache::clear`] is called. Clones share entries.
#[derive(Clone)]
pub struct ReverseDnsCache {
    resolver: Arc<dyn Resolver>,
    entries: Arc<RwLock<HashMap<IpAddr, String>>>,
    timeout: Duration,
}

impl ReverseDnsCache {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self::with_timeout(resolver, DEFAULT_REVERSE_TIMEOUT)
    }

    pub fn with_timeout(resolver: Arc<dyn Resolver>, timeout: Duration) -> Self {
        Self {
            resolver,
            entries: Arc::new(RwLock::new(HashMap::new())),
            timeout,
        }
    }

    pub async fn resolve(&self, ip: IpAddr) -> String {
        self.resolve_within(ip, self.timeout).await
    }

    /// Cache hit returns without touching the network. Concurrent misses for
    /// the same address may each look it up; the first stored answer wins.
    pub async fn resolve_within(&self, ip: IpAddr, limit: Duration) -> String {
        if let Some(hostname) = self.get_cached(ip) {
            return hostname;
        }

        let hostname = match timeout(limit, self.resolver.reverse_lookup(ip)).await {
            Ok(Ok(name)) if !name.is_empty() => name,
            Ok(Ok(_)) => ip.to_string(),
            Ok(Err(e)) => {
                tracing::debug!(%ip, error = %e, "reverse lookup failed, caching address text");
                ip.to_string()
            }
            Err(_) => {
                tracing::debug!(%ip, limit_ms = limit.as_millis() as u64, "reverse lookup timed out");
                ip.to_string()
            }
        };

        self.store(ip, hostname)
    }

    pub fn get_cached(&self, ip: IpAddr) -> Option<String> {
        let entries = self.entries.read().ok()?;
        entries.get(&ip).cloned()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, ip: IpAddr, hostname: String) -> String {
        match self.entries.write() {
            Ok(mut entries) => entries.entry(ip).or_insert(hostname).clone(),
            Err(_) => hostname,
        }
    }
}
