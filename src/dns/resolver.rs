use std::net::IpAddr;
use std::time::Duration;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{RData, Record, RecordType};
use hickory_resolver::TokioAsyncResolver;

use crate::config::DnsSettings;
use crate::dns::records::{Answer, RecordData, RecordKind};
use crate::error::{ProbeError, Result};

/// Forward lookup result: candidate addresses plus the canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub hostname: String,
    pub addresses: Vec<IpAddr>,
}

/// Name resolution as seen by the engines.
///
/// `query` returns `Ok(vec![])` when the name exists but has no records of
/// that type. `ProbeError::Resolution` is a server-side answer error; any
/// other error means the resolver itself failed.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn lookup_host(&self, host: &str) -> Result<HostEntry>;

    async fn reverse_lookup(&self, ip: IpAddr) -> Result<String>;

    async fn query(&self, host: &str, kind: RecordKind) -> Result<Vec<Answer>>;
}

pub struct HickoryResolver {
    inner: TokioAsyncResolver,
}

impl HickoryResolver {
    /// System configuration with the timeout/attempt policy from settings.
    pub fn new(settings: &DnsSettings) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(settings.query_timeout_secs);
        opts.attempts = settings.attempts;
        opts.cache_size = settings.cache_size;

        let config = match hickory_resolver::system_conf::read_system_conf() {
            Ok((config, _)) => config,
            Err(e) => {
                tracing::debug!(error = %e, "system resolver config unavailable, using defaults");
                ResolverConfig::default()
            }
        };

        Self {
            inner: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

#[async_trait]
impl Resolver for HickoryResolver {
    async fn lookup_host(&self, host: &str) -> Result<HostEntry> {
        let lookup = self.inner.lookup_ip(host).await.map_err(map_resolve_error)?;

        // Follow the CNAME chain to the name the addresses belong to
        let hostname = lookup
            .as_lookup()
            .records()
            .iter()
            .filter_map(|record| match record.data() {
                Some(RData::CNAME(cname)) => Some(trim_root(&cname.to_string())),
                _ => None,
            })
            .last()
            .unwrap_or_else(|| host.to_string());

        Ok(HostEntry {
            hostname,
            addresses: lookup.iter().collect(),
        })
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Result<String> {
        let lookup = self.inner.reverse_lookup(ip).await.map_err(map_resolve_error)?;
        lookup
            .iter()
            .next()
            .map(|ptr| trim_root(&ptr.to_string()))
            .ok_or_else(|| ProbeError::Resolution(format!("no PTR record for {}", ip)))
    }

    async fn query(&self, host: &str, kind: RecordKind) -> Result<Vec<Answer>> {
        let record_type = match kind {
            RecordKind::A => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
            RecordKind::Cname => RecordType::CNAME,
            RecordKind::Mx => RecordType::MX,
            RecordKind::Ns => RecordType::NS,
            RecordKind::Txt => RecordType::TXT,
            RecordKind::Soa => RecordType::SOA,
            RecordKind::Caa => RecordType::CAA,
        };

        match self.inner.lookup(host, record_type).await {
            Ok(lookup) => Ok(lookup.records().iter().filter_map(to_answer).collect()),
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(map_resolve_error(e)),
        }
    }
}

fn map_resolve_error(e: ResolveError) -> ProbeError {
    match e.kind() {
        ResolveErrorKind::Timeout => ProbeError::Transport(format!("resolver timed out: {}", e)),
        ResolveErrorKind::Io(_) | ResolveErrorKind::Proto(_) | ResolveErrorKind::NoConnections => {
            ProbeError::Transport(e.to_string())
        }
        _ => ProbeError::Resolution(e.to_string()),
    }
}

fn trim_root(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

fn to_answer(record: &Record) -> Option<Answer> {
    let data = match record.data()? {
        RData::A(a) => RecordData::A(a.0),
        RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
        RData::CNAME(cname) => RecordData::Cname(cname.to_string()),
        RData::MX(mx) => RecordData::Mx {
            preference: mx.preference(),
            exchange: mx.exchange().to_string(),
        },
        RData::NS(ns) => RecordData::Ns(ns.to_string()),
        RData::TXT(txt) => RecordData::Txt(
            txt.txt_data()
                .iter()
                .map(|segment| String::from_utf8_lossy(segment).into_owned())
                .collect(),
        ),
        RData::SOA(soa) => RecordData::Soa {
            mname: soa.mname().to_string(),
            rname: soa.rname().to_string(),
        },
        RData::CAA(caa) => {
            // Rendered as `<flags> <tag> <value>`
            let rendered = caa.to_string();
            let mut parts = rendered.splitn(3, ' ');
            let _flags = parts.next();
            let tag = parts.next().unwrap_or_default().to_string();
            let value = parts.next().unwrap_or_default().trim_matches('"').to_string();
            RecordData::Caa { tag, value }
        }
        other => RecordData::Other {
            type_tag: record.record_type().to_string(),
            rendered: other.to_string(),
        },
    };

    Some(Answer {
        name: record.name().to_string(),
        ttl: record.ttl(),
        data,
    })
}
