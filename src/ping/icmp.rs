use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};

use crate::error::{ProbeError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoStatus {
    Success,
    TimedOut,
    /// Any non-echo reply or send failure reported at the ICMP level.
    Failed(String),
}

impl std::fmt::Display for EchoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EchoStatus::Success => write!(f, "Success"),
            EchoStatus::TimedOut => write!(f, "TimedOut"),
            EchoStatus::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    pub status: EchoStatus,
    pub rtt: Duration,
}

impl EchoReply {
    pub fn success(rtt: Duration) -> Self {
        Self { status: EchoStatus::Success, rtt }
    }

    pub fn timed_out() -> Self {
        Self { status: EchoStatus::TimedOut, rtt: Duration::ZERO }
    }

    pub fn is_success(&self) -> bool {
        self.status == EchoStatus::Success
    }
}

/// One ICMP echo. `Err` is reserved for failures to probe at all (socket
/// setup, permissions); a silent or unreachable host is an `EchoReply`.
#[async_trait]
pub trait IcmpProber: Send + Sync {
    async fn echo(&self, addr: IpAddr, timeout: Duration, payload: &[u8]) -> Result<EchoReply>;
}

/// surge-ping backed prober. Needs raw-socket rights or an unprivileged
/// ICMP datagram socket allowed by the OS.
pub struct SurgePinger {
    v4: Client,
    v6: Option<Client>,
    sequence: AtomicU16,
}

impl SurgePinger {
    pub fn new() -> Result<Self> {
        let v4 = Client::new(&Config::default())
            .map_err(|e| ProbeError::Transport(format!("cannot open ICMP socket: {}", e)))?;
        let v6 = match Client::new(&Config::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::debug!(error = %e, "ICMPv6 socket unavailable");
                None
            }
        };
        Ok(Self {
            v4,
            v6,
            sequence: AtomicU16::new(0),
        })
    }
}

#[async_trait]
impl IcmpProber for SurgePinger {
    async fn echo(&self, addr: IpAddr, timeout: Duration, payload: &[u8]) -> Result<EchoReply> {
        let client = match addr {
            IpAddr::V4(_) => &self.v4,
            IpAddr::V6(_) => self
                .v6
                .as_ref()
                .ok_or_else(|| ProbeError::Transport("ICMPv6 is not available".into()))?,
        };

        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);
        let seq = PingSequence(self.sequence.fetch_add(1, Ordering::Relaxed));

        match pinger.ping(seq, payload).await {
            Ok((_packet, rtt)) => Ok(EchoReply::success(rtt)),
            Err(SurgeError::Timeout { .. }) => Ok(EchoReply::timed_out()),
            Err(SurgeError::IOError(e)) => Err(ProbeError::Transport(e.to_string())),
            Err(other) => Ok(EchoReply {
                status: EchoStatus::Failed(other.to_string()),
                rtt: Duration::ZERO,
            }),
        }
    }
}

/// Stand-in used when no ICMP socket could be opened; every probe fails
/// with the original reason.
pub struct UnavailableProber {
    reason: String,
}

impl UnavailableProber {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl IcmpProber for UnavailableProber {
    async fn echo(&self, _addr: IpAddr, _timeout: Duration, _payload: &[u8]) -> Result<EchoReply> {
        Err(ProbeError::Transport(self.reason.clone()))
    }
}
