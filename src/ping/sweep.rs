// Concurrent ping sweep over an address list
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::dns::ReverseDnsCache;
use crate::ping::icmp::{EchoStatus, IcmpProber};
use crate::ping::{PingEngine, PingEntry, PingStatistics};

/// What happened to one address of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Replied { rtt_ms: u64 },
    /// Probe went out, no echo came back.
    NoReply(EchoStatus),
    /// The probe could not be sent at all.
    Failed(String),
    /// Abandoned on cancellation, or a reply whose entry could not be delivered.
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    pub targets: usize,
    pub replied: usize,
    pub silent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub statistics: PingStatistics,
}

impl SweepSummary {
    fn tally(&mut self, outcome: &SweepOutcome) {
        match outcome {
            SweepOutcome::Replied { rtt_ms } => {
                self.replied += 1;
                self.statistics.record(Some(*rtt_ms));
            }
            SweepOutcome::NoReply(_) => {
                self.silent += 1;
                self.statistics.record(None);
            }
            SweepOutcome::Failed(_) => {
                self.failed += 1;
                self.statistics.record(None);
            }
            SweepOutcome::Cancelled => self.skipped += 1,
        }
    }
}

impl PingEngine {
    /// Pings every address concurrently with the sweep timeout and no payload.
    ///
    /// Only responders are posted to `results`, in completion order. At most
    /// `sweep_concurrency` probes are in flight. Returns once every probe has
    /// finished or been abandoned after `cancel` fired; no task outlives the call.
    /// The caller must drain `results` while the sweep runs.
    pub async fn sweep(
        &self,
        targets: Vec<Ipv4Addr>,
        results: mpsc::Sender<PingEntry>,
        cancel: &CancellationToken,
    ) -> SweepSummary {
        let limit = self.settings.sweep_timeout();
        let permits = Arc::new(Semaphore::new(self.settings.sweep_concurrency.max(1)));
        let mut summary = SweepSummary {
            targets: targets.len(),
            ..Default::default()
        };

        self.log.write(&format!("[SWEEP]: Sweep starting → {} addresses", targets.len()));

        let mut tasks = JoinSet::new();
        for addr in targets {
            let prober = self.prober.clone();
            let reverse = self.reverse.clone();
            let results = results.clone();
            let permits = permits.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return SweepOutcome::Cancelled,
                    permit = permits.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return SweepOutcome::Cancelled,
                    },
                };
                sweep_one(addr, prober, reverse, results, limit, cancel).await
            });
        }
        drop(results);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let SweepOutcome::Failed(reason) = &outcome {
                        tracing::debug!(%reason, "sweep probe failed");
                    }
                    summary.tally(&outcome);
                }
                Err(e) => {
                    self.log.write(&format!("[SWEEP][ERROR] probe task failed: {}", e));
                    summary.failed += 1;
                }
            }
        }

        summary.cancelled = cancel.is_cancelled();
        if summary.cancelled {
            self.log.write("[SWEEP]: Sweep cancelled.");
        } else {
            self.log.write("[SWEEP]: Sweep is complete.");
        }
        self.log.write(&format!(
            "[SWEEP]: {} of {} hosts replied",
            summary.replied, summary.targets
        ));
        summary
    }
}

async fn sweep_one(
    addr: Ipv4Addr,
    prober: Arc<dyn IcmpProber>,
    reverse: ReverseDnsCache,
    results: mpsc::Sender<PingEntry>,
    limit: Duration,
    cancel: CancellationToken,
) -> SweepOutcome {
    let ip = IpAddr::V4(addr);

    let reply = tokio::select! {
        biased;
        _ = cancel.cancelled() => return SweepOutcome::Cancelled,
        reply = prober.echo(ip, limit, &[]) => reply,
    };

    let reply = match reply {
        Ok(reply) if reply.is_success() => reply,
        Ok(reply) => return SweepOutcome::NoReply(reply.status),
        Err(e) => return SweepOutcome::Failed(e.to_string()),
    };

    // The echo already completed, so a late cancel still delivers it unnamed
    let hostname = tokio::select! {
        biased;
        _ = cancel.cancelled() => ip.to_string(),
        name = reverse.resolve(ip) => name,
    };

    let rtt_ms = u64::try_from(reply.rtt.as_millis()).unwrap_or(u64::MAX);
    let entry = PingEntry {
        hostname,
        address: Some(ip),
        rtt_ms,
        payload_size: 0,
        success: 1,
        failure: 0,
    };
    // A responder only counts as replied once the caller has its entry
    let delivered = tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = results.send(entry) => sent.is_ok(),
    };
    if !delivered {
        tracing::debug!(%ip, "sweep result not delivered");
        return SweepOutcome::Cancelled;
    }

    SweepOutcome::Replied { rtt_ms }
}
