use serde::{Deserialize, Serialize};

/// Running totals for one continuous session or one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingStatistics {
    pub sent: u64,
    pub received: u64,
    pub total_rtt_ms: u64,
    pub min_rtt_ms: Option<u64>,
    pub max_rtt_ms: u64,
}

impl PingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one probe; `rtt_ms` is `Some` only for a reply.
    pub fn record(&mut self, rtt_ms: Option<u64>) {
        self.sent += 1;
        if let Some(rtt) = rtt_ms {
            self.received += 1;
            self.total_rtt_ms += rtt;
            self.min_rtt_ms = Some(self.min_rtt_ms.map_or(rtt, |min| min.min(rtt)));
            self.max_rtt_ms = self.max_rtt_ms.max(rtt);
        }
    }

    pub fn lost(&self) -> u64 {
        self.sent - self.received
    }

    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.lost() as f64 / self.sent as f64 * 100.0
        }
    }

    pub fn avg_rtt_ms(&self) -> u64 {
        if self.received == 0 {
            0
        } else {
            self.total_rtt_ms / self.received
        }
    }

    pub fn summary(&self, payload_size: usize) -> String {
        format!(
            "--- Ping statistics ---\n\
             Packets: Sent = {}, Received = {}, Lost = {} ({:.1}% loss)\n\
             RTT (ms): Min = {}, Avg = {}, Max = {}\n\
             Payload size: {} bytes",
            self.sent,
            self.received,
            self.lost(),
            self.loss_percent(),
            self.min_rtt_ms.unwrap_or(0),
            self.avg_rtt_ms(),
            self.max_rtt_ms,
            payload_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_min_avg_max() {
        let mut stats = PingStatistics::new();
        stats.record(Some(10));
        stats.record(Some(30));
        stats.record(None);
        stats.record(Some(20));

        assert_eq!(stats.sent, 4);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.lost(), 1);
        assert_eq!(stats.min_rtt_ms, Some(10));
        assert_eq!(stats.max_rtt_ms, 30);
        assert_eq!(stats.avg_rtt_ms(), 20);
        assert!((stats.loss_percent() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_with_no_replies() {
        let mut stats = PingStatistics::new();
        stats.record(None);
        let text = stats.summary(32);
        assert!(text.contains("Sent = 1, Received = 0, Lost = 1 (100.0% loss)"));
        assert!(text.contains("Min = 0, Avg = 0, Max = 0"));
        assert!(text.contains("Payload size: 32 bytes"));
    }

    #[test]
    fn test_empty_summary() {
        let stats = PingStatistics::new();
        assert!(stats.summary(0).contains("(0.0% loss)"));
    }
}
