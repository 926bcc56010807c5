// Line-oriented diagnostic sink the engines report progress into
use std::sync::{Arc, Mutex};
use chrono::{DateTime, Utc};

/// Receives human-readable progress lines such as `"[PING] ..."`.
/// Timestamps are the sink's business.
pub trait LogSink: Send + Sync {
    fn write(&self, line: &str);
}

/// Forwards every line to `tracing` at INFO level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, line: &str) {
        tracing::info!(target: "netprobe", "{}", line);
    }
}

/// Keeps lines in memory, stamped on arrival.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<(DateTime<Utc>, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.iter().map(|(_, line)| line.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// All lines joined with their timestamps, oldest first.
    pub fn dump(&self) -> String {
        let lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(_) => return String::new(),
        };
        lines
            .iter()
            .map(|(at, line)| format!("[{}] {}", at.format("%H:%M:%S%.3f"), line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn write(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((Utc::now(), line.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.write("[PING] first");
        sink.write("[PING] second");
        assert_eq!(sink.lines(), vec!["[PING] first", "[PING] second"]);
        assert!(sink.dump().contains("] [PING] second"));
    }

    #[test]
    fn test_memory_sink_clear() {
        let sink = MemorySink::new();
        let shared = sink.clone();
        shared.write("[DNS] hello");
        assert!(sink.contains("hello"));
        sink.clear();
        assert!(sink.lines().is_empty());
    }
}
