use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use crate::scanner::ports::service_name;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortScanEntry {
    pub port: u16,
    pub title: String,
    pub status: PortScanStatus,
}

impl PortScanEntry {
    pub fn new(port: u16, status: PortScanStatus) -> Self {
        Self {
            port,
            title: service_name(port).to_string(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortScanStatus {
    Open,
    Closed,
    TimedOut,
    Error,
}

impl std::fmt::Display for PortScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortScanStatus::Open => write!(f, "open"),
            PortScanStatus::Closed => write!(f, "closed"),
            PortScanStatus::TimedOut => write!(f, "timed out"),
            PortScanStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortScanReport {
    pub host: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Ports requested after dedup, whether or not they were reached.
    pub requested: usize,
    pub cancelled: bool,
    pub entries: Vec<PortScanEntry>,
}

impl PortScanReport {
    pub fn open_ports(&self) -> impl Iterator<Item = &PortScanEntry> {
        self.entries.iter().filter(|e| e.status == PortScanStatus::Open)
    }

    pub fn count(&self, status: PortScanStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_title_from_port_table() {
        assert_eq!(PortScanEntry::new(22, PortScanStatus::Open).title, service_name(22));
        assert_eq!(PortScanEntry::new(65000, PortScanStatus::Closed).title, "Unknown");
    }
}
