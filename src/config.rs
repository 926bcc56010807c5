use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ping: PingSettings,
    pub port_scan: PortScanSettings,
    pub dns: DnsSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingSettings {
    pub timeout_ms: u64,
    pub interval_ms: u64,
    pub payload_size: usize,
    /// Continuous ping logs a statistics block every this many probes.
    pub summary_every: u32,
    pub sweep_timeout_ms: u64,
    /// Upper bound on in-flight sweep probes.
    pub sweep_concurrency: usize,
}

impl Default for PingSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            interval_ms: 1000,
            payload_size: 0,
            summary_every: 10,
            sweep_timeout_ms: 500,
            sweep_concurrency: 256,
        }
    }
}

impl PingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn sweep_timeout(&self) -> Duration {
        Duration::from_millis(self.sweep_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortScanSettings {
    pub timeout_ms: u64,
    pub parallelism: usize,
}

impl Default for PortScanSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 1500,
            parallelism: 50,
        }
    }
}

impl PortScanSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsSettings {
    pub reverse_timeout_ms: u64,
    pub query_timeout_secs: u64,
    pub attempts: usize,
    pub cache_size: usize,
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            reverse_timeout_ms: 1500,
            query_timeout_secs: 5,
            attempts: 2,
            cache_size: 32,
        }
    }
}

impl DnsSettings {
    pub fn reverse_timeout(&self) -> Duration {
        Duration::from_millis(self.reverse_timeout_ms)
    }
}

impl Settings {
    /// Loads from the default location, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| ProbeError::Config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("netprobe");
        path.push("config.json");
        Some(path)
    }

    fn validate(&self) -> Result<()> {
        if self.ping.sweep_concurrency == 0 {
            return Err(ProbeError::Config("ping.sweep_concurrency must be at least 1".into()));
        }
        if self.port_scan.parallelism == 0 {
            return Err(ProbeError::Config("port_scan.parallelism must be at least 1".into()));
        }
        if self.ping.summary_every == 0 {
            return Err(ProbeError::Config("ping.summary_every must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ping.timeout_ms, 3000);
        assert_eq!(settings.ping.summary_every, 10);
        assert_eq!(settings.ping.sweep_timeout(), Duration::from_millis(500));
        assert_eq!(settings.port_scan.timeout(), Duration::from_millis(1500));
        assert_eq!(settings.dns.reverse_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"ping": {"interval_ms": 250}}"#).unwrap();
        assert_eq!(settings.ping.interval_ms, 250);
        assert_eq!(settings.ping.timeout_ms, 3000);
        assert_eq!(settings.port_scan, PortScanSettings::default());
    }
}
