// Well-known TCP services, scan presets and port-list parsing
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

lazy_static::lazy_static! {
    static ref KNOWN_PORTS: HashMap<u16, &'static str> = {
        let mut m = HashMap::new();
        // File transfer / remote access
        m.insert(20, "FTP-Data");
        m.insert(21, "FTP");
        m.insert(22, "SSH");
        m.insert(23, "Telnet");
        m.insert(3389, "RDP");
        m.insert(5900, "VNC");
        m.insert(1723, "PPTP VPN");
        m.insert(1701, "L2TP VPN");
        // Mail
        m.insert(25, "SMTP");
        m.insert(587, "SMTP Submission");
        m.insert(2525, "SMTP Alternate");
        m.insert(110, "POP3");
        m.insert(995, "POP3S");
        m.insert(143, "IMAP");
        m.insert(993, "IMAPS");
        // Web
        m.insert(80, "HTTP");
        m.insert(443, "HTTPS");
        m.insert(8080, "HTTP Proxy");
        m.insert(8008, "HTTP Alt");
        m.insert(8443, "HTTPS Alt");
        m.insert(4443, "HTTPS Alt");
        // Name / directory services
        m.insert(53, "DNS");
        m.insert(111, "RPCBind");
        m.insert(135, "MS RPC");
        m.insert(137, "NetBIOS Name");
        m.insert(138, "NetBIOS Datagram");
        m.insert(139, "NetBIOS Session");
        m.insert(445, "SMB / Microsoft-DS");
        m.insert(548, "AFP (Apple File Sharing)");
        // Databases
        m.insert(1433, "Microsoft SQL Server");
        m.insert(3306, "MySQL");
        m.insert(5432, "PostgreSQL");
        // Messaging / misc
        m.insert(1863, "MSN Messenger");
        m.insert(5190, "AIM / ICQ");
        m.insert(6891, "BitTorrent");
        m.insert(6667, "IRC");
        m.insert(1503, "NetMeeting");
        m.insert(5050, "Multimedia / Streaming");
        m.insert(515, "LPD Printer");
        m.insert(631, "IPP Printing");
        m.insert(502, "Modbus");
        m.insert(3282, "Apple Remote Desktop");
        m.insert(5631, "PCAnywhere");
        m.insert(5632, "PCAnywhere Data");
        m
    };
}

pub fn service_name(port: u16) -> &'static str {
    KNOWN_PORTS.get(&port).copied().unwrap_or("Unknown")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortPreset {
    Application,
    Server,
}

impl PortPreset {
    pub fn ports(&self) -> &'static [u16] {
        match self {
            PortPreset::Application => &[
                515, 631, 3282, 3389, 5190, 5050, 4443, 1863, 6891, 1503, 5631, 5632, 5900, 6667,
            ],
            PortPreset::Server => &[
                21, 22, 23, 25, 53, 80, 110, 137, 138, 139, 143, 443, 445, 548, 587, 993, 995,
                1433, 1701, 1723, 3306, 5432, 8008, 8443,
            ],
        }
    }
}

impl FromStr for PortPreset {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(PortPreset::Application),
            "server" => Ok(PortPreset::Server),
            other => Err(ProbeError::InvalidPort(format!("unknown preset '{}'", other))),
        }
    }
}

/// Deduplicated, ascending scan order.
pub fn normalize_ports(ports: impl IntoIterator<Item = u16>) -> Vec<u16> {
    ports.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Parses `"22,80,8000-8010"` style lists. Port 0 is rejected.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>> {
    let mut ports = BTreeSet::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start = parse_port(start)?;
            let end = parse_port(end)?;
            if start > end {
                return Err(ProbeError::InvalidPort(format!("range {} is reversed", part)));
            }
            ports.extend(start..=end);
        } else {
            ports.insert(parse_port(part)?);
        }
    }

    if ports.is_empty() {
        return Err(ProbeError::NoPorts);
    }
    Ok(ports.into_iter().collect())
}

fn parse_port(text: &str) -> Result<u16> {
    match text.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ProbeError::InvalidPort(text.trim().to_string())),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_names() {
        assert_eq!(service_name(22), "SSH");
        assert_eq!(service_name(445), "SMB / Microsoft-DS");
        assert_eq!(service_name(31337), "Unknown");
    }

    #[test]
    fn test_parse_single_port() {
        assert_eq!(parse_ports("80").unwrap(), vec![80]);
    }

    #[test]
    fn test_parse_mixed_dedups_and_sorts() {
        let ports = parse_ports("443, 80,22,22,8000-8002").unwrap();
        assert_eq!(ports, vec![22, 80, 443, 8000, 8001, 8002]);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(parse_ports("100-50"), Err(ProbeError::InvalidPort(_))));
        assert!(matches!(parse_ports("abc"), Err(ProbeError::InvalidPort(_))));
        assert!(matches!(parse_ports("0"), Err(ProbeError::InvalidPort(_))));
        assert!(matches!(parse_ports("70000"), Err(ProbeError::InvalidPort(_))));
        assert!(matches!(parse_ports(" , "), Err(ProbeError::NoPorts)));
    }

    #[test]
    fn test_normalize_ports() {
        assert_eq!(normalize_ports([80, 22, 22, 443]), vec![22, 80, 443]);
    }

    #[test]
    fn test_presets() {
        assert_eq!(PortPreset::Server.ports().len(), 24);
        assert_eq!(PortPreset::Application.ports().len(), 14);
        assert_eq!("Server".parse::<PortPreset>().unwrap(), PortPreset::Server);
        assert!("bogus".parse::<PortPreset>().is_err());
    }
}
