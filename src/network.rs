// IPv4 arithmetic: integer conversion, CIDR blocks, ranges and sweep targets
use std::net::{IpAddr, Ipv4Addr};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Largest address list a sweep target may expand to (one /16).
pub const MAX_SWEEP_ADDRESSES: u64 = 65_536;

/// Big-endian (network order) integer value of an address.
pub fn to_integer(addr: Ipv4Addr) -> u32 {
    u32::from_be_bytes(addr.octets())
}

pub fn from_integer(value: u32) -> Ipv4Addr {
    Ipv4Addr::from(value.to_be_bytes())
}

pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    text.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| ProbeError::InvalidAddress(text.trim().to_string()))
}

/// Mask with the high `prefix_len` bits set. Callers validate the range.
pub fn netmask(prefix_len: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix_len.min(32))).unwrap_or(0)
}

/// RFC 1918 check. Loopback and link-local are not private here, and
/// anything that is not IPv4 text is never private.
pub fn is_private(text: &str) -> bool {
    match text.trim().parse::<IpAddr>() {
        Ok(ip) => is_private_addr(ip),
        Err(_) => false,
    }
}

pub fn is_private_addr(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            (octets[0] == 10) ||
            (octets[0] == 172 && octets[1] >= 16 && octets[1] <= 31) ||
            (octets[0] == 192 && octets[1] == 168)
        }
        IpAddr::V6(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidrInfo {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    pub cidr_notation: String,
    pub netmask: Ipv4Addr,
    pub network: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    /// `None` for /31 and /32, which have no network/broadcast-excluded range.
    pub first_host: Option<Ipv4Addr>,
    pub last_host: Option<Ipv4Addr>,
    pub usable_hosts: u32,
    pub binary: String,
    pub hex: String,
    pub is_private: bool,
    pub ptr_record: Option<String>,
}

impl CidrInfo {
    pub fn range(&self) -> String {
        format!("{} - {}", self.network, self.broadcast)
    }

    /// Addresses a sweep of this block probes: the usable hosts, or every
    /// address of the block for /31 and /32.
    pub fn hosts(&self) -> AddressRange {
        match (self.first_host, self.last_host) {
            (Some(first), Some(last)) => AddressRange::new(first, last),
            _ => AddressRange::new(self.network, self.broadcast),
        }
    }
}

/// Computes the block `input/prefix_len`. Prefixes above 32 are rejected.
pub fn compute_cidr(input: &str, prefix_len: u8) -> Result<CidrInfo> {
    let address = parse_ipv4(input)?;
    compute_cidr_for(address, prefix_len)
}

pub fn compute_cidr_for(address: Ipv4Addr, prefix_len: u8) -> Result<CidrInfo> {
    Ipv4Net::new(address, prefix_len).map_err(|_| ProbeError::InvalidPrefix(prefix_len))?;

    let mask = netmask(prefix_len);
    let value = to_integer(address);
    let network = value & mask;
    let broadcast = value | !mask;

    let (first_host, last_host, usable_hosts) = if prefix_len < 31 {
        (
            Some(from_integer(network + 1)),
            Some(from_integer(broadcast - 1)),
            broadcast - network - 1,
        )
    } else {
        (None, None, 0)
    };

    let octets = address.octets();
    let binary = octets.iter().map(|b| format!("{:08b}", b)).collect::<Vec<_>>().join(".");
    let hex = octets.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(".");

    Ok(CidrInfo {
        address,
        prefix_len,
        cidr_notation: format!("{}/{}", address, prefix_len),
        netmask: from_integer(mask),
        network: from_integer(network),
        broadcast: from_integer(broadcast),
        first_host,
        last_host,
        usable_hosts,
        binary,
        hex,
        is_private: is_private_addr(IpAddr::V4(address)),
        ptr_record: None,
    })
}

/// Ascending, inclusive run of addresses. Holds no state beyond its bounds,
/// so a clone restarts from the same point.
#[derive(Debug, Clone)]
pub struct AddressRange {
    next: u32,
    end: u32,
    exhausted: bool,
}

impl AddressRange {
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        let (next, end) = (to_integer(start), to_integer(end));
        Self { next, end, exhausted: next > end }
    }

    pub fn empty() -> Self {
        Self { next: 1, end: 0, exhausted: true }
    }

    pub fn count_hint(&self) -> u64 {
        if self.exhausted {
            0
        } else {
            u64::from(self.end - self.next) + 1
        }
    }
}

impl Iterator for AddressRange {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.exhausted {
            return None;
        }
        let current = self.next;
        if current == self.end {
            self.exhausted = true;
        } else {
            self.next += 1;
        }
        Some(from_integer(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.count_hint()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// Every address from `start` to `end` inclusive. Empty when either end does
/// not parse or when `start > end`.
pub fn enumerate_range(start: &str, end: &str) -> AddressRange {
    match (parse_ipv4(start), parse_ipv4(end)) {
        (Ok(start), Ok(end)) => AddressRange::new(start, end),
        _ => AddressRange::empty(),
    }
}

/// Expands `A-B`, `addr/prefix` or a single address into the sweep list.
pub fn parse_sweep_target(target: &str) -> Result<Vec<Ipv4Addr>> {
    let target = target.trim();

    let range = if let Some((start, end)) = target.split_once('-') {
        let start = parse_ipv4(start).map_err(|_| ProbeError::InvalidTarget(target.to_string()))?;
        let end = parse_ipv4(end).map_err(|_| ProbeError::InvalidTarget(target.to_string()))?;
        AddressRange::new(start, end)
    } else if target.contains('/') {
        let net: Ipv4Net = target.parse()
            .map_err(|_| ProbeError::InvalidTarget(target.to_string()))?;
        compute_cidr_for(net.addr(), net.prefix_len())?.hosts()
    } else {
        let single = parse_ipv4(target).map_err(|_| ProbeError::InvalidTarget(target.to_string()))?;
        AddressRange::new(single, single)
    };

    let count = range.count_hint();
    if count > MAX_SWEEP_ADDRESSES {
        return Err(ProbeError::RangeTooLarge {
            target: target.to_string(),
            count,
            max: MAX_SWEEP_ADDRESSES,
        });
    }

    Ok(range.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_round_trip() {
        for text in ["0.0.0.0", "10.1.2.3", "192.168.1.255", "255.255.255.255", "1.0.0.1"] {
            let addr: Ipv4Addr = text.parse().unwrap();
            assert_eq!(from_integer(to_integer(addr)), addr);
        }
        assert_eq!(to_integer(Ipv4Addr::new(1, 2, 3, 4)), 0x0102_0304);
        assert_eq!(from_integer(0xC0A8_0001), Ipv4Addr::new(192, 168, 0, 1));
    }

    #[test]
    fn test_mask_invariants_for_every_prefix() {
        for prefix in 0..=32u8 {
            let info = compute_cidr("172.20.33.77", prefix).unwrap();
            let mask = netmask(prefix);
            assert_eq!(to_integer(info.network) & !mask, 0, "prefix {}", prefix);
            assert_eq!(to_integer(info.broadcast) | mask, u32::MAX, "prefix {}", prefix);
            assert_eq!(to_integer(info.netmask), mask);
        }
    }

    #[test]
    fn test_compute_cidr_24() {
        let info = compute_cidr("192.168.1.130", 24).unwrap();
        assert_eq!(info.network, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(info.broadcast, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(info.first_host, Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(info.last_host, Some(Ipv4Addr::new(192, 168, 1, 254)));
        assert_eq!(info.usable_hosts, 254);
        assert_eq!(info.cidr_notation, "192.168.1.130/24");
        assert_eq!(info.range(), "192.168.1.0 - 192.168.1.255");
        assert_eq!(info.binary, "11000000.10101000.00000001.10000010");
        assert_eq!(info.hex, "C0.A8.01.82");
        assert!(info.is_private);
    }

    #[test]
    fn test_compute_cidr_zero_prefix() {
        let info = compute_cidr("8.8.8.8", 0).unwrap();
        assert_eq!(info.network, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(info.broadcast, Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(info.usable_hosts, u32::MAX - 1);
        assert!(!info.is_private);
    }

    #[test]
    fn test_degenerate_prefixes_have_no_usable_range() {
        let p2p = compute_cidr("10.0.0.1", 31).unwrap();
        assert_eq!(p2p.usable_hosts, 0);
        assert_eq!(p2p.first_host, None);
        assert_eq!(p2p.network, Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(p2p.broadcast, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(p2p.hosts().count(), 2);

        let host = compute_cidr("10.0.0.9", 32).unwrap();
        assert_eq!(host.usable_hosts, 0);
        assert_eq!(host.last_host, None);
        assert_eq!(host.hosts().collect::<Vec<_>>(), vec![Ipv4Addr::new(10, 0, 0, 9)]);

        let smallest = compute_cidr("10.0.0.9", 30).unwrap();
        assert_eq!(smallest.usable_hosts, 2);
    }

    #[test]
    fn test_compute_cidr_rejects_bad_input() {
        assert!(matches!(compute_cidr("not-an-ip", 24), Err(ProbeError::InvalidAddress(_))));
        assert!(matches!(compute_cidr("::1", 24), Err(ProbeError::InvalidAddress(_))));
        assert!(matches!(compute_cidr("10.0.0.1", 33), Err(ProbeError::InvalidPrefix(33))));
    }

    #[test]
    fn test_is_private() {
        assert!(is_private("10.1.2.3"));
        assert!(!is_private("8.8.8.8"));
        assert!(!is_private("172.32.0.1"));
        assert!(is_private("172.16.0.1"));
        assert!(is_private("172.31.255.255"));
        assert!(is_private("192.168.0.1"));
        assert!(!is_private("127.0.0.1"));
        assert!(!is_private("169.254.1.1"));
        assert!(!is_private("fd00::1"));
        assert!(!is_private("garbage"));
    }

    #[test]
    fn test_enumerate_range() {
        let addrs: Vec<String> = enumerate_range("192.168.1.10", "192.168.1.12")
            .map(|a| a.to_string())
            .collect();
        assert_eq!(addrs, vec!["192.168.1.10", "192.168.1.11", "192.168.1.12"]);
        assert_eq!(enumerate_range("192.168.1.12", "192.168.1.10").count(), 0);
        assert_eq!(enumerate_range("bogus", "192.168.1.10").count(), 0);
    }

    #[test]
    fn test_enumerate_range_is_restartable_and_hits_top_of_space() {
        let range = enumerate_range("255.255.255.254", "255.255.255.255");
        assert_eq!(range.clone().count(), 2);
        assert_eq!(range.count(), 2);
        assert_eq!(enumerate_range("1.1.1.1", "1.1.1.1").count(), 1);
    }

    #[test]
    fn test_parse_sweep_cidr() {
        let targets = parse_sweep_target("192.168.1.0/30").unwrap();
        assert_eq!(targets, vec![Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2)]);
    }

    #[test]
    fn test_parse_sweep_range_and_single() {
        assert_eq!(parse_sweep_target("10.0.0.1-10.0.0.3").unwrap().len(), 3);
        assert!(parse_sweep_target("10.0.0.3-10.0.0.1").unwrap().is_empty());
        assert_eq!(parse_sweep_target(" 10.0.0.7 ").unwrap(), vec![Ipv4Addr::new(10, 0, 0, 7)]);
    }

    #[test]
    fn test_parse_sweep_rejects_invalid_and_oversized() {
        assert!(matches!(parse_sweep_target("192.168.1.0/99"), Err(ProbeError::InvalidTarget(_))));
        assert!(matches!(parse_sweep_target("a-b"), Err(ProbeError::InvalidTarget(_))));
        assert!(matches!(parse_sweep_target("10.0.0.0/8"), Err(ProbeError::RangeTooLarge { .. })));
        assert!(matches!(
            parse_sweep_target("0.0.0.0-255.255.255.255"),
            Err(ProbeError::RangeTooLarge { .. })
        ));
        assert_eq!(parse_sweep_target("10.1.0.0/16").unwrap().len(), 65_534);
    }
}
