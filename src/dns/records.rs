// Record kinds, raw answers and their normalized form
use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use serde::{Deserialize, Serialize};

/// Query order used by the aggregator.
pub const QUERY_ORDER: [RecordKind; 8] = [
    RecordKind::A,
    RecordKind::Aaaa,
    RecordKind::Cname,
    RecordKind::Mx,
    RecordKind::Ns,
    RecordKind::Txt,
    RecordKind::Soa,
    RecordKind::Caa,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Txt,
    Soa,
    Caa,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Cname => "CNAME",
            RecordKind::Mx => "MX",
            RecordKind::Ns => "NS",
            RecordKind::Txt => "TXT",
            RecordKind::Soa => "SOA",
            RecordKind::Caa => "CAA",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of one answer as handed over by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Mx { preference: u16, exchange: String },
    Ns(String),
    Txt(Vec<String>),
    Soa { mname: String, rname: String },
    Caa { tag: String, value: String },
    /// Anything else the resolver returned alongside the requested type.
    Other { type_tag: String, rendered: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub name: String,
    pub ttl: u32,
    pub data: RecordData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordEntry {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub ttl: u32,
}

impl From<&Answer> for DnsRecordEntry {
    fn from(answer: &Answer) -> Self {
        let (record_type, value) = match &answer.data {
            RecordData::A(ip) => ("A".to_string(), ip.to_string()),
            RecordData::Aaaa(ip) => ("AAAA".to_string(), ip.to_string()),
            RecordData::Cname(target) => ("CNAME".to_string(), target.clone()),
            RecordData::Mx { preference, exchange } => {
                ("MX".to_string(), format!("{} {}", preference, exchange))
            }
            RecordData::Ns(server) => ("NS".to_string(), server.clone()),
            RecordData::Txt(segments) => ("TXT".to_string(), segments.join(" ")),
            RecordData::Soa { mname, rname } => ("SOA".to_string(), format!("{} {}", mname, rname)),
            RecordData::Caa { tag, value } => ("CAA".to_string(), format!("{} {}", tag, value)),
            RecordData::Other { type_tag, rendered } => (type_tag.clone(), rendered.clone()),
        };

        DnsRecordEntry {
            record_type,
            name: answer.name.clone(),
            value,
            ttl: answer.ttl,
        }
    }
}

lazy_static::lazy_static! {
    static ref DESCRIPTIONS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("A", "Maps a hostname to an IPv4 address.");
        m.insert("AAAA", "Maps a hostname to an IPv6 address.");
        m.insert("CNAME", "Creates an alias for another domain.");
        m.insert("MX", "Specifies mail servers for a domain.");
        m.insert("NS", "Specifies authoritative name servers.");
        m.insert("PTR", "Reverse DNS: IP → hostname.");
        m.insert("SRV", "Specifies service location.");
        m.insert("SOA", "Administrative info about the domain.");
        m.insert("TXT", "Stores arbitrary text (SPF, DKIM, DMARC).");
        m.insert("CAA", "Specifies which CAs can issue certificates.");
        m.insert("DS", "DNSSEC delegation signer record.");
        m.insert("DNSKEY", "DNSSEC public signing key.");
        m
    };
}

pub fn describe(record_type: &str) -> &'static str {
    DESCRIPTIONS
        .get(record_type.to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or("Unknown DNS record type.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(data: RecordData) -> Answer {
        Answer { name: "example.com.".into(), ttl: 300, data }
    }

    #[test]
    fn test_value_encoding_per_type() {
        let cases = vec![
            (RecordData::A(Ipv4Addr::new(93, 184, 216, 34)), "A", "93.184.216.34"),
            (RecordData::Aaaa("2606:2800::1".parse().unwrap()), "AAAA", "2606:2800::1"),
            (RecordData::Cname("www.example.net.".into()), "CNAME", "www.example.net."),
            (RecordData::Mx { preference: 10, exchange: "mail.example.com.".into() }, "MX", "10 mail.example.com."),
            (RecordData::Ns("a.iana-servers.net.".into()), "NS", "a.iana-servers.net."),
            (RecordData::Txt(vec!["v=spf1".into(), "-all".into()]), "TXT", "v=spf1 -all"),
            (
                RecordData::Soa { mname: "ns.icann.org.".into(), rname: "noc.dns.icann.org.".into() },
                "SOA",
                "ns.icann.org. noc.dns.icann.org.",
            ),
            (RecordData::Caa { tag: "issue".into(), value: "letsencrypt.org".into() }, "CAA", "issue letsencrypt.org"),
            (RecordData::Other { type_tag: "SRV".into(), rendered: "0 5 5060 sip.example.com.".into() }, "SRV", "0 5 5060 sip.example.com."),
        ];

        for (data, expected_type, expected_value) in cases {
            let entry = DnsRecordEntry::from(&answer(data));
            assert_eq!(entry.record_type, expected_type);
            assert_eq!(entry.value, expected_value);
            assert_eq!(entry.name, "example.com.");
            assert_eq!(entry.ttl, 300);
        }
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(describe("mx"), "Specifies mail servers for a domain.");
        assert_eq!(describe("HINFO"), "Unknown DNS record type.");
    }

    #[test]
    fn test_query_order() {
        let order: Vec<&str> = QUERY_ORDER.iter().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["A", "AAAA", "CNAME", "MX", "NS", "TXT", "SOA", "CAA"]);
    }
}
