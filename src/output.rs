use std::io::{self, Write};
use std::net::Ipv4Addr;
use anyhow::Result;
use colored::*;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::dns::{describe, DnsResult};
use crate::network::CidrInfo;
use crate::ping::{PingEntry, PingResult, PingStatistics, SweepSummary};
use crate::scanner::{PortScanEntry, PortScanReport, PortScanStatus};

/// Renders results to stdout. Human output is colored text; JSON output is
/// one compact object per line so streamed items and the final report can
/// be read back line by line.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn ping_result(&self, result: &PingResult) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_ping_result(result)),
            OutputFormat::Json => emit_json(result),
        }
    }

    pub fn ping_statistics(&self, host: &str, stats: &PingStatistics, payload_size: usize) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_ping_statistics(host, stats, payload_size)),
            OutputFormat::Json => emit_json(stats),
        }
    }

    pub fn sweep_entry(&self, entry: &PingEntry) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_sweep_entry(entry)),
            OutputFormat::Json => emit_json(entry),
        }
    }

    pub fn sweep_summary(&self, target: &str, summary: &SweepSummary) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_sweep_summary(target, summary)),
            OutputFormat::Json => emit_json(summary),
        }
    }

    /// Only human output streams ports; the JSON report already carries them.
    pub fn port_entry(&self, entry: &PortScanEntry) -> Option<String> {
        match self.format {
            OutputFormat::Human => Some(format_port_entry(entry)),
            OutputFormat::Json => None,
        }
    }

    pub fn port_report(&self, report: &PortScanReport) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_port_report(report)),
            OutputFormat::Json => emit_json(report),
        }
    }

    pub fn dns_result(&self, result: &DnsResult) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_dns_result(result)),
            OutputFormat::Json => emit_json(result),
        }
    }

    pub fn cidr(&self, info: &CidrInfo) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_cidr(info)),
            OutputFormat::Json => emit_json(info),
        }
    }

    pub fn range(&self, addresses: &[Ipv4Addr]) -> Result<()> {
        match self.format {
            OutputFormat::Human => emit(&format_range(addresses)),
            OutputFormat::Json => emit_json(addresses),
        }
    }
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn emit_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    emit(&format!("{}\n", serde_json::to_string(value)?))
}

fn separator() -> ColoredString {
    "•".truecolor(64, 64, 64)
}

pub fn format_ping_result(result: &PingResult) -> String {
    let address = result
        .address
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    let time = result.timestamp.format("%H:%M:%S");

    if result.success {
        format!(
            "{} {} {} {} {} {}\n",
            time.to_string().truecolor(128, 128, 128),
            "●".truecolor(0, 255, 65),
            result.hostname.truecolor(255, 255, 255).bold(),
            format!("[{}]", address).truecolor(128, 128, 128),
            separator(),
            format!("time={}ms", result.rtt_ms).truecolor(0, 212, 255).bold()
        )
    } else {
        format!(
            "{} {} {} {} {} {}\n",
            time.to_string().truecolor(128, 128, 128),
            "●".truecolor(255, 64, 64),
            result.hostname.truecolor(255, 255, 255).bold(),
            format!("[{}]", address).truecolor(128, 128, 128),
            separator(),
            result.status.truecolor(255, 140, 0)
        )
    }
}

pub fn format_ping_statistics(host: &str, stats: &PingStatistics, payload_size: usize) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{} {}\n", "PING STATISTICS".truecolor(0, 255, 65).bold(), host.bold()));
    output.push_str(&format!(
        "  {} sent {} {} received {} {} lost ({:.0}% loss) {} {} bytes\n",
        stats.sent.to_string().bold(),
        separator(),
        stats.received.to_string().truecolor(0, 255, 65).bold(),
        separator(),
        stats.lost().to_string().truecolor(255, 140, 0).bold(),
        stats.loss_percent(),
        separator(),
        payload_size
    ));
    match stats.min_rtt_ms {
        Some(min) => output.push_str(&format!(
            "  rtt min/avg/max = {}/{}/{} ms\n",
            min,
            stats.avg_rtt_ms(),
            stats.max_rtt_ms
        )),
        None => output.push_str(&format!("  {}\n", "no replies received".truecolor(128, 128, 128))),
    }
    output
}

pub fn format_sweep_entry(entry: &PingEntry) -> String {
    let address = entry
        .address
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    let name = if entry.hostname == address {
        String::new()
    } else {
        entry.hostname.clone()
    };
    format!(
        "{} {:<15} {} {}\n",
        "▶".truecolor(0, 255, 65).bold(),
        address.truecolor(255, 255, 255).bold(),
        format!("{}ms", entry.rtt_ms).truecolor(0, 212, 255),
        name.truecolor(128, 128, 128)
    )
}

pub fn format_sweep_summary(target: &str, summary: &SweepSummary) -> String {
    let headline = if summary.cancelled {
        "SWEEP CANCELLED".truecolor(255, 140, 0).bold()
    } else {
        "SWEEP COMPLETE".truecolor(0, 255, 65).bold()
    };
    let mut output = format!("\n{} {}\n", headline, target.bold());
    output.push_str(&format!(
        "  {} of {} hosts replied {} {} silent {} {} failed",
        summary.replied.to_string().truecolor(0, 255, 65).bold(),
        summary.targets,
        separator(),
        summary.silent,
        separator(),
        summary.failed
    ));
    if summary.skipped > 0 {
        output.push_str(&format!(" {} {} skipped", separator(), summary.skipped));
    }
    output.push('\n');
    output
}

fn status_color(status: PortScanStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        PortScanStatus::Open => text.truecolor(0, 255, 65),
        PortScanStatus::Closed => text.truecolor(128, 128, 128),
        PortScanStatus::TimedOut => text.truecolor(255, 140, 0),
        PortScanStatus::Error => text.truecolor(255, 64, 64),
    }
}

pub fn format_port_entry(entry: &PortScanEntry) -> String {
    format!(
        "  {:>5} {} {:<9} {}",
        entry.port.to_string().truecolor(255, 255, 255).bold(),
        "●".truecolor(64, 64, 64),
        status_color(entry.status),
        entry.title.truecolor(128, 128, 128)
    )
}

pub fn format_port_report(report: &PortScanReport) -> String {
    let mut output = String::new();

    let headline = if report.cancelled {
        "PORT SCAN CANCELLED".truecolor(255, 140, 0).bold()
    } else {
        "PORT SCAN COMPLETE".truecolor(0, 255, 65).bold()
    };
    output.push_str(&format!("\n{}\n\n", headline));
    output.push_str(&format!(
        "{} {} {} {} {}\n",
        "⟦".truecolor(64, 64, 64),
        report.host.truecolor(255, 255, 255).bold(),
        "•".truecolor(0, 255, 65),
        format!("{}ms", (report.end_time - report.start_time).num_milliseconds())
            .truecolor(0, 212, 255)
            .bold(),
        "⟧".truecolor(64, 64, 64)
    ));
    output.push_str(&format!(
        "{} {} of {} ports checked\n\n",
        "⟦".truecolor(64, 64, 64),
        report.entries.len().to_string().truecolor(191, 64, 191).bold(),
        report.requested
    ));

    let open: Vec<_> = report.open_ports().collect();
    if open.is_empty() {
        output.push_str(&format!(
            "{} {}\n",
            "⚠".truecolor(255, 140, 0).bold(),
            "No open ports detected".truecolor(128, 128, 128)
        ));
    } else {
        for entry in &open {
            output.push_str(&format!(
                "  {} {} {} {}\n",
                entry.port.to_string().truecolor(255, 255, 255).bold(),
                "●".truecolor(0, 255, 65),
                "open".truecolor(0, 255, 65),
                entry.title.truecolor(128, 128, 128)
            ));
        }
    }

    output.push_str(&format!(
        "\n{} open {} {} closed {} {} timed out {} {} error\n",
        report.count(PortScanStatus::Open).to_string().truecolor(0, 255, 65).bold(),
        separator(),
        report.count(PortScanStatus::Closed),
        separator(),
        report.count(PortScanStatus::TimedOut),
        separator(),
        report.count(PortScanStatus::Error)
    ));
    output
}

pub fn format_dns_result(result: &DnsResult) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} {}\n\n",
        "DNS LOOKUP".truecolor(0, 255, 65).bold(),
        result.hostname.truecolor(255, 255, 255).bold()
    ));

    let mut last_type: Option<&str> = None;
    for record in &result.records {
        if last_type != Some(record.record_type.as_str()) {
            output.push_str(&format!(
                "{} {} {}\n",
                record.record_type.truecolor(191, 64, 191).bold(),
                separator(),
                describe(&record.record_type).truecolor(128, 128, 128)
            ));
            last_type = Some(record.record_type.as_str());
        }
        output.push_str(&format!(
            "  {} {} {}\n",
            record.value.truecolor(255, 255, 255),
            format!("ttl={}", record.ttl).truecolor(0, 212, 255),
            record.name.truecolor(128, 128, 128)
        ));
    }

    if result.records.is_empty() {
        output.push_str(&format!("{}\n", "No records found".truecolor(128, 128, 128)));
    }
    if let Some(error) = &result.error {
        output.push_str(&format!("\n{} {}\n", "✖".truecolor(255, 64, 64).bold(), error.truecolor(255, 64, 64)));
    }
    output
}

pub fn format_cidr(info: &CidrInfo) -> String {
    let label = |name: &str| format!("{:<14}", name).truecolor(128, 128, 128);
    let host = |addr: Option<Ipv4Addr>| addr.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string());

    let mut output = String::new();
    output.push_str(&format!(
        "\n{} {}\n\n",
        "CIDR".truecolor(0, 255, 65).bold(),
        info.cidr_notation.truecolor(255, 255, 255).bold()
    ));
    output.push_str(&format!("  {} {}\n", label("Netmask"), info.netmask));
    output.push_str(&format!("  {} {}\n", label("Network"), info.network));
    output.push_str(&format!("  {} {}\n", label("Broadcast"), info.broadcast));
    output.push_str(&format!("  {} {}\n", label("Range"), info.range()));
    output.push_str(&format!("  {} {}\n", label("First host"), host(info.first_host)));
    output.push_str(&format!("  {} {}\n", label("Last host"), host(info.last_host)));
    output.push_str(&format!(
        "  {} {}\n",
        label("Usable hosts"),
        info.usable_hosts.to_string().truecolor(0, 212, 255).bold()
    ));
    output.push_str(&format!("  {} {}\n", label("Binary"), info.binary));
    output.push_str(&format!("  {} {}\n", label("Hex"), info.hex));
    output.push_str(&format!(
        "  {} {}\n",
        label("Private"),
        if info.is_private { "yes" } else { "no" }
    ));
    if let Some(ptr) = &info.ptr_record {
        output.push_str(&format!("  {} {}\n", label("PTR"), ptr));
    }
    output
}

pub fn format_range(addresses: &[Ipv4Addr]) -> String {
    let mut output = String::new();
    for addr in addresses {
        output.push_str(&format!("{}\n", addr));
    }
    output.push_str(&format!(
        "{} {}\n",
        addresses.len().to_string().truecolor(0, 212, 255).bold(),
        "addresses".truecolor(128, 128, 128)
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::compute_cidr;

    #[test]
    fn test_cidr_block_lists_every_field() {
        colored::control::set_override(false);
        let info = compute_cidr("10.1.2.3", 30).unwrap();
        let text = format_cidr(&info);
        assert!(text.contains("10.1.2.3/30"));
        assert!(text.contains("10.1.2.0 - 10.1.2.3"));
        assert!(text.contains("255.255.255.252"));
        assert!(text.contains("10.1.2.1"));
        assert!(text.contains("10.1.2.2"));
        assert!(!text.contains("PTR"));
    }

    #[test]
    fn test_dns_groups_by_type_with_description() {
        colored::control::set_override(false);
        let result = DnsResult {
            hostname: "example.com".into(),
            success: true,
            error: None,
            records: vec![
                crate::dns::DnsRecordEntry {
                    record_type: "A".into(),
                    name: "example.com".into(),
                    value: "93.184.216.34".into(),
                    ttl: 300,
                },
            ],
        };
        let text = format_dns_result(&result);
        assert!(text.contains("93.184.216.34"));
        assert!(text.contains(describe("A")));
        assert!(text.contains("ttl=300"));
    }

    #[test]
    fn test_range_counts_addresses() {
        colored::control::set_override(false);
        let addrs = [Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)];
        let text = format_range(&addrs);
        assert!(text.starts_with("10.0.0.1\n10.0.0.2\n"));
        assert!(text.contains("2 addresses"));
    }
}
