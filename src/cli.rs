use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "netprobe")]
#[command(version)]
#[command(about = "Ping, sweep, port scan, DNS lookup and IPv4 CIDR calculator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short = 'o', long, value_enum, default_value = "human", global = true, help = "Output format")]
    pub output_format: OutputFormat,

    #[arg(long, global = true, help = "Settings file (default: <config dir>/netprobe/config.json)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send ICMP echo requests to a host
    Ping {
        host: String,

        #[arg(long, help = "Reply timeout in milliseconds")]
        timeout: Option<u64>,

        #[arg(short = 's', long, help = "Payload size in bytes (random content)")]
        size: Option<usize>,

        #[arg(short = 't', long, help = "Keep pinging until interrupted")]
        continuous: bool,

        #[arg(short, long, help = "Delay between probes in milliseconds (continuous mode)")]
        interval: Option<u64>,

        #[arg(short = 'n', long, help = "Stop after this many probes (continuous mode)")]
        count: Option<u64>,
    },

    /// Ping every address of a range (A-B) or CIDR block concurrently
    Sweep {
        target: String,
    },

    /// TCP connect scan
    Ports {
        host: String,

        #[arg(short, long, help = "Ports: 22,80,443 or 8000-8100", conflicts_with = "preset")]
        ports: Option<String>,

        #[arg(long, value_enum, help = "Predefined port list")]
        preset: Option<PresetArg>,

        #[arg(long, help = "Connect timeout per port in milliseconds")]
        timeout: Option<u64>,
    },

    /// Query A, AAAA, CNAME, MX, NS, TXT, SOA and CAA records
    Dns {
        host: String,
    },

    /// Network, broadcast and host range of an IPv4 block
    Cidr {
        address: String,

        #[arg(long, default_value_t = 24, help = "Prefix length (0-32)")]
        prefix: u8,

        #[arg(long, help = "Also resolve the address's PTR record")]
        ptr: bool,
    },

    /// List every address between two IPv4 addresses
    Range {
        start: String,
        end: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    #[value(name = "human", help = "Human-readable output")]
    Human,
    #[value(name = "json", help = "JSON output")]
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum PresetArg {
    #[value(name = "application", help = "Desktop/application service ports")]
    Application,
    #[value(name = "server", help = "Common server ports")]
    Server,
}

impl From<PresetArg> for crate::scanner::PortPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Application => crate::scanner::PortPreset::Application,
            PresetArg::Server => crate::scanner::PortPreset::Server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ports_command() {
        let cli = Cli::try_parse_from(["netprobe", "ports", "10.0.0.1", "-p", "22,80", "-o", "json"]).unwrap();
        assert_eq!(cli.output_format, OutputFormat::Json);
        match cli.command {
            Command::Ports { host, ports, preset, .. } => {
                assert_eq!(host, "10.0.0.1");
                assert_eq!(ports.as_deref(), Some("22,80"));
                assert!(preset.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ports_and_preset_conflict() {
        let parsed = Cli::try_parse_from(["netprobe", "ports", "h", "-p", "22", "--preset", "server"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cidr_default_prefix() {
        let cli = Cli::try_parse_from(["netprobe", "cidr", "192.168.1.10"]).unwrap();
        match cli.command {
            Command::Cidr { prefix, ptr, .. } => {
                assert_eq!(prefix, 24);
                assert!(!ptr);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
