use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use netprobe::cli::{Cli, Command};
use netprobe::config::Settings;
use netprobe::log_sink::TracingSink;
use netprobe::network;
use netprobe::output::OutputWriter;
use netprobe::ping::PingRequest;
use netprobe::scanner::{parse_ports, PortPreset, PortScanRequest};
use netprobe::{ProbeError, Toolkit};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "netprobe=debug" } else { "netprobe=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::load().context("failed to load settings")?,
    };

    let toolkit = Toolkit::system(settings, Arc::new(TracingSink));
    let output = OutputWriter::new(cli.output_format);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    if let Err(e) = run(cli.command, &toolkit, &output, &cancel).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        // Usage errors exit with 2, like clap's own argument errors
        let bad_input = e
            .downcast_ref::<ProbeError>()
            .is_some_and(ProbeError::is_input_error);
        std::process::exit(if bad_input { 2 } else { 1 });
    }

    Ok(())
}

async fn run(command: Command, toolkit: &Toolkit, output: &OutputWriter, cancel: &CancellationToken) -> Result<()> {
    match command {
        Command::Ping { host, timeout, size, continuous, interval, count } => {
            let ping = &toolkit.settings().ping;
            let timeout = timeout.map(Duration::from_millis).unwrap_or_else(|| ping.timeout());
            let payload_size = size.unwrap_or(ping.payload_size);
            let request = PingRequest::new(host.clone())
                .with_timeout(timeout)
                .with_payload_size(payload_size);

            if !continuous {
                let result = toolkit.ping_once(&request).await;
                return output.ping_result(&result);
            }

            let interval = interval.map(Duration::from_millis).unwrap_or_else(|| ping.interval());
            let (tx, mut rx) = mpsc::channel(16);
            let consume = async {
                let mut seen = 0u64;
                while let Some(result) = rx.recv().await {
                    output.ping_result(&result)?;
                    seen += 1;
                    if count.is_some_and(|limit| seen >= limit) {
                        cancel.cancel();
                    }
                }
                Ok::<_, anyhow::Error>(())
            };
            let (stats, consumed) = tokio::join!(
                toolkit.start_continuous_ping(&request, interval, tx, cancel),
                consume
            );
            consumed?;
            output.ping_statistics(&host, &stats, payload_size)
        }

        Command::Sweep { target } => {
            let (tx, mut rx) = mpsc::channel(64);
            let consume = async {
                while let Some(entry) = rx.recv().await {
                    output.sweep_entry(&entry)?;
                }
                Ok::<_, anyhow::Error>(())
            };
            let (summary, consumed) = tokio::join!(toolkit.sweep(&target, tx, cancel), consume);
            consumed?;
            output.sweep_summary(&target, &summary?)
        }

        Command::Ports { host, ports, preset, timeout } => {
            let ports = match (ports, preset) {
                (Some(spec), _) => parse_ports(&spec)?,
                (None, Some(preset)) => PortPreset::from(preset).ports().to_vec(),
                (None, None) => PortPreset::Server.ports().to_vec(),
            };
            let timeout = timeout
                .map(Duration::from_millis)
                .unwrap_or_else(|| toolkit.settings().port_scan.timeout());
            let request = PortScanRequest::new(host, ports).with_timeout(timeout);

            let progress = ProgressBar::new(request.ports.len() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ports")?
                    .progress_chars("#>-"),
            );

            let (tx, mut rx) = mpsc::channel(64);
            let consume = async {
                while let Some(entry) = rx.recv().await {
                    progress.inc(1);
                    if let Some(line) = output.port_entry(&entry) {
                        progress.println(line);
                    }
                }
            };
            let (report, ()) = tokio::join!(toolkit.scan_ports(&request, Some(tx), cancel), consume);
            progress.finish_and_clear();
            output.port_report(&report?)
        }

        Command::Dns { host } => {
            let result = toolkit.lookup_dns(&host, cancel).await;
            output.dns_result(&result)
        }

        Command::Cidr { address, prefix, ptr } => {
            let info = toolkit.compute_cidr(&address, prefix, ptr).await?;
            output.cidr(&info)
        }

        Command::Range { start, end } => {
            let range = network::enumerate_range(&start, &end);
            if range.count_hint() > network::MAX_SWEEP_ADDRESSES {
                anyhow::bail!(
                    "range {} - {} holds {} addresses, more than {}",
                    start,
                    end,
                    range.count_hint(),
                    network::MAX_SWEEP_ADDRESSES
                );
            }
            let addresses: Vec<_> = range.collect();
            output.range(&addresses)
        }
    }
}
