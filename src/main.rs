use std::path::PathBuf;
use std::time::Duration;

use clamd_scan_rs::client::ClamdClient;
use clamd_scan_rs::types::ScanOutcome;
use serde_json;
use std::fs::File;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// clamd-scan-rs — Async TCP client for the clamd antivirus daemon.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "clamd-scan-rs",
    version,
    about = "Async TCP client for the clamd antivirus daemon.",
    long_about = None
)]
struct Cli {
    /// clamd host name or IP address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// clamd TCP port.
    #[arg(long, default_value_t = 3310)]
    port: u16,

    /// Connect timeout in milliseconds (0 disables the timeout).
    #[arg(long = "timeout-ms", default_value_t = 0)]
    timeout_ms: u64,

    /// Write scan results as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Check the daemon is alive.
    Ping,
    /// Print the daemon and signature database versions.
    Version,
    /// Reload the signature database.
    Reload,
    /// Ask the daemon to shut down and exit.
    Shutdown,
    /// Scan a file or directory on the daemon's file system (absolute path).
    Scan { path: PathBuf },
    /// Scan without stopping on detections or errors.
    Contscan { path: PathBuf },
    /// Scan with multiple daemon threads.
    Multiscan { path: PathBuf },
    /// Upload a local file and scan it as a stream.
    Instream { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = if cli.timeout_ms > 0 {
        ClamdClient::with_timeout(&cli.host, cli.port, Duration::from_millis(cli.timeout_ms))
    } else {
        ClamdClient::new(&cli.host, cli.port)
    };

    match &cli.command {
        Command::Ping => println!("{}", client.ping().await?),
        Command::Version => println!("{}", client.version().await?),
        Command::Reload => println!("{}", client.reload().await?),
        Command::Shutdown => {
            client.shutdown().await?;
            println!("shutdown request sent");
        }
        Command::Scan { path } => report(&cli, &client.scan(path).await?)?,
        Command::Contscan { path } => report(&cli, &client.contscan(path).await?)?,
        Command::Multiscan { path } => report(&cli, &client.multiscan(path).await?)?,
        Command::Instream { file } => {
            let source = tokio::fs::File::open(file).await?;
            report(&cli, &client.instream(source).await?)?;
        }
    }

    Ok(())
}

fn report(cli: &Cli, outcome: &ScanOutcome) -> Result<()> {
    print_outcome_table(outcome);
    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_outcome_json(path, outcome) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON results to {}", path.display());
        }
    }
    Ok(())
}

fn print_outcome_table(outcome: &ScanOutcome) {
    let mut path_w = "path".len();
    let mut detail_w = "detail".len();
    for (path, verdict) in outcome {
        path_w = path_w.max(path.len());
        if let Some(d) = &verdict.detail {
            detail_w = detail_w.max(d.len().min(60));
        }
    }
    let status_w = "status".len();

    println!("\nResults: {}", outcome.len());
    println!(
        "{:<path_w$}  {:<status_w$}  {:<detail_w$}",
        "path",
        "status",
        "detail",
        path_w = path_w,
        status_w = status_w,
        detail_w = detail_w
    );
    println!(
        "{:-<path_w$}  {:-<status_w$}  {:-<detail_w$}",
        "",
        "",
        "",
        path_w = path_w,
        status_w = status_w,
        detail_w = detail_w
    );

    let mut rows: Vec<_> = outcome.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    for (path, verdict) in rows {
        let mut detail = verdict.detail.clone().unwrap_or_default();
        if detail.len() > 60 {
            detail.truncate(60);
        }
        println!(
            "{:<path_w$}  {:<status_w$}  {:<detail_w$}",
            path,
            verdict.status.to_string(),
            detail,
            path_w = path_w,
            status_w = status_w,
            detail_w = detail_w
        );
    }
}

fn write_outcome_json(path: &std::path::Path, outcome: &ScanOutcome) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, outcome)?;
    Ok(())
}
