//! Relay binary: feeds a byte stream from stdin into a [`Recorder`].
//!
//! Usage:
//!   beacon-relay -c /etc/beacon/relay.conf --yes < events.bin
//!   some-producer | beacon-relay --endpoint http://localhost:4001 --tag demo --yes

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use tokio::io::AsyncReadExt;

use beacon_client::{
    load_config, validate_config, Consent, FilePrefStore, Recorder, RecorderConfig, TrackingTag,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "beacon-relay", about = "Relay a byte stream from stdin to a collection endpoint")]
struct Cli {
    /// Path to the configuration file (compiled-in defaults when omitted).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the collection endpoint origin.
    #[arg(long)]
    endpoint: Option<String>,

    /// Tracking tag candidate (1-10 alphanumerics; persisted when valid).
    #[arg(long)]
    tag: Option<String>,

    /// Version string reported with every upload.
    #[arg(long = "version-string", default_value = "0.0.0")]
    version: String,

    /// Grant consent for this run without touching the persisted choice.
    #[arg(long)]
    yes: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let cfg = match load_cfg(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("beacon-relay: config error: {e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli, cfg).await {
        eprintln!("beacon-relay: {e:#}");
        process::exit(1);
    }
}

fn load_cfg(cli: &Cli) -> anyhow::Result<RecorderConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            load_config(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => RecorderConfig::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        cfg.endpoint = endpoint.clone();
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

// ── Relay loop ────────────────────────────────────────────────────────────────

async fn run(cli: &Cli, cfg: RecorderConfig) -> anyhow::Result<()> {
    let store = FilePrefStore::new(&cfg.pref_dir);
    let consent = if cli.yes { Consent::Granted } else { Consent::load(&store) };
    let tag = TrackingTag::resolve(cli.tag.as_deref(), &store);

    let recorder = Recorder::new(cfg, consent, tag)?;
    recorder.set_version(&cli.version);

    info!("relaying stdin (version {})", cli.version);

    let mut stdin = tokio::io::stdin();
    let mut buf = [0u8; 4096];
    loop {
        tokio::select! {
            read = stdin.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => recorder.push_bytes(&buf[..n]),
                Err(e) => {
                    warn!("stdin read: {e}");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    // Give outstanding flushes a moment to drain. Delivery is best-effort,
    // so whatever is still buffered at the deadline is dropped.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    while recorder.flush_outstanding() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    match recorder.session_id() {
        Some(id) => info!(
            "session {id}: {} bytes acknowledged, {} left behind",
            recorder.acknowledged(),
            recorder.pending_len()
        ),
        None => info!("nothing acknowledged ({} bytes buffered)", recorder.pending_len()),
    }
    Ok(())
}
