//! key_forwarder: send terminal keys to the chord engine.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fiducial_bus::{BusSender, ENGINE_PORT};
use key_forwarder::{CrosstermTerminal, Forwarder, DEFAULT_POLL};

#[derive(Parser, Debug)]
#[command(about = "Forward terminal key presses as /key OSC events")]
struct Args {
    /// Chord engine address.
    #[arg(long, default_value_t = format!("127.0.0.1:{ENGINE_PORT}"))]
    target: String,
    /// Delay between terminal checks in milliseconds.
    #[arg(long, default_value_t = DEFAULT_POLL.as_millis() as u64)]
    poll_ms: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let sender = BusSender::connect(args.target.as_str())
        .with_context(|| format!("resolving target {}", args.target))?;
    let mut forwarder = Forwarder::new(CrosstermTerminal, sender, Duration::from_millis(args.poll_ms));
    forwarder.run().context("forwarding keys")?;
    Ok(())
}
