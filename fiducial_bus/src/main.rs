//! tuio_bridge: forward debounced TUIO markers to the chord engine.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fiducial_bus::{BusSender, TuioBridge, ENGINE_PORT, TUIO_PORT};

#[derive(Parser, Debug)]
#[command(about = "Debounce TUIO 1.1 /tuio/2Dobj markers into /tuio/fiducial events")]
struct Args {
    /// Address the TUIO tracker publishes to.
    #[arg(long, default_value_t = format!("0.0.0.0:{TUIO_PORT}"))]
    listen: String,
    /// Chord engine address.
    #[arg(long, default_value_t = format!("127.0.0.1:{ENGINE_PORT}"))]
    target: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let sender = BusSender::connect(args.target.as_str())
        .with_context(|| format!("resolving target {}", args.target))?;
    let bridge = TuioBridge::bind(args.listen.as_str(), sender)
        .with_context(|| format!("binding {}", args.listen))?;

    bridge.run();
    Ok(())
}
