//! chord_pulse: fiducial chord engine entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chord_pulse::sink::list_ports;
use chord_pulse::{run, Overrides, PulseConfig};

#[derive(Debug, Parser)]
#[command(name = "chord_pulse", about = "Turns fiducial markers into chords")]
struct Args {
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// UDP address to receive OSC on.
    #[arg(long)]
    listen: Option<String>,
    /// Renderer period in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Substring of the MIDI output port name.
    #[arg(long)]
    midi_port: Option<String>,
    /// Log chords instead of playing them.
    #[arg(long)]
    null_audio: bool,
    /// Print MIDI output ports and exit.
    #[arg(long)]
    list_midi_ports: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.list_midi_ports {
        for (i, name) in list_ports().context("listing MIDI ports")?.iter().enumerate() {
            println!("  {i}: {name}");
        }
        return Ok(());
    }

    let cfg = PulseConfig::load_or_default(args.config.as_deref())
        .context("loading configuration")?
        .with_overrides(&Overrides {
            listen:     args.listen,
            tick_ms:    args.tick_ms,
            midi_port:  args.midi_port,
            null_audio: args.null_audio,
        });

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Chord Pulse · Fiducial Angle Chord Engine           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Listening on {}  ·  tick {} ms", cfg.listen, cfg.tick_ms);
    println!();

    run(cfg).context("chord engine")?;
    Ok(())
}
