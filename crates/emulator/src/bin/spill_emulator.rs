//! `spill-emulator`: replay spills against the transfer core on the host.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p emulator --bin spill-emulator -- --scenario crates/emulator/scenarios/nominal.json
//! cargo run -p emulator --bin spill-emulator -- --events 2000 --words 120 --zero-fraction 0.4
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use emulator::{BoardSettings, Emulator, Scenario, SpillPlan};
use platform::config::{emulator_banner, APP_VERSION};

/// Spill transfer emulator
#[derive(Parser, Debug)]
#[command(name = "spill-emulator")]
#[command(version)]
#[command(about = "Replay spills against the transfer core on the host", long_about = None)]
struct Args {
    /// Scenario file (JSON); without it one spill is built from the flags below
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Events in the spill
    #[arg(long, default_value_t = 1000)]
    events: u32,

    /// Payload words per event
    #[arg(long, default_value_t = 64)]
    words: u32,

    /// Fraction of zero payload words
    #[arg(long, default_value_t = 0.25)]
    zero_fraction: f64,

    /// Block size programmed by the host
    #[arg(short, long)]
    block_size: Option<u32>,

    /// Disable zero suppression
    #[arg(long)]
    no_suppression: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn load(args: &Args) -> Result<Scenario> {
    if let Some(path) = &args.scenario {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return Scenario::from_json(&json).with_context(|| format!("loading {}", path.display()));
    }
    Ok(Scenario::new("command line")
        .with_board(BoardSettings {
            block_size: args.block_size,
            zero_suppression: !args.no_suppression,
            ..BoardSettings::default()
        })
        .with_spill(SpillPlan::new(args.events, args.words).with_zero_fraction(args.zero_fraction)))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!("{} v{}", emulator_banner(), APP_VERSION);
    let scenario = load(&args)?;

    let mut emulator = Emulator::new(&scenario.board)?;
    let report = emulator.run(&scenario)?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }

    if !report.all_matched() {
        bail!("scenario {}: host data does not match what the FPGA produced", scenario.name);
    }
    Ok(())
}
