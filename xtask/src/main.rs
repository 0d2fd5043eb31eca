// Desktop tooling crate: unwrap/expect/panic acceptable outside embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod emulate;
mod flash;
mod step;
mod test;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Front-end transfer controller development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flash firmware to the front-end board via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
        /// probe-rs probe index when several probes are attached
        #[arg(long, default_value_t = 0)]
        probe: u32,
    },
    /// Check the hardware image, the no_std core and the host crates
    Check,
    /// Run all tests (unit, integration, emulator scenarios, doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests and scenarios
        #[arg(long)]
        integration: bool,
    },
    /// Replay spill scenarios in the host emulator
    Emulate {
        /// Scenario file (JSON); all shipped scenarios when omitted
        #[arg(long)]
        scenario: Option<std::path::PathBuf>,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash { release, probe } => flash::run(release, probe),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Emulate { scenario, json } => match scenario {
            Some(path) => emulate::run(&path, json),
            None => emulate::run_all(json),
        },
    }
}
