use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{self, OnFailure};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let start = Instant::now();

    // Board image
    step::cargo(
        "Hardware target (STM32H7)",
        &[
            "check",
            "-p",
            "firmware",
            "--target",
            "thumbv7em-none-eabihf",
            "--features",
            "hardware",
        ],
        OnFailure::Bail,
    )?;

    // The transfer core must stay no_std with defmt on
    step::cargo(
        "Transfer core (no_std)",
        &[
            "check",
            "-p",
            "transfer",
            "--target",
            "thumbv7em-none-eabihf",
            "--features",
            "defmt",
        ],
        OnFailure::Bail,
    )?;

    // Host side: emulator, tooling, firmware lib with std
    step::cargo(
        "Host crates",
        &["check", "--workspace", "--all-targets", "--features", "firmware/std"],
        OnFailure::Bail,
    )?;

    step::cargo(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;

    if step::cargo("Formatting", &["fmt", "--all", "--check"], OnFailure::Warn)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    step::done("All checks", start);
    Ok(())
}
