use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::step::{self, OnFailure};

/// probe-rs chip name of the front-end board MCU.
const CHIP: &str = "STM32H743ZITx";
const TARGET: &str = "thumbv7em-none-eabihf";

fn binary_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{TARGET}/{profile}/firmware")
}

pub fn run(release: bool, probe: u32) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!(
        "{}",
        format!("🔨 Building firmware ({mode} mode)...").cyan().bold()
    );
    println!();

    let mut args = vec!["build", "-p", "firmware", "--target", TARGET, "--features", "hardware"];
    if release {
        args.push("--release");
    }
    step::cargo("Firmware build", &args, OnFailure::Bail)?;

    show_binary_size(release);

    println!("{}", format!("📡 Flashing {CHIP} (probe {probe})...").cyan().bold());
    let start = Instant::now();
    let output = Command::new("probe-rs")
        .arg("download")
        .arg(binary_path(release))
        .args(["--chip", CHIP, "--probe-index"])
        .arg(probe.to_string())
        .output()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !output.status.success() {
        eprintln!("{}", "✗ Flash failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("Flash failed - check that the probe is connected and the board is powered");
    }

    println!(
        "{}",
        format!("✓ Flashed in {:.2}s", start.elapsed().as_secs_f64()).green()
    );
    println!();
    println!(
        "   {}",
        format!("RTT logs: probe-rs attach --chip {CHIP} {}", binary_path(release)).dimmed()
    );
    println!(
        "   {}",
        "Log level is fixed at build time by DEFMT_LOG (.cargo/config.toml)".dimmed()
    );
    println!();

    Ok(())
}

/// Section sizes; the dispatch path must fit in flash with room for logs.
fn show_binary_size(release: bool) {
    let output = Command::new("rust-size")
        .arg(binary_path(release))
        .arg("-A")
        .output();

    match output {
        Ok(out) if out.status.success() => {
            println!("{}", "📊 Binary size:".cyan());
            for line in String::from_utf8_lossy(&out.stdout).lines() {
                println!("   {}", line.dimmed());
            }
            println!();
        }
        _ => println!(
            "   {}",
            "rust-size not found (cargo install cargo-binutils), skipping size report".dimmed()
        ),
    }
}
