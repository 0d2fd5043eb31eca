use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Scenario files shipped with the emulator crate.
const SCENARIO_DIR: &str = "crates/emulator/scenarios";

/// Replay one scenario file.
pub fn run(scenario: &Path, json: bool) -> Result<()> {
    println!();
    println!(
        "{}",
        format!("⚡ Replaying {}...", scenario.display()).cyan().bold()
    );
    println!();
    replay(scenario, json)
}

/// Replay every scenario in the emulator crate.
pub fn run_all(json: bool) -> Result<()> {
    let start = Instant::now();
    let scenarios = scenario_files(Path::new(SCENARIO_DIR))?;
    if scenarios.is_empty() {
        println!("{}", "  ⚠ No scenarios found".yellow());
        return Ok(());
    }
    for path in &scenarios {
        replay(path, json)?;
    }
    println!(
        "{}",
        format!(
            "  ✓ {} scenarios replayed in {:.2}s",
            scenarios.len(),
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    Ok(())
}

fn replay(scenario: &Path, json: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "-q", "-p", "emulator", "--bin", "spill-emulator", "--"])
        .arg("--scenario")
        .arg(scenario);
    if json {
        cmd.arg("--json");
    }

    let output = cmd.output().context("Failed to run spill-emulator")?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        println!("  {line}");
    }
    if !output.status.success() {
        eprintln!(
            "{}",
            format!("  ✗ {} failed", scenario.display()).red().bold()
        );
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("Scenario {} failed", scenario.display());
    }
    Ok(())
}

/// `*.json` files in `dir`, sorted by name.
fn scenario_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
