use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// What a failed step does to the task.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Print the output and stop the task
    Bail,
    /// Print a warning and carry on
    Warn,
}

/// Run `cargo <args>` as one reported step.
///
/// Prints a ✓ line with the elapsed time, or the captured output on failure.
/// Returns the captured stdout when the step passed.
pub fn cargo(label: &str, args: &[&str], on_failure: OnFailure) -> Result<Option<String>> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
        println!();
        return Ok(Some(stdout));
    }

    match on_failure {
        OnFailure::Bail => {
            eprintln!("{}", format!("  ✗ {label} failed").red().bold());
            eprintln!();
            for line in stdout.lines() {
                eprintln!("  {line}");
            }
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("{label} failed");
        }
        OnFailure::Warn => {
            eprintln!("{}", format!("  ⚠ {label} reported problems").yellow().bold());
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            println!();
            Ok(None)
        }
    }
}

/// Final line of a task.
pub fn done(task: &str, start: Instant) {
    println!(
        "{}",
        format!("✓ {task} completed in {:.2}s", start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();
}
