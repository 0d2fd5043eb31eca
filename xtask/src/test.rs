use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::emulate;
use crate::step::{self, OnFailure};

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let start = Instant::now();

    if !integration_only {
        let out = step::cargo("Unit tests", &["test", "--lib", "--workspace"], OnFailure::Bail)?;
        report_summary(out.as_deref());
    }

    if !unit_only {
        // Dispatch table, spill scenarios, properties, boot and end-to-end runs
        let out = step::cargo(
            "Integration tests",
            &["test", "--workspace", "--test", "*"],
            OnFailure::Bail,
        )?;
        report_summary(out.as_deref());

        println!("{}", "  Replaying emulator scenarios...".cyan());
        emulate::run_all(false)?;
    }

    let out = step::cargo("Doc tests", &["test", "--doc", "--workspace"], OnFailure::Warn)?;
    report_summary(out.as_deref());

    step::done("All tests", start);
    Ok(())
}

fn report_summary(stdout: Option<&str>) {
    if let Some(out) = stdout {
        println!("     {}", extract_test_summary(out).dimmed());
    }
}

/// Sum the "test result:" lines of a cargo test run.
fn extract_test_summary(output: &str) -> String {
    let mut passed = 0u64;
    let mut failed = 0u64;
    let mut ignored = 0u64;
    let mut found = false;
    for line in output.lines() {
        let Some(summary) = line.split("test result:").nth(1) else {
            continue;
        };
        found = true;
        for part in summary.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(n) = count.parse::<u64>() else {
                continue;
            };
            match kind {
                "passed" => passed = passed.saturating_add(n),
                "failed" => failed = failed.saturating_add(n),
                "ignored" => ignored = ignored.saturating_add(n),
                _ => {}
            }
        }
    }
    if !found {
        return "(summary not available)".to_string();
    }
    format!("{passed} passed; {failed} failed; {ignored} ignored")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_sums_all_binaries() {
        let out = "\
test result: ok. 5 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out
running 3 tests
test result: ok. 3 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out";
        assert_eq!(extract_test_summary(out), "8 passed; 0 failed; 1 ignored");
    }

    #[test]
    fn test_summary_without_results() {
        assert_eq!(extract_test_summary("error: no tests"), "(summary not available)");
    }
}
