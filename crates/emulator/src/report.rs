//! Run reports

use serde::Serialize;

use transfer::{ErrorCode, Outcome, SpillStats};

/// What happened during one spill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpillReport {
    /// Spill index within the scenario
    pub spill: u32,
    /// Events the FPGA wrote into a bank
    pub events_written: u32,
    /// Events lost at the FPGA because the next bank was still full
    pub events_blocked: u32,
    /// Events the controller stored in the bulk buffer
    pub events_stored: u32,
    /// Events the controller dropped on overflow
    pub events_dropped: u32,
    /// Zero words removed during beam-on
    pub words_suppressed: u32,
    /// Words the host should receive
    pub expected_words: usize,
    /// Words the host received
    pub received_words: usize,
    /// Blocks the host read
    pub blocks: u32,
    /// The host closed the spill with LAST_FLUSH
    pub closed_by_last_flush: bool,
    /// Received data equals the expected data, in order
    pub matched: bool,
    /// Board state after the spill
    pub final_state: String,
    /// Errors the board reported, in order
    pub errors: Vec<String>,
    /// Words received, in order
    #[serde(skip)]
    pub received: Vec<u32>,
}

impl SpillReport {
    /// Empty report for spill `spill`.
    pub fn new(spill: u32) -> Self {
        Self {
            spill,
            ..Self::default()
        }
    }

    /// Note the errors of one dispatch.
    pub fn record(&mut self, outcome: &Outcome) {
        self.errors
            .extend(outcome.errors.iter().map(|code| code.name().to_string()));
    }

    /// Take the counters the board kept for the spill.
    pub fn absorb_stats(&mut self, stats: &SpillStats) {
        self.words_suppressed = stats.words_suppressed;
    }

    /// Whether the board reported `code` during this spill.
    pub fn reported(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e == code.name())
    }
}

/// Result of a whole scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Scenario name
    pub scenario: String,
    /// One entry per spill
    pub spills: Vec<SpillReport>,
}

impl RunReport {
    /// Whether every spill delivered exactly the expected data.
    pub fn all_matched(&self) -> bool {
        self.spills.iter().all(|s| s.matched)
    }

    /// Total words the host received.
    pub fn received_words(&self) -> usize {
        self.spills.iter().map(|s| s.received_words).sum()
    }

    /// JSON rendering for `--json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "scenario {}", self.scenario)?;
        for s in &self.spills {
            writeln!(
                f,
                "  spill {}: {} stored, {} dropped, {} blocked, {}/{} words in {} blocks, {} [{}]{}",
                s.spill,
                s.events_stored,
                s.events_dropped,
                s.events_blocked,
                s.received_words,
                s.expected_words,
                s.blocks,
                if s.matched { "match" } else { "MISMATCH" },
                s.final_state,
                if s.errors.is_empty() {
                    String::new()
                } else {
                    format!(" errors: {}", s.errors.join(", "))
                }
            )?;
        }
        Ok(())
    }
}
