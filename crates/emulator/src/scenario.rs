//! Spill scenarios
//!
//! A scenario is a JSON document: board settings the host programs before
//! the first spill, then one plan per spill. Event payloads are generated
//! deterministically from the plan so a scenario file stays small.
//!
//! ```json
//! {
//!   "version": 1,
//!   "name": "nominal",
//!   "board": { "block_size": 300 },
//!   "spills": [
//!     { "events": 6, "words_per_event": 299 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use platform::memory_map::BANK_PAYLOAD_CAPACITY;
use transfer::{BlockSize, ConfigError};

/// Scenario format version understood by this emulator.
pub const SCENARIO_VERSION: u32 = 1;

/// A complete emulator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Format version, must equal [`SCENARIO_VERSION`]
    pub version: u32,
    /// Name shown in logs and reports
    pub name: String,
    /// Board settings
    #[serde(default)]
    pub board: BoardSettings,
    /// Spills, run in order
    pub spills: Vec<SpillPlan>,
}

/// Board settings applied before the first spill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardSettings {
    /// Block size the host programs with SET_BLOCK_SIZE; `None` keeps the
    /// board default.
    pub block_size: Option<u32>,
    /// Zero suppression during beam-on
    pub zero_suppression: bool,
    /// Bulk bound in words; `None` uses the whole emulated bulk buffer
    pub bulk_limit_words: Option<usize>,
    /// Reject events whose eventId names another bank
    pub check_bank_id: bool,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            block_size: None,
            zero_suppression: true,
            bulk_limit_words: None,
            check_bank_id: false,
        }
    }
}

/// One spill as the FPGA and the host play it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpillPlan {
    /// Events the FPGA produces during the beam
    pub events: u32,
    /// Payload words per event (before zero suppression)
    pub words_per_event: u32,
    /// Fraction of payload words that are zero, spread evenly
    #[serde(default)]
    pub zero_fraction: f64,
    /// Host sends BEGIN_SPILL; otherwise the first bank-ready starts the
    /// spill implicitly
    #[serde(default = "default_true")]
    pub begin: bool,
    /// Host sends LAST_FLUSH after this many blocks even if data is left
    #[serde(default)]
    pub abandon_after_blocks: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl SpillPlan {
    /// `events` events of `words_per_event` non-zero words, explicit start.
    pub fn new(events: u32, words_per_event: u32) -> Self {
        Self {
            events,
            words_per_event,
            zero_fraction: 0.0,
            begin: true,
            abandon_after_blocks: None,
        }
    }

    /// Set the zero fraction
    pub fn with_zero_fraction(mut self, fraction: f64) -> Self {
        self.zero_fraction = fraction;
        self
    }

    /// Leave the spill start to the first bank-ready
    pub fn implicit_start(mut self) -> Self {
        self.begin = false;
        self
    }

    /// Host closes the spill after `blocks` blocks
    pub fn abandon_after(mut self, blocks: u32) -> Self {
        self.abandon_after_blocks = Some(blocks);
        self
    }
}

impl Scenario {
    /// Empty scenario with default board settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SCENARIO_VERSION,
            name: name.into(),
            board: BoardSettings::default(),
            spills: Vec::new(),
        }
    }

    /// Replace the board settings
    pub fn with_board(mut self, board: BoardSettings) -> Self {
        self.board = board;
        self
    }

    /// Append a spill
    pub fn with_spill(mut self, spill: SpillPlan) -> Self {
        self.spills.push(spill);
        self
    }

    /// Parse and validate a scenario.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Self =
            serde_json::from_str(json).map_err(|e| ScenarioError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, ScenarioError> {
        serde_json::to_string_pretty(self).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    /// Check the scenario can be played on the board.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.version != SCENARIO_VERSION {
            return Err(ScenarioError::UnsupportedVersion(self.version));
        }
        if self.spills.is_empty() {
            return Err(ScenarioError::NoSpills);
        }
        if let Some(words) = self.board.block_size {
            BlockSize::new(words).map_err(ScenarioError::BlockSize)?;
        }
        for (index, spill) in self.spills.iter().enumerate() {
            if spill.words_per_event as usize > BANK_PAYLOAD_CAPACITY {
                return Err(ScenarioError::EventTooLarge {
                    spill: index,
                    words: spill.words_per_event,
                });
            }
            if !(0.0..=1.0).contains(&spill.zero_fraction) {
                return Err(ScenarioError::ZeroFraction { spill: index });
            }
        }
        Ok(())
    }
}

/// Scenario loading errors
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioError {
    /// Version field does not match [`SCENARIO_VERSION`]
    UnsupportedVersion(u32),
    /// No spills to run
    NoSpills,
    /// An event does not fit in a bank
    EventTooLarge {
        /// Spill index
        spill: usize,
        /// Requested payload words
        words: u32,
    },
    /// Zero fraction outside `0.0..=1.0`
    ZeroFraction {
        /// Spill index
        spill: usize,
    },
    /// Block size the board would reject
    BlockSize(ConfigError),
    /// Malformed JSON
    Parse(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::UnsupportedVersion(v) => {
                write!(f, "Unsupported scenario version: {v} (expected {SCENARIO_VERSION})")
            }
            ScenarioError::NoSpills => write!(f, "Scenario has no spills"),
            ScenarioError::EventTooLarge { spill, words } => write!(
                f,
                "Spill {spill}: {words} words per event exceeds the bank capacity of {BANK_PAYLOAD_CAPACITY}"
            ),
            ScenarioError::ZeroFraction { spill } => {
                write!(f, "Spill {spill}: zero_fraction must be within 0.0..=1.0")
            }
            ScenarioError::BlockSize(e) => write!(f, "Invalid block size: {e}"),
            ScenarioError::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ScenarioError {}
