//! Runtime transfer configuration.
//!
//! # Defaults
//!
//! | Setting          | Default          | Changed by                       |
//! |------------------|------------------|----------------------------------|
//! | Block size       | 300 words        | `SET_BLOCK_SIZE` command         |
//! | Zero suppression | on               | board build / emulator scenario  |
//! | Word count       | header bit field | board build / emulator scenario  |
//! | Bulk bound       | whole bulk window| board build / emulator scenario  |
//! | Bank id check    | off              | board build / emulator scenario  |
//!
//! The 300-word default matches the block size the host readout list
//! programs at download time, so a board that misses that command still
//! produces blocks the host accepts.

use core::fmt;

use platform::memory_map::{BANK_PAYLOAD_CAPACITY, BULK_WORDS, MAX_BLOCK_WORDS};

/// Configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Block size of zero words.
    BlockSizeZero,
    /// Block size larger than the handoff region.
    BlockSizeTooLarge(u32),
    /// Fixed word count larger than a bank's payload capacity.
    FixedCountTooLarge(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockSizeZero => f.write_str("block size must be at least one word"),
            Self::BlockSizeTooLarge(n) => {
                write!(f, "block size {n} exceeds handoff region of {MAX_BLOCK_WORDS} words")
            }
            Self::FixedCountTooLarge(n) => write!(
                f,
                "fixed word count {n} exceeds bank capacity of {BANK_PAYLOAD_CAPACITY} words"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Words handed to the host per flush, `1..=MAX_BLOCK_WORDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockSize(u16);

impl BlockSize {
    /// Host readout list default.
    pub const DEFAULT: Self = Self(300);

    /// Largest block the handoff region holds.
    // MAX_BLOCK_WORDS = 0x7FFC fits u16
    #[allow(clippy::cast_possible_truncation)]
    pub const MAX: Self = Self(MAX_BLOCK_WORDS as u16);

    /// Validate a block size.
    pub fn new(words: u32) -> Result<Self, ConfigError> {
        if words == 0 {
            return Err(ConfigError::BlockSizeZero);
        }
        match u16::try_from(words) {
            Ok(w) if usize::from(w) <= MAX_BLOCK_WORDS => Ok(Self(w)),
            _ => Err(ConfigError::BlockSizeTooLarge(words)),
        }
    }

    /// Block size in words
    pub fn words(self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a bank's payload length is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordCountMode {
    /// Read the count from the header bit field.
    Header,
    /// Scalar mode: every event carries this many payload words, whatever
    /// the header says (the header only flags the bank as ready).
    Fixed(u16),
}

impl WordCountMode {
    /// Scalar mode with a validated fixed length.
    pub fn fixed(words: u32) -> Result<Self, ConfigError> {
        match u16::try_from(words) {
            Ok(w) if usize::from(w) <= BANK_PAYLOAD_CAPACITY => Ok(Self::Fixed(w)),
            _ => Err(ConfigError::FixedCountTooLarge(words)),
        }
    }
}

/// Transfer settings owned by the dispatcher.
///
/// Builder-style: start from [`TransferConfig::new`] (the defaults) and
/// chain `with_*` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    block_size: BlockSize,
    zero_suppress: bool,
    word_count_mode: WordCountMode,
    bulk_limit_words: usize,
    check_bank_id: bool,
}

impl TransferConfig {
    /// Defaults (see module docs).
    pub const fn new() -> Self {
        Self {
            block_size: BlockSize::DEFAULT,
            zero_suppress: true,
            word_count_mode: WordCountMode::Header,
            bulk_limit_words: BULK_WORDS,
            check_bank_id: false,
        }
    }

    /// Set the beam-off block size
    #[must_use]
    pub fn with_block_size(mut self, block_size: BlockSize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Enable or disable zero suppression
    #[must_use]
    pub fn with_zero_suppression(mut self, enabled: bool) -> Self {
        self.zero_suppress = enabled;
        self
    }

    /// Select header or fixed (scalar mode) word counts
    #[must_use]
    pub fn with_word_count_mode(mut self, mode: WordCountMode) -> Self {
        self.word_count_mode = mode;
        self
    }

    /// Bound the bulk buffer. The dispatcher further clamps this to the
    /// bulk window it is given.
    #[must_use]
    pub fn with_bulk_limit(mut self, words: usize) -> Self {
        self.bulk_limit_words = words;
        self
    }

    /// Cross-check each eventId's bank field against the notified bank and
    /// report mismatches. Off by default: some FPGA builds leave the field
    /// unset.
    #[must_use]
    pub fn with_bank_id_check(mut self, enabled: bool) -> Self {
        self.check_bank_id = enabled;
        self
    }

    /// Beam-off block size
    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// Whether zero-valued payload words are dropped
    pub fn zero_suppress(&self) -> bool {
        self.zero_suppress
    }

    /// Word count mode
    pub fn word_count_mode(&self) -> WordCountMode {
        self.word_count_mode
    }

    /// Configured bulk bound in words
    pub fn bulk_limit_words(&self) -> usize {
        self.bulk_limit_words
    }

    /// Whether eventId bank fields are cross-checked
    pub fn check_bank_id(&self) -> bool {
        self.check_bank_id
    }

    pub(crate) fn set_block_size(&mut self, block_size: BlockSize) {
        self.block_size = block_size;
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::new()
    }
}
