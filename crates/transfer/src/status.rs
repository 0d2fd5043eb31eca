//! Status word and protocol error codes.
//!
//! Written to DP word `0x7FFD` after every dispatch:
//!
//! ```text
//!  31            16 15      8 7       0
//! ┌────────────────┬─────────┬─────────┐
//! │     0xE906     │  error  │  state  │
//! └────────────────┴─────────┴─────────┘
//! ```
//!
//! `error` is the latched [`ErrorCode`]: the most recent error since it was
//! last cleared (init, a clean BEGIN_SPILL, END_SPILL).

use core::fmt;

use crate::command::COMMAND_TAG;
use crate::state::RunState;

/// Protocol error reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ErrorCode {
    /// No error latched.
    None = 0,
    /// Bulk bound reached during beam-on; the event was dropped.
    Overflow = 1,
    /// A spill ended with words still pending.
    IncompleteDrain = 2,
    /// Valid command in a state that does not accept it.
    UnexpectedCommand = 3,
    /// Word that decodes to nothing.
    MalformedCommand = 4,
    /// Header declared more words than a bank holds; the read was bounded.
    WordCountOverflow = 5,
    /// eventId names a different bank than the one notified.
    BankIdMismatch = 6,
    /// Notification for a bank whose header is zero.
    EmptyBank = 7,
}

impl ErrorCode {
    /// Status word code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`ErrorCode::code`]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Overflow),
            2 => Some(Self::IncompleteDrain),
            3 => Some(Self::UnexpectedCommand),
            4 => Some(Self::MalformedCommand),
            5 => Some(Self::WordCountOverflow),
            6 => Some(Self::BankIdMismatch),
            7 => Some(Self::EmptyBank),
            _ => None,
        }
    }

    /// Short name for logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Overflow => "overflow",
            Self::IncompleteDrain => "incomplete drain",
            Self::UnexpectedCommand => "unexpected command",
            Self::MalformedCommand => "malformed command",
            Self::WordCountOverflow => "word count overflow",
            Self::BankIdMismatch => "bank id mismatch",
            Self::EmptyBank => "empty bank",
        }
    }

    /// Fatal to the running spill
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Overflow)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusWord {
    /// Run state after the dispatch
    pub state: RunState,
    /// Latched error
    pub error: ErrorCode,
}

impl StatusWord {
    /// Pack into the DP word layout.
    pub fn to_word(self) -> u32 {
        (COMMAND_TAG << 16) | (u32::from(self.error.code()) << 8) | u32::from(self.state.code())
    }

    /// Unpack a DP word; `None` if the tag or a code is invalid.
    pub fn from_word(word: u32) -> Option<Self> {
        if word >> 16 != COMMAND_TAG {
            return None;
        }
        let [state, error, _, _] = word.to_le_bytes();
        Some(Self {
            state: RunState::from_code(state)?,
            error: ErrorCode::from_code(error)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_word_layout() {
        let s = StatusWord {
            state: RunState::ErrorOverflow,
            error: ErrorCode::Overflow,
        };
        assert_eq!(s.to_word(), 0xE906_0104);
        assert_eq!(StatusWord::from_word(0xE906_0104), Some(s));
    }

    #[test]
    fn test_status_word_rejects_garbage() {
        assert_eq!(StatusWord::from_word(0), None);
        assert_eq!(StatusWord::from_word(0xE906_0009), None);
        assert_eq!(StatusWord::from_word(0xE906_0900), None);
    }

    #[test]
    fn test_only_overflow_is_fatal() {
        assert!(ErrorCode::Overflow.is_fatal());
        assert!(!ErrorCode::IncompleteDrain.is_fatal());
        assert!(!ErrorCode::MalformedCommand.is_fatal());
    }
}
