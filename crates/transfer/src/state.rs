//! Run state and the command acceptance table.
//!
//! # Transition table
//!
//! | Command        | Accepted in                  | Next                  |
//! |----------------|------------------------------|-----------------------|
//! | RESET          | any                          | Ready (after restart) |
//! | BEGIN_SPILL    | Ready                        | BeamOn                |
//! | BEGIN_SPILL    | BeamOff, DrainWait           | Ready, via ErrorIncomplete |
//! | END_SPILL      | BeamOn, ErrorOverflow        | BeamOff               |
//! | FLUSH_BLOCK    | BeamOff                      | BeamOff or DrainWait  |
//! | LAST_FLUSH     | BeamOff                      | Ready                 |
//! | SET_BLOCK_SIZE | any                          | unchanged             |
//! | bank ready     | BeamOn                       | BeamOn or ErrorOverflow |
//! | bank ready     | Ready                        | BeamOn (implicit spill start) |
//!
//! Every other pair is an unexpected command: reported, state unchanged.
//! [`RunState::accepts`] is the single source of truth for this table.

use core::fmt;

use crate::command::Command;

/// Board run state. Owned and mutated only by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RunState {
    /// Idle between spills; the bulk accumulator is empty.
    Ready = 0,
    /// Beam on: banks are drained into the bulk buffer.
    BeamOn = 1,
    /// Beam off: blocks are handed to the host on each flush.
    BeamOff = 2,
    /// Beam off and nothing left to hand back.
    DrainWait = 3,
    /// Bulk bound reached; bank notifications are refused until END_SPILL.
    ErrorOverflow = 4,
    /// A spill ended with words still pending. Reported, never rested in.
    ErrorIncomplete = 5,
}

impl RunState {
    /// Every state, in code order
    pub const ALL: [Self; 6] = [
        Self::Ready,
        Self::BeamOn,
        Self::BeamOff,
        Self::DrainWait,
        Self::ErrorOverflow,
        Self::ErrorIncomplete,
    ];

    /// Status word code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`RunState::code`]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ready),
            1 => Some(Self::BeamOn),
            2 => Some(Self::BeamOff),
            3 => Some(Self::DrainWait),
            4 => Some(Self::ErrorOverflow),
            5 => Some(Self::ErrorIncomplete),
            _ => None,
        }
    }

    /// Protocol name for logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::BeamOn => "BEAM_ON",
            Self::BeamOff => "BEAM_OFF",
            Self::DrainWait => "DRAIN_WAIT",
            Self::ErrorOverflow => "ERROR_OVERFLOW",
            Self::ErrorIncomplete => "ERROR_INCOMPLETE",
        }
    }

    /// Whether `command` is valid in this state.
    pub fn accepts(self, command: &Command) -> bool {
        match command {
            Command::Reset | Command::SetBlockSize(_) => true,
            Command::BeginSpill => matches!(self, Self::Ready | Self::BeamOff | Self::DrainWait),
            Command::EndSpill => matches!(self, Self::BeamOn | Self::ErrorOverflow),
            Command::FlushBlock | Command::LastFlush => self == Self::BeamOff,
            Command::BankReady(_) => matches!(self, Self::BeamOn | Self::Ready),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bank::BankIndex;
    use crate::config::BlockSize;

    #[test]
    fn test_codes_round_trip() {
        for s in RunState::ALL {
            assert_eq!(RunState::from_code(s.code()), Some(s));
        }
        assert_eq!(RunState::from_code(6), None);
    }

    #[test]
    fn test_reset_and_block_size_always_accepted() {
        let size = Command::SetBlockSize(BlockSize::new(10).unwrap());
        for s in RunState::ALL {
            assert!(s.accepts(&Command::Reset), "{s}");
            assert!(s.accepts(&size), "{s}");
        }
    }

    #[test]
    fn test_bank_ready_only_in_beam_on_or_ready() {
        let cmd = Command::BankReady(BankIndex::new(0).unwrap());
        let accepted: Vec<RunState> = RunState::ALL
            .into_iter()
            .filter(|s| s.accepts(&cmd))
            .collect();
        assert_eq!(accepted, vec![RunState::Ready, RunState::BeamOn]);
    }

    #[test]
    fn test_flush_only_in_beam_off() {
        for s in RunState::ALL {
            assert_eq!(s.accepts(&Command::FlushBlock), s == RunState::BeamOff);
            assert_eq!(s.accepts(&Command::LastFlush), s == RunState::BeamOff);
        }
    }
}
