//! Command word decoding.
//!
//! One mailbox word carries two kinds of message:
//!
//! | Word                        | Meaning                          |
//! |-----------------------------|----------------------------------|
//! | `0xE906_0000`               | BEGIN_SPILL                      |
//! | `0xE906_0001`               | END_SPILL                        |
//! | `0xE906_0002`               | FLUSH_BLOCK                      |
//! | `0xE906_0003`               | LAST_FLUSH                       |
//! | `0xE906_000F`               | RESET                            |
//! | `0xE906_8000 \| n`          | SET_BLOCK_SIZE(n), n in 1..=0x7FFC |
//! | `0x0000_0000..=0x0000_000F` | bank `n` is ready (from the FPGA)|
//!
//! Everything else is malformed. Decoding happens once, at the dispatch
//! entry point; nothing downstream looks at raw bits.

use core::fmt;

use crate::bank::BankIndex;
use crate::config::BlockSize;

/// High half of every control command.
pub const COMMAND_TAG: u32 = 0xE906;

const TAG_SHIFT: u32 = 16;
const OPCODE_MASK: u32 = 0xFFFF;
const SET_BLOCK_SIZE_FLAG: u32 = 0x8000;
const BLOCK_SIZE_MASK: u32 = 0x7FFF;

const OP_BEGIN_SPILL: u32 = 0x0000;
const OP_END_SPILL: u32 = 0x0001;
const OP_FLUSH_BLOCK: u32 = 0x0002;
const OP_LAST_FLUSH: u32 = 0x0003;
const OP_RESET: u32 = 0x000F;

/// A decoded mailbox word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Restart the board.
    Reset,
    /// Beam is on: start accumulating a spill.
    BeginSpill,
    /// Beam is off: start handing the spill back.
    EndSpill,
    /// Hand one block to the host.
    FlushBlock,
    /// The host will not flush again this spill.
    LastFlush,
    /// Change the beam-off block size.
    SetBlockSize(BlockSize),
    /// The FPGA finished writing this bank.
    BankReady(BankIndex),
}

/// Why a word did not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Tagged word with an opcode that means nothing.
    UnknownOpcode(u32),
    /// SET_BLOCK_SIZE with a size of zero or past the handoff region.
    BadBlockSize(u32),
    /// Untagged word that is not a bank number.
    NotABank(u32),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode(w) => write!(f, "unknown command opcode in {w:#010x}"),
            Self::BadBlockSize(w) => write!(f, "invalid block size in {w:#010x}"),
            Self::NotABank(w) => write!(f, "{w:#010x} is neither a command nor a bank"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

impl Command {
    /// Decode a mailbox word.
    pub fn decode(word: u32) -> Result<Self, CommandError> {
        if word >> TAG_SHIFT != COMMAND_TAG {
            return BankIndex::new(word)
                .map(Self::BankReady)
                .ok_or(CommandError::NotABank(word));
        }
        let op = word & OPCODE_MASK;
        if op & SET_BLOCK_SIZE_FLAG != 0 {
            return BlockSize::new(op & BLOCK_SIZE_MASK)
                .map(Self::SetBlockSize)
                .map_err(|_| CommandError::BadBlockSize(word));
        }
        match op {
            OP_BEGIN_SPILL => Ok(Self::BeginSpill),
            OP_END_SPILL => Ok(Self::EndSpill),
            OP_FLUSH_BLOCK => Ok(Self::FlushBlock),
            OP_LAST_FLUSH => Ok(Self::LastFlush),
            OP_RESET => Ok(Self::Reset),
            _ => Err(CommandError::UnknownOpcode(word)),
        }
    }

    /// Encode as a mailbox word (host and FPGA models use this).
    pub fn encode(self) -> u32 {
        let tagged = |op: u32| (COMMAND_TAG << TAG_SHIFT) | op;
        match self {
            Self::BeginSpill => tagged(OP_BEGIN_SPILL),
            Self::EndSpill => tagged(OP_END_SPILL),
            Self::FlushBlock => tagged(OP_FLUSH_BLOCK),
            Self::LastFlush => tagged(OP_LAST_FLUSH),
            Self::Reset => tagged(OP_RESET),
            Self::SetBlockSize(size) => tagged(SET_BLOCK_SIZE_FLAG | size.words()),
            Self::BankReady(bank) => bank.raw(),
        }
    }

    /// Short protocol name for logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Reset => "RESET",
            Self::BeginSpill => "BEGIN_SPILL",
            Self::EndSpill => "END_SPILL",
            Self::FlushBlock => "FLUSH_BLOCK",
            Self::LastFlush => "LAST_FLUSH",
            Self::SetBlockSize(_) => "SET_BLOCK_SIZE",
            Self::BankReady(_) => "BANK_READY",
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = CommandError;

    fn try_from(word: u32) -> Result<Self, Self::Error> {
        Self::decode(word)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetBlockSize(size) => write!(f, "SET_BLOCK_SIZE({size})"),
            Self::BankReady(bank) => write!(f, "BANK_READY({bank})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_host_readout_list_words() {
        assert_eq!(Command::decode(0xE906_0000), Ok(Command::BeginSpill));
        assert_eq!(Command::decode(0xE906_0001), Ok(Command::EndSpill));
        assert_eq!(Command::decode(0xE906_0002), Ok(Command::FlushBlock));
        assert_eq!(Command::decode(0xE906_0003), Ok(Command::LastFlush));
        assert_eq!(Command::decode(0xE906_000F), Ok(Command::Reset));
        assert_eq!(
            Command::decode(0xE906_8000 + 300),
            Ok(Command::SetBlockSize(BlockSize::new(300).unwrap()))
        );
    }

    #[test]
    fn test_untagged_values_are_banks() {
        for raw in 0..16 {
            assert_eq!(
                Command::decode(raw),
                Ok(Command::BankReady(BankIndex::new(raw).unwrap()))
            );
        }
    }

    #[test]
    fn test_malformed_words() {
        assert_eq!(Command::decode(16), Err(CommandError::NotABank(16)));
        assert_eq!(
            Command::decode(0xDEAD_BEEF),
            Err(CommandError::NotABank(0xDEAD_BEEF))
        );
        assert_eq!(
            Command::decode(0xE906_0004),
            Err(CommandError::UnknownOpcode(0xE906_0004))
        );
        assert_eq!(
            Command::decode(0xE906_8000),
            Err(CommandError::BadBlockSize(0xE906_8000))
        );
        assert_eq!(
            Command::decode(0xE906_FFFF),
            Err(CommandError::BadBlockSize(0xE906_FFFF))
        );
    }

    #[test]
    fn test_encode_inverts_decode() {
        for word in [0xE906_0000, 0xE906_0001, 0xE906_0002, 0xE906_0003, 0xE906_000F, 0xE906_812C, 7] {
            assert_eq!(Command::decode(word).unwrap().encode(), word);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::BeginSpill.to_string(), "BEGIN_SPILL");
        assert_eq!(
            Command::BankReady(BankIndex::new(3).unwrap()).to_string(),
            "BANK_READY(3)"
        );
        assert_eq!(
            CommandError::NotABank(0x20).to_string(),
            "0x00000020 is neither a command nor a bank"
        );
    }
}
