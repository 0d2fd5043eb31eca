//! Shared-memory geometry for the front-end board
//!
//! # Dual-port memory (DP)
//!
//! 32K × 32-bit words on FMC bank 1 (NOR/PSRAM chip select 1), written by the
//! FPGA on one side and by the MCU on the other. The same words serve two
//! roles depending on the spill phase:
//!
//! ```text
//! word      beam-on role                     beam-off role
//! 0x0000    bank 0 header                    handoff count
//! 0x0001    bank 0 payload ...               handoff data ...
//! 0x03FD    bank 0 eventId                     |
//! 0x0400    bank 1 header                      |
//!   ...     (16 banks × 0x400 words)           |
//! 0x4000    unused during beam-on              |
//!   ...                                        v
//! 0x7FFC                                     last handoff data word
//! 0x7FFD    status word                      status word
//! 0x7FFE    command mailbox                  command mailbox
//! 0x7FFF    reserved
//! ```
//!
//! Reading the command mailbox is what acknowledges the FPGA interrupt.
//!
//! # Bulk buffer
//!
//! External SDRAM at `0xC000_0000` (32 MB), MCU-only. Holds the concatenated
//! events of one spill between beam-on and beam-off.

/// Base address of the dual-port memory window (FMC bank 1).
pub const DP_BASE_ADDRESS: usize = 0x6000_0000;

/// Dual-port memory size in 32-bit words.
pub const DP_WORDS: usize = 0x8000;

/// Dual-port memory size in bytes.
pub const DP_SIZE_BYTES: u32 = 0x2_0000; // 128 KB

/// Number of FPGA event banks.
pub const BANK_COUNT: usize = 16;

/// Words per bank (header, payload, eventId and two spare words).
pub const WORDS_PER_BANK: usize = 0x400;

/// Offset of the header word inside a bank.
pub const BANK_HEADER_OFFSET: usize = 0;

/// Offset of the first payload word inside a bank.
pub const BANK_PAYLOAD_OFFSET: usize = 1;

/// Offset of the eventId word inside a bank (third word from the end).
pub const BANK_EVENT_ID_OFFSET: usize = 0x3FD;

/// Physical payload capacity of a bank: everything between the header and
/// the eventId word.
pub const BANK_PAYLOAD_CAPACITY: usize = 0x3FC;

/// Header bits holding the declared payload word count.
pub const HEADER_WORD_COUNT_MASK: u32 = 0x7FF0_0000;

/// Shift applied after masking with [`HEADER_WORD_COUNT_MASK`].
pub const HEADER_WORD_COUNT_SHIFT: u32 = 20;

/// Header bit the FPGA sets while a bank holds an event. The host also polls
/// it as the board busy flag.
pub const HEADER_READY_FLAG: u32 = 0x8000_0000;

/// Bits of the eventId word carrying the source bank id.
pub const EVENT_ID_BANK_MASK: u32 = 0x0000_000F;

/// DP word holding the beam-off handoff word count.
pub const HANDOFF_COUNT_INDEX: usize = 0;

/// First DP word of beam-off handoff data.
pub const HANDOFF_DATA_INDEX: usize = 1;

/// DP word the board writes its status word to after every dispatch.
pub const STATUS_WORD_INDEX: usize = 0x7FFD;

/// DP word the FPGA deposits command words into. Reading it acknowledges
/// the interrupt.
pub const COMMAND_WORD_INDEX: usize = 0x7FFE;

/// Largest block the handoff region can hold without reaching the status
/// word.
pub const MAX_BLOCK_WORDS: usize = 0x7FFC;

/// Base address of the bulk buffer (FMC SDRAM bank 1).
pub const BULK_BASE_ADDRESS: usize = 0xC000_0000;

/// Bulk buffer size in bytes.
pub const BULK_SIZE_BYTES: u32 = 32 * 1024 * 1024;

/// Bulk buffer size in 32-bit words.
pub const BULK_WORDS: usize = 0x80_0000;

// Layout consistency, checked at compile time.
const _: () = {
    assert!(BANK_COUNT * WORDS_PER_BANK <= DP_WORDS);
    assert!(BANK_EVENT_ID_OFFSET == WORDS_PER_BANK - 3);
    assert!(BANK_PAYLOAD_CAPACITY == BANK_EVENT_ID_OFFSET - BANK_PAYLOAD_OFFSET);
    assert!(HANDOFF_DATA_INDEX + MAX_BLOCK_WORDS == STATUS_WORD_INDEX);
    assert!(COMMAND_WORD_INDEX < DP_WORDS);
    assert!(DP_SIZE_BYTES as usize == DP_WORDS * 4);
    assert!(BULK_SIZE_BYTES as usize == BULK_WORDS * 4);
};

/// DP word index of `bank`'s header.
///
/// Returns `None` for `bank >= BANK_COUNT`.
#[must_use]
pub const fn bank_base(bank: usize) -> Option<usize> {
    if bank < BANK_COUNT {
        // bank < 16, so bank * 0x400 < 0x4000
        #[allow(clippy::arithmetic_side_effects)]
        Some(bank * WORDS_PER_BANK)
    } else {
        None
    }
}
