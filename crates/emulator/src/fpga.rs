//! FPGA model
//!
//! Writes events into the dual-port banks the way the front-end FPGA does:
//! payload first, then the eventId word, then the header, and only into a
//! bank whose header the controller has cleared. Banks are used round-robin.

use platform::memory_map::{BANK_EVENT_ID_OFFSET, BANK_PAYLOAD_OFFSET, WORDS_PER_BANK};
use platform::mocks::VecWindow;
use platform::WordWindow;
use transfer::{BankHeader, BankIndex};

/// Result of trying to write one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Event written; the controller should be notified for `bank`.
    Written(BankIndex),
    /// The next bank still holds an unserved event; the event is lost at
    /// the FPGA.
    BankBusy(BankIndex),
}

/// Round-robin bank writer.
#[derive(Debug)]
pub struct FpgaModel {
    next_bank: BankIndex,
    written: u32,
    busy: u32,
}

impl Default for FpgaModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FpgaModel {
    /// Model starting at bank 0.
    pub fn new() -> Self {
        Self {
            next_bank: BankIndex::FIRST,
            written: 0,
            busy: 0,
        }
    }

    /// Payload of event `event` in spill `spill`.
    ///
    /// Non-zero words encode spill, event and position so misordered output
    /// is visible in a diff. Zero words are spread evenly at `zero_fraction`.
    pub fn payload(spill: u32, event: u32, words: u32, zero_fraction: f64) -> Vec<u32> {
        let fraction = zero_fraction.clamp(0.0, 1.0);
        (0..words)
            .map(|j| {
                let before = (f64::from(j) * fraction).floor();
                let after = (f64::from(j + 1) * fraction).floor();
                if after > before {
                    0
                } else {
                    ((spill & 0xFF) << 24) | ((event & 0xFFF) << 12) | ((j + 1) & 0xFFF)
                }
            })
            .collect()
    }

    /// eventId word: event number above the bank number.
    pub fn event_id(event: u32, bank: BankIndex) -> u32 {
        (event << 4) | bank.raw()
    }

    /// Write one event into the next bank.
    pub fn write_event(&mut self, dp: &mut VecWindow, payload: &[u32], event: u32) -> Delivery {
        let bank = self.next_bank;
        self.next_bank = bank.next();

        let base = bank.get() * WORDS_PER_BANK;
        let words = dp.words_mut();
        if words.get(base).copied().unwrap_or(0) != 0 {
            self.busy += 1;
            return Delivery::BankBusy(bank);
        }

        let start = base + BANK_PAYLOAD_OFFSET;
        if let Some(dst) = words.get_mut(start..start + payload.len()) {
            dst.copy_from_slice(payload);
        }
        if let Some(id) = words.get_mut(base + BANK_EVENT_ID_OFFSET) {
            *id = Self::event_id(event, bank);
        }
        // Header last: the controller may act as soon as it is non-zero
        let header = BankHeader::for_words(payload.len() as u32).raw();
        if let Some(h) = words.get_mut(base) {
            *h = header;
        }
        self.written += 1;
        Delivery::Written(bank)
    }

    /// Whether `bank` is free for the FPGA.
    pub fn bank_free(dp: &VecWindow, bank: BankIndex) -> bool {
        let base = bank.get() * WORDS_PER_BANK;
        dp.read(base).map(|h| h == 0).unwrap_or(false)
    }

    /// Events written since construction
    pub fn written(&self) -> u32 {
        self.written
    }

    /// Events lost to a busy bank since construction
    pub fn busy(&self) -> u32 {
        self.busy
    }
}
