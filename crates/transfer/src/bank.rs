//! Bank store: the 16 FPGA event banks inside dual-port memory.
//!
//! # Hand-off protocol
//!
//! ```text
//!   FPGA                          core
//!   ----                          ----
//!   write payload, eventId
//!   write header (non-zero)  ──▶  notification: bank index in mailbox
//!                                 read header
//!                                 read payload (bounded)
//!                                 read eventId
//!                            ◀──  clear header (write 0)
//!   bank free for reuse
//! ```
//!
//! The core never clears a header before both the payload and the eventId
//! have been read, and never reads outside the bank whatever count the
//! header declares.

use core::fmt;

use platform::memory_map::{
    bank_base, BANK_COUNT, BANK_EVENT_ID_OFFSET, BANK_HEADER_OFFSET, BANK_PAYLOAD_CAPACITY,
    BANK_PAYLOAD_OFFSET, EVENT_ID_BANK_MASK, HEADER_READY_FLAG, HEADER_WORD_COUNT_MASK,
    HEADER_WORD_COUNT_SHIFT,
};
use platform::{WindowError, WordWindow};

use crate::config::WordCountMode;

/// Index of one of the [`BANK_COUNT`] banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BankIndex(u8);

impl BankIndex {
    /// Bank 0
    pub const FIRST: Self = Self(0);

    /// Validate a raw bank number.
    // raw < BANK_COUNT (16), fits u8
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(raw: u32) -> Option<Self> {
        if (raw as usize) < BANK_COUNT {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    /// Bank number as an index
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Bank number as a command word value
    pub const fn raw(self) -> u32 {
        self.0 as u32
    }

    /// The following bank, wrapping after the last.
    // self.0 < BANK_COUNT (16), so +1 cannot overflow u8
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    pub const fn next(self) -> Self {
        Self((self.0 + 1) % BANK_COUNT as u8)
    }

    /// All banks in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..BANK_COUNT as u32).filter_map(Self::new)
    }

    fn base(self) -> usize {
        // BankIndex is always < BANK_COUNT, so bank_base never returns None
        bank_base(self.get()).unwrap_or(0)
    }

    fn word(self, offset: usize) -> usize {
        // base <= 0x3C00 and offset < 0x400
        self.base().saturating_add(offset)
    }
}

impl fmt::Display for BankIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bank header word. Zero means the bank is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BankHeader(u32);

impl BankHeader {
    /// Wrap a raw header word
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Header for an event of `words` payload words, as the FPGA writes it:
    /// ready flag plus count. Never empty, even for a zero-length payload.
    pub const fn for_words(words: u32) -> Self {
        Self(HEADER_READY_FLAG | ((words << HEADER_WORD_COUNT_SHIFT) & HEADER_WORD_COUNT_MASK))
    }

    /// Raw header word
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether the bank holds no event
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Count declared in the header bit field.
    pub const fn declared_words(self) -> u32 {
        (self.0 & HEADER_WORD_COUNT_MASK) >> HEADER_WORD_COUNT_SHIFT
    }

    /// Payload length under `mode`.
    pub fn word_count(self, mode: WordCountMode) -> u32 {
        match mode {
            WordCountMode::Header => self.declared_words(),
            WordCountMode::Fixed(n) => u32::from(n),
        }
    }
}

/// A payload word count clamped to the physical bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoundedCount {
    /// Words that will actually be read
    pub words: u32,
    /// Count the header (or scalar mode) asked for
    pub declared: u32,
}

impl BoundedCount {
    /// Clamp `declared` to [`BANK_PAYLOAD_CAPACITY`].
    // BANK_PAYLOAD_CAPACITY = 0x3FC fits u32
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(declared: u32) -> Self {
        Self {
            words: declared.min(BANK_PAYLOAD_CAPACITY as u32),
            declared,
        }
    }

    /// The declared count did not fit the bank.
    pub fn overflowed(self) -> bool {
        self.declared > self.words
    }
}

/// Typed access to the banks of a dual-port window.
///
/// Owns the window; the rest of dual-port memory (mailbox, status word,
/// beam-off handoff region) is reached through [`BankStore::window`] and
/// [`BankStore::window_mut`].
pub struct BankStore<D> {
    dp: D,
}

impl<D: WordWindow> BankStore<D> {
    /// Wrap a dual-port window. It must cover every bank.
    pub fn new(dp: D) -> Result<Self, WindowError> {
        dp.check_range(0, BANK_COUNT.saturating_mul(platform::memory_map::WORDS_PER_BANK))?;
        Ok(Self { dp })
    }

    /// Non-destructive header read.
    pub fn read_header(&self, bank: BankIndex) -> Result<BankHeader, WindowError> {
        self.dp
            .read(bank.word(BANK_HEADER_OFFSET))
            .map(BankHeader::from_raw)
    }

    /// Read the eventId word.
    pub fn event_id(&self, bank: BankIndex) -> Result<u32, WindowError> {
        self.dp.read(bank.word(BANK_EVENT_ID_OFFSET))
    }

    /// Hand the bank back to the FPGA.
    pub fn clear_header(&mut self, bank: BankIndex) -> Result<(), WindowError> {
        self.dp.write(bank.word(BANK_HEADER_OFFSET), 0)
    }

    /// Clear every bank header.
    pub fn clear_all(&mut self) -> Result<(), WindowError> {
        for bank in BankIndex::all() {
            self.clear_header(bank)?;
        }
        Ok(())
    }

    /// Iterate over at most `max_words` payload words of `bank`, never past
    /// the physical payload capacity. With `zero_suppress` only non-zero
    /// words are yielded, in their original order.
    pub fn drain_payload(&self, bank: BankIndex, max_words: u32, zero_suppress: bool) -> Payload<'_, D> {
        let words = BoundedCount::new(max_words).words;
        let start = bank.word(BANK_PAYLOAD_OFFSET);
        Payload {
            dp: &self.dp,
            next: start,
            // words <= BANK_PAYLOAD_CAPACITY, start + capacity stays in the bank
            end: start.saturating_add(words as usize),
            zero_suppress,
            suppressed: 0,
        }
    }

    /// Dual-port window
    pub fn window(&self) -> &D {
        &self.dp
    }

    /// Mutable dual-port window
    pub fn window_mut(&mut self) -> &mut D {
        &mut self.dp
    }

    /// Release the window
    pub fn into_inner(self) -> D {
        self.dp
    }
}

/// Whether an eventId names `bank` as its source.
pub fn event_id_matches(event_id: u32, bank: BankIndex) -> bool {
    event_id & EVENT_ID_BANK_MASK == bank.raw()
}

/// Payload iterator returned by [`BankStore::drain_payload`].
pub struct Payload<'a, D> {
    dp: &'a D,
    next: usize,
    end: usize,
    zero_suppress: bool,
    suppressed: u32,
}

impl<D> Payload<'_, D> {
    /// Zero words skipped so far
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }
}

impl<D: WordWindow> Iterator for Payload<'_, D> {
    type Item = Result<u32, WindowError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.end {
            let index = self.next;
            self.next = self.next.saturating_add(1);
            match self.dp.read(index) {
                Ok(0) if self.zero_suppress => {
                    self.suppressed = self.suppressed.saturating_add(1);
                }
                other => return Some(other),
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use platform::memory_map::{DP_WORDS, WORDS_PER_BANK};
    use platform::mocks::VecWindow;

    fn store_with_event(bank: u32, header: u32, payload: &[u32], event_id: u32) -> BankStore<VecWindow> {
        let mut dp = VecWindow::new(DP_WORDS);
        let base = bank as usize * WORDS_PER_BANK;
        let words = dp.words_mut();
        words[base] = header;
        for (i, w) in payload.iter().enumerate() {
            words[base + 1 + i] = *w;
        }
        words[base + BANK_EVENT_ID_OFFSET] = event_id;
        BankStore::new(dp).unwrap()
    }

    #[test]
    fn test_bank_index_range() {
        assert!(BankIndex::new(0).is_some());
        assert!(BankIndex::new(15).is_some());
        assert!(BankIndex::new(16).is_none());
        assert_eq!(BankIndex::all().count(), 16);
    }

    #[test]
    fn test_bank_index_next_wraps() {
        assert_eq!(BankIndex::FIRST.next().raw(), 1);
        assert_eq!(BankIndex::new(15).unwrap().next(), BankIndex::FIRST);
    }

    #[test]
    fn test_header_word_count_bit_field() {
        let h = BankHeader::from_raw(0x8050_0000);
        assert_eq!(h.declared_words(), 5);
        assert_eq!(h.word_count(WordCountMode::Header), 5);
        assert_eq!(h.word_count(WordCountMode::Fixed(12)), 12);
        assert_eq!(BankHeader::for_words(5).declared_words(), 5);
        assert!(!BankHeader::for_words(0).is_empty());
        assert!(BankHeader::from_raw(0).is_empty());
    }

    #[test]
    fn test_drain_payload_with_suppression() {
        let bank = BankIndex::new(3).unwrap();
        let store = store_with_event(3, BankHeader::for_words(5).raw(), &[0, 7, 0, 9, 3], 0xAB);
        let mut payload = store.drain_payload(bank, 5, true);
        let words: Vec<u32> = payload.by_ref().map(Result::unwrap).collect();
        assert_eq!(words, vec![7, 9, 3]);
        assert_eq!(payload.suppressed(), 2);
        assert_eq!(store.event_id(bank).unwrap(), 0xAB);
    }

    #[test]
    fn test_drain_payload_without_suppression_keeps_zeros() {
        let bank = BankIndex::new(3).unwrap();
        let store = store_with_event(3, BankHeader::for_words(5).raw(), &[0, 7, 0, 9, 3], 0xAB);
        let words: Vec<u32> = store
            .drain_payload(bank, 5, false)
            .map(Result::unwrap)
            .collect();
        assert_eq!(words, vec![0, 7, 0, 9, 3]);
    }

    #[test]
    fn test_drain_payload_never_crosses_into_event_id() {
        let bank = BankIndex::new(0).unwrap();
        let payload = vec![1u32; BANK_PAYLOAD_CAPACITY];
        let store = store_with_event(0, BankHeader::for_words(0x7FF).raw(), &payload, 0xEE);
        let words: Vec<u32> = store
            .drain_payload(bank, 0x7FF, false)
            .map(Result::unwrap)
            .collect();
        assert_eq!(words.len(), BANK_PAYLOAD_CAPACITY);
        assert!(words.iter().all(|w| *w == 1), "eventId must not leak into payload");
    }

    #[test]
    fn test_bounded_count_flags_overflow() {
        assert!(!BoundedCount::new(0x3FC).overflowed());
        let c = BoundedCount::new(0x3FD);
        assert!(c.overflowed());
        assert_eq!(c.words, 0x3FC);
    }

    #[test]
    fn test_clear_header_touches_only_header() {
        let bank = BankIndex::new(2).unwrap();
        let mut store = store_with_event(2, 0x8010_0000, &[42], 0x12);
        store.clear_header(bank).unwrap();
        assert!(store.read_header(bank).unwrap().is_empty());
        assert_eq!(store.window().words()[2 * WORDS_PER_BANK + 1], 42);
        assert_eq!(store.event_id(bank).unwrap(), 0x12);
    }

    #[test]
    fn test_clear_all_empties_every_bank() {
        let mut dp = VecWindow::new(DP_WORDS);
        for b in 0..16 {
            dp.words_mut()[b * WORDS_PER_BANK] = 0x8000_0000;
        }
        let mut store = BankStore::new(dp).unwrap();
        store.clear_all().unwrap();
        for bank in BankIndex::all() {
            assert!(store.read_header(bank).unwrap().is_empty());
        }
    }

    #[test]
    fn test_store_rejects_short_window() {
        assert!(BankStore::new(VecWindow::new(WORDS_PER_BANK)).is_err());
    }

    #[test]
    fn test_event_id_bank_match() {
        let bank = BankIndex::new(5).unwrap();
        assert!(event_id_matches(0x1234_5675, bank));
        assert!(!event_id_matches(0x1234_5676, bank));
    }
}
