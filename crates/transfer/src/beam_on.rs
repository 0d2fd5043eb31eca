//! Beam-on transfer: one finished bank into the bulk buffer.
//!
//! # Algorithm
//!
//! 1. Header zero: refuse, there is no event to store or drop.
//! 2. Write cursor at the bound: drop the event, nothing written.
//! 3. Stage the payload (zero-suppressed if configured), then the eventId.
//!    If the bound is hit part way, the staging is discarded: no partial
//!    event ever becomes visible.
//! 4. Commit, then clear the header.
//!
//! The header is cleared only on success. A refused bank stays owned by the
//! core until the next spill start clears it.

use platform::WordWindow;

use crate::bank::{event_id_matches, BankIndex, BankStore, BoundedCount};
use crate::bulk::{BulkAccumulator, StageError};
use crate::config::TransferConfig;
use crate::error::TransferError;

/// An event that made it into the bulk buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoredEvent {
    /// Source bank
    pub bank: BankIndex,
    /// eventId word as read
    pub event_id: u32,
    /// Words committed (surviving payload + eventId)
    pub words: u32,
    /// Zero words removed
    pub suppressed: u32,
    /// Count the header declared
    pub declared: u32,
    /// The declared count exceeded the bank and the read was bounded
    pub count_overflow: bool,
    /// The eventId names another bank (only set with the bank id check on)
    pub bank_id_mismatch: bool,
}

/// Result of one beam-on transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeamOnOutcome {
    /// Event committed and bank released.
    Stored(StoredEvent),
    /// Bulk bound reached; event dropped, nothing committed.
    Overflow {
        /// Bank whose event was dropped
        bank: BankIndex,
    },
    /// Notified bank had a zero header.
    EmptyBank {
        /// Bank that was notified
        bank: BankIndex,
    },
}

/// Drain `bank` into `bulk`.
pub fn transfer<D, B>(
    banks: &mut BankStore<D>,
    bulk: &mut BulkAccumulator<B>,
    bank: BankIndex,
    config: &TransferConfig,
) -> Result<BeamOnOutcome, TransferError>
where
    D: WordWindow,
    B: WordWindow,
{
    let header = banks.read_header(bank)?;
    if header.is_empty() {
        return Ok(BeamOnOutcome::EmptyBank { bank });
    }
    if bulk.is_full() {
        return Ok(BeamOnOutcome::Overflow { bank });
    }
    let count = BoundedCount::new(header.word_count(config.word_count_mode()));

    let mut staging = bulk.stage();
    let mut payload = banks.drain_payload(bank, count.words, config.zero_suppress());
    for word in payload.by_ref() {
        match staging.push(word?) {
            Ok(()) => {}
            Err(StageError::Full) => return Ok(BeamOnOutcome::Overflow { bank }),
            Err(StageError::Window(e)) => return Err(e.into()),
        }
    }
    let suppressed = payload.suppressed();

    let event_id = banks.event_id(bank)?;
    match staging.push(event_id) {
        Ok(()) => {}
        Err(StageError::Full) => return Ok(BeamOnOutcome::Overflow { bank }),
        Err(StageError::Window(e)) => return Err(e.into()),
    }

    let words = staging.commit();
    banks.clear_header(bank)?;

    Ok(BeamOnOutcome::Stored(StoredEvent {
        bank,
        event_id,
        words,
        suppressed,
        declared: count.declared,
        count_overflow: count.overflowed(),
        bank_id_mismatch: config.check_bank_id() && !event_id_matches(event_id, bank),
    }))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::panic // let-else on the expected outcome
)]
mod tests {
    use super::*;
    use crate::bank::BankHeader;
    use crate::config::WordCountMode;
    use platform::memory_map::{BANK_EVENT_ID_OFFSET, DP_WORDS, WORDS_PER_BANK};
    use platform::mocks::VecWindow;

    fn load(dp: &mut VecWindow, bank: usize, header: u32, payload: &[u32], event_id: u32) {
        let base = bank * WORDS_PER_BANK;
        let words = dp.words_mut();
        words[base] = header;
        words[base + 1..base + 1 + payload.len()].copy_from_slice(payload);
        words[base + BANK_EVENT_ID_OFFSET] = event_id;
    }

    fn setup(limit: usize) -> (BankStore<VecWindow>, BulkAccumulator<VecWindow>) {
        (
            BankStore::new(VecWindow::new(DP_WORDS)).unwrap(),
            BulkAccumulator::new(VecWindow::new(4096), limit),
        )
    }

    #[test]
    fn test_scenario_bank_three_zero_suppressed() {
        let (mut banks, mut bulk) = setup(4096);
        load(banks.window_mut(), 3, BankHeader::for_words(5).raw(), &[0, 7, 0, 9, 3], 0xAB);
        let bank = BankIndex::new(3).unwrap();

        let outcome = transfer(&mut banks, &mut bulk, bank, &TransferConfig::new()).unwrap();

        let BeamOnOutcome::Stored(ev) = outcome else {
            panic!("expected stored event, got {outcome:?}");
        };
        assert_eq!(ev.words, 4);
        assert_eq!(ev.suppressed, 2);
        assert_eq!(&bulk.window().words()[..4], &[7, 9, 3, 0xAB]);
        assert_eq!(bulk.pending(), 4);
        assert!(banks.read_header(bank).unwrap().is_empty());
        assert!(!ev.bank_id_mismatch, "bank id check is off by default");
    }

    #[test]
    fn test_bank_id_check_flags_foreign_event_id() {
        let (mut banks, mut bulk) = setup(4096);
        // 0xAB & 0xF = 0xB, not bank 3
        load(banks.window_mut(), 3, BankHeader::for_words(1).raw(), &[1], 0xAB);
        let config = TransferConfig::new().with_bank_id_check(true);
        let outcome = transfer(&mut banks, &mut bulk, BankIndex::new(3).unwrap(), &config).unwrap();
        let BeamOnOutcome::Stored(ev) = outcome else {
            panic!("expected stored event");
        };
        assert!(ev.bank_id_mismatch);
        assert_eq!(bulk.pending(), 2, "mismatch is diagnostic only");
    }

    #[test]
    fn test_suppression_off_keeps_zeros() {
        let (mut banks, mut bulk) = setup(4096);
        load(banks.window_mut(), 1, BankHeader::for_words(3).raw(), &[0, 5, 0], 0x11);
        let config = TransferConfig::new().with_zero_suppression(false);
        transfer(&mut banks, &mut bulk, BankIndex::new(1).unwrap(), &config).unwrap();
        assert_eq!(&bulk.window().words()[..4], &[0, 5, 0, 0x11]);
        assert_eq!(bulk.pending(), 4);
    }

    #[test]
    fn test_scalar_mode_ignores_header_count() {
        let (mut banks, mut bulk) = setup(4096);
        // header only flags readiness; count bits say 1
        load(banks.window_mut(), 0, 0x8010_0000, &[1, 2, 3], 0x20);
        let config = TransferConfig::new().with_word_count_mode(WordCountMode::Fixed(3));
        transfer(&mut banks, &mut bulk, BankIndex::new(0).unwrap(), &config).unwrap();
        assert_eq!(&bulk.window().words()[..4], &[1, 2, 3, 0x20]);
    }

    #[test]
    fn test_full_bulk_refuses_without_touching_bank() {
        let (mut banks, mut bulk) = setup(0);
        load(banks.window_mut(), 2, BankHeader::for_words(1).raw(), &[9], 0x2);
        let bank = BankIndex::new(2).unwrap();
        let outcome = transfer(&mut banks, &mut bulk, bank, &TransferConfig::new()).unwrap();
        assert_eq!(outcome, BeamOnOutcome::Overflow { bank });
        assert!(!banks.read_header(bank).unwrap().is_empty());
        assert_eq!(bulk.pending(), 0);
    }

    #[test]
    fn test_event_that_does_not_fit_is_dropped_whole() {
        let (mut banks, mut bulk) = setup(4);
        load(banks.window_mut(), 4, BankHeader::for_words(4).raw(), &[1, 2, 3, 4], 0x4);
        let bank = BankIndex::new(4).unwrap();
        let outcome = transfer(&mut banks, &mut bulk, bank, &TransferConfig::new()).unwrap();
        assert_eq!(outcome, BeamOnOutcome::Overflow { bank });
        assert_eq!(bulk.write_cursor(), 0);
        assert_eq!(bulk.pending(), 0);
    }

    #[test]
    fn test_empty_header_is_refused() {
        let (mut banks, mut bulk) = setup(4096);
        let bank = BankIndex::new(7).unwrap();
        let outcome = transfer(&mut banks, &mut bulk, bank, &TransferConfig::new()).unwrap();
        assert_eq!(outcome, BeamOnOutcome::EmptyBank { bank });
        assert_eq!(bulk.pending(), 0);
    }

    #[test]
    fn test_empty_header_on_full_bulk_is_not_an_event() {
        let (mut banks, mut bulk) = setup(0);
        let bank = BankIndex::new(2).unwrap();
        let outcome = transfer(&mut banks, &mut bulk, bank, &TransferConfig::new()).unwrap();
        assert_eq!(outcome, BeamOnOutcome::EmptyBank { bank });
    }

    #[test]
    fn test_oversized_count_is_bounded_and_flagged() {
        let (mut banks, mut bulk) = setup(4096);
        let payload = vec![3u32; 0x3FC];
        load(banks.window_mut(), 5, BankHeader::for_words(0x7FF).raw(), &payload, 0x5);
        let outcome =
            transfer(&mut banks, &mut bulk, BankIndex::new(5).unwrap(), &TransferConfig::new())
                .unwrap();
        let BeamOnOutcome::Stored(ev) = outcome else {
            panic!("expected stored event");
        };
        assert!(ev.count_overflow);
        assert_eq!(ev.declared, 0x7FF);
        assert_eq!(ev.words, 0x3FC + 1);
        assert_eq!(bulk.window().words()[0x3FC], 0x5, "eventId follows bounded payload");
    }
}
