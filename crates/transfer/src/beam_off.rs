//! Beam-off drain: pending bulk words handed to the host in blocks.
//!
//! Each flush copies `min(block_size, pending)` words from the bulk read
//! cursor to the handoff region at DP word 1, then writes the count to DP
//! word 0. The count goes last: the host polls it, and a non-zero count must
//! never be visible over stale data. A count of zero means drained.
//!
//! The copy runs through a small on-chip scratch buffer so the bulk memory
//! and the dual-port bus are never addressed in the same burst.

use heapless::Vec;
use platform::memory_map::{HANDOFF_COUNT_INDEX, HANDOFF_DATA_INDEX};
use platform::WordWindow;

use crate::bulk::BulkAccumulator;
use crate::config::BlockSize;
use crate::error::TransferError;

/// Scratch buffer size in words.
pub const SCRATCH_WORDS: usize = 64;

/// Result of one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushOutcome {
    /// A block was handed over.
    Block {
        /// Words in this block
        words: u32,
        /// Words still pending afterwards
        remaining: u32,
    },
    /// Nothing was pending; a zero count was published.
    Drained,
}

impl FlushOutcome {
    /// Words handed over by this flush
    pub fn words(self) -> u32 {
        match self {
            Self::Block { words, .. } => words,
            Self::Drained => 0,
        }
    }
}

/// Hand the next block to the host.
pub fn flush_block<D, B>(
    dp: &mut D,
    bulk: &mut BulkAccumulator<B>,
    block_size: BlockSize,
) -> Result<FlushOutcome, TransferError>
where
    D: WordWindow,
    B: WordWindow,
{
    let pending = bulk.pending();
    if pending == 0 {
        dp.write(HANDOFF_COUNT_INDEX, 0)?;
        return Ok(FlushOutcome::Drained);
    }

    let n = block_size.words().min(pending);
    let total = n as usize;
    dp.check_range(HANDOFF_DATA_INDEX, total)?;

    let mut scratch: Vec<u32, SCRATCH_WORDS> = Vec::new();
    let mut copied = 0usize;
    while copied < total {
        let chunk = total.saturating_sub(copied).min(SCRATCH_WORDS);
        scratch.clear();
        for i in 0..chunk {
            let word = bulk.peek(copied.saturating_add(i))?;
            scratch
                .push(word)
                .map_err(|_| TransferError::ScratchOverflow)?;
        }
        let base = HANDOFF_DATA_INDEX.saturating_add(copied);
        for (i, word) in scratch.iter().enumerate() {
            dp.write(base.saturating_add(i), *word)?;
        }
        copied = copied.saturating_add(chunk);
    }

    let words = bulk.consume(n);
    dp.write(HANDOFF_COUNT_INDEX, words)?;

    Ok(FlushOutcome::Block {
        words,
        remaining: bulk.pending(),
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use platform::memory_map::DP_WORDS;
    use platform::mocks::VecWindow;

    fn filled_bulk(words: u32) -> BulkAccumulator<VecWindow> {
        let mut bulk = BulkAccumulator::new(VecWindow::new(8192), 8192);
        let mut staging = bulk.stage();
        for w in 0..words {
            staging.push(w + 1).unwrap();
        }
        staging.commit();
        bulk
    }

    #[test]
    fn test_eighteen_hundred_words_in_blocks_of_three_hundred() {
        let mut dp = VecWindow::new(DP_WORDS);
        let mut bulk = filled_bulk(1800);
        let block = BlockSize::new(300).unwrap();

        for k in 1..=6u32 {
            let outcome = flush_block(&mut dp, &mut bulk, block).unwrap();
            assert_eq!(
                outcome,
                FlushOutcome::Block {
                    words: 300,
                    remaining: 1800 - 300 * k,
                }
            );
            assert_eq!(dp.words()[HANDOFF_COUNT_INDEX], 300);
            let first = (k - 1) * 300 + 1;
            assert_eq!(dp.words()[HANDOFF_DATA_INDEX], first);
            assert_eq!(dp.words()[HANDOFF_DATA_INDEX + 299], first + 299);
        }

        assert_eq!(flush_block(&mut dp, &mut bulk, block).unwrap(), FlushOutcome::Drained);
        assert_eq!(dp.words()[HANDOFF_COUNT_INDEX], 0);
    }

    #[test]
    fn test_short_final_block() {
        let mut dp = VecWindow::new(DP_WORDS);
        let mut bulk = filled_bulk(130);
        let block = BlockSize::new(100).unwrap();
        assert_eq!(flush_block(&mut dp, &mut bulk, block).unwrap().words(), 100);
        let last = flush_block(&mut dp, &mut bulk, block).unwrap();
        assert_eq!(last, FlushOutcome::Block { words: 30, remaining: 0 });
        assert_eq!(dp.words()[HANDOFF_COUNT_INDEX], 30);
        assert_eq!(dp.words()[HANDOFF_DATA_INDEX + 29], 130);
    }

    #[test]
    fn test_count_written_after_data() {
        let mut dp = VecWindow::new(DP_WORDS);
        let mut bulk = filled_bulk(5);
        flush_block(&mut dp, &mut bulk, BlockSize::DEFAULT).unwrap();
        // 5 data writes, then the count
        assert_eq!(dp.write_count(), 6);
        assert_eq!(&dp.words()[..6], &[5, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_block_crossing_scratch_boundary() {
        let mut dp = VecWindow::new(DP_WORDS);
        let total = (SCRATCH_WORDS * 3 + 7) as u32;
        let mut bulk = filled_bulk(total);
        let outcome = flush_block(&mut dp, &mut bulk, BlockSize::new(total).unwrap()).unwrap();
        assert_eq!(outcome.words(), total);
        let data = &dp.words()[HANDOFF_DATA_INDEX..HANDOFF_DATA_INDEX + total as usize];
        assert!(data.iter().zip(1..).all(|(w, e)| *w == e));
    }

    #[test]
    fn test_undersized_dual_port_is_an_error() {
        let mut dp = VecWindow::new(16);
        let mut bulk = filled_bulk(32);
        let err = flush_block(&mut dp, &mut bulk, BlockSize::DEFAULT).unwrap_err();
        assert!(matches!(err, TransferError::Window(_)));
        assert_eq!(bulk.pending(), 32, "nothing consumed on failure");
    }
}
