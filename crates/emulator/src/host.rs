//! Host readout model
//!
//! After the beam the host reads the handoff region once per FLUSH_BLOCK:
//! the count word, then that many data words. A zero count means the
//! controller is drained. A non-zero block shorter than the block size is
//! the last one, and the host answers it with LAST_FLUSH.

use platform::memory_map::{HANDOFF_COUNT_INDEX, HANDOFF_DATA_INDEX};
use platform::mocks::VecWindow;

/// What the host read from one handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRead {
    /// A full block; more may follow
    Full(u32),
    /// A short block; the spill is complete
    Short(u32),
    /// Zero count; nothing left
    Empty,
}

/// Collects the blocks of one spill.
#[derive(Debug, Clone)]
pub struct HostModel {
    block_size: u32,
    received: Vec<u32>,
    blocks: u32,
}

impl HostModel {
    /// Host expecting blocks of `block_size` words.
    pub fn new(block_size: u32) -> Self {
        Self {
            block_size,
            received: Vec::new(),
            blocks: 0,
        }
    }

    /// Block size the host programmed
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Read the handoff region after a FLUSH_BLOCK.
    ///
    /// A count larger than the block size is clamped to it, as the host's
    /// read buffer is sized for one block.
    pub fn read_block(&mut self, dp: &VecWindow) -> BlockRead {
        let words = dp.words();
        let count = words.get(HANDOFF_COUNT_INDEX).copied().unwrap_or(0);
        if count == 0 {
            return BlockRead::Empty;
        }
        let n = count.min(self.block_size);
        let end = HANDOFF_DATA_INDEX + n as usize;
        if let Some(data) = words.get(HANDOFF_DATA_INDEX..end) {
            self.received.extend_from_slice(data);
        }
        self.blocks += 1;
        if count < self.block_size {
            BlockRead::Short(n)
        } else {
            BlockRead::Full(n)
        }
    }

    /// Blocks read so far
    pub fn blocks(&self) -> u32 {
        self.blocks
    }

    /// Words received so far, in order
    pub fn received(&self) -> &[u32] {
        &self.received
    }

    /// Hand over the received words and start a new spill.
    pub fn take_spill(&mut self) -> Vec<u32> {
        self.blocks = 0;
        std::mem::take(&mut self.received)
    }
}
