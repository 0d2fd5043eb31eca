//! Bulk accumulator: bounded cursors over the SDRAM bulk buffer.
//!
//! ```text
//! 0                read            write           limit      window end
//! ├────────────────┼───────────────┼───────────────┼──────────┤
//!   handed to host    pending          free           unused
//! ```
//!
//! `pending == write - read` at all times. Beam-on appends at `write`
//! through a [`Staging`] transaction so an event that does not fit is
//! dropped whole; beam-off consumes from `read`.

use platform::{WindowError, WordWindow};

/// Staging failed because the next word would reach the bulk bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StageError {
    /// Bulk bound reached; nothing was committed.
    Full,
    /// Window access failed; nothing was committed.
    Window(WindowError),
}

impl From<WindowError> for StageError {
    fn from(e: WindowError) -> Self {
        Self::Window(e)
    }
}

/// Write/read cursors and pending count over a bulk window.
pub struct BulkAccumulator<B> {
    bulk: B,
    write: usize,
    read: usize,
    pending: u32,
    limit: usize,
}

impl<B: WordWindow> BulkAccumulator<B> {
    /// Wrap `bulk`, bounded by `limit_words` or the window length, whichever
    /// is smaller. The bound is also capped so word counts fit in `u32`.
    pub fn new(bulk: B, limit_words: usize) -> Self {
        let limit = limit_words
            .min(bulk.len_words())
            .min(u32::MAX as usize);
        Self {
            bulk,
            write: 0,
            read: 0,
            pending: 0,
            limit,
        }
    }

    /// Empty the accumulator (spill start, init).
    pub fn reset(&mut self) {
        self.write = 0;
        self.read = 0;
        self.pending = 0;
    }

    /// Move the read cursor back to the first accumulated word (spill end).
    pub fn rewind(&mut self) {
        self.read = 0;
        self.pending = Self::as_count(self.write);
    }

    /// Whether the write cursor sits at the bound.
    pub fn is_full(&self) -> bool {
        self.write >= self.limit
    }

    /// Words accumulated but not yet handed to the host
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Write cursor
    pub fn write_cursor(&self) -> usize {
        self.write
    }

    /// Read cursor
    pub fn read_cursor(&self) -> usize {
        self.read
    }

    /// Effective bound in words
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bulk window
    pub fn window(&self) -> &B {
        &self.bulk
    }

    /// Read the pending word `offset` words past the read cursor.
    pub fn peek(&self, offset: usize) -> Result<u32, WindowError> {
        let index = self.read.saturating_add(offset);
        if index >= self.write {
            return Err(WindowError::OutOfBounds {
                index,
                len: self.write,
            });
        }
        self.bulk.read(index)
    }

    /// Mark `words` pending words as handed to the host. Clamped to the
    /// pending count.
    pub fn consume(&mut self, words: u32) -> u32 {
        let words = words.min(self.pending);
        self.read = self.read.saturating_add(words as usize);
        self.pending = self.pending.saturating_sub(words);
        words
    }

    /// Start staging an event at the write cursor.
    pub fn stage(&mut self) -> Staging<'_, B> {
        let cursor = self.write;
        Staging { acc: self, cursor }
    }

    /// Release the window
    pub fn into_inner(self) -> B {
        self.bulk
    }

    // limit is capped at u32::MAX in `new`, so every cursor value fits
    #[allow(clippy::cast_possible_truncation)]
    fn as_count(words: usize) -> u32 {
        words as u32
    }
}

/// An uncommitted event being written past the write cursor.
///
/// Dropping it without [`Staging::commit`] discards the event: the cursor
/// and pending count are untouched.
pub struct Staging<'a, B> {
    acc: &'a mut BulkAccumulator<B>,
    cursor: usize,
}

impl<B: WordWindow> Staging<'_, B> {
    /// Append one word.
    pub fn push(&mut self, word: u32) -> Result<(), StageError> {
        if self.cursor >= self.acc.limit {
            return Err(StageError::Full);
        }
        self.acc.bulk.write(self.cursor, word)?;
        self.cursor = self.cursor.saturating_add(1);
        Ok(())
    }

    /// Publish the staged words: advance the write cursor and add them to
    /// the pending count. Returns the number of words committed.
    pub fn commit(self) -> u32 {
        let staged = self.cursor.saturating_sub(self.acc.write);
        let words = BulkAccumulator::<B>::as_count(staged);
        self.acc.write = self.cursor;
        self.acc.pending = self.acc.pending.saturating_add(words);
        words
    }
}
