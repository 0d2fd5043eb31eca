//! Mock implementations for testing
//!
//! Host-side stand-ins for the dual-port memory, the bulk buffer and the
//! FPGA interrupt line. Used by unit tests, integration tests and the
//! emulator crate.

use core::cell::Cell;
use std::vec::Vec;

use crate::interrupt::InterruptLine;
use crate::window::{WindowError, WordWindow};

/// Heap-backed word window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecWindow {
    words: Vec<u32>,
    reads: Cell<usize>,
    writes: usize,
}

impl VecWindow {
    /// Zero-filled window of `len` words.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len],
            reads: Cell::new(0),
            writes: 0,
        }
    }

    /// Window initialised from `words`.
    pub fn from_words(words: &[u32]) -> Self {
        Self {
            words: words.to_vec(),
            reads: Cell::new(0),
            writes: 0,
        }
    }

    /// Backing words
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Mutable backing words, bypassing the access counters. Models the far
    /// side of a dual-port memory.
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Number of successful reads so far
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl WordWindow for VecWindow {
    fn len_words(&self) -> usize {
        self.words.len()
    }

    fn read(&self, index: usize) -> Result<u32, WindowError> {
        let value = self
            .words
            .get(index)
            .copied()
            .ok_or(WindowError::OutOfBounds {
                index,
                len: self.words.len(),
            })?;
        self.reads.set(self.reads.get().saturating_add(1));
        Ok(value)
    }

    fn write(&mut self, index: usize, value: u32) -> Result<(), WindowError> {
        let len = self.words.len();
        let slot = self
            .words
            .get_mut(index)
            .ok_or(WindowError::OutOfBounds { index, len })?;
        *slot = value;
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }
}

/// Interrupt line driven by the test.
///
/// [`raise`](Self::raise) latches one qualifying edge; the next
/// [`InterruptLine::take_edge`] consumes it. Without a raise, a wake-up is
/// spurious.
#[derive(Debug, Default, Clone)]
pub struct MockInterruptLine {
    pending: bool,
    taken: usize,
    spurious: usize,
}

impl MockInterruptLine {
    /// Idle line
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a qualifying edge
    pub fn raise(&mut self) {
        self.pending = true;
    }

    /// Qualifying edges consumed
    pub fn taken(&self) -> usize {
        self.taken
    }

    /// Wake-ups that found no edge
    pub fn spurious(&self) -> usize {
        self.spurious
    }
}

impl InterruptLine for MockInterruptLine {
    fn take_edge(&mut self) -> bool {
        if core::mem::take(&mut self.pending) {
            self.taken = self.taken.saturating_add(1);
            true
        } else {
            self.spurious = self.spurious.saturating_add(1);
            false
        }
    }
}
