//! Per-spill counters and recent error history.
//!
//! Counters saturate rather than wrap. They reset at every spill start; the
//! error history survives spills so the firmware heartbeat can show what
//! went wrong last.

use heapless::Deque;

use crate::status::ErrorCode;

/// Depth of [`ErrorHistory`].
pub const ERROR_HISTORY_DEPTH: usize = 8;

/// Counters for the running spill.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpillStats {
    /// Events copied into the bulk buffer
    pub events_stored: u32,
    /// Events dropped on overflow
    pub events_dropped: u32,
    /// Words committed to the bulk buffer (payload + eventId)
    pub words_stored: u32,
    /// Zero words removed by suppression
    pub words_suppressed: u32,
    /// Non-empty blocks handed to the host
    pub blocks_flushed: u32,
    /// Words handed to the host
    pub words_flushed: u32,
    /// Protocol errors reported
    pub errors_reported: u32,
}

impl SpillStats {
    pub(crate) fn record_event(&mut self, stored: u32, suppressed: u32) {
        self.events_stored = self.events_stored.saturating_add(1);
        self.words_stored = self.words_stored.saturating_add(stored);
        self.words_suppressed = self.words_suppressed.saturating_add(suppressed);
    }

    pub(crate) fn record_drop(&mut self) {
        self.events_dropped = self.events_dropped.saturating_add(1);
    }

    pub(crate) fn record_block(&mut self, words: u32) {
        self.blocks_flushed = self.blocks_flushed.saturating_add(1);
        self.words_flushed = self.words_flushed.saturating_add(words);
    }

    pub(crate) fn record_error(&mut self) {
        self.errors_reported = self.errors_reported.saturating_add(1);
    }
}

/// Most recent protocol errors, oldest first.
#[derive(Debug, Default, Clone)]
pub struct ErrorHistory {
    recent: Deque<ErrorCode, ERROR_HISTORY_DEPTH>,
}

impl ErrorHistory {
    /// Empty history
    pub const fn new() -> Self {
        Self {
            recent: Deque::new(),
        }
    }

    /// Append, evicting the oldest entry when full.
    pub fn push(&mut self, code: ErrorCode) {
        if self.recent.is_full() {
            self.recent.pop_front();
        }
        // Cannot fail: a slot was freed above when full
        let _ = self.recent.push_back(code);
    }

    /// Most recent error
    pub fn last(&self) -> Option<ErrorCode> {
        self.recent.back().copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    /// No errors recorded
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = ErrorCode> + '_ {
        self.recent.iter().copied()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.recent.clear();
    }
}
