//! Heartbeat snapshot of the transfer core
//!
//! The spill task owns the dispatcher. After every dispatch it captures a
//! [`Heartbeat`] and signals it; the main loop logs the latest one each
//! period while feeding the watchdog. Nothing in the main loop touches the
//! dispatcher itself.

use platform::WordWindow;
use transfer::{CentralDispatch, ErrorCode, RunState, SpillStats, SystemReset};

/// Point-in-time view of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Heartbeat {
    /// Dispatches handled since boot
    pub dispatches: u32,
    /// Run state
    pub state: RunState,
    /// Error latched in the status word
    pub latched: ErrorCode,
    /// Most recent error in the history, if any
    pub last_error: Option<ErrorCode>,
    /// Words in the bulk buffer not yet handed to the host
    pub pending: u32,
    /// Counters of the running spill
    pub stats: SpillStats,
}

impl Heartbeat {
    /// Snapshot `board` after `dispatches` dispatches.
    pub fn capture<D, B, R>(board: &CentralDispatch<D, B, R>, dispatches: u32) -> Self
    where
        D: WordWindow,
        B: WordWindow,
        R: SystemReset,
    {
        Self {
            dispatches,
            state: board.state(),
            latched: board.latched_error(),
            last_error: board.history().last(),
            pending: board.pending(),
            stats: *board.stats(),
        }
    }

    /// Whether the board needs attention: a latched error or an overflowed
    /// spill.
    pub fn is_degraded(&self) -> bool {
        self.latched != ErrorCode::None || self.state == RunState::ErrorOverflow
    }
}

/// Latest heartbeat, written by the spill task and taken by the main loop.
#[cfg(feature = "hardware")]
pub static HEARTBEAT: embassy_sync::signal::Signal<
    embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
    Heartbeat,
> = embassy_sync::signal::Signal::new();
