//! System restart seam.
//!
//! `RESET` re-initialises the dispatcher and then restarts the board. The
//! restart itself is hardware; the firmware supplies an implementation that
//! resets the core and never returns, tests and the emulator supply one that
//! only records the request.

/// Board restart.
pub trait SystemReset {
    /// Restart the system. Hardware implementations do not return.
    fn restart(&mut self);
}

impl<R: SystemReset + ?Sized> SystemReset for &mut R {
    fn restart(&mut self) {
        (**self).restart();
    }
}

/// Records restart requests instead of performing them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingReset {
    count: u32,
}

impl CountingReset {
    /// No restarts recorded
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    /// Restarts requested so far
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl SystemReset for CountingReset {
    fn restart(&mut self) {
        self.count = self.count.saturating_add(1);
    }
}
