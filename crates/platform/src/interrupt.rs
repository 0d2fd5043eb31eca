//! FPGA interrupt line qualification
//!
//! The FPGA signals "a command word is waiting in the mailbox" on a single
//! GPIO line. The line is active-low and held asserted until the mailbox is
//! read. A wake-up that finds the line already back at its idle level is a
//! glitch: acting on it would re-read the mailbox and double-process the
//! previous command.
//!
//! [`InterruptLine`] is the seam the dispatcher consumes. [`EdgeQualifier`]
//! implements it over any `embedded_hal::digital::InputPin`.

use embedded_hal::digital::InputPin;

/// Interrupt trigger mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    /// Trigger on rising edge (active-high line)
    RisingEdge,
    /// Trigger on falling edge (active-low line)
    FallingEdge,
    /// Trigger on both edges (toggle signalling)
    BothEdges,
}

/// A source of qualified interrupt edges.
pub trait InterruptLine {
    /// Sample the line and report whether this wake-up is a qualifying edge.
    ///
    /// Called exactly once per interrupt, before the mailbox is read.
    fn take_edge(&mut self) -> bool;
}

impl<L: InterruptLine + ?Sized> InterruptLine for &mut L {
    fn take_edge(&mut self) -> bool {
        (**self).take_edge()
    }
}

/// Edge qualifier over a GPIO input pin.
///
/// For [`InterruptMode::FallingEdge`] and [`InterruptMode::RisingEdge`] a
/// wake-up qualifies when the line is still at its asserted level. For
/// [`InterruptMode::BothEdges`] it qualifies when the level differs from the
/// one seen at the previous sample.
///
/// A pin read error never qualifies.
pub struct EdgeQualifier<P> {
    pin: P,
    mode: InterruptMode,
    last_high: bool,
}

impl<P: InputPin> EdgeQualifier<P> {
    /// Wrap `pin`. The line is assumed idle at construction.
    pub fn new(pin: P, mode: InterruptMode) -> Self {
        let last_high = !matches!(mode, InterruptMode::RisingEdge);
        Self {
            pin,
            mode,
            last_high,
        }
    }

    /// Trigger mode
    pub fn mode(&self) -> InterruptMode {
        self.mode
    }

    /// Borrow the underlying pin (the firmware awaits EXTI edges on it).
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Release the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> InterruptLine for EdgeQualifier<P> {
    fn take_edge(&mut self) -> bool {
        let Ok(high) = self.pin.is_high() else {
            return false;
        };
        let qualifies = match self.mode {
            InterruptMode::FallingEdge => !high,
            InterruptMode::RisingEdge => high,
            InterruptMode::BothEdges => high != self.last_high,
        };
        self.last_high = high;
        qualifies
    }
}
