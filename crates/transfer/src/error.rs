//! Error types for the transfer core.
//!
//! These are *Rust-level* failures: a window access that fell outside its
//! bounds, or a board wired with a dual-port window too small for the
//! layout. Protocol errors the host must see (overflow, incomplete drain,
//! unexpected or malformed commands) are not Rust errors; they are reported
//! through [`crate::status::ErrorCode`] in the status word and never abort a
//! dispatch.

use core::fmt;

use platform::WindowError;

/// Failure of a transfer or dispatch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// A dual-port or bulk window access was out of range.
    Window(WindowError),
    /// The dual-port window does not cover the mailbox word.
    DualPortTooSmall {
        /// Length of the window that was supplied, in words
        words: usize,
    },
    /// The beam-off scratch window rejected a word.
    ScratchOverflow,
}

impl From<WindowError> for TransferError {
    fn from(e: WindowError) -> Self {
        Self::Window(e)
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(e) => write!(f, "window access failed: {e}"),
            Self::DualPortTooSmall { words } => {
                write!(f, "dual-port window of {words} words is smaller than the layout")
            }
            Self::ScratchOverflow => f.write_str("beam-off scratch window overflowed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransferError {}
