//! Bounds-checked 32-bit word windows over shared memory
//!
//! Both memories the transfer core touches are reached through this trait:
//! the FPGA dual-port memory and the SDRAM bulk buffer. On hardware the
//! implementation performs volatile accesses over an FMC-mapped region
//! (see `firmware::hal::MmioWindow`); in tests it wraps a `Vec<u32>`
//! ([`crate::mocks::VecWindow`]).
//!
//! Every access is bounds-checked against [`WordWindow::len_words`]. An
//! out-of-range index is an error, never a wild pointer dereference.

use core::fmt;

/// Window access error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowError {
    /// Word index at or past the end of the window.
    OutOfBounds {
        /// Requested word index
        index: usize,
        /// Window length in words
        len: usize,
    },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, len } => {
                write!(f, "word index {index} outside window of {len} words")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WindowError {}

/// A fixed-length window of 32-bit words.
///
/// Implementations must not cache or reorder accesses: the other side of a
/// dual-port window is an FPGA writing concurrently.
pub trait WordWindow {
    /// Window length in 32-bit words.
    fn len_words(&self) -> usize;

    /// Read the word at `index`.
    fn read(&self, index: usize) -> Result<u32, WindowError>;

    /// Write `value` to the word at `index`.
    fn write(&mut self, index: usize, value: u32) -> Result<(), WindowError>;

    /// Check that `len` words starting at `start` lie inside the window and
    /// return the exclusive end index.
    fn check_range(&self, start: usize, len: usize) -> Result<usize, WindowError> {
        let words = self.len_words();
        match start.checked_add(len) {
            Some(end) if end <= words => Ok(end),
            _ => Err(WindowError::OutOfBounds {
                index: start.saturating_add(len),
                len: words,
            }),
        }
    }
}

impl<W: WordWindow + ?Sized> WordWindow for &mut W {
    fn len_words(&self) -> usize {
        (**self).len_words()
    }

    fn read(&self, index: usize) -> Result<u32, WindowError> {
        (**self).read(index)
    }

    fn write(&mut self, index: usize, value: u32) -> Result<(), WindowError> {
        (**self).write(index, value)
    }
}
