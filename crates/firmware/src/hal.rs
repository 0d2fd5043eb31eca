//! Board implementations of the platform seams
//!
//! - [`MmioWindow`]: volatile word window over an FMC-mapped region. Host
//!   tests point it at an ordinary buffer.
//! - [`ScbReset`]: board restart through the Cortex-M system control block
//!   (hardware builds only).

use core::ptr::NonNull;

use platform::memory_map::{BULK_BASE_ADDRESS, BULK_WORDS, DP_BASE_ADDRESS, DP_WORDS};
use platform::{WindowError, WordWindow};

/// Volatile 32-bit word window over memory the core does not own
/// exclusively.
///
/// Every access is a single `read_volatile`/`write_volatile`, so the
/// compiler neither caches, merges nor elides it. Ordering against the FPGA
/// additionally relies on the MPU mapping the dual-port strongly ordered.
pub struct MmioWindow {
    base: NonNull<u32>,
    len: usize,
}

// SAFETY: the window is the sole software owner of its region; moving it to
// another task moves that ownership with it.
unsafe impl Send for MmioWindow {}

impl MmioWindow {
    /// Window of `len` words starting at `base`.
    ///
    /// Returns `None` if `base` is null.
    ///
    /// # Safety
    ///
    /// `base .. base + len` must be valid, 4-byte aligned memory for the
    /// lifetime of the window, and no other Rust reference may alias it.
    pub unsafe fn new(base: *mut u32, len: usize) -> Option<Self> {
        NonNull::new(base).map(|base| Self { base, len })
    }

    /// The FPGA dual-port memory on FMC bank 1.
    ///
    /// # Safety
    ///
    /// FMC bank 1 must be configured (see `boot::hardware::init_fmc`), and
    /// this must be the only window over the dual-port.
    pub unsafe fn dual_port() -> Option<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::new(DP_BASE_ADDRESS as *mut u32, DP_WORDS) }
    }

    /// The SDRAM bulk buffer.
    ///
    /// # Safety
    ///
    /// The SDRAM must be initialised and refreshing, and this must be the
    /// only window over the bulk buffer.
    pub unsafe fn bulk_buffer() -> Option<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::new(BULK_BASE_ADDRESS as *mut u32, BULK_WORDS) }
    }

    /// Pointer to word `index`, bounds-checked.
    fn word(&self, index: usize) -> Result<*mut u32, WindowError> {
        if index >= self.len {
            return Err(WindowError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        // SAFETY: index < len, and `new` requires base..base+len to be valid
        Ok(unsafe { self.base.as_ptr().add(index) })
    }
}

impl WordWindow for MmioWindow {
    fn len_words(&self) -> usize {
        self.len
    }

    fn read(&self, index: usize) -> Result<u32, WindowError> {
        let ptr = self.word(index)?;
        // SAFETY: `word` checked the bound; alignment is a `new` precondition
        Ok(unsafe { ptr.read_volatile() })
    }

    fn write(&mut self, index: usize, value: u32) -> Result<(), WindowError> {
        let ptr = self.word(index)?;
        // SAFETY: as in `read`; `&mut self` rules out a concurrent Rust access
        unsafe { ptr.write_volatile(value) };
        Ok(())
    }
}

/// Restart through `SCB::sys_reset`.
#[cfg(feature = "hardware")]
pub struct ScbReset;

#[cfg(feature = "hardware")]
impl transfer::SystemReset for ScbReset {
    fn restart(&mut self) {
        defmt::warn!("RESET command: restarting board");
        cortex_m::peripheral::SCB::sys_reset();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn window(buf: &mut [u32]) -> MmioWindow {
        // SAFETY: buf outlives the window in every test and is not touched
        // through another reference while the window is alive.
        unsafe { MmioWindow::new(buf.as_mut_ptr(), buf.len()) }.unwrap()
    }

    #[test]
    fn test_read_write_reach_the_buffer() {
        let mut buf = [0u32; 4];
        {
            let mut w = window(&mut buf);
            w.write(2, 0xDEAD_BEEF).unwrap();
            assert_eq!(w.read(2).unwrap(), 0xDEAD_BEEF);
            assert_eq!(w.len_words(), 4);
        }
        assert_eq!(buf, [0, 0, 0xDEAD_BEEF, 0]);
    }

    #[test]
    fn test_access_past_end_is_rejected() {
        let mut buf = [7u32; 2];
        let mut w = window(&mut buf);
        assert_eq!(
            w.read(2),
            Err(WindowError::OutOfBounds { index: 2, len: 2 })
        );
        assert!(w.write(usize::MAX, 0).is_err());
        assert!(w.check_range(1, 2).is_err());
    }

    #[test]
    fn test_null_base_is_refused() {
        // SAFETY: a null base is rejected before any access
        assert!(unsafe { MmioWindow::new(core::ptr::null_mut(), 4) }.is_none());
    }
}
