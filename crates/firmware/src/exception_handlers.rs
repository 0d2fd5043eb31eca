//! Cortex-M exception handlers.
//!
//! - **HardFault**: an MPU or bus fault, most likely an access through an
//!   FMC window whose bank is not configured, or a stack overflow caught by
//!   flip-link (`.cargo/config.toml`).
//!
//! The FPGA cannot tell a hung board from a slow one, so the handler logs the
//! stacked frame and resets; the host sees the status word return to READY.
//!
//! The `#[cortex_m_rt::exception]` attribute needs ARM target intrinsics and
//! is gated behind `hardware`. `HARDFAULT_DEFINED` compiles unconditionally
//! so host tests can check the module is linked in.

#![allow(clippy::doc_markdown)] // HardFault, PC, LR are register names

/// Marker confirming this module is compiled into the firmware.
pub const HARDFAULT_DEFINED: bool = true;

/// HardFault handler (hardware target only).
///
/// Logs the stacked PC and LR over RTT, then resets through the SCB.
/// Never returns.
#[cfg(feature = "hardware")]
#[cortex_m_rt::exception]
#[allow(unsafe_code)]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    defmt::error!(
        "HardFault: pc={=u32:#010x} lr={=u32:#010x} xpsr={=u32:#010x}",
        ef.pc(),
        ef.lr(),
        ef.xpsr()
    );
    cortex_m::peripheral::SCB::sys_reset();
}
