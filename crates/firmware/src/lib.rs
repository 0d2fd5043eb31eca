//! Front-end transfer controller firmware
//!
//! Runs the transfer core on the STM32H743 of a front-end board: the FPGA
//! fills dual-port banks during the spill, the spill task drains them into
//! the SDRAM bulk buffer and hands the buffer back to the host in blocks
//! after the beam.
//!
//! # Architecture
//!
//! ```text
//! main.rs (boot, watchdog, heartbeat)
//!         ↓
//! spill_task (FPGA line → CentralDispatch)
//!         ↓
//! transfer crate (dispatch, beam-on/off)
//!         ↓
//! hal (MmioWindow over FMC, ScbReset)
//!         ↓
//! Embassy, STM32 FMC/EXTI
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for STM32H7 target (embassy, defmt over RTT)
//! - `std` - Host tests
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer defmt over println! in firmware code
#![warn(clippy::dbg_macro)]
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
// FMC addresses are 32-bit bus addresses carried as usize
#![allow(clippy::cast_possible_truncation)]

pub mod boot;
pub mod exception_handlers;
pub mod hal;
pub mod heartbeat;

#[cfg(feature = "hardware")]
pub mod spill_task;

pub use hal::MmioWindow;
pub use heartbeat::Heartbeat;
