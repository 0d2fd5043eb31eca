//! Board abstraction layer for the front-end transfer controller
//!
//! This crate provides the hardware-facing seams the transfer core is written
//! against, so the core can be exercised on the host without an FPGA.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: spill task, boot)
//!         ↓
//! Transfer core (transfer crate: dispatch, beam-on/off)
//!         ↓
//! Board abstraction (this crate - windows, interrupt line, memory map)
//!         ↓
//! Hardware Layer (FMC-mapped dual-port memory, SDRAM, EXTI)
//! ```
//!
//! # Modules
//!
//! - [`window`] - Bounds-checked 32-bit word windows over shared memory
//! - [`interrupt`] - FPGA interrupt line edge qualification
//! - [`memory_map`] - Dual-port and bulk buffer geometry
//! - [`mpu`] - MPU region math for the shared memory windows
//! - [`fmc`] - FMC register values for the dual-port SRAM bank and bulk SDRAM
//! - [`config`] - Application constants
//!
//! # Features
//!
//! - `std`: Host mocks ([`mocks::VecWindow`], [`mocks::MockInterruptLine`])
//! - `defmt`: Enable `defmt::Format` derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{WordWindow, WindowError};
//!
//! fn first_word<W: WordWindow>(dp: &W) -> Result<u32, WindowError> {
//!     dp.read(0)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware abstraction crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod fmc;
pub mod interrupt;
pub mod memory_map;
pub mod mpu;
pub mod window;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use interrupt::{EdgeQualifier, InterruptLine, InterruptMode};
pub use window::{WindowError, WordWindow};
