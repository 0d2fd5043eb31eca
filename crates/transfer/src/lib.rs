//! Spill transfer core for the front-end board
//!
//! Drains FPGA event banks out of dual-port memory into a bulk buffer while
//! the beam is on, then hands the accumulated data back to the host in
//! bounded blocks once it is off. Everything is driven by one mailbox word
//! per FPGA interrupt, decoded and executed by [`CentralDispatch`].
//!
//! # Layers
//!
//! ```text
//! CentralDispatch (dispatch)   one interrupt = one command
//!     ├─ beam_on               bank → bulk, zero suppression
//!     ├─ beam_off              bulk → handoff region, chunked
//!     ├─ bank / bulk           typed views over the shared memories
//!     └─ command / state       decoding and the acceptance table
//! ```
//!
//! The crate is `no_std` and allocation-free. Hardware access goes through
//! [`platform::WordWindow`], so the same code runs on the board and in the
//! host emulator.
//!
//! # Features
//!
//! - `std`: `std::error::Error` impls, host mocks
//! - `defmt`: `defmt::Format` derives and defmt log output
//! - `tracing`: log output through `tracing`

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)] // register names and hex words in docs
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod fmt;

pub mod bank;
pub mod beam_off;
pub mod beam_on;
pub mod bulk;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod reset;
pub mod state;
pub mod stats;
pub mod status;

pub use bank::{BankHeader, BankIndex, BankStore};
pub use beam_off::FlushOutcome;
pub use beam_on::{BeamOnOutcome, StoredEvent};
pub use bulk::BulkAccumulator;
pub use command::{Command, CommandError};
pub use config::{BlockSize, ConfigError, TransferConfig, WordCountMode};
pub use dispatch::{Action, CentralDispatch, Outcome};
pub use error::TransferError;
pub use reset::{CountingReset, SystemReset};
pub use state::RunState;
pub use stats::{ErrorHistory, SpillStats};
pub use status::{ErrorCode, StatusWord};
