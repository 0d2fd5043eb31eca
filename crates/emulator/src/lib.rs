//! Host emulator for the spill transfer controller
//!
//! Runs the real transfer core against host buffers, with an FPGA model
//! filling banks and a host model reading blocks, so whole spills can be
//! replayed and checked word for word without a board.
//!
//! # Example
//!
//! ```
//! use emulator::{Emulator, Scenario, SpillPlan};
//!
//! let scenario = Scenario::new("doc").with_spill(SpillPlan::new(10, 32));
//! let mut emu = Emulator::new(&scenario.board).unwrap();
//! let report = emu.run(&scenario).unwrap();
//! assert!(report.all_matched());
//! ```
//!
//! Scenario files live in `crates/emulator/scenarios/`; the
//! `spill-emulator` binary runs them (`cargo xtask emulate --scenario ...`).

// Desktop crate: word and block arithmetic is on host integers
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::cast_possible_truncation)]

pub mod fpga;
pub mod host;
pub mod report;
pub mod scenario;
pub mod session;

pub use fpga::{Delivery, FpgaModel};
pub use host::{BlockRead, HostModel};
pub use report::{RunReport, SpillReport};
pub use scenario::{BoardSettings, Scenario, ScenarioError, SpillPlan, SCENARIO_VERSION};
pub use session::{Board, Emulator, EMULATED_BULK_WORDS};
