//! Emulated board session
//!
//! [`Emulator`] wires the transfer core to host buffers, an FPGA model and a
//! host model, then plays scenarios through the real mailbox path: the
//! command word goes into the dual-port, the interrupt line is raised, and
//! [`CentralDispatch::on_interrupt`] runs.

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info, warn};

use platform::memory_map::{COMMAND_WORD_INDEX, DP_WORDS};
use platform::mocks::{MockInterruptLine, VecWindow};
use platform::WordWindow;
use transfer::{
    Action, BlockSize, CentralDispatch, Command, CountingReset, Outcome, RunState, TransferConfig,
};

use crate::fpga::{Delivery, FpgaModel};
use crate::host::{BlockRead, HostModel};
use crate::report::{RunReport, SpillReport};
use crate::scenario::{BoardSettings, Scenario, SpillPlan};

/// Emulated SDRAM size in words (4 MiB).
pub const EMULATED_BULK_WORDS: usize = 1 << 20;

/// Dispatcher over host buffers.
pub type Board = CentralDispatch<VecWindow, VecWindow, CountingReset>;

/// One board, one FPGA, one host.
pub struct Emulator {
    board: Board,
    line: MockInterruptLine,
    fpga: FpgaModel,
    host: HostModel,
    zero_suppress: bool,
}

impl Emulator {
    /// Boot a board with `settings`; the host programs the block size.
    pub fn new(settings: &BoardSettings) -> Result<Self> {
        let mut config = TransferConfig::new()
            .with_zero_suppression(settings.zero_suppression)
            .with_bank_id_check(settings.check_bank_id);
        if let Some(limit) = settings.bulk_limit_words {
            config = config.with_bulk_limit(limit);
        }
        let board = CentralDispatch::new(
            VecWindow::new(DP_WORDS),
            VecWindow::new(EMULATED_BULK_WORDS),
            CountingReset::new(),
            config,
        )
        .context("transfer core init")?;
        let block = board.config().block_size().words();

        let mut emulator = Self {
            board,
            line: MockInterruptLine::new(),
            fpga: FpgaModel::new(),
            host: HostModel::new(block),
            zero_suppress: settings.zero_suppression,
        };
        if let Some(words) = settings.block_size {
            let size = BlockSize::new(words)?;
            emulator.post(Command::SetBlockSize(size))?;
            emulator.host = HostModel::new(size.words());
        }
        Ok(emulator)
    }

    /// Post `command` in the mailbox and run the interrupt.
    pub fn post(&mut self, command: Command) -> Result<Outcome> {
        self.board
            .dual_port_mut()
            .write(COMMAND_WORD_INDEX, command.encode())?;
        self.line.raise();
        let outcome = self
            .board
            .on_interrupt(&mut self.line)?
            .ok_or_else(|| anyhow!("interrupt for {command} was not qualified"))?;
        for code in &outcome.errors {
            warn!(%command, state = %outcome.from, "board reported {code}");
        }
        Ok(outcome)
    }

    /// Play a whole scenario.
    pub fn run(&mut self, scenario: &Scenario) -> Result<RunReport> {
        scenario.validate()?;
        info!(
            scenario = %scenario.name,
            spills = scenario.spills.len(),
            block = self.host.block_size(),
            "running scenario"
        );
        let mut report = RunReport {
            scenario: scenario.name.clone(),
            spills: Vec::with_capacity(scenario.spills.len()),
        };
        for (index, plan) in scenario.spills.iter().enumerate() {
            let index = u32::try_from(index)?;
            let spill = self
                .run_spill(index, plan)
                .with_context(|| format!("spill {index}"))?;
            report.spills.push(spill);
        }
        Ok(report)
    }

    /// Play one spill: beam-on events, then the host drain.
    pub fn run_spill(&mut self, index: u32, plan: &SpillPlan) -> Result<SpillReport> {
        let mut report = SpillReport::new(index);
        let mut expected = Vec::new();
        let suppress = self.zero_suppress;

        if plan.begin {
            let outcome = self.post(Command::BeginSpill)?;
            report.record(&outcome);
        }

        for event in 0..plan.events {
            let payload =
                FpgaModel::payload(index, event, plan.words_per_event, plan.zero_fraction);
            let bank = match self
                .fpga
                .write_event(self.board.dual_port_mut(), &payload, event)
            {
                Delivery::Written(bank) => bank,
                Delivery::BankBusy(bank) => {
                    debug!(%bank, event, "bank busy, event lost at the FPGA");
                    report.events_blocked += 1;
                    continue;
                }
            };
            report.events_written += 1;

            let outcome = self.post(Command::BankReady(bank))?;
            report.record(&outcome);
            match outcome.action {
                Action::Stored(stored) => {
                    report.events_stored += 1;
                    expected.extend(payload.iter().copied().filter(|&w| !suppress || w != 0));
                    expected.push(stored.event_id);
                }
                Action::Dropped { .. } => report.events_dropped += 1,
                _ => {}
            }
        }

        let outcome = self.post(Command::EndSpill)?;
        report.record(&outcome);
        self.drain(plan, &mut report)?;

        report.absorb_stats(self.board.stats());
        report.received = self.host.take_spill();
        report.expected_words = expected.len();
        report.received_words = report.received.len();
        report.matched = if plan.abandon_after_blocks.is_some() {
            expected.starts_with(&report.received)
        } else {
            report.received == expected
        };
        report.final_state = self.board.state().name().to_string();
        info!(
            spill = index,
            stored = report.events_stored,
            dropped = report.events_dropped,
            words = report.received_words,
            blocks = report.blocks,
            state = %self.board.state(),
            "spill done"
        );
        Ok(report)
    }

    /// FLUSH_BLOCK until the host has a short block or a zero count.
    fn drain(&mut self, plan: &SpillPlan, report: &mut SpillReport) -> Result<()> {
        let block = self.host.block_size().max(1);
        let limit = self.board.pending() / block + 2;
        for _ in 0..=limit {
            if plan
                .abandon_after_blocks
                .is_some_and(|n| self.host.blocks() >= n)
            {
                return self.close(report);
            }
            let outcome = self.post(Command::FlushBlock)?;
            report.record(&outcome);
            if outcome.action == Action::Rejected {
                // The handoff region still holds an older block
                warn!(state = %outcome.from, "FLUSH_BLOCK rejected, drain stopped");
                return Ok(());
            }
            let read = self.host.read_block(self.board.dual_port());
            report.blocks = self.host.blocks();
            match read {
                BlockRead::Full(_) => {}
                BlockRead::Short(_) => return self.close(report),
                BlockRead::Empty => {
                    debug!(state = %self.board.state(), "drained");
                    return Ok(());
                }
            }
        }
        bail!("no short or empty block after {limit} flushes")
    }

    fn close(&mut self, report: &mut SpillReport) -> Result<()> {
        let outcome = self.post(Command::LastFlush)?;
        report.record(&outcome);
        report.closed_by_last_flush = true;
        Ok(())
    }

    /// Send RESET: the board re-initialises and the restart is counted.
    pub fn reset(&mut self) -> Result<Outcome> {
        self.post(Command::Reset)
    }

    /// The emulated board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Board state
    pub fn state(&self) -> RunState {
        self.board.state()
    }

    /// The FPGA model
    pub fn fpga(&self) -> &FpgaModel {
        &self.fpga
    }

    /// The interrupt line
    pub fn line(&self) -> &MockInterruptLine {
        &self.line
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use transfer::ErrorCode;

    #[test]
    fn test_block_size_is_programmed_through_mailbox() {
        let settings = BoardSettings {
            block_size: Some(64),
            ..BoardSettings::default()
        };
        let emu = Emulator::new(&settings).unwrap();
        assert_eq!(emu.board().config().block_size().words(), 64);
        assert_eq!(emu.line().taken(), 1);
    }

    #[test]
    fn test_post_reports_unexpected_command() {
        let mut emu = Emulator::new(&BoardSettings::default()).unwrap();
        let outcome = emu.post(Command::FlushBlock).unwrap();
        assert!(outcome.reported(ErrorCode::UnexpectedCommand));
        assert_eq!(emu.state(), RunState::Ready);
    }

    #[test]
    fn test_reset_is_counted() {
        let mut emu = Emulator::new(&BoardSettings::default()).unwrap();
        emu.post(Command::BeginSpill).unwrap();
        emu.reset().unwrap();
        assert_eq!(emu.board().system_reset().count(), 1);
        assert_eq!(emu.state(), RunState::Ready);
    }
}
