//! Central dispatch: the single owner of the run state.
//!
//! One FPGA interrupt is one dispatch. [`CentralDispatch::on_interrupt`]
//! qualifies the edge, reads the mailbox word exactly once (the read is the
//! acknowledge), decodes it, checks it against [`RunState::accepts`] and
//! runs the matching transfer. The status word is published at the end of
//! every dispatch, and additionally at the transient `ERROR_INCOMPLETE` step
//! so the host can observe it.
//!
//! ```text
//!            BEGIN_SPILL / bank ready
//!   READY ───────────────────────────▶ BEAM_ON ──overflow──▶ ERROR_OVERFLOW
//!     ▲                                   │                       │
//!     │ LAST_FLUSH                        │ END_SPILL             │ END_SPILL
//!     │                                   ▼                       │
//!     └──────────────────────────────  BEAM_OFF ◀─────────────────┘
//!                                         │ FLUSH_BLOCK, nothing pending
//!                                         ▼
//!                                     DRAIN_WAIT
//! ```
//!
//! BEGIN_SPILL in BEAM_OFF or DRAIN_WAIT abandons the spill: ERROR_INCOMPLETE
//! is reported and the board returns to READY.

use heapless::Vec;
use platform::memory_map::{COMMAND_WORD_INDEX, DP_WORDS, STATUS_WORD_INDEX};
use platform::{InterruptLine, WordWindow};

use crate::bank::{BankIndex, BankStore};
use crate::beam_off::{self, FlushOutcome};
use crate::beam_on::{self, BeamOnOutcome, StoredEvent};
use crate::bulk::BulkAccumulator;
use crate::command::Command;
use crate::config::{BlockSize, TransferConfig};
use crate::error::TransferError;
use crate::reset::SystemReset;
use crate::state::RunState;
use crate::stats::{ErrorHistory, SpillStats};
use crate::status::{ErrorCode, StatusWord};

/// Most errors a single dispatch can report.
pub const MAX_ERRORS_PER_DISPATCH: usize = 4;

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Board re-initialised and restart requested.
    Restarted,
    /// Clean spill start from READY.
    SpillStarted,
    /// BEGIN_SPILL during beam-off: the undrained spill is dropped and the
    /// board waits in READY. The next bank notification starts the spill.
    SpillAbandoned {
        /// Words still pending when the old spill was dropped
        abandoned: u32,
    },
    /// Beam off; read cursor rewound.
    SpillEnded,
    /// Bank drained into the bulk buffer.
    Stored(StoredEvent),
    /// Bank event dropped on overflow.
    Dropped {
        /// Bank whose event was dropped
        bank: BankIndex,
    },
    /// Notification for a bank with a zero header.
    EmptyBank {
        /// Bank that was notified
        bank: BankIndex,
    },
    /// Block handed to the host.
    Flushed {
        /// Words in the block
        words: u32,
        /// Words still pending
        remaining: u32,
    },
    /// Nothing pending; zero count published.
    Drained,
    /// Spill closed by LAST_FLUSH.
    SpillClosed {
        /// Words still pending when the spill was closed
        abandoned: u32,
    },
    /// Block size changed.
    BlockSizeSet(BlockSize),
    /// Command ignored (malformed or unexpected).
    Rejected,
}

/// Record of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Raw mailbox word
    pub word: u32,
    /// Decoded command, `None` if malformed
    pub command: Option<Command>,
    /// State before
    pub from: RunState,
    /// State after
    pub to: RunState,
    /// What was done
    pub action: Action,
    /// Errors reported during this dispatch, in order
    pub errors: Vec<ErrorCode, MAX_ERRORS_PER_DISPATCH>,
}

impl Outcome {
    fn new(word: u32, from: RunState) -> Self {
        Self {
            word,
            command: None,
            from,
            to: from,
            action: Action::Rejected,
            errors: Vec::new(),
        }
    }

    /// Whether `code` was reported by this dispatch
    pub fn reported(&self, code: ErrorCode) -> bool {
        self.errors.contains(&code)
    }
}

/// Dispatcher over a dual-port window `D`, a bulk window `B` and a board
/// restart `R`.
pub struct CentralDispatch<D, B, R> {
    banks: BankStore<D>,
    bulk: BulkAccumulator<B>,
    reset: R,
    config: TransferConfig,
    state: RunState,
    latched: ErrorCode,
    stats: SpillStats,
    history: ErrorHistory,
}

impl<D, B, R> CentralDispatch<D, B, R>
where
    D: WordWindow,
    B: WordWindow,
    R: SystemReset,
{
    /// Take ownership of the shared memories and initialise.
    ///
    /// The dual-port window must cover the whole layout, mailbox included.
    /// The bulk bound is the smaller of the configured limit and the bulk
    /// window.
    pub fn new(dp: D, bulk: B, reset: R, config: TransferConfig) -> Result<Self, TransferError> {
        let words = dp.len_words();
        if words < DP_WORDS {
            return Err(TransferError::DualPortTooSmall { words });
        }
        let mut this = Self {
            banks: BankStore::new(dp)?,
            bulk: BulkAccumulator::new(bulk, config.bulk_limit_words()),
            reset,
            config,
            state: RunState::Ready,
            latched: ErrorCode::None,
            stats: SpillStats::default(),
            history: ErrorHistory::new(),
        };
        this.init()?;
        Ok(this)
    }

    /// Clear every bank header, both cursors, the pending count and the
    /// latched error, and return to READY. The block size is kept.
    pub fn init(&mut self) -> Result<(), TransferError> {
        self.banks.clear_all()?;
        self.bulk.reset();
        self.latched = ErrorCode::None;
        self.stats = SpillStats::default();
        self.state = RunState::Ready;
        self.publish_status()?;
        info!("transfer core initialised, block size {}", self.config.block_size());
        Ok(())
    }

    /// Handle one interrupt from the FPGA line.
    ///
    /// Returns `None` for a spurious interrupt; the mailbox is not read.
    pub fn on_interrupt<L: InterruptLine>(
        &mut self,
        line: &mut L,
    ) -> Result<Option<Outcome>, TransferError> {
        if !line.take_edge() {
            trace!("spurious interrupt in {}", self.state);
            return Ok(None);
        }
        let word = self.banks.window().read(COMMAND_WORD_INDEX)?;
        self.dispatch(word).map(Some)
    }

    /// Dispatch one mailbox word.
    pub fn dispatch(&mut self, word: u32) -> Result<Outcome, TransferError> {
        let from = self.state;
        let mut outcome = Outcome::new(word, from);

        match Command::decode(word) {
            Err(e) => {
                warn!("malformed command: {}", e);
                self.report(&mut outcome, ErrorCode::MalformedCommand);
            }
            Ok(command) => {
                outcome.command = Some(command);
                debug!("{} in {}", command, from);
                if from.accepts(&command) {
                    outcome.action = self.execute(command, &mut outcome)?;
                } else {
                    warn!("{} not accepted in {}", command, from);
                    self.report(&mut outcome, ErrorCode::UnexpectedCommand);
                }
            }
        }

        outcome.to = self.state;
        if outcome.to != from {
            info!("{} -> {}", from, outcome.to);
        }
        self.publish_status()?;
        Ok(outcome)
    }

    fn execute(&mut self, command: Command, outcome: &mut Outcome) -> Result<Action, TransferError> {
        match command {
            Command::Reset => {
                self.init()?;
                self.reset.restart();
                Ok(Action::Restarted)
            }
            Command::BeginSpill => {
                if self.state == RunState::Ready {
                    self.latched = ErrorCode::None;
                    self.start_spill()?;
                    return Ok(Action::SpillStarted);
                }
                let abandoned = self.bulk.pending();
                self.force_incomplete(outcome)?;
                self.enter_ready()?;
                Ok(Action::SpillAbandoned { abandoned })
            }
            Command::EndSpill => {
                self.bulk.rewind();
                self.latched = ErrorCode::None;
                self.state = RunState::BeamOff;
                info!("spill ended, {} words pending", self.bulk.pending());
                Ok(Action::SpillEnded)
            }
            Command::FlushBlock => {
                let block = self.config.block_size();
                match beam_off::flush_block(self.banks.window_mut(), &mut self.bulk, block)? {
                    FlushOutcome::Block { words, remaining } => {
                        self.stats.record_block(words);
                        Ok(Action::Flushed { words, remaining })
                    }
                    FlushOutcome::Drained => {
                        self.state = RunState::DrainWait;
                        Ok(Action::Drained)
                    }
                }
            }
            Command::LastFlush => {
                let abandoned = self.bulk.pending();
                if abandoned != 0 {
                    self.force_incomplete(outcome)?;
                }
                self.enter_ready()?;
                Ok(Action::SpillClosed { abandoned })
            }
            Command::SetBlockSize(size) => {
                self.config.set_block_size(size);
                debug!("block size {}", size);
                Ok(Action::BlockSizeSet(size))
            }
            Command::BankReady(bank) => {
                if self.state == RunState::Ready {
                    // Headers were cleared on entry to READY; only the
                    // accumulator needs a fresh start.
                    self.latched = ErrorCode::None;
                    self.bulk.reset();
                    self.stats = SpillStats::default();
                    self.state = RunState::BeamOn;
                    debug!("implicit spill start on bank {}", bank);
                }
                self.transfer_bank(bank, outcome)
            }
        }
    }

    fn transfer_bank(&mut self, bank: BankIndex, outcome: &mut Outcome) -> Result<Action, TransferError> {
        match beam_on::transfer(&mut self.banks, &mut self.bulk, bank, &self.config)? {
            BeamOnOutcome::Stored(event) => {
                self.stats.record_event(event.words, event.suppressed);
                if event.count_overflow {
                    warn!("bank {} declared {} words", bank, event.declared);
                    self.report(outcome, ErrorCode::WordCountOverflow);
                }
                if event.bank_id_mismatch {
                    warn!("bank {} carried eventId {}", bank, event.event_id);
                    self.report(outcome, ErrorCode::BankIdMismatch);
                }
                Ok(Action::Stored(event))
            }
            BeamOnOutcome::Overflow { bank } => {
                error!("bulk buffer full, event from bank {} dropped", bank);
                self.stats.record_drop();
                self.state = RunState::ErrorOverflow;
                self.report(outcome, ErrorCode::Overflow);
                Ok(Action::Dropped { bank })
            }
            BeamOnOutcome::EmptyBank { bank } => {
                self.report(outcome, ErrorCode::EmptyBank);
                Ok(Action::EmptyBank { bank })
            }
        }
    }

    fn start_spill(&mut self) -> Result<(), TransferError> {
        self.banks.clear_all()?;
        self.bulk.reset();
        self.stats = SpillStats::default();
        self.state = RunState::BeamOn;
        Ok(())
    }

    fn enter_ready(&mut self) -> Result<(), TransferError> {
        self.banks.clear_all()?;
        self.bulk.reset();
        self.state = RunState::Ready;
        Ok(())
    }

    /// Pass through ERROR_INCOMPLETE: report it and make it visible.
    fn force_incomplete(&mut self, outcome: &mut Outcome) -> Result<(), TransferError> {
        warn!("{} words abandoned in {}", self.bulk.pending(), self.state);
        self.state = RunState::ErrorIncomplete;
        self.report(outcome, ErrorCode::IncompleteDrain);
        self.publish_status()
    }

    fn report(&mut self, outcome: &mut Outcome, code: ErrorCode) {
        self.latched = code;
        self.stats.record_error();
        self.history.push(code);
        // Bounded by the number of report sites on one path
        let _ = outcome.errors.push(code);
    }

    fn publish_status(&mut self) -> Result<(), TransferError> {
        let word = self.status_word().to_word();
        self.banks.window_mut().write(STATUS_WORD_INDEX, word)?;
        Ok(())
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Latched error code
    pub fn latched_error(&self) -> ErrorCode {
        self.latched
    }

    /// Status word as published
    pub fn status_word(&self) -> StatusWord {
        StatusWord {
            state: self.state,
            error: self.latched,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Counters for the running spill
    pub fn stats(&self) -> &SpillStats {
        &self.stats
    }

    /// Recent errors
    pub fn history(&self) -> &ErrorHistory {
        &self.history
    }

    /// Words accumulated and not yet handed to the host
    pub fn pending(&self) -> u32 {
        self.bulk.pending()
    }

    /// Bulk accumulator
    pub fn bulk(&self) -> &BulkAccumulator<B> {
        &self.bulk
    }

    /// Dual-port window
    pub fn dual_port(&self) -> &D {
        self.banks.window()
    }

    /// Mutable dual-port window. Gives the far side (FPGA or host model)
    /// access between dispatches.
    pub fn dual_port_mut(&mut self) -> &mut D {
        self.banks.window_mut()
    }

    /// Board restart
    pub fn system_reset(&self) -> &R {
        &self.reset
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::reset::CountingReset;
    use platform::mocks::{MockInterruptLine, VecWindow};

    type Dispatch = CentralDispatch<VecWindow, VecWindow, CountingReset>;

    fn board() -> Dispatch {
        CentralDispatch::new(
            VecWindow::new(DP_WORDS),
            VecWindow::new(4096),
            CountingReset::new(),
            TransferConfig::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_short_dual_port() {
        let result = CentralDispatch::new(
            VecWindow::new(DP_WORDS - 1),
            VecWindow::new(16),
            CountingReset::new(),
            TransferConfig::new(),
        );
        assert!(matches!(
            result,
            Err(TransferError::DualPortTooSmall { words }) if words == DP_WORDS - 1
        ));
    }

    #[test]
    fn test_init_publishes_ready_status() {
        let b = board();
        assert_eq!(b.state(), RunState::Ready);
        assert_eq!(b.dual_port().words()[STATUS_WORD_INDEX], 0xE906_0000);
    }

    #[test]
    fn test_spurious_interrupt_does_not_touch_mailbox() {
        let mut b = board();
        let mut line = MockInterruptLine::new();
        let reads = b.dual_port().read_count();
        assert_eq!(b.on_interrupt(&mut line).unwrap(), None);
        assert_eq!(b.dual_port().read_count(), reads);
        assert_eq!(line.spurious(), 1);
    }

    #[test]
    fn test_malformed_word_is_reported_and_ignored() {
        let mut b = board();
        let outcome = b.dispatch(0x1234_5678).unwrap();
        assert_eq!(outcome.command, None);
        assert_eq!(outcome.action, Action::Rejected);
        assert!(outcome.reported(ErrorCode::MalformedCommand));
        assert_eq!(b.state(), RunState::Ready);
        assert_eq!(b.latched_error(), ErrorCode::MalformedCommand);
    }

    #[test]
    fn test_reset_reinitialises_and_restarts() {
        let mut b = board();
        b.dispatch(Command::BeginSpill.encode()).unwrap();
        let outcome = b.dispatch(Command::Reset.encode()).unwrap();
        assert_eq!(outcome.action, Action::Restarted);
        assert_eq!(b.state(), RunState::Ready);
        assert_eq!(b.system_reset().count(), 1);
    }

    #[test]
    fn test_set_block_size_kept_across_init() {
        let mut b = board();
        let size = BlockSize::new(64).unwrap();
        b.dispatch(Command::SetBlockSize(size).encode()).unwrap();
        b.init().unwrap();
        assert_eq!(b.config().block_size(), size);
    }
}
