//! Whole-spill scenarios driven through the dispatcher.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

mod common;

use core::cell::Cell;

use common::{bank, board, board_with, deliver, header, load_event, send, status};
use platform::memory_map::{
    COMMAND_WORD_INDEX, DP_WORDS, HANDOFF_COUNT_INDEX, HANDOFF_DATA_INDEX,
};
use platform::mocks::{MockInterruptLine, VecWindow};
use platform::{WindowError, WordWindow};
use transfer::{
    Action, BlockSize, CentralDispatch, Command, CountingReset, ErrorCode, RunState, StatusWord,
    TransferConfig,
};

#[test]
fn test_bank_three_lands_zero_suppressed_in_bulk() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);

    let outcome = deliver(&mut b, bank(3), &[0, 7, 0, 9, 3], 0xAB);

    assert!(matches!(outcome.action, Action::Stored(ev) if ev.words == 4));
    assert!(outcome.errors.is_empty());
    assert_eq!(&b.bulk().window().words()[..4], &[7, 9, 3, 0xAB]);
    assert_eq!(b.pending(), 4);
    assert_eq!(header(&b, bank(3)), 0);
    assert_eq!(b.stats().words_suppressed, 2);
}

#[test]
fn test_eighteen_hundred_words_flush_in_six_blocks_then_drain() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);
    // Six events of 299 non-zero payload words plus eventId
    let payload: Vec<u32> = (1..=299).collect();
    for i in 0..6 {
        deliver(&mut b, bank(i), &payload, i);
    }
    assert_eq!(b.pending(), 1800);

    send(&mut b, Command::EndSpill);
    for _ in 0..6 {
        let outcome = send(&mut b, Command::FlushBlock);
        assert!(matches!(outcome.action, Action::Flushed { words: 300, .. }));
        assert_eq!(b.dual_port().words()[HANDOFF_COUNT_INDEX], 300);
        assert_eq!(b.state(), RunState::BeamOff);
    }

    let outcome = send(&mut b, Command::FlushBlock);
    assert_eq!(outcome.action, Action::Drained);
    assert_eq!(b.dual_port().words()[HANDOFF_COUNT_INDEX], 0);
    assert_eq!(b.state(), RunState::DrainWait);
    assert_eq!(b.stats().blocks_flushed, 6);
    assert_eq!(b.stats().words_flushed, 1800);
}

#[test]
fn test_blocks_reproduce_bulk_in_order() {
    let mut b = board_with(TransferConfig::new().with_block_size(BlockSize::new(7).unwrap()));
    send(&mut b, Command::BeginSpill);
    deliver(&mut b, bank(0), &[1, 2, 3, 4, 5], 0x10);
    deliver(&mut b, bank(1), &[6, 7, 8], 0x11);
    send(&mut b, Command::EndSpill);

    let mut received = Vec::new();
    loop {
        let outcome = send(&mut b, Command::FlushBlock);
        if outcome.action == Action::Drained {
            break;
        }
        let dp = b.dual_port().words();
        let n = dp[HANDOFF_COUNT_INDEX] as usize;
        assert!(n <= 7);
        received.extend_from_slice(&dp[HANDOFF_DATA_INDEX..HANDOFF_DATA_INDEX + n]);
    }
    assert_eq!(received, vec![1, 2, 3, 4, 5, 0x10, 6, 7, 8, 0x11]);
}

#[test]
fn test_last_flush_with_words_pending_reports_incomplete() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);
    deliver(&mut b, bank(4), &[1; 11], 0x4);
    send(&mut b, Command::EndSpill);
    assert_eq!(b.pending(), 12);

    let outcome = send(&mut b, Command::LastFlush);

    assert_eq!(outcome.action, Action::SpillClosed { abandoned: 12 });
    assert!(outcome.reported(ErrorCode::IncompleteDrain));
    assert_eq!(b.state(), RunState::Ready);
    assert_eq!(b.pending(), 0);
    assert_eq!(
        StatusWord::from_word(status(&b)),
        Some(StatusWord {
            state: RunState::Ready,
            error: ErrorCode::IncompleteDrain,
        })
    );
}

#[test]
fn test_clean_last_flush_after_short_block() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);
    deliver(&mut b, bank(0), &[9; 20], 0x0);
    send(&mut b, Command::EndSpill);
    send(&mut b, Command::FlushBlock);

    let outcome = send(&mut b, Command::LastFlush);

    assert_eq!(outcome.action, Action::SpillClosed { abandoned: 0 });
    assert!(outcome.errors.is_empty());
    assert_eq!(status(&b), 0xE906_0000);
    // The handoff count overlays bank 0's header and must not look like a
    // ready bank to the next spill.
    assert_eq!(header(&b, bank(0)), 0);
}

#[test]
fn test_overflow_drops_event_and_refuses_until_end_spill() {
    let mut b = board_with(TransferConfig::new().with_bulk_limit(8));
    send(&mut b, Command::BeginSpill);
    deliver(&mut b, bank(0), &[1, 2, 3], 0x0);

    let outcome = deliver(&mut b, bank(1), &[4, 5, 6, 7, 8], 0x1);

    assert_eq!(outcome.action, Action::Dropped { bank: bank(1) });
    assert_eq!(b.state(), RunState::ErrorOverflow);
    assert_eq!(b.pending(), 4, "dropped event left no trace");
    assert_eq!(b.stats().events_dropped, 1);
    assert_eq!(status(&b), 0xE906_0104);

    let refused = deliver(&mut b, bank(2), &[1], 0x2);
    assert!(refused.reported(ErrorCode::UnexpectedCommand));
    assert_ne!(header(&b, bank(2)), 0);

    let outcome = send(&mut b, Command::EndSpill);
    assert_eq!(outcome.to, RunState::BeamOff);
    assert_eq!(b.latched_error(), ErrorCode::None);
    assert_eq!(b.pending(), 4, "data stored before the overflow is still drained");
}

#[test]
fn test_begin_spill_abandoning_undrained_spill() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);
    deliver(&mut b, bank(5), &[1, 2], 0x5);
    send(&mut b, Command::EndSpill);

    let outcome = send(&mut b, Command::BeginSpill);

    assert_eq!(outcome.action, Action::SpillAbandoned { abandoned: 3 });
    assert!(outcome.reported(ErrorCode::IncompleteDrain));
    assert_eq!(outcome.to, RunState::Ready);
    assert_eq!(b.state(), RunState::Ready);
    assert_eq!(b.pending(), 0);
    assert_eq!(status(&b), 0xE906_0200);

    // The next bank notification opens the new spill
    let next = deliver(&mut b, bank(6), &[9], 0x6);
    assert!(matches!(next.action, Action::Stored(_)));
    assert_eq!(b.state(), RunState::BeamOn);
    assert_eq!(b.pending(), 2);
}

#[test]
fn test_begin_spill_in_drain_wait_returns_to_ready() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);
    deliver(&mut b, bank(1), &[1], 0x1);
    send(&mut b, Command::EndSpill);
    send(&mut b, Command::FlushBlock);
    let drained = send(&mut b, Command::FlushBlock);
    assert_eq!(drained.to, RunState::DrainWait);

    let outcome = send(&mut b, Command::BeginSpill);

    assert_eq!(outcome.action, Action::SpillAbandoned { abandoned: 0 });
    assert!(outcome.reported(ErrorCode::IncompleteDrain));
    assert_eq!(b.state(), RunState::Ready);
    assert_eq!(b.latched_error(), ErrorCode::IncompleteDrain);
}

#[test]
fn test_bank_notification_in_ready_starts_spill() {
    let mut b = board();
    let outcome = deliver(&mut b, bank(7), &[3, 0, 3], 0x7);
    assert_eq!(outcome.from, RunState::Ready);
    assert_eq!(outcome.to, RunState::BeamOn);
    assert!(matches!(outcome.action, Action::Stored(_)));
    assert_eq!(b.pending(), 3);
}

#[test]
fn test_begin_spill_clears_stale_headers() {
    let mut b = board();
    load_event(&mut b, bank(9), &[1], 0x9);
    send(&mut b, Command::BeginSpill);
    assert_eq!(header(&b, bank(9)), 0);
}

#[test]
fn test_empty_bank_is_reported_without_transfer() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);
    let outcome = send(&mut b, Command::BankReady(bank(6)));
    assert_eq!(outcome.action, Action::EmptyBank { bank: bank(6) });
    assert!(outcome.reported(ErrorCode::EmptyBank));
    assert_eq!(b.state(), RunState::BeamOn);
    assert_eq!(b.pending(), 0);
}

#[test]
fn test_block_size_command_applies_to_next_flush() {
    let mut b = board();
    send(&mut b, Command::BeginSpill);
    deliver(&mut b, bank(0), &[1; 99], 0x0);
    send(&mut b, Command::EndSpill);
    send(&mut b, Command::SetBlockSize(BlockSize::new(40).unwrap()));
    let outcome = send(&mut b, Command::FlushBlock);
    assert_eq!(outcome.action, Action::Flushed { words: 40, remaining: 60 });
}

#[test]
fn test_bad_block_size_is_malformed() {
    let mut b = board();
    let outcome = b.dispatch(0xE906_8000).unwrap();
    assert!(outcome.reported(ErrorCode::MalformedCommand));
    assert_eq!(b.config().block_size(), BlockSize::DEFAULT);
}

/// Dual-port window that counts mailbox reads.
struct MailboxProbe {
    inner: VecWindow,
    mailbox_reads: Cell<usize>,
}

impl WordWindow for MailboxProbe {
    fn len_words(&self) -> usize {
        self.inner.len_words()
    }

    fn read(&self, index: usize) -> Result<u32, WindowError> {
        if index == COMMAND_WORD_INDEX {
            self.mailbox_reads.set(self.mailbox_reads.get() + 1);
        }
        self.inner.read(index)
    }

    fn write(&mut self, index: usize, value: u32) -> Result<(), WindowError> {
        self.inner.write(index, value)
    }
}

#[test]
fn test_mailbox_read_exactly_once_per_dispatch() {
    let dp = MailboxProbe {
        inner: VecWindow::new(DP_WORDS),
        mailbox_reads: Cell::new(0),
    };
    let mut b = CentralDispatch::new(
        dp,
        VecWindow::new(4096),
        CountingReset::new(),
        TransferConfig::new(),
    )
    .unwrap();
    let mut line = MockInterruptLine::new();

    let words = [
        Command::BeginSpill.encode(),
        Command::BankReady(bank(1)).encode(),
        0xDEAD_BEEF,
        Command::EndSpill.encode(),
        Command::FlushBlock.encode(),
        Command::FlushBlock.encode(),
        Command::LastFlush.encode(),
    ];
    for (i, word) in words.into_iter().enumerate() {
        b.dual_port_mut().inner.words_mut()[COMMAND_WORD_INDEX] = word;
        line.raise();
        assert!(b.on_interrupt(&mut line).unwrap().is_some());
        assert_eq!(b.dual_port().mailbox_reads.get(), i + 1);
    }

    // Held line, no new edge
    assert!(b.on_interrupt(&mut line).unwrap().is_none());
    assert_eq!(b.dual_port().mailbox_reads.get(), words.len());
}

#[test]
fn test_empty_bank_on_full_bulk_is_not_counted_as_dropped() {
    let mut b = board_with(TransferConfig::new().with_bulk_limit(3));
    send(&mut b, Command::BeginSpill);
    let stored = deliver(&mut b, bank(1), &[4, 5], 0x1);
    assert!(matches!(stored.action, Action::Stored(ev) if ev.words == 3));

    let outcome = send(&mut b, Command::BankReady(bank(2)));

    assert_eq!(outcome.action, Action::EmptyBank { bank: bank(2) });
    assert_eq!(outcome.errors.as_slice(), &[ErrorCode::EmptyBank]);
    assert_eq!(b.stats().events_dropped, 0);
    assert_eq!(b.state(), RunState::BeamOn);

    // A real event on the full buffer still overflows
    let dropped = deliver(&mut b, bank(3), &[7], 0x3);
    assert_eq!(dropped.action, Action::Dropped { bank: bank(3) });
    assert_eq!(b.stats().events_dropped, 1);
}
