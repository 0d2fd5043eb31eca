//! The command acceptance table is total: every pair it does not list is an
//! unexpected command that changes nothing.
#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use common::{bank, board_in, header, load_event, send};
use transfer::{Action, BlockSize, Command, ErrorCode, RunState};

fn every_command() -> [Command; 7] {
    [
        Command::Reset,
        Command::BeginSpill,
        Command::EndSpill,
        Command::FlushBlock,
        Command::LastFlush,
        Command::SetBlockSize(BlockSize::new(10).unwrap()),
        Command::BankReady(bank(2)),
    ]
}

/// ERROR_INCOMPLETE is passed through within one dispatch and cannot be
/// rested in, so it is covered by `RunState::accepts` unit tests only.
const REACHABLE: [RunState; 5] = [
    RunState::Ready,
    RunState::BeamOn,
    RunState::BeamOff,
    RunState::DrainWait,
    RunState::ErrorOverflow,
];

#[test]
fn test_fixture_reaches_each_state() {
    for state in REACHABLE {
        assert_eq!(board_in(state).state(), state);
    }
}

#[test]
fn test_unlisted_pairs_are_unexpected_and_inert() {
    for state in REACHABLE {
        for command in every_command() {
            if state.accepts(&command) {
                continue;
            }
            let mut b = board_in(state);
            load_event(&mut b, bank(2), &[5, 6], 0x2);
            let pending = b.pending();
            let stats = *b.stats();

            let outcome = send(&mut b, command);

            assert_eq!(outcome.action, Action::Rejected, "{command} in {state}");
            assert_eq!(outcome.errors.as_slice(), &[ErrorCode::UnexpectedCommand]);
            assert_eq!(b.state(), state, "{command} in {state}");
            assert_eq!(b.pending(), pending, "{command} in {state}");
            assert_ne!(header(&b, bank(2)), 0, "bank untouched by {command} in {state}");
            assert_eq!(b.stats().events_stored, stats.events_stored);
            assert_eq!(b.latched_error(), ErrorCode::UnexpectedCommand);
        }
    }
}

#[test]
fn test_listed_pairs_are_never_unexpected() {
    for state in REACHABLE {
        for command in every_command() {
            if !state.accepts(&command) {
                continue;
            }
            let mut b = board_in(state);
            let outcome = send(&mut b, command);
            assert!(
                !outcome.reported(ErrorCode::UnexpectedCommand),
                "{command} in {state}"
            );
        }
    }
}

#[test]
fn test_expected_transitions() {
    let cases = [
        (RunState::Ready, Command::BeginSpill, RunState::BeamOn),
        (RunState::BeamOn, Command::EndSpill, RunState::BeamOff),
        (RunState::ErrorOverflow, Command::EndSpill, RunState::BeamOff),
        (RunState::BeamOff, Command::FlushBlock, RunState::DrainWait),
        (RunState::BeamOff, Command::LastFlush, RunState::Ready),
        (RunState::BeamOff, Command::BeginSpill, RunState::Ready),
        (RunState::DrainWait, Command::BeginSpill, RunState::Ready),
    ];
    for (from, command, to) in cases {
        let mut b = board_in(from);
        let outcome = send(&mut b, command);
        assert_eq!((outcome.from, outcome.to), (from, to), "{command}");
        assert_eq!(b.state(), to);
    }
}

#[test]
fn test_reset_and_block_size_accepted_everywhere() {
    for state in REACHABLE {
        let mut b = board_in(state);
        let outcome = send(&mut b, Command::SetBlockSize(BlockSize::new(77).unwrap()));
        assert_eq!(b.state(), state);
        assert!(outcome.errors.is_empty());
        assert_eq!(b.config().block_size().words(), 77);

        let outcome = send(&mut b, Command::Reset);
        assert_eq!(outcome.action, Action::Restarted);
        assert_eq!(b.state(), RunState::Ready);
        assert_eq!(b.system_reset().count(), 1);
    }
}
