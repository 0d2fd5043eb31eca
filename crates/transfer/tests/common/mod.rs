//! Shared board fixture for integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use platform::memory_map::{
    BANK_EVENT_ID_OFFSET, BANK_PAYLOAD_OFFSET, DP_WORDS, STATUS_WORD_INDEX, WORDS_PER_BANK,
};
use platform::mocks::VecWindow;
use transfer::{
    BankHeader, BankIndex, CentralDispatch, Command, CountingReset, Outcome, RunState,
    TransferConfig,
};

pub type Board = CentralDispatch<VecWindow, VecWindow, CountingReset>;

pub const BULK_WORDS: usize = 64 * 1024;

pub fn board() -> Board {
    board_with(TransferConfig::new())
}

pub fn board_with(config: TransferConfig) -> Board {
    CentralDispatch::new(
        VecWindow::new(DP_WORDS),
        VecWindow::new(BULK_WORDS),
        CountingReset::new(),
        config,
    )
    .unwrap()
}

pub fn bank(n: u32) -> BankIndex {
    BankIndex::new(n).unwrap()
}

/// Write an event into `bank` the way the FPGA does: payload, eventId,
/// header last.
pub fn load_event(board: &mut Board, bank: BankIndex, payload: &[u32], event_id: u32) {
    let base = bank.get() * WORDS_PER_BANK;
    let words = board.dual_port_mut().words_mut();
    let start = base + BANK_PAYLOAD_OFFSET;
    words[start..start + payload.len()].copy_from_slice(payload);
    words[base + BANK_EVENT_ID_OFFSET] = event_id;
    words[base] = BankHeader::for_words(payload.len() as u32).raw();
}

pub fn send(board: &mut Board, command: Command) -> Outcome {
    board.dispatch(command.encode()).unwrap()
}

/// Load an event and notify it.
pub fn deliver(board: &mut Board, bank: BankIndex, payload: &[u32], event_id: u32) -> Outcome {
    load_event(board, bank, payload, event_id);
    send(board, Command::BankReady(bank))
}

pub fn header(board: &Board, bank: BankIndex) -> u32 {
    board.dual_port().words()[bank.get() * WORDS_PER_BANK]
}

pub fn status(board: &Board) -> u32 {
    board.dual_port().words()[STATUS_WORD_INDEX]
}

/// Fresh board driven into `state`.
pub fn board_in(state: RunState) -> Board {
    let mut b = match state {
        RunState::ErrorOverflow => board_with(TransferConfig::new().with_bulk_limit(0)),
        _ => board(),
    };
    match state {
        RunState::Ready | RunState::ErrorIncomplete => {}
        RunState::BeamOn => {
            send(&mut b, Command::BeginSpill);
        }
        RunState::BeamOff => {
            send(&mut b, Command::BeginSpill);
            send(&mut b, Command::EndSpill);
        }
        RunState::DrainWait => {
            send(&mut b, Command::BeginSpill);
            send(&mut b, Command::EndSpill);
            send(&mut b, Command::FlushBlock);
        }
        RunState::ErrorOverflow => {
            send(&mut b, Command::BeginSpill);
            deliver(&mut b, bank(0), &[1], 0);
        }
    }
    b
}
