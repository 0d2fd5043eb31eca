//! Criterion benchmarks for the spill data path.
//!
//! Run: cargo bench -p transfer --features std --bench spill_throughput
//!
//! Results show:
//!   beam_on/*:  bank drain into the bulk buffer per event size,
//!               with and without zero suppression
//!   beam_off/*: one full spill handed back in blocks of varying size

#![allow(
    clippy::unwrap_used,              // benchmark helpers use unwrap for brevity
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation, // event sizes stay below the bank capacity
    missing_docs,                     // criterion_group! macro generates undocumented items
)]

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use platform::memory_map::{
    BANK_EVENT_ID_OFFSET, BANK_PAYLOAD_OFFSET, DP_WORDS, WORDS_PER_BANK,
};
use platform::mocks::VecWindow;
use transfer::{
    Action, BankHeader, BankIndex, BlockSize, CentralDispatch, Command, CountingReset, TransferConfig,
};

type Board = CentralDispatch<VecWindow, VecWindow, CountingReset>;

const BULK_WORDS: usize = 1 << 20;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn board(config: TransferConfig) -> Board {
    CentralDispatch::new(
        VecWindow::new(DP_WORDS),
        VecWindow::new(BULK_WORDS),
        CountingReset::new(),
        config,
    )
    .unwrap()
}

/// Sparse TDC-like payload: roughly one word in four is a hit.
fn payload(words: usize) -> Vec<u32> {
    (0..words as u32)
        .map(|i| if i % 4 == 0 { 0x0100_0000 | i } else { 0 })
        .collect()
}

fn load(board: &mut Board, bank: BankIndex, payload: &[u32]) {
    let base = bank.get() * WORDS_PER_BANK;
    let words = board.dual_port_mut().words_mut();
    let start = base + BANK_PAYLOAD_OFFSET;
    words[start..start + payload.len()].copy_from_slice(payload);
    words[base + BANK_EVENT_ID_OFFSET] = bank.raw();
    words[base] = BankHeader::for_words(payload.len() as u32).raw();
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_beam_on(c: &mut Criterion) {
    let mut group = c.benchmark_group("beam_on");
    group.measurement_time(Duration::from_secs(5));

    for words in [64usize, 256, 1020] {
        let data = payload(words);
        group.throughput(Throughput::Elements(words as u64));
        for suppress in [true, false] {
            let id = if suppress { "suppressed" } else { "raw" };
            group.bench_with_input(BenchmarkId::new(id, words), &data, |b, data| {
                let mut board = board(TransferConfig::new().with_zero_suppression(suppress));
                let bank = BankIndex::new(0).unwrap();
                b.iter(|| {
                    // RESET returns to READY; the notification starts a spill
                    board.dispatch(Command::Reset.encode()).unwrap();
                    load(&mut board, bank, data);
                    board.dispatch(Command::BankReady(bank).encode()).unwrap()
                });
            });
        }
    }
    group.finish();
}

fn bench_beam_off(c: &mut Criterion) {
    let mut group = c.benchmark_group("beam_off");
    group.measurement_time(Duration::from_secs(5));

    let data = vec![0xABCDu32; 1020];
    for block in [300u32, 4096, 0x7FFC] {
        group.bench_with_input(BenchmarkId::new("block", block), &block, |b, &block| {
            let config = TransferConfig::new().with_block_size(BlockSize::new(block).unwrap());
            let mut board = board(config);
            b.iter(|| {
                board.dispatch(Command::BeginSpill.encode()).unwrap();
                for n in 0..64 {
                    let bank = BankIndex::new(n % 16).unwrap();
                    load(&mut board, bank, &data);
                    board.dispatch(Command::BankReady(bank).encode()).unwrap();
                }
                board.dispatch(Command::EndSpill.encode()).unwrap();
                loop {
                    let outcome = board.dispatch(Command::FlushBlock.encode()).unwrap();
                    match outcome.action {
                        Action::Flushed { remaining, .. } if remaining > 0 => {}
                        _ => break,
                    }
                }
                board.dispatch(Command::LastFlush.encode()).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_beam_on, bench_beam_off);
criterion_main!(benches);
