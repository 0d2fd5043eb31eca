//! Spill task: one FPGA interrupt, one dispatch
//!
//! # Pin assignment
//!
//! | Signal        | MCU pin | Notes                                    |
//! |---------------|---------|------------------------------------------|
//! | FPGA_IRQ_N    | PB7     | Active-low, held until the mailbox read  |
//!
//! The task owns the dispatcher and the line. It parks on the EXTI falling
//! edge, lets [`EdgeQualifier`] reject a wake-up that finds the line already
//! released, and runs [`CentralDispatch::on_interrupt`] to completion before
//! awaiting the next edge. Transfers therefore never overlap.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::AnyPin;
use platform::{EdgeQualifier, InterruptMode};
use transfer::{Action, CentralDispatch, Outcome};

use crate::hal::{MmioWindow, ScbReset};
use crate::heartbeat::{Heartbeat, HEARTBEAT};

/// Dispatcher wired to the board's memories and restart.
pub type Board = CentralDispatch<MmioWindow, MmioWindow, ScbReset>;

/// FPGA interrupt line as the dispatcher sees it.
pub type FpgaLine = EdgeQualifier<ExtiInput<'static, AnyPin>>;

/// Qualify the FPGA line: active-low, so a falling edge.
pub fn fpga_line(pin: ExtiInput<'static, AnyPin>) -> FpgaLine {
    EdgeQualifier::new(pin, InterruptMode::FallingEdge)
}

/// Run the dispatcher forever.
#[embassy_executor::task]
pub async fn spill_task(mut board: Board, mut line: FpgaLine) {
    defmt::info!("spill task started in {}", board.state());
    HEARTBEAT.signal(Heartbeat::capture(&board, 0));

    let mut dispatches: u32 = 0;
    loop {
        line.pin_mut().wait_for_falling_edge().await;

        match board.on_interrupt(&mut line) {
            Ok(Some(outcome)) => {
                dispatches = dispatches.saturating_add(1);
                log_outcome(&outcome);
                HEARTBEAT.signal(Heartbeat::capture(&board, dispatches));
            }
            Ok(None) => defmt::trace!("FPGA line released before dispatch"),
            // A window fault means the FMC mapping is broken; the host sees a
            // stale status word and will issue RESET.
            Err(e) => defmt::error!("dispatch failed: {}", e),
        }
    }
}

/// State transitions are logged by the dispatcher itself.
fn log_outcome(outcome: &Outcome) {
    match outcome.action {
        Action::Stored(event) => defmt::trace!("stored {}", event),
        Action::Flushed { words, remaining } => {
            defmt::debug!("flushed {} words, {} remaining", words, remaining);
        }
        action => defmt::debug!("{:#010x}: {}", outcome.word, action),
    }
    for code in &outcome.errors {
        defmt::warn!("reported {}", code);
    }
}
