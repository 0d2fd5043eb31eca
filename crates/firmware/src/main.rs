//! Front-end transfer controller - Main Entry Point
//!
//! Hardware-only entry point for STM32H743ZI.

#![no_std]
#![no_main]

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32::exti::{Channel, ExtiInput};
use embassy_stm32::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};
use platform::config::{APP_NAME, APP_VERSION};
use transfer::{CentralDispatch, TransferConfig};

use firmware::boot::{self, FmcConfig};
use firmware::hal::{MmioWindow, ScbReset};
use firmware::heartbeat::HEARTBEAT;
use firmware::spill_task::{fpga_line, spill_task};

// Panic handler
use panic_probe as _;

/// Halt with the fault logged; the watchdog restarts the board.
async fn halt(reason: &'static str) -> ! {
    defmt::error!("boot halted: {=str}", reason);
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // Step 1: MPU BEFORE embassy_stm32::init() enables the D-cache.
    // See: firmware::boot::BOOT_SEQUENCE_STEPS for the full ordered sequence.
    let mpu = boot::hardware::apply_mpu_config_from_peripherals();

    defmt::info!("{=str} v{=str}", APP_NAME, APP_VERSION);

    // Step 2: clocks (PLL2R = FMC kernel clock), D-cache
    let p = embassy_stm32::init(boot::build_embassy_config());

    // The watchdog is armed before any fallible step so a halted boot resets
    let mut watchdog =
        embassy_stm32::wdg::IndependentWatchdog::new(p.IWDG1, boot::watchdog_timeout_us());
    watchdog.unleash();
    defmt::info!("IWDG armed: timeout={=u32}ms", boot::WATCHDOG_TIMEOUT_MS);

    if let Err(e) = mpu {
        defmt::error!("MPU config rejected: {}", e);
        halt("MPU").await;
    }

    // Step 3: FMC
    let fmc = match FmcConfig::front_end() {
        Ok(fmc) => fmc,
        Err(e) => {
            defmt::error!("FMC config rejected: {}", e);
            halt("FMC config").await
        }
    };
    // SAFETY: once, after embassy init, before any window exists
    if let Err(e) = unsafe { boot::hardware::init_fmc(&fmc) } {
        defmt::error!("FMC bring-up failed: {}", e);
        halt("FMC").await;
    }

    // Step 4: transfer core over the two FMC windows
    // SAFETY: FMC banks configured above; these are the only windows
    let (Some(dp), Some(bulk)) = (unsafe { MmioWindow::dual_port() }, unsafe {
        MmioWindow::bulk_buffer()
    }) else {
        halt("window").await
    };
    let board = match CentralDispatch::new(dp, bulk, ScbReset, TransferConfig::default()) {
        Ok(board) => board,
        Err(e) => {
            defmt::error!("transfer core init failed: {}", e);
            halt("transfer core").await
        }
    };

    // Step 5: spill task on the FPGA interrupt line (PB7, EXTI7)
    let irq: ExtiInput<'static, AnyPin> =
        ExtiInput::new(Input::new(p.PB7, Pull::Up).degrade(), p.EXTI7.degrade());
    if spawner.spawn(spill_task(board, fpga_line(irq))).is_err() {
        halt("spawn").await;
    }

    // Heartbeat: log the latest snapshot and feed the watchdog. If the
    // executor stalls the watchdog resets the board.
    let mut last = None;
    loop {
        Timer::after(Duration::from_millis(boot::HEARTBEAT_PERIOD_MS)).await;
        if let Some(hb) = HEARTBEAT.try_take() {
            last = Some(hb);
        }
        match &last {
            Some(hb) if hb.is_degraded() => defmt::warn!("heartbeat {}", hb),
            Some(hb) => defmt::debug!("heartbeat {}", hb),
            None => defmt::debug!("heartbeat: no dispatch yet"),
        }
        watchdog.pet();
    }
}
