//! Hardware boot sequence for the front-end transfer controller.
//!
//! Initialization order (MUST be respected, later steps depend on earlier):
//!   1. Configure MPU (dual-port strongly ordered, bulk SDRAM cached)
//!   2. Embassy init: clocks (PLL2R feeds the FMC), D-cache on
//!   3. FMC: dual-port SRAM bank, then bulk SDRAM power-up
//!   4. Watchdog
//!   5. Transfer core init, then the spill task
//!
//! # Safety
//! These steps must run from privileged mode before any task starts.

use platform::fmc::{FmcError, SdramRegisters, SramTiming};
use platform::mpu::{MpuApplier, MpuError};

/// Ordered list of boot sequence steps for documentation and testing.
///
/// # Correctness Invariants
///
/// - MPU before D-cache: a cached dual-port would serve stale bank headers
///   and hold cleared headers back from the FPGA.
/// - Clocks before FMC: the SDRAM timings assume SDCLK = PLL2R / 2.
/// - FMC before the transfer core: `CentralDispatch::new` clears every bank
///   header and publishes the status word through the dual-port.
/// - Transfer core before the spill task: no interrupt is served until the
///   board is in READY.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. MPU: dual-port strongly ordered, bulk SDRAM write-back",
    "2. Embassy init: PLL1 400 MHz sysclk, PLL2R 200 MHz FMC kernel clock, D-cache on",
    "3. FMC: dual-port SRAM bank 1, bulk SDRAM power-up and refresh timer",
    "4. Watchdog: IWDG armed, fed by the heartbeat loop",
    "5. Transfer core: headers cleared, READY status published",
    "6. Spill task: await FPGA interrupt line",
];

/// IWDG timeout in milliseconds.
pub const WATCHDOG_TIMEOUT_MS: u32 = 8_000;

/// Heartbeat (and watchdog feed) period in milliseconds.
pub const HEARTBEAT_PERIOD_MS: u64 = 1_000;

const _: () = assert!(HEARTBEAT_PERIOD_MS * 4 <= WATCHDOG_TIMEOUT_MS as u64);

/// IWDG timeout in microseconds, as `IndependentWatchdog::new` takes it.
pub const fn watchdog_timeout_us() -> u32 {
    WATCHDOG_TIMEOUT_MS.saturating_mul(1_000)
}

/// `(RBAR, RASR)` pairs for the front-end MPU configuration.
///
/// | Index | Region    | Base        | Size   | RBAR        | RASR        |
/// |-------|-----------|-------------|--------|-------------|-------------|
/// | 0     | Dual-port | 0x6000_0000 | 128 KB | 0x6000_0010 | 0x1304_0021 |
/// | 1     | Bulk      | 0xC000_0000 |  32 MB | 0xC000_0011 | 0x1303_0031 |
pub fn mpu_register_pairs() -> Result<[(u32, u32); 2], MpuError> {
    MpuApplier::front_end_register_pairs()
}

/// FMC register values for both shared memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FmcConfig {
    /// FMC_BCR1 (dual-port)
    pub bcr1: u32,
    /// FMC_BTR1 (dual-port)
    pub btr1: u32,
    /// SDRAM bank 1 (bulk buffer)
    pub sdram: SdramRegisters,
}

impl FmcConfig {
    /// Values for the front-end board.
    pub fn front_end() -> Result<Self, FmcError> {
        Ok(Self {
            bcr1: SramTiming::bcr1(),
            btr1: SramTiming::dual_port().btr1()?,
            sdram: SdramRegisters::bulk_buffer()?,
        })
    }
}

/// Embassy configuration: clocks for the core and the FMC.
///
/// Always call `embassy_stm32::init(build_embassy_config())` from `main.rs`.
/// `Config::default()` leaves PLL2 off and the FMC without a kernel clock.
#[cfg(feature = "hardware")]
pub fn build_embassy_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();

    config.rcc.hsi = Some(HSIPrescaler::DIV1); // 64 MHz
    config.rcc.csi = true;

    // HSI / 4 = 16 MHz x 50 = 800 MHz VCO; P / 2 = 400 MHz sysclk
    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL50,
        divp: Some(PllDiv::DIV2),
        divq: None,
        divr: None,
    });

    // HSI / 8 = 8 MHz x 100 = 800 MHz VCO; R / 4 = 200 MHz FMC kernel clock
    config.rcc.pll2 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV8,
        mul: PllMul::MUL100,
        divp: None,
        divq: None,
        divr: Some(PllDiv::DIV4),
    });

    config.rcc.sys = Sysclk::PLL1_P; // 400 MHz
    config.rcc.ahb_pre = AHBPrescaler::DIV2; // 200 MHz
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.apb3_pre = APBPrescaler::DIV2;
    config.rcc.apb4_pre = APBPrescaler::DIV2;
    config.rcc.voltage_scale = VoltageScale::Scale1;

    config
}

// ── Hardware-only init ────────────────────────────────────────────────────────
//
// Actual register writes. Host tests (cargo test -p firmware) never compile
// this module.

#[cfg(feature = "hardware")]
pub mod hardware {
    //! Register write implementations (`--features hardware`).

    // Address and field arithmetic on fixed RM0433 constants, pin < 16.
    #![allow(clippy::arithmetic_side_effects)]

    use platform::fmc::{
        offset, FmcError, Port, FMC_ALTERNATE_FUNCTION, FMC_BASE, FMC_PINS, FMCSEL_PLL2R,
        PMCR_PC2SO_PC3SO, RCC_AHB3ENR, RCC_AHB3ENR_FMCEN, RCC_BASE, RCC_D1CCIPR, SDSR_BUSY,
        SYSCFG_PMCR,
    };
    use platform::mpu::MpuError;

    use super::{mpu_register_pairs, FmcConfig};

    /// RCC_AHB4ENR offset (GPIO clocks).
    const RCC_AHB4ENR: usize = 0xE0;
    /// RCC_APB4ENR offset; SYSCFGEN is bit 1.
    const RCC_APB4ENR: usize = 0xF4;
    /// Polls of FMC_SDSR before giving up on a command.
    const SDRAM_BUSY_POLLS: u32 = 10_000;

    /// FMC bring-up failure.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
    pub enum FmcInitError {
        /// Register values could not be computed.
        Config(FmcError),
        /// The SDRAM controller stayed busy after a command.
        SdramBusy,
    }

    impl From<FmcError> for FmcInitError {
        fn from(e: FmcError) -> Self {
            Self::Config(e)
        }
    }

    /// Read-modify-write of a 32-bit peripheral register.
    ///
    /// # Safety
    ///
    /// `addr` must be a valid peripheral register for which the change is
    /// sound at this point of boot.
    unsafe fn modify(addr: usize, clear: u32, set: u32) {
        let reg = addr as *mut u32;
        // SAFETY: forwarded to the caller
        unsafe { reg.write_volatile((reg.read_volatile() & !clear) | set) };
    }

    /// # Safety
    ///
    /// As [`modify`].
    unsafe fn write(addr: usize, value: u32) {
        // SAFETY: forwarded to the caller
        unsafe { (addr as *mut u32).write_volatile(value) };
    }

    /// Apply the front-end MPU configuration.
    ///
    /// # Safety
    ///
    /// - Must be called before enabling D-cache.
    /// - Must be called from privileged mode, before any interrupt handler
    ///   runs.
    pub unsafe fn apply_mpu_config(mpu: &mut cortex_m::peripheral::MPU) -> Result<(), MpuError> {
        let pairs = mpu_register_pairs()?;

        // Disable before reconfiguring (ARM DDI0489F §B3.5.1)
        // SAFETY: boot context, no access depends on the MPU yet
        unsafe { mpu.ctrl.write(0) };

        // RBAR has VALID=1, so writing it selects the region slot
        for (rbar, rasr) in pairs {
            // SAFETY: values computed and validated by platform::mpu
            unsafe {
                mpu.rbar.write(rbar);
                mpu.rasr.write(rasr);
            }
        }

        // ENABLE | PRIVDEFENA: unmapped regions keep the default map
        // SAFETY: regions above are complete
        unsafe { mpu.ctrl.write(0b101) };

        cortex_m::asm::dsb();
        cortex_m::asm::isb();
        Ok(())
    }

    /// Zero-argument MPU entry point for `main.rs`; call first.
    pub fn apply_mpu_config_from_peripherals() -> Result<(), MpuError> {
        // SAFETY: called once at boot before embassy_stm32::init() takes the
        // Cortex-M peripherals; nothing else holds them yet.
        let mut cp = unsafe { cortex_m::Peripherals::steal() };
        // SAFETY: boot context, D-cache not yet enabled
        unsafe { apply_mpu_config(&mut cp.MPU) }
    }

    /// Bring up the FMC: clocks, pins, dual-port SRAM bank, bulk SDRAM.
    ///
    /// # Safety
    ///
    /// Call once, after `embassy_stm32::init(build_embassy_config())` and
    /// before any [`crate::hal::MmioWindow`] over either memory is created.
    pub unsafe fn init_fmc(config: &FmcConfig) -> Result<(), FmcInitError> {
        // SAFETY (whole body): RM0433 register addresses from platform::fmc,
        // written once during single-threaded boot.
        unsafe {
            // Kernel clock from PLL2R, FMC and SYSCFG clocks on
            modify(RCC_BASE + RCC_D1CCIPR, 0b11, FMCSEL_PLL2R);
            modify(RCC_BASE + RCC_AHB3ENR, 0, RCC_AHB3ENR_FMCEN);
            modify(RCC_BASE + RCC_APB4ENR, 0, 1 << 1);

            // Close the PC2_C / PC3_C analog switches
            modify(SYSCFG_PMCR, PMCR_PC2SO_PC3SO, 0);

            let mut ports = 0u32;
            for p in &FMC_PINS {
                ports |= p.port.clock_enable_bit();
            }
            modify(RCC_BASE + RCC_AHB4ENR, 0, ports);
            cortex_m::asm::dsb();

            for p in &FMC_PINS {
                configure_pin(p.port, u32::from(p.pin));
            }

            // Dual-port: FMC_BCR1 carries FMCEN, so it goes last
            write(FMC_BASE + offset::BTR1, config.btr1);
            write(FMC_BASE + offset::BCR1, config.bcr1);

            // Bulk SDRAM
            let sdram = &config.sdram;
            write(FMC_BASE + offset::SDCR1, sdram.sdcr);
            write(FMC_BASE + offset::SDTR1, sdram.sdtr);
            for (i, command) in sdram.init_sequence().into_iter().enumerate() {
                wait_sdram_idle()?;
                write(FMC_BASE + offset::SDCMR, command.sdcmr());
                if i == 0 {
                    // >= 100 us of stable SDCLK before the first precharge
                    cortex_m::asm::delay(400_000_000 / 10_000);
                }
            }
            wait_sdram_idle()?;
            write(FMC_BASE + offset::SDRTR, sdram.sdrtr);
        }
        cortex_m::asm::dsb();
        defmt::info!(
            "FMC up: BCR1={=u32:#010x} SDCR1={=u32:#010x} SDTR1={=u32:#010x}",
            config.bcr1,
            config.sdram.sdcr,
            config.sdram.sdtr
        );
        Ok(())
    }

    /// Alternate function 12, very high speed, no pull.
    ///
    /// # Safety
    ///
    /// Port clock enabled; the pin is not used by anything else.
    unsafe fn configure_pin(port: Port, pin: u32) {
        let base = port.base();
        let two_bits = 0b11 << (pin * 2);
        // SAFETY: forwarded to the caller
        unsafe {
            modify(base, two_bits, 0b10 << (pin * 2)); // MODER = AF
            modify(base + 0x08, 0, two_bits); // OSPEEDR = very high
            modify(base + 0x0C, two_bits, 0); // PUPDR = none
            let (afr, shift) = if pin < 8 {
                (base + 0x20, pin * 4)
            } else {
                (base + 0x24, (pin - 8) * 4)
            };
            modify(afr, 0xF << shift, FMC_ALTERNATE_FUNCTION << shift);
        }
    }

    fn wait_sdram_idle() -> Result<(), FmcInitError> {
        for _ in 0..SDRAM_BUSY_POLLS {
            // SAFETY: FMC_SDSR is a read-only status register
            let status = unsafe { ((FMC_BASE + offset::SDSR) as *const u32).read_volatile() };
            if status & SDSR_BUSY == 0 {
                return Ok(());
            }
        }
        Err(FmcInitError::SdramBusy)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
