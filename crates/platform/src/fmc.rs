//! FMC register values for the two shared memories
//!
//! Both memories the transfer core touches hang off the STM32H743 Flexible
//! Memory Controller:
//!
//! | FMC bank            | Device                     | Base        | Use          |
//! |---------------------|----------------------------|-------------|--------------|
//! | NOR/PSRAM bank 1    | FPGA dual-port (async SRAM)| 0x6000_0000 | DP window    |
//! | SDRAM bank 1        | W9825G6KH-6, 16M × 16      | 0xC000_0000 | Bulk buffer  |
//!
//! Everything here is pure math over datasheet numbers. The firmware boot
//! code writes the values (see `firmware::boot::hardware::init_fmc`).
//!
//! # Clocks
//!
//! FMC kernel clock = PLL2R = 200 MHz. The SRAM bank counts in kernel clock
//! cycles (5 ns). The SDRAM controller runs SDCLK = kernel / 2 = 100 MHz.
//!
//! # Bus width
//!
//! The LQFP144 package has no FMC D16..D31 balls, so both devices sit on the
//! 16-bit data bus. The FMC splits each 32-bit dual-port access into two
//! half-word cycles, low half first.
//!
//! # References
//!
//! - STM32H7 RM0433 §22.7.6 (FMC_BCRx / FMC_BTRx), §22.9.4 (FMC_SDCRx,
//!   FMC_SDTRx, FMC_SDCMR, FMC_SDRTR), §22.9.3 (SDRAM init sequence)
//! - W9825G6KH-6 datasheet, AC characteristics (CL=3, 3.3 V)

// Register packing: every shifted value is masked or range-checked first.
#![allow(clippy::arithmetic_side_effects)]

use crate::memory_map::BULK_SIZE_BYTES;

/// FMC kernel clock in Hz (PLL2R).
pub const FMC_KERNEL_HZ: u32 = 200_000_000;

/// SDRAM clock in Hz (kernel clock / 2).
pub const SDCLK_HZ: u32 = FMC_KERNEL_HZ / 2;

/// FMC register block base address.
pub const FMC_BASE: usize = 0x5200_4000;

/// Register offsets from [`FMC_BASE`].
pub mod offset {
    /// SRAM/NOR chip-select control, bank 1
    pub const BCR1: usize = 0x000;
    /// SRAM/NOR chip-select timing, bank 1
    pub const BTR1: usize = 0x004;
    /// SDRAM control, bank 1
    pub const SDCR1: usize = 0x140;
    /// SDRAM timing, bank 1
    pub const SDTR1: usize = 0x148;
    /// SDRAM command mode
    pub const SDCMR: usize = 0x150;
    /// SDRAM refresh timer
    pub const SDRTR: usize = 0x154;
    /// SDRAM status
    pub const SDSR: usize = 0x158;
}

/// FMC_SDSR busy flag.
pub const SDSR_BUSY: u32 = 1 << 5;

/// Convert `ns` to clock cycles at `hz`, rounding up. Never below 1.
#[must_use]
// ns < 2^32 and hz < 2^32, so ns * hz + 999_999_999 < 2^64
#[allow(clippy::cast_possible_truncation)]
pub const fn ns_to_cycles(ns: u32, hz: u32) -> u32 {
    let cycles = (ns as u64 * hz as u64 + 999_999_999) / 1_000_000_000;
    if cycles == 0 {
        1
    } else if cycles > u32::MAX as u64 {
        u32::MAX
    } else {
        cycles as u32
    }
}

/// Register value out of range for its FMC field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FmcError {
    /// A cycle count does not fit its register field.
    FieldOverflow {
        /// Field name, e.g. `"TRC"`
        field: &'static str,
        /// Requested cycle count
        cycles: u32,
    },
    /// Device geometry disagrees with the bulk buffer size.
    CapacityMismatch {
        /// Bytes addressed by the geometry
        device_bytes: u32,
    },
}

impl core::fmt::Display for FmcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FieldOverflow { field, cycles } => {
                write!(f, "{cycles} cycles do not fit FMC field {field}")
            }
            Self::CapacityMismatch { device_bytes } => write!(
                f,
                "SDRAM geometry addresses {device_bytes} bytes, bulk buffer needs {BULK_SIZE_BYTES}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FmcError {}

/// Encode `cycles` as a `cycles - 1` field of `max` cycles at bit `shift`.
fn field(name: &'static str, cycles: u32, max: u32, shift: u32) -> Result<u32, FmcError> {
    if cycles == 0 || cycles > max {
        return Err(FmcError::FieldOverflow { field: name, cycles });
    }
    Ok(cycles.saturating_sub(1) << shift)
}

// ---------------------------------------------------------------------------
// Clocks and pins
// ---------------------------------------------------------------------------

/// RCC register block base address.
pub const RCC_BASE: usize = 0x5802_4400;

/// RCC_D1CCIPR offset; FMCSEL in bits 1:0.
pub const RCC_D1CCIPR: usize = 0x4C;

/// FMCSEL value selecting PLL2R.
pub const FMCSEL_PLL2R: u32 = 0b10;

/// RCC_AHB3ENR offset; FMCEN is bit 12.
pub const RCC_AHB3ENR: usize = 0xD4;

/// RCC_AHB3ENR FMC clock enable.
pub const RCC_AHB3ENR_FMCEN: u32 = 1 << 12;

/// GPIOA register block; ports follow every 0x400 bytes.
pub const GPIO_BASE: usize = 0x5802_0000;

/// Alternate function number of every FMC signal on this part.
pub const FMC_ALTERNATE_FUNCTION: u32 = 12;

/// GPIO port letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// GPIOC
    C,
    /// GPIOD
    D,
    /// GPIOE
    E,
    /// GPIOF
    F,
    /// GPIOG
    G,
}

impl Port {
    /// Register block base address of this port.
    #[must_use]
    pub const fn base(self) -> usize {
        let index = match self {
            Self::C => 2,
            Self::D => 3,
            Self::E => 4,
            Self::F => 5,
            Self::G => 6,
        };
        GPIO_BASE + index * 0x400
    }

    /// RCC_AHB4ENR clock enable bit of this port.
    #[must_use]
    pub const fn clock_enable_bit(self) -> u32 {
        match self {
            Self::C => 1 << 2,
            Self::D => 1 << 3,
            Self::E => 1 << 4,
            Self::F => 1 << 5,
            Self::G => 1 << 6,
        }
    }
}

/// One FMC signal ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FmcPin {
    /// Port
    pub port: Port,
    /// Pin number, 0..=15
    pub pin: u8,
    /// FMC signal name
    pub signal: &'static str,
}

const fn pin(port: Port, pin: u8, signal: &'static str) -> FmcPin {
    FmcPin { port, pin, signal }
}

/// FMC balls used by the dual-port SRAM bank and the bulk SDRAM.
///
/// PC2_C and PC3_C are analog-switch balls: `SYSCFG_PMCR.PC2SO/PC3SO` must be
/// cleared before they carry SDNE0/SDCKE0.
pub const FMC_PINS: [FmcPin; 43] = [
    // Data bus, shared
    pin(Port::D, 14, "D0"),
    pin(Port::D, 15, "D1"),
    pin(Port::D, 0, "D2"),
    pin(Port::D, 1, "D3"),
    pin(Port::E, 7, "D4"),
    pin(Port::E, 8, "D5"),
    pin(Port::E, 9, "D6"),
    pin(Port::E, 10, "D7"),
    pin(Port::E, 11, "D8"),
    pin(Port::E, 12, "D9"),
    pin(Port::E, 13, "D10"),
    pin(Port::E, 14, "D11"),
    pin(Port::E, 15, "D12"),
    pin(Port::D, 8, "D13"),
    pin(Port::D, 9, "D14"),
    pin(Port::D, 10, "D15"),
    // Address bus; A14/A15 double as SDRAM BA0/BA1
    pin(Port::F, 0, "A0"),
    pin(Port::F, 1, "A1"),
    pin(Port::F, 2, "A2"),
    pin(Port::F, 3, "A3"),
    pin(Port::F, 4, "A4"),
    pin(Port::F, 5, "A5"),
    pin(Port::F, 12, "A6"),
    pin(Port::F, 13, "A7"),
    pin(Port::F, 14, "A8"),
    pin(Port::F, 15, "A9"),
    pin(Port::G, 0, "A10"),
    pin(Port::G, 1, "A11"),
    pin(Port::G, 2, "A12"),
    pin(Port::G, 3, "A13"),
    pin(Port::G, 4, "A14"),
    pin(Port::G, 5, "A15"),
    // Byte lanes
    pin(Port::E, 0, "NBL0"),
    pin(Port::E, 1, "NBL1"),
    // Dual-port SRAM control
    pin(Port::D, 7, "NE1"),
    pin(Port::D, 4, "NOE"),
    pin(Port::D, 5, "NWE"),
    // SDRAM control
    pin(Port::G, 8, "SDCLK"),
    pin(Port::G, 15, "SDNCAS"),
    pin(Port::F, 11, "SDNRAS"),
    pin(Port::C, 0, "SDNWE"),
    pin(Port::C, 2, "SDNE0"),
    pin(Port::C, 3, "SDCKE0"),
];

/// SYSCFG_PMCR address.
pub const SYSCFG_PMCR: usize = 0x5800_0404;

/// SYSCFG_PMCR analog switch bits for PC2_C and PC3_C (set = open).
pub const PMCR_PC2SO_PC3SO: u32 = (1 << 26) | (1 << 27);

// ---------------------------------------------------------------------------
// Dual-port memory: asynchronous SRAM, mode 1
// ---------------------------------------------------------------------------

/// Access timing for the FPGA dual-port in kernel clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SramTiming {
    /// ADDSET: address setup
    pub address_setup: u32,
    /// DATAST: data phase
    pub data_phase: u32,
    /// BUSTURN: bus turnaround
    pub bus_turnaround: u32,
}

impl SramTiming {
    /// Dual-port timing: 10 ns setup, 25 ns data, 5 ns turnaround.
    pub const fn dual_port() -> Self {
        Self {
            address_setup: ns_to_cycles(10, FMC_KERNEL_HZ),
            data_phase: ns_to_cycles(25, FMC_KERNEL_HZ),
            bus_turnaround: ns_to_cycles(5, FMC_KERNEL_HZ),
        }
    }

    /// FMC_BCR1: bank enabled, SRAM, 16-bit bus, writes enabled, FMC on.
    pub const fn bcr1() -> u32 {
        const FMCEN: u32 = 1 << 31;
        const WREN: u32 = 1 << 12;
        const MWID_16: u32 = 0b01 << 4;
        const MBKEN: u32 = 1;
        FMCEN | WREN | MWID_16 | MBKEN
    }

    /// FMC_BTR1 for this timing. ADDSET/BUSTURN are raw counts, DATAST
    /// likewise; ACCMOD stays mode A.
    pub fn btr1(&self) -> Result<u32, FmcError> {
        if self.address_setup > 15 {
            return Err(FmcError::FieldOverflow {
                field: "ADDSET",
                cycles: self.address_setup,
            });
        }
        if self.data_phase == 0 || self.data_phase > 255 {
            return Err(FmcError::FieldOverflow {
                field: "DATAST",
                cycles: self.data_phase,
            });
        }
        if self.bus_turnaround > 15 {
            return Err(FmcError::FieldOverflow {
                field: "BUSTURN",
                cycles: self.bus_turnaround,
            });
        }
        Ok(self.address_setup | (self.data_phase << 8) | (self.bus_turnaround << 16))
    }
}

// ---------------------------------------------------------------------------
// Bulk buffer: SDRAM
// ---------------------------------------------------------------------------

/// SDRAM device organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdramGeometry {
    /// Column address bits (8..=11)
    pub column_bits: u32,
    /// Row address bits (11..=13)
    pub row_bits: u32,
    /// Internal banks (2 or 4)
    pub banks: u32,
    /// Data bus width in bits (8, 16 or 32)
    pub bus_width: u32,
}

impl SdramGeometry {
    /// W9825G6KH-6: 4 banks × 8192 rows × 512 columns × 16 bits.
    pub const W9825G6KH6: Self = Self {
        column_bits: 9,
        row_bits: 13,
        banks: 4,
        bus_width: 16,
    };

    /// Bytes addressed by this geometry.
    #[must_use]
    pub const fn capacity_bytes(&self) -> u32 {
        let cells = match 1u32.checked_shl(self.column_bits.saturating_add(self.row_bits)) {
            Some(cells) => cells,
            None => 0,
        };
        cells
            .saturating_mul(self.banks)
            .saturating_mul(self.bus_width / 8)
    }

    /// Rows refreshed per refresh period.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        match 1u32.checked_shl(self.row_bits) {
            Some(rows) => rows,
            None => 0,
        }
    }
}

/// SDRAM timing in SDCLK cycles (1-based; the register stores `n - 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdramTiming {
    /// tMRD: load mode register to active
    pub mode_register_to_active: u32,
    /// tXSR: exit self-refresh to active
    pub exit_self_refresh: u32,
    /// tRAS: active to precharge (self-refresh time)
    pub active_to_precharge: u32,
    /// tRC: row cycle
    pub row_cycle: u32,
    /// tWR: write recovery
    pub write_recovery: u32,
    /// tRP: row precharge
    pub row_precharge: u32,
    /// tRCD: row to column
    pub row_to_column: u32,
    /// CAS latency (2 or 3)
    pub cas_latency: u32,
}

impl SdramTiming {
    /// W9825G6KH-6 at `sdclk_hz`, CL=3.
    ///
    /// tMRD and tWR are specified in clocks (2 CLK) rather than nanoseconds.
    pub const fn w9825g6kh6(sdclk_hz: u32) -> Self {
        Self {
            mode_register_to_active: 2,
            exit_self_refresh: ns_to_cycles(70, sdclk_hz),
            active_to_precharge: ns_to_cycles(42, sdclk_hz),
            row_cycle: ns_to_cycles(60, sdclk_hz),
            write_recovery: 2,
            row_precharge: ns_to_cycles(18, sdclk_hz),
            row_to_column: ns_to_cycles(18, sdclk_hz),
            cas_latency: 3,
        }
    }
}

/// One step of the SDRAM power-up sequence, written to FMC_SDCMR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SdramCommand {
    /// Start SDCLK
    ClockEnable,
    /// Precharge all banks
    PrechargeAll,
    /// Issue `n` consecutive auto-refresh cycles (1..=16)
    AutoRefresh(u32),
    /// Program the device mode register
    LoadModeRegister(u32),
}

impl SdramCommand {
    /// FMC_SDCMR value targeting SDRAM bank 1 (CTB1).
    #[must_use]
    pub fn sdcmr(self) -> u32 {
        const CTB1: u32 = 1 << 4;
        let (mode, nrfs, mrd) = match self {
            Self::ClockEnable => (0b001, 0, 0),
            Self::PrechargeAll => (0b010, 0, 0),
            Self::AutoRefresh(n) => (0b011, n.clamp(1, 16).saturating_sub(1), 0),
            Self::LoadModeRegister(value) => (0b100, 0, value & 0x3FFF),
        };
        mode | CTB1 | (nrfs << 5) | (mrd << 9)
    }
}

/// Computed register set for the bulk SDRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdramRegisters {
    /// FMC_SDCR1
    pub sdcr: u32,
    /// FMC_SDTR1
    pub sdtr: u32,
    /// FMC_SDRTR (COUNT in bits 13:1)
    pub sdrtr: u32,
    /// Device mode register: burst 1, sequential, CAS, single write burst
    pub mode_register: u32,
}

/// Refresh period of the whole array in milliseconds.
pub const REFRESH_PERIOD_MS: u32 = 64;

/// SDCLK cycles subtracted from the refresh interval (RM0433 §22.9.5).
pub const REFRESH_SAFETY_CYCLES: u32 = 20;

/// FMC_SDRTR COUNT: per-row refresh interval minus the safety margin.
#[must_use]
pub fn refresh_count(sdclk_hz: u32, rows: u32) -> u32 {
    let per_ms = u64::from(sdclk_hz) / 1_000;
    let interval = (u64::from(REFRESH_PERIOD_MS) * per_ms)
        .checked_div(u64::from(rows))
        .unwrap_or(0);
    u32::try_from(interval)
        .unwrap_or(u32::MAX)
        .saturating_sub(REFRESH_SAFETY_CYCLES)
}

impl SdramRegisters {
    /// Compute the register set for `geometry` and `timing` at `sdclk_hz`.
    ///
    /// SDCLK is set to kernel / 2, read burst on, one cycle read pipe.
    pub fn compute(
        geometry: SdramGeometry,
        timing: SdramTiming,
        sdclk_hz: u32,
    ) -> Result<Self, FmcError> {
        let device_bytes = geometry.capacity_bytes();
        if device_bytes != BULK_SIZE_BYTES {
            return Err(FmcError::CapacityMismatch { device_bytes });
        }

        let nc = geometry.column_bits.saturating_sub(8) & 0b11;
        let nr = geometry.row_bits.saturating_sub(11) & 0b11;
        let mwid = match geometry.bus_width {
            8 => 0b00,
            32 => 0b10,
            _ => 0b01,
        };
        let nb = u32::from(geometry.banks == 4);
        let cas = timing.cas_latency & 0b11;
        const SDCLK_DIV2: u32 = 0b10 << 10;
        const RBURST: u32 = 1 << 12;
        const RPIPE_1: u32 = 0b01 << 13;
        let sdcr = nc | (nr << 2) | (mwid << 4) | (nb << 6) | (cas << 7) | SDCLK_DIV2 | RBURST | RPIPE_1;

        let sdtr = field("TMRD", timing.mode_register_to_active, 16, 0)?
            | field("TXSR", timing.exit_self_refresh, 16, 4)?
            | field("TRAS", timing.active_to_precharge, 16, 8)?
            | field("TRC", timing.row_cycle, 16, 12)?
            | field("TWR", timing.write_recovery, 16, 16)?
            | field("TRP", timing.row_precharge, 16, 20)?
            | field("TRCD", timing.row_to_column, 16, 24)?;

        let count = refresh_count(sdclk_hz, geometry.rows());
        if !(41..=0x1FFF).contains(&count) {
            return Err(FmcError::FieldOverflow {
                field: "COUNT",
                cycles: count,
            });
        }

        const WRITE_BURST_SINGLE: u32 = 1 << 9;
        let mode_register = (cas << 4) | WRITE_BURST_SINGLE;

        Ok(Self {
            sdcr,
            sdtr,
            sdrtr: count << 1,
            mode_register,
        })
    }

    /// Register set for the front-end board's bulk SDRAM.
    pub fn bulk_buffer() -> Result<Self, FmcError> {
        Self::compute(
            SdramGeometry::W9825G6KH6,
            SdramTiming::w9825g6kh6(SDCLK_HZ),
            SDCLK_HZ,
        )
    }

    /// SDRAM power-up command sequence (RM0433 §22.9.3). The caller waits
    /// at least 100 µs after [`SdramCommand::ClockEnable`].
    pub fn init_sequence(&self) -> [SdramCommand; 4] {
        [
            SdramCommand::ClockEnable,
            SdramCommand::PrechargeAll,
            SdramCommand::AutoRefresh(8),
            SdramCommand::LoadModeRegister(self.mode_register),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ns_to_cycles_rounds_up() {
        assert_eq!(ns_to_cycles(15, SDCLK_HZ), 2);
        assert_eq!(ns_to_cycles(60, SDCLK_HZ), 6);
        assert_eq!(ns_to_cycles(61, SDCLK_HZ), 7);
        assert_eq!(ns_to_cycles(0, SDCLK_HZ), 1);
    }

    #[test]
    fn test_geometry_matches_bulk_buffer() {
        assert_eq!(SdramGeometry::W9825G6KH6.capacity_bytes(), BULK_SIZE_BYTES);
        assert_eq!(SdramGeometry::W9825G6KH6.rows(), 8192);
    }

    #[test]
    fn test_refresh_count_at_100mhz() {
        // 64 ms * 100 MHz / 8192 rows = 781, minus 20
        assert_eq!(refresh_count(SDCLK_HZ, 8192), 761);
    }

    #[test]
    fn test_bulk_buffer_registers() {
        let regs = SdramRegisters::bulk_buffer().unwrap();
        // NC=01 NR=10 MWID=01 NB=1 CAS=11 SDCLK=10 RBURST RPIPE=01
        assert_eq!(regs.sdcr, 0x39D9);
        // TMRD=1 TXSR=6 TRAS=4 TRC=5 TWR=1 TRP=1 TRCD=1
        assert_eq!(regs.sdtr, 0x0111_5461);
        assert_eq!(regs.sdrtr, 761 << 1);
        assert_eq!(regs.mode_register, 0x0230);
    }

    #[test]
    fn test_wrong_geometry_is_rejected() {
        let small = SdramGeometry {
            row_bits: 12,
            ..SdramGeometry::W9825G6KH6
        };
        assert!(matches!(
            SdramRegisters::compute(small, SdramTiming::w9825g6kh6(SDCLK_HZ), SDCLK_HZ),
            Err(FmcError::CapacityMismatch { .. })
        ));
    }

    #[test]
    fn test_slow_part_overflows_timing_field() {
        let timing = SdramTiming {
            row_cycle: 17,
            ..SdramTiming::w9825g6kh6(SDCLK_HZ)
        };
        assert_eq!(
            SdramRegisters::compute(SdramGeometry::W9825G6KH6, timing, SDCLK_HZ),
            Err(FmcError::FieldOverflow {
                field: "TRC",
                cycles: 17
            })
        );
    }

    #[test]
    fn test_init_sequence_commands() {
        let regs = SdramRegisters::bulk_buffer().unwrap();
        let seq = regs.init_sequence();
        assert_eq!(seq[0].sdcmr(), 0x11);
        assert_eq!(seq[1].sdcmr(), 0x12);
        // 8 refreshes: NRFS = 7
        assert_eq!(seq[2].sdcmr(), 0x13 | (7 << 5));
        assert_eq!(seq[3].sdcmr(), 0x14 | (0x0230 << 9));
    }

    #[test]
    fn test_dual_port_sram_registers() {
        let t = SramTiming::dual_port();
        assert_eq!((t.address_setup, t.data_phase, t.bus_turnaround), (2, 5, 1));
        assert_eq!(t.btr1().unwrap(), 0x0001_0502);
        assert_eq!(SramTiming::bcr1(), 0x8000_1011);
    }

    #[test]
    fn test_fmc_pins_are_unique() {
        for (i, a) in FMC_PINS.iter().enumerate() {
            for b in FMC_PINS.iter().skip(i + 1) {
                assert!(
                    (a.port, a.pin) != (b.port, b.pin),
                    "{} and {} share a ball",
                    a.signal,
                    b.signal
                );
            }
            assert!(a.pin < 16);
        }
    }

    #[test]
    fn test_fmc_pins_cover_buses() {
        let count = |prefix: &str| {
            FMC_PINS
                .iter()
                .filter(|p| {
                    p.signal
                        .strip_prefix(prefix)
                        .is_some_and(|n| n.parse::<u8>().is_ok())
                })
                .count()
        };
        assert_eq!(count("D"), 16);
        // 64K half-words of dual-port
        assert_eq!(count("A"), 16);
    }

    #[test]
    fn test_port_bases() {
        assert_eq!(Port::C.base(), 0x5802_0800);
        assert_eq!(Port::G.base(), 0x5802_1800);
    }

    #[test]
    fn test_sram_data_phase_must_fit() {
        let t = SramTiming {
            data_phase: 256,
            ..SramTiming::dual_port()
        };
        assert!(t.btr1().is_err());
    }
}
