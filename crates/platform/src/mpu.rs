//! MPU (Memory Protection Unit) configuration for STM32H743 / Cortex-M7
//!
//! # Purpose
//!
//! The Cortex-M7 D-cache is enabled by default in Embassy. The dual-port
//! memory on FMC bank 1 is written by the FPGA behind the core's back: if the
//! region were cacheable the dispatcher could read a stale bank header, or a
//! cleared header could sit in a dirty line and never reach the FPGA. The
//! region is therefore mapped **strongly ordered**, so every access reaches
//! the bus in program order.
//!
//! The SDRAM bulk buffer is touched by the core only, so it stays cacheable
//! (write-back, no write-allocate) for throughput during beam-off copies.
//!
//! # References
//!
//! - ARM Cortex-M7 TRM DDI0489F: MPU Region Attribute and Size Register
//! - ST AN4838: Introduction to MPU Management on STM32 MCUs
//! - ST AN4861: FMC default memory attributes on STM32H7
//!
//! # Regions
//!
//! | Slot | Region           | Address     | Size   | Attributes                |
//! |------|------------------|-------------|--------|---------------------------|
//! | 0    | Dual-port (FMC)  | 0x6000_0000 | 128 KB | Strongly ordered          |
//! | 1    | Bulk (SDRAM)     | 0xC000_0000 | 32 MB  | Write-back, no wr-alloc   |
//!
//! # Memory Attribute Bits (TEX, S, C, B)
//!
//! - Strongly ordered: **TEX = 000, S = 1, C = 0, B = 0**
//! - Non-cacheable normal memory: **TEX = 001, S = 0, C = 0, B = 0**
//! - Write-back, no write-allocate: **TEX = 000, S = 0, C = 1, B = 1**
//! - Write-through, no write-allocate: **TEX = 000, S = 0, C = 1, B = 0**

use core::fmt;

use crate::memory_map::{BULK_BASE_ADDRESS, BULK_SIZE_BYTES, DP_BASE_ADDRESS, DP_SIZE_BYTES};

/// MPU configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MpuError {
    /// Region size is not a power of two (ARM MPU requirement: §B3.5 DDI0489F).
    SizeNotPowerOfTwo,
    /// Region size is zero.
    SizeZero,
    /// Base address is not aligned to the region size.
    AddressMisaligned,
    /// Region size is below the minimum 32-byte floor imposed by Cortex-M7 MPU.
    SizeTooSmall,
}

impl fmt::Display for MpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SizeNotPowerOfTwo => "MPU region size is not a power of two",
            Self::SizeZero => "MPU region size is zero",
            Self::AddressMisaligned => "MPU region base is not aligned to its size",
            Self::SizeTooSmall => "MPU region is smaller than 32 bytes",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MpuError {}

/// MPU memory attributes for a region.
///
/// These map to the TEX, S, C, B bit fields in RASR. See ARM DDI0489F
/// §B3.5.4 for the encoding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MpuAttributes {
    /// All accesses complete in program order, no buffering, no caching.
    ///
    /// TEX=000, S=1, C=0, B=0
    StronglyOrdered,

    /// Non-cacheable normal memory.
    ///
    /// TEX=001, S=0, C=0, B=0
    NonCacheable,

    /// Write-back, no write-allocate: normal cached RAM.
    ///
    /// TEX=000, S=0, C=1, B=1
    WriteBackNoWriteAllocate,

    /// Write-through, no write-allocate.
    ///
    /// TEX=000, S=0, C=1, B=0
    WriteThrough,
}

impl MpuAttributes {
    /// TEX/S/C/B bits positioned in RASR [21:16].
    #[must_use]
    pub const fn tex_scb_bits(self) -> u32 {
        match self {
            Self::StronglyOrdered => 1 << 18,
            Self::NonCacheable => 1 << 19,
            Self::WriteBackNoWriteAllocate => (1 << 17) | (1 << 16),
            Self::WriteThrough => 1 << 17,
        }
    }
}

/// A validated MPU region descriptor.
///
/// Construction via [`MpuRegion::new`] enforces the ARM Cortex-M7 MPU
/// alignment and size invariants so callers cannot produce an invalid
/// hardware configuration.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MpuRegion {
    base: u32,
    size: u32,
    attrs: MpuAttributes,
}

impl MpuRegion {
    /// Create a new MPU region, validating size and alignment.
    ///
    /// # Errors
    ///
    /// - [`MpuError::SizeZero`] if `size == 0`
    /// - [`MpuError::SizeTooSmall`] if `size < 32` (Cortex-M7 minimum)
    /// - [`MpuError::SizeNotPowerOfTwo`] if `size` is not a power of two
    /// - [`MpuError::AddressMisaligned`] if `base % size != 0`
    pub fn new(base: u32, size: u32, attrs: MpuAttributes) -> Result<Self, MpuError> {
        if size == 0 {
            return Err(MpuError::SizeZero);
        }
        if size < 32 {
            return Err(MpuError::SizeTooSmall);
        }
        if !size.is_power_of_two() {
            return Err(MpuError::SizeNotPowerOfTwo);
        }
        // size is a non-zero power of two, so the mask test is exact
        if base & (size.wrapping_sub(1)) != 0 {
            return Err(MpuError::AddressMisaligned);
        }
        Ok(Self { base, size, attrs })
    }

    /// Encode the size as the ARM MPU `SIZE` field value (`log2(size) − 1`).
    ///
    /// - 32 B   = 2^5  → SIZE = 4
    /// - 128 KB = 2^17 → SIZE = 16
    /// - 32 MB  = 2^25 → SIZE = 24
    ///
    /// # Errors
    ///
    /// - [`MpuError::SizeZero`] if `size == 0`
    /// - [`MpuError::SizeNotPowerOfTwo`] if `size` is not a power of two
    // trailing_zeros() returns u32; n fits in u8 for all valid MPU region sizes (≤ 2^31)
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode_size(size: u32) -> Result<u8, MpuError> {
        if size == 0 {
            return Err(MpuError::SizeZero);
        }
        if !size.is_power_of_two() {
            return Err(MpuError::SizeNotPowerOfTwo);
        }
        let n = size.trailing_zeros();
        Ok((n as u8).saturating_sub(1))
    }

    /// Base address of this region.
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Size of this region in bytes.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Exclusive end address of this region (`base + size`), saturating at
    /// the top of the address space.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.base.saturating_add(self.size)
    }

    /// Memory attributes assigned to this region.
    #[must_use]
    pub fn attrs(&self) -> MpuAttributes {
        self.attrs
    }

    /// Check whether this region overlaps with `other`.
    ///
    /// Regions that share only a boundary point do NOT overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.base < other.end() && other.base < self.end()
    }
}

/// Region descriptors for the front-end board.
pub struct FrontEndMpuConfig;

impl FrontEndMpuConfig {
    /// Dual-port memory: strongly ordered so FPGA-visible accesses are never
    /// cached or merged.
    // memory_map addresses are 32-bit bus addresses
    #[allow(clippy::cast_possible_truncation)]
    pub fn dual_port_region() -> Result<MpuRegion, MpuError> {
        MpuRegion::new(
            DP_BASE_ADDRESS as u32,
            DP_SIZE_BYTES,
            MpuAttributes::StronglyOrdered,
        )
    }

    /// Bulk buffer: core-only SDRAM, cached.
    #[allow(clippy::cast_possible_truncation)]
    pub fn bulk_buffer_region() -> Result<MpuRegion, MpuError> {
        MpuRegion::new(
            BULK_BASE_ADDRESS as u32,
            BULK_SIZE_BYTES,
            MpuAttributes::WriteBackNoWriteAllocate,
        )
    }
}

/// Computes raw ARMv7-M MPU register values (RBAR / RASR).
///
/// Pure math: nothing here touches hardware. Boot code writes the values.
///
/// # RASR layout (ARM DDI0489F §B3.5.4)
///
/// | Field | Bits   | Value used            |
/// |-------|--------|-----------------------|
/// | XN    | [28]   | 1 (data only)         |
/// | AP    | [26:24]| 0b011 (full access)   |
/// | TEX   | [21:19]| per attributes        |
/// | S,C,B | [18:16]| per attributes        |
/// | SIZE  | [5:1]  | `log2(size) - 1`      |
/// | ENABLE| [0]    | 1                     |
pub struct MpuApplier;

impl MpuApplier {
    /// XN=1, AP=0b011. Shared by every region on this board.
    pub const ACCESS_BITS: u32 = 0x1300_0000;

    /// Compute the RASR value for a region with `attrs` and `size_field`.
    #[must_use]
    pub fn rasr(attrs: MpuAttributes, size_field: u8) -> u32 {
        Self::ACCESS_BITS
            | attrs.tex_scb_bits()
            | (u32::from(size_field) << 1) // SIZE field occupies RASR bits [5:1]
            | 1 // ENABLE bit [0]
    }

    /// Compute the RBAR value for a region.
    ///
    /// Sets VALID=1 so the 4-bit REGION field selects the hardware slot.
    ///
    /// RBAR u32: `base | (1 << 4) | (region_number & 0xF)`
    #[must_use]
    pub fn rbar(base: u32, region_number: u8) -> u32 {
        base | (1 << 4) | (u32::from(region_number) & 0xF)
    }

    /// `(RBAR, RASR)` for one validated region in hardware slot `slot`.
    pub fn region_pair(region: &MpuRegion, slot: u8) -> Result<(u32, u32), MpuError> {
        let size = MpuRegion::encode_size(region.size())?;
        Ok((Self::rbar(region.base(), slot), Self::rasr(region.attrs(), size)))
    }

    /// Return `(RBAR, RASR)` pairs for the front-end board.
    ///
    /// | Index | Region    | RBAR        | RASR        |
    /// |-------|-----------|-------------|-------------|
    /// | 0     | Dual-port | 0x6000_0010 | 0x1304_0021 |
    /// | 1     | Bulk      | 0xC000_0011 | 0x1303_0031 |
    pub fn front_end_register_pairs() -> Result<[(u32, u32); 2], MpuError> {
        let dp = FrontEndMpuConfig::dual_port_region()?;
        let bulk = FrontEndMpuConfig::bulk_buffer_region()?;
        Ok([Self::region_pair(&dp, 0)?, Self::region_pair(&bulk, 1)?])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_region_size_must_be_power_of_two() {
        assert!(MpuRegion::new(0x6000_0000, 128 * 1024, MpuAttributes::StronglyOrdered).is_ok());
        assert_eq!(
            MpuRegion::new(0x6000_0000, 100_000, MpuAttributes::StronglyOrdered).unwrap_err(),
            MpuError::SizeNotPowerOfTwo
        );
        assert_eq!(
            MpuRegion::new(0x6000_0000, 0, MpuAttributes::StronglyOrdered).unwrap_err(),
            MpuError::SizeZero
        );
        assert_eq!(
            MpuRegion::new(0x6000_0000, 16, MpuAttributes::StronglyOrdered).unwrap_err(),
            MpuError::SizeTooSmall
        );
    }

    #[test]
    fn test_region_address_must_be_aligned_to_size() {
        assert_eq!(
            MpuRegion::new(0x6000_1000, 128 * 1024, MpuAttributes::StronglyOrdered).unwrap_err(),
            MpuError::AddressMisaligned
        );
    }

    #[test]
    fn test_mpu_size_field_encoding() {
        assert_eq!(MpuRegion::encode_size(32).unwrap(), 4);
        assert_eq!(MpuRegion::encode_size(128 * 1024).unwrap(), 16);
        assert_eq!(MpuRegion::encode_size(32 * 1024 * 1024).unwrap(), 24);
        assert!(MpuRegion::encode_size(0).is_err());
        assert!(MpuRegion::encode_size(48).is_err());
    }

    #[test]
    fn test_front_end_regions_are_valid_and_disjoint() {
        let dp = FrontEndMpuConfig::dual_port_region().unwrap();
        let bulk = FrontEndMpuConfig::bulk_buffer_region().unwrap();
        assert_eq!(dp.attrs(), MpuAttributes::StronglyOrdered);
        assert_eq!(bulk.attrs(), MpuAttributes::WriteBackNoWriteAllocate);
        assert!(!dp.overlaps(&bulk));
        assert_eq!(dp.end(), 0x6002_0000);
    }

    #[test]
    fn test_overlap_is_exclusive_of_boundary() {
        let a = MpuRegion::new(0x2000_0000, 0x1000, MpuAttributes::NonCacheable).unwrap();
        let b = MpuRegion::new(0x2000_1000, 0x1000, MpuAttributes::NonCacheable).unwrap();
        let c = MpuRegion::new(0x2000_0000, 0x2000, MpuAttributes::NonCacheable).unwrap();
        assert!(!a.overlaps(&b));
        assert!(c.overlaps(&a));
        assert!(c.overlaps(&b));
    }
}

/// Tests for `MpuApplier`: register-value computation for ARMv7-M MPU.
#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod apply_tests {
    use super::*;

    #[test]
    fn test_register_pairs_match_documented_values() {
        let pairs = MpuApplier::front_end_register_pairs().unwrap();
        assert_eq!(pairs[0], (0x6000_0010, 0x1304_0021));
        assert_eq!(pairs[1], (0xC000_0011, 0x1303_0031));
    }

    #[test]
    fn test_dual_port_region_is_not_cacheable() {
        let (_rbar, rasr) = MpuApplier::front_end_register_pairs().unwrap()[0];
        assert_eq!(rasr & (1 << 17), 0, "C bit must be clear for FPGA-shared memory");
        assert_eq!(rasr & (1 << 16), 0, "B bit must be clear for FPGA-shared memory");
        assert_ne!(rasr & (1 << 18), 0, "S bit set for strongly ordered");
    }

    #[test]
    fn test_every_region_is_enabled_and_execute_never() {
        for (i, (_, rasr)) in MpuApplier::front_end_register_pairs()
            .unwrap()
            .iter()
            .enumerate()
        {
            assert_ne!(rasr & 1, 0, "region {i} ENABLE bit");
            assert_ne!(rasr & (1 << 28), 0, "region {i} XN bit");
        }
    }

    #[test]
    fn test_rbar_selects_slot() {
        assert_eq!(MpuApplier::rbar(0x6000_0000, 0), 0x6000_0010);
        assert_eq!(MpuApplier::rbar(0x6000_0000, 0x1F), 0x6000_001F);
    }

    #[test]
    fn test_non_cacheable_rasr_matches_legacy_mask() {
        // TEX=001 with XN/AP gives the classic 0x1308_xxxx DMA-buffer encoding
        assert_eq!(MpuApplier::rasr(MpuAttributes::NonCacheable, 18), 0x1308_0025);
    }
}
