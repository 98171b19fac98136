//! NAND command opcodes and status register bits
//!
//! Opcodes follow the ONFI command set plus the legacy small-page pointer
//! commands (READ1, READ-OOB).

use bitflags::bitflags;

// ============================================================================
// Read
// ============================================================================

/// Read, first half of a small page / page read setup on large-page devices
pub const READ0: u8 = 0x00;
/// Read pointer to the second half of a small page
pub const READ1: u8 = 0x01;
/// Read pointer to the spare area of a small page
pub const READ_OOB: u8 = 0x50;
/// Page read confirm (large-page devices)
pub const READ_START: u8 = 0x30;

// ============================================================================
// Program / erase
// ============================================================================

/// Serial data input (program setup)
pub const SEQIN: u8 = 0x80;
/// Page program confirm
pub const PAGE_PROG: u8 = 0x10;
/// Block erase setup
pub const ERASE1: u8 = 0x60;
/// Block erase confirm
pub const ERASE2: u8 = 0xD0;

// ============================================================================
// Identification, status, features
// ============================================================================

/// Read ID
pub const READ_ID: u8 = 0x90;
/// Read ONFI parameter page
pub const READ_PARAM_PAGE: u8 = 0xEC;
/// Read status register
pub const STATUS: u8 = 0x70;
/// Get features
pub const GET_FEATURES: u8 = 0xEE;
/// Set features
pub const SET_FEATURES: u8 = 0xEF;

// ============================================================================
// READ-ID addresses
// ============================================================================

/// READ-ID address returning manufacturer and device codes
pub const READ_ID_ADDR_JEDEC: u8 = 0x00;
/// READ-ID address returning the "ONFI" signature
pub const READ_ID_ADDR_ONFI: u8 = 0x20;

// ============================================================================
// Feature addresses
// ============================================================================

/// Vendor feature selecting SLC/MLC operation of the array
pub const FEATURE_CELL_MODE: u8 = 0x91;

bitflags! {
    /// NAND status register (returned by [`STATUS`])
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Last program/erase operation failed
        const FAIL = 1 << 0;
        /// Previous cached operation failed
        const FAIL_CACHED = 1 << 1;
        /// Array ready (no operation in progress)
        const ARRAY_READY = 1 << 5;
        /// Device ready to accept a command
        const READY = 1 << 6;
        /// Write protect line is high (writes allowed)
        const WRITE_ENABLED = 1 << 7;
    }
}

impl Status {
    /// Decode a raw status byte, keeping reserved bits
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// Whether the last program/erase operation failed
    pub fn failed(&self) -> bool {
        self.contains(Self::FAIL)
    }
}
