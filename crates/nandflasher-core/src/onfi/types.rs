//! ONFI parameter page types

use heapless::String;
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::geometry::{MANUFACTURER_LEN, MODEL_LEN};

/// "ONFI" as it appears on the bus
pub const ONFI_SIGNATURE: [u8; 4] = *b"ONFI";

/// Size of one parameter page copy
pub const PARAMETER_PAGE_LEN: usize = 256;

/// Bytes covered by the integrity CRC
pub const CRC_COVERED_LEN: usize = 254;

/// Byte layout of the parameter page as transferred by the device
#[derive(Debug, Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawParameterPage {
    /// "ONFI"
    pub signature: [u8; 4],
    /// Supported ONFI revisions bitmap
    pub revision: U16,
    /// Features supported
    pub features: U16,
    /// Optional commands supported
    pub optional_commands: U16,
    reserved0: [u8; 22],
    /// Manufacturer, ASCII space padded
    pub manufacturer: [u8; MANUFACTURER_LEN],
    /// Device model, ASCII space padded
    pub model: [u8; MODEL_LEN],
    /// JEDEC manufacturer ID
    pub jedec_id: u8,
    /// Date code
    pub date_code: U16,
    reserved1: [u8; 13],
    /// Data bytes per page
    pub page_size: U32,
    /// Spare bytes per page
    pub spare_size: U16,
    /// Data bytes per partial page (obsolete)
    pub partial_page_size: U32,
    /// Spare bytes per partial page (obsolete)
    pub partial_spare_size: U16,
    /// Pages per block
    pub pages_per_block: U32,
    /// Blocks per logical unit
    pub blocks_per_lun: U32,
    /// Number of logical units
    pub lun_count: u8,
    /// Address cycles: row count in bits 0-3, column count in bits 4-7
    pub address_cycles: u8,
    /// Bits per cell
    pub bits_per_cell: u8,
    /// Bad blocks maximum per LUN
    pub max_bad_blocks: U16,
    /// Block endurance (value, exponent)
    pub block_endurance: U16,
    reserved2: [u8; 147],
    /// CRC-16 over bytes 0-253
    pub crc: U16,
}

/// Decoded ONFI parameter page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterPage {
    /// Supported ONFI revisions bitmap
    pub revision: u16,
    /// Features supported
    pub features: u16,
    /// Optional commands supported
    pub optional_commands: u16,
    /// Manufacturer string (space padding kept)
    pub manufacturer: String<MANUFACTURER_LEN>,
    /// Model string (space padding kept)
    pub model: String<MODEL_LEN>,
    /// JEDEC manufacturer ID
    pub jedec_id: u8,
    /// Data bytes per page
    pub page_size: u32,
    /// Spare bytes per page
    pub spare_size: u16,
    /// Pages per block
    pub pages_per_block: u32,
    /// Blocks per logical unit
    pub blocks_per_lun: u32,
    /// Number of logical units
    pub lun_count: u8,
    /// Raw address cycle byte
    pub address_cycles: u8,
    /// Bits per cell
    pub bits_per_cell: u8,
    /// Bad blocks maximum per LUN
    pub max_bad_blocks: u16,
    /// CRC stored in the page
    pub crc: u16,
    /// Whether the stored CRC matches the page contents
    pub crc_valid: bool,
}

impl ParameterPage {
    /// Highest ONFI version advertised in the revision bitmap
    pub fn onfi_version(&self) -> Option<(u8, u8)> {
        const VERSIONS: [(u16, (u8, u8)); 9] = [
            (1 << 9, (4, 0)),
            (1 << 8, (3, 2)),
            (1 << 7, (3, 1)),
            (1 << 6, (3, 0)),
            (1 << 5, (2, 3)),
            (1 << 4, (2, 2)),
            (1 << 3, (2, 1)),
            (1 << 2, (2, 0)),
            (1 << 1, (1, 0)),
        ];
        VERSIONS
            .iter()
            .find(|(bit, _)| self.revision & bit != 0)
            .map(|(_, version)| *version)
    }

    /// Row address cycles advertised by the device
    pub fn row_cycles(&self) -> u8 {
        self.address_cycles & 0x0F
    }

    /// Column address cycles advertised by the device
    pub fn column_cycles(&self) -> u8 {
        self.address_cycles >> 4
    }
}
