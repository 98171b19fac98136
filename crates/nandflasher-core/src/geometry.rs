//! Device geometry - the shape of the NAND array
//!
//! A [`Geometry`] is produced once by identification and is read-only
//! afterwards. Re-identifying a device builds a new one.

use heapless::String;

use crate::error::{InvalidArgument, Result};

/// Maximum length of the ONFI model string (bytes 44-63)
pub const MODEL_LEN: usize = 20;

/// Maximum length of the ONFI manufacturer string (bytes 32-43)
pub const MANUFACTURER_LEN: usize = 12;

/// Addressing regime of a device
///
/// Selected once when the geometry is built; page operations dispatch on it
/// through [`crate::nand::scheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressingMode {
    /// Two column cycles, READ/READ-START page reads (all ONFI devices)
    #[default]
    LargePage,
    /// One column cycle, READ0/READ1/READ-OOB pointer commands (legacy 512-byte pages)
    SmallPage,
}

impl AddressingMode {
    /// Number of address cycles used for the column (byte within page)
    pub const fn column_cycles(&self) -> u8 {
        match self {
            Self::LargePage => 2,
            Self::SmallPage => 1,
        }
    }

    /// Shift applied to a page index to place it above the column bits
    pub const fn row_shift(&self) -> u32 {
        self.column_cycles() as u32 * 8
    }
}

/// A page index split into its block and in-block page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageAddress {
    /// Erase block index
    pub block: u32,
    /// Page number within the block
    pub page: u32,
}

/// Geometry of an identified NAND device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    /// Main data bytes per page
    pub page_size: u32,
    /// Spare (OOB) bytes per page
    pub oob_size: u32,
    /// Pages per erase block
    pub pages_per_block: u32,
    /// Erase blocks per logical unit
    pub blocks_per_lun: u32,
    /// Number of logical units
    pub lun_count: u32,
    /// Address cycles for a full column + row address
    pub address_cycles: u8,
    /// Bits stored per cell (1 = SLC, 2 = MLC, ...)
    pub bits_per_cell: u8,
    /// JEDEC manufacturer byte from the parameter page
    pub manufacturer_id: u8,
    /// Manufacturer name resolved from the READ-ID byte
    pub manufacturer: &'static str,
    /// ONFI manufacturer string
    pub onfi_manufacturer: String<MANUFACTURER_LEN>,
    /// ONFI device model string (raw identifier)
    pub model: String<MODEL_LEN>,
    /// ONFI revision bitmap
    pub onfi_revision: u16,
    /// Addressing regime
    pub addressing: AddressingMode,
}

impl Geometry {
    /// Build a geometry for a device whose parameters are known in advance
    ///
    /// Used for legacy chips that do not answer the ONFI probe. Strings are
    /// left empty and the manufacturer is "Unknown".
    pub fn new(
        page_size: u32,
        oob_size: u32,
        pages_per_block: u32,
        block_count: u32,
        address_cycles: u8,
        addressing: AddressingMode,
    ) -> Result<Self> {
        if page_size == 0 || pages_per_block == 0 || block_count == 0 {
            return Err(InvalidArgument::EmptyGeometry.into());
        }
        let geometry = Self {
            page_size,
            oob_size,
            pages_per_block,
            blocks_per_lun: block_count,
            lun_count: 1,
            address_cycles,
            bits_per_cell: 1,
            manufacturer_id: 0,
            manufacturer: crate::vendor::UNKNOWN,
            onfi_manufacturer: String::new(),
            model: String::new(),
            onfi_revision: 0,
            addressing,
        };
        geometry.check_dimensions()?;
        Ok(geometry)
    }

    /// Reject dimensions whose derived counts overflow `u32`
    ///
    /// The derived sizes multiply unchecked; every constructor runs this.
    pub fn check_dimensions(&self) -> Result<()> {
        let raw_page = self.page_size.checked_add(self.oob_size);
        let pages = self
            .lun_count
            .checked_mul(self.blocks_per_lun)
            .and_then(|blocks| blocks.checked_mul(self.pages_per_block));
        let block_bytes = raw_page.and_then(|raw| raw.checked_mul(self.pages_per_block));
        match (pages, block_bytes) {
            (Some(_), Some(_)) => Ok(()),
            _ => Err(InvalidArgument::GeometryOverflow.into()),
        }
    }

    /// Page size including the spare area
    pub fn raw_page_size(&self) -> u32 {
        self.page_size + self.oob_size
    }

    /// Total number of erase blocks
    pub fn block_count(&self) -> u32 {
        self.lun_count * self.blocks_per_lun
    }

    /// Total number of pages
    pub fn page_count(&self) -> u32 {
        self.block_count() * self.pages_per_block
    }

    /// Raw bytes per erase block (pages including spare)
    pub fn block_size(&self) -> u32 {
        self.pages_per_block * self.raw_page_size()
    }

    /// Raw capacity in MiB (spare area included)
    pub fn chip_size_mb(&self) -> u64 {
        self.page_count() as u64 * self.raw_page_size() as u64 / (1024 * 1024)
    }

    /// Address cycles that carry the row (page/block) address
    pub fn row_cycles(&self) -> u8 {
        self.address_cycles
            .saturating_sub(self.addressing.column_cycles())
    }

    /// Split a flat page index into block and in-block page
    pub fn decompose(&self, page: u32) -> PageAddress {
        PageAddress {
            block: page / self.pages_per_block,
            page: page % self.pages_per_block,
        }
    }

    /// Combine a block and in-block page into a flat page index
    pub fn compose(&self, block: u32, page_in_block: u32) -> u32 {
        block * self.pages_per_block + page_in_block
    }

    /// First page of a block
    pub fn first_page(&self, block: u32) -> u32 {
        self.compose(block, 0)
    }

    /// Reject page indices beyond the end of the device
    pub fn check_page(&self, page: u32) -> Result<()> {
        if page >= self.page_count() {
            return Err(InvalidArgument::PageOutOfRange {
                page,
                page_count: self.page_count(),
            }
            .into());
        }
        Ok(())
    }

    /// Reject block indices beyond the end of the device
    pub fn check_block(&self, block: u32) -> Result<()> {
        if block >= self.block_count() {
            return Err(InvalidArgument::BlockOutOfRange {
                block,
                block_count: self.block_count(),
            }
            .into());
        }
        Ok(())
    }

    /// Model string with the ONFI space padding removed
    pub fn id_string(&self) -> &str {
        self.model.trim_end()
    }
}
