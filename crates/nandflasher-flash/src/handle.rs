//! NandHandle - an identified chip behind a type-erased transport

use nandflasher_core::bus::NandBus;
use nandflasher_core::nand::{CellMode, WriteOptions, WriteProgress, WriteReport, ID_LEN};
use nandflasher_core::opcodes::Status;
use nandflasher_core::{Geometry, NandDevice};

/// Chip information gathered when the handle was opened
#[derive(Debug, Clone)]
pub struct ChipInfo {
    /// Vendor name from the READ-ID manufacturer code (e.g., "Micron")
    pub manufacturer: &'static str,
    /// Manufacturer string from the ONFI parameter page
    pub onfi_manufacturer: String,
    /// Model string
    pub model: String,
    /// Raw READ-ID bytes
    pub id: [u8; ID_LEN],
    /// Highest supported ONFI version
    pub onfi_version: Option<(u8, u8)>,
    /// Whether the parameter page CRC matched
    pub crc_valid: Option<bool>,
}

/// Boxed NAND device as handed out by the registry
pub type BoxedNand = NandDevice<Box<dyn NandBus>>;

/// Unified NAND programming handle
///
/// The CLI works only with this type and never needs to know which
/// transport drives the chip.
pub struct NandHandle {
    device: BoxedNand,
    chip_info: ChipInfo,
}

impl NandHandle {
    pub(crate) fn new(mut device: BoxedNand) -> Result<Self, Box<dyn std::error::Error>> {
        let id = device.read_id()?;
        let geometry = device.geometry();
        let page = device.parameter_page();
        let chip_info = ChipInfo {
            manufacturer: geometry.manufacturer,
            onfi_manufacturer: geometry.onfi_manufacturer.trim_end().to_string(),
            model: geometry.id_string().to_string(),
            id,
            onfi_version: page.and_then(|p| p.onfi_version()),
            crc_valid: page.map(|p| p.crc_valid),
        };
        Ok(Self { device, chip_info })
    }

    /// Chip information
    pub fn chip_info(&self) -> &ChipInfo {
        &self.chip_info
    }

    /// Device geometry
    pub fn geometry(&self) -> &Geometry {
        self.device.geometry()
    }

    /// Get mutable reference to the underlying device
    pub fn as_device_mut(&mut self) -> &mut BoxedNand {
        &mut self.device
    }

    /// Read one page, optionally including the spare area
    pub fn read_page(
        &mut self,
        page: u32,
        include_oob: bool,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        self.device.read_page(page, include_oob).map_err(Into::into)
    }

    /// Read a whole block with one read command
    ///
    /// Returns `None` for a block carrying the bad-block marker unless
    /// `raw` is set.
    pub fn read_block_sequential(
        &mut self,
        block: u32,
        include_oob: bool,
        raw: bool,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
        self.device
            .read_block_sequential(block, include_oob, raw)
            .map_err(Into::into)
    }

    /// Write an image across consecutive pages
    pub fn write_pages(
        &mut self,
        data: &[u8],
        opts: &WriteOptions<'_>,
        progress: &mut dyn WriteProgress,
    ) -> Result<WriteReport, Box<dyn std::error::Error>> {
        self.device
            .write_pages(data, opts, progress)
            .map_err(Into::into)
    }

    /// Erase blocks `start..=end`, returning the blocks whose erase failed
    pub fn erase_blocks(
        &mut self,
        start: u32,
        end: u32,
    ) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
        self.device.erase_blocks(start, end).map_err(Into::into)
    }

    /// Erase one block
    pub fn erase_block(&mut self, block: u32) -> Result<Status, Box<dyn std::error::Error>> {
        self.device.erase_block(block).map_err(Into::into)
    }

    /// List blocks carrying the factory bad-block marker
    pub fn scan_bad_blocks(&mut self) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
        self.device.scan_bad_blocks().map_err(Into::into)
    }

    /// Read a feature register
    pub fn get_features(&mut self, addr: u8) -> Result<[u8; 4], Box<dyn std::error::Error>> {
        self.device.get_features(addr).map_err(Into::into)
    }

    /// Write a feature register
    pub fn set_features(
        &mut self,
        addr: u8,
        value: &[u8],
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.device.set_features(addr, value).map_err(Into::into)
    }

    /// Current SLC/MLC mode
    pub fn cell_mode(&mut self) -> Result<CellMode, Box<dyn std::error::Error>> {
        self.device.cell_mode().map_err(Into::into)
    }

    /// Switch the SLC/MLC mode
    pub fn set_cell_mode(&mut self, mode: CellMode) -> Result<(), Box<dyn std::error::Error>> {
        self.device.set_cell_mode(mode).map_err(Into::into)
    }

    /// Program a block with zeroes, switch to SLC and erase it
    pub fn convert_block_to_slc(&mut self, block: u32) -> Result<(), Box<dyn std::error::Error>> {
        self.device.convert_block_to_slc(block).map_err(Into::into)
    }
}
