//! Feature registers and SLC/MLC cell mode

use alloc::vec;

use crate::bus::NandBus;
use crate::error::{InvalidArgument, Result};
use crate::opcodes;
use crate::protocol;

use super::device::NandDevice;

/// Length of a feature register value
pub const FEATURE_LEN: usize = 4;

/// Array operating mode selected by feature 0x91
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    /// One bit per cell
    Slc,
    /// Two bits per cell
    Mlc,
    /// Any other register value
    Unknown(u8),
}

impl CellMode {
    /// Decode the first byte of the cell-mode feature
    pub fn from_feature(value: &[u8; FEATURE_LEN]) -> Self {
        match value[0] {
            1 => Self::Slc,
            2 => Self::Mlc,
            other => Self::Unknown(other),
        }
    }

    /// Register value selecting this mode
    pub fn to_feature(self) -> Result<[u8; FEATURE_LEN]> {
        match self {
            Self::Slc => Ok([1, 1, 0, 0]),
            Self::Mlc => Ok([2, 1, 0, 0]),
            Self::Unknown(value) => Err(InvalidArgument::UnknownCellMode { value }.into()),
        }
    }
}

impl core::fmt::Display for CellMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Slc => write!(f, "SLC"),
            Self::Mlc => write!(f, "MLC"),
            Self::Unknown(v) => write!(f, "Unknown (0x{:02X})", v),
        }
    }
}

impl<B: NandBus> NandDevice<B> {
    fn feature_preamble(&mut self, opcode: u8, addr: u8) -> Result<()> {
        protocol::send_command(&mut self.bus, opcode)?;
        protocol::wait_ready(&mut self.bus, &self.config)?;
        protocol::send_address(&mut self.bus, addr as u64, 1)?;
        protocol::wait_ready(&mut self.bus, &self.config)?;
        if self.config.feature_settle_us > 0 {
            self.bus.delay_us(self.config.feature_settle_us);
        }
        Ok(())
    }

    /// Read the 4-byte value of feature register `addr`
    pub fn get_features(&mut self, addr: u8) -> Result<[u8; FEATURE_LEN]> {
        self.feature_preamble(opcodes::GET_FEATURES, addr)?;
        let mut value = [0u8; FEATURE_LEN];
        protocol::read_data(&mut self.bus, &mut value)?;
        log::debug!("Feature 0x{:02X} = {:02X?}", addr, value);
        Ok(value)
    }

    /// Write feature register `addr`; `value` must be exactly 4 bytes
    pub fn set_features(&mut self, addr: u8, value: &[u8]) -> Result<()> {
        if value.len() != FEATURE_LEN {
            return Err(InvalidArgument::FeatureLength { len: value.len() }.into());
        }
        log::debug!("Setting feature 0x{:02X} to {:02X?}", addr, value);
        self.feature_preamble(opcodes::SET_FEATURES, addr)?;
        protocol::write_data(&mut self.bus, value)?;
        protocol::wait_ready(&mut self.bus, &self.config)
    }

    /// Current array mode
    pub fn cell_mode(&mut self) -> Result<CellMode> {
        let value = self.get_features(opcodes::FEATURE_CELL_MODE)?;
        Ok(CellMode::from_feature(&value))
    }

    /// Switch the array mode
    pub fn set_cell_mode(&mut self, mode: CellMode) -> Result<()> {
        let value = mode.to_feature()?;
        self.set_features(opcodes::FEATURE_CELL_MODE, &value)
    }

    /// Prepare `block` for SLC use
    ///
    /// Programs every page of the block with zeroed data, switches the
    /// array to SLC mode and erases the block.
    pub fn convert_block_to_slc(&mut self, block: u32) -> Result<()> {
        self.geometry.check_block(block)?;
        log::info!("Converting block {} to SLC", block);

        let mut page = vec![0u8; self.geometry.raw_page_size() as usize];
        page[self.geometry.page_size as usize..].fill(0xFF);

        for index in 0..self.geometry.pages_per_block {
            self.write_page_in_block(block, index, &page)?;
        }

        self.set_cell_mode(CellMode::Slc)?;
        self.erase_block(block)?;
        Ok(())
    }
}
