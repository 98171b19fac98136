//! The NAND device handle

use alloc::vec;
use alloc::vec::Vec;

use crate::bus::{AuxLines, NandBus};
use crate::config::NandConfig;
use crate::error::{Error, InvalidArgument, Result};
use crate::geometry::Geometry;
use crate::onfi::ParameterPage;
use crate::opcodes::{self, Status};
use crate::protocol::{self, WriteEnableGuard};

use super::scheme::PageScheme;

/// Spare byte inspected by [`NandDevice::scan_bad_blocks`]
pub const SCAN_BAD_MARKER_OFFSET: usize = 0;

/// Spare byte inspected by the inline checks of writes and sequential reads
pub const INLINE_BAD_MARKER_OFFSET: usize = 5;

/// Number of leading pages of a block carrying the inline bad-block marker
const MARKER_PAGES: u32 = 2;

/// An identified NAND device on a bus
pub struct NandDevice<B: NandBus> {
    pub(super) bus: B,
    pub(super) geometry: Geometry,
    pub(super) config: NandConfig,
    pub(super) parameter_page: Option<ParameterPage>,
}

impl<B: NandBus> NandDevice<B> {
    /// Open a device whose geometry is already known
    ///
    /// No identification is performed. Use this for legacy small-page parts
    /// that do not implement the ONFI parameter page.
    pub fn with_geometry(bus: B, geometry: Geometry, config: NandConfig) -> Result<Self> {
        if geometry.page_size == 0
            || geometry.pages_per_block == 0
            || geometry.blocks_per_lun == 0
            || geometry.lun_count == 0
        {
            return Err(InvalidArgument::EmptyGeometry.into());
        }
        geometry.check_dimensions()?;
        Ok(Self {
            bus,
            geometry,
            config,
            parameter_page: None,
        })
    }

    /// Device geometry
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Engine configuration
    pub fn config(&self) -> &NandConfig {
        &self.config
    }

    /// Decoded ONFI parameter page, if the device was identified through it
    pub fn parameter_page(&self) -> Option<&ParameterPage> {
        self.parameter_page.as_ref()
    }

    /// Access the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the bus
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn scheme(&self) -> &'static dyn PageScheme {
        self.geometry.addressing.scheme()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read one page, optionally including the spare area
    pub fn read_page(&mut self, page: u32, include_oob: bool) -> Result<Vec<u8>> {
        self.geometry.check_page(page)?;
        let len = if include_oob {
            self.geometry.raw_page_size()
        } else {
            self.geometry.page_size
        };
        log::debug!("Reading page {} ({} bytes)", page, len);

        let mut buf = vec![0u8; len as usize];
        self.scheme()
            .read_page(&mut self.bus, &self.geometry, &self.config, page, &mut buf)?;
        Ok(buf)
    }

    /// Read a page addressed by block and in-block index
    pub fn read_page_in_block(
        &mut self,
        block: u32,
        page_in_block: u32,
        include_oob: bool,
    ) -> Result<Vec<u8>> {
        self.check_page_in_block(block, page_in_block)?;
        self.read_page(self.geometry.compose(block, page_in_block), include_oob)
    }

    /// Read only the spare area of a page
    pub fn read_oob(&mut self, page: u32) -> Result<Vec<u8>> {
        self.geometry.check_page(page)?;
        let mut buf = vec![0u8; self.geometry.oob_size as usize];
        self.scheme()
            .read_oob(&mut self.bus, &self.geometry, &self.config, page, &mut buf)?;
        Ok(buf)
    }

    // ========================================================================
    // Program / erase
    // ========================================================================

    /// Program one page from a `raw_page_size` buffer
    ///
    /// Write protection is released for the duration of the call. A status
    /// reporting FAIL repeats the program up to `program_retries` times.
    pub fn write_page(&mut self, page: u32, data: &[u8]) -> Result<Status> {
        self.geometry.check_page(page)?;
        let expected = self.geometry.raw_page_size() as usize;
        if data.len() != expected {
            return Err(InvalidArgument::PageLength {
                expected,
                actual: data.len(),
            }
            .into());
        }
        log::debug!("Programming page {}", page);

        let scheme = self.scheme();
        let mut bus = WriteEnableGuard::new(&mut self.bus);
        scheme.program_page(&mut *bus, &self.geometry, &self.config, page, data)
    }

    /// Program a page addressed by block and in-block index
    pub fn write_page_in_block(
        &mut self,
        block: u32,
        page_in_block: u32,
        data: &[u8],
    ) -> Result<Status> {
        self.check_page_in_block(block, page_in_block)?;
        self.write_page(self.geometry.compose(block, page_in_block), data)
    }

    /// Erase one block
    ///
    /// A FAIL status is reported as [`Error::EraseFailed`] and not retried.
    pub fn erase_block(&mut self, block: u32) -> Result<Status> {
        self.geometry.check_block(block)?;
        let row = self.geometry.first_page(block) as u64;
        let cycles = self.geometry.row_cycles();
        log::debug!("Erasing block {}", block);

        let status = {
            let mut bus = WriteEnableGuard::new(&mut self.bus);
            protocol::send_command(&mut *bus, opcodes::ERASE1)?;
            protocol::send_address(&mut *bus, row, cycles)?;
            protocol::send_command(&mut *bus, opcodes::ERASE2)?;
            protocol::wait_ready(&mut *bus, &self.config)?;
            protocol::read_status(&mut *bus)?
        };

        if status.failed() {
            log::warn!("Erase of block {} failed (status 0x{:02X})", block, status.bits());
            return Err(Error::EraseFailed {
                block,
                status: status.bits(),
            });
        }
        Ok(status)
    }

    /// Erase blocks `start..=end`
    ///
    /// Blocks reporting FAIL do not stop the sweep; they are returned in
    /// ascending order. Any other error aborts.
    pub fn erase_blocks(&mut self, start: u32, end: u32) -> Result<Vec<u32>> {
        self.geometry.check_block(start)?;
        self.geometry.check_block(end)?;
        log::info!("Erasing blocks {}..={}", start, end);

        let mut failed = Vec::new();
        for block in start..=end {
            match self.erase_block(block) {
                Ok(_) => {}
                Err(Error::EraseFailed { .. }) => failed.push(block),
                Err(e) => return Err(e),
            }
        }
        Ok(failed)
    }

    /// Erase every block of the device
    pub fn erase_chip(&mut self) -> Result<Vec<u32>> {
        let last = self.geometry.block_count() - 1;
        self.erase_blocks(0, last)
    }

    // ========================================================================
    // Bad blocks
    // ========================================================================

    /// Find blocks whose first page has a non-0xFF first spare byte
    ///
    /// Read-only; repeated scans return the same list.
    pub fn scan_bad_blocks(&mut self) -> Result<Vec<u32>> {
        let mut bad = Vec::new();
        let marker = self.geometry.page_size as usize + SCAN_BAD_MARKER_OFFSET;

        for block in 0..self.geometry.block_count() {
            let page = self.read_page(self.geometry.first_page(block), true)?;
            if matches!(page.get(marker), Some(&b) if b != 0xFF) {
                log::info!("Bad block found: {}", block);
                bad.push(block);
            }
        }

        log::info!(
            "Checked {} blocks and found {} bad blocks",
            self.geometry.block_count(),
            bad.len()
        );
        Ok(bad)
    }

    /// Inline bad-block check used before writing a block
    ///
    /// Looks at spare byte 5 of the first two pages of the block.
    pub fn is_block_bad(&mut self, block: u32) -> Result<bool> {
        self.geometry.check_block(block)?;
        let first = self.geometry.first_page(block);
        for page in first..first + MARKER_PAGES.min(self.geometry.pages_per_block) {
            let oob = self.read_oob(page)?;
            if matches!(oob.get(INLINE_BAD_MARKER_OFFSET), Some(&b) if b != 0xFF) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ========================================================================
    // Sequential read
    // ========================================================================

    /// Read a whole block with a single read command
    ///
    /// The device advances to the next page on its own. Chip enable is
    /// released afterwards on every path. Returns `None` when the block is
    /// marked bad and `raw` is off; never partial data.
    pub fn read_block_sequential(
        &mut self,
        block: u32,
        include_oob: bool,
        raw: bool,
    ) -> Result<Option<Vec<u8>>> {
        self.geometry.check_block(block)?;

        let streamed = self.stream_block(block, include_oob);
        let released = self
            .bus
            .set_aux_lines(AuxLines::CE_RELEASE)
            .and_then(|_| self.bus.set_aux_lines(AuxLines::empty()));
        let (data, bad) = streamed?;
        released?;

        if bad && !raw {
            log::info!("Skipping bad block at {}", block);
            return Ok(None);
        }
        Ok(Some(data))
    }

    fn stream_block(&mut self, block: u32, include_oob: bool) -> Result<(Vec<u8>, bool)> {
        let geo = &self.geometry;
        let page_size = geo.page_size as usize;
        let raw_size = geo.raw_page_size() as usize;
        let per_page = if include_oob { raw_size } else { page_size };

        self.scheme()
            .begin_sequential(&mut self.bus, geo, &self.config, geo.first_page(block))?;

        let mut data = Vec::with_capacity(per_page * geo.pages_per_block as usize);
        let mut page = vec![0u8; raw_size];
        let mut bad = false;

        for index in 0..geo.pages_per_block {
            protocol::read_data(&mut self.bus, &mut page)?;
            if index < MARKER_PAGES
                && matches!(page.get(page_size + INLINE_BAD_MARKER_OFFSET), Some(&b) if b != 0xFF)
            {
                bad = true;
            }
            data.extend_from_slice(&page[..per_page]);
            protocol::wait_ready(&mut self.bus, &self.config)?;
        }

        Ok((data, bad))
    }

    fn check_page_in_block(&self, block: u32, page_in_block: u32) -> Result<()> {
        self.geometry.check_block(block)?;
        if page_in_block >= self.geometry.pages_per_block {
            return Err(InvalidArgument::PageOutOfRange {
                page: page_in_block,
                page_count: self.geometry.pages_per_block,
            }
            .into());
        }
        Ok(())
    }
}
