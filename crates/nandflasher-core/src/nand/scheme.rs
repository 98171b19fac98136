//! Addressing schemes
//!
//! Large-page (ONFI) and legacy small-page devices read and program pages
//! with different command sequences. The sequence set is chosen once from
//! [`AddressingMode`] and used through `&'static dyn PageScheme`.
//!
//! Callers are responsible for range checks and for releasing write
//! protection around [`PageScheme::program_page`].

use crate::bus::NandBus;
use crate::config::NandConfig;
use crate::error::Result;
use crate::geometry::{AddressingMode, Geometry};
use crate::opcodes::{self, Status};
use crate::protocol;

/// Command sequences of one addressing regime
pub trait PageScheme: Sync {
    /// Mode this scheme implements
    fn mode(&self) -> AddressingMode;

    /// Read one page from column 0 into `buf`
    ///
    /// `buf` is either `page_size` bytes (main area only) or
    /// `raw_page_size` bytes (main area followed by the spare area).
    fn read_page(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        buf: &mut [u8],
    ) -> Result<()>;

    /// Read the spare area of one page into `buf` (`oob_size` bytes)
    fn read_oob(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        buf: &mut [u8],
    ) -> Result<()>;

    /// Program one page from a `raw_page_size` buffer, retrying on FAIL
    fn program_page(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        data: &[u8],
    ) -> Result<Status>;

    /// Start a read at `page`, column 0, that streams following pages
    fn begin_sequential(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
    ) -> Result<()>;
}

impl AddressingMode {
    /// Command sequences for this mode
    pub fn scheme(&self) -> &'static dyn PageScheme {
        match self {
            Self::LargePage => &LargePage,
            Self::SmallPage => &SmallPage,
        }
    }
}

fn row_address(mode: AddressingMode, page: u32) -> u64 {
    (page as u64) << mode.row_shift()
}

// ============================================================================
// Large page
// ============================================================================

/// ONFI large-page sequences: READ / READ-START, two column cycles
#[derive(Debug, Clone, Copy)]
pub struct LargePage;

impl LargePage {
    fn start_read(
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        column: u32,
    ) -> Result<()> {
        let addr = row_address(AddressingMode::LargePage, page) | column as u64;
        protocol::send_command(bus, opcodes::READ0)?;
        protocol::send_address(bus, addr, geometry.address_cycles)?;
        protocol::send_command(bus, opcodes::READ_START)?;
        protocol::wait_ready(bus, config)
    }
}

impl PageScheme for LargePage {
    fn mode(&self) -> AddressingMode {
        AddressingMode::LargePage
    }

    fn read_page(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        Self::start_read(bus, geometry, config, page, 0)?;
        protocol::read_data(bus, buf)
    }

    fn read_oob(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        Self::start_read(bus, geometry, config, page, geometry.page_size)?;
        protocol::read_data(bus, buf)
    }

    fn program_page(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        data: &[u8],
    ) -> Result<Status> {
        let addr = row_address(AddressingMode::LargePage, page);
        protocol::program_with_retry(bus, config, page, |bus| {
            protocol::send_command(bus, opcodes::SEQIN)?;
            protocol::wait_ready(bus, config)?;
            protocol::send_address(bus, addr, geometry.address_cycles)?;
            protocol::wait_ready(bus, config)?;
            protocol::write_data(bus, data)?;
            protocol::send_command(bus, opcodes::PAGE_PROG)
        })
    }

    fn begin_sequential(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
    ) -> Result<()> {
        Self::start_read(bus, geometry, config, page, 0)
    }
}

// ============================================================================
// Small page
// ============================================================================

/// Legacy small-page sequences: READ0 / READ1 / READ-OOB area pointers
#[derive(Debug, Clone, Copy)]
pub struct SmallPage;

impl SmallPage {
    /// Select an area with a pointer command and latch the page address
    fn point(
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        pointer: u8,
        page: u32,
    ) -> Result<()> {
        protocol::send_command(bus, pointer)?;
        protocol::wait_ready(bus, config)?;
        protocol::send_address(
            bus,
            row_address(AddressingMode::SmallPage, page),
            geometry.address_cycles,
        )?;
        protocol::wait_ready(bus, config)
    }

    /// Pointer command and byte range of each area of a raw page
    fn areas(geometry: &Geometry) -> [(u8, usize, usize); 3] {
        let half = geometry.page_size as usize / 2;
        let main = geometry.page_size as usize;
        let raw = geometry.raw_page_size() as usize;
        [
            (opcodes::READ0, 0, half),
            (opcodes::READ1, half, main),
            (opcodes::READ_OOB, main, raw),
        ]
    }
}

impl PageScheme for SmallPage {
    fn mode(&self) -> AddressingMode {
        AddressingMode::SmallPage
    }

    fn read_page(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        for (pointer, start, end) in Self::areas(geometry) {
            if start >= buf.len() {
                break;
            }
            let end = end.min(buf.len());
            Self::point(bus, geometry, config, pointer, page)?;
            protocol::read_data(bus, &mut buf[start..end])?;
        }
        Ok(())
    }

    fn read_oob(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        Self::point(bus, geometry, config, opcodes::READ_OOB, page)?;
        protocol::read_data(bus, buf)
    }

    fn program_page(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
        data: &[u8],
    ) -> Result<Status> {
        let addr = row_address(AddressingMode::SmallPage, page);
        let mut status = Status::empty();

        for (pointer, start, end) in Self::areas(geometry) {
            let part = &data[start..end.min(data.len())];
            if part.is_empty() {
                continue;
            }
            status = protocol::program_with_retry(bus, config, page, |bus| {
                protocol::send_command(bus, pointer)?;
                protocol::send_command(bus, opcodes::SEQIN)?;
                protocol::wait_ready(bus, config)?;
                protocol::send_address(bus, addr, geometry.address_cycles)?;
                protocol::wait_ready(bus, config)?;
                protocol::write_data(bus, part)?;
                protocol::send_command(bus, opcodes::PAGE_PROG)
            })?;
        }

        Ok(status)
    }

    fn begin_sequential(
        &self,
        bus: &mut dyn NandBus,
        geometry: &Geometry,
        config: &NandConfig,
        page: u32,
    ) -> Result<()> {
        Self::point(bus, geometry, config, opcodes::READ0, page)
    }
}
