//! Device identification
//!
//! READ-ID at address 0 gives the manufacturer code, READ-ID at 0x20 must
//! return "ONFI", and the parameter page then supplies the geometry.

use crate::bus::NandBus;
use crate::config::NandConfig;
use crate::error::{Error, IdentifyStage, Result};
use crate::geometry::{AddressingMode, Geometry};
use crate::onfi::{self, ParameterPage, PARAMETER_PAGE_LEN};
use crate::opcodes;
use crate::protocol;
use crate::vendor;

use super::device::NandDevice;

/// Address cycles used by every ONFI-identified device
const ONFI_ADDRESS_CYCLES: u8 = 5;

/// Bytes returned by READ-ID at address 0
pub const ID_LEN: usize = 8;

fn read_id<B: NandBus + ?Sized>(bus: &mut B, addr: u8, buf: &mut [u8]) -> Result<()> {
    protocol::send_command(bus, opcodes::READ_ID)?;
    protocol::send_address(bus, addr as u64, 1)?;
    protocol::read_data(bus, buf)
}

fn read_parameter_page<B: NandBus + ?Sized>(
    bus: &mut B,
    config: &NandConfig,
) -> Result<[u8; PARAMETER_PAGE_LEN]> {
    let mut buf = [0u8; PARAMETER_PAGE_LEN];
    protocol::send_command(bus, opcodes::READ_PARAM_PAGE)?;
    protocol::send_address(bus, 0, 1)?;
    protocol::wait_ready(bus, config)?;
    protocol::read_data(bus, &mut buf)?;
    Ok(buf)
}

/// Build the geometry of an ONFI device from its parameter page
///
/// `manufacturer_code` is byte 0 of READ-ID; it only selects the vendor
/// name. The address cycle count is fixed at 5.
pub fn geometry_from_parameter_page(
    page: &ParameterPage,
    manufacturer_code: u8,
) -> Result<Geometry> {
    if page.page_size == 0
        || page.pages_per_block == 0
        || page.blocks_per_lun == 0
        || page.lun_count == 0
    {
        log::debug!("ONFI parameter page describes an empty array");
        return Err(Error::IdentificationFailed(IdentifyStage::ParameterPage));
    }

    let geometry = Geometry {
        page_size: page.page_size,
        oob_size: page.spare_size as u32,
        pages_per_block: page.pages_per_block,
        blocks_per_lun: page.blocks_per_lun,
        lun_count: page.lun_count as u32,
        address_cycles: ONFI_ADDRESS_CYCLES,
        bits_per_cell: page.bits_per_cell,
        manufacturer_id: page.jedec_id,
        manufacturer: vendor::manufacturer_name(manufacturer_code),
        onfi_manufacturer: page.manufacturer.clone(),
        model: page.model.clone(),
        onfi_revision: page.revision,
        addressing: AddressingMode::LargePage,
    };
    if geometry.check_dimensions().is_err() {
        log::debug!(
            "ONFI parameter page describes an array too large to address ({} LUNs x {} blocks x {} pages of {}+{} bytes)",
            page.lun_count,
            page.blocks_per_lun,
            page.pages_per_block,
            page.page_size,
            page.spare_size
        );
        return Err(Error::IdentificationFailed(IdentifyStage::ParameterPage));
    }
    Ok(geometry)
}

impl<B: NandBus> NandDevice<B> {
    /// Identify an ONFI device and take ownership of its bus
    ///
    /// Waits for the device to become ready, probes READ-ID, checks the
    /// "ONFI" signature, then reads and decodes the parameter page.
    pub fn identify(mut bus: B, config: NandConfig) -> Result<Self> {
        protocol::wait_ready(&mut bus, &config)?;

        let mut id = [0u8; ID_LEN];
        read_id(&mut bus, opcodes::READ_ID_ADDR_JEDEC, &mut id)?;
        log::debug!("READ-ID: {:02X?}", id);

        let mut signature = [0u8; 4];
        read_id(&mut bus, opcodes::READ_ID_ADDR_ONFI, &mut signature)?;
        if !onfi::has_signature(&signature) {
            log::debug!("Not an ONFI device, signature read {:02X?}", signature);
            return Err(Error::IdentificationFailed(IdentifyStage::OnfiProbe));
        }

        let raw = read_parameter_page(&mut bus, &config)?;
        let parameter_page = onfi::parse(&raw)?;
        let geometry = geometry_from_parameter_page(&parameter_page, id[0])?;

        log::info!(
            "Found {} {} ({} MiB, {}+{} byte pages, {} pages/block, {} blocks)",
            geometry.manufacturer,
            geometry.id_string(),
            geometry.chip_size_mb(),
            geometry.page_size,
            geometry.oob_size,
            geometry.pages_per_block,
            geometry.block_count()
        );

        Ok(Self {
            bus,
            geometry,
            config,
            parameter_page: Some(parameter_page),
        })
    }

    /// Issue READ-ID at address 0 and return the raw ID bytes
    pub fn read_id(&mut self) -> Result<[u8; ID_LEN]> {
        let mut id = [0u8; ID_LEN];
        read_id(&mut self.bus, opcodes::READ_ID_ADDR_JEDEC, &mut id)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page_size: u32, spare: u16, ppb: u32, blocks: u32, luns: u8) -> ParameterPage {
        ParameterPage {
            page_size,
            spare_size: spare,
            pages_per_block: ppb,
            blocks_per_lun: blocks,
            lun_count: luns,
            bits_per_cell: 1,
            jedec_id: 0x2C,
            ..Default::default()
        }
    }

    #[test]
    fn test_geometry_from_parameter_page() {
        let geo = geometry_from_parameter_page(&page(4096, 224, 256, 2048, 1), 0x2C).unwrap();
        assert_eq!(geo.raw_page_size(), 4320);
        assert_eq!(geo.page_count(), 524_288);
        assert_eq!(geo.address_cycles, ONFI_ADDRESS_CYCLES);
        assert_eq!(geo.addressing, AddressingMode::LargePage);
    }

    #[test]
    fn test_empty_parameter_page_rejected() {
        assert_eq!(
            geometry_from_parameter_page(&page(4096, 224, 256, 0, 1), 0x2C),
            Err(Error::IdentificationFailed(IdentifyStage::ParameterPage))
        );
    }

    #[test]
    fn test_oversized_parameter_page_rejected() {
        // Each field is plausible on its own but the page count needs 34 bits
        let mut corrupt = page(16384, 1872, 65536, 65536, 4);
        corrupt.crc_valid = false;
        assert_eq!(
            geometry_from_parameter_page(&corrupt, 0x2C),
            Err(Error::IdentificationFailed(IdentifyStage::ParameterPage))
        );

        // Page count fits, bytes per block do not
        assert_eq!(
            geometry_from_parameter_page(&page(65536, 2048, 65536, 2, 1), 0x2C),
            Err(Error::IdentificationFailed(IdentifyStage::ParameterPage))
        );
    }
}
