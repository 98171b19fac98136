//! ONFI parameter page decoding and encoding

use heapless::String;
use zerocopy::{FromBytes, FromZeros, IntoBytes};

use crate::error::{Error, IdentifyStage, Result};

use super::types::*;

/// CRC-16 seed defined by ONFI ("ON" in ASCII)
pub const ONFI_CRC_SEED: u16 = 0x4F4E;

/// CRC-16 generator polynomial (x^16 + x^15 + x^2 + 1)
pub const ONFI_CRC_POLY: u16 = 0x8005;

/// Compute an MSB-first CRC-16 with polynomial 0x8005 and the given seed
pub fn crc16_with_seed(seed: u16, data: &[u8]) -> u16 {
    let mut crc = seed;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ ONFI_CRC_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// ONFI parameter page CRC
pub fn crc16(data: &[u8]) -> u16 {
    crc16_with_seed(ONFI_CRC_SEED, data)
}

/// Whether `bytes` starts with the "ONFI" signature
pub fn has_signature(bytes: &[u8]) -> bool {
    bytes.len() >= ONFI_SIGNATURE.len() && bytes[..ONFI_SIGNATURE.len()] == ONFI_SIGNATURE
}

fn ascii_field<const N: usize>(bytes: &[u8]) -> String<N> {
    let mut out = String::new();
    for &b in bytes.iter().take(N) {
        let c = if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '.'
        };
        // One byte per char and at most N chars, never over capacity
        let _ = out.push(c);
    }
    out
}

/// Decode a 256-byte parameter page
///
/// The signature must be present; a CRC mismatch is only recorded in
/// [`ParameterPage::crc_valid`] and logged.
pub fn parse(bytes: &[u8]) -> Result<ParameterPage> {
    if bytes.len() < PARAMETER_PAGE_LEN || !has_signature(bytes) {
        log::debug!("ONFI parameter page signature missing");
        return Err(Error::IdentificationFailed(IdentifyStage::ParameterPage));
    }

    let raw = RawParameterPage::ref_from_bytes(&bytes[..PARAMETER_PAGE_LEN])
        .map_err(|_| Error::IdentificationFailed(IdentifyStage::ParameterPage))?;

    let computed = crc16(&bytes[..CRC_COVERED_LEN]);
    let stored = raw.crc.get();
    let crc_valid = computed == stored;
    if !crc_valid {
        log::warn!(
            "ONFI parameter page CRC mismatch (stored 0x{:04X}, computed 0x{:04X})",
            stored,
            computed
        );
    }

    Ok(ParameterPage {
        revision: raw.revision.get(),
        features: raw.features.get(),
        optional_commands: raw.optional_commands.get(),
        manufacturer: ascii_field(&raw.manufacturer),
        model: ascii_field(&raw.model),
        jedec_id: raw.jedec_id,
        page_size: raw.page_size.get(),
        spare_size: raw.spare_size.get(),
        pages_per_block: raw.pages_per_block.get(),
        blocks_per_lun: raw.blocks_per_lun.get(),
        lun_count: raw.lun_count,
        address_cycles: raw.address_cycles,
        bits_per_cell: raw.bits_per_cell,
        max_bad_blocks: raw.max_bad_blocks.get(),
        crc: stored,
        crc_valid,
    })
}

fn copy_padded(dst: &mut [u8], src: &str) {
    dst.fill(b' ');
    for (d, s) in dst.iter_mut().zip(src.bytes()) {
        *d = s;
    }
}

/// Encode a parameter page with a correct CRC
///
/// Strings shorter than their field are padded with spaces. The stored
/// `crc` and `crc_valid` of `page` are ignored.
pub fn encode(page: &ParameterPage) -> [u8; PARAMETER_PAGE_LEN] {
    let mut raw = RawParameterPage::new_zeroed();
    raw.signature = ONFI_SIGNATURE;
    raw.revision.set(page.revision);
    raw.features.set(page.features);
    raw.optional_commands.set(page.optional_commands);
    copy_padded(&mut raw.manufacturer, &page.manufacturer);
    copy_padded(&mut raw.model, &page.model);
    raw.jedec_id = page.jedec_id;
    raw.page_size.set(page.page_size);
    raw.spare_size.set(page.spare_size);
    raw.pages_per_block.set(page.pages_per_block);
    raw.blocks_per_lun.set(page.blocks_per_lun);
    raw.lun_count = page.lun_count;
    raw.address_cycles = page.address_cycles;
    raw.bits_per_cell = page.bits_per_cell;
    raw.max_bad_blocks.set(page.max_bad_blocks);

    let mut out = [0u8; PARAMETER_PAGE_LEN];
    out.copy_from_slice(raw.as_bytes());
    let crc = crc16(&out[..CRC_COVERED_LEN]);
    out[CRC_COVERED_LEN..].copy_from_slice(&crc.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterPage {
        let mut page = ParameterPage {
            revision: 0x001E,
            page_size: 4096,
            spare_size: 224,
            pages_per_block: 256,
            blocks_per_lun: 2048,
            lun_count: 1,
            address_cycles: 0x23,
            bits_per_cell: 2,
            jedec_id: 0x2C,
            max_bad_blocks: 40,
            ..Default::default()
        };
        page.manufacturer.push_str("MICRON").unwrap();
        page.model.push_str("MT29F16G08CBACA").unwrap();
        page
    }

    #[test]
    fn test_layout_size() {
        assert_eq!(core::mem::size_of::<RawParameterPage>(), PARAMETER_PAGE_LEN);
    }

    #[test]
    fn test_crc_catalog_value() {
        // CRC-16/UMTS: same polynomial, zero seed
        assert_eq!(crc16_with_seed(0, b"123456789"), 0xFEE8);
        assert_eq!(crc16(&[]), ONFI_CRC_SEED);
    }

    #[test]
    fn test_field_offsets() {
        let bytes = encode(&sample());
        assert_eq!(&bytes[0..4], b"ONFI");
        assert_eq!(&bytes[32..38], b"MICRON");
        assert_eq!(bytes[38], b' ');
        assert_eq!(&bytes[44..59], b"MT29F16G08CBACA");
        assert_eq!(bytes[64], 0x2C);
        assert_eq!(&bytes[80..84], &4096u32.to_le_bytes());
        assert_eq!(&bytes[84..86], &224u16.to_le_bytes());
        assert_eq!(&bytes[92..96], &256u32.to_le_bytes());
        assert_eq!(&bytes[96..100], &2048u32.to_le_bytes());
        assert_eq!(bytes[100], 1);
        assert_eq!(bytes[101], 0x23);
        assert_eq!(bytes[102], 2);
    }

    #[test]
    fn test_parse_encoded() {
        let bytes = encode(&sample());
        let page = parse(&bytes).unwrap();
        assert!(page.crc_valid);
        assert_eq!(page.page_size, 4096);
        assert_eq!(page.spare_size, 224);
        assert_eq!(page.pages_per_block, 256);
        assert_eq!(page.blocks_per_lun, 2048);
        assert_eq!(page.lun_count, 1);
        assert_eq!(page.bits_per_cell, 2);
        assert_eq!(page.model.trim_end(), "MT29F16G08CBACA");
        assert_eq!(page.manufacturer.trim_end(), "MICRON");
        assert_eq!(page.onfi_version(), Some((2, 2)));
        assert_eq!(page.row_cycles(), 3);
        assert_eq!(page.column_cycles(), 2);
    }

    #[test]
    fn test_crc_mismatch_is_not_fatal() {
        let mut bytes = encode(&sample());
        bytes[200] ^= 0x01;
        let page = parse(&bytes).unwrap();
        assert!(!page.crc_valid);
        assert_eq!(page.page_size, 4096);
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = encode(&sample());
        bytes[0] = b'X';
        assert_eq!(
            parse(&bytes),
            Err(Error::IdentificationFailed(IdentifyStage::ParameterPage))
        );
        assert!(parse(&bytes[..100]).is_err());
    }
}
