//! Feature register and cell mode commands

use nandflasher_core::nand::{CellMode, FEATURE_LEN};
use nandflasher_flash::NandHandle;

fn format_feature(value: &[u8]) -> String {
    value
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read and print a feature register
pub fn cmd_get(handle: &mut NandHandle, address: u8) -> Result<(), Box<dyn std::error::Error>> {
    let value = handle.get_features(address)?;
    println!("Feature 0x{:02X}: {}", address, format_feature(&value));
    Ok(())
}

/// Write a feature register and read it back
pub fn cmd_set(
    handle: &mut NandHandle,
    address: u8,
    values: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    if values.len() != FEATURE_LEN {
        return Err(format!(
            "A feature register takes exactly {} bytes, got {}",
            FEATURE_LEN,
            values.len()
        )
        .into());
    }
    handle.set_features(address, values)?;
    let readback = handle.get_features(address)?;
    println!("Feature 0x{:02X}: {}", address, format_feature(&readback));
    if readback[..] != values[..] {
        log::warn!(
            "Feature 0x{:02X} reads back {} after writing {}",
            address,
            format_feature(&readback),
            format_feature(values)
        );
    }
    Ok(())
}

/// Show or change the SLC/MLC cell mode
pub fn cmd_cell_mode(
    handle: &mut NandHandle,
    slc_block: Option<u32>,
    mlc: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(block) = slc_block {
        println!("Converting block {} to SLC", block);
        handle.convert_block_to_slc(block)?;
    } else if mlc {
        handle.set_cell_mode(CellMode::Mlc)?;
    }

    println!("Cell mode: {}", handle.cell_mode()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_feature() {
        assert_eq!(format_feature(&[0x01, 0x00, 0xAB, 0xFF]), "01 00 AB FF");
    }
}
