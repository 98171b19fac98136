//! Info command implementation

use nandflasher_core::AddressingMode;
use nandflasher_flash::NandHandle;

/// Print the identified chip and its geometry
pub fn print_chip_info(handle: &mut NandHandle) -> Result<(), Box<dyn std::error::Error>> {
    let info = handle.chip_info().clone();
    let geo = handle.geometry().clone();

    println!("NAND Chip Information");
    println!("=====================");
    println!();
    println!(
        "ID:              {}",
        info.id
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!(
        "Manufacturer:    {} (0x{:02X})",
        info.manufacturer, geo.manufacturer_id
    );
    if !info.onfi_manufacturer.is_empty() {
        println!("ONFI vendor:     {}", info.onfi_manufacturer);
    }
    println!("Model:           {}", info.model);
    match info.onfi_version {
        Some((major, minor)) => println!("ONFI:            {}.{}", major, minor),
        None => println!("ONFI:            Not supported"),
    }
    if info.crc_valid == Some(false) {
        println!("                 (parameter page CRC mismatch)");
    }
    println!();
    println!(
        "Size:            {} MiB ({} bytes)",
        geo.chip_size_mb(),
        geo.block_count() as u64 * geo.block_size() as u64
    );
    println!(
        "Page size:       {} + {} bytes",
        geo.page_size, geo.oob_size
    );
    println!("Pages/block:     {}", geo.pages_per_block);
    println!(
        "Block size:      {} bytes ({} KiB main)",
        geo.block_size(),
        geo.page_size as u64 * geo.pages_per_block as u64 / 1024
    );
    println!(
        "Blocks:          {} ({} LUN{})",
        geo.block_count(),
        geo.lun_count,
        if geo.lun_count == 1 { "" } else { "s" }
    );
    println!("Pages:           {}", geo.page_count());
    println!("Bits per cell:   {}", geo.bits_per_cell);
    println!("Address cycles:  {}", geo.address_cycles);
    println!(
        "Addressing:      {}",
        match geo.addressing {
            AddressingMode::LargePage => "large page",
            AddressingMode::SmallPage => "small page (legacy)",
        }
    );

    Ok(())
}
