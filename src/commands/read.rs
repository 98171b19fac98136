//! Read command implementation

use indicatif::{ProgressBar, ProgressStyle};
use nandflasher_core::Geometry;
use nandflasher_flash::NandHandle;
use std::fs;
use std::path::Path;

/// Options of the read command
pub struct ReadArgs {
    /// First page (default: 0)
    pub start: Option<u32>,
    /// Last page, inclusive (default: last page)
    pub end: Option<u32>,
    /// Include the spare area of each page
    pub include_oob: bool,
    /// Keep bad blocks in a sequential read
    pub raw: bool,
    /// Write a text dump instead of binary
    pub hex: bool,
}

/// Resolve an optional page range against the device
fn page_range(
    geo: &Geometry,
    start: Option<u32>,
    end: Option<u32>,
) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let last = geo.page_count() - 1;
    let start = start.unwrap_or(0);
    let end = end.unwrap_or(last);
    if start > end {
        return Err(format!("Start page {} is after end page {}", start, end).into());
    }
    if end > last {
        return Err(format!("End page {} is beyond the last page {}", end, last).into());
    }
    Ok((start, end))
}

/// Format bytes the way the text dumps are written: "0x0,0xff,..."
pub fn format_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:#x},", b)).collect()
}

fn write_output(path: &Path, data: &[u8], hex: bool) -> Result<(), Box<dyn std::error::Error>> {
    if hex {
        fs::write(path, format_hex(data))?;
    } else {
        fs::write(path, data)?;
    }
    println!("Wrote {} bytes to {:?}", data.len(), path);
    Ok(())
}

fn progress_bar(total: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
                unit
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Read a page range page by page
pub fn run_read(
    handle: &mut NandHandle,
    output: &Path,
    opts: &ReadArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let (start, end) = page_range(handle.geometry(), opts.start, opts.end)?;
    let per_page = if opts.include_oob {
        handle.geometry().raw_page_size()
    } else {
        handle.geometry().page_size
    } as usize;
    let count = end - start + 1;

    println!(
        "Reading pages {}..={} ({} bytes each)",
        start, end, per_page
    );

    let pb = progress_bar(count as u64, "pages");
    let mut data = Vec::with_capacity(per_page * count as usize);
    for page in start..=end {
        data.extend(handle.read_page(page, opts.include_oob)?);
        pb.inc(1);
    }
    pb.finish_with_message("Read complete");

    write_output(output, &data, opts.hex)
}

/// Read the blocks covering a page range with one read command per block
pub fn run_read_sequential(
    handle: &mut NandHandle,
    output: &Path,
    opts: &ReadArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let geo = handle.geometry().clone();
    let (start, end) = page_range(&geo, opts.start, opts.end)?;
    let first_block = geo.decompose(start).block;
    let last_block = geo.decompose(end).block;

    println!(
        "Reading blocks {}..={} sequentially{}",
        first_block,
        last_block,
        if opts.raw { " (raw)" } else { "" }
    );

    let pb = progress_bar((last_block - first_block + 1) as u64, "blocks");
    let mut data = Vec::new();
    let mut skipped = Vec::new();
    for block in first_block..=last_block {
        match handle.read_block_sequential(block, opts.include_oob, opts.raw)? {
            Some(block_data) => data.extend(block_data),
            None => skipped.push(block),
        }
        pb.inc(1);
    }
    pb.finish_with_message("Read complete");

    if !skipped.is_empty() {
        println!("Skipped {} bad block(s): {:?}", skipped.len(), skipped);
    }

    write_output(output, &data, opts.hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nandflasher_core::AddressingMode;

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x00, 0xFF, 0x1A]), "0x0,0xff,0x1a,");
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn test_page_range() {
        let geo = Geometry::new(2048, 64, 64, 16, 5, AddressingMode::LargePage).unwrap();
        assert_eq!(page_range(&geo, None, None).unwrap(), (0, 1023));
        assert_eq!(page_range(&geo, Some(5), Some(5)).unwrap(), (5, 5));
        assert!(page_range(&geo, Some(6), Some(5)).is_err());
        assert!(page_range(&geo, None, Some(1024)).is_err());
    }
}
