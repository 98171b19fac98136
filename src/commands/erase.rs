//! Erase and bad-block scan command implementations

use indicatif::{ProgressBar, ProgressStyle};
use nandflasher_flash::NandHandle;
use std::time::Duration;

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the erase command
///
/// Erases blocks `start..=end` (end defaults to the last block). Blocks
/// whose erase reports a failure are listed but do not abort the run.
pub fn run_erase(
    handle: &mut NandHandle,
    start: u32,
    end: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let last = handle.geometry().block_count() - 1;
    let end = end.unwrap_or(last);
    if start > end {
        return Err(format!("Start block {} is after end block {}", start, end).into());
    }

    let pb = spinner(format!(
        "Erasing blocks {}..={} ({} blocks)...",
        start,
        end,
        end - start + 1
    ));
    let failed = handle.erase_blocks(start, end);
    match &failed {
        Ok(_) => pb.finish_with_message("Erase complete"),
        Err(_) => pb.abandon_with_message("Erase aborted"),
    }
    let failed = failed?;

    if failed.is_empty() {
        println!("Erased {} blocks", end - start + 1);
    } else {
        println!(
            "Erased {} blocks, {} failed: {:?}",
            end - start + 1 - failed.len() as u32,
            failed.len(),
            failed
        );
    }

    Ok(())
}

/// Run the bad-block scan
pub fn run_bad_blocks(handle: &mut NandHandle) -> Result<(), Box<dyn std::error::Error>> {
    let blocks = handle.geometry().block_count();

    let pb = spinner(format!("Scanning {} blocks...", blocks));
    let bad = handle.scan_bad_blocks()?;
    pb.finish_and_clear();

    if bad.is_empty() {
        println!("No bad blocks found ({} blocks scanned)", blocks);
    } else {
        println!("{} bad block(s) of {}:", bad.len(), blocks);
        for block in &bad {
            println!("  block {:>6} (page 0x{:08X})", block, handle.geometry().first_page(*block));
        }
    }

    Ok(())
}
