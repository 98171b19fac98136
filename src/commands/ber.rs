//! Bit error rate between two dump files

use nandflasher_core::diag;
use std::fs;
use std::path::Path;

/// Compare two dumps and print the error rates
pub fn run_ber(a: &Path, b: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let left = fs::read(a)?;
    let right = fs::read(b)?;

    let cmp = diag::compare(&left, &right)?;

    println!("Compared {} bytes", cmp.len);
    println!(
        "Differing bytes: {} (BER {:.6})",
        cmp.differing_bytes,
        cmp.error_rate()
    );
    println!(
        "Flipped bits:    {} ({:.6} of all bits)",
        cmp.flipped_bits,
        cmp.bit_flip_rate()
    );

    Ok(())
}
