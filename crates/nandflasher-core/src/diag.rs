//! Bit-error-rate diagnostics between two captured images
//!
//! Pure functions: nothing here touches the bus.

use crate::error::{InvalidArgument, Result};

/// Result of comparing two equal-length buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Comparison {
    /// Number of bytes compared
    pub len: usize,
    /// Byte positions whose values differ
    pub differing_bytes: usize,
    /// Total number of bits that differ
    pub flipped_bits: u64,
}

impl Comparison {
    /// Fraction of differing byte positions (0.0 for empty buffers)
    pub fn error_rate(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.differing_bytes as f64 / self.len as f64
        }
    }

    /// Fraction of flipped bits (0.0 for empty buffers)
    pub fn bit_flip_rate(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.flipped_bits as f64 / (self.len as f64 * 8.0)
        }
    }
}

/// Compare two buffers position by position
pub fn compare(a: &[u8], b: &[u8]) -> Result<Comparison> {
    if a.len() != b.len() {
        return Err(InvalidArgument::LengthMismatch {
            left: a.len(),
            right: b.len(),
        }
        .into());
    }

    let mut cmp = Comparison {
        len: a.len(),
        ..Default::default()
    };
    for (x, y) in a.iter().zip(b) {
        let diff = x ^ y;
        if diff != 0 {
            cmp.differing_bytes += 1;
            cmp.flipped_bits += diff.count_ones() as u64;
        }
    }
    Ok(cmp)
}

/// Fraction of byte positions that differ between `a` and `b`
pub fn bit_error_rate(a: &[u8], b: &[u8]) -> Result<f64> {
    compare(a, b).map(|cmp| cmp.error_rate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_identical() {
        let buf = [0x12u8, 0x34, 0x56, 0x78];
        assert_eq!(bit_error_rate(&buf, &buf), Ok(0.0));
    }

    #[test]
    fn test_inverted() {
        let buf = [0x00u8, 0x5A, 0xFF, 0x01];
        let inv: [u8; 4] = buf.map(|b| !b);
        assert_eq!(bit_error_rate(&buf, &inv), Ok(1.0));
        let cmp = compare(&buf, &inv).unwrap();
        assert_eq!(cmp.flipped_bits, 32);
        assert_eq!(cmp.bit_flip_rate(), 1.0);
    }

    #[test]
    fn test_partial() {
        let a = [0xFFu8; 8];
        let mut b = a;
        b[3] = 0xFE;
        b[6] = 0x00;
        let cmp = compare(&a, &b).unwrap();
        assert_eq!(cmp.differing_bytes, 2);
        assert_eq!(cmp.flipped_bits, 9);
        assert_eq!(cmp.error_rate(), 0.25);
    }

    #[test]
    fn test_empty() {
        assert_eq!(bit_error_rate(&[], &[]), Ok(0.0));
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            bit_error_rate(&[0u8; 3], &[0u8; 4]),
            Err(Error::InvalidArgument(InvalidArgument::LengthMismatch {
                left: 3,
                right: 4
            }))
        );
    }
}
