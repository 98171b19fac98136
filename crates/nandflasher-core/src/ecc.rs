//! Spare-area ECC generation
//!
//! The bulk writer can build the spare area itself: it splits each page into
//! fixed-size ECC blocks, computes parity for every block and places the
//! parity bytes at the start of the spare area.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{InvalidArgument, Result};

/// Parity generator for one fixed-size block of page data
pub trait EccCalculator {
    /// Bytes of data covered by one parity group
    fn block_size(&self) -> usize;

    /// Parity bytes produced per block
    fn parity_len(&self) -> usize;

    /// Compute parity for `block` (exactly [`block_size`](Self::block_size)
    /// bytes) into `parity` (exactly [`parity_len`](Self::parity_len) bytes)
    fn compute(&self, block: &[u8], parity: &mut [u8]);
}

/// Compute the concatenated parity of every ECC block of `page`
pub fn compute_page(ecc: &dyn EccCalculator, page: &[u8]) -> Result<Vec<u8>> {
    let block_size = ecc.block_size();
    if block_size == 0 || page.len() % block_size != 0 {
        return Err(InvalidArgument::EccBlockSize {
            page_size: page.len(),
            block_size,
        }
        .into());
    }

    let parity_len = ecc.parity_len();
    let mut out = vec![0u8; page.len() / block_size * parity_len];
    for (block, parity) in page
        .chunks_exact(block_size)
        .zip(out.chunks_exact_mut(parity_len))
    {
        ecc.compute(block, parity);
    }
    Ok(out)
}

/// Size of a Hamming-protected block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HammingBlock {
    /// 256 data bytes, 16 line parity bits
    Bytes256,
    /// 512 data bytes, 18 line parity bits
    Bytes512,
}

/// SmartMedia-style single-error-correcting Hamming code
///
/// Produces 3 bytes per block: line parities in the first two bytes (and
/// the two low bits of the third for 512-byte blocks), column parities in
/// the upper six bits of the third. All bits are stored inverted so that an
/// erased page (all 0xFF) carries valid parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hamming {
    block: HammingBlock,
}

impl Hamming {
    /// Hamming code over blocks of the given size
    pub const fn new(block: HammingBlock) -> Self {
        Self { block }
    }
}

impl Default for Hamming {
    fn default() -> Self {
        Self::new(HammingBlock::Bytes256)
    }
}

fn parity8(b: u8) -> u8 {
    (b.count_ones() & 1) as u8
}

impl EccCalculator for Hamming {
    fn block_size(&self) -> usize {
        match self.block {
            HammingBlock::Bytes256 => 256,
            HammingBlock::Bytes512 => 512,
        }
    }

    fn parity_len(&self) -> usize {
        3
    }

    fn compute(&self, block: &[u8], parity: &mut [u8]) {
        let size = self.block_size();
        let index_bits = size.trailing_zeros();
        let mask = (size - 1) as u32;

        let mut col = 0u8;
        let mut lp_odd = 0u32;
        let mut lp_even = 0u32;
        for (i, &b) in block.iter().take(size).enumerate() {
            col ^= b;
            if parity8(b) == 1 {
                lp_odd ^= i as u32;
                lp_even ^= !(i as u32) & mask;
            }
        }

        // LP(2k) covers bytes with index bit k clear, LP(2k+1) bytes with it set
        let mut lp = 0u32;
        for k in 0..index_bits {
            lp |= ((lp_even >> k) & 1) << (2 * k);
            lp |= ((lp_odd >> k) & 1) << (2 * k + 1);
        }

        let cp = (parity8(col & 0xF0) << 7)
            | (parity8(col & 0x0F) << 6)
            | (parity8(col & 0xCC) << 5)
            | (parity8(col & 0x33) << 4)
            | (parity8(col & 0xAA) << 3)
            | (parity8(col & 0x55) << 2)
            | ((lp >> 16) & 0x03) as u8;

        parity[0] = !(lp as u8);
        parity[1] = !((lp >> 8) as u8);
        parity[2] = !cp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hamming(block: HammingBlock, data: &[u8]) -> [u8; 3] {
        let mut parity = [0u8; 3];
        Hamming::new(block).compute(data, &mut parity);
        parity
    }

    #[test]
    fn test_uniform_blocks() {
        for fill in [0x00, 0xFF] {
            assert_eq!(hamming(HammingBlock::Bytes256, &[fill; 256]), [0xFF; 3]);
            assert_eq!(hamming(HammingBlock::Bytes512, &[fill; 512]), [0xFF; 3]);
        }
    }

    #[test]
    fn test_single_bit_at_start() {
        let mut data = [0u8; 256];
        data[0] = 0x01;
        assert_eq!(hamming(HammingBlock::Bytes256, &data), [0xAA, 0xAA, 0xAB]);
    }

    #[test]
    fn test_single_bit_at_end() {
        let mut data = [0u8; 256];
        data[255] = 0x80;
        // Odd line parities all set, column parities cp1, cp3, cp5 set
        assert_eq!(hamming(HammingBlock::Bytes256, &data), [0x55, 0x55, 0x57]);
    }

    #[test]
    fn test_512_uses_high_line_bits() {
        let mut data = [0u8; 512];
        data[511] = 0x80;
        // LP17 set in addition, stored inverted in bit 1 of the third byte
        assert_eq!(hamming(HammingBlock::Bytes512, &data), [0x55, 0x55, 0x55]);
    }

    #[test]
    fn test_compute_page_concatenates() {
        let mut page = [0u8; 512];
        page[0] = 0x01;
        let parity = compute_page(&Hamming::default(), &page).unwrap();
        assert_eq!(parity, [0xAA, 0xAA, 0xAB, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_compute_page_rejects_partial_block() {
        assert!(compute_page(&Hamming::default(), &[0u8; 300]).is_err());
    }
}
