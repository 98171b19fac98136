//! Address cycle encoding
//!
//! NAND devices take their address least-significant byte first, one byte
//! per address-latch cycle. Callers place the page index above the column
//! bits before encoding (`page << 16` for large-page devices, `page << 8`
//! for small-page devices).

use heapless::Vec;

/// Maximum number of address cycles any supported device uses
pub const MAX_ADDRESS_CYCLES: usize = 8;

/// Address cycles as sent on the bus
pub type AddressBytes = Vec<u8, MAX_ADDRESS_CYCLES>;

/// Encode `addr` into exactly `cycles` address bytes, low byte first
///
/// Bits above `8 * cycles` are dropped. `cycles` is clamped to
/// [`MAX_ADDRESS_CYCLES`].
pub fn encode_address(addr: u64, cycles: u8) -> AddressBytes {
    let mut out = AddressBytes::new();
    let mut rest = addr;
    for _ in 0..(cycles as usize).min(MAX_ADDRESS_CYCLES) {
        // Capacity is MAX_ADDRESS_CYCLES, the loop never exceeds it
        let _ = out.push((rest & 0xFF) as u8);
        rest >>= 8;
    }
    out
}

/// Reassemble an address from its bus cycles
pub fn decode_address(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(MAX_ADDRESS_CYCLES)
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_large_page() {
        // page 0x1234 on a 5-cycle device: column 0, row 0x001234
        let bytes = encode_address(0x1234 << 16, 5);
        assert_eq!(bytes.as_slice(), &[0x00, 0x00, 0x34, 0x12, 0x00]);
    }

    #[test]
    fn test_encode_small_page() {
        let bytes = encode_address(0x0102 << 8, 4);
        assert_eq!(bytes.as_slice(), &[0x00, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_truncates() {
        let bytes = encode_address(0xAABB_CCDD, 2);
        assert_eq!(bytes.as_slice(), &[0xDD, 0xCC]);
        assert!(encode_address(0xFF, 0).is_empty());
    }

    #[test]
    fn test_round_trip() {
        for cycles in 1u8..=5 {
            let limit = 1u64 << (8 * cycles as u32);
            for addr in [0, 1, 0x7F, limit / 3, limit - 1] {
                let bytes = encode_address(addr, cycles);
                assert_eq!(bytes.len(), cycles as usize);
                assert_eq!(decode_address(&bytes), addr);
            }
        }
    }
}
