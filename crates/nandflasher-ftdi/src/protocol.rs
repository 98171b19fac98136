//! FTDI MCU host-bus emulation command encoding
//!
//! In MCU mode the FT2232H drives an 8-bit address/data bus. The NAND
//! control lines are wired to the upper address byte, so every bus cycle
//! carries a set of [`BusFlags`] selecting CLE, ALE and the write-protect
//! level.
//!
//! ```text
//! write: 0x93 <flags> 0x00 <d0>   then   0x92 0x00 <dN>  per extra byte
//! read:  0x91 <flags> 0x00        then   0x90 0x00       per extra byte, 0x87
//! ```

use bitflags::bitflags;
use nandflasher_core::bus::{AuxLines, Latch};

// ============================================================================
// USB identifiers
// ============================================================================

/// FTDI vendor ID
pub const FTDI_VID: u16 = 0x0403;

/// FT2232H product ID
pub const FTDI_FT2232H_PID: u16 = 0x6010;

// ============================================================================
// MCU host-bus emulation commands
// ============================================================================

/// Read one byte at an 8-bit address
pub const READ_SHORT: u8 = 0x90;

/// Read one byte at a 16-bit address
pub const READ_EXTENDED: u8 = 0x91;

/// Write one byte at an 8-bit address
pub const WRITE_SHORT: u8 = 0x92;

/// Write one byte at a 16-bit address
pub const WRITE_EXTENDED: u8 = 0x93;

/// Set the high data bits (value, direction)
pub const SET_BITS_HIGH: u8 = 0x82;

/// Read the high data bits
pub const GET_BITS_HIGH: u8 = 0x83;

/// Flush the response buffer back to the host
pub const SEND_IMMEDIATE: u8 = 0x87;

/// Disable the divide-by-5 clock prescaler (60 MHz)
pub const DIS_DIV_5: u8 = 0x8A;

/// Enable the divide-by-5 clock prescaler (12 MHz)
pub const EN_DIV_5: u8 = 0x8B;

// ============================================================================
// Pins and limits
// ============================================================================

/// Ready/busy input in the high data bits
pub const READY_PIN: u8 = 0x02;

/// Chip-enable release output in the high data bits
pub const CE_RELEASE_PIN: u8 = 0x01;

/// High data bits driven as outputs
pub const HIGH_PIN_DIR: u8 = 0x01;

/// Minimum latency timer value in milliseconds
pub const LATENCY_MIN: u8 = 2;

/// Largest read transaction issued in one USB round trip
pub const MAX_READ_LEN: usize = 0x1000;

bitflags! {
    /// Control lines carried in the high address byte of each bus cycle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BusFlags: u8 {
        /// Chip enable
        const CE = 0x10;
        /// Write-protect line released (writes allowed)
        const WP = 0x20;
        /// Command latch enable
        const CL = 0x40;
        /// Address latch enable
        const AL = 0x80;
    }
}

impl BusFlags {
    /// Flags for a write cycle on `latch`
    pub fn for_write(latch: Latch, write_protect: bool) -> Self {
        let mut flags = match latch {
            Latch::Command => Self::CL,
            Latch::Address => Self::AL,
            Latch::Data => Self::empty(),
        };
        if !write_protect {
            flags |= Self::WP;
        }
        flags
    }
}

/// Transfer clock selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// 60 MHz base clock
    #[default]
    Fast,
    /// 12 MHz base clock; every read byte arrives twice
    Slow,
}

impl ClockMode {
    /// Prescaler command selecting this clock
    pub fn prescaler_command(self) -> u8 {
        match self {
            ClockMode::Fast => DIS_DIV_5,
            ClockMode::Slow => EN_DIV_5,
        }
    }

    /// Bytes returned by the adapter for `count` read cycles
    pub fn response_len(self, count: usize) -> usize {
        match self {
            ClockMode::Fast => count,
            ClockMode::Slow => count * 2,
        }
    }
}

/// Append the write cycles for `data` to `out`
///
/// Nothing is appended for empty data.
pub fn encode_write(flags: BusFlags, data: &[u8], out: &mut Vec<u8>) {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    out.reserve(4 + rest.len() * 3);
    out.extend_from_slice(&[WRITE_EXTENDED, flags.bits(), 0x00, first]);
    for &b in rest {
        out.extend_from_slice(&[WRITE_SHORT, 0x00, b]);
    }
}

/// Append the read cycles for `count` bytes to `out`, followed by a flush
pub fn encode_read(flags: BusFlags, count: usize, out: &mut Vec<u8>) {
    if count == 0 {
        return;
    }
    out.reserve(4 + (count - 1) * 2);
    out.extend_from_slice(&[READ_EXTENDED, flags.bits(), 0x00]);
    for _ in 1..count {
        out.extend_from_slice(&[READ_SHORT, 0x00]);
    }
    out.push(SEND_IMMEDIATE);
}

/// Copy a response into `buf`, dropping the duplicate bytes of slow mode
pub fn decode_response(clock: ClockMode, response: &[u8], buf: &mut [u8]) {
    match clock {
        ClockMode::Fast => {
            let len = buf.len().min(response.len());
            buf[..len].copy_from_slice(&response[..len]);
        }
        ClockMode::Slow => {
            for (dst, src) in buf.iter_mut().zip(response.iter().step_by(2)) {
                *dst = *src;
            }
        }
    }
}

/// Command driving the auxiliary outputs in the high data bits
pub fn aux_command(lines: AuxLines) -> [u8; 3] {
    let value = if lines.contains(AuxLines::CE_RELEASE) {
        CE_RELEASE_PIN
    } else {
        0x00
    };
    [SET_BITS_HIGH, value, HIGH_PIN_DIR]
}

/// Whether a GET_BITS_HIGH response reports the device ready
pub fn is_ready(bits: u8) -> bool {
    bits & READY_PIN != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_flags() {
        assert_eq!(BusFlags::for_write(Latch::Command, true), BusFlags::CL);
        assert_eq!(BusFlags::for_write(Latch::Address, true), BusFlags::AL);
        assert_eq!(BusFlags::for_write(Latch::Data, true), BusFlags::empty());
        assert_eq!(
            BusFlags::for_write(Latch::Address, false).bits(),
            0x80 | 0x20
        );
    }

    #[test]
    fn test_encode_command() {
        let mut out = Vec::new();
        encode_write(BusFlags::CL, &[0x90], &mut out);
        assert_eq!(out, [0x93, 0x40, 0x00, 0x90]);
    }

    #[test]
    fn test_encode_data() {
        let mut out = Vec::new();
        encode_write(BusFlags::WP, &[0xAA, 0xBB, 0xCC], &mut out);
        assert_eq!(
            out,
            [0x93, 0x20, 0x00, 0xAA, 0x92, 0x00, 0xBB, 0x92, 0x00, 0xCC]
        );

        out.clear();
        encode_write(BusFlags::WP, &[], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_encode_read() {
        let mut out = Vec::new();
        encode_read(BusFlags::empty(), 3, &mut out);
        assert_eq!(out, [0x91, 0x00, 0x00, 0x90, 0x00, 0x90, 0x00, 0x87]);

        out.clear();
        encode_read(BusFlags::empty(), 1, &mut out);
        assert_eq!(out, [0x91, 0x00, 0x00, 0x87]);
    }

    #[test]
    fn test_slow_mode_decimation() {
        assert_eq!(ClockMode::Slow.response_len(3), 6);
        let mut buf = [0u8; 3];
        decode_response(ClockMode::Slow, &[0x11, 0x11, 0x22, 0x22, 0x33, 0x33], &mut buf);
        assert_eq!(buf, [0x11, 0x22, 0x33]);

        decode_response(ClockMode::Fast, &[0x44, 0x55, 0x66], &mut buf);
        assert_eq!(buf, [0x44, 0x55, 0x66]);
    }

    #[test]
    fn test_aux_and_ready() {
        assert_eq!(aux_command(AuxLines::CE_RELEASE), [0x82, 0x01, 0x01]);
        assert_eq!(aux_command(AuxLines::empty()), [0x82, 0x00, 0x01]);
        assert!(is_ready(0x02));
        assert!(is_ready(0xFF));
        assert!(!is_ready(0xFD));
    }

    #[test]
    fn test_clock_prescaler() {
        assert_eq!(ClockMode::Fast.prescaler_command(), 0x8A);
        assert_eq!(ClockMode::Slow.prescaler_command(), 0x8B);
    }
}
