//! Bus transport trait definitions
//!
//! A [`NandBus`] is the byte-level link to the NAND device: it clocks bytes
//! out as command-latch, address-latch or data cycles, clocks data bytes in,
//! and samples the ready/busy line. Everything above it (addressing, command
//! sequencing, retry policy) lives in this crate.

use crate::error::Result;
use bitflags::bitflags;

/// How the device latches a byte written on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Latch {
    /// CLE asserted - the byte is a command opcode
    Command,
    /// ALE asserted - the byte is an address cycle
    Address,
    /// Neither latch asserted - the byte is page or register data
    Data,
}

bitflags! {
    /// Auxiliary control lines driven outside of command/address/data cycles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AuxLines: u8 {
        /// Deassert chip enable, terminating a sequential read
        const CE_RELEASE = 1 << 0;
    }
}

impl Default for AuxLines {
    fn default() -> Self {
        AuxLines::empty()
    }
}

/// NAND bus transport
///
/// Implementations deliver bytes reliably and in order. A lost connection or a
/// short read must be reported as [`Error::DeviceAbsent`](crate::Error::DeviceAbsent),
/// never as a successful empty transfer.
///
/// The write-protect line is a level, not a cycle: [`set_write_protect`]
/// changes the state carried by every following write cycle.
///
/// [`set_write_protect`]: NandBus::set_write_protect
pub trait NandBus {
    /// Maximum number of bytes read in a single transaction
    fn max_read_len(&self) -> usize;

    /// Clock out `data` with the given latch signals
    fn write_cycles(&mut self, latch: Latch, data: &[u8]) -> Result<()>;

    /// Clock in exactly `buf.len()` data bytes
    fn read_data(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Sample the ready/busy line once
    fn is_ready(&mut self) -> Result<bool>;

    /// Drive the write-protect line (`true` = writes and erases inhibited)
    fn set_write_protect(&mut self, protect: bool);

    /// Drive the auxiliary control lines
    fn set_aux_lines(&mut self, lines: AuxLines) -> Result<()>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

// Blanket impl for boxed transports so the registry can hand out trait objects
impl<T: NandBus + ?Sized> NandBus for alloc::boxed::Box<T> {
    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn write_cycles(&mut self, latch: Latch, data: &[u8]) -> Result<()> {
        (**self).write_cycles(latch, data)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_data(buf)
    }

    fn is_ready(&mut self) -> Result<bool> {
        (**self).is_ready()
    }

    fn set_write_protect(&mut self, protect: bool) {
        (**self).set_write_protect(protect)
    }

    fn set_aux_lines(&mut self, lines: AuxLines) -> Result<()> {
        (**self).set_aux_lines(lines)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
