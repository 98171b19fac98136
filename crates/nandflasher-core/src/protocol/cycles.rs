//! Command, address and data cycle sequencing
//!
//! Every function is generic over the transport so that both concrete
//! buses and boxed trait objects can be driven without extra indirection.

use crate::bus::{Latch, NandBus};
use crate::config::NandConfig;
use crate::error::{Error, Result};
use crate::opcodes::{self, Status};

use super::address::encode_address;

/// Latch a single command opcode
pub fn send_command<B: NandBus + ?Sized>(bus: &mut B, opcode: u8) -> Result<()> {
    log::trace!("nand: cmd 0x{:02X}", opcode);
    bus.write_cycles(Latch::Command, &[opcode])
}

/// Latch `cycles` address bytes of `addr`, low byte first
pub fn send_address<B: NandBus + ?Sized>(bus: &mut B, addr: u64, cycles: u8) -> Result<()> {
    let bytes = encode_address(addr, cycles);
    log::trace!("nand: addr {:02X?}", bytes.as_slice());
    bus.write_cycles(Latch::Address, &bytes)
}

/// Clock out data bytes
pub fn write_data<B: NandBus + ?Sized>(bus: &mut B, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    bus.write_cycles(Latch::Data, data)
}

/// Clock in `buf.len()` data bytes, split into transport-sized transactions
pub fn read_data<B: NandBus + ?Sized>(bus: &mut B, buf: &mut [u8]) -> Result<()> {
    let max_len = bus.max_read_len().max(1);
    for chunk in buf.chunks_mut(max_len) {
        bus.read_data(chunk)?;
    }
    Ok(())
}

/// Wait for the ready/busy line to report ready
///
/// Samples the line at most `config.max_polls()` times with
/// `config.poll_interval_us` between samples, then gives up with
/// [`Error::Timeout`].
pub fn wait_ready<B: NandBus + ?Sized>(bus: &mut B, config: &NandConfig) -> Result<()> {
    for _ in 0..config.max_polls() {
        if bus.is_ready()? {
            return Ok(());
        }
        if config.poll_interval_us > 0 {
            bus.delay_us(config.poll_interval_us);
        }
    }

    log::debug!(
        "nand: device still busy after {} us",
        config.ready_timeout_us
    );
    Err(Error::Timeout)
}

/// Read the status register
pub fn read_status<B: NandBus + ?Sized>(bus: &mut B) -> Result<Status> {
    send_command(bus, opcodes::STATUS)?;
    let mut buf = [0u8; 1];
    bus.read_data(&mut buf)?;
    Ok(Status::from_byte(buf[0]))
}

/// Run a program sequence until the status register stops reporting FAIL
///
/// `program` must issue the complete sequence up to and including the
/// PAGE-PROGRAM confirm. After each attempt the device is waited on and its
/// status read; a FAIL status repeats the whole sequence. After
/// `config.program_retries` repetitions the last status is reported as
/// [`Error::ProgramFailed`].
pub fn program_with_retry<B, F>(
    bus: &mut B,
    config: &NandConfig,
    page: u32,
    mut program: F,
) -> Result<Status>
where
    B: NandBus + ?Sized,
    F: FnMut(&mut B) -> Result<()>,
{
    let attempts = config.program_retries.saturating_add(1);
    let mut status = Status::empty();

    for attempt in 1..=attempts {
        program(bus)?;
        wait_ready(bus, config)?;
        status = read_status(bus)?;
        if !status.failed() {
            return Ok(status);
        }
        log::warn!(
            "Program of page {} failed (status 0x{:02X}), attempt {}/{}",
            page,
            status.bits(),
            attempt,
            attempts
        );
    }

    Err(Error::ProgramFailed {
        page,
        status: status.bits(),
    })
}
