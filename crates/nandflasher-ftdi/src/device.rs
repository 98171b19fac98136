//! FTDI MCU host-bus adapter implementation
//!
//! This module provides the `FtdiNand` struct that implements the NAND
//! bus cycles using the FT2232H MCU host-bus emulation mode and the
//! `NandBus` trait.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use ftdi::{find_by_vid_pid, BitMode, Device, Interface};
use nandflasher_core::bus::{AuxLines, Latch, NandBus};
use nandflasher_core::error::Result as CoreResult;

use crate::config::{FtdiConfig, FtdiInterface};
use crate::error::{FtdiError, Result};
use crate::protocol::*;

/// How long a response may stall before the adapter is considered gone
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// NAND bus over an FT2232H in MCU host-bus emulation mode
pub struct FtdiNand {
    /// libftdi device context
    device: Device,
    /// Transfer clock
    clock: ClockMode,
    /// Current write-protect level, carried in every write cycle
    write_protect: bool,
    /// Reusable command buffer
    cmd: Vec<u8>,
}

impl FtdiNand {
    /// Open the adapter with the given configuration
    pub fn open(config: &FtdiConfig) -> Result<Self> {
        log::info!(
            "Opening FTDI {:04X}:{:04X} channel {}",
            config.vid,
            config.pid,
            config.interface.letter()
        );

        let interface = match config.interface {
            FtdiInterface::A => Interface::A,
            FtdiInterface::B => Interface::B,
        };

        let mut device = find_by_vid_pid(config.vid, config.pid)
            .interface(interface)
            .open()
            .map_err(|e| FtdiError::OpenFailed(format!("{}", e)))?;

        device
            .set_bitmode(0x00, BitMode::Mcu)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set MCU mode failed: {}", e)))?;

        device
            .set_latency_timer(LATENCY_MIN)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set latency timer failed: {}", e)))?;

        device
            .usb_purge_buffers()
            .map_err(|e| FtdiError::ConfigFailed(format!("Purge failed: {}", e)))?;

        let mut nand = FtdiNand {
            device,
            clock: config.clock,
            write_protect: true,
            cmd: Vec::with_capacity(MAX_READ_LEN * 2 + 8),
        };

        log::debug!("Selecting {:?} clock", config.clock);
        nand.send(&[config.clock.prescaler_command()])?;
        nand.send(&aux_command(AuxLines::empty()))?;

        Ok(nand)
    }

    /// Open the default FT2232H channel B
    pub fn open_default() -> Result<Self> {
        Self::open(&FtdiConfig::default())
    }

    /// Send data to the FTDI device
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .write_all(data)
            .map_err(|e| FtdiError::TransferFailed(format!("Write failed: {}", e)))?;
        log::trace!("Sent {} bytes", data.len());
        Ok(())
    }

    /// Send the pending command buffer
    fn flush_cmd(&mut self) -> Result<()> {
        let cmd = std::mem::take(&mut self.cmd);
        let result = self.send(&cmd);
        self.cmd = cmd;
        self.cmd.clear();
        result
    }

    /// Receive exactly `buf.len()` bytes, giving up after a stall
    fn recv(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut total = 0;
        let mut last_progress = Instant::now();

        while total < buf.len() {
            match self.device.read(&mut buf[total..]) {
                Ok(0) => {
                    if last_progress.elapsed() > RECV_TIMEOUT {
                        return Err(FtdiError::ShortRead {
                            expected: buf.len(),
                            received: total,
                        });
                    }
                    std::thread::sleep(Duration::from_micros(100));
                }
                Ok(n) => {
                    total += n;
                    last_progress = Instant::now();
                }
                Err(e) => {
                    return Err(FtdiError::TransferFailed(format!("Read failed: {}", e)));
                }
            }
        }

        log::trace!("Received {} bytes", total);
        Ok(())
    }

    fn write_bus(&mut self, latch: Latch, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let flags = BusFlags::for_write(latch, self.write_protect);
        encode_write(flags, data, &mut self.cmd);
        self.flush_cmd()
    }

    fn read_bus(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        encode_read(BusFlags::empty(), buf.len(), &mut self.cmd);
        self.flush_cmd()?;

        let mut response = vec![0u8; self.clock.response_len(buf.len())];
        self.recv(&mut response)?;
        decode_response(self.clock, &response, buf);
        Ok(())
    }

    fn poll_ready(&mut self) -> Result<bool> {
        self.send(&[GET_BITS_HIGH, SEND_IMMEDIATE])?;
        let mut bits = [0u8; 1];
        self.recv(&mut bits)?;
        Ok(is_ready(bits[0]))
    }

    /// Release the NAND bus and leave MCU mode
    fn release(&mut self) -> Result<()> {
        self.send(&[SET_BITS_HIGH, 0x00, 0x00])?;
        self.device
            .set_bitmode(0x00, BitMode::Reset)
            .map_err(|e| FtdiError::ConfigFailed(format!("Reset bitmode failed: {}", e)))
    }
}

impl Drop for FtdiNand {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release pins on close: {}", e);
        }
    }
}

impl NandBus for FtdiNand {
    fn max_read_len(&self) -> usize {
        MAX_READ_LEN
    }

    fn write_cycles(&mut self, latch: Latch, data: &[u8]) -> CoreResult<()> {
        Ok(self.write_bus(latch, data)?)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        Ok(self.read_bus(buf)?)
    }

    fn is_ready(&mut self) -> CoreResult<bool> {
        Ok(self.poll_ready()?)
    }

    fn set_write_protect(&mut self, protect: bool) {
        self.write_protect = protect;
    }

    fn set_aux_lines(&mut self, lines: AuxLines) -> CoreResult<()> {
        Ok(self.send(&aux_command(lines))?)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}
