//! nandflasher-dummy - In-memory NAND emulator for testing
//!
//! This crate provides a simulated NAND device that implements
//! [`NandBus`]. It decodes the command, address and data cycles the engine
//! sends, keeps the array in memory and answers READ-ID, parameter page,
//! status and feature requests like an ONFI device would. It's useful for
//! testing and development without real hardware.
//!
//! Test hooks let a caller inject program failures, a stuck busy line or a
//! lost connection, and inspect the command log.

mod options;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use nandflasher_core::bus::{AuxLines, Latch, NandBus};
use nandflasher_core::error::{Error, Result};
use nandflasher_core::geometry::{AddressingMode, Geometry};
use nandflasher_core::onfi::{self, ParameterPage, PARAMETER_PAGE_LEN};
use nandflasher_core::opcodes::{self, Status};
use nandflasher_core::protocol::decode_address;

pub use options::{parse_options, DummyOptionError};

/// Configuration for the dummy NAND
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Main data bytes per page
    pub page_size: u32,
    /// Spare bytes per page
    pub oob_size: u32,
    /// Pages per erase block
    pub pages_per_block: u32,
    /// Blocks per logical unit
    pub blocks_per_lun: u32,
    /// Number of logical units
    pub lun_count: u32,
    /// Bits per cell reported in the parameter page
    pub bits_per_cell: u8,
    /// READ-ID byte 0
    pub manufacturer_id: u8,
    /// READ-ID byte 1
    pub device_id: u8,
    /// Model string reported in the parameter page
    pub model: String,
    /// Answer the ONFI signature probe and the parameter page
    pub onfi: bool,
    /// Addressing regime the device decodes
    pub addressing: AddressingMode,
    /// Address cycles of a full page address
    pub address_cycles: u8,
    /// Factory bad blocks (marker set, erase fails)
    pub bad_blocks: Vec<u32>,
    /// Busy samples reported after each array operation
    pub busy_polls: u32,
    /// Largest read transaction accepted
    pub max_read_len: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            page_size: 2048,
            oob_size: 64,
            pages_per_block: 64,
            blocks_per_lun: 64,
            lun_count: 1,
            bits_per_cell: 1,
            manufacturer_id: 0x2C, // Micron
            device_id: 0xDA,
            model: "NANDFLASHER DUMMY".to_string(),
            onfi: true,
            addressing: AddressingMode::LargePage,
            address_cycles: 5,
            bad_blocks: Vec::new(),
            busy_polls: 1,
            max_read_len: 0x1000,
        }
    }
}

impl DummyConfig {
    /// A legacy 512+16 byte small-page part without ONFI support
    pub fn small_page() -> Self {
        Self {
            page_size: 512,
            oob_size: 16,
            pages_per_block: 32,
            blocks_per_lun: 64,
            manufacturer_id: 0xEC, // Samsung
            device_id: 0x75,
            model: String::new(),
            onfi: false,
            addressing: AddressingMode::SmallPage,
            address_cycles: 4,
            ..Self::default()
        }
    }

    /// Page size including the spare area
    pub fn raw_page_size(&self) -> u32 {
        self.page_size + self.oob_size
    }

    /// Total number of erase blocks
    pub fn block_count(&self) -> u32 {
        self.blocks_per_lun * self.lun_count
    }

    /// Total number of pages
    pub fn page_count(&self) -> u32 {
        self.block_count() * self.pages_per_block
    }

    /// Geometry matching this device, for opening it without identification
    pub fn geometry(&self) -> Result<Geometry> {
        let mut geometry = Geometry::new(
            self.page_size,
            self.oob_size,
            self.pages_per_block,
            self.blocks_per_lun,
            self.address_cycles,
            self.addressing,
        )?;
        geometry.lun_count = self.lun_count;
        geometry.bits_per_cell = self.bits_per_cell;
        Ok(geometry)
    }

    /// Parameter page the device returns for READ-PARAMETER-PAGE
    pub fn parameter_page(&self) -> [u8; PARAMETER_PAGE_LEN] {
        let mut page = ParameterPage {
            revision: 0x001E, // ONFI 1.0 - 2.2
            page_size: self.page_size,
            spare_size: self.oob_size as u16,
            pages_per_block: self.pages_per_block,
            blocks_per_lun: self.blocks_per_lun,
            lun_count: self.lun_count as u8,
            address_cycles: 0x23,
            bits_per_cell: self.bits_per_cell,
            jedec_id: self.manufacturer_id,
            max_bad_blocks: 20,
            ..Default::default()
        };
        let _ = page.manufacturer.push_str("NANDFLASHER");
        for c in self.model.chars().take(page.model.capacity()) {
            let _ = page.model.push(c);
        }
        onfi::encode(&page)
    }
}

/// Command sequence position of the emulated device
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    ReadIdAddress,
    ParameterPageAddress,
    ReadAddress,
    ReadStartPending { page: u32, column: u32 },
    ProgramAddress,
    ProgramData { page: u32, column: u32, data: Vec<u8> },
    EraseAddress,
    EraseConfirm { block: u32 },
    GetFeatureAddress,
    SetFeatureAddress,
    SetFeatureData { addr: u8, data: Vec<u8> },
}

/// What the next data-out cycles return
#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    None,
    Bytes { data: Vec<u8>, pos: usize },
    Array { page: u32, column: u32 },
}

/// Simulated NAND device
pub struct DummyNand {
    config: DummyConfig,
    pages: BTreeMap<u32, Vec<u8>>,
    features: BTreeMap<u8, [u8; 4]>,
    state: State,
    output: Output,
    pointer: u8,
    last_failed: bool,
    write_protect: bool,
    busy: u32,
    fail_programs: u32,
    stuck_busy: bool,
    disconnected: bool,
    commands: Vec<u8>,
    erased_blocks: Vec<u32>,
    programmed_pages: Vec<u32>,
    ce_releases: u32,
    delayed_us: u64,
}

impl DummyNand {
    /// Create an erased device with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let mut features = BTreeMap::new();
        let cell_mode = if config.bits_per_cell > 1 { 2 } else { 1 };
        features.insert(opcodes::FEATURE_CELL_MODE, [cell_mode, 1, 0, 0]);

        let mut nand = Self {
            config,
            pages: BTreeMap::new(),
            features,
            state: State::Idle,
            output: Output::None,
            pointer: opcodes::READ0,
            last_failed: false,
            write_protect: true,
            busy: 0,
            fail_programs: 0,
            stuck_busy: false,
            disconnected: false,
            commands: Vec::new(),
            erased_blocks: Vec::new(),
            programmed_pages: Vec::new(),
            ce_releases: 0,
            delayed_us: 0,
        };

        let bad_blocks = nand.config.bad_blocks.clone();
        for block in bad_blocks {
            nand.mark_bad(block);
        }
        nand
    }

    /// Create a device with the default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a device pre-filled with a raw image (`raw_page_size` bytes per page)
    pub fn with_image(config: DummyConfig, image: &[u8]) -> Self {
        let mut nand = Self::new(config);
        let raw = nand.config.raw_page_size() as usize;
        for (page, chunk) in image.chunks(raw).enumerate() {
            if page as u32 >= nand.config.page_count() {
                break;
            }
            let mut data = vec![0xFF; raw];
            data[..chunk.len()].copy_from_slice(chunk);
            nand.set_page(page as u32, &data);
        }
        nand
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Raw contents of a page (main area followed by spare area)
    pub fn page(&self, page: u32) -> Vec<u8> {
        self.pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| vec![0xFF; self.config.raw_page_size() as usize])
    }

    /// Overwrite a page without going through the command interface
    pub fn set_page(&mut self, page: u32, data: &[u8]) {
        let raw = self.config.raw_page_size() as usize;
        let mut buf = vec![0xFF; raw];
        let len = data.len().min(raw);
        buf[..len].copy_from_slice(&data[..len]);
        if buf.iter().all(|&b| b == 0xFF) {
            self.pages.remove(&page);
        } else {
            self.pages.insert(page, buf);
        }
    }

    /// Put factory bad-block markers on a block and make its erase fail
    pub fn mark_bad(&mut self, block: u32) {
        if !self.config.bad_blocks.contains(&block) {
            self.config.bad_blocks.push(block);
        }
        let first = block * self.config.pages_per_block;
        let spare = self.config.page_size as usize;
        for page in first..first + self.config.pages_per_block.min(2) {
            let mut data = self.page(page);
            for offset in [0, 5] {
                if let Some(b) = data.get_mut(spare + offset) {
                    *b = 0x00;
                }
            }
            self.set_page(page, &data);
        }
    }

    /// Current value of a feature register
    pub fn feature(&self, addr: u8) -> [u8; 4] {
        self.features.get(&addr).copied().unwrap_or([0; 4])
    }

    /// Whether the write-protect line is currently asserted
    pub fn write_protected(&self) -> bool {
        self.write_protect
    }

    /// Report FAIL for the next `count` page programs (`u32::MAX` for all)
    pub fn fail_programs(&mut self, count: u32) {
        self.fail_programs = count;
    }

    /// Keep the ready/busy line low forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Simulate the adapter being unplugged
    pub fn disconnect(&mut self) {
        self.disconnected = true;
    }

    /// Every command opcode latched so far
    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    /// Blocks erased successfully, in order
    pub fn erased_blocks(&self) -> &[u32] {
        &self.erased_blocks
    }

    /// Pages programmed successfully, in order (one entry per sub-write)
    pub fn programmed_pages(&self) -> &[u32] {
        &self.programmed_pages
    }

    /// Number of chip-enable releases seen
    pub fn ce_releases(&self) -> u32 {
        self.ce_releases
    }

    /// Total delay requested through [`NandBus::delay_us`]
    pub fn delayed_us(&self) -> u64 {
        self.delayed_us
    }

    /// Forget the command, erase and program history
    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.erased_blocks.clear();
        self.programmed_pages.clear();
        self.ce_releases = 0;
    }

    fn check_connected(&self) -> Result<()> {
        if self.disconnected {
            return Err(Error::DeviceAbsent);
        }
        Ok(())
    }

    fn make_busy(&mut self) {
        self.busy = self.config.busy_polls;
    }

    fn status(&self) -> Status {
        let mut status = Status::READY | Status::ARRAY_READY;
        if !self.write_protect {
            status |= Status::WRITE_ENABLED;
        }
        if self.last_failed {
            status |= Status::FAIL;
        }
        status
    }

    fn pointer_base(&self) -> u32 {
        match self.pointer {
            opcodes::READ1 => self.config.page_size / 2,
            opcodes::READ_OOB => self.config.page_size,
            _ => 0,
        }
    }

    /// Split a full address into page and column
    fn split_address(&self, addr: u64) -> (u32, u32) {
        match self.config.addressing {
            AddressingMode::LargePage => ((addr >> 16) as u32, (addr & 0xFFFF) as u32),
            AddressingMode::SmallPage => {
                ((addr >> 8) as u32, self.pointer_base() + (addr & 0xFF) as u32)
            }
        }
    }

    fn id_response(&self, addr: u8) -> Vec<u8> {
        match addr {
            opcodes::READ_ID_ADDR_JEDEC => vec![
                self.config.manufacturer_id,
                self.config.device_id,
                0x00,
                0x95,
                0x00,
                0x00,
                0x00,
                0x00,
            ],
            opcodes::READ_ID_ADDR_ONFI if self.config.onfi => b"ONFI".to_vec(),
            _ => vec![0x00; 4],
        }
    }

    fn handle_command(&mut self, opcode: u8) {
        self.commands.push(opcode);
        match opcode {
            opcodes::READ_ID => self.state = State::ReadIdAddress,
            opcodes::READ_PARAM_PAGE => self.state = State::ParameterPageAddress,
            opcodes::READ0 | opcodes::READ1 | opcodes::READ_OOB => {
                self.pointer = opcode;
                self.state = State::ReadAddress;
            }
            opcodes::READ_START => {
                if let State::ReadStartPending { page, column } = self.state {
                    self.output = Output::Array { page, column };
                    self.make_busy();
                }
                self.state = State::Idle;
            }
            opcodes::SEQIN => self.state = State::ProgramAddress,
            opcodes::PAGE_PROG => {
                if let State::ProgramData { page, column, data } =
                    std::mem::replace(&mut self.state, State::Idle)
                {
                    self.program(page, column, &data);
                }
                self.pointer = opcodes::READ0;
            }
            opcodes::ERASE1 => self.state = State::EraseAddress,
            opcodes::ERASE2 => {
                if let State::EraseConfirm { block } = self.state {
                    self.erase(block);
                }
                self.state = State::Idle;
            }
            opcodes::STATUS => {
                self.output = Output::Bytes {
                    data: vec![self.status().bits()],
                    pos: 0,
                };
            }
            opcodes::GET_FEATURES => self.state = State::GetFeatureAddress,
            opcodes::SET_FEATURES => self.state = State::SetFeatureAddress,
            _ => {
                log::warn!("dummy: unsupported command 0x{:02X}", opcode);
                self.state = State::Idle;
            }
        }
    }

    fn handle_address(&mut self, bytes: &[u8]) {
        let addr = decode_address(bytes);
        let first = bytes.first().copied().unwrap_or(0);

        match std::mem::replace(&mut self.state, State::Idle) {
            State::ReadIdAddress => {
                self.output = Output::Bytes {
                    data: self.id_response(first),
                    pos: 0,
                };
            }
            State::ParameterPageAddress => {
                let data = if self.config.onfi {
                    self.config.parameter_page().to_vec()
                } else {
                    vec![0x00; PARAMETER_PAGE_LEN]
                };
                self.output = Output::Bytes { data, pos: 0 };
                self.make_busy();
            }
            State::ReadAddress => {
                let (page, column) = self.split_address(addr);
                match self.config.addressing {
                    AddressingMode::LargePage => {
                        self.state = State::ReadStartPending { page, column };
                    }
                    AddressingMode::SmallPage => {
                        self.output = Output::Array { page, column };
                        self.make_busy();
                    }
                }
            }
            State::ProgramAddress => {
                let (page, column) = self.split_address(addr);
                self.state = State::ProgramData {
                    page,
                    column,
                    data: Vec::new(),
                };
            }
            State::EraseAddress => {
                self.state = State::EraseConfirm {
                    block: addr as u32 / self.config.pages_per_block,
                };
            }
            State::GetFeatureAddress => {
                self.output = Output::Bytes {
                    data: self.feature(first).to_vec(),
                    pos: 0,
                };
                self.make_busy();
            }
            State::SetFeatureAddress => {
                self.state = State::SetFeatureData {
                    addr: first,
                    data: Vec::new(),
                };
            }
            other => {
                log::warn!("dummy: unexpected address cycles in state {:?}", other);
            }
        }
    }

    fn handle_data_in(&mut self, bytes: &[u8]) {
        match &mut self.state {
            State::ProgramData { data, .. } => data.extend_from_slice(bytes),
            State::SetFeatureData { addr, data } => {
                data.extend_from_slice(bytes);
                if data.len() >= 4 {
                    let addr = *addr;
                    let value = [data[0], data[1], data[2], data[3]];
                    self.features.insert(addr, value);
                    self.state = State::Idle;
                    self.make_busy();
                }
            }
            _ => log::warn!("dummy: data cycles outside of a program sequence"),
        }
    }

    fn program(&mut self, page: u32, column: u32, data: &[u8]) {
        self.make_busy();

        let mut failed = self.write_protect || page >= self.config.page_count();
        if self.fail_programs > 0 {
            if self.fail_programs != u32::MAX {
                self.fail_programs -= 1;
            }
            failed = true;
        }
        self.last_failed = failed;
        if failed {
            return;
        }

        let mut buf = self.page(page);
        for (i, &b) in data.iter().enumerate() {
            if let Some(cell) = buf.get_mut(column as usize + i) {
                // Programming only clears bits
                *cell &= b;
            }
        }
        self.set_page(page, &buf);
        self.programmed_pages.push(page);
    }

    fn erase(&mut self, block: u32) {
        self.make_busy();

        let failed = self.write_protect
            || block >= self.config.block_count()
            || self.config.bad_blocks.contains(&block);
        self.last_failed = failed;
        if failed {
            return;
        }

        let first = block * self.config.pages_per_block;
        let last = first + self.config.pages_per_block;
        self.pages.retain(|&page, _| page < first || page >= last);
        self.erased_blocks.push(block);
    }

    fn next_byte(&mut self) -> u8 {
        match &mut self.output {
            Output::Bytes { data, pos } => {
                let b = data.get(*pos).copied().unwrap_or(0x00);
                *pos += 1;
                b
            }
            Output::Array { page, column } => {
                let (current, offset) = (*page, *column as usize);
                *column += 1;
                if *column >= self.config.raw_page_size() {
                    // Sequential read continues on the next page
                    *page += 1;
                    *column = 0;
                }
                self.pages
                    .get(&current)
                    .and_then(|data| data.get(offset).copied())
                    .unwrap_or(0xFF)
            }
            Output::None => 0xFF,
        }
    }
}

impl NandBus for DummyNand {
    fn max_read_len(&self) -> usize {
        self.config.max_read_len
    }

    fn write_cycles(&mut self, latch: Latch, data: &[u8]) -> Result<()> {
        self.check_connected()?;
        log::trace!("dummy: {:?} {:02X?}", latch, data);
        match latch {
            Latch::Command => {
                for &opcode in data {
                    self.handle_command(opcode);
                }
            }
            Latch::Address => self.handle_address(data),
            Latch::Data => self.handle_data_in(data),
        }
        Ok(())
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<()> {
        self.check_connected()?;
        if buf.len() > self.config.max_read_len {
            log::warn!(
                "dummy: read of {} bytes exceeds transport limit {}",
                buf.len(),
                self.config.max_read_len
            );
        }
        for byte in buf.iter_mut() {
            *byte = self.next_byte();
        }
        Ok(())
    }

    fn is_ready(&mut self) -> Result<bool> {
        self.check_connected()?;
        if self.stuck_busy {
            return Ok(false);
        }
        if self.busy > 0 {
            self.busy -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn set_write_protect(&mut self, protect: bool) {
        self.write_protect = protect;
    }

    fn set_aux_lines(&mut self, lines: AuxLines) -> Result<()> {
        self.check_connected()?;
        if lines.contains(AuxLines::CE_RELEASE) {
            self.ce_releases += 1;
            self.output = Output::None;
            self.state = State::Idle;
        }
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        // No real delay needed for in-memory operations
        self.delayed_us += us as u64;
    }
}
