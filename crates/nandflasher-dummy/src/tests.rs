//! Engine tests against the simulated device

use nandflasher_core::ecc::{self, Hamming};
use nandflasher_core::error::{Error, IdentifyStage, InvalidArgument};
use nandflasher_core::nand::{CellMode, NoProgress, OobSource, WriteOptions};
use nandflasher_core::opcodes;
use nandflasher_core::{NandConfig, NandDevice};

use super::*;

fn small_onfi() -> DummyConfig {
    DummyConfig {
        pages_per_block: 4,
        blocks_per_lun: 8,
        ..DummyConfig::default()
    }
}

fn open(config: DummyConfig) -> NandDevice<DummyNand> {
    NandDevice::identify(DummyNand::new(config), NandConfig::default()).unwrap()
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

fn count(commands: &[u8], opcode: u8) -> usize {
    commands.iter().filter(|&&c| c == opcode).count()
}

// ============================================================================
// Identification
// ============================================================================

#[test]
fn test_identify_default() {
    let nand = open(DummyConfig::default());
    let geo = nand.geometry();
    assert_eq!(geo.page_size, 2048);
    assert_eq!(geo.oob_size, 64);
    assert_eq!(geo.pages_per_block, 64);
    assert_eq!(geo.block_count(), 64);
    assert_eq!(geo.address_cycles, 5);
    assert_eq!(geo.manufacturer, "Micron");
    assert_eq!(geo.manufacturer_id, 0x2C);
    assert_eq!(geo.id_string(), "NANDFLASHER DUMMY");
    assert_eq!(geo.addressing, AddressingMode::LargePage);
    assert!(nand.parameter_page().unwrap().crc_valid);
}

#[test]
fn test_identify_derived_sizes() {
    let config = DummyConfig {
        page_size: 4096,
        oob_size: 224,
        pages_per_block: 256,
        blocks_per_lun: 2048,
        lun_count: 1,
        bits_per_cell: 2,
        ..DummyConfig::default()
    };
    let nand = open(config);
    let geo = nand.geometry();
    assert_eq!(geo.raw_page_size(), 4320);
    assert_eq!(geo.block_size(), 1_105_920);
    assert_eq!(geo.page_count(), 524_288);
    assert_eq!(geo.block_count(), 2048);
    assert_eq!(geo.bits_per_cell, 2);
}

#[test]
fn test_identify_sequence() {
    let nand = open(DummyConfig::default());
    let bus = nand.into_bus();
    assert_eq!(
        bus.commands(),
        &[opcodes::READ_ID, opcodes::READ_ID, opcodes::READ_PARAM_PAGE]
    );
}

#[test]
fn test_identify_rejects_non_onfi() {
    let result = NandDevice::identify(DummyNand::new(DummyConfig::small_page()), NandConfig::default());
    assert!(matches!(
        result,
        Err(Error::IdentificationFailed(IdentifyStage::OnfiProbe))
    ));
}

#[test]
fn test_read_id() {
    let mut nand = open(DummyConfig::default());
    let id = nand.read_id().unwrap();
    assert_eq!(id[0], 0x2C);
    assert_eq!(id[1], 0xDA);
}

// ============================================================================
// Page read / write
// ============================================================================

#[test]
fn test_write_read_round_trip() {
    let mut nand = open(small_onfi());
    let raw = nand.geometry().raw_page_size() as usize;
    let data = pattern(raw, 7);

    nand.write_page(5, &data).unwrap();
    assert_eq!(nand.read_page(5, true).unwrap(), data);
    assert_eq!(nand.read_page(5, false).unwrap(), &data[..2048]);
    assert_eq!(nand.read_oob(5).unwrap(), &data[2048..]);
    assert_eq!(nand.read_page_in_block(1, 1, true).unwrap(), data);
}

#[test]
fn test_write_page_in_block() {
    let mut nand = open(small_onfi());
    let raw = nand.geometry().raw_page_size() as usize;
    let data = pattern(raw, 3);
    nand.write_page_in_block(2, 3, &data).unwrap();
    assert_eq!(nand.bus_mut().page(11), data);
    assert!(nand.write_page_in_block(2, 4, &data).is_err());
}

#[test]
fn test_large_page_read_sequence() {
    let mut nand = open(small_onfi());
    nand.bus_mut().clear_log();
    nand.read_page(0, true).unwrap();
    assert_eq!(nand.bus_mut().commands(), &[opcodes::READ0, opcodes::READ_START]);
}

#[test]
fn test_read_split_into_transport_chunks() {
    let config = DummyConfig {
        page_size: 8192,
        oob_size: 448,
        pages_per_block: 4,
        blocks_per_lun: 4,
        max_read_len: 0x1000,
        ..DummyConfig::default()
    };
    let mut nand = open(config);
    let data = pattern(8192 + 448, 1);
    nand.write_page(2, &data).unwrap();
    assert_eq!(nand.read_page(2, true).unwrap(), data);
}

#[test]
fn test_out_of_range_rejected_before_bus() {
    let mut nand = open(small_onfi());
    nand.bus_mut().clear_log();
    let pages = nand.geometry().page_count();

    assert_eq!(
        nand.read_page(pages, true),
        Err(Error::InvalidArgument(InvalidArgument::PageOutOfRange {
            page: pages,
            page_count: pages
        }))
    );
    assert!(nand.erase_block(8).is_err());
    assert!(nand.read_block_sequential(8, true, false).is_err());
    assert!(nand.bus_mut().commands().is_empty());
}

#[test]
fn test_write_wrong_length() {
    let mut nand = open(small_onfi());
    nand.bus_mut().clear_log();
    assert_eq!(
        nand.write_page(0, &[0u8; 2048]),
        Err(Error::InvalidArgument(InvalidArgument::PageLength {
            expected: 2112,
            actual: 2048
        }))
    );
    assert!(nand.bus_mut().commands().is_empty());
}

#[test]
fn test_write_restores_protection() {
    let mut nand = open(small_onfi());
    let data = pattern(2112, 0);
    nand.write_page(0, &data).unwrap();
    assert!(nand.bus_mut().write_protected());

    nand.bus_mut().fail_programs(u32::MAX);
    assert!(nand.write_page(1, &data).is_err());
    assert!(nand.bus_mut().write_protected());
}

#[test]
fn test_program_retry_bound() {
    let mut nand = open(small_onfi());
    nand.bus_mut().fail_programs(u32::MAX);
    nand.bus_mut().clear_log();

    let result = nand.write_page(4, &pattern(2112, 0));
    match result {
        Err(Error::ProgramFailed { page, status }) => {
            assert_eq!(page, 4);
            assert_ne!(status & Status::FAIL.bits(), 0);
        }
        other => panic!("expected ProgramFailed, got {:?}", other),
    }

    let attempts = NandConfig::default().program_retries as usize + 1;
    assert_eq!(count(nand.bus_mut().commands(), opcodes::SEQIN), attempts);
    assert_eq!(count(nand.bus_mut().commands(), opcodes::PAGE_PROG), attempts);
}

#[test]
fn test_program_retry_recovers() {
    let mut nand = open(small_onfi());
    nand.bus_mut().fail_programs(2);
    nand.bus_mut().clear_log();

    let data = pattern(2112, 9);
    let status = nand.write_page(4, &data).unwrap();
    assert!(!status.failed());
    assert_eq!(count(nand.bus_mut().commands(), opcodes::SEQIN), 3);
    assert_eq!(nand.read_page(4, true).unwrap(), data);
}

// ============================================================================
// Erase and bad blocks
// ============================================================================

#[test]
fn test_erase_block() {
    let mut nand = open(small_onfi());
    let data = pattern(2112, 5);
    nand.write_page(8, &data).unwrap();
    nand.write_page(12, &data).unwrap();

    nand.bus_mut().clear_log();
    nand.erase_block(2).unwrap();
    assert_eq!(
        nand.bus_mut().commands(),
        &[opcodes::ERASE1, opcodes::ERASE2, opcodes::STATUS]
    );
    assert!(nand.read_page(8, true).unwrap().iter().all(|&b| b == 0xFF));
    assert_eq!(nand.read_page(12, true).unwrap(), data);
    assert_eq!(nand.bus_mut().erased_blocks(), &[2]);
    assert!(nand.bus_mut().write_protected());
}

#[test]
fn test_erase_failure_not_retried() {
    let config = DummyConfig {
        bad_blocks: vec![3],
        ..small_onfi()
    };
    let mut nand = open(config);
    nand.bus_mut().clear_log();

    match nand.erase_block(3) {
        Err(Error::EraseFailed { block, status }) => {
            assert_eq!(block, 3);
            assert_ne!(status & Status::FAIL.bits(), 0);
        }
        other => panic!("expected EraseFailed, got {:?}", other),
    }
    assert_eq!(count(nand.bus_mut().commands(), opcodes::ERASE1), 1);
}

#[test]
fn test_erase_blocks_continues_past_failures() {
    let config = DummyConfig {
        bad_blocks: vec![2, 5],
        ..small_onfi()
    };
    let mut nand = open(config);
    assert_eq!(nand.erase_blocks(1, 6).unwrap(), vec![2, 5]);
    assert_eq!(nand.bus_mut().erased_blocks(), &[1, 3, 4, 6]);
    assert_eq!(nand.erase_chip().unwrap(), vec![2, 5]);
}

#[test]
fn test_scan_bad_blocks_is_stable() {
    let config = DummyConfig {
        bad_blocks: vec![1, 6],
        ..small_onfi()
    };
    let mut nand = open(config);
    let first = nand.scan_bad_blocks().unwrap();
    let second = nand.scan_bad_blocks().unwrap();
    assert_eq!(first, vec![1, 6]);
    assert_eq!(first, second);
    assert!(nand.bus_mut().erased_blocks().is_empty());
    assert!(nand.bus_mut().programmed_pages().is_empty());
}

#[test]
fn test_inline_marker() {
    let mut nand = open(small_onfi());
    assert!(!nand.is_block_bad(4).unwrap());

    // Marker on the second page only
    let mut page = nand.bus_mut().page(17);
    page[2048 + 5] = 0x00;
    nand.bus_mut().set_page(17, &page);
    assert!(nand.is_block_bad(4).unwrap());
    // The scan looks at spare byte 0 of the first page and misses it
    assert!(nand.scan_bad_blocks().unwrap().is_empty());
}

// ============================================================================
// Bulk writer
// ============================================================================

#[test]
fn test_write_pages_skips_bad_block() {
    let config = DummyConfig {
        bad_blocks: vec![1],
        ..small_onfi()
    };
    let mut nand = open(config);
    let raw = 2112usize;
    let image = pattern(raw * 12, 42);

    nand.bus_mut().clear_log();
    let report = nand
        .write_pages(&image, &WriteOptions::default(), &mut NoProgress)
        .unwrap();

    assert_eq!(report.pages_written, 12);
    assert_eq!(report.bytes_consumed, image.len());
    assert_eq!(report.skipped_blocks, vec![1]);

    let bus = nand.bus_mut();
    assert_eq!(bus.erased_blocks(), &[0, 2, 3]);
    assert!(bus.programmed_pages().iter().all(|p| !(4..8).contains(p)));
    assert_eq!(bus.page(3), &image[3 * raw..4 * raw]);
    assert_eq!(bus.page(8), &image[4 * raw..5 * raw]);
    assert_eq!(bus.page(15), &image[11 * raw..12 * raw]);
}

#[test]
fn test_write_pages_raw_ignores_markers() {
    let config = DummyConfig {
        bad_blocks: vec![0],
        ..small_onfi()
    };
    let mut nand = open(config);
    let opts = WriteOptions {
        raw: true,
        ..WriteOptions::default()
    };
    // The erase of a factory bad block fails and aborts the write
    assert!(matches!(
        nand.write_pages(&pattern(2112, 0), &opts, &mut NoProgress),
        Err(Error::EraseFailed { block: 0, .. })
    ));
}

#[test]
fn test_write_pages_partial_raw_page_dropped() {
    let mut nand = open(small_onfi());
    let image = pattern(2112 + 10, 0);
    let report = nand
        .write_pages(&image, &WriteOptions::default(), &mut NoProgress)
        .unwrap();
    assert_eq!(report.pages_written, 1);
    assert_eq!(report.bytes_consumed, 2112);
    assert_eq!(nand.bus_mut().programmed_pages(), &[0]);
}

#[test]
fn test_write_pages_end_page() {
    let mut nand = open(small_onfi());
    let image = pattern(2112 * 10, 0);
    let opts = WriteOptions {
        start_page: 4,
        end_page: Some(6),
        ..WriteOptions::default()
    };
    let report = nand.write_pages(&image, &opts, &mut NoProgress).unwrap();
    assert_eq!(report.pages_written, 3);
    assert_eq!(nand.bus_mut().programmed_pages(), &[4, 5, 6]);
    assert_eq!(nand.bus_mut().page(4), &image[..2112]);
}

#[test]
fn test_write_pages_reversed_range() {
    let mut nand = open(small_onfi());
    let opts = WriteOptions {
        start_page: 6,
        end_page: Some(5),
        ..WriteOptions::default()
    };
    nand.bus_mut().clear_log();
    assert_eq!(
        nand.write_pages(&pattern(2112, 0), &opts, &mut NoProgress),
        Err(InvalidArgument::ReversedRange { start: 6, end: 5 }.into())
    );
    assert!(nand.bus_mut().commands().is_empty());
}

#[test]
fn test_write_pages_generated_oob() {
    let mut nand = open(small_onfi());
    let hamming = Hamming::default();
    let mut image = vec![0x00u8; 2048];
    image.extend(std::iter::repeat(0xAB).take(100));

    let opts = WriteOptions {
        oob: OobSource::Generated {
            ecc: &hamming,
            jffs2_cleanmarker: true,
        },
        ..WriteOptions::default()
    };
    let report = nand.write_pages(&image, &opts, &mut NoProgress).unwrap();
    assert_eq!(report.pages_written, 2);
    assert_eq!(report.bytes_consumed, 2148);

    // First page of the block carries the clean marker
    let page0 = nand.bus_mut().page(0);
    assert!(page0[..2048].iter().all(|&b| b == 0x00));
    assert_eq!(&page0[2048..2072], &[0xFF; 24]);
    assert_eq!(
        &page0[2072..2085],
        &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x85, 0x19, 0x03, 0x20, 0x08, 0x00, 0x00, 0x00]
    );
    assert!(page0[2085..].iter().all(|&b| b == 0xFF));

    // Second page: partial input zero padded, plain postfix
    let page1 = nand.bus_mut().page(1);
    let mut main = vec![0xABu8; 100];
    main.resize(2048, 0x00);
    assert_eq!(&page1[..2048], &main[..]);
    let parity = ecc::compute_page(&hamming, &main).unwrap();
    assert_eq!(&page1[2048..2072], &parity[..]);
    assert!(page1[2072..].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_write_pages_oob_overflow() {
    let config = DummyConfig {
        oob_size: 16,
        ..small_onfi()
    };
    let mut nand = open(config);
    let hamming = Hamming::default();
    let opts = WriteOptions {
        oob: OobSource::Generated {
            ecc: &hamming,
            jffs2_cleanmarker: false,
        },
        ..WriteOptions::default()
    };
    nand.bus_mut().clear_log();
    assert_eq!(
        nand.write_pages(&[0u8; 2048], &opts, &mut NoProgress),
        Err(Error::InvalidArgument(InvalidArgument::OobOverflow {
            needed: 37,
            available: 16
        }))
    );
    assert!(nand.bus_mut().commands().is_empty());
}

// ============================================================================
// Sequential read
// ============================================================================

#[test]
fn test_sequential_read() {
    let mut nand = open(small_onfi());
    let mut expected = Vec::new();
    let mut expected_main = Vec::new();
    for page in 4..8 {
        let data = pattern(2112, page as u8);
        // Keep the inline marker byte erased
        let mut data = data;
        data[2048 + 5] = 0xFF;
        nand.write_page(page, &data).unwrap();
        expected_main.extend_from_slice(&data[..2048]);
        expected.extend(data);
    }

    nand.bus_mut().clear_log();
    let block = nand.read_block_sequential(1, true, false).unwrap();
    assert_eq!(block, Some(expected));
    assert_eq!(nand.bus_mut().commands(), &[opcodes::READ0, opcodes::READ_START]);
    assert_eq!(nand.bus_mut().ce_releases(), 1);

    let main = nand.read_block_sequential(1, false, false).unwrap();
    assert_eq!(main, Some(expected_main));
}

#[test]
fn test_sequential_read_bad_block() {
    let config = DummyConfig {
        bad_blocks: vec![2],
        ..small_onfi()
    };
    let mut nand = open(config);
    assert_eq!(nand.read_block_sequential(2, true, false).unwrap(), None);
    assert_eq!(nand.bus_mut().ce_releases(), 1);

    let raw = nand.read_block_sequential(2, true, true).unwrap().unwrap();
    assert_eq!(raw.len(), 4 * 2112);
    assert_eq!(raw[2048], 0x00);
}

#[test]
fn test_sequential_read_releases_on_error() {
    let mut nand = open(small_onfi());
    nand.bus_mut().set_stuck_busy(true);
    assert_eq!(nand.read_block_sequential(0, true, false), Err(Error::Timeout));
    assert_eq!(nand.bus_mut().ce_releases(), 1);
}

// ============================================================================
// Features
// ============================================================================

#[test]
fn test_feature_round_trip() {
    let mut nand = open(small_onfi());
    nand.set_features(0x01, &[0x05, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(nand.get_features(0x01).unwrap(), [0x05, 0x00, 0x00, 0x00]);
    assert_eq!(nand.bus_mut().feature(0x01), [0x05, 0x00, 0x00, 0x00]);
}

#[test]
fn test_feature_settle_delay() {
    let mut nand = open(small_onfi());
    let before = nand.bus_mut().delayed_us();
    nand.get_features(0x91).unwrap();
    let elapsed = nand.bus_mut().delayed_us() - before;
    assert!(elapsed >= NandConfig::default().feature_settle_us as u64);
}

#[test]
fn test_feature_length_checked() {
    let mut nand = open(small_onfi());
    nand.bus_mut().clear_log();
    assert_eq!(
        nand.set_features(0x01, &[1, 2, 3]),
        Err(Error::InvalidArgument(InvalidArgument::FeatureLength { len: 3 }))
    );
    assert!(nand.bus_mut().commands().is_empty());
}

#[test]
fn test_cell_mode() {
    let config = DummyConfig {
        bits_per_cell: 2,
        ..small_onfi()
    };
    let mut nand = open(config);
    assert_eq!(nand.cell_mode().unwrap(), CellMode::Mlc);

    nand.set_cell_mode(CellMode::Slc).unwrap();
    assert_eq!(nand.cell_mode().unwrap(), CellMode::Slc);
    assert_eq!(nand.bus_mut().feature(0x91), [1, 1, 0, 0]);

    assert!(nand.set_cell_mode(CellMode::Unknown(7)).is_err());
}

#[test]
fn test_convert_block_to_slc() {
    let config = DummyConfig {
        bits_per_cell: 2,
        ..small_onfi()
    };
    let mut nand = open(config);
    nand.convert_block_to_slc(3).unwrap();

    let bus = nand.bus_mut();
    assert_eq!(bus.programmed_pages(), &[12, 13, 14, 15]);
    assert_eq!(bus.feature(0x91), [1, 1, 0, 0]);
    assert_eq!(bus.erased_blocks(), &[3]);
    assert!(bus.page(12).iter().all(|&b| b == 0xFF));
}

// ============================================================================
// Transport failures
// ============================================================================

#[test]
fn test_timeout_is_bounded() {
    let config = NandConfig::default().with_ready_timeout_us(1000);
    let mut nand = NandDevice::identify(DummyNand::new(small_onfi()), config).unwrap();
    nand.bus_mut().set_stuck_busy(true);

    let before = nand.bus_mut().delayed_us();
    assert_eq!(nand.read_page(0, true), Err(Error::Timeout));
    assert_eq!(nand.bus_mut().delayed_us() - before, 1000);
}

#[test]
fn test_disconnect() {
    let mut nand = open(small_onfi());
    nand.bus_mut().disconnect();
    assert_eq!(nand.read_page(0, true), Err(Error::DeviceAbsent));
    assert_eq!(nand.erase_block(0), Err(Error::DeviceAbsent));
}

// ============================================================================
// Legacy small-page devices
// ============================================================================

fn open_small_page() -> NandDevice<DummyNand> {
    let config = DummyConfig {
        blocks_per_lun: 8,
        ..DummyConfig::small_page()
    };
    let geometry = config.geometry().unwrap();
    NandDevice::with_geometry(DummyNand::new(config), geometry, NandConfig::default()).unwrap()
}

#[test]
fn test_small_page_round_trip() {
    let mut nand = open_small_page();
    let data = pattern(528, 11);

    nand.bus_mut().clear_log();
    nand.write_page(37, &data).unwrap();
    let commands = nand.bus_mut().commands().to_vec();
    assert_eq!(count(&commands, opcodes::SEQIN), 3);
    assert_eq!(count(&commands, opcodes::READ1), 1);
    assert_eq!(count(&commands, opcodes::READ_OOB), 1);

    assert_eq!(nand.read_page(37, true).unwrap(), data);
    assert_eq!(nand.read_page(37, false).unwrap(), &data[..512]);
    assert_eq!(nand.read_oob(37).unwrap(), &data[512..]);
    assert_eq!(nand.bus_mut().page(37), data);
}

#[test]
fn test_small_page_erase_and_scan() {
    let mut nand = open_small_page();
    nand.write_page(33, &pattern(528, 2)).unwrap();
    nand.erase_block(1).unwrap();
    assert!(nand.read_page(33, true).unwrap().iter().all(|&b| b == 0xFF));

    nand.bus_mut().mark_bad(5);
    assert_eq!(nand.scan_bad_blocks().unwrap(), vec![5]);
    assert!(nand.is_block_bad(5).unwrap());
}

#[test]
fn test_small_page_sequential_read() {
    let mut nand = open_small_page();
    let data = pattern(528, 4);
    nand.write_page(65, &data).unwrap();
    let block = nand.read_block_sequential(2, true, true).unwrap().unwrap();
    assert_eq!(block.len(), 32 * 528);
    assert_eq!(&block[528..1056], &data[..]);
}
