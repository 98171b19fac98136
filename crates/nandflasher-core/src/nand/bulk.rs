//! Bulk page writer
//!
//! Writes a byte image across consecutive pages. Each block is erased
//! before its first page is programmed, and blocks carrying the inline
//! bad-block marker are skipped whole.

use alloc::vec::Vec;

use crate::bus::NandBus;
use crate::ecc::{self, EccCalculator};
use crate::error::{InvalidArgument, Result};

use super::device::NandDevice;

/// Spare bytes following the ECC parity on ordinary pages
const PLAIN_POSTFIX: [u8; 13] = [0xFF; 13];

/// JFFS2 erase block clean marker, written on the first page of each block
const JFFS2_CLEANMARKER: [u8; 13] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x85, 0x19, 0x03, 0x20, 0x08, 0x00, 0x00, 0x00,
];

/// Where the spare area of each page comes from
#[derive(Clone, Copy)]
pub enum OobSource<'a> {
    /// The image carries `raw_page_size` bytes per page
    Included,
    /// The image carries `page_size` bytes per page; the spare area is built
    /// from ECC parity followed by a 13-byte postfix
    Generated {
        /// Parity generator
        ecc: &'a dyn EccCalculator,
        /// Use the JFFS2 clean marker as postfix on the first page of a block
        jffs2_cleanmarker: bool,
    },
}

/// Parameters of [`NandDevice::write_pages`]
#[derive(Clone, Copy)]
pub struct WriteOptions<'a> {
    /// First page to write
    pub start_page: u32,
    /// Last page to write (inclusive), `None` for the end of the device
    pub end_page: Option<u32>,
    /// Spare area handling
    pub oob: OobSource<'a>,
    /// Skip the inline bad-block check and write every block
    pub raw: bool,
}

impl Default for WriteOptions<'_> {
    fn default() -> Self {
        Self {
            start_page: 0,
            end_page: None,
            oob: OobSource::Included,
            raw: false,
        }
    }
}

/// Outcome of a bulk write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Pages programmed
    pub pages_written: u32,
    /// Image bytes consumed
    pub bytes_consumed: usize,
    /// Blocks skipped because of the bad-block marker
    pub skipped_blocks: Vec<u32>,
}

/// Callback for progress reporting during bulk writes
pub trait WriteProgress {
    /// Called once before the first page with the number of pages the image covers
    fn start(&mut self, total_pages: u32);

    /// Called after a block was erased
    fn block_erased(&mut self, block: u32);

    /// Called when a bad block is skipped
    fn block_skipped(&mut self, block: u32);

    /// Called after each page was programmed with the image bytes it consumed
    fn page_written(&mut self, page: u32, bytes: usize);

    /// Called when the operation is complete
    fn complete(&mut self, report: &WriteReport);
}

/// A no-op progress reporter
pub struct NoProgress;

impl WriteProgress for NoProgress {
    fn start(&mut self, _total_pages: u32) {}
    fn block_erased(&mut self, _block: u32) {}
    fn block_skipped(&mut self, _block: u32) {}
    fn page_written(&mut self, _page: u32, _bytes: usize) {}
    fn complete(&mut self, _report: &WriteReport) {}
}

impl<B: NandBus> NandDevice<B> {
    fn check_generated_oob(&self, ecc: &dyn EccCalculator) -> Result<()> {
        let page_size = self.geometry.page_size as usize;
        let block_size = ecc.block_size();
        if block_size == 0 || page_size % block_size != 0 {
            return Err(InvalidArgument::EccBlockSize {
                page_size,
                block_size,
            }
            .into());
        }
        let needed = page_size / block_size * ecc.parity_len() + PLAIN_POSTFIX.len();
        let available = self.geometry.oob_size as usize;
        if needed > available {
            return Err(InvalidArgument::OobOverflow { needed, available }.into());
        }
        Ok(())
    }

    /// Write `data` to consecutive pages
    ///
    /// Stops at the end of the data, at `end_page` or at the end of the
    /// device. With [`OobSource::Included`] a trailing partial page is not
    /// written; with [`OobSource::Generated`] it is zero padded.
    pub fn write_pages(
        &mut self,
        data: &[u8],
        opts: &WriteOptions<'_>,
        progress: &mut dyn WriteProgress,
    ) -> Result<WriteReport> {
        let geo = &self.geometry;
        geo.check_page(opts.start_page)?;
        let last_page = geo.page_count() - 1;
        let end_page = opts.end_page.map_or(last_page, |end| end.min(last_page));
        if end_page < opts.start_page {
            return Err(InvalidArgument::ReversedRange {
                start: opts.start_page,
                end: end_page,
            }
            .into());
        }
        if let OobSource::Generated { ecc, .. } = opts.oob {
            self.check_generated_oob(ecc)?;
        }

        let page_size = self.geometry.page_size as usize;
        let raw_size = self.geometry.raw_page_size() as usize;
        let pages_per_block = self.geometry.pages_per_block;
        let input_per_page = match opts.oob {
            OobSource::Included => raw_size,
            OobSource::Generated { .. } => page_size,
        };

        let span = (end_page - opts.start_page) as usize + 1;
        let total_pages = span.min(data.len().div_ceil(input_per_page)) as u32;
        progress.start(total_pages);

        let mut report = WriteReport::default();
        let mut page = opts.start_page;
        let mut offset = 0usize;
        let mut buf = Vec::with_capacity(raw_size);

        while page <= end_page && offset < data.len() {
            let addr = self.geometry.decompose(page);
            let mut postfix = &PLAIN_POSTFIX;

            if addr.page == 0 {
                if !opts.raw && self.is_block_bad(addr.block)? {
                    log::info!("Skipping bad block {}", addr.block);
                    report.skipped_blocks.push(addr.block);
                    progress.block_skipped(addr.block);
                    page = page.saturating_add(pages_per_block);
                    continue;
                }
                if let OobSource::Generated {
                    jffs2_cleanmarker: true,
                    ..
                } = opts.oob
                {
                    postfix = &JFFS2_CLEANMARKER;
                }
                self.erase_block(addr.block)?;
                progress.block_erased(addr.block);
            }

            let end = (offset + input_per_page).min(data.len());
            let chunk = &data[offset..end];
            buf.clear();
            match opts.oob {
                OobSource::Included => {
                    if chunk.len() != raw_size {
                        log::warn!(
                            "Not enough source data for page {} ({} of {} bytes)",
                            page,
                            chunk.len(),
                            raw_size
                        );
                        break;
                    }
                    buf.extend_from_slice(chunk);
                }
                OobSource::Generated { ecc, .. } => {
                    buf.extend_from_slice(chunk);
                    buf.resize(page_size, 0x00);
                    let parity = ecc::compute_page(ecc, &buf)?;
                    buf.extend_from_slice(&parity);
                    buf.extend_from_slice(postfix);
                    buf.resize(raw_size, 0xFF);
                }
            }

            self.write_page(page, &buf)?;
            offset = end;
            report.pages_written += 1;
            report.bytes_consumed = offset;
            progress.page_written(page, chunk.len());
            page += 1;
        }

        log::info!(
            "Written {} pages, 0x{:x} of 0x{:x} bytes",
            report.pages_written,
            report.bytes_consumed,
            data.len()
        );
        progress.complete(&report);
        Ok(report)
    }
}
