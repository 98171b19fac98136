//! Write command implementation

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nandflasher_core::ecc::Hamming;
use nandflasher_core::nand::{OobSource, WriteOptions, WriteProgress, WriteReport};
use nandflasher_flash::NandHandle;
use std::fs;
use std::path::Path;

/// Options of the write command
pub struct WriteArgs {
    /// Bytes to skip at the start of the input file
    pub offset: usize,
    /// First page to write
    pub start_page: u32,
    /// Last page to write, inclusive
    pub end_page: Option<u32>,
    /// The file carries main data only
    pub add_oob: bool,
    /// Use the JFFS2 clean marker on each block's first page
    pub jffs2: bool,
    /// Ignore the bad-block marker
    pub raw: bool,
}

/// Progress reporter using indicatif progress bars
struct IndicatifProgress {
    multi: MultiProgress,
    bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: None,
        }
    }

    fn println(&self, msg: String) {
        if self.multi.println(&msg).is_err() {
            println!("{}", msg);
        }
    }
}

impl WriteProgress for IndicatifProgress {
    fn start(&mut self, total_pages: u32) {
        let pb = self.multi.add(ProgressBar::new(total_pages as u64));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({eta}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar = Some(pb);
    }

    fn block_erased(&mut self, block: u32) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("block {}", block));
        }
    }

    fn block_skipped(&mut self, block: u32) {
        self.println(format!("Skipping bad block {}", block));
    }

    fn page_written(&mut self, _page: u32, _bytes: usize) {
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    fn complete(&mut self, _report: &WriteReport) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message("Write complete");
        }
    }
}

/// Run the write command
pub fn run_write(
    handle: &mut NandHandle,
    input: &Path,
    args: &WriteArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = fs::read(input)?;
    if args.offset > image.len() {
        return Err(format!(
            "Offset {} is beyond the end of {:?} ({} bytes)",
            args.offset,
            input,
            image.len()
        )
        .into());
    }
    let data = &image[args.offset..];

    let ecc = Hamming::default();
    let oob = if args.add_oob {
        OobSource::Generated {
            ecc: &ecc,
            jffs2_cleanmarker: args.jffs2,
        }
    } else {
        OobSource::Included
    };
    let opts = WriteOptions {
        start_page: args.start_page,
        end_page: args.end_page,
        oob,
        raw: args.raw,
    };

    println!(
        "Writing {} bytes from {:?} starting at page {}",
        data.len(),
        input,
        args.start_page
    );

    let mut progress = IndicatifProgress::new();
    let report = handle.write_pages(data, &opts, &mut progress)?;

    println!(
        "Wrote {} pages ({} bytes of input)",
        report.pages_written, report.bytes_consumed
    );
    if !report.skipped_blocks.is_empty() {
        println!(
            "Skipped {} bad block(s): {:?}",
            report.skipped_blocks.len(),
            report.skipped_blocks
        );
    }
    if report.bytes_consumed < data.len() {
        log::warn!(
            "{} bytes of input were not written",
            data.len() - report.bytes_consumed
        );
    }

    Ok(())
}
