//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let value = parse_hex_u32(s)?;
    u8::try_from(value).map_err(|_| format!("Value {} does not fit in a byte", s))
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        nandflasher_flash::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "nandflasher")]
#[command(author, version, about = "Raw NAND flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Programmer string, e.g. "ftdi:port=B" or "dummy:page=4096,oob=224"
    #[arg(short, long, global = true, default_value = "ftdi", help = programmer_help())]
    pub programmer: String,

    /// Give up waiting for the ready line after this many milliseconds
    #[arg(long, global = true)]
    pub ready_timeout_ms: Option<u32>,

    /// Repeat a failed page program this many times
    #[arg(long, global = true)]
    pub program_retries: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the chip and show its geometry
    Info,

    /// Read pages to a file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Read a single page
        #[arg(long, value_parser = parse_hex_u32, conflicts_with_all = ["start_page", "end_page"])]
        page: Option<u32>,

        /// First page to read (default: 0)
        #[arg(long, value_parser = parse_hex_u32)]
        start_page: Option<u32>,

        /// Last page to read, inclusive (default: last page)
        #[arg(long, value_parser = parse_hex_u32)]
        end_page: Option<u32>,

        /// Leave out the spare area
        #[arg(long)]
        no_oob: bool,

        /// Read whole blocks with one read command each, skipping bad blocks
        #[arg(long)]
        sequential: bool,

        /// Keep bad blocks in a sequential read
        #[arg(long, requires = "sequential")]
        raw: bool,

        /// Write a "0x..," text dump instead of binary
        #[arg(long)]
        hex: bool,
    },

    /// Write a file across consecutive pages
    Write {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Skip this many bytes at the start of the file
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        offset: u32,

        /// First page to write (default: 0)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start_page: u32,

        /// Last page to write, inclusive (default: last page)
        #[arg(long, value_parser = parse_hex_u32)]
        end_page: Option<u32>,

        /// The file holds main data only; generate the spare area from ECC
        #[arg(long)]
        add_oob: bool,

        /// Put the JFFS2 clean marker in the spare area of each block's first page
        #[arg(long, requires = "add_oob")]
        jffs2: bool,

        /// Do not skip blocks carrying the bad-block marker
        #[arg(long)]
        raw: bool,
    },

    /// Erase a range of blocks
    Erase {
        /// First block to erase (default: 0)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start_block: u32,

        /// Last block to erase, inclusive (default: last block)
        #[arg(long, value_parser = parse_hex_u32)]
        end_block: Option<u32>,
    },

    /// Scan for factory bad blocks
    BadBlocks,

    /// Feature register operations
    #[command(subcommand)]
    Features(FeatureCommands),

    /// Show or change the SLC/MLC cell mode
    CellMode {
        /// Program, switch to SLC and erase this block
        #[arg(long, value_parser = parse_hex_u32, conflicts_with = "mlc")]
        slc_block: Option<u32>,

        /// Switch the array back to MLC mode
        #[arg(long)]
        mlc: bool,
    },

    /// Compute the bit error rate between two dumps (no programmer needed)
    Ber {
        /// First dump
        a: PathBuf,

        /// Second dump
        b: PathBuf,
    },

    /// List supported programmers
    ListProgrammers,
}

#[derive(Subcommand)]
pub enum FeatureCommands {
    /// Read a feature register
    Get {
        /// Feature address (e.g. 0x91)
        #[arg(value_parser = parse_hex_u8)]
        address: u8,
    },

    /// Write a feature register
    Set {
        /// Feature address (e.g. 0x91)
        #[arg(value_parser = parse_hex_u8)]
        address: u8,

        /// Exactly four parameter bytes
        #[arg(value_parser = parse_hex_u8, num_args = 1..)]
        values: Vec<u8>,
    },
}
