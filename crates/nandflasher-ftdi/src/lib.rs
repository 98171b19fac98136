//! nandflasher-ftdi - FTDI MCU host-bus NAND adapter support
//!
//! This crate drives a raw NAND chip wired to an FT2232H running in MCU
//! host-bus emulation mode. CLE, ALE and WP# ride on the upper address
//! byte of each bus cycle; R/B# is sampled through the high data bits.
//!
//! # Example
//!
//! ```no_run
//! use nandflasher_core::{NandConfig, NandDevice};
//! use nandflasher_ftdi::{FtdiConfig, FtdiNand};
//!
//! let bus = FtdiNand::open(&FtdiConfig::default())?;
//! let mut nand = NandDevice::identify(bus, NandConfig::default())?;
//! let page = nand.read_page(0, true)?;
//! println!("page 0: {} bytes", page.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Programmer Options
//!
//! - `port=<A|B>` - Channel to use (default: B)
//! - `slow=<yes|no>` - Use the 12 MHz clock (default: no)
//! - `vid=<hex>` - USB vendor ID (default: 0403)
//! - `pid=<hex>` - USB product ID (default: 6010)

mod config;
mod device;
mod error;
mod protocol;

pub use config::{parse_options, FtdiConfig, FtdiInterface};
pub use device::FtdiNand;
pub use error::{FtdiError, Result};
pub use protocol::ClockMode;
