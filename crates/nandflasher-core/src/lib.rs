//! nandflasher-core - Protocol engine for raw NAND flash chips
//!
//! This crate turns high-level NAND operations (identify, read/write a page,
//! erase a block, feature registers) into the command-latch, address-latch
//! and data cycles a NAND device expects, and interprets its ready/busy and
//! status signaling. It is `no_std` compatible but requires `alloc`.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```ignore
//! use nandflasher_core::{NandConfig, NandDevice};
//!
//! fn dump_first_page<B: nandflasher_core::bus::NandBus>(bus: B) {
//!     match NandDevice::identify(bus, NandConfig::default()) {
//!         Ok(mut nand) => {
//!             let geo = nand.geometry();
//!             println!("Found: {} ({} MiB)", geo.id_string(), geo.chip_size_mb());
//!             let page = nand.read_page(0, true).unwrap();
//!             println!("{} bytes", page.len());
//!         }
//!         Err(e) => println!("Identification failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod config;
pub mod diag;
pub mod ecc;
pub mod error;
pub mod geometry;
pub mod nand;
pub mod onfi;
pub mod opcodes;
pub mod protocol;
pub mod vendor;

pub use config::NandConfig;
pub use error::{Error, Result};
pub use geometry::{AddressingMode, Geometry, PageAddress};
pub use nand::NandDevice;
