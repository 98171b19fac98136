//! High-level NAND programming abstraction
//!
//! This crate hides the transport behind an identified chip. The CLI
//! should only interact with types from this crate, never directly with
//! a `NandBus` implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    CLI (bin/nandflasher)                  │
//! │  - Only imports nandflasher-flash and nandflasher-core    │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                nandflasher-flash (this crate)             │
//! │  - NandHandle: identified chip + boxed transport          │
//! │  - open_nand: opens programmers by name                   │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │    nandflasher-core      │   │  Transport crates        │
//! │  - NandDevice            │   │  - dummy, ftdi           │
//! │  - ONFI, ECC, diag       │   │  - Implement NandBus     │
//! └──────────────────────────┘   └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nandflasher_core::NandConfig;
//! use nandflasher_flash::open_nand;
//!
//! let mut handle = open_nand("ftdi:port=B", NandConfig::default())?;
//! let page = handle.read_page(0, true)?;
//! ```

mod handle;
mod registry;

pub use handle::{BoxedNand, ChipInfo, NandHandle};
pub use registry::{
    available_programmers, open_nand, parse_programmer_params, programmer_names_short,
    ProgrammerInfo, ProgrammerParams,
};
