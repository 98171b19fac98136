//! Page and block operations
//!
//! [`NandDevice`] owns the bus, the identified [`Geometry`](crate::Geometry)
//! and the [`NandConfig`](crate::NandConfig). It only exists after a
//! successful identification (or with an explicitly supplied geometry), so
//! every operation can rely on a valid geometry.
//!
//! # Example
//!
//! ```ignore
//! use nandflasher_core::{NandConfig, NandDevice};
//!
//! let mut nand = NandDevice::identify(bus, NandConfig::default())?;
//! let bad = nand.scan_bad_blocks()?;
//! let page = nand.read_page(0, true)?;
//! ```

mod bulk;
mod device;
mod features;
mod identify;
pub mod scheme;

pub use bulk::{NoProgress, OobSource, WriteOptions, WriteProgress, WriteReport};
pub use device::{NandDevice, INLINE_BAD_MARKER_OFFSET, SCAN_BAD_MARKER_OFFSET};
pub use features::{CellMode, FEATURE_LEN};
pub use identify::{geometry_from_parameter_page, ID_LEN};
