//! ONFI parameter page parsing
//!
//! ONFI devices describe their own geometry in a 256-byte parameter page
//! returned by the READ-PARAMETER-PAGE command (0xEC). This module decodes
//! that page and checks its integrity; reading it from the device is done
//! by [`crate::nand`] during identification.
//!
//! # Layout (little-endian)
//!
//! | Offset | Field |
//! |---|---|
//! | 0-3 | signature "ONFI" |
//! | 4-5 | revision bitmap |
//! | 32-43 | manufacturer string |
//! | 44-63 | device model string |
//! | 64 | JEDEC manufacturer ID |
//! | 80-83 | data bytes per page |
//! | 84-85 | spare bytes per page |
//! | 92-95 | pages per block |
//! | 96-99 | blocks per LUN |
//! | 100 | LUN count |
//! | 102 | bits per cell |
//! | 254-255 | CRC-16 over bytes 0-253 |

mod parser;
mod types;

pub use parser::*;
pub use types::*;
