//! NAND command protocol primitives
//!
//! This module turns logical steps (latch a command, latch an address,
//! move data, wait for ready, read status) into [`NandBus`](crate::bus::NandBus)
//! transactions. The page/block operations in [`crate::nand`] are built
//! exclusively from these functions.

mod address;
mod cycles;
mod guard;

pub use address::*;
pub use cycles::*;
pub use guard::WriteEnableGuard;
