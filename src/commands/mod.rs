//! CLI command implementations
//!
//! Every command works on a `NandHandle` from `nandflasher-flash` and
//! never sees the transport behind it. The `ber` command is offline and
//! only compares two dump files.

mod ber;
mod erase;
mod features;
mod info;
mod list;
mod read;
mod write;

pub use ber::run_ber;
pub use erase::{run_bad_blocks, run_erase};
pub use features::{cmd_cell_mode, cmd_get, cmd_set};
pub use info::print_chip_info;
pub use list::list_programmers;
pub use read::{run_read, run_read_sequential, ReadArgs};
pub use write::{run_write, WriteArgs};
