//! Error types for nandflasher-core
//!
//! This module provides a no_std compatible error type that is used
//! throughout the crate. Transport crates convert their own errors into
//! [`Error`] at the [`NandBus`](crate::bus::NandBus) boundary.

use core::fmt;

/// Identification step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyStage {
    /// READ-ID at address 0x20 did not return the "ONFI" signature
    OnfiProbe,
    /// The parameter page does not start with the "ONFI" signature
    ParameterPage,
}

/// Details about an argument rejected before any bus activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Feature register values are exactly 4 bytes
    FeatureLength {
        /// Length that was supplied
        len: usize,
    },
    /// Two buffers that must be compared have different lengths
    LengthMismatch {
        /// Length of the first buffer
        left: usize,
        /// Length of the second buffer
        right: usize,
    },
    /// Page index beyond the end of the device
    PageOutOfRange {
        /// Requested page
        page: u32,
        /// Number of pages on the device
        page_count: u32,
    },
    /// Block index beyond the end of the device
    BlockOutOfRange {
        /// Requested block
        block: u32,
        /// Number of blocks on the device
        block_count: u32,
    },
    /// Page buffer has the wrong size for a program operation
    PageLength {
        /// Expected length (raw page size)
        expected: usize,
        /// Supplied length
        actual: usize,
    },
    /// Page size is not a multiple of the ECC block size
    EccBlockSize {
        /// Page size in bytes
        page_size: usize,
        /// ECC block size in bytes
        block_size: usize,
    },
    /// Generated spare area does not fit into the OOB area
    OobOverflow {
        /// Bytes required
        needed: usize,
        /// OOB size of the device
        available: usize,
    },
    /// Geometry with a zero-sized dimension
    EmptyGeometry,
    /// Geometry whose page or byte counts do not fit in 32 bits
    GeometryOverflow,
    /// Page range whose end lies before its start
    ReversedRange {
        /// First page
        start: u32,
        /// Last page
        end: u32,
    },
    /// Cell mode without a register encoding
    UnknownCellMode {
        /// Register value the mode was decoded from
        value: u8,
    },
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Transport reports no connection or returned fewer bytes than requested
    DeviceAbsent,
    /// The device did not identify as an ONFI NAND
    IdentificationFailed(IdentifyStage),
    /// The ready/busy line never reported ready within the configured bound
    Timeout,
    /// Page program kept reporting FAIL after all retries
    ProgramFailed {
        /// Page that could not be programmed
        page: u32,
        /// Last status register value
        status: u8,
    },
    /// Block erase reported FAIL
    EraseFailed {
        /// Block that could not be erased
        block: u32,
        /// Status register value
        status: u8,
    },
    /// Caller input rejected before touching the bus
    InvalidArgument(InvalidArgument),
}

impl fmt::Display for IdentifyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnfiProbe => write!(f, "ONFI signature probe"),
            Self::ParameterPage => write!(f, "parameter page signature"),
        }
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureLength { len } => {
                write!(f, "feature value must be 4 bytes, got {}", len)
            }
            Self::LengthMismatch { left, right } => {
                write!(f, "buffer lengths differ ({} vs {} bytes)", left, right)
            }
            Self::PageOutOfRange { page, page_count } => {
                write!(f, "page {} out of range (device has {} pages)", page, page_count)
            }
            Self::BlockOutOfRange { block, block_count } => write!(
                f,
                "block {} out of range (device has {} blocks)",
                block, block_count
            ),
            Self::PageLength { expected, actual } => write!(
                f,
                "page buffer must be {} bytes, got {}",
                expected, actual
            ),
            Self::EccBlockSize {
                page_size,
                block_size,
            } => write!(
                f,
                "page size {} is not a multiple of the ECC block size {}",
                page_size, block_size
            ),
            Self::OobOverflow { needed, available } => write!(
                f,
                "spare data needs {} bytes but the OOB area has {}",
                needed, available
            ),
            Self::EmptyGeometry => write!(f, "geometry has a zero-sized dimension"),
            Self::GeometryOverflow => write!(f, "geometry exceeds 32-bit page or byte counts"),
            Self::ReversedRange { start, end } => {
                write!(f, "end page {} is before start page {}", end, start)
            }
            Self::UnknownCellMode { value } => {
                write!(f, "cell mode 0x{:02X} cannot be selected", value)
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceAbsent => write!(f, "NAND adapter not connected"),
            Self::IdentificationFailed(stage) => {
                write!(f, "device identification failed at {}", stage)
            }
            Self::Timeout => write!(f, "device not responding (ready timeout)"),
            Self::ProgramFailed { page, status } => write!(
                f,
                "program failed at page {} (status 0x{:02X})",
                page, status
            ),
            Self::EraseFailed { block, status } => write!(
                f,
                "erase failed at block {} (status 0x{:02X})",
                block, status
            ),
            Self::InvalidArgument(arg) => write!(f, "invalid argument: {}", arg),
        }
    }
}

impl From<InvalidArgument> for Error {
    fn from(arg: InvalidArgument) -> Self {
        Self::InvalidArgument(arg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
