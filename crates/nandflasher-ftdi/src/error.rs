//! Error types for the FTDI adapter

use thiserror::Error;

/// Result type for FTDI operations
pub type Result<T> = std::result::Result<T, FtdiError>;

/// Errors that can occur during FTDI operations
#[derive(Debug, Error)]
pub enum FtdiError {
    /// Failed to open device
    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    /// Failed to configure device
    #[error("Failed to configure device: {0}")]
    ConfigFailed(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// The adapter stopped answering before the response was complete
    #[error("Short read: got {received} of {expected} bytes")]
    ShortRead {
        /// Bytes requested
        expected: usize,
        /// Bytes received before giving up
        received: usize,
    },

    /// Invalid channel/port specification
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<FtdiError> for nandflasher_core::Error {
    fn from(e: FtdiError) -> Self {
        log::error!("FTDI: {}", e);
        nandflasher_core::Error::DeviceAbsent
    }
}
