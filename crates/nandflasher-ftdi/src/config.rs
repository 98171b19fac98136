//! Adapter configuration and option parsing

use crate::error::{FtdiError, Result};
use crate::protocol::{ClockMode, FTDI_FT2232H_PID, FTDI_VID};

/// FT2232H channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtdiInterface {
    /// Channel A
    A,
    /// Channel B (default, the MCU host-bus channel on common boards)
    #[default]
    B,
}

impl FtdiInterface {
    /// Parse interface from a channel letter
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(FtdiInterface::A),
            'B' => Some(FtdiInterface::B),
            _ => None,
        }
    }

    /// Get the channel letter
    pub fn letter(&self) -> char {
        match self {
            FtdiInterface::A => 'A',
            FtdiInterface::B => 'B',
        }
    }
}

/// Configuration for opening the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtdiConfig {
    /// USB vendor ID
    pub vid: u16,
    /// USB product ID
    pub pid: u16,
    /// Channel wired to the NAND bus
    pub interface: FtdiInterface,
    /// Transfer clock
    pub clock: ClockMode,
}

impl Default for FtdiConfig {
    fn default() -> Self {
        FtdiConfig {
            vid: FTDI_VID,
            pid: FTDI_FT2232H_PID,
            interface: FtdiInterface::default(),
            clock: ClockMode::default(),
        }
    }
}

fn parse_id(key: &str, value: &str) -> Result<u16> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16).map_err(|_| {
        FtdiError::InvalidParameter(format!("Invalid {} '{}': expected a hex ID", key, value))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(FtdiError::InvalidParameter(format!(
            "Invalid {} '{}': expected yes or no",
            key, value
        ))),
    }
}

/// Parse programmer options
///
/// Format: "port=<A|B>,slow=<yes|no>,vid=<hex>,pid=<hex>"
pub fn parse_options(options: &[(&str, &str)]) -> Result<FtdiConfig> {
    let mut config = FtdiConfig::default();

    for (key, value) in options {
        match *key {
            "port" | "channel" => {
                let mut chars = value.chars();
                config.interface = match (chars.next(), chars.next()) {
                    (Some(c), None) => FtdiInterface::from_char(c),
                    _ => None,
                }
                .ok_or_else(|| {
                    FtdiError::InvalidChannel(format!(
                        "Invalid channel '{}': must be A or B",
                        value
                    ))
                })?;
            }
            "slow" => {
                config.clock = if parse_bool(key, value)? {
                    ClockMode::Slow
                } else {
                    ClockMode::Fast
                };
            }
            "vid" => config.vid = parse_id(key, value)?,
            "pid" => config.pid = parse_id(key, value)?,
            _ => {
                log::warn!("Unknown FTDI option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.vid, 0x0403);
        assert_eq!(config.pid, 0x6010);
        assert_eq!(config.interface, FtdiInterface::B);
        assert_eq!(config.clock, ClockMode::Fast);
    }

    #[test]
    fn test_options() {
        let config = parse_options(&[
            ("port", "a"),
            ("slow", "yes"),
            ("vid", "0x1234"),
            ("pid", "abcd"),
        ])
        .unwrap();
        assert_eq!(config.interface, FtdiInterface::A);
        assert_eq!(config.clock, ClockMode::Slow);
        assert_eq!(config.vid, 0x1234);
        assert_eq!(config.pid, 0xABCD);
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            parse_options(&[("port", "C")]),
            Err(FtdiError::InvalidChannel(_))
        ));
        assert!(matches!(
            parse_options(&[("port", "AB")]),
            Err(FtdiError::InvalidChannel(_))
        ));
        assert!(matches!(
            parse_options(&[("slow", "maybe")]),
            Err(FtdiError::InvalidParameter(_))
        ));
        assert!(parse_options(&[("vid", "xyz")]).is_err());
    }

    #[test]
    fn test_unknown_option_ignored() {
        assert_eq!(parse_options(&[("speed", "9")]).unwrap(), FtdiConfig::default());
    }
}
