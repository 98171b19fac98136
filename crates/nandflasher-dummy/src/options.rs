//! Programmer option parsing for the dummy device

use nandflasher_core::geometry::AddressingMode;
use thiserror::Error;

use crate::DummyConfig;

/// Errors from parsing dummy programmer options
#[derive(Debug, Error)]
pub enum DummyOptionError {
    /// The value of an option could not be parsed
    #[error("invalid value '{value}' for dummy option '{key}'")]
    InvalidValue {
        /// Option name
        key: String,
        /// Rejected value
        value: String,
    },
    /// A size option was zero
    #[error("dummy option '{0}' must be greater than zero")]
    Zero(String),
}

fn number(key: &str, value: &str) -> Result<u32, DummyOptionError> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| DummyOptionError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn nonzero(key: &str, value: &str) -> Result<u32, DummyOptionError> {
    match number(key, value)? {
        0 => Err(DummyOptionError::Zero(key.to_string())),
        n => Ok(n),
    }
}

fn flag(key: &str, value: &str) -> Result<bool, DummyOptionError> {
    match value {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(DummyOptionError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Build a [`DummyConfig`] from `key=value` programmer options
///
/// Recognized keys:
///
/// - `small=<bool>` - start from the legacy small-page preset
/// - `page=<N>` - main bytes per page
/// - `oob=<N>` - spare bytes per page
/// - `ppb=<N>` - pages per block
/// - `blocks=<N>` - blocks per LUN
/// - `luns=<N>` - number of LUNs
/// - `bits=<N>` - bits per cell
/// - `bad=<B>[+<B>...]` - factory bad blocks
/// - `busy=<N>` - busy samples after each array operation
///
/// `small` is applied first regardless of its position. Unknown keys are
/// logged and ignored.
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig, DummyOptionError> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        if *key == "small" && flag(key, value)? {
            config = DummyConfig::small_page();
        }
    }

    for (key, value) in options {
        match *key {
            "small" => {}
            "page" => config.page_size = nonzero(key, value)?,
            "oob" => config.oob_size = number(key, value)?,
            "ppb" => config.pages_per_block = nonzero(key, value)?,
            "blocks" => config.blocks_per_lun = nonzero(key, value)?,
            "luns" => config.lun_count = nonzero(key, value)?,
            "bits" => config.bits_per_cell = nonzero(key, value)?.min(u8::MAX as u32) as u8,
            "busy" => config.busy_polls = number(key, value)?,
            "bad" => {
                config.bad_blocks = value
                    .split('+')
                    .filter(|s| !s.is_empty())
                    .map(|s| number(key, s))
                    .collect::<Result<_, _>>()?;
            }
            _ => {
                log::warn!("Unknown dummy option: {}={}", key, value);
            }
        }
    }

    if config.addressing == AddressingMode::SmallPage && config.page_size > 512 {
        log::warn!(
            "dummy: small-page addressing with {} byte pages",
            config.page_size
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.page_size, 2048);
        assert!(config.onfi);
        assert!(config.bad_blocks.is_empty());
    }

    #[test]
    fn test_geometry_options() {
        let config = parse_options(&[
            ("page", "4096"),
            ("oob", "224"),
            ("ppb", "256"),
            ("blocks", "0x800"),
            ("bad", "3+17"),
        ])
        .unwrap();
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.oob_size, 224);
        assert_eq!(config.pages_per_block, 256);
        assert_eq!(config.blocks_per_lun, 2048);
        assert_eq!(config.bad_blocks, vec![3, 17]);
    }

    #[test]
    fn test_small_preset_first() {
        let config = parse_options(&[("blocks", "8"), ("small", "yes")]).unwrap();
        assert_eq!(config.addressing, AddressingMode::SmallPage);
        assert_eq!(config.page_size, 512);
        assert_eq!(config.blocks_per_lun, 8);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            parse_options(&[("page", "big")]),
            Err(DummyOptionError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_options(&[("ppb", "0")]),
            Err(DummyOptionError::Zero(_))
        ));
        assert!(parse_options(&[("bad", "1+x")]).is_err());
    }
}
