//! Programmer registry and initialization
//!
//! This module handles opening programmers by name, identifying the chip
//! and creating NandHandles.

#[allow(unused_imports)] // Used in feature-gated code
use crate::handle::BoxedNand;
use crate::handle::NandHandle;
#[allow(unused_imports)] // Used in feature-gated code
use nandflasher_core::bus::NandBus;
#[allow(unused_imports)] // Used in feature-gated code
use nandflasher_core::NandDevice;
use nandflasher_core::NandConfig;
use std::collections::HashMap;

/// Parsed programmer parameters
pub struct ProgrammerParams {
    /// Programmer name (canonical)
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl ProgrammerParams {
    /// Parameters as borrowed pairs, minus the given keys
    #[allow(dead_code)] // Used in feature-gated code
    fn options_except(&self, skip: &[&str]) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .filter(|(k, _)| !skip.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
///
/// # Example
/// ```ignore
/// let params = parse_programmer_params("ftdi:port=B,slow=yes")?;
/// assert_eq!(params.name, "ftdi");
/// assert_eq!(params.params.get("port"), Some(&"B".to_string()));
/// ```
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));
    if name.is_empty() {
        return Err("Empty programmer name".into());
    }

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Open a programmer, identify the chip and create a NandHandle
///
/// # Arguments
/// * `programmer` - Programmer specification (e.g., "ftdi" or "dummy:page=4096,oob=224")
/// * `config` - Engine timing and retry settings
///
/// # Example
/// ```ignore
/// let mut handle = open_nand("dummy", NandConfig::default())?;
/// let geo = handle.geometry();
/// println!("{} blocks of {} pages", geo.block_count(), geo.pages_per_block);
/// ```
#[allow(unreachable_code)] // With no programmer features every arm returns
pub fn open_nand(
    programmer: &str,
    config: NandConfig,
) -> Result<NandHandle, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;

    let device = match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params, config)?,

        #[cfg(feature = "ftdi")]
        "ftdi" | "ft2232_nand" => open_ftdi(&params, config)?,

        _ => return Err(format!("Unknown programmer: {}", params.name).into()),
    };

    NandHandle::new(device)
}

// Programmer-specific open functions
// These handle the details of each transport and return an identified device

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &ProgrammerParams,
    config: NandConfig,
) -> Result<BoxedNand, Box<dyn std::error::Error>> {
    use nandflasher_dummy::{parse_options, DummyNand};

    log::info!("Opening dummy NAND...");

    let options = params.options_except(&["image"]);
    let dummy_config =
        parse_options(&options).map_err(|e| format!("Invalid dummy options: {}", e))?;

    let bus = match params.params.get("image") {
        Some(path) => {
            let image = std::fs::read(path)
                .map_err(|e| format!("Failed to read dummy image {}: {}", path, e))?;
            log::info!("Loaded {} bytes into dummy NAND from {}", image.len(), path);
            DummyNand::with_image(dummy_config.clone(), &image)
        }
        None => DummyNand::new(dummy_config.clone()),
    };
    let bus: Box<dyn NandBus> = Box::new(bus);

    if dummy_config.onfi {
        Ok(NandDevice::identify(bus, config)?)
    } else {
        // Legacy parts have no parameter page; use the configured geometry
        let geometry = dummy_config.geometry()?;
        Ok(NandDevice::with_geometry(bus, geometry, config)?)
    }
}

#[cfg(feature = "ftdi")]
fn open_ftdi(
    params: &ProgrammerParams,
    config: NandConfig,
) -> Result<BoxedNand, Box<dyn std::error::Error>> {
    use nandflasher_ftdi::{parse_options, FtdiNand};

    log::info!("Opening FTDI programmer...");

    let options = params.options_except(&[]);
    let ftdi_config =
        parse_options(&options).map_err(|e| format!("Invalid FTDI options: {}", e))?;

    let bus = FtdiNand::open(&ftdi_config).map_err(|e| {
        format!(
            "Failed to open FTDI device: {}\nMake sure the device is connected and you have permissions.",
            e
        )
    })?;
    let bus: Box<dyn NandBus> = Box::new(bus);

    NandDevice::identify(bus, config).map_err(|e| {
        format!(
            "Failed to identify NAND chip: {}\nCheck the wiring and that the chip supports ONFI.",
            e
        )
        .into()
    })
}

// Programmer information and listing
/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory ONFI NAND emulator (page=,oob=,ppb=,blocks=,bad=,image=,small=)",
    });

    #[cfg(feature = "ftdi")]
    programmers.push(ProgrammerInfo {
        name: "ftdi",
        aliases: &["ft2232_nand"],
        description: "FT2232H in MCU host-bus mode (VID:0403 PID:6010) (port=<A|B>,slow=<yes|no>)",
    });

    programmers
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    if programmers.is_empty() {
        return "none (recompile with features)".to_string();
    }
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let params = parse_programmer_params("ftdi").unwrap();
        assert_eq!(params.name, "ftdi");
        assert!(params.params.is_empty());
    }

    #[test]
    fn test_parse_with_options() {
        let params = parse_programmer_params("dummy:page=4096,bad=3+7,image=/tmp/a.bin").unwrap();
        assert_eq!(params.name, "dummy");
        assert_eq!(params.params.len(), 3);
        assert_eq!(params.params.get("page"), Some(&"4096".to_string()));
        assert_eq!(params.params.get("bad"), Some(&"3+7".to_string()));
        assert_eq!(params.params.get("image"), Some(&"/tmp/a.bin".to_string()));

        let mut options = params.options_except(&["image"]);
        options.sort();
        assert_eq!(options, vec![("bad", "3+7"), ("page", "4096")]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_programmer_params("ftdi:port").is_err());
        assert!(parse_programmer_params(":port=A").is_err());
    }

    #[test]
    fn test_unknown_programmer() {
        assert!(open_nand("nonexistent", NandConfig::default()).is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy() {
        let mut handle = open_nand("dummy:blocks=8,bad=2", NandConfig::default()).unwrap();
        assert_eq!(handle.geometry().block_count(), 8);
        assert_eq!(handle.chip_info().manufacturer, "Micron");
        assert_eq!(handle.scan_bad_blocks().unwrap(), vec![2]);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_small_dummy() {
        let handle = open_nand("dummy:small=yes,blocks=4", NandConfig::default()).unwrap();
        let geo = handle.geometry();
        assert_eq!(geo.page_size, 512);
        assert_eq!(geo.oob_size, 16);
        assert!(handle.chip_info().onfi_version.is_none());
    }
}
