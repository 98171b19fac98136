//! Manufacturer lookup for the first READ-ID byte

/// Name reported for manufacturer codes not present in the table
pub const UNKNOWN: &str = "Unknown";

/// Known JEDEC manufacturer codes of NAND vendors
pub static MANUFACTURERS: &[(u8, &str)] = &[
    (0x98, "Toshiba"),
    (0xEC, "Samsung"),
    (0x04, "Fujitsu"),
    (0x8F, "National Semiconductors"),
    (0x07, "Renesas"),
    (0x20, "ST Micro"),
    (0xAD, "Hynix"),
    (0x2C, "Micron"),
    (0x01, "AMD"),
    (0xC2, "Macronix"),
];

/// Resolve a manufacturer code to a vendor name
pub fn manufacturer_name(id: u8) -> &'static str {
    MANUFACTURERS
        .iter()
        .find(|(code, _)| *code == id)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vendors() {
        assert_eq!(manufacturer_name(0x2C), "Micron");
        assert_eq!(manufacturer_name(0xEC), "Samsung");
        assert_eq!(manufacturer_name(0x98), "Toshiba");
    }

    #[test]
    fn test_unknown_vendor() {
        assert_eq!(manufacturer_name(0x00), UNKNOWN);
        assert_eq!(manufacturer_name(0xFF), UNKNOWN);
    }
}
