//! Bluetooth device addresses as carried by the transport's GATT server events

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A remote device address.
///
/// Bytes are kept in little-endian (over-the-air) order; the text form is the usual
/// most-significant-first `AA:BB:CC:DD:EE:FF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid device address: {0:?}")]
pub struct AddressParseError(pub String);

impl FromStr for BdAddr {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(AddressParseError(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return Err(AddressParseError(s.to_string()));
            }
            bytes[5 - i] =
                u8::from_str_radix(part, 16).map_err(|_| AddressParseError(s.to_string()))?;
        }

        Ok(Self { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_text_round_trip() {
        let addr: BdAddr = "00:11:22:AA:bb:CC".parse().unwrap();
        assert_eq!(addr.bytes, [0xCC, 0xBB, 0xAA, 0x22, 0x11, 0x00]);
        assert_eq!(addr.to_string(), "00:11:22:AA:BB:CC");
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!("00:11:22:33:44".parse::<BdAddr>().is_err());
        assert!("00:11:22:33:44:5".parse::<BdAddr>().is_err());
        assert!("00:11:22:33:44:GG".parse::<BdAddr>().is_err());
    }
}
