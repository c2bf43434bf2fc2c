use rand::RngCore;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Represents a 128-bit Bluetooth UUID.
///
/// 16-bit and 32-bit SIG-assigned values are expanded against the Bluetooth base UUID.
/// Internally the UUID is always stored as a 128-bit value in little-endian byte order,
/// and it always prints in the canonical uppercase hyphenated form
/// (`0000180A-0000-1000-8000-00805F9B34FB`), which is also how attribute UUIDs are
/// compared and reported to peers and test tools.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid {
    bytes: [u8; 16],
}

/// The base UUID used for constructing 128-bit UUIDs from 16-bit and 32-bit values.
/// Defined as "00000000-0000-1000-8000-00805F9B34FB" (little-endian representation).
const BASE_UUID_BYTES: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Offset within the base UUID where the 16/32-bit value is inserted.
const BASE_OFFSET: usize = 12;

impl Uuid {
    /// Creates a new 128-bit UUID directly from 16 bytes (big-endian).
    pub fn from_bytes_be(mut bytes: [u8; 16]) -> Self {
        bytes.reverse();
        Uuid { bytes }
    }

    /// Creates a UUID from its 128-bit integer value (as written in text form).
    pub const fn from_u128(value: u128) -> Self {
        Uuid {
            bytes: value.to_le_bytes(),
        }
    }

    /// Creates a 128-bit UUID from a 16-bit SIG-assigned value.
    pub const fn from_u16(uuid16: u16) -> Self {
        let mut bytes = BASE_UUID_BYTES;
        bytes[BASE_OFFSET] = uuid16 as u8;
        bytes[BASE_OFFSET + 1] = (uuid16 >> 8) as u8;
        Uuid { bytes }
    }

    /// Creates a 128-bit UUID from a 32-bit SIG-assigned value.
    pub const fn from_u32(uuid32: u32) -> Self {
        let mut bytes = BASE_UUID_BYTES;
        bytes[BASE_OFFSET] = uuid32 as u8;
        bytes[BASE_OFFSET + 1] = (uuid32 >> 8) as u8;
        bytes[BASE_OFFSET + 2] = (uuid32 >> 16) as u8;
        bytes[BASE_OFFSET + 3] = (uuid32 >> 24) as u8;
        Uuid { bytes }
    }

    /// Generates a random (Version 4) UUID.
    pub fn new_random_v4() -> Self {
        let mut bytes_be = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes_be);

        // Set version (4) and variant (RFC 4122)
        bytes_be[6] = (bytes_be[6] & 0x0F) | 0x40;
        bytes_be[8] = (bytes_be[8] & 0x3F) | 0x80;

        Uuid::from_bytes_be(bytes_be)
    }

    /// Returns the underlying 16 bytes in big-endian order.
    pub fn as_bytes_be(&self) -> [u8; 16] {
        let mut bytes = self.bytes;
        bytes.reverse();
        bytes
    }

    fn is_sig_assigned(&self) -> bool {
        self.bytes[0..BASE_OFFSET] == BASE_UUID_BYTES[0..BASE_OFFSET]
    }

    /// Returns the 16-bit value if this is a SIG-assigned 16-bit UUID.
    pub fn as_u16(&self) -> Option<u16> {
        if self.is_sig_assigned()
            && self.bytes[BASE_OFFSET + 2] == 0
            && self.bytes[BASE_OFFSET + 3] == 0
        {
            Some(u16::from_le_bytes([
                self.bytes[BASE_OFFSET],
                self.bytes[BASE_OFFSET + 1],
            ]))
        } else {
            None
        }
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.as_bytes_be();
        write!(
            f,
            "{:02X}{:02X}{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(u16_val) = self.as_u16() {
            write!(f, "Uuid(0x{:04X})", u16_val)
        } else {
            write!(f, "Uuid({})", self)
        }
    }
}

/// Errors produced while parsing a UUID from text
#[derive(Debug, Error, PartialEq)]
pub enum UuidParseError {
    #[error("UUID has {0} hex digits, expected 4, 8 or 32")]
    InvalidLength(usize),

    #[error("UUID contains characters other than hex digits and hyphens")]
    InvalidFormat,

    #[error("invalid hex in UUID: {0}")]
    HexError(#[from] hex::FromHexError),
}

impl From<ParseIntError> for UuidParseError {
    fn from(_: ParseIntError) -> Self {
        UuidParseError::InvalidFormat
    }
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.chars().any(|c| !c.is_ascii_hexdigit() && c != '-') {
            return Err(UuidParseError::InvalidFormat);
        }
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();

        match cleaned.len() {
            4 => Ok(Uuid::from_u16(u16::from_str_radix(&cleaned, 16)?)),
            8 => Ok(Uuid::from_u32(u32::from_str_radix(&cleaned, 16)?)),
            32 => {
                let mut bytes_be = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut bytes_be)?;
                Ok(Uuid::from_bytes_be(bytes_be))
            }
            len => Err(UuidParseError::InvalidLength(len)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sig_uuid_formats_uppercase() {
        let uuid = Uuid::from_u16(0x2b2a);
        assert_eq!(uuid.to_string(), "00002B2A-0000-1000-8000-00805F9B34FB");
        assert_eq!(uuid.as_u16(), Some(0x2B2A));
        assert_eq!(uuid, 0x2B2Au16);
    }

    #[test]
    fn test_parse_short_and_long_forms() {
        let short: Uuid = "2902".parse().unwrap();
        let long: Uuid = "00002902-0000-1000-8000-00805f9b34fb".parse().unwrap();
        assert_eq!(short, long);

        let uuid32: Uuid = "0001FFF0".parse().unwrap();
        assert_eq!(uuid32.to_string(), "0001FFF0-0000-1000-8000-00805F9B34FB");
        assert_eq!(uuid32.as_u16(), None);

        let custom: Uuid = "9A066B6A-7E2B-4F0C-9B35-5C1A0F4F0006".parse().unwrap();
        assert_eq!(custom.to_string(), "9A066B6A-7E2B-4F0C-9B35-5C1A0F4F0006");
        assert_eq!(custom.as_u16(), None);
        assert_eq!(custom, Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0006));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("12345".parse::<Uuid>(), Err(UuidParseError::InvalidLength(5)));
        assert_eq!("zz02".parse::<Uuid>(), Err(UuidParseError::InvalidFormat));
    }

    #[test]
    fn test_random_v4_has_version_bits() {
        let uuid = Uuid::new_random_v4();
        let be = uuid.as_bytes_be();
        assert_eq!(be[6] >> 4, 4);
        assert_eq!(be[8] & 0xC0, 0x80);
    }
}
