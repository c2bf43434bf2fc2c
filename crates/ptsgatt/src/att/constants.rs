//! ATT and GATT protocol constants

// ATT error codes
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
pub const ATT_ERROR_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_ERROR_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_ERROR_INVALID_PDU: u8 = 0x04;
pub const ATT_ERROR_INSUFFICIENT_AUTHENTICATION: u8 = 0x05;
pub const ATT_ERROR_REQUEST_NOT_SUPPORTED: u8 = 0x06;
pub const ATT_ERROR_INVALID_OFFSET: u8 = 0x07;
pub const ATT_ERROR_INSUFFICIENT_AUTHORIZATION: u8 = 0x08;
pub const ATT_ERROR_PREPARE_QUEUE_FULL: u8 = 0x09;
pub const ATT_ERROR_ATTRIBUTE_NOT_FOUND: u8 = 0x0A;
pub const ATT_ERROR_ATTRIBUTE_NOT_LONG: u8 = 0x0B;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE: u8 = 0x0C;
pub const ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH: u8 = 0x0D;
pub const ATT_ERROR_UNLIKELY: u8 = 0x0E;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION: u8 = 0x0F;
pub const ATT_ERROR_UNSUPPORTED_GROUP_TYPE: u8 = 0x10;
pub const ATT_ERROR_INSUFFICIENT_RESOURCES: u8 = 0x11;
pub const ATT_ERROR_DATABASE_OUT_OF_SYNC: u8 = 0x12;
pub const ATT_ERROR_VALUE_NOT_ALLOWED: u8 = 0x13;

// Host stack status codes reported through the same status byte
pub const GATT_NO_RESOURCES: u8 = 0x80;
pub const GATT_INTERNAL_ERROR: u8 = 0x81;
pub const GATT_WRONG_STATE: u8 = 0x82;
pub const GATT_DB_FULL: u8 = 0x83;
pub const GATT_BUSY: u8 = 0x84;
pub const GATT_ERROR: u8 = 0x85;
pub const GATT_ILLEGAL_PARAMETER: u8 = 0x87;
pub const GATT_AUTH_FAIL: u8 = 0x89;
pub const GATT_ENCRYPTED_NO_MITM: u8 = 0x8D;
pub const GATT_NOT_ENCRYPTED: u8 = 0x8E;
pub const GATT_CONGESTED: u8 = 0x8F;
pub const GATT_CCC_CFG_ERR: u8 = 0xFD;
pub const GATT_PRC_IN_PROGRESS: u8 = 0xFE;
pub const GATT_OUT_OF_RANGE: u8 = 0xFF;

pub const ATT_DEFAULT_MTU: u16 = 23;
pub const ATT_MAX_MTU: u16 = 517;

// ATT prepare write queue size
pub const ATT_PREPARE_WRITE_QUEUE_SIZE: usize = 64;

// Maximum encryption key size in octets
pub const MAX_ENCRYPTION_KEY_SIZE: u8 = 16;

// Well-known attribute UUIDs
pub const GATT_SERVICE_UUID16: u16 = 0x1801;
pub const SERVICE_CHANGED_UUID16: u16 = 0x2A05;
pub const DATABASE_HASH_UUID16: u16 = 0x2B2A;
pub const CLIENT_CHAR_CONFIG_UUID16: u16 = 0x2902;
