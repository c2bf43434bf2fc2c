//! GATT status codes sent back to peers
use super::constants::*;
use std::fmt;

/// Status of a GATT operation, as carried in responses to the peer.
///
/// The ATT error range (0x01-0x13) uses the values from the Bluetooth Core
/// specification; the 0x80+ values are the host-stack codes used by Floss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GattStatus {
    Success,
    InvalidHandle,
    ReadNotPermit,
    WriteNotPermit,
    InvalidPdu,
    InsufAuthentication,
    ReqNotSupported,
    InvalidOffset,
    InsufAuthorization,
    PrepareQFull,
    NotFound,
    NotLong,
    InsufKeySize,
    InvalidAttrLen,
    ErrUnlikely,
    InsufEncryption,
    UnsupportGrpType,
    InsufResource,
    DatabaseOutOfSync,
    ValueNotAllowed,
    NoResources,
    InternalError,
    WrongState,
    DbFull,
    Busy,
    Error,
    IllegalParameter,
    AuthFail,
    EncryptedNoMitm,
    NotEncrypted,
    Congested,
    CccCfgErr,
    PrcInProgress,
    OutOfRange,
    /// Any code without a named variant
    Other(u8),
}

impl GattStatus {
    pub fn is_success(&self) -> bool {
        *self == GattStatus::Success
    }

    pub fn code(&self) -> u8 {
        (*self).into()
    }
}

impl From<u8> for GattStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => GattStatus::Success,
            ATT_ERROR_INVALID_HANDLE => GattStatus::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => GattStatus::ReadNotPermit,
            ATT_ERROR_WRITE_NOT_PERMITTED => GattStatus::WriteNotPermit,
            ATT_ERROR_INVALID_PDU => GattStatus::InvalidPdu,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION => GattStatus::InsufAuthentication,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => GattStatus::ReqNotSupported,
            ATT_ERROR_INVALID_OFFSET => GattStatus::InvalidOffset,
            ATT_ERROR_INSUFFICIENT_AUTHORIZATION => GattStatus::InsufAuthorization,
            ATT_ERROR_PREPARE_QUEUE_FULL => GattStatus::PrepareQFull,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => GattStatus::NotFound,
            ATT_ERROR_ATTRIBUTE_NOT_LONG => GattStatus::NotLong,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE => GattStatus::InsufKeySize,
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => GattStatus::InvalidAttrLen,
            ATT_ERROR_UNLIKELY => GattStatus::ErrUnlikely,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION => GattStatus::InsufEncryption,
            ATT_ERROR_UNSUPPORTED_GROUP_TYPE => GattStatus::UnsupportGrpType,
            ATT_ERROR_INSUFFICIENT_RESOURCES => GattStatus::InsufResource,
            ATT_ERROR_DATABASE_OUT_OF_SYNC => GattStatus::DatabaseOutOfSync,
            ATT_ERROR_VALUE_NOT_ALLOWED => GattStatus::ValueNotAllowed,
            GATT_NO_RESOURCES => GattStatus::NoResources,
            GATT_INTERNAL_ERROR => GattStatus::InternalError,
            GATT_WRONG_STATE => GattStatus::WrongState,
            GATT_DB_FULL => GattStatus::DbFull,
            GATT_BUSY => GattStatus::Busy,
            GATT_ERROR => GattStatus::Error,
            GATT_ILLEGAL_PARAMETER => GattStatus::IllegalParameter,
            GATT_AUTH_FAIL => GattStatus::AuthFail,
            GATT_ENCRYPTED_NO_MITM => GattStatus::EncryptedNoMitm,
            GATT_NOT_ENCRYPTED => GattStatus::NotEncrypted,
            GATT_CONGESTED => GattStatus::Congested,
            GATT_CCC_CFG_ERR => GattStatus::CccCfgErr,
            GATT_PRC_IN_PROGRESS => GattStatus::PrcInProgress,
            GATT_OUT_OF_RANGE => GattStatus::OutOfRange,
            other => GattStatus::Other(other),
        }
    }
}

impl From<GattStatus> for u8 {
    fn from(status: GattStatus) -> Self {
        match status {
            GattStatus::Success => 0,
            GattStatus::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            GattStatus::ReadNotPermit => ATT_ERROR_READ_NOT_PERMITTED,
            GattStatus::WriteNotPermit => ATT_ERROR_WRITE_NOT_PERMITTED,
            GattStatus::InvalidPdu => ATT_ERROR_INVALID_PDU,
            GattStatus::InsufAuthentication => ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
            GattStatus::ReqNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            GattStatus::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            GattStatus::InsufAuthorization => ATT_ERROR_INSUFFICIENT_AUTHORIZATION,
            GattStatus::PrepareQFull => ATT_ERROR_PREPARE_QUEUE_FULL,
            GattStatus::NotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            GattStatus::NotLong => ATT_ERROR_ATTRIBUTE_NOT_LONG,
            GattStatus::InsufKeySize => ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE,
            GattStatus::InvalidAttrLen => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            GattStatus::ErrUnlikely => ATT_ERROR_UNLIKELY,
            GattStatus::InsufEncryption => ATT_ERROR_INSUFFICIENT_ENCRYPTION,
            GattStatus::UnsupportGrpType => ATT_ERROR_UNSUPPORTED_GROUP_TYPE,
            GattStatus::InsufResource => ATT_ERROR_INSUFFICIENT_RESOURCES,
            GattStatus::DatabaseOutOfSync => ATT_ERROR_DATABASE_OUT_OF_SYNC,
            GattStatus::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            GattStatus::NoResources => GATT_NO_RESOURCES,
            GattStatus::InternalError => GATT_INTERNAL_ERROR,
            GattStatus::WrongState => GATT_WRONG_STATE,
            GattStatus::DbFull => GATT_DB_FULL,
            GattStatus::Busy => GATT_BUSY,
            GattStatus::Error => GATT_ERROR,
            GattStatus::IllegalParameter => GATT_ILLEGAL_PARAMETER,
            GattStatus::AuthFail => GATT_AUTH_FAIL,
            GattStatus::EncryptedNoMitm => GATT_ENCRYPTED_NO_MITM,
            GattStatus::NotEncrypted => GATT_NOT_ENCRYPTED,
            GattStatus::Congested => GATT_CONGESTED,
            GattStatus::CccCfgErr => GATT_CCC_CFG_ERR,
            GattStatus::PrcInProgress => GATT_PRC_IN_PROGRESS,
            GattStatus::OutOfRange => GATT_OUT_OF_RANGE,
            GattStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02X})", self, self.code())
    }
}
