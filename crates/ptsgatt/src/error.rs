//! Error types for the ptsgatt library
//!
//! Protocol-level rejections (unknown handle, denied access, bad offset) are not
//! errors here: they are [`GattStatus`](crate::att::GattStatus) values sent back
//! to the peer. These types cover configuration, transport and host-side misuse.

use crate::uuid::{Uuid, UuidParseError};
use thiserror::Error;

/// Errors in a static service definition. Fatal to server startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("handle {0} is used by more than one attribute")]
    DuplicateHandle(u16),

    #[error("UUID {uuid} is used by more than one attribute (handles {first} and {second})")]
    DuplicateUuid { uuid: Uuid, first: u16, second: u16 },

    #[error("handle 0 is reserved and cannot be assigned to {0}")]
    ReservedHandle(Uuid),

    #[error("invalid UUID {text:?}: {source}")]
    InvalidUuid {
        text: String,
        #[source]
        source: UuidParseError,
    },

    #[error("invalid attribute value for handle {handle}: {reason}")]
    InvalidValue { handle: u16, reason: String },

    #[error("unknown {field} bits {bits:#06x} for handle {handle}")]
    InvalidFlags {
        handle: u16,
        field: &'static str,
        bits: u16,
    },

    #[error("key size {key_size} for handle {handle} exceeds 16 octets")]
    InvalidKeySize { handle: u16, key_size: u8 },

    #[error("failed to parse service definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read service definition: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the transport carrying GATT server traffic
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("GATT server proxy is unavailable")]
    Unavailable,

    #[error("transport does not support {0}")]
    Unsupported(&'static str),

    #[error("transport rejected {method}: {reason}")]
    Rejected { method: &'static str, reason: String },

    #[error("transport I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from host-facing GATT server session operations
#[derive(Error, Debug)]
pub enum GattError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("GATT server is not registered")]
    NotRegistered,

    #[error("no attribute with handle {0}")]
    AttributeNotFound(u16),

    #[error("attribute {0} does not support notifications or indications")]
    NotNotifiable(u16),
}

pub type GattResult<T> = Result<T, GattError>;
