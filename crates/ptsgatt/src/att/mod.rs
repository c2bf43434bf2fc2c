//! Attribute Protocol (ATT) definitions
//!
//! Status codes and protocol constants shared by the GATT server core. The ATT
//! PDU encoding itself belongs to the host stack behind the transport.

pub mod constants;
pub mod status;

pub use self::constants::*;
pub use self::status::GattStatus;
