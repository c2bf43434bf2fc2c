//! ptsgatt - GATT server attribute database and request dispatcher
//!
//! This library implements the server side of a GATT test fixture: a static
//! attribute database, permission checking, offset-bounded reads and writes,
//! prepared (queued) writes and a session that answers the requests a GATT
//! server transport delivers. The transport itself is supplied by the host
//! through [`GattServerTransport`].

pub mod address;
pub mod att;
pub mod error;
pub mod gatt;
pub mod uuid;

// Re-export common types for convenience
pub use address::BdAddr;
pub use att::GattStatus;
pub use error::{ConfigError, GattError, GattResult, TransportError};
pub use gatt::{
    AttributeStore, GattResponse, GattServerCallbacks, GattServerSession, GattServerTransport,
    PermissionPolicy, ServerConfig, WriteRequest,
};
pub use uuid::Uuid;
