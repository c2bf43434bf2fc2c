//! GATT server core
//!
//! The attribute model and store, the permission policies, the offset-bounded
//! read/write engine, the prepared-write queue and the server session that ties
//! them to a transport.

pub mod config;
pub mod database;
pub mod engine;
pub mod fixture;
pub mod permission;
pub mod prepared;
pub mod server;
pub mod types;


pub use config::ServerConfig;
pub use database::AttributeStore;
pub use permission::{
    AttributePermissionChecker, FixturePermissionTable, PeerSecurity, PermissionChecker,
    PermissionPolicy, SecurityLevel,
};
pub use prepared::{PreparedWriteQueue, WriteRequest};
pub use server::{
    GattResponse, GattServerCallbacks, GattServerSession, GattServerTransport, ObserverId,
    ReadRequest,
};
pub use types::{
    Attribute, AttributeKind, BtTransport, Characteristic, Descriptor, Permissions, Properties,
    Service, ServiceType, WriteType,
};
