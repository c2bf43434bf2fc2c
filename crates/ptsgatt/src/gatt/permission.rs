//! Access checks applied before any attribute read or write
//!
//! Two policies are available. [`AttributePermissionChecker`] evaluates the
//! attribute's own properties and permission bits against the peer's link security
//! and is the default. [`FixturePermissionTable`] answers from a fixed UUID → status
//! table, for replaying the PTS fixture's recorded test vectors.

use super::types::{Attribute, Permissions, Properties};
use crate::att::GattStatus;
use crate::uuid::Uuid;
use serde::Deserialize;
use std::collections::HashMap;

/// Security level of the link to a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SecurityLevel {
    /// No security (unencrypted)
    #[default]
    None,
    /// Encryption without authentication
    EncryptionOnly,
    /// Encryption with authentication (MITM protection)
    EncryptionWithAuthentication,
    /// Secure Connections with encryption and authentication
    SecureConnections,
}

/// Link security state of a peer as seen by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerSecurity {
    pub level: SecurityLevel,
    /// Negotiated encryption key size in octets, 0 when unencrypted
    pub key_size: u8,
}

impl PeerSecurity {
    pub fn new(level: SecurityLevel, key_size: u8) -> Self {
        Self { level, key_size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    PreparedWrite,
}

/// Everything a checker may look at to decide one access
pub struct AccessRequest<'a> {
    /// UUID resolved from the requested handle, `None` if the handle is unknown
    pub uuid: Option<&'a Uuid>,
    pub attribute: Option<&'a dyn Attribute>,
    pub access: Access,
    pub security: PeerSecurity,
}

pub trait PermissionChecker {
    fn check(&self, request: &AccessRequest<'_>) -> GattStatus;
}

/// Selects which checker a server session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    #[default]
    Attribute,
    FixtureTable,
}

/// Evaluates properties and permission bits of the resolved attribute
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributePermissionChecker;

impl AttributePermissionChecker {
    fn check_read(attr: &dyn Attribute, security: PeerSecurity) -> GattStatus {
        let permissions = attr.permissions();
        let readable = attr
            .as_characteristic()
            .map_or(true, |c| c.properties.can_read());

        if !readable || !permissions.allows_read() {
            return GattStatus::ReadNotPermit;
        }
        if permissions.contains(Permissions::READ_ENCRYPTED_MITM)
            && security.level < SecurityLevel::EncryptionWithAuthentication
        {
            return GattStatus::InsufAuthentication;
        }
        if permissions.contains(Permissions::READ_ENCRYPTED)
            && security.level < SecurityLevel::EncryptionOnly
        {
            return GattStatus::InsufEncryption;
        }
        GattStatus::Success
    }

    fn check_write(attr: &dyn Attribute, prepared: bool, security: PeerSecurity) -> GattStatus {
        let permissions = attr.permissions();
        let writable = attr.as_characteristic().map_or(true, |c| {
            if prepared {
                c.properties.contains(Properties::WRITE)
            } else {
                c.properties.can_write()
            }
        });

        if !writable || !permissions.allows_write() {
            return GattStatus::WriteNotPermit;
        }
        if permissions.intersects(Permissions::WRITE_ENCRYPTED_MITM | Permissions::WRITE_SIGNED_MITM)
            && security.level < SecurityLevel::EncryptionWithAuthentication
        {
            return GattStatus::InsufAuthentication;
        }
        if permissions.contains(Permissions::WRITE_ENCRYPTED)
            && security.level < SecurityLevel::EncryptionOnly
        {
            return GattStatus::InsufEncryption;
        }
        GattStatus::Success
    }
}

impl PermissionChecker for AttributePermissionChecker {
    fn check(&self, request: &AccessRequest<'_>) -> GattStatus {
        let Some(attr) = request.attribute else {
            return GattStatus::NotFound;
        };

        let status = match request.access {
            Access::Read => Self::check_read(attr, request.security),
            Access::Write => Self::check_write(attr, false, request.security),
            Access::PreparedWrite => Self::check_write(attr, true, request.security),
        };
        if !status.is_success() {
            return status;
        }

        // A minimum key size implies an encrypted link.
        match attr.as_characteristic() {
            Some(c) if c.key_size > 0 && request.security.level < SecurityLevel::EncryptionOnly => {
                GattStatus::InsufEncryption
            }
            Some(c) if c.key_size > request.security.key_size => GattStatus::InsufKeySize,
            _ => GattStatus::Success,
        }
    }
}

/// Fixed UUID → status table. Unknown or absent UUIDs map to NOT_FOUND.
#[derive(Debug, Clone, Default)]
pub struct FixturePermissionTable {
    statuses: HashMap<Uuid, GattStatus>,
}

impl FixturePermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uuid: Uuid, status: GattStatus) {
        self.statuses.insert(uuid, status);
    }

    pub fn status_for(&self, uuid: Option<&Uuid>) -> GattStatus {
        uuid.and_then(|uuid| self.statuses.get(uuid))
            .copied()
            .unwrap_or(GattStatus::NotFound)
    }
}

impl FromIterator<(Uuid, GattStatus)> for FixturePermissionTable {
    fn from_iter<I: IntoIterator<Item = (Uuid, GattStatus)>>(iter: I) -> Self {
        Self {
            statuses: iter.into_iter().collect(),
        }
    }
}

impl PermissionChecker for FixturePermissionTable {
    fn check(&self, request: &AccessRequest<'_>) -> GattStatus {
        self.status_for(request.uuid)
    }
}
