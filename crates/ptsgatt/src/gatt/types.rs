//! Attribute model for the GATT server database
//!
//! A database is a forest of services. Each service owns its characteristics and
//! included services, and each characteristic owns its descriptors. All three kinds
//! share one handle space and expose the same common fields through [`Attribute`].

use crate::uuid::Uuid;
use bitflags::bitflags;
use serde::Deserialize;

bitflags! {
    /// Attribute access permissions, using the Floss/Android bit values
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u16 {
        const READ = 0x0001;
        const READ_ENCRYPTED = 0x0002;
        const READ_ENCRYPTED_MITM = 0x0004;
        const WRITE = 0x0010;
        const WRITE_ENCRYPTED = 0x0020;
        const WRITE_ENCRYPTED_MITM = 0x0040;
        const WRITE_SIGNED = 0x0080;
        const WRITE_SIGNED_MITM = 0x0100;
    }
}

impl Permissions {
    pub const ANY_READ: Permissions = Permissions::READ
        .union(Permissions::READ_ENCRYPTED)
        .union(Permissions::READ_ENCRYPTED_MITM);

    pub const ANY_WRITE: Permissions = Permissions::WRITE
        .union(Permissions::WRITE_ENCRYPTED)
        .union(Permissions::WRITE_ENCRYPTED_MITM)
        .union(Permissions::WRITE_SIGNED)
        .union(Permissions::WRITE_SIGNED_MITM);

    pub fn read_only() -> Self {
        Permissions::READ
    }

    pub fn write_only() -> Self {
        Permissions::WRITE
    }

    pub fn read_write() -> Self {
        Permissions::READ | Permissions::WRITE
    }

    pub fn allows_read(&self) -> bool {
        self.intersects(Self::ANY_READ)
    }

    pub fn allows_write(&self) -> bool {
        self.intersects(Self::ANY_WRITE)
    }
}

bitflags! {
    /// Characteristic properties as defined in the Bluetooth specification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Properties: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_NO_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

impl Properties {
    pub fn can_read(&self) -> bool {
        self.contains(Properties::READ)
    }

    pub fn can_write(&self) -> bool {
        self.intersects(
            Properties::WRITE
                | Properties::WRITE_NO_RESPONSE
                | Properties::AUTHENTICATED_SIGNED_WRITES,
        )
    }

    pub fn can_notify(&self) -> bool {
        self.contains(Properties::NOTIFY)
    }

    pub fn can_indicate(&self) -> bool {
        self.contains(Properties::INDICATE)
    }
}

/// How a client is expected to write a characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum WriteType {
    NoResponse = 1,
    #[default]
    Default = 2,
    Signed = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ServiceType {
    #[default]
    Primary = 0,
    Secondary = 1,
}

/// Link type requested when the server initiates a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BtTransport {
    #[default]
    Auto = 0,
    BrEdr = 1,
    Le = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Service,
    Characteristic,
    Descriptor,
}

/// Fields shared by every node of the attribute forest
pub trait Attribute {
    fn handle(&self) -> u16;
    fn uuid(&self) -> &Uuid;
    fn value(&self) -> &[u8];
    fn set_value(&mut self, value: Vec<u8>);
    fn permissions(&self) -> Permissions;
    fn kind(&self) -> AttributeKind;

    /// Characteristic-specific view, for callers that need properties or key size
    fn as_characteristic(&self) -> Option<&Characteristic> {
        None
    }
}

/// A GATT descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Attribute handle
    pub handle: u16,
    /// Descriptor type
    pub uuid: Uuid,
    /// Current value
    pub value: Vec<u8>,
    /// Floss permission bits
    pub permissions: Permissions,
}

impl Descriptor {
    pub fn new(handle: u16, uuid: Uuid, permissions: Permissions) -> Self {
        Self {
            handle,
            uuid,
            value: Vec::new(),
            permissions,
        }
    }

    pub fn with_value(mut self, value: Vec<u8>) -> Self {
        self.value = value;
        self
    }
}

/// A GATT characteristic with its descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct Characteristic {
    /// Handle of the characteristic value
    pub handle: u16,
    /// Characteristic type
    pub uuid: Uuid,
    /// Current value
    pub value: Vec<u8>,
    /// Floss permission bits
    pub permissions: Permissions,
    /// Operations advertised to clients
    pub properties: Properties,
    /// Write type reported to the transport
    pub write_type: WriteType,
    /// Minimum encryption key size in octets; 0 means unconstrained
    pub key_size: u8,
    /// Descriptors, in handle order
    pub descriptors: Vec<Descriptor>,
}

impl Characteristic {
    pub fn new(handle: u16, uuid: Uuid, properties: Properties, permissions: Permissions) -> Self {
        Self {
            handle,
            uuid,
            value: Vec::new(),
            permissions,
            properties,
            write_type: WriteType::default(),
            key_size: 0,
            descriptors: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Vec<u8>) -> Self {
        self.value = value;
        self
    }

    pub fn with_write_type(mut self, write_type: WriteType) -> Self {
        self.write_type = write_type;
        self
    }

    pub fn with_key_size(mut self, key_size: u8) -> Self {
        self.key_size = key_size;
        self
    }

    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }
}

/// A GATT service with its characteristics and included services
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub handle: u16,
    pub uuid: Uuid,
    pub value: Vec<u8>,
    pub permissions: Permissions,
    pub service_type: ServiceType,
    pub characteristics: Vec<Characteristic>,
    pub included_services: Vec<Service>,
}

impl Service {
    pub fn new(handle: u16, uuid: Uuid, service_type: ServiceType) -> Self {
        Self {
            handle,
            uuid,
            value: Vec::new(),
            permissions: Permissions::read_only(),
            service_type,
            characteristics: Vec::new(),
            included_services: Vec::new(),
        }
    }

    pub fn primary(handle: u16, uuid: Uuid) -> Self {
        Self::new(handle, uuid, ServiceType::Primary)
    }

    pub fn secondary(handle: u16, uuid: Uuid) -> Self {
        Self::new(handle, uuid, ServiceType::Secondary)
    }

    pub fn with_characteristic(mut self, characteristic: Characteristic) -> Self {
        self.characteristics.push(characteristic);
        self
    }

    pub fn with_included_service(mut self, service: Service) -> Self {
        self.included_services.push(service);
        self
    }

    pub fn is_primary(&self) -> bool {
        self.service_type == ServiceType::Primary
    }

    /// Highest handle owned by this service, including nested nodes
    pub fn end_handle(&self) -> u16 {
        let characteristics = self.characteristics.iter().map(|c| {
            c.descriptors
                .iter()
                .map(|d| d.handle)
                .fold(c.handle, u16::max)
        });
        let included = self.included_services.iter().map(Service::end_handle);
        characteristics.chain(included).fold(self.handle, u16::max)
    }
}

macro_rules! impl_attribute {
    ($kind:expr) => {
        fn handle(&self) -> u16 {
            self.handle
        }

        fn uuid(&self) -> &Uuid {
            &self.uuid
        }

        fn value(&self) -> &[u8] {
            &self.value
        }

        fn set_value(&mut self, value: Vec<u8>) {
            self.value = value;
        }

        fn permissions(&self) -> Permissions {
            self.permissions
        }

        fn kind(&self) -> AttributeKind {
            $kind
        }
    };
}

impl Attribute for Service {
    impl_attribute!(AttributeKind::Service);
}

impl Attribute for Characteristic {
    impl_attribute!(AttributeKind::Characteristic);

    fn as_characteristic(&self) -> Option<&Characteristic> {
        Some(self)
    }
}

impl Attribute for Descriptor {
    impl_attribute!(AttributeKind::Descriptor);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_groups() {
        assert!(Permissions::READ_ENCRYPTED.allows_read());
        assert!(!Permissions::READ_ENCRYPTED.allows_write());
        assert!(Permissions::WRITE_SIGNED.allows_write());
        assert!(!Permissions::empty().allows_read());
        assert_eq!(Permissions::read_write().bits(), 0x11);
    }

    #[test]
    fn test_service_end_handle_covers_nested_nodes() {
        let service = Service::primary(10, Uuid::from_u16(0x180F))
            .with_characteristic(
                Characteristic::new(11, Uuid::from_u16(0x2A19), Properties::READ, Permissions::READ)
                    .with_descriptor(Descriptor::new(12, Uuid::from_u16(0x2902), Permissions::read_write())),
            )
            .with_included_service(Service::secondary(13, Uuid::from_u16(0x1234)));
        assert_eq!(service.end_handle(), 13);
        assert!(service.is_primary());
    }
}
