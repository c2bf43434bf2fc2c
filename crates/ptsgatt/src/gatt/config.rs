//! Declarative server configuration
//!
//! A server is described by a JSON document listing its services in order, each
//! with its characteristics, descriptors and included services:
//!
//! ```json
//! {
//!   "permission_policy": "attribute",
//!   "services": [{
//!     "handle": 1,
//!     "uuid": "180F",
//!     "characteristics": [{
//!       "handle": 2,
//!       "uuid": "2A19",
//!       "properties": 18,
//!       "permissions": 1,
//!       "value": "64",
//!       "descriptors": [{ "handle": 3, "uuid": "2902", "permissions": 17, "value": [0, 0] }]
//!     }]
//!   }]
//! }
//! ```
//!
//! Properties and permissions are the raw Floss bit values. A value is either an
//! array of byte numbers or a hex string. `fixture_status` optionally pins the
//! status an attribute answers with under the fixture table policy.

use super::database::AttributeStore;
use super::fixture;
use super::permission::{
    AttributePermissionChecker, FixturePermissionTable, PermissionChecker, PermissionPolicy,
};
use super::types::{
    Characteristic, Descriptor, Permissions, Properties, Service, ServiceType, WriteType,
};
use crate::att::{GattStatus, ATT_PREPARE_WRITE_QUEUE_SIZE};
use crate::error::ConfigError;
use crate::uuid::Uuid;
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Attribute value as written in a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bytes(Vec<u8>),
    Hex(String),
}

impl Default for AttributeValue {
    fn default() -> Self {
        AttributeValue::Bytes(Vec::new())
    }
}

impl AttributeValue {
    fn decode(&self, handle: u16) -> Result<Vec<u8>, ConfigError> {
        match self {
            AttributeValue::Bytes(bytes) => Ok(bytes.clone()),
            AttributeValue::Hex(text) => {
                let text = text.trim();
                let digits = text.strip_prefix("0x").unwrap_or(text);
                hex::decode(digits).map_err(|e| ConfigError::InvalidValue {
                    handle,
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn default_service_permissions() -> u16 {
    Permissions::READ.bits()
}

fn default_max_prepared_writes() -> usize {
    ATT_PREPARE_WRITE_QUEUE_SIZE
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorRecord {
    pub handle: u16,
    pub uuid: String,
    #[serde(default)]
    pub permissions: u16,
    #[serde(default)]
    pub value: AttributeValue,
    #[serde(default)]
    pub fixture_status: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacteristicRecord {
    pub handle: u16,
    pub uuid: String,
    #[serde(default)]
    pub properties: u8,
    #[serde(default)]
    pub permissions: u16,
    #[serde(default)]
    pub write_type: WriteType,
    #[serde(default)]
    pub key_size: u8,
    #[serde(default)]
    pub value: AttributeValue,
    #[serde(default)]
    pub descriptors: Vec<DescriptorRecord>,
    #[serde(default)]
    pub fixture_status: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceRecord {
    pub handle: u16,
    pub uuid: String,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default = "default_service_permissions")]
    pub permissions: u16,
    #[serde(default)]
    pub value: AttributeValue,
    #[serde(default)]
    pub characteristics: Vec<CharacteristicRecord>,
    #[serde(default)]
    pub included_services: Vec<ServiceRecord>,
    #[serde(default)]
    pub fixture_status: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfigRecord {
    #[serde(default)]
    pub app_uuid: Option<String>,
    #[serde(default)]
    pub eatt_support: bool,
    #[serde(default)]
    pub permission_policy: PermissionPolicy,
    #[serde(default = "default_max_prepared_writes")]
    pub max_prepared_writes: usize,
    pub services: Vec<ServiceRecord>,
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub app_uuid: Uuid,
    pub eatt_support: bool,
    pub permission_policy: PermissionPolicy,
    pub max_prepared_writes: usize,
    pub services: Vec<Service>,
    /// Statuses used when `permission_policy` is the fixture table
    pub fixture_table: FixturePermissionTable,
}

impl ServerConfig {
    /// Configuration with the given services and defaults for everything else
    pub fn new(services: Vec<Service>) -> Self {
        let fixture_table = success_table(&services);
        Self {
            app_uuid: Uuid::new_random_v4(),
            eatt_support: false,
            permission_policy: PermissionPolicy::default(),
            max_prepared_writes: ATT_PREPARE_WRITE_QUEUE_SIZE,
            services,
            fixture_table,
        }
    }

    /// The built-in PTS test database
    pub fn pts_fixture() -> Self {
        Self {
            fixture_table: fixture::pts_permission_table(),
            ..Self::new(fixture::pts_services())
        }
    }

    pub fn with_permission_policy(mut self, policy: PermissionPolicy) -> Self {
        self.permission_policy = policy;
        self
    }

    pub fn with_max_prepared_writes(mut self, max: usize) -> Self {
        self.max_prepared_writes = max;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let record: ServerConfigRecord = serde_json::from_str(json)?;
        let config = Self::try_from(record)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading GATT server configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the service forest without keeping the resulting store
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_store().map(|_| ())
    }

    pub fn build_store(&self) -> Result<AttributeStore, ConfigError> {
        AttributeStore::new(self.services.clone())
    }

    pub fn permission_checker(&self) -> Box<dyn PermissionChecker> {
        match self.permission_policy {
            PermissionPolicy::Attribute => Box::new(AttributePermissionChecker),
            PermissionPolicy::FixtureTable => Box::new(self.fixture_table.clone()),
        }
    }
}

impl TryFrom<ServerConfigRecord> for ServerConfig {
    type Error = ConfigError;

    fn try_from(record: ServerConfigRecord) -> Result<Self, Self::Error> {
        let app_uuid = match record.app_uuid {
            Some(text) => parse_uuid(&text)?,
            None => Uuid::new_random_v4(),
        };

        let mut fixture_table = FixturePermissionTable::new();
        let services = record
            .services
            .iter()
            .map(|service| convert_service(service, &mut fixture_table))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            app_uuid,
            eatt_support: record.eatt_support,
            permission_policy: record.permission_policy,
            max_prepared_writes: record.max_prepared_writes,
            services,
            fixture_table,
        })
    }
}

fn parse_uuid(text: &str) -> Result<Uuid, ConfigError> {
    text.parse().map_err(|source| ConfigError::InvalidUuid {
        text: text.to_string(),
        source,
    })
}

fn parse_permissions(handle: u16, bits: u16) -> Result<Permissions, ConfigError> {
    Permissions::from_bits(bits).ok_or(ConfigError::InvalidFlags {
        handle,
        field: "permission",
        bits,
    })
}

fn record_status(table: &mut FixturePermissionTable, uuid: Uuid, status: Option<u8>) {
    table.insert(uuid, status.map_or(GattStatus::Success, GattStatus::from));
}

fn convert_descriptor(
    record: &DescriptorRecord,
    table: &mut FixturePermissionTable,
) -> Result<Descriptor, ConfigError> {
    let uuid = parse_uuid(&record.uuid)?;
    record_status(table, uuid, record.fixture_status);
    Ok(
        Descriptor::new(record.handle, uuid, parse_permissions(record.handle, record.permissions)?)
            .with_value(record.value.decode(record.handle)?),
    )
}

fn convert_characteristic(
    record: &CharacteristicRecord,
    table: &mut FixturePermissionTable,
) -> Result<Characteristic, ConfigError> {
    let uuid = parse_uuid(&record.uuid)?;
    record_status(table, uuid, record.fixture_status);

    let mut characteristic = Characteristic::new(
        record.handle,
        uuid,
        Properties::from_bits_retain(record.properties),
        parse_permissions(record.handle, record.permissions)?,
    )
    .with_write_type(record.write_type)
    .with_key_size(record.key_size)
    .with_value(record.value.decode(record.handle)?);

    for descriptor in &record.descriptors {
        characteristic = characteristic.with_descriptor(convert_descriptor(descriptor, table)?);
    }
    Ok(characteristic)
}

fn convert_service(
    record: &ServiceRecord,
    table: &mut FixturePermissionTable,
) -> Result<Service, ConfigError> {
    let uuid = parse_uuid(&record.uuid)?;
    record_status(table, uuid, record.fixture_status);

    let mut service = Service::new(record.handle, uuid, record.service_type);
    service.permissions = parse_permissions(record.handle, record.permissions)?;
    service.value = record.value.decode(record.handle)?;

    for characteristic in &record.characteristics {
        service = service.with_characteristic(convert_characteristic(characteristic, table)?);
    }
    for included in &record.included_services {
        service = service.with_included_service(convert_service(included, table)?);
    }
    Ok(service)
}

fn success_table(services: &[Service]) -> FixturePermissionTable {
    fn walk(service: &Service, table: &mut FixturePermissionTable) {
        table.insert(service.uuid, GattStatus::Success);
        for characteristic in &service.characteristics {
            table.insert(characteristic.uuid, GattStatus::Success);
            for descriptor in &characteristic.descriptors {
                table.insert(descriptor.uuid, GattStatus::Success);
            }
        }
        for included in &service.included_services {
            walk(included, table);
        }
    }

    let mut table = FixturePermissionTable::new();
    for service in services {
        walk(service, &mut table);
    }
    table
}
