//! Attribute store for the GATT server
//!
//! Owns the attribute forest and keeps two indexes over it, by handle and by UUID.
//! The forest is validated once when the store is built and its shape never changes
//! afterwards; only attribute values mutate.

use super::types::{Attribute, Service};
use crate::att::MAX_ENCRYPTION_KEY_SIZE;
use crate::error::ConfigError;
use crate::uuid::Uuid;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Position of a node inside the forest: the chain of service indexes (root
/// service, then included services), then optionally a characteristic and one
/// of its descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Location {
    service_path: Vec<usize>,
    characteristic: Option<usize>,
    descriptor: Option<usize>,
}

impl Location {
    fn service(service_path: Vec<usize>) -> Self {
        Self {
            service_path,
            characteristic: None,
            descriptor: None,
        }
    }
}

/// In-memory attribute database
#[derive(Debug, Clone)]
pub struct AttributeStore {
    services: Vec<Service>,
    handles: BTreeMap<u16, Location>,
    uuids: HashMap<Uuid, u16>,
}

impl AttributeStore {
    /// Build a store from a service forest.
    ///
    /// Fails if a handle is 0, if two attributes share a handle or a UUID, or if a
    /// characteristic asks for a key size larger than 16 octets.
    pub fn new(services: Vec<Service>) -> Result<Self, ConfigError> {
        let mut store = Self {
            services: Vec::new(),
            handles: BTreeMap::new(),
            uuids: HashMap::new(),
        };

        for (index, service) in services.iter().enumerate() {
            store.index_service(service, vec![index])?;
        }
        store.services = services;

        debug!(
            "Attribute store built: {} services, {} attributes",
            store.services.len(),
            store.handles.len()
        );
        Ok(store)
    }

    fn index_attribute(
        &mut self,
        attr: &dyn Attribute,
        location: Location,
    ) -> Result<(), ConfigError> {
        let handle = attr.handle();
        if handle == 0 {
            return Err(ConfigError::ReservedHandle(*attr.uuid()));
        }
        if self.handles.contains_key(&handle) {
            return Err(ConfigError::DuplicateHandle(handle));
        }
        if let Some(&first) = self.uuids.get(attr.uuid()) {
            return Err(ConfigError::DuplicateUuid {
                uuid: *attr.uuid(),
                first,
                second: handle,
            });
        }

        self.handles.insert(handle, location);
        self.uuids.insert(*attr.uuid(), handle);
        Ok(())
    }

    // Depth first: the service, its characteristics with their descriptors, then
    // included services.
    fn index_service(&mut self, service: &Service, path: Vec<usize>) -> Result<(), ConfigError> {
        self.index_attribute(service, Location::service(path.clone()))?;

        for (c_index, characteristic) in service.characteristics.iter().enumerate() {
            if characteristic.key_size > MAX_ENCRYPTION_KEY_SIZE {
                return Err(ConfigError::InvalidKeySize {
                    handle: characteristic.handle,
                    key_size: characteristic.key_size,
                });
            }

            self.index_attribute(
                characteristic,
                Location {
                    service_path: path.clone(),
                    characteristic: Some(c_index),
                    descriptor: None,
                },
            )?;

            for (d_index, descriptor) in characteristic.descriptors.iter().enumerate() {
                self.index_attribute(
                    descriptor,
                    Location {
                        service_path: path.clone(),
                        characteristic: Some(c_index),
                        descriptor: Some(d_index),
                    },
                )?;
            }
        }

        for (s_index, included) in service.included_services.iter().enumerate() {
            let mut included_path = path.clone();
            included_path.push(s_index);
            self.index_service(included, included_path)?;
        }

        Ok(())
    }

    fn service_at(&self, path: &[usize]) -> Option<&Service> {
        let (first, rest) = path.split_first()?;
        let mut service = self.services.get(*first)?;
        for index in rest {
            service = service.included_services.get(*index)?;
        }
        Some(service)
    }

    fn service_at_mut(&mut self, path: &[usize]) -> Option<&mut Service> {
        let (first, rest) = path.split_first()?;
        let mut service = self.services.get_mut(*first)?;
        for index in rest {
            service = service.included_services.get_mut(*index)?;
        }
        Some(service)
    }

    fn resolve(&self, location: &Location) -> Option<&dyn Attribute> {
        let service = self.service_at(&location.service_path)?;
        match (location.characteristic, location.descriptor) {
            (None, _) => Some(service),
            (Some(c), None) => service
                .characteristics
                .get(c)
                .map(|characteristic| characteristic as &dyn Attribute),
            (Some(c), Some(d)) => service
                .characteristics
                .get(c)?
                .descriptors
                .get(d)
                .map(|descriptor| descriptor as &dyn Attribute),
        }
    }

    fn resolve_mut(&mut self, location: &Location) -> Option<&mut dyn Attribute> {
        let service = self.service_at_mut(&location.service_path)?;
        match (location.characteristic, location.descriptor) {
            (None, _) => Some(service),
            (Some(c), None) => service
                .characteristics
                .get_mut(c)
                .map(|characteristic| characteristic as &mut dyn Attribute),
            (Some(c), Some(d)) => service
                .characteristics
                .get_mut(c)?
                .descriptors
                .get_mut(d)
                .map(|descriptor| descriptor as &mut dyn Attribute),
        }
    }

    /// The service forest, in definition order
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Number of attributes across all services, characteristics and descriptors
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// All attribute handles in ascending order
    pub fn handles(&self) -> impl Iterator<Item = u16> + '_ {
        self.handles.keys().copied()
    }

    pub fn has_attribute(&self, handle: u16) -> bool {
        self.handles.contains_key(&handle)
    }

    /// Find the service, characteristic or descriptor with the given handle
    pub fn find_by_handle(&self, handle: u16) -> Option<&dyn Attribute> {
        self.handles
            .get(&handle)
            .and_then(|location| self.resolve(location))
    }

    pub fn find_by_handle_mut(&mut self, handle: u16) -> Option<&mut dyn Attribute> {
        let location = self.handles.get(&handle)?.clone();
        self.resolve_mut(&location)
    }

    pub fn find_by_uuid(&self, uuid: &Uuid) -> Option<&dyn Attribute> {
        self.uuids
            .get(uuid)
            .and_then(|handle| self.find_by_handle(*handle))
    }

    /// Canonical UUID string of the attribute at `handle`, or an empty string when
    /// there is no such attribute.
    pub fn find_uuid_by_handle(&self, handle: u16) -> String {
        self.find_by_handle(handle)
            .map(|attr| attr.uuid().to_string())
            .unwrap_or_default()
    }

    pub fn value_by_handle(&self, handle: u16) -> Option<&[u8]> {
        self.find_by_handle(handle).map(|attr| attr.value())
    }

    /// Replace the value of the attribute with the given UUID.
    ///
    /// Returns false (and logs) when no attribute carries that UUID.
    pub fn update_value_by_uuid(&mut self, uuid: &Uuid, value: Vec<u8>) -> bool {
        let Some(&handle) = self.uuids.get(uuid) else {
            warn!("No attribute with UUID {} to update", uuid);
            return false;
        };
        self.update_value_by_handle(handle, value)
    }

    pub fn update_value_by_handle(&mut self, handle: u16, value: Vec<u8>) -> bool {
        match self.find_by_handle_mut(handle) {
            Some(attr) => {
                attr.set_value(value);
                true
            }
            None => {
                warn!("No attribute with handle {} to update", handle);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::types::{AttributeKind, Characteristic, Descriptor, Permissions, Properties};

    fn sample_services() -> Vec<Service> {
        vec![
            Service::primary(1, Uuid::from_u16(0x1801)).with_characteristic(
                Characteristic::new(2, Uuid::from_u16(0x2A05), Properties::INDICATE, Permissions::READ)
                    .with_descriptor(
                        Descriptor::new(3, Uuid::from_u16(0x2902), Permissions::read_write())
                            .with_value(vec![0, 0]),
                    ),
            ),
            Service::primary(4, Uuid::from_u16(0x180F))
                .with_characteristic(
                    Characteristic::new(5, Uuid::from_u16(0x2A19), Properties::READ, Permissions::READ)
                        .with_value(vec![100]),
                )
                .with_included_service(
                    Service::secondary(6, Uuid::from_u16(0xFFF0)).with_characteristic(
                        Characteristic::new(7, Uuid::from_u16(0xFFF1), Properties::READ, Permissions::READ)
                            .with_value(vec![1, 2, 3]),
                    ),
                ),
        ]
    }

    #[test]
    fn test_find_by_handle_covers_every_kind() {
        let store = AttributeStore::new(sample_services()).unwrap();
        assert_eq!(store.len(), 7);

        assert_eq!(store.find_by_handle(1).unwrap().kind(), AttributeKind::Service);
        assert_eq!(store.find_by_handle(2).unwrap().kind(), AttributeKind::Characteristic);
        assert_eq!(store.find_by_handle(3).unwrap().kind(), AttributeKind::Descriptor);
        assert_eq!(store.find_by_handle(6).unwrap().kind(), AttributeKind::Service);
        assert_eq!(store.find_by_handle(7).unwrap().value(), &[1, 2, 3]);
        assert!(store.find_by_handle(8).is_none());
        assert!(store.find_by_handle(0).is_none());
        assert_eq!(store.handles().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_find_uuid_by_handle_is_empty_when_missing() {
        let store = AttributeStore::new(sample_services()).unwrap();
        assert_eq!(
            store.find_uuid_by_handle(5),
            "00002A19-0000-1000-8000-00805F9B34FB"
        );
        assert_eq!(store.find_uuid_by_handle(42), "");
    }

    #[test]
    fn test_update_value_by_uuid() {
        let mut store = AttributeStore::new(sample_services()).unwrap();
        assert!(store.update_value_by_uuid(&Uuid::from_u16(0x2A19), vec![42]));
        assert_eq!(store.value_by_handle(5), Some(&[42u8][..]));

        assert!(store.update_value_by_uuid(&Uuid::from_u16(0xFFF1), vec![9]));
        assert_eq!(store.value_by_handle(7), Some(&[9u8][..]));

        assert!(!store.update_value_by_uuid(&Uuid::from_u16(0xBEEF), vec![1]));
    }

    #[test]
    fn test_duplicate_handle_is_rejected() {
        let services = vec![Service::primary(1, Uuid::from_u16(0x1801)).with_characteristic(
            Characteristic::new(1, Uuid::from_u16(0x2A05), Properties::READ, Permissions::READ),
        )];
        assert!(matches!(
            AttributeStore::new(services),
            Err(ConfigError::DuplicateHandle(1))
        ));
    }

    #[test]
    fn test_duplicate_uuid_is_rejected() {
        let hash = Uuid::from_u16(0x2B2A);
        let services = vec![Service::primary(1, Uuid::from_u16(0x1801))
            .with_characteristic(Characteristic::new(4, hash, Properties::READ, Permissions::READ))
            .with_characteristic(Characteristic::new(5, hash, Properties::READ, Permissions::READ))];
        match AttributeStore::new(services) {
            Err(ConfigError::DuplicateUuid { uuid, first, second }) => {
                assert_eq!(uuid, hash);
                assert_eq!((first, second), (4, 5));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_reserved_handle_and_key_size_are_rejected() {
        let services = vec![Service::primary(0, Uuid::from_u16(0x1801))];
        assert!(matches!(
            AttributeStore::new(services),
            Err(ConfigError::ReservedHandle(_))
        ));

        let services = vec![Service::primary(1, Uuid::from_u16(0x1801)).with_characteristic(
            Characteristic::new(2, Uuid::from_u16(0x2A05), Properties::READ, Permissions::READ)
                .with_key_size(17),
        )];
        assert!(matches!(
            AttributeStore::new(services),
            Err(ConfigError::InvalidKeySize { handle: 2, key_size: 17 })
        ));
    }
}
