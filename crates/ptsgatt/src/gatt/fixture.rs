//! Built-in PTS test database
//!
//! A GATT service followed by one primary test service that exercises long
//! values, authorization and error responses, read/write restrictions, an
//! encrypted characteristic and an included secondary service.

use super::permission::FixturePermissionTable;
use super::types::{Characteristic, Descriptor, Permissions, Properties, Service};
use crate::att::{
    GattStatus, CLIENT_CHAR_CONFIG_UUID16, DATABASE_HASH_UUID16, GATT_SERVICE_UUID16,
    MAX_ENCRYPTION_KEY_SIZE, SERVICE_CHANGED_UUID16,
};
use crate::uuid::Uuid;

pub const GATT_SERVICE_UUID: Uuid = Uuid::from_u16(GATT_SERVICE_UUID16);
pub const SERVICE_CHANGED_UUID: Uuid = Uuid::from_u16(SERVICE_CHANGED_UUID16);
pub const CLIENT_CHAR_CONFIG_UUID: Uuid = Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID16);
pub const DATABASE_HASH_UUID: Uuid = Uuid::from_u16(DATABASE_HASH_UUID16);

pub const PTS_TEST_SERVICE_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0001);
pub const LONG_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0002);
pub const LONG_DESCRIPTOR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0003);
pub const AUTHORIZATION_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0004);
pub const INTERNAL_ERROR_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0005);
pub const READ_NOT_PERMITTED_CHAR_UUID: Uuid =
    Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0006);
pub const WRITE_NOT_PERMITTED_CHAR_UUID: Uuid =
    Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0007);
pub const SHORT_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0008);
pub const NO_READ_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F0009);
pub const NO_WRITE_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F000A);
pub const ENCRYPTED_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F000B);
pub const INCLUDED_SERVICE_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F000C);
pub const INCLUDED_CHAR_UUID: Uuid = Uuid::from_u128(0x9A066B6A_7E2B_4F0C_9B35_5C1A0F4F000D);

// Handles of the test characteristics
pub const LONG_CHAR_HANDLE: u16 = 6;
pub const LONG_DESCRIPTOR_HANDLE: u16 = 7;
pub const SHORT_CHAR_HANDLE: u16 = 12;
pub const NO_READ_CHAR_HANDLE: u16 = 13;
pub const ENCRYPTED_CHAR_HANDLE: u16 = 15;

/// Length of the long characteristic and descriptor values; longer than one
/// default-MTU read so a client has to use offset reads.
pub const LONG_VALUE_LEN: usize = 48;

fn read_write_char(handle: u16, uuid: Uuid, value: Vec<u8>) -> Characteristic {
    Characteristic::new(
        handle,
        uuid,
        Properties::READ | Properties::WRITE,
        Permissions::read_write(),
    )
    .with_value(value)
}

pub fn pts_services() -> Vec<Service> {
    let gatt_service = Service::primary(1, GATT_SERVICE_UUID)
        .with_characteristic(
            Characteristic::new(2, SERVICE_CHANGED_UUID, Properties::INDICATE, Permissions::READ)
                .with_value(vec![0; 4])
                .with_descriptor(
                    Descriptor::new(3, CLIENT_CHAR_CONFIG_UUID, Permissions::read_write())
                        .with_value(vec![0; 2]),
                ),
        )
        .with_characteristic(
            Characteristic::new(4, DATABASE_HASH_UUID, Properties::READ, Permissions::READ)
                .with_value(vec![0; 16]),
        );

    let included = Service::secondary(16, INCLUDED_SERVICE_UUID).with_characteristic(
        Characteristic::new(17, INCLUDED_CHAR_UUID, Properties::READ, Permissions::READ)
            .with_value(vec![0x42]),
    );

    let test_service = Service::primary(5, PTS_TEST_SERVICE_UUID)
        .with_characteristic(
            read_write_char(LONG_CHAR_HANDLE, LONG_CHAR_UUID, vec![0x07; LONG_VALUE_LEN])
                .with_descriptor(
                    Descriptor::new(LONG_DESCRIPTOR_HANDLE, LONG_DESCRIPTOR_UUID, Permissions::read_write())
                        .with_value(vec![0x08; LONG_VALUE_LEN]),
                ),
        )
        .with_characteristic(read_write_char(8, AUTHORIZATION_CHAR_UUID, vec![0x01]))
        .with_characteristic(read_write_char(9, INTERNAL_ERROR_CHAR_UUID, vec![0x01]))
        .with_characteristic(
            Characteristic::new(
                10,
                READ_NOT_PERMITTED_CHAR_UUID,
                Properties::WRITE,
                Permissions::WRITE,
            )
            .with_value(vec![0x01]),
        )
        .with_characteristic(
            Characteristic::new(
                11,
                WRITE_NOT_PERMITTED_CHAR_UUID,
                Properties::READ,
                Permissions::READ,
            )
            .with_value(vec![0x01]),
        )
        .with_characteristic(read_write_char(SHORT_CHAR_HANDLE, SHORT_CHAR_UUID, vec![0x01, 0x02]))
        .with_characteristic(
            Characteristic::new(
                NO_READ_CHAR_HANDLE,
                NO_READ_CHAR_UUID,
                Properties::WRITE,
                Permissions::WRITE,
            )
            .with_value(vec![0; 8]),
        )
        .with_characteristic(
            Characteristic::new(14, NO_WRITE_CHAR_UUID, Properties::READ, Permissions::READ)
                .with_value(vec![0x55; 4]),
        )
        .with_characteristic(
            Characteristic::new(
                ENCRYPTED_CHAR_HANDLE,
                ENCRYPTED_CHAR_UUID,
                Properties::READ | Properties::WRITE,
                Permissions::READ_ENCRYPTED | Permissions::WRITE_ENCRYPTED,
            )
            .with_key_size(MAX_ENCRYPTION_KEY_SIZE)
            .with_value(vec![0; 4]),
        )
        .with_included_service(included);

    vec![gatt_service, test_service]
}

/// Status each fixture UUID answers with when the fixture table policy is active
pub fn pts_permission_table() -> FixturePermissionTable {
    [
        (GATT_SERVICE_UUID, GattStatus::Success),
        (SERVICE_CHANGED_UUID, GattStatus::Success),
        (CLIENT_CHAR_CONFIG_UUID, GattStatus::Success),
        (DATABASE_HASH_UUID, GattStatus::Success),
        (PTS_TEST_SERVICE_UUID, GattStatus::Success),
        (LONG_CHAR_UUID, GattStatus::Success),
        (LONG_DESCRIPTOR_UUID, GattStatus::Success),
        (AUTHORIZATION_CHAR_UUID, GattStatus::InsufAuthorization),
        (INTERNAL_ERROR_CHAR_UUID, GattStatus::InternalError),
        (READ_NOT_PERMITTED_CHAR_UUID, GattStatus::ReadNotPermit),
        (WRITE_NOT_PERMITTED_CHAR_UUID, GattStatus::WriteNotPermit),
        (SHORT_CHAR_UUID, GattStatus::Success),
        (NO_READ_CHAR_UUID, GattStatus::Success),
        (NO_WRITE_CHAR_UUID, GattStatus::Success),
        (ENCRYPTED_CHAR_UUID, GattStatus::Success),
        (INCLUDED_SERVICE_UUID, GattStatus::Success),
        (INCLUDED_CHAR_UUID, GattStatus::Success),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::database::AttributeStore;

    #[test]
    fn test_fixture_tree_is_valid() {
        let store = AttributeStore::new(pts_services()).unwrap();
        assert_eq!(store.handles().collect::<Vec<_>>(), (1..=17).collect::<Vec<u16>>());
        assert_eq!(store.find_by_uuid(&DATABASE_HASH_UUID).unwrap().handle(), 4);
        assert_eq!(store.value_by_handle(LONG_CHAR_HANDLE).unwrap().len(), LONG_VALUE_LEN);
    }

    #[test]
    fn test_every_fixture_attribute_has_a_table_entry() {
        let store = AttributeStore::new(pts_services()).unwrap();
        let table = pts_permission_table();
        for handle in store.handles() {
            let uuid = *store.find_by_handle(handle).unwrap().uuid();
            assert_ne!(table.status_for(Some(&uuid)), GattStatus::NotFound, "handle {}", handle);
        }
    }
}
