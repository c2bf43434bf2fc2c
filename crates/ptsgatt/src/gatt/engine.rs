//! Offset/length-bounded reads and writes against attribute values
//!
//! Bounds are always checked against the length of the value currently stored,
//! so a write can only replace bytes inside the existing value. Growing a value
//! means configuring a longer initial value. An unknown handle behaves like an
//! attribute with an empty value; callers are expected to have rejected it
//! through the permission check already.

use super::database::AttributeStore;
use crate::att::GattStatus;
use log::{debug, warn};

/// Read the value at `handle` starting from `offset`.
///
/// Returns INVALID_OFFSET with an empty value when `offset` is negative or past
/// the end of the value.
pub fn generic_read(store: &AttributeStore, offset: i32, handle: u16) -> (GattStatus, Vec<u8>) {
    let value = store.value_by_handle(handle).unwrap_or_default();

    if offset < 0 || offset as usize > value.len() {
        debug!(
            "Read of handle {} rejected: offset {} outside value of {} bytes",
            handle,
            offset,
            value.len()
        );
        return (GattStatus::InvalidOffset, Vec::new());
    }

    (GattStatus::Success, value[offset as usize..].to_vec())
}

/// Replace `length` bytes at `offset` of the value at `handle` with `data`.
///
/// `data` must carry exactly `length` bytes, so the value never changes size.
/// The new value is stored through the UUID-keyed store update and returned.
pub fn generic_write(
    store: &mut AttributeStore,
    offset: i32,
    length: i32,
    handle: u16,
    data: &[u8],
) -> (GattStatus, Vec<u8>) {
    let (uuid, mut value) = match store.find_by_handle(handle) {
        Some(attr) => (Some(*attr.uuid()), attr.value().to_vec()),
        None => (None, Vec::new()),
    };

    if offset < 0 || value.len() < offset as usize {
        debug!(
            "Write to handle {} rejected: offset {} outside value of {} bytes",
            handle,
            offset,
            value.len()
        );
        return (GattStatus::InvalidOffset, Vec::new());
    }
    let start = offset as usize;
    if length < 0 || start + length as usize > value.len() {
        debug!(
            "Write to handle {} rejected: {} bytes at offset {} overrun value of {} bytes",
            handle,
            length,
            offset,
            value.len()
        );
        return (GattStatus::InvalidAttrLen, Vec::new());
    }
    let end = start + length as usize;
    if data.len() != length as usize {
        debug!(
            "Write to handle {} rejected: {} bytes of data for a length of {}",
            handle,
            data.len(),
            length
        );
        return (GattStatus::InvalidAttrLen, Vec::new());
    }

    value[start..end].copy_from_slice(data);

    match uuid {
        Some(uuid) => {
            store.update_value_by_uuid(&uuid, value.clone());
        }
        None => warn!("Write to unknown handle {} was not stored", handle),
    }

    (GattStatus::Success, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::types::{Characteristic, Permissions, Properties, Service};
    use crate::uuid::Uuid;

    const HANDLE: u16 = 2;

    fn store_with(value: Vec<u8>) -> AttributeStore {
        AttributeStore::new(vec![Service::primary(1, Uuid::from_u16(0xFFF0)).with_characteristic(
            Characteristic::new(
                HANDLE,
                Uuid::from_u16(0xFFF1),
                Properties::READ | Properties::WRITE,
                Permissions::read_write(),
            )
            .with_value(value),
        )])
        .unwrap()
    }

    #[test]
    fn test_read_from_offset() {
        let store = store_with(vec![1, 2, 3, 4]);
        assert_eq!(generic_read(&store, 0, HANDLE), (GattStatus::Success, vec![1, 2, 3, 4]));
        assert_eq!(generic_read(&store, 2, HANDLE), (GattStatus::Success, vec![3, 4]));
        // Reading exactly at the end is allowed and yields nothing.
        assert_eq!(generic_read(&store, 4, HANDLE), (GattStatus::Success, vec![]));
    }

    #[test]
    fn test_read_offset_out_of_range() {
        let store = store_with(vec![1, 2, 3, 4]);
        assert_eq!(generic_read(&store, 5, HANDLE), (GattStatus::InvalidOffset, vec![]));
        assert_eq!(generic_read(&store, -1, HANDLE), (GattStatus::InvalidOffset, vec![]));
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let store = store_with(vec![9, 8, 7]);
        let first = generic_read(&store, 1, HANDLE);
        assert_eq!(generic_read(&store, 1, HANDLE), first);
    }

    #[test]
    fn test_write_splices_in_place() {
        let mut store = store_with(vec![0; 8]);
        let (status, value) = generic_write(&mut store, 2, 3, HANDLE, &[1, 2, 3]);
        assert_eq!(status, GattStatus::Success);
        assert_eq!(value, vec![0, 0, 1, 2, 3, 0, 0, 0]);
        assert_eq!(store.value_by_handle(HANDLE), Some(&value[..]));
    }

    #[test]
    fn test_full_overwrite_round_trip() {
        let mut store = store_with(vec![0; 4]);
        let written = vec![0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(
            generic_write(&mut store, 0, 4, HANDLE, &written).0,
            GattStatus::Success
        );
        assert_eq!(generic_read(&store, 0, HANDLE), (GattStatus::Success, written));
    }

    #[test]
    fn test_write_offset_past_end_is_invalid_offset() {
        let mut store = store_with(vec![0; 4]);
        for length in [0, 1, 100] {
            assert_eq!(
                generic_write(&mut store, 5, length, HANDLE, &[1]),
                (GattStatus::InvalidOffset, vec![])
            );
        }
        assert_eq!(store.value_by_handle(HANDLE), Some(&[0u8; 4][..]));
    }

    #[test]
    fn test_write_overrun_is_invalid_length() {
        let mut store = store_with(vec![0; 4]);
        assert_eq!(
            generic_write(&mut store, 2, 3, HANDLE, &[1, 2, 3]),
            (GattStatus::InvalidAttrLen, vec![])
        );
        assert_eq!(
            generic_write(&mut store, 0, -1, HANDLE, &[]),
            (GattStatus::InvalidAttrLen, vec![])
        );
        assert_eq!(store.value_by_handle(HANDLE), Some(&[0u8; 4][..]));
    }

    #[test]
    fn test_write_data_must_match_length() {
        let mut store = store_with(vec![1, 2]);
        assert_eq!(
            generic_write(&mut store, 0, 0, HANDLE, &[9; 6]),
            (GattStatus::InvalidAttrLen, vec![])
        );
        assert_eq!(
            generic_write(&mut store, 0, 2, HANDLE, &[]),
            (GattStatus::InvalidAttrLen, vec![])
        );
        assert_eq!(
            generic_write(&mut store, 0, 2, HANDLE, &[7]),
            (GattStatus::InvalidAttrLen, vec![])
        );
        assert_eq!(store.value_by_handle(HANDLE), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_write_to_unknown_handle_uses_empty_buffer() {
        let mut store = store_with(vec![0; 4]);
        assert_eq!(
            generic_write(&mut store, 1, 0, 99, &[]),
            (GattStatus::InvalidOffset, vec![])
        );
        assert_eq!(generic_write(&mut store, 0, 0, 99, &[]), (GattStatus::Success, vec![]));
    }
}
