//! Prepared-write queue
//!
//! Buffers write fragments until an execute-write commits or cancels them. The
//! queue belongs to the server session, not to a peer: one reliable-write
//! transaction is assumed at a time.

use super::database::AttributeStore;
use super::engine::generic_write;
use crate::address::BdAddr;
use crate::att::GattStatus;
use log::{debug, info};
use std::collections::VecDeque;

/// A write request as delivered by the transport; prepared ones are buffered as is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Peer that sent the request
    pub addr: BdAddr,
    /// Transaction id, echoed in the response
    pub trans_id: i32,
    /// Offset into the attribute value
    pub offset: i32,
    /// Number of bytes to replace; must equal `value.len()`
    pub length: i32,
    /// Prepared (queued) write
    pub is_prep: bool,
    /// Whether the peer expects a response
    pub need_rsp: bool,
    /// Attribute handle
    pub handle: u16,
    /// Bytes to write
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing queued
    Idle,
    /// At least one fragment waits for an execute-write
    Accumulating,
}

#[derive(Debug, Clone)]
pub struct PreparedWriteQueue {
    entries: VecDeque<WriteRequest>,
    capacity: usize,
}

impl PreparedWriteQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn state(&self) -> QueueState {
        if self.entries.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Accumulating
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &WriteRequest> {
        self.entries.iter()
    }

    /// Append a fragment. Returns PREPARE_Q_FULL without queueing when the queue
    /// is at capacity.
    pub fn push(&mut self, entry: WriteRequest) -> GattStatus {
        if self.entries.len() >= self.capacity {
            info!(
                "Prepared write for handle {} from {} dropped: queue full ({} entries)",
                entry.handle, entry.addr, self.capacity
            );
            return GattStatus::PrepareQFull;
        }
        debug!(
            "Queued prepared write: handle {}, offset {}, {} bytes",
            entry.handle,
            entry.offset,
            entry.value.len()
        );
        self.entries.push_back(entry);
        GattStatus::Success
    }

    /// Discard every queued fragment
    pub fn cancel(&mut self) -> GattStatus {
        if !self.entries.is_empty() {
            debug!("Cancelled {} prepared writes", self.entries.len());
        }
        self.entries.clear();
        GattStatus::Success
    }

    /// Drop fragments queued by one peer, e.g. when it disconnects
    pub fn discard_from(&mut self, addr: &BdAddr) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.addr != *addr);
        before - self.entries.len()
    }

    /// Apply queued fragments in FIFO order, stopping at the first failure.
    ///
    /// Fragments applied before a failure stay applied. The queue is empty
    /// afterwards in every case.
    pub fn execute(&mut self, store: &mut AttributeStore) -> GattStatus {
        let mut status = GattStatus::Success;
        while let Some(entry) = self.entries.pop_front() {
            let (result, _) =
                generic_write(store, entry.offset, entry.length, entry.handle, &entry.value);
            if !result.is_success() {
                info!(
                    "Prepared write to handle {} failed with {}, {} fragments discarded",
                    entry.handle,
                    result,
                    self.entries.len()
                );
                status = result;
                break;
            }
        }
        self.entries.clear();
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::types::{Characteristic, Permissions, Properties, Service};
    use crate::uuid::Uuid;

    fn store() -> AttributeStore {
        AttributeStore::new(vec![Service::primary(1, Uuid::from_u16(0xFFF0)).with_characteristic(
            Characteristic::new(
                2,
                Uuid::from_u16(0xFFF1),
                Properties::READ | Properties::WRITE,
                Permissions::read_write(),
            )
            .with_value(vec![0; 6]),
        )])
        .unwrap()
    }

    fn fragment(offset: i32, value: Vec<u8>) -> WriteRequest {
        WriteRequest {
            addr: BdAddr::new([1, 2, 3, 4, 5, 6]),
            trans_id: 1,
            offset,
            length: value.len() as i32,
            is_prep: true,
            need_rsp: true,
            handle: 2,
            value,
        }
    }

    #[test]
    fn test_state_follows_queue_contents() {
        let mut queue = PreparedWriteQueue::new(4);
        assert_eq!(queue.state(), QueueState::Idle);
        queue.push(fragment(0, vec![1]));
        assert_eq!(queue.state(), QueueState::Accumulating);
        queue.cancel();
        assert_eq!(queue.state(), QueueState::Idle);
    }

    #[test]
    fn test_execute_applies_in_order() {
        let mut store = store();
        let mut queue = PreparedWriteQueue::new(4);
        queue.push(fragment(0, vec![1, 1, 1]));
        queue.push(fragment(2, vec![2, 2]));

        assert_eq!(queue.execute(&mut store), GattStatus::Success);
        assert_eq!(store.value_by_handle(2), Some(&[1u8, 1, 2, 2, 0, 0][..]));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_execute_stops_at_first_failure_without_rollback() {
        let mut store = store();
        let mut queue = PreparedWriteQueue::new(4);
        queue.push(fragment(0, vec![7, 7]));
        queue.push(fragment(10, vec![8]));
        queue.push(fragment(4, vec![9]));

        assert_eq!(queue.execute(&mut store), GattStatus::InvalidOffset);
        assert_eq!(store.value_by_handle(2), Some(&[7u8, 7, 0, 0, 0, 0][..]));
        assert_eq!(queue.state(), QueueState::Idle);
    }

    #[test]
    fn test_push_respects_capacity() {
        let mut queue = PreparedWriteQueue::new(1);
        assert_eq!(queue.push(fragment(0, vec![1])), GattStatus::Success);
        assert_eq!(queue.push(fragment(1, vec![2])), GattStatus::PrepareQFull);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_discard_from_peer() {
        let mut queue = PreparedWriteQueue::new(4);
        queue.push(fragment(0, vec![1]));
        let mut other = fragment(1, vec![2]);
        other.addr = BdAddr::new([9; 6]);
        queue.push(other);

        assert_eq!(queue.discard_from(&BdAddr::new([1, 2, 3, 4, 5, 6])), 1);
        assert_eq!(queue.entries().next().unwrap().addr, BdAddr::new([9; 6]));
    }
}
