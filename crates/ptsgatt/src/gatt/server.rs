//! GATT server session
//!
//! Owns the attribute store and answers the requests a transport delivers for one
//! registered server. Every request handler runs to completion and, unless the
//! peer asked for no response, sends exactly one response back through the
//! transport. Problems with a request are reported to the peer as a status, never
//! returned to the caller.

use super::config::ServerConfig;
use super::database::AttributeStore;
use super::engine::{generic_read, generic_write};
use super::permission::{Access, AccessRequest, PeerSecurity, PermissionChecker};
use super::prepared::{PreparedWriteQueue, WriteRequest};
use super::types::{Attribute, BtTransport, Service};
use crate::address::BdAddr;
use crate::att::{GattStatus, ATT_DEFAULT_MTU, ATT_MAX_MTU};
use crate::error::{ConfigError, GattError, GattResult, TransportError};
use crate::uuid::Uuid;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

/// Response to a single read, write or execute-write request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattResponse {
    /// Peer the response goes to
    pub addr: BdAddr,
    /// Transaction id of the request being answered
    pub trans_id: i32,
    /// Outcome of the request
    pub status: GattStatus,
    /// Offset the returned value starts at
    pub offset: i32,
    /// Value bytes; empty on failure
    pub value: Vec<u8>,
}

/// A read request as delivered by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    /// Peer that sent the request
    pub addr: BdAddr,
    /// Transaction id, echoed in the response
    pub trans_id: i32,
    /// Requested offset; only honored for long reads
    pub offset: i32,
    /// Set for read-blob continuations
    pub is_long: bool,
    /// Attribute handle
    pub handle: u16,
}

/// Outbound half of the GATT server proxy
///
/// Calls only hand work to the proxy; results such as the assigned server id or
/// added services come back through the session's event handlers.
pub trait GattServerTransport {
    fn register_server(&mut self, app_uuid: &Uuid, eatt_support: bool) -> Result<(), TransportError>;

    fn unregister_server(&mut self, server_id: i32) -> Result<(), TransportError>;

    fn add_service(&mut self, server_id: i32, service: &Service) -> Result<(), TransportError>;

    fn remove_service(&mut self, server_id: i32, handle: u16) -> Result<(), TransportError>;

    fn send_response(&mut self, server_id: i32, response: &GattResponse) -> Result<(), TransportError>;

    fn send_notification(
        &mut self,
        server_id: i32,
        addr: &BdAddr,
        handle: u16,
        confirm: bool,
        value: &[u8],
    ) -> Result<(), TransportError>;

    fn clear_services(&mut self, _server_id: i32) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("clear_services"))
    }

    fn server_connect(
        &mut self,
        _server_id: i32,
        _addr: &BdAddr,
        _is_direct: bool,
        _transport: BtTransport,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("server_connect"))
    }

    fn server_disconnect(&mut self, _server_id: i32, _addr: &BdAddr) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("server_disconnect"))
    }

    fn set_preferred_phy(
        &mut self,
        _server_id: i32,
        _addr: &BdAddr,
        _tx_phy: u8,
        _rx_phy: u8,
        _phy_options: u16,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("set_preferred_phy"))
    }

    fn read_phy(&mut self, _server_id: i32, _addr: &BdAddr) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("read_phy"))
    }
}

/// Observer of server events
///
/// Observers are called in registration order, after the session has handled
/// the event. Every method defaults to doing nothing.
pub trait GattServerCallbacks {
    fn on_server_registered(&mut self, _status: GattStatus, _server_id: i32) {}

    fn on_server_connection_state(&mut self, _server_id: i32, _connected: bool, _addr: &BdAddr) {}

    fn on_service_added(&mut self, _status: GattStatus, _service: &Service) {}

    fn on_service_removed(&mut self, _status: GattStatus, _handle: u16) {}

    fn on_read_request(&mut self, _request: &ReadRequest, _status: GattStatus) {}

    fn on_write_request(&mut self, _request: &WriteRequest, _status: GattStatus) {}

    fn on_execute_write(&mut self, _addr: &BdAddr, _trans_id: i32, _exec_write: bool, _status: GattStatus) {}

    fn on_notification_sent(&mut self, _addr: &BdAddr, _status: GattStatus) {}

    fn on_mtu_changed(&mut self, _addr: &BdAddr, _mtu: u16) {}

    fn on_phy_update(&mut self, _addr: &BdAddr, _tx_phy: u8, _rx_phy: u8, _status: GattStatus) {}

    fn on_phy_read(&mut self, _addr: &BdAddr, _tx_phy: u8, _rx_phy: u8, _status: GattStatus) {}

    fn on_connection_updated(
        &mut self,
        _addr: &BdAddr,
        _interval: u16,
        _latency: u16,
        _timeout: u16,
        _status: GattStatus,
    ) {
    }

    fn on_subrate_change(
        &mut self,
        _addr: &BdAddr,
        _subrate_factor: u16,
        _latency: u16,
        _cont_num: u16,
        _timeout: u16,
        _status: GattStatus,
    ) {
    }
}

/// Identifies a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Link state of a connected peer, dropped when it disconnects
#[derive(Debug, Clone, Copy)]
struct Peer {
    mtu: u16,
    security: PeerSecurity,
}

impl Default for Peer {
    fn default() -> Self {
        Self {
            mtu: ATT_DEFAULT_MTU,
            security: PeerSecurity::default(),
        }
    }
}

/// One GATT server registered with a transport
pub struct GattServerSession<T: GattServerTransport> {
    config: ServerConfig,
    transport: T,
    store: AttributeStore,
    queue: PreparedWriteQueue,
    checker: Box<dyn PermissionChecker>,
    server_id: Option<i32>,
    peers: BTreeMap<BdAddr, Peer>,
    observers: Vec<(ObserverId, Box<dyn GattServerCallbacks>)>,
    next_observer_id: u64,
}

impl<T: GattServerTransport> GattServerSession<T> {
    /// Build the attribute store and permission checker from `config`
    pub fn new(config: ServerConfig, transport: T) -> Result<Self, ConfigError> {
        let store = config.build_store()?;
        let checker = config.permission_checker();
        let queue = PreparedWriteQueue::new(config.max_prepared_writes);

        info!(
            "GATT server session created: app {}, {} attributes, {:?} permission policy",
            config.app_uuid,
            store.len(),
            config.permission_policy
        );

        Ok(Self {
            config,
            transport,
            store,
            queue,
            checker,
            server_id: None,
            peers: BTreeMap::new(),
            observers: Vec::new(),
            next_observer_id: 0,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    pub fn prepared_writes(&self) -> &PreparedWriteQueue {
        &self.queue
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn server_id(&self) -> Option<i32> {
        self.server_id
    }

    pub fn is_registered(&self) -> bool {
        self.server_id.is_some()
    }

    pub fn register_observer(&mut self, observer: Box<dyn GattServerCallbacks>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn notify_observers<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn GattServerCallbacks),
    {
        for (_, observer) in self.observers.iter_mut() {
            f(observer.as_mut());
        }
    }

    fn registered_id(&self) -> GattResult<i32> {
        self.server_id.ok_or(GattError::NotRegistered)
    }

    /// Ask the transport to register this server. Completion arrives through
    /// [`on_server_registered`](Self::on_server_registered).
    pub fn register(&mut self) -> GattResult<()> {
        info!(
            "Registering GATT server {} (EATT {})",
            self.config.app_uuid,
            if self.config.eatt_support { "on" } else { "off" }
        );
        self.transport
            .register_server(&self.config.app_uuid, self.config.eatt_support)?;
        Ok(())
    }

    pub fn unregister(&mut self) -> GattResult<()> {
        let server_id = self.registered_id()?;
        self.transport.unregister_server(server_id)?;

        info!("Unregistered GATT server {}", server_id);
        self.server_id = None;
        self.queue.cancel();
        self.peers.clear();
        Ok(())
    }

    pub fn remove_service(&mut self, handle: u16) -> GattResult<()> {
        let server_id = self.registered_id()?;
        self.transport.remove_service(server_id, handle)?;
        Ok(())
    }

    pub fn clear_services(&mut self) -> GattResult<()> {
        let server_id = self.registered_id()?;
        self.transport.clear_services(server_id)?;
        Ok(())
    }

    pub fn connect(
        &mut self,
        addr: &BdAddr,
        is_direct: bool,
        transport: BtTransport,
    ) -> GattResult<()> {
        let server_id = self.registered_id()?;
        self.transport
            .server_connect(server_id, addr, is_direct, transport)?;
        Ok(())
    }

    pub fn disconnect(&mut self, addr: &BdAddr) -> GattResult<()> {
        let server_id = self.registered_id()?;
        self.transport.server_disconnect(server_id, addr)?;
        Ok(())
    }

    pub fn set_preferred_phy(
        &mut self,
        addr: &BdAddr,
        tx_phy: u8,
        rx_phy: u8,
        phy_options: u16,
    ) -> GattResult<()> {
        let server_id = self.registered_id()?;
        self.transport
            .set_preferred_phy(server_id, addr, tx_phy, rx_phy, phy_options)?;
        Ok(())
    }

    pub fn read_phy(&mut self, addr: &BdAddr) -> GattResult<()> {
        let server_id = self.registered_id()?;
        self.transport.read_phy(server_id, addr)?;
        Ok(())
    }

    /// Record the link security of a connected peer, used by the attribute
    /// permission policy. Ignored for peers that are not connected.
    pub fn set_peer_security(&mut self, addr: &BdAddr, security: PeerSecurity) {
        match self.peers.get_mut(addr) {
            Some(peer) => {
                debug!(
                    "Peer {} security: {:?}, key size {}",
                    addr, security.level, security.key_size
                );
                peer.security = security;
            }
            None => debug!("Ignoring security update for {}: not connected", addr),
        }
    }

    pub fn is_connected(&self, addr: &BdAddr) -> bool {
        self.peers.contains_key(addr)
    }

    pub fn connected_peers(&self) -> impl Iterator<Item = &BdAddr> + '_ {
        self.peers.keys()
    }

    /// Negotiated ATT MTU for a peer, the default MTU until one is reported
    pub fn mtu(&self, addr: &BdAddr) -> u16 {
        self.peers.get(addr).map_or(ATT_DEFAULT_MTU, |peer| peer.mtu)
    }

    /// Replace an attribute value from the host side, bypassing permissions
    pub fn set_value(&mut self, handle: u16, value: Vec<u8>) -> GattResult<()> {
        if self.store.update_value_by_handle(handle, value) {
            Ok(())
        } else {
            Err(GattError::AttributeNotFound(handle))
        }
    }

    /// Send the stored value of a characteristic as a notification, or as an
    /// indication when `confirm` is set.
    pub fn send_notification(&mut self, addr: &BdAddr, handle: u16, confirm: bool) -> GattResult<()> {
        let server_id = self.registered_id()?;
        let attr = self
            .store
            .find_by_handle(handle)
            .ok_or(GattError::AttributeNotFound(handle))?;

        let allowed = attr.as_characteristic().map_or(false, |c| {
            if confirm {
                c.properties.can_indicate()
            } else {
                c.properties.can_notify()
            }
        });
        if !allowed {
            return Err(GattError::NotNotifiable(handle));
        }

        debug!(
            "Sending {} for handle {} to {}",
            if confirm { "indication" } else { "notification" },
            handle,
            addr
        );
        self.transport
            .send_notification(server_id, addr, handle, confirm, attr.value())?;
        Ok(())
    }

    fn check_access(&self, addr: &BdAddr, handle: u16, access: Access) -> GattStatus {
        let security = self
            .peers
            .get(addr)
            .map(|peer| peer.security)
            .unwrap_or_default();
        let attribute = self.store.find_by_handle(handle);
        let request = AccessRequest {
            uuid: attribute.map(|attr| attr.uuid()),
            attribute,
            access,
            security,
        };
        self.checker.check(&request)
    }

    fn respond(&mut self, response: GattResponse) {
        let Some(server_id) = self.server_id else {
            warn!(
                "Dropping response to {} (trans {}): server not registered",
                response.addr, response.trans_id
            );
            return;
        };

        debug!(
            "Responding to {} trans {}: {}, offset {}, {} bytes",
            response.addr,
            response.trans_id,
            response.status,
            response.offset,
            response.value.len()
        );
        if let Err(e) = self.transport.send_response(server_id, &response) {
            error!(
                "Failed to send response to {} (trans {}): {}",
                response.addr, response.trans_id, e
            );
        }
    }

    pub fn on_server_registered(&mut self, status: GattStatus, server_id: i32) {
        debug!("on_server_registered: status {}, server_id {}", status, server_id);

        if status.is_success() {
            self.server_id = Some(server_id);
            for service in &self.config.services {
                if let Err(e) = self.transport.add_service(server_id, service) {
                    error!("Failed to add service {}: {}", service.uuid, e);
                }
            }
        } else {
            error!(
                "Failed to register server with id {}, status {}",
                server_id, status
            );
        }

        self.notify_observers(|o| o.on_server_registered(status, server_id));
    }

    pub fn on_server_connection_state(&mut self, server_id: i32, connected: bool, addr: BdAddr) {
        debug!(
            "on_server_connection_state: server_id {}, connected {}, addr {}",
            server_id, connected, addr
        );
        if self.server_id != Some(server_id) {
            debug!(
                "Ignoring connection state for server {}, registered as {:?}",
                server_id, self.server_id
            );
            return;
        }

        if connected {
            self.peers.entry(addr).or_default();
        } else {
            let dropped = self.queue.discard_from(&addr);
            if dropped > 0 {
                info!("Discarded {} prepared writes from {}", dropped, addr);
            }
            self.peers.remove(&addr);
        }

        self.notify_observers(|o| o.on_server_connection_state(server_id, connected, &addr));
    }

    pub fn on_service_added(&mut self, status: GattStatus, service: &Service) {
        if status.is_success() {
            debug!(
                "Service {} added at handles {}-{}",
                service.uuid,
                service.handle,
                service.end_handle()
            );
        } else {
            error!("Failed to add service {}: {}", service.uuid, status);
        }
        self.notify_observers(|o| o.on_service_added(status, service));
    }

    pub fn on_service_removed(&mut self, status: GattStatus, handle: u16) {
        debug!("on_service_removed: status {}, handle {}", status, handle);
        self.notify_observers(|o| o.on_service_removed(status, handle));
    }

    /// Answer a read of a characteristic or descriptor value.
    ///
    /// Unless the peer flagged a long read, the read always starts at offset 0.
    pub fn on_attribute_read_request(
        &mut self,
        addr: BdAddr,
        trans_id: i32,
        offset: i32,
        is_long: bool,
        handle: u16,
    ) {
        debug!(
            "Read request from {}: trans {}, offset {}, long {}, handle {}",
            addr, trans_id, offset, is_long, handle
        );
        let request = ReadRequest {
            addr,
            trans_id,
            offset,
            is_long,
            handle,
        };
        let offset = if is_long { offset } else { 0 };

        let (status, value) = match self.check_access(&addr, handle, Access::Read) {
            GattStatus::Success => generic_read(&self.store, offset, handle),
            denied => (denied, Vec::new()),
        };

        self.respond(GattResponse {
            addr,
            trans_id,
            status,
            offset,
            value,
        });
        self.notify_observers(|o| o.on_read_request(&request, status));
    }

    pub fn on_characteristic_read_request(
        &mut self,
        addr: BdAddr,
        trans_id: i32,
        offset: i32,
        is_long: bool,
        handle: u16,
    ) {
        self.on_attribute_read_request(addr, trans_id, offset, is_long, handle);
    }

    pub fn on_descriptor_read_request(
        &mut self,
        addr: BdAddr,
        trans_id: i32,
        offset: i32,
        is_long: bool,
        handle: u16,
    ) {
        self.on_attribute_read_request(addr, trans_id, offset, is_long, handle);
    }

    /// Apply or queue a write.
    ///
    /// A plain write is applied at once and answered with the new value. A
    /// prepared write is queued and answered with the fragment it carried. No
    /// response is sent when the peer did not ask for one.
    pub fn on_attribute_write_request(&mut self, request: WriteRequest) {
        debug!(
            "Write request from {}: trans {}, offset {}, length {}, prep {}, rsp {}, handle {}, value {}",
            request.addr,
            request.trans_id,
            request.offset,
            request.length,
            request.is_prep,
            request.need_rsp,
            request.handle,
            hex::encode(&request.value)
        );

        let access = if request.is_prep {
            Access::PreparedWrite
        } else {
            Access::Write
        };

        let (status, value) = match self.check_access(&request.addr, request.handle, access) {
            GattStatus::Success if request.is_prep => match self.queue.push(request.clone()) {
                GattStatus::Success => (GattStatus::Success, request.value.clone()),
                full => (full, Vec::new()),
            },
            GattStatus::Success => generic_write(
                &mut self.store,
                request.offset,
                request.length,
                request.handle,
                &request.value,
            ),
            denied => (denied, Vec::new()),
        };

        if request.need_rsp {
            self.respond(GattResponse {
                addr: request.addr,
                trans_id: request.trans_id,
                status,
                offset: request.offset,
                value,
            });
        } else {
            debug!(
                "Write from {} (trans {}) finished with {}, no response requested",
                request.addr, request.trans_id, status
            );
        }
        self.notify_observers(|o| o.on_write_request(&request, status));
    }

    pub fn on_characteristic_write_request(&mut self, request: WriteRequest) {
        self.on_attribute_write_request(request);
    }

    pub fn on_descriptor_write_request(&mut self, request: WriteRequest) {
        self.on_attribute_write_request(request);
    }

    /// Commit (`exec_write`) or cancel all queued prepared writes
    pub fn on_execute_write(&mut self, addr: BdAddr, trans_id: i32, exec_write: bool) {
        debug!(
            "Execute write from {}: trans {}, execute {}",
            addr, trans_id, exec_write
        );

        let status = if exec_write {
            self.queue.execute(&mut self.store)
        } else {
            self.queue.cancel()
        };

        self.respond(GattResponse {
            addr,
            trans_id,
            status,
            offset: 0,
            value: Vec::new(),
        });
        self.notify_observers(|o| o.on_execute_write(&addr, trans_id, exec_write, status));
    }

    pub fn on_notification_sent(&mut self, addr: BdAddr, status: GattStatus) {
        debug!("on_notification_sent: addr {}, status {}", addr, status);
        self.notify_observers(|o| o.on_notification_sent(&addr, status));
    }

    pub fn on_mtu_changed(&mut self, addr: BdAddr, mtu: u16) {
        let clamped = mtu.clamp(ATT_DEFAULT_MTU, ATT_MAX_MTU);
        if clamped != mtu {
            warn!("MTU {} reported for {} is out of range, using {}", mtu, addr, clamped);
        } else {
            debug!("on_mtu_changed: addr {}, mtu {}", addr, mtu);
        }
        match self.peers.get_mut(&addr) {
            Some(peer) => peer.mtu = clamped,
            None => debug!("MTU for {} not recorded: not connected", addr),
        }
        self.notify_observers(|o| o.on_mtu_changed(&addr, clamped));
    }

    pub fn on_phy_update(&mut self, addr: BdAddr, tx_phy: u8, rx_phy: u8, status: GattStatus) {
        debug!(
            "on_phy_update: addr {}, tx_phy {}, rx_phy {}, status {}",
            addr, tx_phy, rx_phy, status
        );
        self.notify_observers(|o| o.on_phy_update(&addr, tx_phy, rx_phy, status));
    }

    pub fn on_phy_read(&mut self, addr: BdAddr, tx_phy: u8, rx_phy: u8, status: GattStatus) {
        debug!(
            "on_phy_read: addr {}, tx_phy {}, rx_phy {}, status {}",
            addr, tx_phy, rx_phy, status
        );
        self.notify_observers(|o| o.on_phy_read(&addr, tx_phy, rx_phy, status));
    }

    pub fn on_connection_updated(
        &mut self,
        addr: BdAddr,
        interval: u16,
        latency: u16,
        timeout: u16,
        status: GattStatus,
    ) {
        debug!(
            "on_connection_updated: addr {}, interval {}, latency {}, timeout {}, status {}",
            addr, interval, latency, timeout, status
        );
        self.notify_observers(|o| o.on_connection_updated(&addr, interval, latency, timeout, status));
    }

    pub fn on_subrate_change(
        &mut self,
        addr: BdAddr,
        subrate_factor: u16,
        latency: u16,
        cont_num: u16,
        timeout: u16,
        status: GattStatus,
    ) {
        debug!(
            "on_subrate_change: addr {}, subrate_factor {}, latency {}, cont_num {}, timeout {}, status {}",
            addr, subrate_factor, latency, cont_num, timeout, status
        );
        self.notify_observers(|o| {
            o.on_subrate_change(&addr, subrate_factor, latency, cont_num, timeout, status)
        });
    }
}
