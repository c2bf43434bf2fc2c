//! Example driving a GATT server session through a scripted PTS exchange
//!
//! The transport here only prints what it is asked to send, and the "peer" is a
//! fixed list of requests. Pass a JSON service definition as the first argument
//! to use it instead of the built-in PTS database, and set `RUST_LOG=debug` to see
//! the session's own logging.

use ptsgatt::gatt::fixture::{LONG_CHAR_HANDLE, NO_READ_CHAR_HANDLE, SHORT_CHAR_HANDLE};
use ptsgatt::gatt::Service;
use ptsgatt::{
    BdAddr, GattResponse, GattServerSession, GattServerTransport, GattStatus, ServerConfig,
    TransportError, Uuid, WriteRequest,
};

/// Transport that prints every outbound call
struct PrintingTransport;

impl GattServerTransport for PrintingTransport {
    fn register_server(&mut self, app_uuid: &Uuid, eatt_support: bool) -> Result<(), TransportError> {
        println!("-> RegisterServer({}, eatt={})", app_uuid, eatt_support);
        Ok(())
    }

    fn unregister_server(&mut self, server_id: i32) -> Result<(), TransportError> {
        println!("-> UnregisterServer({})", server_id);
        Ok(())
    }

    fn add_service(&mut self, server_id: i32, service: &Service) -> Result<(), TransportError> {
        println!(
            "-> AddService({}, {} handles {}-{})",
            server_id,
            service.uuid,
            service.handle,
            service.end_handle()
        );
        Ok(())
    }

    fn remove_service(&mut self, server_id: i32, handle: u16) -> Result<(), TransportError> {
        println!("-> RemoveService({}, {})", server_id, handle);
        Ok(())
    }

    fn send_response(&mut self, server_id: i32, response: &GattResponse) -> Result<(), TransportError> {
        println!(
            "-> SendResponse({}, {}, trans {}, {}, offset {}, [{}])",
            server_id,
            response.addr,
            response.trans_id,
            response.status,
            response.offset,
            hex::encode(&response.value)
        );
        Ok(())
    }

    fn send_notification(
        &mut self,
        server_id: i32,
        addr: &BdAddr,
        handle: u16,
        confirm: bool,
        value: &[u8],
    ) -> Result<(), TransportError> {
        println!(
            "-> SendNotification({}, {}, handle {}, confirm {}, [{}])",
            server_id,
            addr,
            handle,
            confirm,
            hex::encode(value)
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_path(path)?,
        None => ServerConfig::pts_fixture(),
    };

    let mut session = GattServerSession::new(config, PrintingTransport)?;
    session.register()?;
    // The proxy would answer asynchronously; play its part.
    session.on_server_registered(GattStatus::Success, 1);

    let peer: BdAddr = "00:11:22:33:44:55".parse()?;
    session.on_server_connection_state(1, true, peer);
    session.on_mtu_changed(peer, 185);
    println!("Peer {} connected, MTU {}", peer, session.mtu(&peer));

    // Long read of the 48 byte characteristic, then a write in the middle of it
    session.on_characteristic_read_request(peer, 1, 0, true, LONG_CHAR_HANDLE);
    session.on_characteristic_write_request(WriteRequest {
        addr: peer,
        trans_id: 2,
        offset: 10,
        length: 5,
        is_prep: false,
        need_rsp: true,
        handle: LONG_CHAR_HANDLE,
        value: vec![1, 2, 3, 4, 5],
    });
    session.on_characteristic_read_request(peer, 3, 10, true, LONG_CHAR_HANDLE);

    // Reliable write of the short characteristic
    for (trans_id, offset, byte) in [(4, 0, 0xAA), (5, 1, 0xBB)] {
        session.on_characteristic_write_request(WriteRequest {
            addr: peer,
            trans_id,
            offset,
            length: 1,
            is_prep: true,
            need_rsp: true,
            handle: SHORT_CHAR_HANDLE,
            value: vec![byte],
        });
    }
    session.on_execute_write(peer, 6, true);
    session.on_characteristic_read_request(peer, 7, 0, false, SHORT_CHAR_HANDLE);

    // Rejected read
    session.on_characteristic_read_request(peer, 8, 0, false, NO_READ_CHAR_HANDLE);

    if let Err(e) = session.send_notification(&peer, 2, true) {
        println!("Indication not sent: {}", e);
    }

    session.on_server_connection_state(1, false, peer);
    session.unregister()?;
    Ok(())
}
