//! WebSocket Server for Live Reload
//!
//! Accepts connections on a dedicated port and hands each raw stream to the
//! hub actor, which performs the handshake.

use std::net::{IpAddr, TcpListener};

use anyhow::Result;

use crate::actor::messages::HubMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the WebSocket listener on the HTTP server's interface. Returns the
/// port actually bound.
///
/// Tries `base_port` first and walks upward while ports are in use.
pub fn start_ws_server(
    interface: IpAddr,
    base_port: u16,
    hub_tx: tokio::sync::mpsc::Sender<HubMsg>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    // Spawn acceptor thread
    std::thread::spawn(move || {
        loop {
            if crate::core::is_shutdown() {
                break;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("live"; "client connected: {}", addr);

                    // Handshake runs in blocking mode
                    let _ = stream.set_nonblocking(false);

                    if hub_tx.blocking_send(HubMsg::AddClient(stream)).is_err() {
                        crate::debug!("live"; "hub stopped, closing listener");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("live"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind live-reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
