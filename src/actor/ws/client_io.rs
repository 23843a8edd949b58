use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::protocol::Message;

use crate::reload::{ClientPathMapping, LiveMessage};

use super::delivery::delivered;
use super::{RegisteredClient, WsActor};

/// How often the reader thread polls client sockets
const READ_INTERVAL: Duration = Duration::from_millis(50);

impl WsActor {
    /// Complete the handshake and register a new client
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let _ = ws.get_ref().set_nonblocking(true);

                let connected = LiveMessage::connected();
                if let Err(e) = ws.send(Message::Text(connected.to_json().into())) {
                    crate::debug!("live"; "failed to send connected message: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                crate::debug!("live"; "client connected (total: {})", clients.len() + 1);
                clients.push(RegisteredClient { ws, mapping: None });
            }
            Err(e) => {
                crate::log!("live"; "handshake failed: {}", e);
            }
        }
    }

    /// Background thread reading client messages (non-blocking poll)
    pub(super) fn client_reader_loop(
        clients: Arc<Mutex<Vec<RegisteredClient>>>,
        stopped: Arc<AtomicBool>,
    ) {
        while !stopped.load(Ordering::SeqCst) {
            std::thread::sleep(READ_INTERVAL);

            let mut clients = clients.lock();
            clients.retain_mut(|client| loop {
                match client.ws.read() {
                    Ok(Message::Text(text)) => {
                        if let Some(reply) = handle_text(&mut client.mapping, &text)
                            && !delivered(client.ws.send(Message::Text(reply.to_json().into())))
                        {
                            break false;
                        }
                    }
                    Ok(Message::Close(_)) => break false,
                    Ok(_) => {}
                    Err(tungstenite::Error::Io(ref e))
                        if e.kind() == std::io::ErrorKind::WouldBlock =>
                    {
                        break true;
                    }
                    Err(e) => {
                        crate::debug!("live"; "client disconnected: {}", e);
                        break false;
                    }
                }
            });
        }
    }
}

/// Apply one client frame to its mapping; returns the reply, if any.
pub(super) fn handle_text(mapping: &mut Option<ClientPathMapping>, text: &str) -> Option<LiveMessage> {
    match LiveMessage::from_json(text)? {
        LiveMessage::ResolvePaths { page, css, js } => {
            let resolved = ClientPathMapping::resolve(&page, &css, &js);
            crate::debug!(
                "live";
                "client on {} ({} css, {} js)",
                resolved.page,
                resolved.css.len(),
                resolved.js.len()
            );
            let reply = resolved.to_message();
            *mapping = Some(resolved);
            Some(reply)
        }
        _ => None,
    }
}
