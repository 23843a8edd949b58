//! WebSocket Actor - Live Reload Hub
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Resolving each client's asset references to canonical paths
//! - Sending every client its own action for a modified file
//!
//! # Architecture
//!
//! ```text
//! Coordinator --[FileModified]--> WsActor --[per-client action]--> Clients
//!                                    ^                                |
//!                                    +--------[resolvePaths]----------+
//! ```

mod client_io;
mod delivery;


use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::HubMsg;
use crate::reload::ClientPathMapping;

/// A connected client and what it last reported displaying
struct RegisteredClient {
    ws: WebSocket<TcpStream>,
    /// `None` until the client sends `resolvePaths`
    mapping: Option<ClientPathMapping>,
}

/// WebSocket Actor - manages client connections and notifications
pub struct WsActor {
    rx: mpsc::Receiver<HubMsg>,
    /// Connected clients (shared by the actor loop and the reader thread)
    clients: Arc<Mutex<Vec<RegisteredClient>>>,
    stopped: Arc<AtomicBool>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<HubMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let stopped = Arc::clone(&self.stopped);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, stopped);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                HubMsg::FileModified(path) => {
                    crate::debug!("live"; "modified {}", path);
                    self.notify_modified(&path);
                }
                HubMsg::AddClient(stream) => self.add_client(stream),
                HubMsg::Shutdown => break,
            }
        }

        crate::debug!("live"; "shutting down");
        self.stopped.store(true, Ordering::SeqCst);
        let mut clients = self.clients.lock();
        for mut client in clients.drain(..) {
            let _ = client.ws.close(None);
        }
    }
}
