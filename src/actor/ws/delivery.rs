use tungstenite::protocol::Message;

use crate::reload::{Action, ClientPathMapping, LiveMessage};

use super::WsActor;

impl WsActor {
    /// Send each client its own action for `path`; drop clients that fail.
    pub(super) fn notify_modified(&self, path: &str) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("live"; "no clients connected");
            return;
        }

        let mut reloads = 0;
        let mut restyles = 0;
        clients.retain_mut(|client| {
            let msg = message_for(client.mapping.as_ref(), path);
            match &msg {
                LiveMessage::FileModified {
                    action: Action::Reload,
                    ..
                } => reloads += 1,
                LiveMessage::FileModified {
                    action: Action::Restyle { .. },
                    ..
                } => restyles += 1,
                _ => {}
            }
            delivered(client.ws.send(Message::Text(msg.to_json().into())))
        });

        if reloads + restyles > 0 {
            crate::log!("live"; "{}: {} reload, {} restyle", path, reloads, restyles);
        }
    }
}

/// `fileModified` for one client; clients that have not resolved yet get
/// no action.
pub(super) fn message_for(mapping: Option<&ClientPathMapping>, path: &str) -> LiveMessage {
    LiveMessage::FileModified {
        path: path.to_string(),
        action: mapping.map_or(Action::None, |m| m.action_for(path)),
    }
}

/// Whether a send left the client usable. A full socket buffer keeps the
/// frame queued in tungstenite and is not a failure.
pub(super) fn delivered(result: tungstenite::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => true,
        Err(e) => {
            crate::debug!("live"; "client dropped: {}", e);
            false
        }
    }
}
