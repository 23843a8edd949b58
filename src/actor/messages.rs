//! Actor Message Definitions
//!
//! ```text
//! Watcher --WatchEvent--> Coordinator --cascade--> RebuildEngine
//!                              |
//!                              +--HubMsg--> WsActor
//! ```

use std::path::PathBuf;

// =============================================================================
// Watcher Events
// =============================================================================

/// Which pipeline a subscription feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchTag {
    /// Source or dependency: triggers a cascade
    Source,
    /// Served html/css/js: forwarded to the hub
    Asset,
}

/// A subscribed file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub tag: WatchTag,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to the live-reload hub
pub enum HubMsg {
    /// Canonical root-relative path of a modified asset
    FileModified(String),
    /// Raw stream from the listener, handshake pending
    AddClient(std::net::TcpStream),
    /// Close all clients and stop
    Shutdown,
}
