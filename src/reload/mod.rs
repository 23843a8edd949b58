//! Reload Module
//!
//! WebSocket-based live reload for the dev server.
//!
//! # Architecture
//!
//! ```text
//! Watcher --[asset change]--> Coordinator --[FileModified]--> WsActor --> Browser
//!                                                               ^           |
//!                                                               +--resolve--+
//! ```
//!
//! # Modules
//!
//! - `message` - Wire protocol (resolvePaths, pathsResolved, fileModified)
//! - `mapping` - Per-client canonical path mapping
//! - `server` - WebSocket listener handing clients to the hub

pub mod mapping;
pub mod message;
pub mod server;

pub use mapping::ClientPathMapping;
pub use message::{Action, LiveMessage};
