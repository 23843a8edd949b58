//! Actor System for Watch Mode
//!
//! Message-passing concurrency for `compile -w` and `serve -l`:
//!
//! ```text
//! Watcher --> Coordinator --> RebuildEngine
//! (poll)        (events)        (cascade)
//!                  |
//!                  +--> WsActor --> Browser
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - Per-file watch subscriptions (polling or notify)
//! - `ws` - Live-reload hub
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::{Coordinator, LiveOptions};
pub use fs::WatcherKind;
