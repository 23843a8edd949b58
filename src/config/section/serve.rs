//! `[serve]` section configuration.
//!
//! Contains development server and live-reload settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"   # Network interface (127.0.0.1 = localhost only)
//! port = 3000               # HTTP port number
//! live = false              # Inject the live-reload client into HTML pages
//! ws_port = 35729           # First WebSocket port to try
//! asset_interval = 200      # html/css/js polling interval in milliseconds
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Enable live reload.
    pub live: bool,

    /// WebSocket port; the next free one is used when taken.
    pub ws_port: u16,

    /// Polling interval for served assets in milliseconds.
    pub asset_interval: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            live: false,
            ws_port: 35729,
            asset_interval: 200,
        }
    }
}

impl ServeConfig {
    pub fn asset_interval(&self) -> Duration {
        Duration::from_millis(self.asset_interval)
    }
}
