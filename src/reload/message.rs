//! Live Reload Message Protocol
//!
//! JSON text frames exchanged between the hub and browser clients, tagged by
//! `type`.
//!
//! # Message Types
//!
//! - `resolvePaths` (client → hub): page path plus raw `<link>`/`<script>` refs
//! - `pathsResolved` (hub → client): canonical → original maps
//! - `fileModified` (hub → client): canonical path plus a per-client action
//! - `connected` (hub → client): sent once after the handshake

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Message exchanged over the live-reload WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LiveMessage {
    /// Client announces what it is displaying
    ResolvePaths {
        /// `location.pathname` of the page
        page: String,
        /// `href` attributes of stylesheet links, as written
        #[serde(default)]
        css: Vec<String>,
        /// `src` attributes of scripts, as written
        #[serde(default)]
        js: Vec<String>,
    },

    /// Hub's canonical view of a `resolvePaths` request
    PathsResolved {
        page: String,
        /// canonical → original
        css: BTreeMap<String, String>,
        /// canonical → original
        js: BTreeMap<String, String>,
    },

    /// An asset changed on disk
    FileModified { path: String, action: Action },

    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },
}

/// What one client should do about a modified file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Action {
    /// Re-fetch the stylesheet whose `href` is exactly this value
    Restyle { href: String },
    /// Full page reload
    Reload,
    /// Not relevant to this client
    None,
}

impl LiveMessage {
    /// Create a connected message
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"fileModified","path":"","action":{"kind":"reload"}}"#.to_string()
        })
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
