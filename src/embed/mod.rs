//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server resources (live.js)
//!
//! ```ignore
//! use embed::serve::{LIVE_JS, LiveVars};
//!
//! let js = LIVE_JS.render(&LiveVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL the live client is served at.
    pub const LIVE_JS_PATH: &str = "/__livefront/live.js";

    /// Variables for live.js.
    pub struct LiveVars {
        pub ws_port: u16,
    }

    impl TemplateVars for LiveVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__LIVEFRONT_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live-reload client with WebSocket port injection.
    pub const LIVE_JS: Template<LiveVars> = Template::new(include_str!("serve/live.js"));

    /// Tag injected into served HTML pages.
    pub fn live_script_tag() -> String {
        format!(r#"<script src="{LIVE_JS_PATH}"></script>"#)
    }
}
