//! Per-client path mapping.
//!
//! Clients report references exactly as written in their markup
//! (`../c.css`, `style.css?v=2`). The hub canonicalizes them against the
//! page URL so a change event for `/c.css` can be matched back to the
//! attribute value the client must rewrite.
//!
//! ```text
//! page  /a/b.html
//! css   ../c.css      →  /c.css
//! js    app.js?v=1    →  /a/app.js
//! ```

use std::collections::BTreeMap;

use super::message::{Action, LiveMessage};
use crate::utils::path::route::{decode_url_path, is_external_link, join_url_path, strip_query_fragment, url_dir};

/// Canonical view of what one client displays. Rebuilt on every page load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPathMapping {
    pub page: String,
    /// canonical → original
    pub css: BTreeMap<String, String>,
    /// canonical → original
    pub js: BTreeMap<String, String>,
}

impl ClientPathMapping {
    /// Canonicalize a client's page and references. External references
    /// are dropped.
    pub fn resolve(page: &str, css: &[String], js: &[String]) -> Self {
        let page = canonical_page(page);
        let dir = url_dir(&page);
        let map = |refs: &[String]| {
            refs.iter()
                .filter_map(|original| {
                    canonical_reference(dir, original).map(|c| (c, original.clone()))
                })
                .collect()
        };
        Self {
            css: map(css),
            js: map(js),
            page,
        }
    }

    /// What this client should do when canonical `path` changes.
    pub fn action_for(&self, path: &str) -> Action {
        if let Some(href) = self.css.get(path) {
            return Action::Restyle { href: href.clone() };
        }
        if self.js.contains_key(path) || self.page == path {
            return Action::Reload;
        }
        Action::None
    }

    /// Reply sent to the client after resolving.
    pub fn to_message(&self) -> LiveMessage {
        LiveMessage::PathsResolved {
            page: self.page.clone(),
            css: self.css.clone(),
            js: self.js.clone(),
        }
    }
}

/// Canonical form of a page URL; a directory URL means its `index.html`.
pub fn canonical_page(page: &str) -> String {
    let path = decode_url_path(strip_query_fragment(page));
    let mut canonical = join_url_path("/", &path);
    if canonical.ends_with('/') {
        canonical.push_str("index.html");
    }
    canonical
}

/// Canonical form of a reference written on a page in `page_dir`.
///
/// `None` for external references and empty ones.
pub fn canonical_reference(page_dir: &str, reference: &str) -> Option<String> {
    if is_external_link(reference) {
        return None;
    }
    let path = decode_url_path(strip_query_fragment(reference));
    if path.is_empty() {
        return None;
    }
    Some(join_url_path(page_dir, &path))
}
