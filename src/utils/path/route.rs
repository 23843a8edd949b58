//! URL path utilities.
//!
//! Canonical paths handed to live-reload clients are root-relative URL paths
//! (`/css/site.css`), always with a leading slash and `/` separators.

use std::path::Path;

use percent_encoding::percent_decode_str;

/// Check if a link is external (has a URL scheme like `http:`, `mailto:`,
/// or is protocol-relative `//host/...`).
#[inline]
pub fn is_external_link(link: &str) -> bool {
    if link.starts_with("//") {
        return true;
    }
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Drop `?query` and `#fragment` from a URL.
#[inline]
pub fn strip_query_fragment(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Percent-decode a URL path, keeping it as-is when not valid UTF-8.
pub fn decode_url_path(url: &str) -> String {
    percent_decode_str(url)
        .decode_utf8()
        .map_or_else(|_| url.to_owned(), std::borrow::Cow::into_owned)
}

/// Directory part of a URL path, with trailing slash.
///
/// `/a/b.html` → `/a/`, `/a/` → `/a/`, `/` → `/`.
pub fn url_dir(path: &str) -> &str {
    path.rfind('/').map_or("/", |pos| &path[..=pos])
}

/// Join `reference` onto `base_dir` and normalize `.`/`..` segments.
///
/// Absolute references ignore `base_dir`. `..` never climbs above `/`.
/// The result always starts with `/`; a trailing slash is preserved.
pub fn join_url_path(base_dir: &str, reference: &str) -> String {
    let joined = if reference.starts_with('/') {
        reference.to_owned()
    } else {
        format!("{}/{}", base_dir.trim_end_matches('/'), reference)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut out = format!("/{}", segments.join("/"));
    let trailing = joined.ends_with('/') || joined.ends_with("/.") || joined.ends_with("/..");
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}

/// Root-relative URL path of a filesystem path under `root`.
///
/// Returns `None` when `path` is outside `root`.
pub fn url_path_of(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(format!("/{}", parts.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_external_link() {
        assert!(is_external_link("https://example.com/a.css"));
        assert!(is_external_link("//cdn.example.com/lib.js"));
        assert!(is_external_link("data:text/css,body{}"));
        assert!(!is_external_link("/about"));
        assert!(!is_external_link("../c.css"));
        assert!(!is_external_link("#section"));
    }

    #[test]
    fn test_strip_query_fragment() {
        assert_eq!(strip_query_fragment("/a.css?123"), "/a.css");
        assert_eq!(strip_query_fragment("/a.html#top"), "/a.html");
        assert_eq!(strip_query_fragment("/plain"), "/plain");
    }

    #[test]
    fn test_url_dir() {
        assert_eq!(url_dir("/a/b.html"), "/a/");
        assert_eq!(url_dir("/a/"), "/a/");
        assert_eq!(url_dir("/"), "/");
    }

    #[test]
    fn test_join_url_path() {
        assert_eq!(join_url_path("/a/", "../c.css"), "/c.css");
        assert_eq!(join_url_path("/a/", "./js/app.js"), "/a/js/app.js");
        assert_eq!(join_url_path("/a/", "/abs.css"), "/abs.css");
        assert_eq!(join_url_path("/", "../../x.css"), "/x.css");
        assert_eq!(join_url_path("/a/", "sub/"), "/a/sub/");
    }

    #[test]
    fn test_url_path_of() {
        let root = Path::new("/srv/site");
        assert_eq!(
            url_path_of(root, Path::new("/srv/site/css/a.css")).as_deref(),
            Some("/css/a.css")
        );
        assert_eq!(url_path_of(root, Path::new("/elsewhere/a.css")), None);
    }
}
