//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Where a request URL leads under the serve root.
#[derive(Debug, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    /// Directory requested without a trailing slash; redirect here
    Redirect(String),
    Missing,
}

/// Resolve URL to a file, handling `index.html` for directories.
pub fn resolve_path(url: &str, serve_root: &Path) -> Target {
    let (path, query) = match url.find('?') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
        return Target::Missing;
    };

    let clean = decoded.trim_matches('/');
    // Reject traversal early; symlinks are checked below
    if clean.split('/').any(|segment| segment == "..") {
        return Target::Missing;
    }

    let Ok(canonical) = serve_root.join(clean).canonicalize() else {
        return Target::Missing;
    };
    let Ok(root_canonical) = serve_root.canonicalize() else {
        return Target::Missing;
    };
    if !canonical.starts_with(&root_canonical) {
        return Target::Missing;
    }

    if canonical.is_file() {
        return Target::File(canonical);
    }

    if canonical.is_dir() {
        if !decoded.ends_with('/') {
            return Target::Redirect(format!("{path}/{query}"));
        }
        let index = canonical.join("index.html");
        if index.is_file() {
            return Target::File(index);
        }
    }

    Target::Missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("docs/index.html"), "docs").unwrap();
        fs::write(root.join("my style.css"), "body{}").unwrap();
        (dir, root)
    }

    #[test]
    fn test_root_serves_index() {
        let (_dir, root) = site();
        assert_eq!(resolve_path("/", &root), Target::File(root.join("index.html")));
    }

    #[test]
    fn test_directory_without_slash_redirects() {
        let (_dir, root) = site();
        assert_eq!(
            resolve_path("/docs?x=1", &root),
            Target::Redirect("/docs/?x=1".into())
        );
        assert_eq!(
            resolve_path("/docs/", &root),
            Target::File(root.join("docs/index.html"))
        );
    }

    #[test]
    fn test_query_and_encoding() {
        let (_dir, root) = site();
        assert_eq!(
            resolve_path("/my%20style.css?t=123", &root),
            Target::File(root.join("my style.css"))
        );
    }

    #[test]
    fn test_missing_and_traversal() {
        let (_dir, root) = site();
        assert_eq!(resolve_path("/nope.html", &root), Target::Missing);
        assert_eq!(resolve_path("/empty/", &root), Target::Missing);
        assert_eq!(resolve_path("/../etc/passwd", &root), Target::Missing);
        assert_eq!(resolve_path("/docs/%2e%2e/%2e%2e/x", &root), Target::Missing);
    }
}
