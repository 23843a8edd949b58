//! Development server with live reload support.
//!
//! ```text
//! GET  /__livefront/live.js   → live client (live mode)
//! GET  /dir                   → 301 /dir/
//! GET  /dir/                  → /dir/index.html
//! GET  /missing               → 404 File not found.
//! POST ...                    → 400 Unsupported request type.
//! ```

mod content;
mod lifecycle;
mod path;
mod response;

use crate::{config::Config, engine::RebuildEngine, log};
use anyhow::{Context, Result};
use path::Target;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Method, Request, Server};

/// Default WebSocket port for live reload
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Actual WebSocket port (may differ from the configured one if it was in use)
/// Updated by the coordinator after the WebSocket server binds
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(DEFAULT_WS_PORT);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Get the actual WebSocket port
pub fn actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Directory served over HTTP: the compile output if set, else the root.
pub fn serve_root(config: &Config) -> PathBuf {
    config
        .compile
        .output_dir()
        .unwrap_or_else(|| config.get_root().to_path_buf())
}

/// Run the `serve` command.
pub fn command(config: &Arc<Config>, compile: bool) -> Result<()> {
    if compile {
        return crate::cli::compile::run(config, true, true);
    }
    run(config, None)
}

/// Bind, start watching (when there is an engine or live mode), and block
/// in the request loop until Ctrl+C.
pub fn run(config: &Arc<Config>, engine: Option<Arc<RebuildEngine>>) -> Result<()> {
    let root = serve_root(config);
    std::fs::create_dir_all(&root)
        .with_context(|| format!("cannot create {}", root.display()))?;

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    crate::core::register_server(Arc::clone(&server));

    set_actual_ws_port(config.serve.ws_port);
    let watch = lifecycle::spawn_watch(config, root.clone(), engine);

    log!("serve"; "serving your files at http://{}/", addr);
    run_request_loop(&server, &root, config.serve.live)?;

    lifecycle::wait_for_shutdown(watch);
    Ok(())
}

fn run_request_loop(server: &Server, root: &Path, live: bool) -> Result<()> {
    // Requests are handled on a small pool so a large file never blocks others
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .context("failed to create thread pool")?;

    for request in server.incoming_requests() {
        let root = root.to_path_buf();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &root, live) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, root: &Path, live: bool) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_bad_request(request);
    }

    if live && request.url().split('?').next() == Some(crate::embed::serve::LIVE_JS_PATH) {
        return response::respond_live_js(request, actual_ws_port());
    }

    match path::resolve_path(request.url(), root) {
        Target::File(path) => response::respond_file(request, &path, live),
        Target::Redirect(location) => response::respond_redirect(request, &location),
        Target::Missing => response::respond_not_found(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use tempfile::TempDir;

    /// Serve `root` on an ephemeral port; returns the port.
    fn spawn_server(root: PathBuf, live: bool) -> u16 {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                handle_request(request, &root, live).unwrap();
            }
        });
        port
    }

    fn request(port: u16, method: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        write!(
            stream,
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    fn site() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/index.html"), "<body>docs</body>").unwrap();
        fs::write(root.join("site.css"), "body{}").unwrap();
        (dir, root)
    }

    #[test]
    fn test_serves_files_and_index() {
        let (_dir, root) = site();
        let port = spawn_server(root, false);

        let css = request(port, "GET", "/site.css");
        assert!(css.starts_with("HTTP/1.1 200"));
        assert!(css.contains("text/css"));
        assert!(css.ends_with("body{}"));

        let docs = request(port, "GET", "/docs/");
        assert!(docs.ends_with("<body>docs</body>"));
    }

    #[test]
    fn test_redirect_not_found_and_bad_method() {
        let (_dir, root) = site();
        let port = spawn_server(root, false);

        let redirect = request(port, "GET", "/docs");
        assert!(redirect.starts_with("HTTP/1.1 301"));
        assert!(redirect.contains("Location: /docs/"));

        let missing = request(port, "GET", "/nope.html");
        assert!(missing.starts_with("HTTP/1.1 404"));
        assert!(missing.ends_with("File not found."));

        let post = request(port, "POST", "/site.css");
        assert!(post.starts_with("HTTP/1.1 400"));
        assert!(post.ends_with("Unsupported request type."));
    }

    #[test]
    fn test_head_has_no_body() {
        let (_dir, root) = site();
        let port = spawn_server(root, false);

        let head = request(port, "HEAD", "/site.css");
        assert!(head.starts_with("HTTP/1.1 200"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_live_mode_injects_and_serves_client() {
        let (_dir, root) = site();
        let port = spawn_server(root, true);

        let page = request(port, "GET", "/docs/");
        assert!(page.ends_with(r#"docs<script src="/__livefront/live.js"></script></body>"#));

        let js = request(port, "GET", "/__livefront/live.js");
        assert!(js.starts_with("HTTP/1.1 200"));
        assert!(js.contains("resolvePaths"));
        assert!(!js.contains("__LIVEFRONT_WS_PORT__"));
    }

    #[test]
    fn test_live_client_hidden_when_not_live() {
        let (_dir, root) = site();
        let port = spawn_server(root, false);
        assert!(request(port, "GET", "/__livefront/live.js").starts_with("HTTP/1.1 404"));
    }
}
