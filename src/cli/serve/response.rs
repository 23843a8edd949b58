//! HTTP response handlers.

use super::content::maybe_inject_live;
use crate::utils::mime::types::{JAVASCRIPT, PLAIN};
use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a file, injecting the live client into HTML when `live`.
pub fn respond_file(request: Request, path: &Path, live: bool) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject_live(body, content_type, live);

    send_body(request, 200, content_type, body)
}

/// Respond with 301 to `location`.
pub fn respond_redirect(request: Request, location: &str) -> Result<()> {
    let header = Header::from_bytes(&b"Location"[..], location.as_bytes())
        .map_err(|()| anyhow!("invalid redirect location {location:?}"))?;
    let response = Response::empty(StatusCode(301)).with_header(header);
    request.respond(response)?;
    Ok(())
}

pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, PLAIN);
    }
    send_body(request, 404, PLAIN, b"File not found.".to_vec())
}

/// Respond with 400 for anything but GET and HEAD.
pub fn respond_bad_request(request: Request) -> Result<()> {
    send_body(request, 400, PLAIN, b"Unsupported request type.".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with live.js from memory.
pub fn respond_live_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::embed::serve::{LIVE_JS, LiveVars};

    if is_head_request(&request) {
        return send_head(request, 200, JAVASCRIPT);
    }
    let body = LIVE_JS.render(&LiveVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-cache"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
