//! Live-reload script injection.

/// Inject the live client tag if `live` and the content is HTML.
pub fn maybe_inject_live(body: Vec<u8>, content_type: &str, live: bool) -> Vec<u8> {
    if live && crate::utils::mime::is_html(content_type) {
        inject_live_script(&body, crate::embed::serve::live_script_tag().as_bytes())
    } else {
        body
    }
}

/// Insert `script` before the last `</body>`, or append it.
pub fn inject_live_script(content: &[u8], script: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let mut result = Vec::with_capacity(content.len() + script.len());
    match content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            result.extend_from_slice(&content[..pos]);
            result.extend_from_slice(script);
            result.extend_from_slice(&content[pos..]);
        }
        None => {
            result.extend_from_slice(content);
            result.extend_from_slice(script);
        }
    }
    result
}
