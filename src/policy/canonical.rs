//! Lexical path canonicalization.
//!
//! Pure string processing: no filesystem access, no symlink resolution, and
//! it never fails. Nonexistent and malformed paths still produce a value.

/// Parent-directory traversal token.
pub const TRAVERSAL_TOKEN: &str = "..";

/// Canonicalize a caller-supplied path.
///
/// 1. Remove every `..` until none remain. Removal runs to a fixed point, so
///    nested forms such as `....//` or `.../...//` cannot reassemble a token.
/// 2. Collapse runs of `/` into one.
/// 3. Drop `.` segments and any trailing separator. An empty result is `.`.
pub fn canonicalize(raw: &str) -> String {
    let mut path = raw.to_string();
    while path.contains(TRAVERSAL_TOKEN) {
        path = path.replace(TRAVERSAL_TOKEN, "");
    }

    while path.contains("//") {
        path = path.replace("//", "/");
    }

    normalize(&path)
}

fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    match (absolute, segments.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", segments.join("/")),
        (false, true) => ".".to_string(),
        (false, false) => segments.join("/"),
    }
}
