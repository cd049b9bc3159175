//! Slash-delimited object path helpers.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Trim leading spaces and trailing slashes; collapse a leading `..` to `.`.
///
/// The store has no notion of a parent group, so `../x` behaves like `./x`.
pub fn normalize_path(path: &str) -> &str {
    let mut path = path.trim_start_matches(' ');
    while path.starts_with("..") {
        path = &path[1..];
    }
    if path.len() > 1 {
        let trimmed = path.trim_end_matches('/');
        path = if trimmed.is_empty() { "/" } else { trimmed };
    }
    path
}

/// Split into `(dirname, basename)` at the last `/`.
///
/// `"/a"` gives `("/", "a")`, `"a/b"` gives `("a", "b")`, `"a"` gives `("", "a")`.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// True if `path` names the start object itself.
pub fn is_self_path(path: &str) -> bool {
    path.is_empty() || path.split('/').all(|c| c == "." || c.is_empty()) && !path.starts_with('/')
}

/// Percent-encode one path component.
pub fn encode_component(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

/// Percent-encode a path, keeping its leading `/` and `.` run and the slashes intact.
pub fn encode_path(path: &str) -> String {
    let body = path.trim_start_matches(['/', '.']);
    let prefix = &path[..path.len() - body.len()];

    let mut out = String::with_capacity(path.len() + 8);
    out.push_str(prefix);
    for (i, component) in body.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&encode_component(component));
    }
    out
}
