//! JSON Pointer addressing of slots below a node.

use crate::error::ProxyError;
use crate::events::Key;

fn unescape(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

/// Parse an RFC 6901 pointer into keys.
///
/// - `"" -> []`
/// - `"/a~1b/0" -> [Name("a/b"), Name("0")]`
///
/// Every token is a `Key::Name`; nodes map numeric names onto indices when
/// they address a sequence. Relative pointers (`"a/b"`) are accepted as if
/// prefixed with `/`.
pub fn parse_pointer(pointer: &str) -> Result<Vec<Key>, ProxyError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    if body.split('/').any(has_bad_escape) {
        return Err(ProxyError::InvalidPath);
    }
    Ok(body.split('/').map(|t| Key::Name(unescape(t))).collect())
}

/// `~` must be followed by `0` or `1`.
fn has_bad_escape(token: &str) -> bool {
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return true;
        }
    }
    false
}
