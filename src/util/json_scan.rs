//! Depth-aware scanning over raw JSON text.
//!
//! Decoders use these helpers to cut a nested section (a compound member's
//! type, an array's base type, one entry of a link listing) out of a response
//! buffer so it can be decoded on its own. Everything works on byte offsets
//! into a borrowed `&str`; structural characters are ASCII, so every returned
//! range lies on a char boundary.

use std::ops::Range;

use serde_json::Value;

use super::{Error, Result};

/// Scanner state while walking a JSON section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    Escaped,
}

/// One `"key": value` member of an object, as byte ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member<'a> {
    /// Raw key text between the quotes (escapes are not decoded).
    pub key: &'a str,
    /// Span of the value, including its quotes or brackets.
    pub value: Range<usize>,
}

/// Index one past the `}` (or `]`) that closes the bracket at `open`.
///
/// Quoted content is opaque: braces inside strings and escaped quotes never
/// change the depth.
pub fn find_section_end(text: &str, open: usize) -> Result<usize> {
    let bytes = text.as_bytes();
    let (open_ch, close_ch) = match bytes.get(open) {
        Some(b'{') => (b'{', b'}'),
        Some(b'[') => (b'[', b']'),
        _ => return Err(Error::parse(format!("expected '{{' or '[' at offset {open}"))),
    };

    let mut state = ScanState::Normal;
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        state = match state {
            ScanState::Escaped => ScanState::InString,
            ScanState::InString => match b {
                b'\\' => ScanState::Escaped,
                b'"' => ScanState::Normal,
                _ => ScanState::InString,
            },
            ScanState::Normal => {
                if b == b'"' {
                    ScanState::InString
                } else {
                    if b == open_ch {
                        depth += 1;
                    } else if b == close_ch {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(i + 1);
                        }
                    }
                    ScanState::Normal
                }
            }
        };
    }

    Err(Error::parse(format!("unterminated section starting at offset {open}")))
}

/// Index of the closing quote of the string whose opening quote is at `open`.
fn string_end(text: &str, open: usize) -> Result<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'"') {
        return Err(Error::parse(format!("expected '\"' at offset {open}")));
    }
    let mut state = ScanState::InString;
    for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
        state = match (state, b) {
            (ScanState::Escaped, _) => ScanState::InString,
            (_, b'\\') => ScanState::Escaped,
            (_, b'"') => return Ok(i),
            _ => ScanState::InString,
        };
    }
    Err(Error::parse(format!("unterminated string at offset {open}")))
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Index one past the end of the JSON value starting at `pos`.
fn value_end(text: &str, pos: usize) -> Result<usize> {
    let bytes = text.as_bytes();
    match bytes.get(pos) {
        Some(b'{') | Some(b'[') => find_section_end(text, pos),
        Some(b'"') => string_end(text, pos).map(|i| i + 1),
        Some(_) => {
            let mut end = pos;
            while end < bytes.len()
                && !matches!(bytes[end], b',' | b'}' | b']')
                && !bytes[end].is_ascii_whitespace()
            {
                end += 1;
            }
            Ok(end)
        }
        None => Err(Error::parse("unexpected end of JSON text")),
    }
}

/// Span of the outermost object in `text`.
pub fn root_object(text: &str) -> Result<Range<usize>> {
    let start = skip_ws(text.as_bytes(), 0);
    if text.as_bytes().get(start) != Some(&b'{') {
        return Err(Error::parse("JSON document is not an object"));
    }
    Ok(start..find_section_end(text, start)?)
}

/// Depth-1 members of the object spanning `object`.
pub fn object_members(text: &str, object: Range<usize>) -> Result<Vec<Member<'_>>> {
    let bytes = text.as_bytes();
    if bytes.get(object.start) != Some(&b'{') {
        return Err(Error::parse(format!("expected object at offset {}", object.start)));
    }

    let mut members = Vec::new();
    let mut pos = skip_ws(bytes, object.start + 1);
    if bytes.get(pos) == Some(&b'}') {
        return Ok(members);
    }
    loop {
        let key_end = string_end(text, pos)?;
        let key = &text[pos + 1..key_end];
        pos = skip_ws(bytes, key_end + 1);
        if bytes.get(pos) != Some(&b':') {
            return Err(Error::parse(format!("expected ':' after key '{key}'")));
        }
        let start = skip_ws(bytes, pos + 1);
        let end = value_end(text, start)?;
        members.push(Member { key, value: start..end });

        pos = skip_ws(bytes, end);
        match bytes.get(pos) {
            Some(b',') => pos = skip_ws(bytes, pos + 1),
            Some(b'}') if pos + 1 == object.end => return Ok(members),
            _ => return Err(Error::parse(format!("malformed object near offset {pos}"))),
        }
    }
}

/// Value span of the depth-1 member `key` of `object`, if present.
pub fn find_member(text: &str, object: Range<usize>, key: &str) -> Result<Option<Range<usize>>> {
    Ok(object_members(text, object)?
        .into_iter()
        .find(|m| m.key == key)
        .map(|m| m.value))
}

/// Like [`find_member`] but a missing key is a parse error.
pub fn require_member(text: &str, object: Range<usize>, key: &str) -> Result<Range<usize>> {
    find_member(text, object, key)?
        .ok_or_else(|| Error::parse(format!("unable to locate '{key}' section in JSON")))
}

/// Spans of the elements of the array spanning `array`.
pub fn array_elements(text: &str, array: Range<usize>) -> Result<Vec<Range<usize>>> {
    let bytes = text.as_bytes();
    if bytes.get(array.start) != Some(&b'[') {
        return Err(Error::parse(format!("expected array at offset {}", array.start)));
    }

    let mut elements = Vec::new();
    let mut pos = skip_ws(bytes, array.start + 1);
    if bytes.get(pos) == Some(&b']') {
        return Ok(elements);
    }
    loop {
        let end = value_end(text, pos)?;
        elements.push(pos..end);
        pos = skip_ws(bytes, end);
        match bytes.get(pos) {
            Some(b',') => pos = skip_ws(bytes, pos + 1),
            Some(b']') if pos + 1 == array.end => return Ok(elements),
            _ => return Err(Error::parse(format!("malformed array near offset {pos}"))),
        }
    }
}

/// String member `key` of a parsed object.
pub fn str_member<'v>(value: &'v Value, key: &str) -> Result<&'v str> {
    match value.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(Error::parse(format!("'{key}' should be a string, got {other}"))),
        None => Err(Error::parse(format!("missing '{key}' key"))),
    }
}

/// Numeric member `key` of a parsed object.
pub fn f64_member(value: &Value, key: &str) -> Result<f64> {
    match value.get(key) {
        Some(v) => v
            .as_f64()
            .ok_or_else(|| Error::parse(format!("'{key}' should be a number, got {v}"))),
        None => Err(Error::parse(format!("missing '{key}' key"))),
    }
}
