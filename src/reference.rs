//! Object reference buffers.
//!
//! A dataset of object references travels as fixed 48-byte slots, each
//! holding a NUL-padded `"<collection>/<uri>"` string.

use crate::object::ObjectKind;
use crate::util::{Error, Result};

/// Bytes per reference slot.
pub const OBJECT_REF_SLOT: usize = 48;

/// One object reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRefValue {
    pub kind: ObjectKind,
    pub uri: String,
}

impl ObjectRefValue {
    pub fn new(kind: ObjectKind, uri: impl Into<String>) -> Self {
        Self { kind, uri: uri.into() }
    }
}

/// Pack references into consecutive slots; `None` leaves a slot zeroed.
pub fn encode_object_refs(refs: &[Option<ObjectRefValue>]) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; refs.len() * OBJECT_REF_SLOT];
    for (slot, r) in buf.chunks_exact_mut(OBJECT_REF_SLOT).zip(refs) {
        let Some(r) = r else { continue };
        let text = format!("{}/{}", r.kind.collection(), r.uri);
        // keep one NUL terminator
        if text.len() >= OBJECT_REF_SLOT {
            return Err(Error::invalid(format!(
                "reference '{text}' does not fit a {OBJECT_REF_SLOT}-byte slot"
            )));
        }
        slot[..text.len()].copy_from_slice(text.as_bytes());
    }
    Ok(buf)
}

/// Unpack a slot buffer. The kind comes from the URI's first character.
pub fn decode_object_refs(buf: &[u8]) -> Result<Vec<Option<ObjectRefValue>>> {
    if buf.len() % OBJECT_REF_SLOT != 0 {
        return Err(Error::parse(format!(
            "reference buffer of {} bytes is not a multiple of {OBJECT_REF_SLOT}",
            buf.len()
        )));
    }

    buf.chunks_exact(OBJECT_REF_SLOT)
        .map(|slot| {
            let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
            if end == 0 {
                return Ok(None);
            }
            let text = std::str::from_utf8(&slot[..end])
                .map_err(|_| Error::parse("reference slot is not UTF-8"))?;
            let uri = text.split_once('/').map_or(text, |(_, uri)| uri);
            let kind = ObjectKind::from_uri(uri)
                .ok_or_else(|| Error::parse(format!("cannot infer object kind of reference '{text}'")))?;
            Ok(Some(ObjectRefValue::new(kind, uri)))
        })
        .collect()
}
