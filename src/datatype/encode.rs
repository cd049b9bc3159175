//! Datatype to JSON.

use serde_json::{json, Map, Value};

use super::{predefined_name, TypeDescriptor};
use crate::config::CodecOptions;
use crate::util::{Error, Result};

/// Encode as a `{"type": ...}` document using default options.
pub fn encode_type(t: &TypeDescriptor) -> Result<String> {
    encode_type_with(t, &CodecOptions::default())
}

/// Encode as a `{"type": ...}` document.
pub fn encode_type_with(t: &TypeDescriptor, options: &CodecOptions) -> Result<String> {
    let body = type_to_value(t, options)?;
    Ok(json!({ "type": body }).to_string())
}

/// Encode just the type value, for embedding into a create request.
///
/// A committed type yields its quoted URI.
pub fn encode_type_body(t: &TypeDescriptor, options: &CodecOptions) -> Result<String> {
    Ok(type_to_value(t, options)?.to_string())
}

/// Build the JSON value of a type.
pub fn type_to_value(t: &TypeDescriptor, options: &CodecOptions) -> Result<Value> {
    let value = match t {
        TypeDescriptor::Integer { .. } | TypeDescriptor::Float { .. } => {
            let name = predefined_name(t).ok_or_else(|| {
                Error::unsupported(format!("no predefined name for {t} ({} bytes)", t.size().unwrap_or(0)))
            })?;
            json!({ "class": t.class_name(), "base": name })
        }
        TypeDescriptor::FixedString { length, charset } => {
            if *length == 0 {
                return Err(Error::invalid("fixed-length string must have a non-zero length"));
            }
            if *charset == super::CharSet::Utf8 && !options.server_version.supports_fixed_utf8() {
                return Err(Error::unsupported(format!(
                    "fixed-length UTF-8 strings need server version 0.8.5 or later (have {})",
                    options.server_version
                )));
            }
            json!({
                "class": "H5T_STRING",
                "charSet": charset.wire_name(),
                "strPad": "H5T_STR_NULLPAD",
                "length": length,
            })
        }
        TypeDescriptor::VariableString { charset } => json!({
            "class": "H5T_STRING",
            "charSet": charset.wire_name(),
            "strPad": "H5T_STR_NULLTERM",
            "length": "H5T_VARIABLE",
        }),
        TypeDescriptor::Compound(c) => {
            let fields = c
                .fields()
                .iter()
                .map(|f| -> Result<Value> {
                    Ok(json!({ "name": f.name, "type": type_to_value(&f.datatype, options)? }))
                })
                .collect::<Result<Vec<Value>>>()?;
            json!({ "class": "H5T_COMPOUND", "fields": fields })
        }
        TypeDescriptor::Array(a) => json!({
            "class": "H5T_ARRAY",
            "base": type_to_value(a.base(), options)?,
            "dims": a.dims(),
        }),
        TypeDescriptor::Enum(e) => {
            let mut mapping = Map::new();
            for (name, value) in e.members() {
                mapping.insert(name.clone(), integer_value(*value)?);
            }
            json!({
                "class": "H5T_ENUM",
                "base": type_to_value(e.base(), options)?,
                "mapping": mapping,
            })
        }
        TypeDescriptor::Reference(kind) => json!({ "class": "H5T_REFERENCE", "base": kind.wire_name() }),
        TypeDescriptor::Committed { uri } => Value::String(uri.clone()),
        TypeDescriptor::Bitfield { .. }
        | TypeDescriptor::Opaque { .. }
        | TypeDescriptor::VarLen(_)
        | TypeDescriptor::Time { .. } => {
            return Err(Error::unsupported(format!("datatype class {}", t.class_name())));
        }
    };
    Ok(value)
}

fn integer_value(v: i128) -> Result<Value> {
    if let Ok(v) = i64::try_from(v) {
        Ok(Value::from(v))
    } else if let Ok(v) = u64::try_from(v) {
        Ok(Value::from(v))
    } else {
        Err(Error::invalid(format!("enum value {v} exceeds 64 bits")))
    }
}
