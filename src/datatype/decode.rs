//! JSON to datatype.
//!
//! Scalar keys of a type section are read through `serde_json`; nested type
//! sections (compound member types, array and enum base types) are located in
//! the raw text with the depth-aware scanner and decoded on their own.

use std::ops::Range;

use serde_json::Value;
use smallvec::SmallVec;

use super::{parse_predefined, ArrayType, CharSet, CompoundType, EnumType, ReferenceKind, TypeDescriptor};
use crate::util::json_scan::{array_elements, find_member, require_member, root_object, str_member as str_key};
use crate::util::{Error, Result};

/// Decode the `"type"` member of a JSON document.
///
/// Works on any response that carries a type at the top level: a datatype,
/// dataset or attribute description, or the output of [`encode_type`](super::encode_type).
pub fn decode_type(json: &str) -> Result<TypeDescriptor> {
    let root = root_object(json)?;
    let section = require_member(json, root, "type")?;
    decode_section(json, section, 0)
}

/// Decode a bare type value (an object, or a quoted committed-type URI).
pub fn decode_type_value(json: &str) -> Result<TypeDescriptor> {
    let start = json.len() - json.trim_start().len();
    let end = json.trim_end().len();
    if start >= end {
        return Err(Error::parse("empty type value"));
    }
    decode_section(json, start..end, 0)
}

/// Decode the type section at `span` of `text`.
pub(crate) fn decode_section(text: &str, span: Range<usize>, depth: usize) -> Result<TypeDescriptor> {
    let section = &text[span.clone()];
    if section.starts_with('"') {
        let uri: String = serde_json::from_str(section)?;
        return Ok(TypeDescriptor::Committed { uri });
    }

    let value: Value = serde_json::from_str(section)
        .map_err(|e| Error::parse(format!("invalid type section: {e}")))?;
    let class = str_key(&value, "class")?;
    tracing::trace!(depth, class, "decoding type section");

    match class {
        "H5T_INTEGER" | "H5T_FLOAT" => {
            let base = str_key(&value, "base")?;
            let t = parse_predefined(base)
                .ok_or_else(|| Error::parse(format!("unknown predefined type '{base}'")))?;
            if t.class_name() != class {
                return Err(Error::parse(format!("base type '{base}' does not belong to class {class}")));
            }
            Ok(t)
        }
        "H5T_STRING" => decode_string(&value),
        "H5T_COMPOUND" => decode_compound(text, span, &value, depth),
        "H5T_ARRAY" => {
            let base = decode_section(text, require_member(text, span, "base")?, depth + 1)?;
            let dims = value
                .get("dims")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::parse("array type has no 'dims' array"))?
                .iter()
                .map(|d| d.as_u64().ok_or_else(|| Error::parse(format!("invalid array dimension {d}"))))
                .collect::<Result<SmallVec<[u64; 4]>>>()?;
            if dims.is_empty() {
                return Err(Error::parse("array type has zero rank"));
            }
            Ok(TypeDescriptor::Array(ArrayType::new(base, dims)?))
        }
        "H5T_ENUM" => {
            let base = decode_section(text, require_member(text, span, "base")?, depth + 1)?;
            let mapping = value
                .get("mapping")
                .and_then(Value::as_object)
                .ok_or_else(|| Error::parse("enum type has no 'mapping' object"))?;
            let members = mapping
                .iter()
                .map(|(name, v)| -> Result<(String, i128)> {
                    let int = v
                        .as_i64()
                        .map(i128::from)
                        .or_else(|| v.as_u64().map(i128::from))
                        .ok_or_else(|| Error::parse(format!("enum value of '{name}' is not an integer")))?;
                    Ok((name.clone(), int))
                })
                .collect::<Result<Vec<(String, i128)>>>()?;
            Ok(TypeDescriptor::Enum(EnumType::new(base, members)?))
        }
        "H5T_REFERENCE" => {
            let base = str_key(&value, "base")?;
            ReferenceKind::from_wire(base)
                .map(TypeDescriptor::Reference)
                .ok_or_else(|| Error::parse(format!("unknown reference type '{base}'")))
        }
        "H5T_BITFIELD" | "H5T_OPAQUE" | "H5T_VLEN" | "H5T_TIME" => {
            Err(Error::unsupported(format!("datatype class {class}")))
        }
        other => Err(Error::parse(format!("unknown datatype class '{other}'"))),
    }
}

fn decode_string(value: &Value) -> Result<TypeDescriptor> {
    let charset_name = str_key(value, "charSet")?;
    let charset = CharSet::from_wire(charset_name)
        .ok_or_else(|| Error::unsupported(format!("string character set {charset_name}")))?;
    let pad = str_key(value, "strPad")?;
    let length = value
        .get("length")
        .ok_or_else(|| Error::parse("string type has no 'length' key"))?;

    match length {
        Value::String(s) if s == "H5T_VARIABLE" => {
            if pad != "H5T_STR_NULLTERM" {
                return Err(Error::parse(format!("variable-length string with padding {pad}")));
            }
            Ok(TypeDescriptor::VariableString { charset })
        }
        Value::Number(n) => {
            let length = n
                .as_u64()
                .filter(|&l| l > 0)
                .ok_or_else(|| Error::parse(format!("invalid fixed string length {n}")))?;
            if pad != "H5T_STR_NULLPAD" {
                return Err(Error::parse(format!("fixed-length string with padding {pad}")));
            }
            Ok(TypeDescriptor::FixedString { length: length as usize, charset })
        }
        other => Err(Error::parse(format!("invalid string length {other}"))),
    }
}

fn decode_compound(text: &str, span: Range<usize>, value: &Value, depth: usize) -> Result<TypeDescriptor> {
    let names = value
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::parse("compound type has no 'fields' array"))?;
    let field_spans = array_elements(text, require_member(text, span, "fields")?)?;
    if names.len() != field_spans.len() {
        return Err(Error::parse("compound 'fields' array could not be scanned"));
    }

    let mut members = Vec::with_capacity(names.len());
    for (field, field_span) in names.iter().zip(field_spans) {
        let name = str_key(field, "name")?;
        let type_span = find_member(text, field_span, "type")?
            .ok_or_else(|| Error::parse(format!("unable to locate type of compound member '{name}'")))?;
        members.push((name.to_string(), decode_section(text, type_span, depth + 1)?));
    }
    if members.is_empty() {
        return Err(Error::parse("compound type has no fields"));
    }
    Ok(TypeDescriptor::Compound(CompoundType::packed(members)?))
}
