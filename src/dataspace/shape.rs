//! Dataspace shape to and from JSON.

use serde_json::Value;

use super::{Dataspace, DimVec, MaxDim, SimpleExtent};
use crate::util::{Error, Result};

/// Request-body fragments describing a dataspace.
///
/// A scalar dataspace has neither fragment: the absence of a shape key is
/// what tells the store the dataspace is scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeJson {
    /// `"shape": ...`
    pub shape: Option<String>,
    /// `"maxdims": [...]`
    pub maxdims: Option<String>,
}

impl ShapeJson {
    /// Join the fragments with commas for splicing into a request body.
    pub fn fragments(&self) -> String {
        [self.shape.as_deref(), self.maxdims.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Wrap the fragments in an object.
    pub fn to_document(&self) -> String {
        format!("{{{}}}", self.fragments())
    }
}

/// Encode the shape of `space` as request fragments.
///
/// Maximum dimensions are written only when they differ from the current
/// ones; unlimited dimensions are written as `0`.
pub fn shape_to_json(space: &Dataspace) -> ShapeJson {
    match space {
        Dataspace::Null => ShapeJson {
            shape: Some(r#""shape": "H5S_NULL""#.to_string()),
            maxdims: None,
        },
        Dataspace::Scalar => ShapeJson::default(),
        Dataspace::Simple(extent) => {
            let shape = format!(r#""shape": {}"#, join_list(extent.dims().iter().copied()));
            let maxdims = extent.is_extendible().then(|| {
                format!(
                    r#""maxdims": {}"#,
                    join_list(extent.maxdims().iter().map(|m| m.wire_value()))
                )
            });
            ShapeJson {
                shape: Some(shape),
                maxdims,
            }
        }
    }
}

fn join_list(values: impl Iterator<Item = u64>) -> String {
    let items: Vec<String> = values.map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Decode the dataspace described by a JSON document.
///
/// Accepts the response form `{"shape": {"class": "H5S_SIMPLE", "dims": [..], "maxdims": [..]}}`
/// as well as the request form produced by [`shape_to_json`]. A document
/// without a `"shape"` key is scalar.
pub fn decode_shape(json: &str) -> Result<Dataspace> {
    let root: Value = serde_json::from_str(json)?;
    let Some(shape) = root.get("shape") else {
        return Ok(Dataspace::Scalar);
    };

    match shape {
        Value::Object(_) => {
            let class = shape
                .get("class")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::parse("dataspace has no 'class' string"))?;
            match class {
                "H5S_NULL" => Ok(Dataspace::Null),
                "H5S_SCALAR" => Ok(Dataspace::Scalar),
                "H5S_SIMPLE" => decode_simple(
                    shape.get("dims").ok_or_else(|| Error::parse("simple dataspace has no 'dims'"))?,
                    shape.get("maxdims"),
                ),
                other => Err(Error::parse(format!("unknown dataspace class '{other}'"))),
            }
        }
        Value::String(s) => match s.as_str() {
            "H5S_NULL" => Ok(Dataspace::Null),
            "H5S_SCALAR" => Ok(Dataspace::Scalar),
            other => Err(Error::parse(format!("unknown dataspace class '{other}'"))),
        },
        Value::Array(_) => decode_simple(shape, root.get("maxdims")),
        other => Err(Error::parse(format!("invalid 'shape' value {other}"))),
    }
}

fn decode_simple(dims: &Value, maxdims: Option<&Value>) -> Result<Dataspace> {
    let dims = u64_list(dims, "dims")?;
    if dims.is_empty() {
        return Err(Error::parse("simple dataspace has an empty 'dims' array"));
    }

    let maxdims: DimVec<MaxDim> = match maxdims {
        Some(m) => {
            let m = u64_list(m, "maxdims")?;
            if m.len() != dims.len() {
                return Err(Error::parse(format!(
                    "'maxdims' has {} entries, 'dims' has {}",
                    m.len(),
                    dims.len()
                )));
            }
            m.into_iter().map(MaxDim::from_wire).collect()
        }
        None => dims.iter().map(|&d| MaxDim::Finite(d)).collect(),
    };

    Ok(Dataspace::Simple(SimpleExtent::new(dims, maxdims)?))
}

fn u64_list(value: &Value, key: &str) -> Result<DimVec<u64>> {
    value
        .as_array()
        .ok_or_else(|| Error::parse(format!("'{key}' is not an array")))?
        .iter()
        .map(|v| {
            v.as_u64()
                .ok_or_else(|| Error::parse(format!("'{key}' entry {v} is not a non-negative integer")))
        })
        .collect()
}
