//! Dataset creation properties.
//!
//! Filters are recognized by identity and parameters only; nothing here
//! compresses or checksums data.

use serde_json::{json, Map, Value};

use crate::dataspace::DimVec;
use crate::util::json_scan::str_member;
use crate::util::{Error, Result};

/// LZF has no library-assigned constant; this is its registered id.
pub const LZF_FILTER_ID: i64 = 32000;

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const fn wire_name(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),*
                }
            }

            pub fn from_wire(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)*
                    other => Err(Error::parse(format!(
                        concat!("invalid ", stringify!($name), " value '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum!(
    /// When storage space is allocated.
    AllocTime {
        Default => "H5D_ALLOC_TIME_DEFAULT",
        Early => "H5D_ALLOC_TIME_EARLY",
        Incremental => "H5D_ALLOC_TIME_INCR",
        Late => "H5D_ALLOC_TIME_LATE",
    }
);

wire_enum!(
    /// When the fill value is written.
    FillTime {
        IfSet => "H5D_FILL_TIME_IFSET",
        Alloc => "H5D_FILL_TIME_ALLOC",
        Never => "H5D_FILL_TIME_NEVER",
    }
);

wire_enum!(
    /// Attribute creation-order tracking.
    CreationOrder {
        Tracked => "H5P_CRT_ORDER_TRACKED",
        Indexed => "H5P_CRT_ORDER_INDEXED",
    }
);

wire_enum!(
    SzipCoding {
        EntropyCoding => "H5_SZIP_EC_OPTION_MASK",
        NearestNeighbor => "H5_SZIP_NN_OPTION_MASK",
    }
);

wire_enum!(
    ScaleType {
        FloatDScale => "H5Z_SO_FLOAT_DSCALE",
        FloatEScale => "H5Z_SO_FLOAT_ESCALE",
        Int => "H5Z_SO_INT",
    }
);

/// Attribute storage thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub max_compact: u32,
    pub min_dense: u32,
}

/// Storage layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Contiguous,
    Compact,
    Chunked { dims: DimVec<u64> },
}

/// A filter in the dataset's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Deflate { level: u32 },
    Shuffle,
    Fletcher32,
    Szip {
        coding: SzipCoding,
        pixels_per_block: u32,
        bits_per_pixel: Option<u32>,
        pixels_per_scanline: Option<u32>,
    },
    Nbit,
    ScaleOffset { scale_type: ScaleType, scale_offset: u32 },
    Lzf,
}

impl Filter {
    pub const fn id(&self) -> i64 {
        match self {
            Filter::Deflate { .. } => 1,
            Filter::Shuffle => 2,
            Filter::Fletcher32 => 3,
            Filter::Szip { .. } => 4,
            Filter::Nbit => 5,
            Filter::ScaleOffset { .. } => 6,
            Filter::Lzf => LZF_FILTER_ID,
        }
    }

    pub const fn class_name(&self) -> &'static str {
        match self {
            Filter::Deflate { .. } => "H5Z_FILTER_DEFLATE",
            Filter::Shuffle => "H5Z_FILTER_SHUFFLE",
            Filter::Fletcher32 => "H5Z_FILTER_FLETCHER32",
            Filter::Szip { .. } => "H5Z_FILTER_SZIP",
            Filter::Nbit => "H5Z_FILTER_NBIT",
            Filter::ScaleOffset { .. } => "H5Z_FILTER_SCALEOFFSET",
            Filter::Lzf => "H5Z_FILTER_LZF",
        }
    }

    /// Decode one filter object; `Ok(None)` for an unrecognized id.
    fn from_json(obj: &Value) -> Result<Option<Self>> {
        let class = str_member(obj, "class")?;
        let id = obj
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::parse(format!("filter '{class}' has no integer 'id'")))?;

        let filter = match id {
            1 => Filter::Deflate { level: u32_member(obj, "level")? },
            2 => Filter::Shuffle,
            3 => Filter::Fletcher32,
            4 => Filter::Szip {
                coding: match SzipCoding::from_wire(str_member(obj, "coding")?) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(class, id, "skipping filter: {}", e);
                        return Ok(None);
                    }
                },
                pixels_per_block: u32_member(obj, "pixelsPerBlock")?,
                bits_per_pixel: opt_u32_member(obj, "bitsPerPixel")?,
                pixels_per_scanline: opt_u32_member(obj, "pixelsPerScanline")?,
            },
            5 => Filter::Nbit,
            6 => Filter::ScaleOffset {
                scale_type: match ScaleType::from_wire(str_member(obj, "scaleType")?) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(class, id, "skipping filter: {}", e);
                        return Ok(None);
                    }
                },
                scale_offset: u32_member(obj, "scaleOffset")?,
            },
            LZF_FILTER_ID => Filter::Lzf,
            _ => {
                tracing::warn!(class, id, "skipping unrecognized filter");
                return Ok(None);
            }
        };
        if filter.class_name() != class {
            tracing::warn!(class, id, expected = filter.class_name(), "filter class does not match its id");
        }
        Ok(Some(filter))
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("class".into(), self.class_name().into());
        obj.insert("id".into(), self.id().into());
        match self {
            Filter::Deflate { level } => {
                obj.insert("level".into(), (*level).into());
            }
            Filter::Szip {
                coding,
                pixels_per_block,
                bits_per_pixel,
                pixels_per_scanline,
            } => {
                if let Some(bpp) = bits_per_pixel {
                    obj.insert("bitsPerPixel".into(), (*bpp).into());
                }
                obj.insert("coding".into(), coding.wire_name().into());
                obj.insert("pixelsPerBlock".into(), (*pixels_per_block).into());
                if let Some(pps) = pixels_per_scanline {
                    obj.insert("pixelsPerScanline".into(), (*pps).into());
                }
            }
            Filter::ScaleOffset { scale_type, scale_offset } => {
                obj.insert("scaleType".into(), scale_type.wire_name().into());
                obj.insert("scaleOffset".into(), (*scale_offset).into());
            }
            Filter::Shuffle | Filter::Fletcher32 | Filter::Nbit | Filter::Lzf => {}
        }
        Value::Object(obj)
    }
}

/// Decoded `"creationProperties"` of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreationProperties {
    pub alloc_time: Option<AllocTime>,
    pub attribute_creation_order: Option<CreationOrder>,
    pub attribute_phase_change: Option<PhaseChange>,
    pub fill_time: Option<FillTime>,
    /// Kept verbatim; its meaning depends on the dataset type
    pub fill_value: Option<Value>,
    pub track_times: Option<bool>,
    pub layout: Option<Layout>,
    pub filters: Vec<Filter>,
}

/// Decode creation properties from a dataset response, or from a bare
/// properties object.
pub fn decode_creation_properties(json: &str) -> Result<CreationProperties> {
    let doc: Value = serde_json::from_str(json)?;
    let props = doc.get("creationProperties").unwrap_or(&doc);
    if !props.is_object() {
        return Err(Error::parse("'creationProperties' is not an object"));
    }

    let mut out = CreationProperties::default();
    if let Some(v) = opt_str_member(props, "allocTime")? {
        out.alloc_time = Some(AllocTime::from_wire(v)?);
    }
    if let Some(v) = opt_str_member(props, "attributeCreationOrder")? {
        out.attribute_creation_order = Some(CreationOrder::from_wire(v)?);
    }
    if let Some(pc) = props.get("attributePhaseChange") {
        out.attribute_phase_change = Some(PhaseChange {
            max_compact: u32_member(pc, "maxCompact")?,
            min_dense: u32_member(pc, "minDense")?,
        });
    }
    if let Some(v) = opt_str_member(props, "fillTime")? {
        out.fill_time = Some(FillTime::from_wire(v)?);
    }
    out.fill_value = props.get("fillValue").filter(|v| !v.is_null()).cloned();
    out.track_times = match props.get("trackTimes") {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) if s == "true" => Some(true),
        Some(Value::String(s)) if s == "false" => Some(false),
        Some(other) => return Err(Error::parse(format!("invalid trackTimes value {other}"))),
    };
    if let Some(layout) = props.get("layout") {
        out.layout = Some(decode_layout(layout)?);
    }
    if let Some(filters) = props.get("filters") {
        let filters = filters
            .as_array()
            .ok_or_else(|| Error::parse("'filters' is not an array"))?;
        for f in filters {
            if let Some(filter) = Filter::from_json(f)? {
                out.filters.push(filter);
            }
        }
    }
    Ok(out)
}

fn decode_layout(layout: &Value) -> Result<Layout> {
    match str_member(layout, "class")? {
        "H5D_CONTIGUOUS" => Ok(Layout::Contiguous),
        "H5D_COMPACT" => Ok(Layout::Compact),
        "H5D_CHUNKED" => {
            let dims = layout
                .get("dims")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::parse("chunked layout has no 'dims' array"))?
                .iter()
                .map(|d| {
                    d.as_u64()
                        .filter(|&d| d > 0)
                        .ok_or_else(|| Error::parse(format!("invalid chunk dimension {d}")))
                })
                .collect::<Result<DimVec<u64>>>()?;
            if dims.is_empty() {
                return Err(Error::parse("chunked layout has zero rank"));
            }
            Ok(Layout::Chunked { dims })
        }
        other => Err(Error::unsupported(format!("layout class {other}"))),
    }
}

/// Encode as the value of a `"creationProperties"` key.
pub fn encode_creation_properties(props: &CreationProperties) -> String {
    let mut obj = Map::new();
    if let Some(v) = props.alloc_time {
        obj.insert("allocTime".into(), v.wire_name().into());
    }
    if let Some(v) = props.attribute_creation_order {
        obj.insert("attributeCreationOrder".into(), v.wire_name().into());
    }
    if let Some(pc) = props.attribute_phase_change {
        obj.insert(
            "attributePhaseChange".into(),
            json!({ "maxCompact": pc.max_compact, "minDense": pc.min_dense }),
        );
    }
    if let Some(v) = props.fill_time {
        obj.insert("fillTime".into(), v.wire_name().into());
    }
    if let Some(v) = &props.fill_value {
        obj.insert("fillValue".into(), v.clone());
    }
    if let Some(v) = props.track_times {
        obj.insert("trackTimes".into(), if v { "true" } else { "false" }.into());
    }
    if let Some(layout) = &props.layout {
        let value = match layout {
            Layout::Contiguous => json!({ "class": "H5D_CONTIGUOUS" }),
            Layout::Compact => json!({ "class": "H5D_COMPACT" }),
            Layout::Chunked { dims } => json!({ "class": "H5D_CHUNKED", "dims": dims.as_slice() }),
        };
        obj.insert("layout".into(), value);
    }
    if !props.filters.is_empty() {
        obj.insert(
            "filters".into(),
            Value::Array(props.filters.iter().map(Filter::to_json).collect()),
        );
    }
    Value::Object(obj).to_string()
}

fn u32_member(value: &Value, key: &str) -> Result<u32> {
    opt_u32_member(value, key)?.ok_or_else(|| Error::parse(format!("missing '{key}' key")))
}

fn opt_u32_member(value: &Value, key: &str) -> Result<Option<u32>> {
    value
        .get(key)
        .map(|v| {
            v.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| Error::parse(format!("'{key}' should be a non-negative integer, got {v}")))
        })
        .transpose()
}

fn opt_str_member<'v>(value: &'v Value, key: &str) -> Result<Option<&'v str>> {
    match value.get(key) {
        None => Ok(None),
        Some(_) => str_member(value, key).map(Some),
    }
}
