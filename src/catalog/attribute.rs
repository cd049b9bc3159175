//! Attribute tables.

use serde_json::Value;

use super::{CatalogEntry, IndexType, Table};
use crate::dataspace::{decode_shape, Dataspace};
use crate::datatype::{decode_section, TypeDescriptor};
use crate::util::json_scan::{array_elements, f64_member, find_member, require_member, root_object, str_member};
use crate::util::{Error, Result};

/// Summary of an attribute, filled from whatever the listing includes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeInfo {
    pub datatype: Option<TypeDescriptor>,
    pub dataspace: Option<Dataspace>,
}

impl AttributeInfo {
    /// Bytes needed for the attribute's value, when type and shape are known.
    pub fn data_size(&self) -> Option<u64> {
        let elem = self.datatype.as_ref()?.size()? as u64;
        elem.checked_mul(self.dataspace.as_ref()?.num_elements())
    }
}

/// One entry of an attribute listing.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    pub name: String,
    pub created: f64,
    pub info: AttributeInfo,
}

impl CatalogEntry for AttributeEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn created(&self) -> f64 {
        self.created
    }
}

pub type AttributeTable = Table<AttributeEntry>;

/// Build a table from a `{"attributes": [...]}` response.
pub fn build_attribute_table(json: &str, index: IndexType) -> Result<AttributeTable> {
    let doc: Value = serde_json::from_str(json)?;
    let attrs = doc
        .get("attributes")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::parse("response has no 'attributes' array"))?;
    let spans = array_elements(json, require_member(json, root_object(json)?, "attributes")?)?;
    if spans.len() != attrs.len() {
        return Err(Error::parse("'attributes' array could not be scanned"));
    }

    let mut entries = Vec::with_capacity(attrs.len());
    for (attr, span) in attrs.iter().zip(spans) {
        let name = str_member(attr, "name")?.to_string();
        let created = f64_member(attr, "created")?;

        let datatype = match find_member(json, span.clone(), "type")? {
            Some(type_span) => match decode_section(json, type_span, 0) {
                Ok(t) => Some(t),
                Err(Error::Unsupported(msg)) => {
                    tracing::warn!(attribute = %name, "type summary skipped: {}", msg);
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };
        let dataspace = if attr.get("shape").is_some() {
            Some(decode_shape(&json[span])?)
        } else {
            None
        };

        entries.push(AttributeEntry {
            name,
            created,
            info: AttributeInfo { datatype, dataspace },
        });
    }

    let mut table = Table::new(entries);
    table.sort_by_index(index);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::ByteOrder;

    #[test]
    fn test_listing_with_summaries() {
        let json = r#"{"attributes": [
            {"name": "units", "created": 5.5,
             "type": {"class": "H5T_STRING", "charSet": "H5T_CSET_ASCII", "strPad": "H5T_STR_NULLPAD", "length": 8},
             "shape": {"class": "H5S_SCALAR"}},
            {"name": "scale", "created": 1.25,
             "type": {"class": "H5T_FLOAT", "base": "H5T_IEEE_F32BE"},
             "shape": {"class": "H5S_SIMPLE", "dims": [3]}},
            {"name": "bare", "created": 9}
        ]}"#;
        let table = build_attribute_table(json, IndexType::Name).unwrap();
        assert_eq!(table.len(), 3);

        let units = table.find("units").unwrap();
        assert_eq!(units.info.dataspace, Some(Dataspace::Scalar));
        assert_eq!(units.info.data_size(), Some(8));

        let scale = table.find("scale").unwrap();
        assert_eq!(scale.info.datatype, Some(TypeDescriptor::float(32, ByteOrder::Big)));
        assert_eq!(scale.info.data_size(), Some(12));

        assert_eq!(table.find("bare").unwrap().info, AttributeInfo::default());
    }

    #[test]
    fn test_creation_order() {
        let json = r#"{"attributes": [
            {"name": "a", "created": 30}, {"name": "b", "created": 10}, {"name": "c", "created": 20}
        ]}"#;
        let table = build_attribute_table(json, IndexType::CreationOrder).unwrap();
        let names: Vec<&str> = table.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_unsupported_summary_left_empty() {
        let json = r#"{"attributes": [
            {"name": "count", "created": 1,
             "type": {"class": "H5T_INTEGER", "base": "H5T_STD_I32LE"},
             "shape": {"class": "H5S_SIMPLE", "dims": [2]}},
            {"name": "ragged", "created": 2,
             "type": {"class": "H5T_VLEN", "base": {"class": "H5T_INTEGER", "base": "H5T_STD_I32LE"}},
             "shape": {"class": "H5S_SIMPLE", "dims": [4]}}
        ]}"#;
        let table = build_attribute_table(json, IndexType::Name).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.find("count").unwrap().info.data_size(), Some(8));

        let ragged = table.find("ragged").unwrap();
        assert_eq!(ragged.info.datatype, None);
        assert_eq!(ragged.info.dataspace, Some(Dataspace::simple(vec![4u64]).unwrap()));
        assert_eq!(ragged.info.data_size(), None);
    }

    #[test]
    fn test_data_size_overflow_is_none() {
        let info = AttributeInfo {
            datatype: Some(TypeDescriptor::int(64, true, ByteOrder::Little)),
            dataspace: Some(Dataspace::simple(vec![1u64 << 62]).unwrap()),
        };
        assert_eq!(info.data_size(), None);
    }

    #[test]
    fn test_bad_summary_fails() {
        let json = r#"{"attributes": [{"name": "x", "created": 1, "type": {"class": "H5T_NOPE"}}]}"#;
        assert!(build_attribute_table(json, IndexType::Name).is_err());
        assert!(build_attribute_table(r#"{"attributes": [{"created": 1}]}"#, IndexType::Name).is_err());
    }
}
