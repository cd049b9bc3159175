//! Link tables.

use std::collections::HashSet;

use serde_json::Value;

use super::{CatalogEntry, IndexType, Table};
use crate::object::ObjectKind;
use crate::transport::{Request, Transport};
use crate::util::json_scan::{array_elements, f64_member, require_member, root_object, str_member};
use crate::util::{encode_component, Error, Result};

/// What a link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    Hard { target_uri: String, collection: ObjectKind },
    Soft { path: String },
    External { domain: String, path: String },
    UserDefined,
}

impl LinkClass {
    /// Decode from a link entry or a single-link response (`{"link": {...}}`).
    pub fn from_json(entry: &Value) -> Result<Self> {
        let link = entry.get("link").filter(|l| l.is_object()).unwrap_or(entry);
        match str_member(link, "class")? {
            "H5L_TYPE_HARD" => Ok(LinkClass::Hard {
                target_uri: str_member(link, "id")?.to_string(),
                collection: ObjectKind::from_collection(str_member(link, "collection")?)?,
            }),
            "H5L_TYPE_SOFT" => Ok(LinkClass::Soft {
                path: str_member(link, "h5path")?.to_string(),
            }),
            "H5L_TYPE_EXTERNAL" => Ok(LinkClass::External {
                domain: str_member(link, "h5domain")?.to_string(),
                path: str_member(link, "h5path")?.to_string(),
            }),
            "H5L_TYPE_UD" | "H5L_TYPE_USER_DEFINED" => Ok(LinkClass::UserDefined),
            other => Err(Error::parse(format!("unknown link class '{other}'"))),
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            LinkClass::Hard { .. } => "H5L_TYPE_HARD",
            LinkClass::Soft { .. } => "H5L_TYPE_SOFT",
            LinkClass::External { .. } => "H5L_TYPE_EXTERNAL",
            LinkClass::UserDefined => "H5L_TYPE_UD",
        }
    }

    /// Size of the link value as reported by link info queries.
    pub fn value_size(&self) -> usize {
        match self {
            LinkClass::Soft { path } => path.len() + 1,
            LinkClass::External { domain, path } => 1 + domain.len() + 1 + path.len() + 1,
            LinkClass::Hard { .. } | LinkClass::UserDefined => 0,
        }
    }

    /// Packed link value: the NUL-terminated path of a soft link, or the
    /// external-link encoding. `None` for hard and user-defined links.
    pub fn packed_value(&self) -> Option<Vec<u8>> {
        match self {
            LinkClass::Soft { path } => {
                let mut buf = Vec::with_capacity(path.len() + 1);
                buf.extend_from_slice(path.as_bytes());
                buf.push(0);
                Some(buf)
            }
            LinkClass::External { domain, path } => Some(pack_external_link_value(domain, path)),
            LinkClass::Hard { .. } | LinkClass::UserDefined => None,
        }
    }
}

/// Flag byte followed by the NUL-terminated domain and path.
pub fn pack_external_link_value(domain: &str, path: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(domain.len() + path.len() + 3);
    buf.push(0);
    buf.extend_from_slice(domain.as_bytes());
    buf.push(0);
    buf.extend_from_slice(path.as_bytes());
    buf.push(0);
    buf
}

/// Split a packed external-link value into `(domain, path)`.
pub fn unpack_external_link_value(buf: &[u8]) -> Result<(String, String)> {
    let (&flags, rest) = buf
        .split_first()
        .ok_or_else(|| Error::parse("empty external link value"))?;
    if flags != 0 {
        return Err(Error::unsupported(format!("external link flags {flags:#04x}")));
    }
    let mut parts = rest.split(|&b| b == 0);
    let mut next = |what: &str| -> Result<String> {
        let bytes = parts
            .next()
            .ok_or_else(|| Error::parse(format!("external link value has no {what}")))?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::parse(format!("external link {what} is not UTF-8")))
    };
    let domain = next("domain")?;
    let path = next("path")?;
    if rest.iter().filter(|&&b| b == 0).count() != 2 || rest.last() != Some(&0) {
        return Err(Error::parse("external link value is not two NUL-terminated strings"));
    }
    Ok((domain, path))
}

/// One entry of a group's link listing.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEntry {
    pub name: String,
    /// Creation timestamp in seconds
    pub created: f64,
    pub class: LinkClass,
    /// Links of the target group, filled by recursive builds only
    pub subtree: Option<LinkTable>,
}

impl CatalogEntry for LinkEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn created(&self) -> f64 {
        self.created
    }

    fn subtree(&self) -> Option<&LinkTable> {
        self.subtree.as_ref()
    }
}

pub type LinkTable = Table<LinkEntry>;

/// Build a flat table from a `{"links": [...]}` response.
pub fn build_link_table(json: &str, index: IndexType) -> Result<LinkTable> {
    build_table::<dyn Transport>(json, index, None, 0)
}

/// Build a table and the subtree of every hard-linked subgroup.
///
/// `group_uri` is the group the listing belongs to. Each subgroup's listing
/// is fetched once; a link back to a group already on the visited set keeps
/// `subtree = None`.
pub fn build_link_table_recursive<T: Transport + ?Sized>(
    json: &str,
    index: IndexType,
    transport: &T,
    domain: &str,
    group_uri: &str,
) -> Result<LinkTable> {
    let mut walk = Walk {
        transport,
        domain,
        visited: HashSet::from([group_uri.to_string()]),
    };
    build_table(json, index, Some(&mut walk), 0)
}

/// State of one recursive build.
struct Walk<'a, T: ?Sized> {
    transport: &'a T,
    domain: &'a str,
    visited: HashSet<String>,
}

impl<T: Transport + ?Sized> Walk<'_, T> {
    fn fetch_listing(&self, group_uri: &str) -> Result<String> {
        let request = Request::new(format!("/groups/{}/links", encode_component(group_uri)), self.domain);
        Ok(self.transport.fetch(&request)?)
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(depth = depth))]
fn build_table<T: Transport + ?Sized>(
    json: &str,
    index: IndexType,
    mut walk: Option<&mut Walk<'_, T>>,
    depth: usize,
) -> Result<LinkTable> {
    let doc: Value = serde_json::from_str(json)?;
    let links = doc
        .get("links")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::parse("response has no 'links' array"))?;
    let spans = array_elements(json, require_member(json, root_object(json)?, "links")?)?;
    if spans.len() != links.len() {
        return Err(Error::parse("'links' array could not be scanned"));
    }

    let mut entries = Vec::with_capacity(links.len());
    for (link, span) in links.iter().zip(spans) {
        let name = str_member(link, "title")?.to_string();
        let created = f64_member(link, "created")?;
        let entry_value: Value = serde_json::from_str(&json[span])?;
        let class = LinkClass::from_json(&entry_value)
            .map_err(|e| Error::parse(format!("link '{name}': {e}")))?;

        let mut subtree = None;
        if let (
            Some(walk),
            LinkClass::Hard {
                target_uri,
                collection: ObjectKind::Group,
            },
        ) = (walk.as_deref_mut(), &class)
        {
            if walk.visited.insert(target_uri.clone()) {
                let listing = walk.fetch_listing(target_uri)?;
                subtree = Some(build_table(&listing, index, Some(walk), depth + 1)?);
            } else {
                tracing::debug!(link = %name, target = %target_uri, "cycle suppressed");
            }
        }

        entries.push(LinkEntry {
            name,
            created,
            class,
            subtree,
        });
    }

    let mut table = Table::new(entries);
    table.sort_by_index(index);
    Ok(table)
}
