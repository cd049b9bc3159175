//! Object kinds and the store's collection naming.

use std::fmt;
use std::sync::Arc;

use crate::util::{Error, Result};

/// Category of an addressable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Group,
    Dataset,
    Datatype,
}

/// `(kind, collection, uri prefix character)`, indexed by discriminant.
const COLLECTIONS: [(ObjectKind, &str, char); 3] = [
    (ObjectKind::Group, "groups", 'g'),
    (ObjectKind::Dataset, "datasets", 'd'),
    (ObjectKind::Datatype, "datatypes", 't'),
];

impl ObjectKind {
    /// Collection name used in URLs and link metadata.
    pub fn collection(self) -> &'static str {
        COLLECTIONS[self as usize].1
    }

    /// Parse a collection name (`groups`, `datasets`, `datatypes`).
    pub fn from_collection(name: &str) -> Result<Self> {
        COLLECTIONS
            .iter()
            .find(|(_, c, _)| *c == name)
            .map(|(k, _, _)| *k)
            .ok_or_else(|| Error::parse(format!("unknown collection '{name}'")))
    }

    /// Infer the kind from a URI's leading character (`g-`, `d-`, `t-`).
    pub fn from_uri(uri: &str) -> Option<Self> {
        let first = uri.chars().next()?;
        COLLECTIONS
            .iter()
            .find(|(_, _, p)| *p == first)
            .map(|(k, _, _)| *k)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Group => "group",
            ObjectKind::Dataset => "dataset",
            ObjectKind::Datatype => "datatype",
        };
        f.write_str(name)
    }
}

/// A file on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    /// Domain path, e.g. `/home/user/data.h5`
    pub path: String,
    /// URI of the root group
    pub root_uri: String,
}

impl Domain {
    pub fn new(path: impl Into<String>, root_uri: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root_uri: root_uri.into(),
        }
    }
}

/// An open object used as the starting point of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub uri: String,
    pub domain: Arc<Domain>,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, uri: impl Into<String>, domain: Arc<Domain>) -> Self {
        Self {
            kind,
            uri: uri.into(),
            domain,
        }
    }

    /// Root group of `domain`.
    pub fn root(domain: Arc<Domain>) -> Self {
        let uri = domain.root_uri.clone();
        Self::new(ObjectKind::Group, uri, domain)
    }
}
