//! # h5rest
//!
//! Translation core between the HDF5 object model and the JSON wire format of
//! an HDF5 REST object store.
//!
//! The crate never performs HTTP itself. Everything that needs the store goes
//! through the [`transport::Transport`] trait, which receives a request and
//! returns the response body.
//!
//! ## Modules
//!
//! - [`util`] - Errors, JSON scanning, path helpers
//! - [`datatype`] - Type descriptors and their JSON codec
//! - [`dataspace`] - Shapes, selections and their JSON / URL forms
//! - [`catalog`] - Link and attribute tables and their traversal
//! - [`resolve`] - Path resolution through hard, soft and external links
//! - [`creation`] - Dataset creation properties
//! - [`reference`] - Object reference buffers
//! - [`config`] - Codec options and persistent settings
//!
//! ## Example
//!
//! ```ignore
//! use h5rest::prelude::*;
//!
//! let ty = decode_type(r#"{"type": {"class": "H5T_INTEGER", "base": "H5T_STD_I32LE"}}"#)?;
//! assert_eq!(ty.size(), Some(4));
//!
//! let resolver = PathResolver::new(&transport);
//! let target = resolver.resolve(&ObjectRef::root(domain), "g1/d1", None)?;
//! ```

pub mod util;
pub mod object;
pub mod transport;
pub mod config;
pub mod datatype;
pub mod dataspace;
pub mod catalog;
pub mod resolve;
pub mod creation;
pub mod reference;

// Re-export commonly used types
pub use util::{Error, Result};
pub use object::{Domain, ObjectKind, ObjectRef};
pub use transport::{Request, Transport, TransportError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::object::{Domain, ObjectKind, ObjectRef};
    pub use crate::transport::{MemoryTransport, Request, Transport, TransportError};
    pub use crate::config::{CodecOptions, ServerVersion, Settings};
    pub use crate::datatype::{decode_type, encode_type, encode_type_with, TypeDescriptor};
    pub use crate::dataspace::{decode_shape, encode_selection, shape_to_json, Dataspace, Selection};
    pub use crate::catalog::{
        build_attribute_table, build_link_table, build_link_table_recursive, traverse_attributes,
        traverse_links, IndexType, IterOrder, VisitControl,
    };
    pub use crate::resolve::{PathResolver, ResolvedTarget};
}
