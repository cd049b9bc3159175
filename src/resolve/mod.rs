//! Path resolution.
//!
//! - [`PathResolver`] - Walks a path one link at a time through a transport
//! - [`ResolvedTarget`] - Kind, URI and domain of the object a path names

mod resolver;

pub use resolver::*;
