//! Utility types and functions shared by the codecs.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`json_scan`] - Depth-aware scanning of raw JSON text
//! - Path splitting and percent-encoding of object paths

mod error;
pub mod json_scan;
mod path;

pub use error::*;
pub use path::*;
