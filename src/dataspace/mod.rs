//! Dataspace and selection descriptors and their wire forms.
//!
//! - [`Dataspace`] - Null, scalar or simple (dims + maxdims) extent
//! - [`Selection`] - All, none, points or a regular hyperslab
//! - [`shape_to_json`] / [`decode_shape`] - Shape request fragments and responses
//! - [`encode_selection`] - Selection as a URL parameter or JSON body fragment

mod selection;
mod shape;

pub use selection::*;
pub use shape::*;

use std::fmt;

use smallvec::SmallVec;

use crate::util::{Error, Result};

/// Per-dimension list, inline up to rank 4.
pub type DimVec<T> = SmallVec<[T; 4]>;

/// Maximum size of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxDim {
    Finite(u64),
    Unlimited,
}

impl MaxDim {
    /// Wire value; unlimited is the 0 sentinel.
    pub const fn wire_value(self) -> u64 {
        match self {
            MaxDim::Finite(n) => n,
            MaxDim::Unlimited => 0,
        }
    }

    pub const fn from_wire(n: u64) -> Self {
        if n == 0 {
            MaxDim::Unlimited
        } else {
            MaxDim::Finite(n)
        }
    }
}

impl fmt::Display for MaxDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxDim::Finite(n) => write!(f, "{n}"),
            MaxDim::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Current and maximum sizes of a simple dataspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleExtent {
    dims: DimVec<u64>,
    maxdims: DimVec<MaxDim>,
}

impl SimpleExtent {
    pub fn new(dims: impl Into<DimVec<u64>>, maxdims: impl Into<DimVec<MaxDim>>) -> Result<Self> {
        let dims = dims.into();
        let maxdims = maxdims.into();
        if dims.is_empty() {
            return Err(Error::invalid("simple dataspace must have rank >= 1"));
        }
        if dims.len() != maxdims.len() {
            return Err(Error::invalid(format!(
                "dataspace rank mismatch: {} dims, {} maxdims",
                dims.len(),
                maxdims.len()
            )));
        }
        for (i, (d, m)) in dims.iter().zip(&maxdims).enumerate() {
            if let MaxDim::Finite(m) = m {
                if m < d {
                    return Err(Error::invalid(format!("maxdims[{i}] = {m} is smaller than dims[{i}] = {d}")));
                }
            }
        }
        if dims.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d)).is_none() {
            return Err(Error::invalid(format!("dataspace dims {dims:?} overflow the element count")));
        }
        Ok(Self { dims, maxdims })
    }

    /// Extent whose maximum equals its current size.
    pub fn fixed(dims: impl Into<DimVec<u64>>) -> Result<Self> {
        let dims = dims.into();
        let maxdims: DimVec<MaxDim> = dims.iter().map(|&d| MaxDim::Finite(d)).collect();
        Self::new(dims, maxdims)
    }

    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    pub fn maxdims(&self) -> &[MaxDim] {
        &self.maxdims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Element count; `new` guarantees it fits.
    pub fn num_elements(&self) -> u64 {
        self.dims.iter().product()
    }

    pub fn has_unlimited(&self) -> bool {
        self.maxdims.contains(&MaxDim::Unlimited)
    }

    /// True when any maximum differs from the current size.
    pub fn is_extendible(&self) -> bool {
        self.dims
            .iter()
            .zip(&self.maxdims)
            .any(|(&d, &m)| m != MaxDim::Finite(d))
    }
}

/// Shape of a dataset or attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dataspace {
    Null,
    Scalar,
    Simple(SimpleExtent),
}

impl Dataspace {
    /// Simple dataspace with fixed extent.
    pub fn simple(dims: impl Into<DimVec<u64>>) -> Result<Self> {
        SimpleExtent::fixed(dims).map(Dataspace::Simple)
    }

    pub fn rank(&self) -> usize {
        match self {
            Dataspace::Null | Dataspace::Scalar => 0,
            Dataspace::Simple(e) => e.rank(),
        }
    }

    pub fn num_elements(&self) -> u64 {
        match self {
            Dataspace::Null => 0,
            Dataspace::Scalar => 1,
            Dataspace::Simple(e) => e.num_elements(),
        }
    }

    /// Wire class name.
    pub fn class_name(&self) -> &'static str {
        match self {
            Dataspace::Null => "H5S_NULL",
            Dataspace::Scalar => "H5S_SCALAR",
            Dataspace::Simple(_) => "H5S_SIMPLE",
        }
    }
}

impl fmt::Display for Dataspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataspace::Null => write!(f, "null"),
            Dataspace::Scalar => write!(f, "scalar"),
            Dataspace::Simple(e) => {
                write!(f, "(")?;
                for (i, (d, m)) in e.dims().iter().zip(e.maxdims()).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{d}")?;
                    if *m != MaxDim::Finite(*d) {
                        write!(f, "/{m}")?;
                    }
                }
                write!(f, ")")
            }
        }
    }
}
