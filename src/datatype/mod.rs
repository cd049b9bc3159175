//! Datatype descriptors and their JSON codec.
//!
//! - [`TypeDescriptor`] - In-memory description of an HDF5 datatype
//! - [`encode_type`] / [`decode_type`] - Conversion to and from the store's JSON
//! - [`predefined_name`] / [`parse_predefined`] - Predefined numeric type names

mod decode;
mod encode;
mod predefined;

pub use decode::*;
pub use encode::*;
pub use predefined::*;

use std::collections::HashSet;
use std::fmt;

use smallvec::SmallVec;

use crate::util::{Error, Result};

/// Byte order of a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Character set of a string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharSet {
    #[default]
    Ascii,
    Utf8,
}

impl CharSet {
    pub const fn wire_name(self) -> &'static str {
        match self {
            CharSet::Ascii => "H5T_CSET_ASCII",
            CharSet::Utf8 => "H5T_CSET_UTF8",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "H5T_CSET_ASCII" => Some(CharSet::Ascii),
            "H5T_CSET_UTF8" => Some(CharSet::Utf8),
            _ => None,
        }
    }
}

/// Kind of reference stored by a reference type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Object,
    Region,
}

impl ReferenceKind {
    pub const fn wire_name(self) -> &'static str {
        match self {
            ReferenceKind::Object => "H5T_STD_REF_OBJ",
            ReferenceKind::Region => "H5T_STD_REF_DSETREG",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "H5T_STD_REF_OBJ" => Some(ReferenceKind::Object),
            "H5T_STD_REF_DSETREG" => Some(ReferenceKind::Region),
            _ => None,
        }
    }

    /// In-memory size of one reference.
    pub const fn size(self) -> usize {
        match self {
            ReferenceKind::Object => 8,
            ReferenceKind::Region => 12,
        }
    }
}

/// Description of a datatype.
///
/// The `Bitfield`, `Opaque`, `VarLen` and `Time` classes exist in the object
/// model but have no wire form; encoding them fails.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Integer { bits: u32, signed: bool, order: ByteOrder },
    Float { bits: u32, order: ByteOrder },
    FixedString { length: usize, charset: CharSet },
    VariableString { charset: CharSet },
    Compound(CompoundType),
    Array(ArrayType),
    Enum(EnumType),
    Reference(ReferenceKind),
    /// A committed (named) datatype, addressed by its URI
    Committed { uri: String },
    Bitfield { bits: u32, order: ByteOrder },
    Opaque { size: usize, tag: String },
    VarLen(Box<TypeDescriptor>),
    Time { bits: u32, order: ByteOrder },
}

impl TypeDescriptor {
    pub const fn int(bits: u32, signed: bool, order: ByteOrder) -> Self {
        TypeDescriptor::Integer { bits, signed, order }
    }

    pub const fn float(bits: u32, order: ByteOrder) -> Self {
        TypeDescriptor::Float { bits, order }
    }

    /// Wire class name (`H5T_INTEGER`, `H5T_COMPOUND`, ...).
    pub fn class_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Integer { .. } => "H5T_INTEGER",
            TypeDescriptor::Float { .. } => "H5T_FLOAT",
            TypeDescriptor::FixedString { .. } | TypeDescriptor::VariableString { .. } => "H5T_STRING",
            TypeDescriptor::Compound(_) => "H5T_COMPOUND",
            TypeDescriptor::Array(_) => "H5T_ARRAY",
            TypeDescriptor::Enum(_) => "H5T_ENUM",
            TypeDescriptor::Reference(_) => "H5T_REFERENCE",
            TypeDescriptor::Committed { .. } => "H5T_COMMITTED",
            TypeDescriptor::Bitfield { .. } => "H5T_BITFIELD",
            TypeDescriptor::Opaque { .. } => "H5T_OPAQUE",
            TypeDescriptor::VarLen(_) => "H5T_VLEN",
            TypeDescriptor::Time { .. } => "H5T_TIME",
        }
    }

    /// Size in bytes of one element, `None` for a committed type (its size lives on the server).
    pub fn size(&self) -> Option<usize> {
        match self {
            TypeDescriptor::Integer { bits, .. }
            | TypeDescriptor::Float { bits, .. }
            | TypeDescriptor::Bitfield { bits, .. }
            | TypeDescriptor::Time { bits, .. } => Some(*bits as usize / 8),
            TypeDescriptor::FixedString { length, .. } => Some(*length),
            // pointer-sized handle in memory
            TypeDescriptor::VariableString { .. } => Some(8),
            TypeDescriptor::Compound(c) => Some(c.size()),
            TypeDescriptor::Array(a) => a.size(),
            TypeDescriptor::Enum(e) => e.base().size(),
            TypeDescriptor::Reference(kind) => Some(kind.size()),
            TypeDescriptor::Committed { .. } => None,
            TypeDescriptor::Opaque { size, .. } => Some(*size),
            TypeDescriptor::VarLen(_) => Some(16),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, TypeDescriptor::Committed { .. })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = |o: &ByteOrder| if *o == ByteOrder::Little { "le" } else { "be" };
        match self {
            TypeDescriptor::Integer { bits, signed, order: o } => {
                write!(f, "{}{}{}", if *signed { "i" } else { "u" }, bits, order(o))
            }
            TypeDescriptor::Float { bits, order: o } => write!(f, "f{}{}", bits, order(o)),
            TypeDescriptor::FixedString { length, charset } => write!(f, "string[{length}, {charset:?}]"),
            TypeDescriptor::VariableString { charset } => write!(f, "vstring[{charset:?}]"),
            TypeDescriptor::Compound(c) => {
                write!(f, "compound{{")?;
                for (i, field) in c.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {} @{}", field.name, field.datatype, field.offset)?;
                }
                write!(f, "}}")
            }
            TypeDescriptor::Array(a) => write!(f, "{}{:?}", a.base(), a.dims()),
            TypeDescriptor::Enum(e) => write!(f, "enum<{}>({} members)", e.base(), e.members().len()),
            TypeDescriptor::Reference(kind) => write!(f, "ref<{kind:?}>"),
            TypeDescriptor::Committed { uri } => write!(f, "committed({uri})"),
            other => write!(f, "{}", other.class_name()),
        }
    }
}

/// One member of a compound type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundField {
    pub name: String,
    pub datatype: TypeDescriptor,
    /// Byte offset inside the compound element
    pub offset: usize,
}

/// A packed compound type: members laid out in order with no padding.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundType {
    fields: Vec<CompoundField>,
    size: usize,
}

impl CompoundType {
    /// Lay out `members` back to back.
    pub fn packed<I, S>(members: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0usize;
        for (name, datatype) in members {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(Error::invalid(format!("duplicate compound member '{name}'")));
            }
            let size = datatype.size().ok_or_else(|| {
                Error::unsupported(format!("compound member '{name}' has a committed type of unknown size"))
            })?;
            let next = offset
                .checked_add(size)
                .ok_or_else(|| Error::invalid(format!("compound member '{name}' overflows the type size")))?;
            fields.push(CompoundField { name, datatype, offset });
            offset = next;
        }
        if fields.is_empty() {
            return Err(Error::invalid("compound type has no members"));
        }
        Ok(Self { fields, size: offset })
    }

    pub fn fields(&self) -> &[CompoundField] {
        &self.fields
    }

    /// Total size, the sum of the member sizes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Fixed-size array of a base type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    base: Box<TypeDescriptor>,
    dims: SmallVec<[u64; 4]>,
}

impl ArrayType {
    pub fn new(base: TypeDescriptor, dims: impl Into<SmallVec<[u64; 4]>>) -> Result<Self> {
        let dims = dims.into();
        if dims.is_empty() {
            return Err(Error::invalid("array type must have rank >= 1"));
        }
        if dims.contains(&0) {
            return Err(Error::invalid("array type dimensions must be non-zero"));
        }
        let count = dims
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| Error::invalid(format!("array dimensions {dims:?} overflow the element count")))?;
        if let Some(elem) = base.size() {
            usize::try_from(count)
                .ok()
                .and_then(|n| n.checked_mul(elem))
                .ok_or_else(|| Error::invalid(format!("array of {count} x {elem} bytes is too large")))?;
        }
        Ok(Self { base: Box::new(base), dims })
    }

    pub fn base(&self) -> &TypeDescriptor {
        &self.base
    }

    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Element count; `new` guarantees it fits.
    pub fn num_elements(&self) -> u64 {
        self.dims.iter().product()
    }

    pub fn size(&self) -> Option<usize> {
        let n = usize::try_from(self.num_elements()).ok()?;
        self.base.size()?.checked_mul(n)
    }
}

/// Enumeration over an integer base type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    base: Box<TypeDescriptor>,
    members: Vec<(String, i128)>,
}

impl EnumType {
    /// Build an enum; names must be unique and every value must fit the base integer type.
    pub fn new<I, S>(base: TypeDescriptor, members: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i128)>,
        S: Into<String>,
    {
        let (min, max) = integer_range(&base)
            .ok_or_else(|| Error::invalid(format!("enum base must be an integer, got {}", base.class_name())))?;
        let members: Vec<(String, i128)> = members.into_iter().map(|(n, v)| (n.into(), v)).collect();
        let mut seen = HashSet::new();
        for (name, value) in &members {
            if !seen.insert(name.as_str()) {
                return Err(Error::invalid(format!("duplicate enum member '{name}'")));
            }
            if *value < min || *value > max {
                return Err(Error::invalid(format!(
                    "enum value {value} of '{name}' does not fit {base}"
                )));
            }
        }
        Ok(Self { base: Box::new(base), members })
    }

    pub fn base(&self) -> &TypeDescriptor {
        &self.base
    }

    pub fn members(&self) -> &[(String, i128)] {
        &self.members
    }

    pub fn value_of(&self, name: &str) -> Option<i128> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

/// Inclusive value range of an integer type.
fn integer_range(t: &TypeDescriptor) -> Option<(i128, i128)> {
    match *t {
        TypeDescriptor::Integer { bits, signed, .. } if (1..=64).contains(&bits) => Some(if signed {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const I32: TypeDescriptor = TypeDescriptor::int(32, true, ByteOrder::Little);
    const F64: TypeDescriptor = TypeDescriptor::float(64, ByteOrder::Little);

    #[test]
    fn test_compound_layout() {
        let c = CompoundType::packed([("x", I32), ("y", F64)]).unwrap();
        let offsets: Vec<usize> = c.fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 4]);
        assert_eq!(c.size(), 12);
    }

    #[test]
    fn test_compound_rejects_bad_members() {
        assert!(CompoundType::packed(Vec::<(String, TypeDescriptor)>::new()).is_err());
        assert!(CompoundType::packed([("a", I32), ("a", F64)]).is_err());
        let committed = TypeDescriptor::Committed { uri: "t-1".into() };
        assert!(matches!(
            CompoundType::packed([("a", committed)]),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_array_rank_and_size() {
        assert!(ArrayType::new(I32, SmallVec::<[u64; 4]>::new()).is_err());
        let a = ArrayType::new(I32, SmallVec::from_slice(&[2, 3])).unwrap();
        assert_eq!(a.size(), Some(24));
        assert_eq!(a.num_elements(), 6);
    }

    #[test]
    fn test_array_overflow_rejected() {
        let huge = SmallVec::from_slice(&[1u64 << 32, 1 << 32, 16]);
        assert!(matches!(ArrayType::new(I32, huge), Err(Error::InvalidArgument(_))));
        let bytes = SmallVec::from_slice(&[u64::MAX / 2]);
        assert!(ArrayType::new(I32, bytes).is_err());

        let big = ArrayType::new(F64, SmallVec::from_slice(&[1u64 << 30, 1 << 30])).unwrap();
        let member = TypeDescriptor::Array(big);
        assert!(matches!(
            CompoundType::packed([("a", member.clone()), ("b", member.clone()), ("c", member.clone()), ("d", member)]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_enum_duplicate_names() {
        let u8le = TypeDescriptor::int(8, false, ByteOrder::Little);
        assert!(matches!(
            EnumType::new(u8le.clone(), [("A", 0), ("A", 1)]),
            Err(Error::InvalidArgument(_))
        ));
        // shared values are fine
        assert!(EnumType::new(u8le, [("A", 0), ("B", 0)]).is_ok());
    }

    #[test]
    fn test_enum_range() {
        let u8le = TypeDescriptor::int(8, false, ByteOrder::Little);
        assert!(EnumType::new(u8le.clone(), [("A", 0), ("B", 255)]).is_ok());
        assert!(EnumType::new(u8le, [("C", 256)]).is_err());
        let i8le = TypeDescriptor::int(8, true, ByteOrder::Little);
        assert!(EnumType::new(i8le.clone(), [("N", -128)]).is_ok());
        assert!(EnumType::new(i8le, [("N", -129)]).is_err());
        assert!(EnumType::new(F64, [("X", 1)]).is_err());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(TypeDescriptor::VariableString { charset: CharSet::Utf8 }.size(), Some(8));
        assert_eq!(TypeDescriptor::Reference(ReferenceKind::Region).size(), Some(12));
        assert_eq!(TypeDescriptor::Committed { uri: "t-1".into() }.size(), None);
        assert_eq!(I32.to_string(), "i32le");
    }
}
