//! Predefined numeric type names of the wire protocol.

use super::{ByteOrder, TypeDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeric {
    Signed,
    Unsigned,
    Float,
}

struct Predefined {
    name: &'static str,
    numeric: Numeric,
    bits: u32,
    order: ByteOrder,
}

macro_rules! predefined {
    ($($name:literal => $numeric:ident, $bits:literal, $order:ident;)*) => {
        &[$(Predefined {
            name: $name,
            numeric: Numeric::$numeric,
            bits: $bits,
            order: ByteOrder::$order,
        },)*]
    };
}

const PREDEFINED: &[Predefined] = predefined! {
    "H5T_STD_I8LE" => Signed, 8, Little;
    "H5T_STD_I8BE" => Signed, 8, Big;
    "H5T_STD_I16LE" => Signed, 16, Little;
    "H5T_STD_I16BE" => Signed, 16, Big;
    "H5T_STD_I32LE" => Signed, 32, Little;
    "H5T_STD_I32BE" => Signed, 32, Big;
    "H5T_STD_I64LE" => Signed, 64, Little;
    "H5T_STD_I64BE" => Signed, 64, Big;
    "H5T_STD_U8LE" => Unsigned, 8, Little;
    "H5T_STD_U8BE" => Unsigned, 8, Big;
    "H5T_STD_U16LE" => Unsigned, 16, Little;
    "H5T_STD_U16BE" => Unsigned, 16, Big;
    "H5T_STD_U32LE" => Unsigned, 32, Little;
    "H5T_STD_U32BE" => Unsigned, 32, Big;
    "H5T_STD_U64LE" => Unsigned, 64, Little;
    "H5T_STD_U64BE" => Unsigned, 64, Big;
    "H5T_IEEE_F32LE" => Float, 32, Little;
    "H5T_IEEE_F32BE" => Float, 32, Big;
    "H5T_IEEE_F64LE" => Float, 64, Little;
    "H5T_IEEE_F64BE" => Float, 64, Big;
};

impl Predefined {
    fn matches(&self, t: &TypeDescriptor) -> bool {
        match *t {
            TypeDescriptor::Integer { bits, signed, order } => {
                let numeric = if signed { Numeric::Signed } else { Numeric::Unsigned };
                self.numeric == numeric && self.bits == bits && self.order == order
            }
            TypeDescriptor::Float { bits, order } => {
                self.numeric == Numeric::Float && self.bits == bits && self.order == order
            }
            _ => false,
        }
    }

    fn descriptor(&self) -> TypeDescriptor {
        match self.numeric {
            Numeric::Signed => TypeDescriptor::int(self.bits, true, self.order),
            Numeric::Unsigned => TypeDescriptor::int(self.bits, false, self.order),
            Numeric::Float => TypeDescriptor::float(self.bits, self.order),
        }
    }
}

/// Wire name of a predefined integer or float type.
///
/// `None` when the width/order combination has no predefined name.
pub fn predefined_name(t: &TypeDescriptor) -> Option<&'static str> {
    PREDEFINED.iter().find(|p| p.matches(t)).map(|p| p.name)
}

/// Descriptor for a predefined integer or float name.
pub fn parse_predefined(name: &str) -> Option<TypeDescriptor> {
    PREDEFINED.iter().find(|p| p.name == name).map(Predefined::descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_round_trips() {
        for p in PREDEFINED {
            let t = parse_predefined(p.name).unwrap();
            assert_eq!(predefined_name(&t), Some(p.name));
        }
    }

    #[test]
    fn test_known_names() {
        assert_eq!(
            predefined_name(&TypeDescriptor::int(16, false, ByteOrder::Big)),
            Some("H5T_STD_U16BE")
        );
        assert_eq!(
            parse_predefined("H5T_IEEE_F32LE"),
            Some(TypeDescriptor::float(32, ByteOrder::Little))
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(predefined_name(&TypeDescriptor::int(24, true, ByteOrder::Little)), None);
        assert_eq!(predefined_name(&TypeDescriptor::float(16, ByteOrder::Little)), None);
        assert_eq!(parse_predefined("H5T_NATIVE_INT"), None);
    }
}
