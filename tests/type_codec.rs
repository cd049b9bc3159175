//! Integration tests for the datatype JSON codec.

use h5rest::config::{CodecOptions, ServerVersion};
use h5rest::datatype::{
    decode_type, encode_type, encode_type_with, parse_predefined, predefined_name, ArrayType, ByteOrder, CharSet,
    CompoundType, EnumType, ReferenceKind, TypeDescriptor,
};
use h5rest::Error;

fn nested_type() -> TypeDescriptor {
    let color = EnumType::new(
        TypeDescriptor::int(16, true, ByteOrder::Big),
        [("RED", 0i128), ("GREEN", 1), ("BLUE", -7)],
    )
    .expect("enum");
    let palette = ArrayType::new(TypeDescriptor::Enum(color), vec![2u64, 3]).expect("array");
    let record = CompoundType::packed([
        ("id", TypeDescriptor::int(64, false, ByteOrder::Little)),
        ("label", TypeDescriptor::FixedString { length: 12, charset: CharSet::Utf8 }),
        ("note", TypeDescriptor::VariableString { charset: CharSet::Ascii }),
        ("palette", TypeDescriptor::Array(palette)),
        ("owner", TypeDescriptor::Reference(ReferenceKind::Object)),
        ("region", TypeDescriptor::Reference(ReferenceKind::Region)),
    ])
    .expect("compound");
    TypeDescriptor::Compound(record)
}

#[test]
fn test_nested_type_survives_the_wire() {
    let ty = nested_type();
    let json = encode_type(&ty).expect("encode");
    let back = decode_type(&json).expect("decode");
    assert_eq!(back, ty);

    // 8 + 12 + 8 + 6*2 + 8 + 12
    assert_eq!(back.size(), Some(60));
    let TypeDescriptor::Compound(c) = back else {
        panic!("expected compound");
    };
    let offsets: Vec<usize> = c.fields().iter().map(|f| f.offset).collect();
    assert_eq!(offsets, vec![0, 8, 20, 28, 40, 48]);
}

#[test]
fn test_dataset_response_compound() {
    let response = r#"{
        "id": "d-5e3b", "root": "g-1",
        "type": {"class": "H5T_COMPOUND", "fields": [
            {"name": "temp", "type": {"class": "H5T_INTEGER", "base": "H5T_STD_I32LE"}},
            {"name": "pressure", "type": {"class": "H5T_FLOAT", "base": "H5T_IEEE_F64LE"}}
        ]},
        "shape": {"class": "H5S_SIMPLE", "dims": [100]},
        "created": 1700000000.5
    }"#;
    let TypeDescriptor::Compound(c) = decode_type(response).expect("decode") else {
        panic!("expected compound");
    };
    let offsets: Vec<usize> = c.fields().iter().map(|f| f.offset).collect();
    assert_eq!(offsets, vec![0, 4]);
    assert_eq!(c.size(), 12);
}

#[test]
fn test_server_version_gates_fixed_utf8() {
    let ty = TypeDescriptor::FixedString { length: 16, charset: CharSet::Utf8 };

    let old = ServerVersion::from_domain_json(r#"{"root": "g-1", "version": "0.8.1"}"#).expect("version");
    let err = encode_type_with(&ty, &CodecOptions::for_server(old)).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));

    let new = ServerVersion::from_domain_json(r#"{"root": "g-1", "version": "0.9.0"}"#).expect("version");
    let json = encode_type_with(&ty, &CodecOptions::for_server(new)).expect("encode");
    assert_eq!(decode_type(&json).expect("decode"), ty);
}

#[test]
fn test_every_predefined_name_round_trips() {
    for bits in [8, 16, 32, 64] {
        for signed in [false, true] {
            for order in [ByteOrder::Little, ByteOrder::Big] {
                let t = TypeDescriptor::int(bits, signed, order);
                let name = predefined_name(&t).expect("integer name");
                assert_eq!(parse_predefined(name), Some(t));
            }
        }
    }
    for bits in [32, 64] {
        let t = TypeDescriptor::float(bits, ByteOrder::Little);
        assert_eq!(parse_predefined(predefined_name(&t).expect("float name")), Some(t));
    }
    assert_eq!(parse_predefined("H5T_NATIVE_INT"), None);
}

#[test]
fn test_committed_member_inside_compound() {
    let json = r#"{"type": {"class": "H5T_COMPOUND", "fields": [
        {"name": "when", "type": "t-7c21"}
    ]}}"#;
    // a committed member has no local size, so the compound cannot be laid out
    assert!(decode_type(json).is_err());
    assert_eq!(
        decode_type(r#"{"type": "t-7c21"}"#).expect("decode"),
        TypeDescriptor::Committed { uri: "t-7c21".into() }
    );
}
