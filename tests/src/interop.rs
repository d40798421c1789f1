use std::collections::BTreeMap;

use proptest::prelude::*;
use prost::Message;
use protodyn::{DynamicMessage, EnumValue, MapKey, TranscodeError, Value};
use similar_asserts::assert_eq;

use crate::{
    proto::{Choice, Color, Container, ContainerV2, Scalars},
    test_descriptor_pool, to_dynamic, TEST_DESCRIPTOR_POOL,
};

#[derive(Clone, PartialEq, prost::Message)]
struct PackedNumbers {
    #[prost(int32, repeated, tag = "3")]
    numbers: Vec<i32>,
}

fn sample_scalars() -> Scalars {
    Scalars {
        f_double: 1.5,
        f_float: -2.25,
        f_int32: -3,
        f_int64: 4,
        f_uint32: 5,
        f_uint64: u64::MAX,
        f_sint32: -7,
        f_sint64: i64::MIN,
        f_fixed32: 9,
        f_fixed64: 10,
        f_sfixed32: -11,
        f_sfixed64: 12,
        f_bool: true,
        f_string: "thirteen".to_owned(),
        f_bytes: b"fourteen".to_vec(),
        f_enum: Color::Blue as i32,
    }
}

fn sample_container() -> Container {
    Container {
        id: 1,
        name: "root".to_owned(),
        numbers: vec![1, -2, 3],
        tags: vec!["a".to_owned(), "b".to_owned()],
        counts: BTreeMap::from([("x".to_owned(), 1), ("y".to_owned(), 2)]),
        children: BTreeMap::from([(
            5,
            Container {
                id: 5,
                ..Default::default()
            },
        )]),
        child: Some(Box::new(Container {
            name: "child".to_owned(),
            ..Default::default()
        })),
        choice: Some(Choice::Text("chosen".to_owned())),
        items: vec![sample_scalars()],
        color: Color::Green as i32,
    }
}

#[test]
fn decode_prost_scalars() {
    let dynamic = to_dynamic(&sample_scalars(), "test.Scalars");
    let color = TEST_DESCRIPTOR_POOL.get_enum_by_name("test.Color").unwrap();

    assert_eq!(dynamic.get_field_by_name("f_double"), Some(&Value::F64(1.5)));
    assert_eq!(dynamic.get_field_by_name("f_float"), Some(&Value::F32(-2.25)));
    assert_eq!(dynamic.get_field_by_name("f_int32"), Some(&Value::I64(-3)));
    assert_eq!(dynamic.get_field_by_name("f_uint64"), Some(&Value::U64(u64::MAX)));
    assert_eq!(dynamic.get_field_by_name("f_sint32"), Some(&Value::I64(-7)));
    assert_eq!(
        dynamic.get_field_by_name("f_sint64"),
        Some(&Value::I64(i64::MIN))
    );
    assert_eq!(dynamic.get_field_by_name("f_sfixed32"), Some(&Value::I64(-11)));
    assert_eq!(dynamic.get_field_by_name("f_bool"), Some(&Value::Bool(true)));
    assert_eq!(
        dynamic.get_field_by_name("f_string").unwrap().as_str(),
        Some("thirteen")
    );
    assert_eq!(
        dynamic.get_field_by_name("f_bytes").unwrap().as_bytes().unwrap().as_ref(),
        b"fourteen"
    );
    assert_eq!(
        dynamic.get_field_by_name("f_enum"),
        Some(&Value::Enum(EnumValue::new(color, 2)))
    );
}

#[test]
fn prost_defaults_are_not_set() {
    let dynamic = to_dynamic(&Scalars::default(), "test.Scalars");
    assert_eq!(dynamic.fields().count(), 0);
    assert!(dynamic.encode_to_vec().unwrap().is_empty());
}

#[test]
fn container_bytes_match_prost() {
    let message = sample_container();
    let dynamic = to_dynamic(&message, "test.Container");

    assert_eq!(dynamic.encode_to_vec().unwrap(), message.encode_to_vec());
    assert_eq!(dynamic.encoded_len().unwrap(), message.encoded_len());
    assert_eq!(dynamic.transcode_to::<Container>().unwrap(), message);
}

#[test]
fn build_dynamic_and_transcode_to_prost() {
    let pool = test_descriptor_pool();
    let desc = pool.get_message_by_name("test.Container").unwrap();
    let mut dynamic = DynamicMessage::new(desc.clone());

    dynamic.set_field_by_name("id", Value::I64(8));
    dynamic
        .try_set_field_by_name("color", Value::from("BLUE"))
        .unwrap();
    let numbers = desc.get_field_by_name("numbers").unwrap();
    dynamic.push_list_item(&numbers, Value::I64(4)).unwrap();
    dynamic.push_list_item(&numbers, Value::from("5")).unwrap();
    let counts = desc.get_field_by_name("counts").unwrap();
    dynamic
        .insert_map_entry(&counts, MapKey::from("k"), Value::I64(9))
        .unwrap();
    dynamic.set_field_by_name("value", Value::I64(-1));

    let child_field = desc.get_field_by_name("child").unwrap();
    let mut child = dynamic.new_nested_message(&child_field).unwrap();
    child.set_field_by_name("name", Value::from("nested"));
    dynamic.set_nested_message(&child_field, child).unwrap();

    assert_eq!(
        dynamic.transcode_to::<Container>().unwrap(),
        Container {
            id: 8,
            numbers: vec![4, 5],
            counts: BTreeMap::from([("k".to_owned(), 9)]),
            child: Some(Box::new(Container {
                name: "nested".to_owned(),
                ..Default::default()
            })),
            choice: Some(Choice::Value(-1)),
            color: Color::Blue as i32,
            ..Default::default()
        }
    );
}

#[test]
fn transcode_from_prost_merges() {
    let desc = TEST_DESCRIPTOR_POOL
        .get_message_by_name("test.Container")
        .unwrap();
    let mut dynamic = DynamicMessage::new(desc);
    dynamic.set_field_by_name("id", Value::I64(1));
    dynamic.set_field_by_name("numbers", Value::List(vec![Value::I64(1)]));

    dynamic
        .transcode_from(&Container {
            name: "merged".to_owned(),
            numbers: vec![2],
            ..Default::default()
        })
        .unwrap();

    assert_eq!(dynamic.get_field_by_name("id"), Some(&Value::I64(1)));
    assert_eq!(
        dynamic.get_field_by_name("name").unwrap().as_str(),
        Some("merged")
    );
    assert_eq!(
        dynamic.get_field_by_name("numbers"),
        Some(&Value::List(vec![Value::I64(1), Value::I64(2)]))
    );
}

#[test]
fn decode_packed_prost_list() {
    let dynamic = to_dynamic(
        &PackedNumbers {
            numbers: vec![1, 300, -1],
        },
        "test.Container",
    );
    assert_eq!(
        dynamic.get_field_by_name("numbers"),
        Some(&Value::List(vec![
            Value::I64(1),
            Value::I64(300),
            Value::I64(-1)
        ]))
    );

    // Lists are always written unpacked.
    assert_eq!(
        dynamic.transcode_to::<Container>().unwrap().numbers,
        [1, 300, -1]
    );
}

#[test]
fn unknown_fields_survive_round_trip() {
    let message = ContainerV2 {
        id: 3,
        name: "v2".to_owned(),
        added: "extra".to_owned(),
    };
    let dynamic = to_dynamic(&message, "test.Container");
    assert_eq!(dynamic.unknown_fields().count(), 1);
    assert!(dynamic.unknown_field(100).is_some());

    assert_eq!(dynamic.transcode_to::<ContainerV2>().unwrap(), message);
}

#[test]
fn transcode_to_reports_prost_errors() {
    let desc = TEST_DESCRIPTOR_POOL
        .get_message_by_name("test.Container")
        .unwrap();
    // Field 100 holds bytes which are not valid UTF-8.
    let dynamic = DynamicMessage::decode(desc, &[0xA2u8, 0x06, 0x02, 0xC3, 0x28][..]).unwrap();
    assert_eq!(dynamic.unknown_fields().count(), 1);

    assert!(matches!(
        dynamic.transcode_to::<ContainerV2>(),
        Err(TranscodeError::Decode(_))
    ));
    assert!(dynamic.transcode_to::<Container>().is_ok());
}

prop_compose! {
    fn arb_scalars()(
        f_double in -1e12f64..1e12,
        f_float in -1e6f32..1e6,
        f_int32 in any::<i32>(),
        f_int64 in any::<i64>(),
        f_uint32 in any::<u32>(),
        f_uint64 in any::<u64>(),
        f_sint32 in any::<i32>(),
        f_sint64 in any::<i64>(),
        f_fixed32 in any::<u32>(),
        f_fixed64 in any::<u64>(),
        f_sfixed32 in any::<i32>(),
        f_sfixed64 in any::<i64>(),
        f_bool in any::<bool>(),
        f_string in ".*",
        f_bytes in prop::collection::vec(any::<u8>(), 0..16),
        f_enum in -1i32..4,
    ) -> Scalars {
        Scalars {
            f_double,
            f_float,
            f_int32,
            f_int64,
            f_uint32,
            f_uint64,
            f_sint32,
            f_sint64,
            f_fixed32,
            f_fixed64,
            f_sfixed32,
            f_sfixed64,
            f_bool,
            f_string,
            f_bytes,
            f_enum,
        }
    }
}

prop_compose! {
    fn arb_container()(
        id in any::<i32>(),
        name in "[a-z]{0,8}",
        numbers in prop::collection::vec(any::<i32>(), 0..4),
        counts in prop::collection::btree_map("[a-z]{1,4}", 1i32..100, 0..4),
        items in prop::collection::vec(arb_scalars(), 0..2),
        value in prop::option::of(any::<i64>()),
    ) -> Container {
        Container {
            id,
            name,
            numbers,
            counts,
            items,
            choice: value.map(Choice::Value),
            ..Default::default()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn roundtrip_arb_scalars(message in arb_scalars()) {
        let dynamic = to_dynamic(&message, "test.Scalars");
        prop_assert_eq!(dynamic.encode_to_vec().unwrap(), message.encode_to_vec());
        prop_assert_eq!(dynamic.transcode_to::<Scalars>().unwrap(), message);
    }

    #[test]
    fn roundtrip_arb_container(message in arb_container()) {
        let dynamic = to_dynamic(&message, "test.Container");
        prop_assert!(dynamic.is_valid());

        let bytes = dynamic.encode_to_vec().unwrap();
        let desc = dynamic.descriptor().clone();
        prop_assert_eq!(DynamicMessage::decode(desc, bytes.as_slice()).unwrap(), dynamic);
        prop_assert_eq!(Container::decode(bytes.as_slice()).unwrap(), message);
    }
}
