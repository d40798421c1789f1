use crate::{
    descriptor::error::DescriptorErrorKind, encoding::WireType, Cardinality, DescriptorPool,
    DescriptorPoolBuilder, EnumBuilder, FieldBuilder, FieldType, Kind, MessageBuilder,
};

fn build_errors(builder: DescriptorPoolBuilder) -> Vec<DescriptorErrorKind> {
    builder.build().unwrap_err().kinds().to_vec()
}

#[test]
fn resolve_relative_message_name() {
    let pool = DescriptorPoolBuilder::new()
        .package("my.package")
        .message(
            MessageBuilder::new("Outer")
                .message(MessageBuilder::new("Inner"))
                .field(FieldBuilder::new("inner", 1, FieldType::message("Inner")))
                .field(FieldBuilder::new("sibling", 2, FieldType::message("Sibling")))
                .field(FieldBuilder::new(
                    "absolute",
                    3,
                    FieldType::message(".my.package.Outer.Inner"),
                )),
        )
        .message(MessageBuilder::new("Sibling"))
        .build()
        .unwrap();

    let outer = pool.get_message_by_name("my.package.Outer").unwrap();
    let kind_name = |name: &str| match outer.get_field_by_name(name).unwrap().kind() {
        Kind::Message(message) => message.full_name().to_owned(),
        kind => panic!("unexpected kind {:?}", kind),
    };
    assert_eq!(kind_name("inner"), "my.package.Outer.Inner");
    assert_eq!(kind_name("sibling"), "my.package.Sibling");
    assert_eq!(kind_name("absolute"), "my.package.Outer.Inner");
}

#[test]
fn resolve_prefers_innermost_scope() {
    let pool = DescriptorPoolBuilder::new()
        .message(
            MessageBuilder::new("Outer")
                .message(MessageBuilder::new("Shadowed"))
                .field(FieldBuilder::new("field", 1, FieldType::message("Shadowed"))),
        )
        .message(MessageBuilder::new("Shadowed"))
        .build()
        .unwrap();

    let field = pool
        .get_message_by_name("Outer")
        .unwrap()
        .get_field(1)
        .unwrap();
    assert_eq!(
        field.kind().as_message().unwrap().full_name(),
        "Outer.Shadowed"
    );
}

#[test]
fn message_lookups() {
    let pool = DescriptorPoolBuilder::new()
        .package("test")
        .message(
            MessageBuilder::new("Message")
                .field(FieldBuilder::new("b", 2, FieldType::String))
                .field(FieldBuilder::new("a", 1, FieldType::Int32))
                .field(FieldBuilder::new("list", 3, FieldType::Sint64).repeated())
                .field(FieldBuilder::new("req", 4, FieldType::Bool).required())
                .enumeration(EnumBuilder::new("Nested").value("ZERO", 0)),
        )
        .build()
        .unwrap();

    let message = pool.get_message_by_name("test.Message").unwrap();
    assert_eq!(message.name(), "Message");
    assert_eq!(message.package_name(), "test");
    assert!(message.parent_message().is_none());

    let names: Vec<_> = message.fields().map(|f| f.name().to_owned()).collect();
    assert_eq!(names, ["b", "a", "list", "req"]);

    let a = message.get_field(1).unwrap();
    assert_eq!(a.full_name(), "test.Message.a");
    assert_eq!(a.kind(), Kind::Int32);
    assert_eq!(a.cardinality(), Cardinality::Optional);
    assert_eq!(message.get_field_by_name("a"), Some(a));

    let list = message.get_field_by_name("list").unwrap();
    assert!(list.is_list());
    assert!(list.is_packable());
    assert!(!list.is_map());

    assert_eq!(
        message.get_field_by_name("req").unwrap().cardinality(),
        Cardinality::Required
    );
    assert!(message.get_field(5).is_none());
    assert!(message.get_field_by_name("c").is_none());

    let nested = message.child_enums().next().unwrap();
    assert_eq!(nested.full_name(), "test.Message.Nested");
    assert_eq!(nested.parent_message(), Some(message));
    assert_eq!(pool.get_enum_by_name(".test.Message.Nested"), Some(nested));
    assert!(pool.get_message_by_name("test.Message.Nested").is_none());
}

#[test]
fn map_field_creates_entry_message() {
    let pool = DescriptorPoolBuilder::new()
        .package("test")
        .message(MessageBuilder::new("Message").field(FieldBuilder::map(
            "string_map",
            1,
            FieldType::String,
            FieldType::Int64,
        )))
        .build()
        .unwrap();

    let message = pool.get_message_by_name("test.Message").unwrap();
    let field = message.get_field(1).unwrap();
    assert!(field.is_map());
    assert!(!field.is_list());
    assert!(!field.is_packable());

    let entry = field.kind().as_message().unwrap().clone();
    assert_eq!(entry.full_name(), "test.Message.StringMapEntry");
    assert!(entry.is_map_entry());
    assert_eq!(entry.parent_message(), Some(message));
    assert_eq!(entry.map_entry_key_field().name(), "key");
    assert_eq!(entry.map_entry_key_field().kind(), Kind::String);
    assert_eq!(entry.map_entry_value_field().number(), 2);
    assert_eq!(entry.map_entry_value_field().kind(), Kind::Int64);
}

#[test]
fn oneof_membership() {
    let pool = DescriptorPoolBuilder::new()
        .message(
            MessageBuilder::new("Message")
                .field(FieldBuilder::new("plain", 1, FieldType::Int32))
                .field(FieldBuilder::new("a", 2, FieldType::Int32).oneof("choice"))
                .field(FieldBuilder::new("b", 3, FieldType::String).oneof("choice")),
        )
        .build()
        .unwrap();

    let message = pool.get_message_by_name("Message").unwrap();
    let oneof = message.get_oneof_by_name("choice").unwrap();
    assert_eq!(oneof.full_name(), "Message.choice");
    let members: Vec<_> = oneof.fields().map(|f| f.number()).collect();
    assert_eq!(members, [2, 3]);
    assert_eq!(message.get_field(2).unwrap().containing_oneof(), Some(oneof));
    assert!(message.get_field(1).unwrap().containing_oneof().is_none());
    assert!(message.get_oneof_by_name("other").is_none());
}

#[test]
fn enum_lookups() {
    let pool = DescriptorPoolBuilder::new()
        .enumeration(
            EnumBuilder::new("Color")
                .value("RED", 2)
                .value("NEGATIVE", -1)
                .value("GREEN", 0),
        )
        .build()
        .unwrap();

    let color = pool.get_enum_by_name("Color").unwrap();
    assert_eq!(color.default_value().name(), "RED");
    assert_eq!(color.get_value(-1).unwrap().name(), "NEGATIVE");
    assert_eq!(color.get_value(0).unwrap().full_name(), "GREEN");
    assert!(color.get_value(1).is_none());
    assert_eq!(color.get_value_by_name("RED").unwrap().number(), 2);
    assert!(color.get_value_by_name("BLUE").is_none());
    let names: Vec<_> = color.values().map(|v| v.name().to_owned()).collect();
    assert_eq!(names, ["RED", "NEGATIVE", "GREEN"]);
}

#[test]
fn enum_alias_returns_first_value() {
    let pool = DescriptorPoolBuilder::new()
        .enumeration(
            EnumBuilder::new("Alias")
                .allow_alias(true)
                .value("FIRST", 1)
                .value("SECOND", 1)
                .value("ZERO", 0),
        )
        .build()
        .unwrap();

    let alias = pool.get_enum_by_name("Alias").unwrap();
    assert!(alias.allows_alias());
    assert_eq!(alias.get_value(1).unwrap().name(), "FIRST");
    assert_eq!(alias.get_value_by_name("SECOND").unwrap().number(), 1);
}

#[test]
fn recursive_message() {
    let pool = DescriptorPoolBuilder::new()
        .message(
            MessageBuilder::new("Node")
                .field(FieldBuilder::new("value", 1, FieldType::Int32))
                .field(FieldBuilder::new("children", 2, FieldType::message("Node")).repeated()),
        )
        .build()
        .unwrap();

    let node = pool.get_message_by_name("Node").unwrap();
    let children = node.get_field(2).unwrap();
    assert_eq!(children.kind(), Kind::Message(node));
    assert!(children.is_list());
}

#[test]
fn descriptors_from_different_pools_are_not_equal() {
    let builder =
        DescriptorPoolBuilder::new().message(MessageBuilder::new("Message").field(FieldBuilder::new(
            "field",
            1,
            FieldType::Int32,
        )));
    let pool1 = builder.clone().build().unwrap();
    let pool2 = builder.build().unwrap();

    assert_eq!(pool1, pool1.clone());
    assert_ne!(pool1, pool2);
    assert_ne!(
        pool1.get_message_by_name("Message"),
        pool2.get_message_by_name("Message")
    );
    assert_eq!(
        pool1.get_message_by_name("Message"),
        pool1.get_message_by_name("Message")
    );
}

#[test]
fn kind_wire_types() {
    let pool = DescriptorPoolBuilder::new()
        .message(MessageBuilder::new("Message"))
        .enumeration(EnumBuilder::new("Enum").value("ZERO", 0))
        .build()
        .unwrap();
    let message = pool.get_message_by_name("Message").unwrap();
    let enum_ = pool.get_enum_by_name("Enum").unwrap();

    let cases = [
        (Kind::Int32, WireType::Varint),
        (Kind::Int64, WireType::Varint),
        (Kind::Uint32, WireType::Varint),
        (Kind::Uint64, WireType::Varint),
        (Kind::Sint32, WireType::Varint),
        (Kind::Sint64, WireType::Varint),
        (Kind::Bool, WireType::Varint),
        (Kind::Enum(enum_), WireType::Varint),
        (Kind::Fixed64, WireType::SixtyFourBit),
        (Kind::Sfixed64, WireType::SixtyFourBit),
        (Kind::Double, WireType::SixtyFourBit),
        (Kind::String, WireType::LengthDelimited),
        (Kind::Bytes, WireType::LengthDelimited),
        (Kind::Message(message), WireType::LengthDelimited),
        (Kind::Fixed32, WireType::ThirtyTwoBit),
        (Kind::Sfixed32, WireType::ThirtyTwoBit),
        (Kind::Float, WireType::ThirtyTwoBit),
        (Kind::Group, WireType::StartGroup),
        (Kind::Unknown, WireType::Varint),
    ];
    for (kind, wire_type) in cases {
        assert_eq!(kind.wire_type(), wire_type, "{:?}", kind);
    }
}

#[test]
fn empty_pool() {
    let pool = DescriptorPool::new();
    assert_eq!(pool.all_messages().len(), 0);
    assert!(pool.get_message_by_name("Message").is_none());
}

#[test]
fn error_invalid_field_numbers() {
    let errors = build_errors(
        DescriptorPoolBuilder::new().message(
            MessageBuilder::new("Message")
                .field(FieldBuilder::new("zero", 0, FieldType::Int32))
                .field(FieldBuilder::new("reserved", 19_500, FieldType::Int32))
                .field(FieldBuilder::new("too_large", 536_870_912, FieldType::Int32))
                .field(FieldBuilder::new("max", 536_870_911, FieldType::Int32)),
        ),
    );
    assert_eq!(
        errors,
        vec![
            DescriptorErrorKind::InvalidFieldNumber {
                number: 0,
                field: "Message.zero".to_owned(),
            },
            DescriptorErrorKind::ReservedFieldNumber {
                number: 19_500,
                field: "Message.reserved".to_owned(),
            },
            DescriptorErrorKind::InvalidFieldNumber {
                number: 536_870_912,
                field: "Message.too_large".to_owned(),
            },
        ]
    );
}

#[test]
fn error_duplicate_field_number_and_name() {
    let errors = build_errors(
        DescriptorPoolBuilder::new().message(
            MessageBuilder::new("Message")
                .field(FieldBuilder::new("a", 1, FieldType::Int32))
                .field(FieldBuilder::new("b", 1, FieldType::Int32))
                .field(FieldBuilder::new("a", 2, FieldType::Int32)),
        ),
    );
    assert_eq!(
        errors,
        vec![
            DescriptorErrorKind::DuplicateFieldNumber {
                number: 1,
                first: "Message.a".to_owned(),
                second: "Message.b".to_owned(),
            },
            DescriptorErrorKind::DuplicateFieldName {
                name: "a".to_owned(),
                message: "Message".to_owned(),
            },
        ]
    );
}

#[test]
fn error_duplicate_type_name() {
    let errors = build_errors(
        DescriptorPoolBuilder::new()
            .package("pkg")
            .message(MessageBuilder::new("Thing"))
            .enumeration(EnumBuilder::new("Thing").value("ZERO", 0)),
    );
    assert_eq!(
        errors,
        vec![DescriptorErrorKind::DuplicateName {
            name: "pkg.Thing".to_owned(),
        }]
    );
}

#[test]
fn error_unresolved_and_wrong_kind_references() {
    let errors = build_errors(
        DescriptorPoolBuilder::new()
            .message(
                MessageBuilder::new("Message")
                    .field(FieldBuilder::new("missing", 1, FieldType::message("Missing")))
                    .field(FieldBuilder::new("not_enum", 2, FieldType::enumeration("Message")))
                    .field(FieldBuilder::new("not_message", 3, FieldType::message("Enum"))),
            )
            .enumeration(EnumBuilder::new("Enum").value("ZERO", 0)),
    );
    assert_eq!(
        errors,
        vec![
            DescriptorErrorKind::NameNotFound {
                name: "Missing".to_owned(),
                field: "Message.missing".to_owned(),
            },
            DescriptorErrorKind::InvalidType {
                name: "Message".to_owned(),
                expected: "an enum type",
                field: "Message.not_enum".to_owned(),
            },
            DescriptorErrorKind::InvalidType {
                name: "Enum".to_owned(),
                expected: "a message type",
                field: "Message.not_message".to_owned(),
            },
        ]
    );
}

#[test]
fn error_invalid_map_key() {
    let errors = build_errors(DescriptorPoolBuilder::new().message(
        MessageBuilder::new("Message").field(FieldBuilder::map(
            "float_map",
            1,
            FieldType::Float,
            FieldType::String,
        )),
    ));
    assert_eq!(
        errors,
        vec![DescriptorErrorKind::InvalidMapKeyType {
            kind: "float".to_owned(),
            field: "Message.float_map".to_owned(),
        }]
    );
}

#[test]
fn error_repeated_oneof_member() {
    let errors = build_errors(
        DescriptorPoolBuilder::new().message(
            MessageBuilder::new("Message")
                .field(
                    FieldBuilder::new("list", 1, FieldType::Int32)
                        .repeated()
                        .oneof("choice"),
                )
                .field(
                    FieldBuilder::map("map", 2, FieldType::Int32, FieldType::Int32)
                        .oneof("choice"),
                ),
        ),
    );
    assert_eq!(
        errors,
        vec![
            DescriptorErrorKind::InvalidOneofField {
                field: "Message.list".to_owned(),
                oneof: "Message.choice".to_owned(),
            },
            DescriptorErrorKind::InvalidOneofField {
                field: "Message.map".to_owned(),
                oneof: "Message.choice".to_owned(),
            },
        ]
    );
}

#[test]
fn error_invalid_enums() {
    let errors = build_errors(
        DescriptorPoolBuilder::new()
            .enumeration(EnumBuilder::new("Empty"))
            .enumeration(
                EnumBuilder::new("Duplicates")
                    .value("A", 0)
                    .value("A", 1)
                    .value("B", 1),
            ),
    );
    assert_eq!(
        errors,
        vec![
            DescriptorErrorKind::EmptyEnum {
                name: "Empty".to_owned(),
            },
            DescriptorErrorKind::DuplicateEnumValueName {
                name: "A".to_owned(),
                enum_name: "Duplicates".to_owned(),
            },
            DescriptorErrorKind::DuplicateEnumNumber {
                number: 1,
                first: "A".to_owned(),
                second: "B".to_owned(),
            },
        ]
    );
}

#[test]
fn error_reports_every_problem() {
    let err = DescriptorPoolBuilder::new()
        .message(
            MessageBuilder::new("Message")
                .field(FieldBuilder::new("a", 0, FieldType::Int32))
                .field(FieldBuilder::new("b", 2, FieldType::message("Missing"))),
        )
        .build()
        .unwrap_err();

    assert_eq!(err.error_count(), 2);
    assert_eq!(err.location(), "Message.a");
    assert_eq!(err.to_string(), "invalid number '0' for field 'Message.a'");
}
