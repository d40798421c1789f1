use once_cell::sync::Lazy;
use prost::Message;
use protodyn::{
    DescriptorPool, DescriptorPoolBuilder, DynamicMessage, EnumBuilder, FieldBuilder, FieldType,
    MessageBuilder,
};

#[cfg(test)]
mod interop;
#[cfg(test)]
mod wire;

pub mod proto {
    use std::collections::BTreeMap;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Color {
        Red = 0,
        Green = 1,
        Blue = 2,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Scalars {
        #[prost(double, tag = "1")]
        pub f_double: f64,
        #[prost(float, tag = "2")]
        pub f_float: f32,
        #[prost(int32, tag = "3")]
        pub f_int32: i32,
        #[prost(int64, tag = "4")]
        pub f_int64: i64,
        #[prost(uint32, tag = "5")]
        pub f_uint32: u32,
        #[prost(uint64, tag = "6")]
        pub f_uint64: u64,
        #[prost(sint32, tag = "7")]
        pub f_sint32: i32,
        #[prost(sint64, tag = "8")]
        pub f_sint64: i64,
        #[prost(fixed32, tag = "9")]
        pub f_fixed32: u32,
        #[prost(fixed64, tag = "10")]
        pub f_fixed64: u64,
        #[prost(sfixed32, tag = "11")]
        pub f_sfixed32: i32,
        #[prost(sfixed64, tag = "12")]
        pub f_sfixed64: i64,
        #[prost(bool, tag = "13")]
        pub f_bool: bool,
        #[prost(string, tag = "14")]
        pub f_string: String,
        #[prost(bytes = "vec", tag = "15")]
        pub f_bytes: Vec<u8>,
        #[prost(enumeration = "Color", tag = "16")]
        pub f_enum: i32,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Container {
        #[prost(int32, tag = "1")]
        pub id: i32,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(int32, repeated, packed = "false", tag = "3")]
        pub numbers: Vec<i32>,
        #[prost(string, repeated, tag = "4")]
        pub tags: Vec<String>,
        #[prost(btree_map = "string, int32", tag = "5")]
        pub counts: BTreeMap<String, i32>,
        #[prost(btree_map = "int64, message", tag = "6")]
        pub children: BTreeMap<i64, Container>,
        #[prost(message, optional, boxed, tag = "7")]
        pub child: Option<Box<Container>>,
        #[prost(oneof = "Choice", tags = "8, 9, 10")]
        pub choice: Option<Choice>,
        #[prost(message, repeated, tag = "11")]
        pub items: Vec<Scalars>,
        #[prost(enumeration = "Color", tag = "12")]
        pub color: i32,
    }

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Choice {
        #[prost(string, tag = "8")]
        Text(String),
        #[prost(int64, tag = "9")]
        Value(i64),
        #[prost(message, tag = "10")]
        Scalars(Scalars),
    }

    /// The same fields as [`Container`], with an extra field the dynamic schema does not
    /// declare.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct ContainerV2 {
        #[prost(int32, tag = "1")]
        pub id: i32,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(string, tag = "100")]
        pub added: String,
    }
}

pub static TEST_DESCRIPTOR_POOL: Lazy<DescriptorPool> = Lazy::new(|| {
    DescriptorPoolBuilder::new()
        .package("test")
        .enumeration(
            EnumBuilder::new("Color")
                .value("RED", 0)
                .value("GREEN", 1)
                .value("BLUE", 2),
        )
        .message(
            MessageBuilder::new("Scalars")
                .field(FieldBuilder::new("f_double", 1, FieldType::Double))
                .field(FieldBuilder::new("f_float", 2, FieldType::Float))
                .field(FieldBuilder::new("f_int32", 3, FieldType::Int32))
                .field(FieldBuilder::new("f_int64", 4, FieldType::Int64))
                .field(FieldBuilder::new("f_uint32", 5, FieldType::Uint32))
                .field(FieldBuilder::new("f_uint64", 6, FieldType::Uint64))
                .field(FieldBuilder::new("f_sint32", 7, FieldType::Sint32))
                .field(FieldBuilder::new("f_sint64", 8, FieldType::Sint64))
                .field(FieldBuilder::new("f_fixed32", 9, FieldType::Fixed32))
                .field(FieldBuilder::new("f_fixed64", 10, FieldType::Fixed64))
                .field(FieldBuilder::new("f_sfixed32", 11, FieldType::Sfixed32))
                .field(FieldBuilder::new("f_sfixed64", 12, FieldType::Sfixed64))
                .field(FieldBuilder::new("f_bool", 13, FieldType::Bool))
                .field(FieldBuilder::new("f_string", 14, FieldType::String))
                .field(FieldBuilder::new("f_bytes", 15, FieldType::Bytes))
                .field(FieldBuilder::new("f_enum", 16, FieldType::enumeration("Color"))),
        )
        .message(
            MessageBuilder::new("Container")
                .field(FieldBuilder::new("id", 1, FieldType::Int32))
                .field(FieldBuilder::new("name", 2, FieldType::String))
                .field(FieldBuilder::new("numbers", 3, FieldType::Int32).repeated())
                .field(FieldBuilder::new("tags", 4, FieldType::String).repeated())
                .field(FieldBuilder::map(
                    "counts",
                    5,
                    FieldType::String,
                    FieldType::Int32,
                ))
                .field(FieldBuilder::map(
                    "children",
                    6,
                    FieldType::Int64,
                    FieldType::message("Container"),
                ))
                .field(FieldBuilder::new("child", 7, FieldType::message("Container")))
                .field(FieldBuilder::new("text", 8, FieldType::String).oneof("choice"))
                .field(FieldBuilder::new("value", 9, FieldType::Int64).oneof("choice"))
                .field(
                    FieldBuilder::new("scalars", 10, FieldType::message("Scalars"))
                        .oneof("choice"),
                )
                .field(FieldBuilder::new("items", 11, FieldType::message("Scalars")).repeated())
                .field(FieldBuilder::new("color", 12, FieldType::enumeration("Color"))),
        )
        .build()
        .unwrap()
});

pub fn test_descriptor_pool() -> DescriptorPool {
    TEST_DESCRIPTOR_POOL.clone()
}

pub fn to_dynamic<T>(message: &T, name: &str) -> DynamicMessage
where
    T: Message,
{
    let desc = TEST_DESCRIPTOR_POOL.get_message_by_name(name).unwrap();
    DynamicMessage::decode(desc, message.encode_to_vec().as_slice()).unwrap()
}
