mod api;
mod build;
mod error;
#[cfg(test)]
mod tests;

pub use self::build::{DescriptorPoolBuilder, EnumBuilder, FieldBuilder, FieldType, MessageBuilder};
pub use self::error::DescriptorError;

use std::{
    collections::{BTreeMap, HashMap},
    convert::TryInto,
    fmt,
    ops::Range,
    sync::Arc,
};

pub(crate) const MAP_ENTRY_KEY_NUMBER: u32 = 1;
pub(crate) const MAP_ENTRY_VALUE_NUMBER: u32 = 2;

pub(crate) const RESERVED_MESSAGE_FIELD_NUMBERS: Range<u32> = 19_000..20_000;
pub(crate) const VALID_MESSAGE_FIELD_NUMBERS: Range<u32> = 1..536_870_912;

/// How many times a field may occur in a message.
///
/// Map fields are `Repeated`. `Required` is kept for schemas that declare it, and is not
/// enforced when encoding or decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cardinality {
    /// At most one value is stored.
    Optional,
    /// Declared as required by the schema.
    Required,
    /// A list or map of values.
    Repeated,
}

/// The value type of a field, which fixes its wire type.
///
/// Every kind maps to exactly one [`WireType`][crate::encoding::WireType] through
/// [`wire_type`][Kind::wire_type]. The scalar kinds are stored as the [`Value`][crate::Value]
/// variant of the same signedness and width class, so `Int32` and `Sint64` both hold
/// [`Value::I64`][crate::Value::I64]. [`Group`][Kind::Group] and [`Unknown`][Kind::Unknown]
/// describe fields that are declared but never hold a value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The protobuf `double` type.
    Double,
    /// The protobuf `float` type.
    Float,
    /// The protobuf `int32` type.
    Int32,
    /// The protobuf `int64` type.
    Int64,
    /// The protobuf `uint32` type.
    Uint32,
    /// The protobuf `uint64` type.
    Uint64,
    /// The protobuf `sint32` type.
    Sint32,
    /// The protobuf `sint64` type.
    Sint64,
    /// The protobuf `fixed32` type.
    Fixed32,
    /// The protobuf `fixed64` type.
    Fixed64,
    /// The protobuf `sfixed32` type.
    Sfixed32,
    /// The protobuf `sfixed64` type.
    Sfixed64,
    /// The protobuf `bool` type.
    Bool,
    /// The protobuf `string` type.
    String,
    /// The protobuf `bytes` type.
    Bytes,
    /// A nested message, resolved to its descriptor in the same pool.
    Message(MessageDescriptor),
    /// An enum, resolved to its descriptor in the same pool. Undeclared numbers are still
    /// accepted as values.
    Enum(EnumDescriptor),
    /// The deprecated protobuf `group` type.
    ///
    /// Group fields are recognised on the wire and skipped, but their contents are never decoded.
    Group,
    /// A placeholder for a field whose type is not known.
    ///
    /// No value is valid for a field of this kind.
    Unknown,
}

#[derive(Copy, Clone)]
enum KindIndex {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Message(MessageIndex),
    Enum(EnumIndex),
    Group,
    Unknown,
}

type DescriptorIndex = u32;
type MessageIndex = DescriptorIndex;
type FieldIndex = DescriptorIndex;
type OneofIndex = DescriptorIndex;
type EnumIndex = DescriptorIndex;
type EnumValueIndex = DescriptorIndex;

/// A `DescriptorPool` is a collection of related message and enum descriptors.
///
/// Pools are created with a [`DescriptorPoolBuilder`], which checks every definition once when
/// [`build`][DescriptorPoolBuilder::build] is called. After that the pool is immutable.
///
/// This type uses reference counting internally so it is cheap to clone. Descriptors obtained
/// from two different pools never compare equal, even if they were built from identical
/// definitions.
#[derive(Clone, Default)]
pub struct DescriptorPool {
    inner: Arc<DescriptorPoolInner>,
}

#[derive(Default)]
struct DescriptorPoolInner {
    package: Box<str>,
    names: HashMap<Box<str>, Definition>,
    messages: Vec<MessageDescriptorInner>,
    enums: Vec<EnumDescriptorInner>,
}

struct Identity {
    full_name: Box<str>,
    name_index: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Definition {
    Message(MessageIndex),
    Enum(EnumIndex),
}

/// A handle to a message type in a [`DescriptorPool`].
///
/// Fields are kept in declaration order, which is also the order they are encoded in.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MessageDescriptor {
    pool: DescriptorPool,
    index: MessageIndex,
}

struct MessageDescriptorInner {
    id: Identity,
    parent: Option<MessageIndex>,
    is_map_entry: bool,
    fields: Vec<FieldDescriptorInner>,
    field_numbers: BTreeMap<u32, FieldIndex>,
    field_names: HashMap<Box<str>, FieldIndex>,
    oneofs: Vec<OneofDescriptorInner>,
    messages: Vec<MessageIndex>,
    enums: Vec<EnumIndex>,
}

/// A group of fields in a message of which at most one may be set at a time.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OneofDescriptor {
    message: MessageDescriptor,
    index: OneofIndex,
}

struct OneofDescriptorInner {
    id: Identity,
    fields: Vec<FieldIndex>,
}

/// A handle to one field of a [`MessageDescriptor`], identified by its number and name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    message: MessageDescriptor,
    index: FieldIndex,
}

struct FieldDescriptorInner {
    id: Identity,
    number: u32,
    kind: KindIndex,
    oneof: Option<OneofIndex>,
    cardinality: Cardinality,
}

/// A handle to an enum type in a [`DescriptorPool`].
///
/// The first declared value is the default.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EnumDescriptor {
    pool: DescriptorPool,
    index: EnumIndex,
}

struct EnumDescriptorInner {
    id: Identity,
    parent: Option<MessageIndex>,
    values: Vec<EnumValueDescriptorInner>,
    value_numbers: Vec<(i32, EnumValueIndex)>,
    value_names: HashMap<Box<str>, EnumValueIndex>,
    allow_alias: bool,
}

/// One named number declared by an [`EnumDescriptor`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EnumValueDescriptor {
    parent: EnumDescriptor,
    index: EnumValueIndex,
}

struct EnumValueDescriptorInner {
    id: Identity,
    number: i32,
}

impl Identity {
    fn new(full_name: &str, name: &str) -> Identity {
        debug_assert!(full_name.ends_with(name));
        let name_index = full_name.len() - name.len();
        debug_assert!(name_index == 0 || full_name.as_bytes()[name_index - 1] == b'.');
        Identity {
            full_name: full_name.into(),
            name_index,
        }
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn name(&self) -> &str {
        &self.full_name[self.name_index..]
    }
}

impl KindIndex {
    fn is_packable(&self) -> bool {
        match self {
            KindIndex::Double
            | KindIndex::Float
            | KindIndex::Int32
            | KindIndex::Int64
            | KindIndex::Uint32
            | KindIndex::Uint64
            | KindIndex::Sint32
            | KindIndex::Sint64
            | KindIndex::Fixed32
            | KindIndex::Fixed64
            | KindIndex::Sfixed32
            | KindIndex::Sfixed64
            | KindIndex::Bool
            | KindIndex::Enum(_) => true,
            KindIndex::String
            | KindIndex::Bytes
            | KindIndex::Message(_)
            | KindIndex::Group
            | KindIndex::Unknown => false,
        }
    }
}

impl fmt::Debug for KindIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindIndex::Double => write!(f, "double"),
            KindIndex::Float => write!(f, "float"),
            KindIndex::Int32 => write!(f, "int32"),
            KindIndex::Int64 => write!(f, "int64"),
            KindIndex::Uint32 => write!(f, "uint32"),
            KindIndex::Uint64 => write!(f, "uint64"),
            KindIndex::Sint32 => write!(f, "sint32"),
            KindIndex::Sint64 => write!(f, "sint64"),
            KindIndex::Fixed32 => write!(f, "fixed32"),
            KindIndex::Fixed64 => write!(f, "fixed64"),
            KindIndex::Sfixed32 => write!(f, "sfixed32"),
            KindIndex::Sfixed64 => write!(f, "sfixed64"),
            KindIndex::Bool => write!(f, "bool"),
            KindIndex::String => write!(f, "string"),
            KindIndex::Bytes => write!(f, "bytes"),
            KindIndex::Message(_) => write!(f, "message"),
            KindIndex::Enum(_) => write!(f, "enum"),
            KindIndex::Group => write!(f, "group"),
            KindIndex::Unknown => write!(f, "unknown"),
        }
    }
}

impl DescriptorPoolInner {
    fn get_by_name(&self, name: &str) -> Option<Definition> {
        let name = name.strip_prefix('.').unwrap_or(name);
        self.names.get(name).copied()
    }
}

fn to_index(i: usize) -> DescriptorIndex {
    i.try_into().expect("index too large")
}

#[test]
fn assert_descriptor_send_sync() {
    fn test_send_sync<T: Send + Sync>() {}

    test_send_sync::<DescriptorPool>();
    test_send_sync::<Kind>();
    test_send_sync::<DescriptorError>();
}
