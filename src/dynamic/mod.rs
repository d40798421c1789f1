mod convert;
mod fields;
mod message;
mod options;
mod unknown;

pub use self::message::TranscodeError;
pub use self::options::DecodeOptions;

use std::{
    borrow::Cow,
    collections::BTreeMap,
    error::Error,
    fmt,
    hash::{Hash, Hasher},
    mem,
};

use prost::bytes::Bytes;

use self::fields::DynamicMessageFieldSet;
use crate::{
    EnumDescriptor, EnumValueDescriptor, FieldDescriptor, Kind, MessageDescriptor,
    OneofDescriptor,
};

/// [`DynamicMessage`] provides encoding, decoding and reflection of a protobuf message.
///
/// It wraps a [`MessageDescriptor`] and the [`Value`] for each field of the message which has
/// been set. Fields read from the wire which the descriptor does not declare are kept as raw
/// bytes, and written back out when the message is encoded.
///
/// Two messages are equal if they have the same descriptor and the same set fields. Unknown
/// fields are not compared.
#[derive(Debug, Clone)]
pub struct DynamicMessage {
    desc: MessageDescriptor,
    fields: DynamicMessageFieldSet,
}

/// A dynamically-typed protobuf value.
///
/// Note this type may map to multiple possible protobuf wire formats, so it must be
/// serialized as part of a DynamicMessage.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean value, encoded as the `bool` protobuf type.
    Bool(bool),
    /// A signed integer, encoded as one of the `int32`, `int64`, `sint32`, `sint64`, `sfixed32`
    /// or `sfixed64` protobuf types.
    I64(i64),
    /// An unsigned integer, encoded as one of the `uint32`, `uint64`, `fixed32` or `fixed64`
    /// protobuf types.
    U64(u64),
    /// A 32-bit floating point number, encoded as the `float` protobuf type.
    F32(f32),
    /// A 64-bit floating point number, encoded as the `double` protobuf type.
    F64(f64),
    /// A string, encoded as the `string` protobuf type.
    String(String),
    /// A byte string, encoded as the `bytes` protobuf type.
    Bytes(Bytes),
    /// An enumeration value, encoded as a protobuf enum.
    Enum(EnumValue),
    /// A protobuf message.
    Message(DynamicMessage),
    /// A list of values, encoded as a protobuf repeated field.
    List(Vec<Value>),
    /// A map of values, encoded as a protobuf map field.
    Map(BTreeMap<MapKey, Value>),
}

/// A dynamically-typed key for a protobuf map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    /// A boolean value, encoded as the `bool` protobuf type.
    Bool(bool),
    /// A signed integer, encoded as one of the `int32`, `int64`, `sint32`, `sint64`, `sfixed32`
    /// or `sfixed64` protobuf types.
    I64(i64),
    /// An unsigned integer, encoded as one of the `uint32`, `uint64`, `fixed32` or `fixed64`
    /// protobuf types.
    U64(u64),
    /// A string, encoded as the `string` protobuf type.
    String(String),
}

/// The value of a protobuf enum field.
///
/// The number need not be declared by the enum, since protobuf enums are open.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    desc: EnumDescriptor,
    number: i32,
}

/// Error type returned by [`DynamicMessage::try_set_field`] and the other fallible mutation
/// methods.
#[derive(Debug, Clone, PartialEq)]
pub enum SetFieldError {
    /// The field was not found.
    NotFound,
    /// The value could not be converted to the type of the field.
    InvalidType {
        /// The descriptor of the field.
        field: FieldDescriptor,
        /// The value which was rejected.
        value: Value,
    },
}

impl DynamicMessage {
    /// Creates a new, empty instance of [`DynamicMessage`] for the message type specified by the
    /// [`MessageDescriptor`].
    pub fn new(desc: MessageDescriptor) -> Self {
        DynamicMessage {
            fields: DynamicMessageFieldSet::default(),
            desc,
        }
    }

    /// Gets a reference to the [`MessageDescriptor`] describing this message type.
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.desc
    }

    /// Returns `true` if this message has the given field set.
    ///
    /// Only fields which have been set, or read from the wire, are included in the encoded
    /// bytes of this message.
    pub fn has_field(&self, field_desc: &FieldDescriptor) -> bool {
        self.fields.has(field_desc.number())
    }

    /// Returns `true` if this message has the field with the given number set.
    pub fn has_field_by_number(&self, number: u32) -> bool {
        self.fields.has(number)
    }

    /// Returns `true` if this message has the field with the given name set.
    pub fn has_field_by_name(&self, name: &str) -> bool {
        match self.desc.get_field_by_name(name) {
            Some(field_desc) => self.has_field(&field_desc),
            None => false,
        }
    }

    /// Gets the value of the given field, or `None` if it is unset.
    pub fn get_field(&self, field_desc: &FieldDescriptor) -> Option<&Value> {
        self.fields.get(field_desc.number())
    }

    /// Gets the value of the field with the given number, or `None` if it is unset.
    pub fn get_field_by_number(&self, number: u32) -> Option<&Value> {
        self.fields.get(number)
    }

    /// Gets the value of the field with the given name, or `None` if it is unset or no such
    /// field exists.
    pub fn get_field_by_name(&self, name: &str) -> Option<&Value> {
        let field_desc = self.desc.get_field_by_name(name)?;
        self.get_field(&field_desc)
    }

    /// Gets the value of the given field, or the default value if it is unset.
    pub fn get_field_or_default(&self, field_desc: &FieldDescriptor) -> Cow<'_, Value> {
        match self.fields.get(field_desc.number()) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(Value::default_value_for_field(field_desc)),
        }
    }

    /// Gets a mutable reference to the value of the given field, or `None` if it is unset.
    pub fn get_field_mut(&mut self, field_desc: &FieldDescriptor) -> Option<&mut Value> {
        self.fields.get_mut(field_desc.number())
    }

    /// Sets the value of the given field.
    ///
    /// If the field is a member of a oneof, any other member which is set is cleared.
    ///
    /// # Panics
    ///
    /// This method may panic if the value type is not compatible with the field type, as defined
    /// by [`Value::is_valid_for_field`]. Use [`try_set_field`][Self::try_set_field] to convert
    /// the value instead.
    pub fn set_field(&mut self, field_desc: &FieldDescriptor, value: Value) {
        debug_assert!(
            value.is_valid_for_field(field_desc),
            "invalid value {:?} for field {:?}",
            value,
            field_desc,
        );
        self.fields.set(field_desc, value);
    }

    /// Sets the value of the field with number `number`.
    ///
    /// If no field with the given number exists, this method does nothing.
    ///
    /// See [`set_field`][Self::set_field] for more details.
    pub fn set_field_by_number(&mut self, number: u32, value: Value) {
        if let Some(field_desc) = self.desc.get_field(number) {
            self.set_field(&field_desc, value)
        }
    }

    /// Sets the value of the field with name `name`.
    ///
    /// If no field with the given name exists, this method does nothing.
    ///
    /// See [`set_field`][Self::set_field] for more details.
    pub fn set_field_by_name(&mut self, name: &str, value: Value) {
        if let Some(field_desc) = self.desc.get_field_by_name(name) {
            self.set_field(&field_desc, value)
        }
    }

    /// Converts `value` to the type of the given field, and sets it.
    ///
    /// The conversion is described by [`Value::convert_for_field`]. If the field is a member of
    /// a oneof, any other member which is set is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SetFieldError::NotFound`] if the field does not belong to this message type, or
    /// [`SetFieldError::InvalidType`] if the value cannot be converted. In either case the
    /// message is left unchanged.
    pub fn try_set_field(
        &mut self,
        field_desc: &FieldDescriptor,
        value: Value,
    ) -> Result<(), SetFieldError> {
        self.check_field(field_desc)?;
        match value.convert_for_field(field_desc) {
            Some(converted) => {
                self.fields.set(field_desc, converted);
                Ok(())
            }
            None => Err(SetFieldError::InvalidType {
                field: field_desc.clone(),
                value,
            }),
        }
    }

    /// Converts `value` to the type of the field with number `number`, and sets it.
    ///
    /// See [`try_set_field`][Self::try_set_field] for more details.
    pub fn try_set_field_by_number(
        &mut self,
        number: u32,
        value: Value,
    ) -> Result<(), SetFieldError> {
        match self.desc.get_field(number) {
            Some(field_desc) => self.try_set_field(&field_desc, value),
            None => Err(SetFieldError::NotFound),
        }
    }

    /// Converts `value` to the type of the field with name `name`, and sets it.
    ///
    /// See [`try_set_field`][Self::try_set_field] for more details.
    pub fn try_set_field_by_name(&mut self, name: &str, value: Value) -> Result<(), SetFieldError> {
        match self.desc.get_field_by_name(name) {
            Some(field_desc) => self.try_set_field(&field_desc, value),
            None => Err(SetFieldError::NotFound),
        }
    }

    /// Clears the given field.
    ///
    /// After calling this method, `has_field` will return false for the field,
    /// and it will not be included in the encoded bytes of this message.
    pub fn clear_field(&mut self, field_desc: &FieldDescriptor) {
        self.fields.clear(field_desc);
    }

    /// Clears the field with the given number.
    ///
    /// If no field with the given number exists, this method does nothing.
    pub fn clear_field_by_number(&mut self, number: u32) {
        if let Some(field_desc) = self.desc.get_field(number) {
            self.clear_field(&field_desc);
        }
    }

    /// Clears the field with the given name.
    ///
    /// If no field with the given name exists, this method does nothing.
    pub fn clear_field_by_name(&mut self, name: &str) {
        if let Some(field_desc) = self.desc.get_field_by_name(name) {
            self.clear_field(&field_desc);
        }
    }

    /// Clears all fields of this message, including unknown fields.
    pub fn clear(&mut self) {
        self.fields.clear_all();
    }

    /// Gets an iterator over the fields of this message which are set, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldDescriptor, &'_ Value)> + '_ {
        self.desc.fields().filter_map(move |field_desc| {
            let value = self.fields.get(field_desc.number())?;
            Some((field_desc, value))
        })
    }

    /// Gets the member of the given oneof which is set, or `None` if no member is set.
    pub fn which_oneof(&self, oneof_desc: &OneofDescriptor) -> Option<FieldDescriptor> {
        let number = self.fields.which_oneof(oneof_desc)?;
        self.desc.get_field(number)
    }

    /// Converts `value` to the element type of the given list field, and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`SetFieldError::NotFound`] if the field does not belong to this message type, or
    /// [`SetFieldError::InvalidType`] if the field is not a list or the value cannot be
    /// converted.
    pub fn push_list_item(
        &mut self,
        field_desc: &FieldDescriptor,
        value: Value,
    ) -> Result<(), SetFieldError> {
        self.check_field(field_desc)?;
        let item = if field_desc.is_list() {
            value.convert_to(&field_desc.kind())
        } else {
            None
        };
        match item {
            Some(item) => {
                self.fields.get_list_mut(field_desc).push(item);
                Ok(())
            }
            None => Err(SetFieldError::InvalidType {
                field: field_desc.clone(),
                value,
            }),
        }
    }

    /// Gets the number of elements in the given list field.
    ///
    /// Returns `0` if the field is unset or is not a list.
    pub fn list_len(&self, field_desc: &FieldDescriptor) -> usize {
        match self.get_field(field_desc) {
            Some(Value::List(list)) => list.len(),
            _ => 0,
        }
    }

    /// Gets the element at `index` of the given list field.
    pub fn get_list_item(&self, field_desc: &FieldDescriptor, index: usize) -> Option<&Value> {
        self.get_field(field_desc)?.as_list()?.get(index)
    }

    /// Converts `key` and `value` to the types of the given map field, and inserts them,
    /// replacing any existing entry with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`SetFieldError::NotFound`] if the field does not belong to this message type, or
    /// [`SetFieldError::InvalidType`] if the field is not a map or the key or value cannot be
    /// converted.
    pub fn insert_map_entry(
        &mut self,
        field_desc: &FieldDescriptor,
        key: MapKey,
        value: Value,
    ) -> Result<(), SetFieldError> {
        self.check_field(field_desc)?;
        let kind = field_desc.kind();
        let entry_desc = match kind.as_message() {
            Some(entry_desc) if field_desc.is_map() => entry_desc,
            _ => {
                return Err(SetFieldError::InvalidType {
                    field: field_desc.clone(),
                    value,
                })
            }
        };

        let key = match key.convert_to(&entry_desc.map_entry_key_field().kind()) {
            Some(key) => key,
            None => {
                return Err(SetFieldError::InvalidType {
                    field: field_desc.clone(),
                    value: key.into(),
                })
            }
        };
        let value = match value.convert_for_field(&entry_desc.map_entry_value_field()) {
            Some(converted) => converted,
            None => {
                return Err(SetFieldError::InvalidType {
                    field: field_desc.clone(),
                    value,
                })
            }
        };

        self.fields.get_map_mut(field_desc).insert(key, value);
        Ok(())
    }

    /// Gets the value stored under `key` in the given map field.
    ///
    /// The key is converted to the key type of the map first, as for
    /// [`insert_map_entry`][Self::insert_map_entry].
    pub fn get_map_entry(&self, field_desc: &FieldDescriptor, key: &MapKey) -> Option<&Value> {
        let map = self.get_field(field_desc)?.as_map()?;
        map.get(&map_key_for_field(field_desc, key)?)
    }

    /// Removes the entry stored under `key` in the given map field, returning its value.
    pub fn remove_map_entry(
        &mut self,
        field_desc: &FieldDescriptor,
        key: &MapKey,
    ) -> Option<Value> {
        let key = map_key_for_field(field_desc, key)?;
        self.get_field_mut(field_desc)?.as_map_mut()?.remove(&key)
    }

    /// Gets the number of entries in the given map field.
    ///
    /// Returns `0` if the field is unset or is not a map.
    pub fn map_len(&self, field_desc: &FieldDescriptor) -> usize {
        match self.get_field(field_desc) {
            Some(Value::Map(map)) => map.len(),
            _ => 0,
        }
    }

    /// Creates a new, empty message of the type of the given singular message field.
    ///
    /// The new message is not attached to this message. Returns `None` if the field is not a
    /// singular message field.
    pub fn new_nested_message(&self, field_desc: &FieldDescriptor) -> Option<DynamicMessage> {
        if field_desc.is_list() || field_desc.is_map() {
            return None;
        }
        match field_desc.kind() {
            Kind::Message(message_desc) => Some(DynamicMessage::new(message_desc)),
            _ => None,
        }
    }

    /// Sets the value of the given singular message field.
    ///
    /// # Errors
    ///
    /// Returns [`SetFieldError::NotFound`] if the field does not belong to this message type, or
    /// [`SetFieldError::InvalidType`] if the field is not a singular message field of the same
    /// type as `message`.
    pub fn set_nested_message(
        &mut self,
        field_desc: &FieldDescriptor,
        message: DynamicMessage,
    ) -> Result<(), SetFieldError> {
        self.check_field(field_desc)?;
        let is_singular = !field_desc.is_list() && !field_desc.is_map();
        if is_singular && field_desc.kind().as_message() == Some(message.descriptor()) {
            self.fields.set(field_desc, Value::Message(message));
            Ok(())
        } else {
            Err(SetFieldError::InvalidType {
                field: field_desc.clone(),
                value: Value::Message(message),
            })
        }
    }

    /// Gets the message stored in the given singular message field, or `None` if it is unset.
    pub fn get_nested_message(&self, field_desc: &FieldDescriptor) -> Option<&DynamicMessage> {
        self.get_field(field_desc)?.as_message()
    }

    /// Gets an iterator over the fields of this message which were read from the wire but are
    /// not declared by its descriptor.
    ///
    /// Each item is a field number, with the raw bytes of every occurrence of that field in the
    /// order they were read. The bytes include the field key.
    pub fn unknown_fields(&self) -> impl Iterator<Item = (u32, &'_ [Bytes])> + '_ {
        self.fields.unknown().iter()
    }

    /// Gets the raw bytes of every occurrence of the unknown field with the given number.
    pub fn unknown_field(&self, number: u32) -> Option<&[Bytes]> {
        self.fields.unknown().get(number)
    }

    /// Returns `true` if every field which is set holds a value which is valid for it, as
    /// defined by [`Value::is_valid_for_field`]. Nested messages are checked recursively.
    ///
    /// A valid message can always be encoded.
    pub fn is_valid(&self) -> bool {
        self.fields().all(|(field_desc, value)| {
            value.is_valid_for_field(&field_desc) && nested_messages_valid(value)
        })
    }

    fn check_field(&self, field_desc: &FieldDescriptor) -> Result<(), SetFieldError> {
        if field_desc.parent_message() == &self.desc {
            Ok(())
        } else {
            Err(SetFieldError::NotFound)
        }
    }
}

fn map_key_for_field(field_desc: &FieldDescriptor, key: &MapKey) -> Option<MapKey> {
    if !field_desc.is_map() {
        return None;
    }
    let kind = field_desc.kind();
    let entry_desc = kind.as_message()?;
    key.convert_to(&entry_desc.map_entry_key_field().kind())
}

fn nested_messages_valid(value: &Value) -> bool {
    match value {
        Value::Message(message) => message.is_valid(),
        Value::List(list) => list.iter().all(nested_messages_valid),
        Value::Map(map) => map.values().all(nested_messages_valid),
        _ => true,
    }
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields.values() == other.fields.values()
    }
}

impl Hash for DynamicMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.desc.hash(state);
        self.fields.values().hash(state);
    }
}

impl Value {
    /// Returns the default value for the given protobuf field.
    ///
    /// This is equivalent to [`default_value`][Value::default_value] except for the following cases:
    ///
    /// * If the field is a map, an empty map is returned.
    /// * If the field is `repeated`, an empty list is returned.
    pub fn default_value_for_field(field_desc: &FieldDescriptor) -> Self {
        if field_desc.is_list() {
            Value::List(Vec::default())
        } else if field_desc.is_map() {
            Value::Map(BTreeMap::default())
        } else {
            Value::default_value(&field_desc.kind())
        }
    }

    /// Returns the default value for the given protobuf type `kind`.
    ///
    /// Unlike [`default_value_for_field`](Value::default_value_for_field), this method does not
    /// look at field cardinality, so it will never return a list or map.
    ///
    /// Fields of kind [`Kind::Group`] or [`Kind::Unknown`] never hold a value. For those kinds an
    /// empty [`Value::Bytes`] is returned.
    pub fn default_value(kind: &Kind) -> Self {
        match kind {
            Kind::Message(desc) => Value::Message(DynamicMessage::new(desc.clone())),
            Kind::Enum(enum_ty) => Value::Enum(EnumValue::new(
                enum_ty.clone(),
                enum_ty.default_value().number(),
            )),
            Kind::Double => Value::F64(0.0),
            Kind::Float => Value::F32(0.0),
            Kind::Int32
            | Kind::Int64
            | Kind::Sint32
            | Kind::Sint64
            | Kind::Sfixed32
            | Kind::Sfixed64 => Value::I64(0),
            Kind::Uint32 | Kind::Uint64 | Kind::Fixed32 | Kind::Fixed64 => Value::U64(0),
            Kind::Bool => Value::Bool(false),
            Kind::String => Value::String(String::default()),
            Kind::Bytes | Kind::Group | Kind::Unknown => Value::Bytes(Bytes::default()),
        }
    }

    /// Returns `true` if this is the default value for the given protobuf field.
    pub fn is_default_for_field(&self, field_desc: &FieldDescriptor) -> bool {
        *self == Value::default_value_for_field(field_desc)
    }

    /// Returns the value if it is a `Value::Bool`, or `None` if it is any other type.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::Bool`, or `None` if it is any other type.
    pub fn as_bool_mut(&mut self) -> Option<&mut bool> {
        match self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::I64`, or `None` if it is any other type.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::I64`, or `None` if it is any other type.
    pub fn as_i64_mut(&mut self) -> Option<&mut i64> {
        match self {
            Value::I64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::U64`, or `None` if it is any other type.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::U64`, or `None` if it is any other type.
    pub fn as_u64_mut(&mut self) -> Option<&mut u64> {
        match self {
            Value::U64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::F32`, or `None` if it is any other type.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::F32(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::F64`, or `None` if it is any other type.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::String`, or `None` if it is any other type.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::String`, or `None` if it is any other type.
    pub fn as_string_mut(&mut self) -> Option<&mut String> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::Bytes`, or `None` if it is any other type.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::Enum`, or `None` if it is any other type.
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the number of the enum value if it is a `Value::Enum`, or `None` if it is any
    /// other type.
    pub fn as_enum_number(&self) -> Option<i32> {
        self.as_enum().map(EnumValue::number)
    }

    /// Returns the value if it is a `Value::Message`, or `None` if it is any other type.
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::Message`, or `None` if it is any other type.
    pub fn as_message_mut(&mut self) -> Option<&mut DynamicMessage> {
        match self {
            Value::Message(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::List`, or `None` if it is any other type.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::List`, or `None` if it is any other type.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `Value::Map`, or `None` if it is any other type.
    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Value::Map(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value if it is a `Value::Map`, or `None` if it is any other type.
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<MapKey, Value>> {
        match self {
            Value::Map(value) => Some(value),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I64(_) => "signed integer",
            Value::U64(_) => "unsigned integer",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Bool(value) => value.hash(state),
            Value::I64(value) => value.hash(state),
            Value::U64(value) => value.hash(state),
            // Equal values must hash equally, and -0.0 == 0.0.
            Value::F32(value) => (*value + 0.0).to_bits().hash(state),
            Value::F64(value) => (*value + 0.0).to_bits().hash(state),
            Value::String(value) => value.hash(state),
            Value::Bytes(value) => value.hash(state),
            Value::Enum(value) => value.hash(state),
            Value::Message(value) => value.hash(state),
            Value::List(value) => value.hash(state),
            Value::Map(value) => value.hash(state),
        }
    }
}

impl MapKey {
    /// Returns the default value for the given protobuf type `kind`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not a valid map key type (an integral type, bool or string).
    pub fn default_value(kind: &Kind) -> Self {
        match *kind {
            Kind::Int32
            | Kind::Int64
            | Kind::Sint32
            | Kind::Sint64
            | Kind::Sfixed32
            | Kind::Sfixed64 => MapKey::I64(0),
            Kind::Uint32 | Kind::Uint64 | Kind::Fixed32 | Kind::Fixed64 => MapKey::U64(0),
            Kind::Bool => MapKey::Bool(false),
            Kind::String => MapKey::String(String::default()),
            _ => panic!("invalid type for map key"),
        }
    }

    /// Returns the value if it is a `MapKey::Bool`, or `None` if it is any other type.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            MapKey::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `MapKey::I64`, or `None` if it is any other type.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            MapKey::I64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `MapKey::U64`, or `None` if it is any other type.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            MapKey::U64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a `MapKey::String`, or `None` if it is any other type.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MapKey::String(value) => Some(value),
            _ => None,
        }
    }

    /// Converts a value to a map key, if it has one of the types that a map key can hold.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(MapKey::Bool(value)),
            Value::I64(value) => Some(MapKey::I64(value)),
            Value::U64(value) => Some(MapKey::U64(value)),
            Value::String(value) => Some(MapKey::String(value)),
            _ => None,
        }
    }
}

impl EnumValue {
    /// Creates a value of the given enum type with the number `number`.
    pub fn new(desc: EnumDescriptor, number: i32) -> Self {
        EnumValue { desc, number }
    }

    /// Gets a reference to the [`EnumDescriptor`] describing the type of this value.
    pub fn descriptor(&self) -> &EnumDescriptor {
        &self.desc
    }

    /// Gets the number of this value.
    pub fn number(&self) -> i32 {
        self.number
    }

    /// Gets the name of this value, or `None` if the enum does not declare its number.
    ///
    /// If the enum allows aliases, the name of the first declared value with this number is
    /// returned.
    pub fn name(&self) -> Option<&str> {
        self.desc.get_value_name(self.number)
    }

    /// Gets the descriptor of this value, or `None` if the enum does not declare its number.
    pub fn value_descriptor(&self) -> Option<EnumValueDescriptor> {
        self.desc.get_value(self.number)
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumValue")
            .field("enum", &self.desc.full_name())
            .field("number", &self.number)
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for SetFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetFieldError::NotFound => write!(f, "field not found"),
            SetFieldError::InvalidType { field, value } => write!(
                f,
                "cannot convert {} value to type '{:?}' for field '{}'",
                value.type_name(),
                field.kind(),
                field.full_name()
            ),
        }
    }
}

impl Error for SetFieldError {}

impl From<MapKey> for Value {
    fn from(value: MapKey) -> Self {
        match value {
            MapKey::Bool(value) => Value::Bool(value),
            MapKey::I64(value) => Value::I64(value),
            MapKey::U64(value) => Value::U64(value),
            MapKey::String(value) => Value::String(value),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I64(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::U64(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value.into())
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

impl From<DynamicMessage> for Value {
    fn from(value: DynamicMessage) -> Self {
        Value::Message(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<MapKey, Value>> for Value {
    fn from(value: BTreeMap<MapKey, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<bool> for MapKey {
    fn from(value: bool) -> Self {
        MapKey::Bool(value)
    }
}

impl From<i32> for MapKey {
    fn from(value: i32) -> Self {
        MapKey::I64(value.into())
    }
}

impl From<i64> for MapKey {
    fn from(value: i64) -> Self {
        MapKey::I64(value)
    }
}

impl From<u32> for MapKey {
    fn from(value: u32) -> Self {
        MapKey::U64(value.into())
    }
}

impl From<u64> for MapKey {
    fn from(value: u64) -> Self {
        MapKey::U64(value)
    }
}

impl From<String> for MapKey {
    fn from(value: String) -> Self {
        MapKey::String(value)
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::String(value.to_owned())
    }
}

#[test]
fn assert_dynamic_send_sync() {
    fn test_send_sync<T: Send + Sync>() {}

    test_send_sync::<DynamicMessage>();
    test_send_sync::<Value>();
    test_send_sync::<SetFieldError>();
}
