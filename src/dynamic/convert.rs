use std::convert::TryFrom;

use base64::{prelude::BASE64_STANDARD, Engine};
use prost::bytes::Bytes;

use super::{EnumValue, MapKey, Value};
use crate::{FieldDescriptor, Kind};

/// A numeric value, widened so that it can be cast to any other numeric type.
#[derive(Clone, Copy)]
enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f32),
    Double(f64),
}

impl Value {
    /// Returns `true` if this value can be set for a given field.
    ///
    /// The variant of the value must already match the field's kind. No conversions are
    /// applied:
    ///
    /// * Signed integer kinds require [`Value::I64`], and unsigned kinds require [`Value::U64`].
    ///   For 32-bit kinds the value must also fit in 32 bits.
    /// * Enum and message kinds require a value with the same descriptor.
    /// * Lists require a [`Value::List`] whose elements are each valid, and maps require a
    ///   [`Value::Map`] whose keys and values are each valid.
    ///
    /// No value is valid for a field of kind [`Kind::Group`] or [`Kind::Unknown`].
    pub fn is_valid_for_field(&self, field_desc: &FieldDescriptor) -> bool {
        match (self, field_desc.kind()) {
            (Value::List(list), kind) if field_desc.is_list() => {
                list.iter().all(|value| value.is_valid(&kind))
            }
            (Value::Map(map), Kind::Message(entry_desc)) if field_desc.is_map() => {
                let key_kind = entry_desc.map_entry_key_field().kind();
                let value_desc = entry_desc.map_entry_value_field();
                map.iter().all(|(key, value)| {
                    key.is_valid(&key_kind) && value.is_valid_for_field(&value_desc)
                })
            }
            (value, kind) if !field_desc.is_list() && !field_desc.is_map() => {
                value.is_valid(&kind)
            }
            _ => false,
        }
    }

    /// Returns `true` if this value can be encoded as the given [`Kind`].
    ///
    /// Unlike [`is_valid_for_field`](Value::is_valid_for_field), this method does not
    /// look at field cardinality, so it will never return `true` for lists or maps.
    pub fn is_valid(&self, kind: &Kind) -> bool {
        match (self, kind) {
            (Value::Bool(_), Kind::Bool)
            | (Value::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
            | (Value::U64(_), Kind::Uint64 | Kind::Fixed64)
            | (Value::F32(_), Kind::Float)
            | (Value::F64(_), Kind::Double)
            | (Value::String(_), Kind::String)
            | (Value::Bytes(_), Kind::Bytes) => true,
            (Value::I64(value), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32) => {
                i32::try_from(*value).is_ok()
            }
            (Value::U64(value), Kind::Uint32 | Kind::Fixed32) => u32::try_from(*value).is_ok(),
            (Value::Enum(value), Kind::Enum(enum_desc)) => value.descriptor() == enum_desc,
            (Value::Message(message), Kind::Message(message_desc)) => {
                message.descriptor() == message_desc
            }
            _ => false,
        }
    }

    /// Converts this value to the given [`Kind`], returning `None` if no conversion exists.
    ///
    /// * Numbers convert to any numeric kind with the semantics of an `as` cast, so values may
    ///   be truncated or rounded.
    /// * Numbers convert to `bool` only if they are exactly `0` or `1`, and booleans convert to
    ///   numbers as `0` or `1`.
    /// * Booleans and numbers convert to `string` as their text, and strings convert back if
    ///   the entire string parses as the target kind. The strings `"true"`, `"false"`, `"1"` and
    ///   `"0"` convert to `bool`.
    /// * `bytes` and `string` convert to each other through standard base64.
    /// * Enum values convert to integer kinds as their number, and to `string` as their name.
    ///   Integers and names convert to enum values.
    /// * Messages convert only to their own type.
    ///
    /// A value which is already valid for `kind` is returned unchanged.
    pub fn convert_to(&self, kind: &Kind) -> Option<Value> {
        if self.is_valid(kind) {
            return Some(self.clone());
        }

        match kind {
            Kind::Double => match self {
                Value::String(text) => text.parse::<f64>().ok().map(Value::F64),
                _ => self.to_number().map(|n| Value::F64(n.to_f64())),
            },
            Kind::Float => match self {
                Value::String(text) => text.parse::<f32>().ok().map(Value::F32),
                _ => self.to_number().map(|n| Value::F32(n.to_f32())),
            },
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => match self {
                Value::String(text) => text.parse::<i32>().ok().map(|n| Value::I64(n.into())),
                _ => self.to_integer().map(|n| Value::I64(n.to_i32().into())),
            },
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => match self {
                Value::String(text) => text.parse::<i64>().ok().map(Value::I64),
                _ => self.to_integer().map(|n| Value::I64(n.to_i64())),
            },
            Kind::Uint32 | Kind::Fixed32 => match self {
                Value::String(text) => text.parse::<u32>().ok().map(|n| Value::U64(n.into())),
                _ => self.to_integer().map(|n| Value::U64(n.to_u32().into())),
            },
            Kind::Uint64 | Kind::Fixed64 => match self {
                Value::String(text) => text.parse::<u64>().ok().map(Value::U64),
                _ => self.to_integer().map(|n| Value::U64(n.to_u64())),
            },
            Kind::Bool => match self {
                Value::String(text) => match text.as_str() {
                    "true" | "1" => Some(Value::Bool(true)),
                    "false" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => {
                    let n = self.to_number()?.to_f64();
                    if n == 0.0 {
                        Some(Value::Bool(false))
                    } else if n == 1.0 {
                        Some(Value::Bool(true))
                    } else {
                        None
                    }
                }
            },
            Kind::String => match self {
                Value::Bool(value) => Some(Value::String(value.to_string())),
                Value::I64(value) => Some(Value::String(value.to_string())),
                Value::U64(value) => Some(Value::String(value.to_string())),
                Value::F32(value) => Some(Value::String(value.to_string())),
                Value::F64(value) => Some(Value::String(value.to_string())),
                Value::Bytes(value) => Some(Value::String(BASE64_STANDARD.encode(value))),
                Value::Enum(value) => value.name().map(|name| Value::String(name.to_owned())),
                _ => None,
            },
            Kind::Bytes => match self {
                Value::String(text) => BASE64_STANDARD
                    .decode(text)
                    .ok()
                    .map(|bytes| Value::Bytes(Bytes::from(bytes))),
                _ => None,
            },
            Kind::Enum(enum_desc) => {
                let number = match self {
                    Value::I64(value) => i32::try_from(*value).ok()?,
                    Value::U64(value) => i32::try_from(*value).ok()?,
                    Value::String(name) => enum_desc.get_value_by_name(name)?.number(),
                    _ => return None,
                };
                Some(Value::Enum(EnumValue::new(enum_desc.clone(), number)))
            }
            Kind::Message(_) | Kind::Group | Kind::Unknown => None,
        }
    }

    /// Converts this value to the type of the given field, returning `None` if no conversion
    /// exists.
    ///
    /// Singular fields are converted with [`convert_to`](Value::convert_to). For list fields
    /// the value must be a [`Value::List`], and each element is converted. For map fields the
    /// value must be a [`Value::Map`], and each key and value is converted.
    pub fn convert_for_field(&self, field_desc: &FieldDescriptor) -> Option<Value> {
        let kind = field_desc.kind();
        if field_desc.is_map() {
            let entry_desc = kind.as_message()?;
            let key_kind = entry_desc.map_entry_key_field().kind();
            let value_desc = entry_desc.map_entry_value_field();
            let map = self.as_map()?;
            map.iter()
                .map(|(key, value)| {
                    Some((
                        key.convert_to(&key_kind)?,
                        value.convert_for_field(&value_desc)?,
                    ))
                })
                .collect::<Option<_>>()
                .map(Value::Map)
        } else if field_desc.is_list() {
            let list = self.as_list()?;
            list.iter()
                .map(|value| value.convert_to(&kind))
                .collect::<Option<_>>()
                .map(Value::List)
        } else {
            self.convert_to(&kind)
        }
    }

    fn to_number(&self) -> Option<Number> {
        match *self {
            Value::Bool(value) => Some(Number::Unsigned(value.into())),
            Value::I64(value) => Some(Number::Signed(value)),
            Value::U64(value) => Some(Number::Unsigned(value)),
            Value::F32(value) => Some(Number::Float(value)),
            Value::F64(value) => Some(Number::Double(value)),
            _ => None,
        }
    }

    /// Like `to_number`, but also accepts enum values as their number.
    fn to_integer(&self) -> Option<Number> {
        match self {
            Value::Enum(value) => Some(Number::Signed(value.number().into())),
            _ => self.to_number(),
        }
    }
}

impl MapKey {
    /// Returns `true` if this map key can be used for a map with the given key type.
    pub fn is_valid(&self, kind: &Kind) -> bool {
        match (self, kind) {
            (MapKey::Bool(_), Kind::Bool)
            | (MapKey::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
            | (MapKey::U64(_), Kind::Uint64 | Kind::Fixed64)
            | (MapKey::String(_), Kind::String) => true,
            (MapKey::I64(value), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32) => {
                i32::try_from(*value).is_ok()
            }
            (MapKey::U64(value), Kind::Uint32 | Kind::Fixed32) => u32::try_from(*value).is_ok(),
            _ => false,
        }
    }

    /// Converts this key to the given key type, as for [`Value::convert_to`].
    pub fn convert_to(&self, kind: &Kind) -> Option<MapKey> {
        if self.is_valid(kind) {
            return Some(self.clone());
        }

        MapKey::from_value(Value::from(self.clone()).convert_to(kind)?)
    }
}

impl Number {
    fn to_i32(self) -> i32 {
        match self {
            Number::Signed(n) => n as i32,
            Number::Unsigned(n) => n as i32,
            Number::Float(n) => n as i32,
            Number::Double(n) => n as i32,
        }
    }

    fn to_i64(self) -> i64 {
        match self {
            Number::Signed(n) => n,
            Number::Unsigned(n) => n as i64,
            Number::Float(n) => n as i64,
            Number::Double(n) => n as i64,
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            Number::Signed(n) => n as u32,
            Number::Unsigned(n) => n as u32,
            Number::Float(n) => n as u32,
            Number::Double(n) => n as u32,
        }
    }

    fn to_u64(self) -> u64 {
        match self {
            Number::Signed(n) => n as u64,
            Number::Unsigned(n) => n,
            Number::Float(n) => n as u64,
            Number::Double(n) => n as u64,
        }
    }

    fn to_f32(self) -> f32 {
        match self {
            Number::Signed(n) => n as f32,
            Number::Unsigned(n) => n as f32,
            Number::Float(n) => n,
            Number::Double(n) => n as f32,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Signed(n) => n as f64,
            Number::Unsigned(n) => n as f64,
            Number::Float(n) => n.into(),
            Number::Double(n) => n,
        }
    }
}
