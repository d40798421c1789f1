use std::{error::Error, fmt, str};

use prost::bytes::{Buf, BufMut, Bytes};

use super::{DecodeOptions, DynamicMessage, EnumValue, MapKey, Value};
use crate::{
    descriptor::{MAP_ENTRY_KEY_NUMBER, MAP_ENTRY_VALUE_NUMBER},
    encoding::{
        decode_fixed32, decode_fixed64, decode_key, decode_length, decode_varint,
        decode_zigzag32, decode_zigzag64, encode_key, encode_varint, encode_zigzag32,
        encode_zigzag64, encoded_len_varint, key_len, skip_field, DecodeContext, DecodeError,
        DecodeErrorKind, EncodeError, WireType,
    },
    FieldDescriptor, Kind, MessageDescriptor,
};

/// An error that may occur when converting between a [`DynamicMessage`] and a statically-typed
/// [`prost::Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// The dynamic message could not be encoded.
    Encode(EncodeError),
    /// The encoded bytes could not be decoded as the target type.
    Decode(prost::DecodeError),
}

impl DynamicMessage {
    /// Encodes a single field with the given value to the buffer.
    ///
    /// Lists are encoded as one key and value per element, and are never packed. Maps are
    /// encoded as one entry message per key, and every entry contains both its key and its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not valid for the field, as defined by
    /// [`Value::is_valid_for_field`], or if the field has kind [`Kind::Group`] or
    /// [`Kind::Unknown`]. On error, `buf` may contain part of the encoding.
    pub fn encode_field(
        field_desc: &FieldDescriptor,
        value: &Value,
        buf: &mut impl BufMut,
    ) -> Result<(), EncodeError> {
        let kind = field_desc.kind();
        match (&kind, value) {
            (Kind::Message(entry_desc), Value::Map(map)) if field_desc.is_map() => {
                let key_desc = entry_desc.map_entry_key_field();
                let value_desc = entry_desc.map_entry_value_field();
                let key_kind = key_desc.kind();
                let value_kind = value_desc.kind();
                for (key, value) in map {
                    let key = Value::from(key.clone());
                    let len = value_encoded_len(&key_desc, &key_kind, &key)?
                        + value_encoded_len(&value_desc, &value_kind, value)?;

                    encode_key(field_desc.number(), WireType::LengthDelimited, buf);
                    encode_varint(len as u64, buf);
                    encode_value(&key_desc, &key_kind, &key, buf)?;
                    encode_value(&value_desc, &value_kind, value, buf)?;
                }
                Ok(())
            }
            (_, Value::List(list)) if field_desc.is_list() => {
                for value in list {
                    encode_value(field_desc, &kind, value, buf)?;
                }
                Ok(())
            }
            _ if field_desc.is_list() || field_desc.is_map() => {
                Err(type_mismatch(field_desc, &kind, value))
            }
            _ => encode_value(field_desc, &kind, value, buf),
        }
    }

    /// Encodes this message to the buffer.
    ///
    /// Set fields are written in declaration order, followed by any unknown fields exactly as
    /// they were read.
    ///
    /// # Errors
    ///
    /// Returns an error if any field cannot be encoded, as for
    /// [`encode_field`][Self::encode_field]. Nothing is written to `buf` in that case.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), EncodeError> {
        // Check every field before writing anything.
        self.encoded_len()?;
        self.encode_raw(buf)
    }

    /// Encodes this message to a newly allocated buffer.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len()?);
        self.encode_raw(&mut buf)?;
        Ok(buf)
    }

    /// Returns the length in bytes of the encoded message.
    pub fn encoded_len(&self) -> Result<usize, EncodeError> {
        let mut len = self.fields.unknown().encoded_len();
        for (field_desc, value) in self.fields() {
            len += field_encoded_len(&field_desc, value)?;
        }
        Ok(len)
    }

    fn encode_raw(&self, buf: &mut impl BufMut) -> Result<(), EncodeError> {
        for (field_desc, value) in self.fields() {
            DynamicMessage::encode_field(&field_desc, value, buf)?;
        }
        self.fields.unknown().encode(buf);
        Ok(())
    }

    /// Decodes an instance of the message type specified by the [`MessageDescriptor`] from the
    /// buffer.
    pub fn decode(desc: MessageDescriptor, buf: impl Buf) -> Result<Self, DecodeError> {
        DynamicMessage::decode_with_options(desc, buf, &DecodeOptions::default())
    }

    /// Decodes an instance of the message type specified by the [`MessageDescriptor`] from the
    /// buffer, using the given options.
    pub fn decode_with_options(
        desc: MessageDescriptor,
        buf: impl Buf,
        options: &DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let mut message = DynamicMessage::new(desc);
        message.merge_root(buf, options)?;
        Ok(message)
    }

    /// Decodes fields from the buffer and merges them into this message.
    ///
    /// Singular fields read from the buffer replace the existing value, except for message
    /// fields, which are merged recursively. Lists are appended to, and map entries are
    /// inserted.
    ///
    /// If an error is returned, this message is left unchanged.
    pub fn merge(&mut self, buf: impl Buf) -> Result<(), DecodeError> {
        self.merge_with_options(buf, &DecodeOptions::default())
    }

    /// Decodes fields from the buffer and merges them into this message, using the given
    /// options.
    ///
    /// See [`merge`][Self::merge] for more details.
    pub fn merge_with_options(
        &mut self,
        buf: impl Buf,
        options: &DecodeOptions,
    ) -> Result<(), DecodeError> {
        let mut merged = self.clone();
        merged.merge_root(buf, options)?;
        *self = merged;
        Ok(())
    }

    /// Merges the fields of a statically-typed message into this message.
    ///
    /// The message is encoded and then decoded, so it need not have the same type as this
    /// message: fields are matched by number.
    pub fn transcode_from<T>(&mut self, value: &T) -> Result<(), DecodeError>
    where
        T: prost::Message,
    {
        let buf = value.encode_to_vec();
        self.merge(buf.as_slice())
    }

    /// Converts this message to a statically-typed message, by encoding it and decoding the
    /// bytes as `T`.
    pub fn transcode_to<T>(&self) -> Result<T, TranscodeError>
    where
        T: prost::Message + Default,
    {
        let buf = self.encode_to_vec()?;
        Ok(T::decode(buf.as_slice())?)
    }

    fn merge_root(&mut self, mut buf: impl Buf, options: &DecodeOptions) -> Result<(), DecodeError> {
        let mut bytes = buf.copy_to_bytes(buf.remaining());
        let ctx = DecodeContext::new(options.recursion_limit);
        self.merge_bytes(&mut bytes, options, ctx).map_err(|err| {
            debug!(
                message = self.desc.full_name(),
                error = %err,
                "failed to decode message"
            );
            err
        })
    }

    fn merge_bytes(
        &mut self,
        buf: &mut Bytes,
        options: &DecodeOptions,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        while buf.has_remaining() {
            let start = buf.clone();
            let (number, wire_type) = decode_key(buf)?;
            if wire_type == WireType::EndGroup {
                return Err(DecodeError::new(DecodeErrorKind::UnexpectedEndGroup(
                    number,
                )));
            }

            match self.desc.get_field(number) {
                Some(field_desc) if accepts_wire_type(&field_desc, wire_type) => {
                    self.merge_field(&field_desc, wire_type, buf, options, ctx)
                        .map_err(|mut err| {
                            err.push(self.desc.full_name(), field_desc.name());
                            err
                        })?;
                }
                Some(field_desc) => {
                    debug!(
                        message = self.desc.full_name(),
                        field = field_desc.name(),
                        ?wire_type,
                        "skipping field with mismatched wire type"
                    );
                    skip_field(wire_type, field_desc.number(), buf, ctx)?;
                }
                None => {
                    skip_field(wire_type, number, buf, ctx)?;
                    if options.retain_unknown_fields {
                        let span = start.slice(..start.len() - buf.len());
                        trace!(
                            message = self.desc.full_name(),
                            number,
                            len = span.len(),
                            "captured unknown field"
                        );
                        self.fields.add_unknown(number, span);
                    }
                }
            }
        }
        Ok(())
    }

    fn merge_field(
        &mut self,
        field_desc: &FieldDescriptor,
        wire_type: WireType,
        buf: &mut Bytes,
        options: &DecodeOptions,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let kind = field_desc.kind();
        match &kind {
            Kind::Message(entry_desc) if field_desc.is_map() => {
                let mut entry_buf = decode_bytes(buf)?;
                let mut entry = DynamicMessage::new(entry_desc.clone());
                entry.merge_bytes(&mut entry_buf, options, ctx.enter_recursion()?)?;

                let key = entry
                    .fields
                    .take(MAP_ENTRY_KEY_NUMBER)
                    .and_then(MapKey::from_value)
                    .unwrap_or_else(|| {
                        MapKey::default_value(&entry_desc.map_entry_key_field().kind())
                    });
                let value = entry
                    .fields
                    .take(MAP_ENTRY_VALUE_NUMBER)
                    .unwrap_or_else(|| {
                        Value::default_value_for_field(&entry_desc.map_entry_value_field())
                    });
                self.fields.get_map_mut(field_desc).insert(key, value);
            }
            _ if field_desc.is_list() => {
                if wire_type == WireType::LengthDelimited && kind.is_packable() {
                    let mut packed = decode_bytes(buf)?;
                    let list = self.fields.get_list_mut(field_desc);
                    while packed.has_remaining() {
                        list.push(decode_value(&kind, &mut packed, options, ctx)?);
                    }
                } else {
                    let value = decode_value(&kind, buf, options, ctx)?;
                    self.fields.get_list_mut(field_desc).push(value);
                }
            }
            Kind::Message(message_desc) => {
                let mut nested = decode_bytes(buf)?;
                self.fields
                    .get_message_mut(field_desc, message_desc)
                    .merge_bytes(&mut nested, options, ctx.enter_recursion()?)?;
            }
            _ => {
                let value = decode_value(&kind, buf, options, ctx)?;
                self.fields.set(field_desc, value);
            }
        }
        Ok(())
    }
}

fn accepts_wire_type(field_desc: &FieldDescriptor, wire_type: WireType) -> bool {
    let kind = field_desc.kind();
    match kind {
        Kind::Group | Kind::Unknown => false,
        _ => {
            wire_type == kind.wire_type()
                || (field_desc.is_packable() && wire_type == WireType::LengthDelimited)
        }
    }
}

fn decode_bytes(buf: &mut Bytes) -> Result<Bytes, DecodeError> {
    let len = decode_length(buf)?;
    Ok(buf.split_to(len))
}

fn decode_value(
    kind: &Kind,
    buf: &mut Bytes,
    options: &DecodeOptions,
    ctx: DecodeContext,
) -> Result<Value, DecodeError> {
    let value = match kind {
        Kind::Double => Value::F64(f64::from_bits(decode_fixed64(buf)?)),
        Kind::Float => Value::F32(f32::from_bits(decode_fixed32(buf)?)),
        Kind::Int32 => Value::I64((decode_varint(buf)? as i32).into()),
        Kind::Int64 => Value::I64(decode_varint(buf)? as i64),
        Kind::Uint32 => Value::U64((decode_varint(buf)? as u32).into()),
        Kind::Uint64 => Value::U64(decode_varint(buf)?),
        Kind::Sint32 => Value::I64(decode_zigzag32(decode_varint(buf)? as u32).into()),
        Kind::Sint64 => Value::I64(decode_zigzag64(decode_varint(buf)?)),
        Kind::Fixed32 => Value::U64(decode_fixed32(buf)?.into()),
        Kind::Fixed64 => Value::U64(decode_fixed64(buf)?),
        Kind::Sfixed32 => Value::I64((decode_fixed32(buf)? as i32).into()),
        Kind::Sfixed64 => Value::I64(decode_fixed64(buf)? as i64),
        Kind::Bool => Value::Bool(decode_varint(buf)? != 0),
        Kind::String => {
            let bytes = decode_bytes(buf)?;
            match str::from_utf8(&bytes) {
                Ok(value) => Value::String(value.to_owned()),
                Err(_) => return Err(DecodeError::new(DecodeErrorKind::InvalidUtf8)),
            }
        }
        Kind::Bytes => Value::Bytes(decode_bytes(buf)?),
        Kind::Enum(enum_desc) => {
            Value::Enum(EnumValue::new(enum_desc.clone(), decode_varint(buf)? as i32))
        }
        Kind::Message(message_desc) => {
            let mut nested = decode_bytes(buf)?;
            let mut message = DynamicMessage::new(message_desc.clone());
            message.merge_bytes(&mut nested, options, ctx.enter_recursion()?)?;
            Value::Message(message)
        }
        Kind::Group | Kind::Unknown => unreachable!("fields of kind {:?} are skipped", kind),
    };
    Ok(value)
}

fn field_encoded_len(field_desc: &FieldDescriptor, value: &Value) -> Result<usize, EncodeError> {
    let kind = field_desc.kind();
    match (&kind, value) {
        (Kind::Message(entry_desc), Value::Map(map)) if field_desc.is_map() => {
            let key_desc = entry_desc.map_entry_key_field();
            let value_desc = entry_desc.map_entry_value_field();
            let key_kind = key_desc.kind();
            let value_kind = value_desc.kind();
            let mut len = 0;
            for (key, value) in map {
                let entry_len = value_encoded_len(&key_desc, &key_kind, &key.clone().into())?
                    + value_encoded_len(&value_desc, &value_kind, value)?;
                len += key_len(field_desc.number())
                    + encoded_len_varint(entry_len as u64)
                    + entry_len;
            }
            Ok(len)
        }
        (_, Value::List(list)) if field_desc.is_list() => list
            .iter()
            .map(|value| value_encoded_len(field_desc, &kind, value))
            .sum(),
        _ if field_desc.is_list() || field_desc.is_map() => {
            Err(type_mismatch(field_desc, &kind, value))
        }
        _ => value_encoded_len(field_desc, &kind, value),
    }
}

fn encode_value(
    field_desc: &FieldDescriptor,
    kind: &Kind,
    value: &Value,
    buf: &mut impl BufMut,
) -> Result<(), EncodeError> {
    check_value(field_desc, kind, value)?;

    encode_key(field_desc.number(), kind.wire_type(), buf);
    match value {
        Value::Bool(value) => encode_varint(u64::from(*value), buf),
        Value::I64(value) => match kind {
            Kind::Sfixed32 => buf.put_i32_le(*value as i32),
            Kind::Sfixed64 => buf.put_i64_le(*value),
            _ => encode_varint(signed_varint(kind, *value), buf),
        },
        Value::U64(value) => match kind {
            Kind::Fixed32 => buf.put_u32_le(*value as u32),
            Kind::Fixed64 => buf.put_u64_le(*value),
            _ => encode_varint(*value, buf),
        },
        Value::F32(value) => buf.put_f32_le(*value),
        Value::F64(value) => buf.put_f64_le(*value),
        Value::String(value) => {
            encode_varint(value.len() as u64, buf);
            buf.put_slice(value.as_bytes());
        }
        Value::Bytes(value) => {
            encode_varint(value.len() as u64, buf);
            buf.put_slice(value);
        }
        Value::Enum(value) => encode_varint(i64::from(value.number()) as u64, buf),
        Value::Message(message) => {
            encode_varint(message.encoded_len()? as u64, buf);
            message.encode_raw(buf)?;
        }
        Value::List(_) | Value::Map(_) => return Err(type_mismatch(field_desc, kind, value)),
    }
    Ok(())
}

fn value_encoded_len(
    field_desc: &FieldDescriptor,
    kind: &Kind,
    value: &Value,
) -> Result<usize, EncodeError> {
    check_value(field_desc, kind, value)?;

    let len = match value {
        Value::Bool(_) => 1,
        Value::I64(value) => match kind {
            Kind::Sfixed32 => 4,
            Kind::Sfixed64 => 8,
            _ => encoded_len_varint(signed_varint(kind, *value)),
        },
        Value::U64(value) => match kind {
            Kind::Fixed32 => 4,
            Kind::Fixed64 => 8,
            _ => encoded_len_varint(*value),
        },
        Value::F32(_) => 4,
        Value::F64(_) => 8,
        Value::String(value) => encoded_len_varint(value.len() as u64) + value.len(),
        Value::Bytes(value) => encoded_len_varint(value.len() as u64) + value.len(),
        Value::Enum(value) => encoded_len_varint(i64::from(value.number()) as u64),
        Value::Message(message) => {
            let len = message.encoded_len()?;
            encoded_len_varint(len as u64) + len
        }
        Value::List(_) | Value::Map(_) => return Err(type_mismatch(field_desc, kind, value)),
    };
    Ok(key_len(field_desc.number()) + len)
}

/// The varint representation of a signed integer. Negative `int32` values are sign-extended to
/// ten bytes, as for `int64`.
fn signed_varint(kind: &Kind, value: i64) -> u64 {
    match kind {
        Kind::Sint32 => encode_zigzag32(value as i32).into(),
        Kind::Sint64 => encode_zigzag64(value),
        _ => value as u64,
    }
}

fn check_value(field_desc: &FieldDescriptor, kind: &Kind, value: &Value) -> Result<(), EncodeError> {
    match kind {
        Kind::Group | Kind::Unknown => Err(EncodeError::unsupported_kind(
            field_desc.full_name(),
            format!("{:?}", kind),
        )),
        _ if value.is_valid(kind) => Ok(()),
        _ => Err(type_mismatch(field_desc, kind, value)),
    }
}

fn type_mismatch(field_desc: &FieldDescriptor, kind: &Kind, value: &Value) -> EncodeError {
    let expected = if field_desc.is_map() {
        "map".to_owned()
    } else if field_desc.is_list() {
        format!("repeated {:?}", kind)
    } else {
        format!("{:?}", kind)
    };
    EncodeError::type_mismatch(field_desc.full_name(), expected, value.type_name())
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeError::Encode(_) => write!(f, "failed to encode dynamic message"),
            TranscodeError::Decode(_) => write!(f, "failed to decode transcoded message"),
        }
    }
}

impl Error for TranscodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TranscodeError::Encode(err) => Some(err),
            TranscodeError::Decode(err) => Some(err),
        }
    }
}

impl From<EncodeError> for TranscodeError {
    fn from(err: EncodeError) -> Self {
        TranscodeError::Encode(err)
    }
}

impl From<prost::DecodeError> for TranscodeError {
    fn from(err: prost::DecodeError) -> Self {
        TranscodeError::Decode(err)
    }
}
