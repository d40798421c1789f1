//! Low-level primitives of the protobuf binary wire format.
//!
//! These functions are stateless and operate directly on [`Buf`] and [`BufMut`]. They are
//! used by [`DynamicMessage`][crate::DynamicMessage] to encode and decode messages, but are
//! exposed for callers who need to frame or inspect raw protobuf data.

mod error;

pub use self::error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};

use std::convert::TryFrom;

use prost::bytes::{Buf, BufMut};

/// The smallest valid field number.
pub const MIN_FIELD_NUMBER: u32 = 1;
/// The largest valid field number.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// The maximum number of bytes in an encoded varint.
pub const MAX_VARINT_LEN: usize = 10;

/// The default limit on how deeply nested messages and groups may be when decoding.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// The 3-bit code in a field key describing how the field value is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// A LEB128-encoded integer.
    Varint = 0,
    /// Eight little-endian bytes.
    SixtyFourBit = 1,
    /// A varint length followed by that many bytes.
    LengthDelimited = 2,
    /// The start of a (deprecated) group.
    StartGroup = 3,
    /// The end of a (deprecated) group.
    EndGroup = 4,
    /// Four little-endian bytes.
    ThirtyTwoBit = 5,
}

impl TryFrom<u64> for WireType {
    type Error = DecodeError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::SixtyFourBit),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::ThirtyTwoBit),
            _ => Err(DecodeError::new(DecodeErrorKind::InvalidWireType(
                value as u8,
            ))),
        }
    }
}

/// Tracks the nesting depth while decoding, so that adversarial input cannot exhaust the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeContext {
    recurse_count: u32,
}

impl Default for DecodeContext {
    fn default() -> Self {
        DecodeContext::new(DEFAULT_RECURSION_LIMIT)
    }
}

impl DecodeContext {
    /// Creates a context which allows at most `recursion_limit` levels of nesting.
    pub fn new(recursion_limit: u32) -> Self {
        DecodeContext {
            recurse_count: recursion_limit,
        }
    }

    /// Returns the context for decoding one level deeper, or an error if the limit is reached.
    pub fn enter_recursion(&self) -> Result<DecodeContext, DecodeError> {
        match self.recurse_count.checked_sub(1) {
            Some(recurse_count) => Ok(DecodeContext { recurse_count }),
            None => Err(DecodeError::new(DecodeErrorKind::RecursionLimitReached)),
        }
    }
}

/// Encodes an integer as a LEB128 varint: seven bits per byte, least significant group first,
/// with the high bit set on every byte except the last.
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Decodes a LEB128 varint.
///
/// Fails if the input ends before the final byte, if the encoding is longer than
/// [`MAX_VARINT_LEN`] bytes, or if the value overflows 64 bits.
pub fn decode_varint(buf: &mut impl Buf) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    for count in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(DecodeError::new(DecodeErrorKind::InvalidVarint));
        }

        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7F) << (count * 7);
        if byte < 0x80 {
            // The tenth byte may only contribute the single remaining bit.
            if count == MAX_VARINT_LEN - 1 && byte > 0x01 {
                return Err(DecodeError::new(DecodeErrorKind::InvalidVarint));
            }
            return Ok(value);
        }
    }

    Err(DecodeError::new(DecodeErrorKind::InvalidVarint))
}

/// Decodes a varint from the start of `bytes`, returning the value and the number of bytes read.
pub fn decode_varint_slice(bytes: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut buf = bytes;
    let value = decode_varint(&mut buf)?;
    Ok((value, bytes.len() - buf.len()))
}

/// Returns the number of bytes needed to encode `value` as a varint.
pub fn encoded_len_varint(value: u64) -> usize {
    // Based on [VarintSize64][1].
    // [1]: https://github.com/google/protobuf/blob/3.3.x/src/google/protobuf/io/coded_stream.h#L1301-L1309
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

/// Maps a signed 32-bit integer to an unsigned one, so that values of small magnitude stay small.
pub fn encode_zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// The inverse of [`encode_zigzag32`].
pub fn decode_zigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ (-((value & 1) as i32))
}

/// Maps a signed 64-bit integer to an unsigned one, so that values of small magnitude stay small.
pub fn encode_zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// The inverse of [`encode_zigzag64`].
pub fn decode_zigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ (-((value & 1) as i64))
}

/// Decodes four little-endian bytes.
pub fn decode_fixed32(buf: &mut impl Buf) -> Result<u32, DecodeError> {
    check_remaining(buf, 4)?;
    Ok(buf.get_u32_le())
}

/// Decodes eight little-endian bytes.
pub fn decode_fixed64(buf: &mut impl Buf) -> Result<u64, DecodeError> {
    check_remaining(buf, 8)?;
    Ok(buf.get_u64_le())
}

/// Encodes a field key: the field number shifted left three bits, combined with the wire type.
pub fn encode_key(number: u32, wire_type: WireType, buf: &mut impl BufMut) {
    debug_assert!((MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(&number));
    encode_varint((u64::from(number) << 3) | wire_type as u64, buf);
}

/// Decodes a field key into its field number and wire type.
pub fn decode_key(buf: &mut impl Buf) -> Result<(u32, WireType), DecodeError> {
    let key = decode_varint(buf)?;
    if key > u64::from(u32::MAX) {
        return Err(DecodeError::new(DecodeErrorKind::InvalidKey));
    }

    let wire_type = WireType::try_from(key & 0x07)?;
    let number = key >> 3;
    if number < u64::from(MIN_FIELD_NUMBER) || number > u64::from(MAX_FIELD_NUMBER) {
        return Err(DecodeError::new(DecodeErrorKind::InvalidFieldNumber(
            number,
        )));
    }

    Ok((number as u32, wire_type))
}

/// Returns the number of bytes needed to encode the key for a field with number `number`.
pub fn key_len(number: u32) -> usize {
    encoded_len_varint(u64::from(number) << 3)
}

/// Decodes the length prefix of a length-delimited value, checking it against the remaining input.
pub fn decode_length(buf: &mut impl Buf) -> Result<usize, DecodeError> {
    let len = decode_varint(buf)?;
    if len > buf.remaining() as u64 {
        return Err(DecodeError::new(DecodeErrorKind::UnexpectedEof));
    }
    Ok(len as usize)
}

/// Consumes the value of a field with the given key, discarding it.
///
/// Groups are skipped recursively, up to the end-group tag with the same field number.
pub fn skip_field(
    wire_type: WireType,
    number: u32,
    buf: &mut impl Buf,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
        }
        WireType::SixtyFourBit => advance(buf, 8)?,
        WireType::ThirtyTwoBit => advance(buf, 4)?,
        WireType::LengthDelimited => {
            let len = decode_length(buf)?;
            buf.advance(len);
        }
        WireType::StartGroup => skip_group(number, buf, ctx.enter_recursion()?)?,
        WireType::EndGroup => {
            return Err(DecodeError::new(DecodeErrorKind::UnexpectedEndGroup(
                number,
            )))
        }
    }
    Ok(())
}

fn skip_group(number: u32, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), DecodeError> {
    loop {
        if !buf.has_remaining() {
            return Err(DecodeError::new(DecodeErrorKind::UnterminatedGroup(
                number,
            )));
        }

        let (field_number, wire_type) = decode_key(buf)?;
        if wire_type == WireType::EndGroup {
            if field_number != number {
                return Err(DecodeError::new(DecodeErrorKind::UnexpectedEndGroup(
                    field_number,
                )));
            }
            return Ok(());
        }

        skip_field(wire_type, field_number, buf, ctx)?;
    }
}

fn advance(buf: &mut impl Buf, len: usize) -> Result<(), DecodeError> {
    check_remaining(buf, len)?;
    buf.advance(len);
    Ok(())
}

fn check_remaining(buf: &impl Buf, len: usize) -> Result<(), DecodeError> {
    if buf.remaining() < len {
        Err(DecodeError::new(DecodeErrorKind::UnexpectedEof))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint_bytes(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        buf
    }

    #[test]
    fn varint_known_values() {
        assert_eq!(varint_bytes(0), [0x00]);
        assert_eq!(varint_bytes(1), [0x01]);
        assert_eq!(varint_bytes(127), [0x7F]);
        assert_eq!(varint_bytes(128), [0x80, 0x01]);
        assert_eq!(varint_bytes(300), [0xAC, 0x02]);
        assert_eq!(
            varint_bytes(u64::MAX),
            [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
    }

    #[test]
    fn varint_len_is_minimal() {
        for shift in 0..64 {
            let value = 1u64 << shift;
            assert_eq!(encoded_len_varint(value), varint_bytes(value).len());
            assert_eq!(encoded_len_varint(value - 1), varint_bytes(value - 1).len());
        }
    }

    #[test]
    fn varint_decode_reports_consumed() {
        assert_eq!(decode_varint_slice(&[0xAC, 0x02, 0xFF]).unwrap(), (300, 2));
    }

    #[test]
    fn varint_truncated() {
        let err = decode_varint_slice(&[0x80, 0x80]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidVarint);
        let err = decode_varint_slice(&[]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidVarint);
    }

    #[test]
    fn varint_too_long() {
        let err = decode_varint_slice(&[0xFF; 11]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidVarint);

        let err = decode_varint_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02])
            .unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidVarint);
    }

    #[test]
    fn zigzag_known_values() {
        assert_eq!(encode_zigzag32(0), 0);
        assert_eq!(encode_zigzag32(-1), 1);
        assert_eq!(encode_zigzag32(1), 2);
        assert_eq!(encode_zigzag32(-2), 3);
        assert_eq!(encode_zigzag32(2), 4);
        assert_eq!(encode_zigzag32(i32::MAX), u32::MAX - 1);
        assert_eq!(encode_zigzag32(i32::MIN), u32::MAX);

        assert_eq!(encode_zigzag64(-1), 1);
        assert_eq!(encode_zigzag64(i64::MAX), u64::MAX - 1);
        assert_eq!(encode_zigzag64(i64::MIN), u64::MAX);
        assert_eq!(decode_zigzag64(u64::MAX), i64::MIN);
        assert_eq!(decode_zigzag32(3), -2);
    }

    #[test]
    fn key_round_trip() {
        let mut buf = Vec::new();
        encode_key(1, WireType::Varint, &mut buf);
        assert_eq!(buf, [0x08]);

        encode_key(MAX_FIELD_NUMBER, WireType::ThirtyTwoBit, &mut buf);
        let mut slice = buf.as_slice();
        assert_eq!(decode_key(&mut slice).unwrap(), (1, WireType::Varint));
        assert_eq!(
            decode_key(&mut slice).unwrap(),
            (MAX_FIELD_NUMBER, WireType::ThirtyTwoBit)
        );
        assert_eq!(key_len(MAX_FIELD_NUMBER), 5);
    }

    #[test]
    fn key_invalid() {
        assert_eq!(
            decode_key(&mut &[0x00u8][..]).unwrap_err().kind(),
            DecodeErrorKind::InvalidFieldNumber(0)
        );
        assert_eq!(
            decode_key(&mut &[0x0Eu8][..]).unwrap_err().kind(),
            DecodeErrorKind::InvalidWireType(6)
        );
    }

    #[test]
    fn length_exceeds_input() {
        let err = decode_length(&mut &[0x05, b'a', b'b'][..]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedEof);
    }

    #[test]
    fn skip_nested_groups() {
        // field 1 start group, field 2 start group, field 3 varint 1, end 2, end 1, then 0x10
        let data = [0x0B, 0x13, 0x18, 0x01, 0x14, 0x0C, 0x10];
        let mut buf = &data[..];
        let (number, wire_type) = decode_key(&mut buf).unwrap();
        skip_field(wire_type, number, &mut buf, DecodeContext::default()).unwrap();
        assert_eq!(buf, &[0x10u8][..]);
    }

    #[test]
    fn skip_group_mismatched_end() {
        let data = [0x0B, 0x14];
        let mut buf = &data[..];
        let (number, wire_type) = decode_key(&mut buf).unwrap();
        let err = skip_field(wire_type, number, &mut buf, DecodeContext::default()).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedEndGroup(2));
    }

    #[test]
    fn skip_group_unterminated() {
        let data = [0x0B, 0x18, 0x01];
        let mut buf = &data[..];
        let (number, wire_type) = decode_key(&mut buf).unwrap();
        let err = skip_field(wire_type, number, &mut buf, DecodeContext::default()).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnterminatedGroup(1));
    }

    #[test]
    fn skip_group_recursion_limit() {
        let mut data = Vec::new();
        for _ in 0..5 {
            encode_key(1, WireType::StartGroup, &mut data);
        }
        for _ in 0..5 {
            encode_key(1, WireType::EndGroup, &mut data);
        }

        let mut buf = data.as_slice();
        let (number, wire_type) = decode_key(&mut buf).unwrap();
        let err = skip_field(wire_type, number, &mut buf, DecodeContext::new(3)).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::RecursionLimitReached);

        let mut buf = data.as_slice();
        let (number, wire_type) = decode_key(&mut buf).unwrap();
        skip_field(wire_type, number, &mut buf, DecodeContext::new(5)).unwrap();
        assert!(buf.is_empty());
    }
}
