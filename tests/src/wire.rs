use proptest::prelude::*;
use prost::bytes::Buf;
use protodyn::encoding::{
    decode_key, decode_varint, decode_varint_slice, decode_zigzag32, decode_zigzag64,
    encode_key, encode_varint, encode_zigzag32, encode_zigzag64, encoded_len_varint, key_len,
    DecodeErrorKind, WireType, MAX_FIELD_NUMBER, MAX_VARINT_LEN,
};

#[test]
fn varint_known_values() {
    let encode = |value: u64| {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        buf
    };
    assert_eq!(encode(0), [0x00]);
    assert_eq!(encode(1), [0x01]);
    assert_eq!(encode(127), [0x7F]);
    assert_eq!(encode(128), [0x80, 0x01]);
    assert_eq!(encode(300), [0xAC, 0x02]);
    assert_eq!(encode(u64::MAX).len(), MAX_VARINT_LEN);
}

#[test]
fn zigzag_known_values() {
    assert_eq!(encode_zigzag32(0), 0);
    assert_eq!(encode_zigzag32(-1), 1);
    assert_eq!(encode_zigzag32(1), 2);
    assert_eq!(encode_zigzag32(-2), 3);
    assert_eq!(encode_zigzag32(i32::MIN), u32::MAX);
    assert_eq!(encode_zigzag64(i64::MIN), u64::MAX);
}

#[test]
fn varint_errors() {
    let mut empty: &[u8] = &[];
    assert_eq!(
        decode_varint(&mut empty).unwrap_err().kind(),
        DecodeErrorKind::InvalidVarint
    );

    let mut truncated: &[u8] = &[0x80, 0x80];
    assert_eq!(
        decode_varint(&mut truncated).unwrap_err().kind(),
        DecodeErrorKind::InvalidVarint
    );

    let overlong = [0xFF; 11];
    assert_eq!(
        decode_varint_slice(&overlong).unwrap_err().kind(),
        DecodeErrorKind::InvalidVarint
    );
}

#[test]
fn key_errors() {
    let mut zero: &[u8] = &[0x00];
    assert_eq!(
        decode_key(&mut zero).unwrap_err().kind(),
        DecodeErrorKind::InvalidFieldNumber(0)
    );

    let mut bad_wire_type: &[u8] = &[0x0E];
    assert_eq!(
        decode_key(&mut bad_wire_type).unwrap_err().kind(),
        DecodeErrorKind::InvalidWireType(6)
    );
}

proptest! {
    #[test]
    fn varint_round_trip(value in any::<u64>(), trailing in prop::collection::vec(any::<u8>(), 0..4)) {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        prop_assert_eq!(buf.len(), encoded_len_varint(value));
        buf.extend_from_slice(&trailing);

        let mut slice = buf.as_slice();
        prop_assert_eq!(decode_varint(&mut slice).unwrap(), value);
        prop_assert_eq!(slice, trailing.as_slice());

        prop_assert_eq!(
            decode_varint_slice(&buf).unwrap(),
            (value, encoded_len_varint(value))
        );
    }

    #[test]
    fn zigzag_round_trip(a: i32, b: i64) {
        prop_assert_eq!(decode_zigzag32(encode_zigzag32(a)), a);
        prop_assert_eq!(decode_zigzag64(encode_zigzag64(b)), b);
    }

    #[test]
    fn key_round_trip(number in 1..=MAX_FIELD_NUMBER, wire_type in 0u8..6) {
        let wire_type = match wire_type {
            0 => WireType::Varint,
            1 => WireType::SixtyFourBit,
            2 => WireType::LengthDelimited,
            3 => WireType::StartGroup,
            4 => WireType::EndGroup,
            _ => WireType::ThirtyTwoBit,
        };
        let mut buf = Vec::new();
        encode_key(number, wire_type, &mut buf);
        prop_assert_eq!(buf.len(), key_len(number));

        let mut slice = buf.as_slice();
        prop_assert_eq!(decode_key(&mut slice).unwrap(), (number, wire_type));
        prop_assert!(!slice.has_remaining());
    }
}
