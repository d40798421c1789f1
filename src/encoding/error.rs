use std::fmt;

/// An error that may occur while decoding a protobuf message.
///
/// Decoding is all-or-nothing: whenever this error is returned, no partially-decoded
/// message is produced.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodeError {
    inner: Box<DecodeErrorInner>,
}

#[derive(Clone, PartialEq, Eq)]
struct DecodeErrorInner {
    kind: DecodeErrorKind,
    stack: Vec<(Box<str>, Box<str>)>,
}

/// The reason a [`DecodeError`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// A varint was longer than ten bytes, or overflowed 64 bits.
    InvalidVarint,
    /// The input ended before a value was complete.
    UnexpectedEof,
    /// A field key had a value of zero, or otherwise could not be decoded.
    InvalidKey,
    /// A field key contained one of the two unassigned wire types, `6` or `7`.
    InvalidWireType(u8),
    /// A field key contained a field number outside the valid range.
    InvalidFieldNumber(u64),
    /// A `string` field contained bytes which are not valid UTF-8.
    InvalidUtf8,
    /// An end-group tag was found outside of a group.
    UnexpectedEndGroup(u32),
    /// The input ended before the end-group tag of a group.
    UnterminatedGroup(u32),
    /// Messages or groups were nested more deeply than the configured recursion limit.
    RecursionLimitReached,
}

/// An error that may occur while encoding a [`DynamicMessage`][crate::DynamicMessage].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    kind: Box<EncodeErrorKind>,
}

/// The reason an [`EncodeError`] occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeErrorKind {
    /// The value stored for a field does not have the type required by the field's kind.
    TypeMismatch {
        /// The full name of the field.
        field: String,
        /// The kind of the field.
        expected: String,
        /// The type of the value which was found.
        found: &'static str,
    },
    /// The field has a kind which cannot be encoded (`group` or an unknown kind).
    UnsupportedKind {
        /// The full name of the field.
        field: String,
        /// The kind of the field.
        kind: String,
    },
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind) -> Self {
        DecodeError {
            inner: Box::new(DecodeErrorInner {
                kind,
                stack: Vec::new(),
            }),
        }
    }

    /// Gets the reason this error occurred.
    pub fn kind(&self) -> DecodeErrorKind {
        self.inner.kind
    }

    /// Records the message and field being decoded when the error occurred.
    pub(crate) fn push(&mut self, message: &str, field: &str) {
        self.inner.stack.push((message.into(), field.into()));
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("kind", &self.inner.kind)
            .field("stack", &self.inner.stack)
            .finish()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode protobuf message: ")?;
        for (message, field) in self.inner.stack.iter().rev() {
            write!(f, "{}.{}: ", message, field)?;
        }
        self.inner.kind.fmt(f)
    }
}

impl std::error::Error for DecodeError {}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodeErrorKind::InvalidVarint => write!(f, "invalid varint"),
            DecodeErrorKind::UnexpectedEof => write!(f, "buffer underflow"),
            DecodeErrorKind::InvalidKey => write!(f, "invalid key"),
            DecodeErrorKind::InvalidWireType(value) => {
                write!(f, "invalid wire type value: {}", value)
            }
            DecodeErrorKind::InvalidFieldNumber(number) => {
                write!(f, "invalid field number: {}", number)
            }
            DecodeErrorKind::InvalidUtf8 => {
                write!(f, "invalid string value: data is not UTF-8 encoded")
            }
            DecodeErrorKind::UnexpectedEndGroup(number) => {
                write!(f, "unexpected end group tag for field {}", number)
            }
            DecodeErrorKind::UnterminatedGroup(number) => {
                write!(f, "missing end group tag for field {}", number)
            }
            DecodeErrorKind::RecursionLimitReached => write!(f, "recursion limit reached"),
        }
    }
}

impl EncodeError {
    pub(crate) fn type_mismatch(field: &str, expected: String, found: &'static str) -> Self {
        EncodeError {
            kind: Box::new(EncodeErrorKind::TypeMismatch {
                field: field.to_owned(),
                expected,
                found,
            }),
        }
    }

    pub(crate) fn unsupported_kind(field: &str, kind: String) -> Self {
        EncodeError {
            kind: Box::new(EncodeErrorKind::UnsupportedKind {
                field: field.to_owned(),
                kind,
            }),
        }
    }

    /// Gets the reason this error occurred.
    pub fn kind(&self) -> &EncodeErrorKind {
        &self.kind
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            EncodeErrorKind::TypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "cannot encode {} value for field '{}' of type '{}'",
                found, field, expected
            ),
            EncodeErrorKind::UnsupportedKind { field, kind } => write!(
                f,
                "field '{}' has type '{}', which cannot be encoded",
                field, kind
            ),
        }
    }
}

impl std::error::Error for EncodeError {}
