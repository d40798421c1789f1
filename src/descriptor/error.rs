use std::fmt;

/// An error that may occur while building a [`DescriptorPool`][crate::DescriptorPool].
///
/// A single build may find several problems. All of them are recorded; the [`Display`][fmt::Display]
/// implementation shows the first, and the remainder are available through
/// [`miette::Diagnostic::related`] when the `miette` feature is enabled.
#[derive(Debug)]
pub struct DescriptorError {
    inner: Box<[DescriptorErrorKind]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DescriptorErrorKind {
    DuplicateName {
        name: String,
    },
    InvalidFieldNumber {
        number: u32,
        field: String,
    },
    ReservedFieldNumber {
        number: u32,
        field: String,
    },
    DuplicateFieldNumber {
        number: u32,
        first: String,
        second: String,
    },
    DuplicateFieldName {
        name: String,
        message: String,
    },
    NameNotFound {
        name: String,
        field: String,
    },
    InvalidType {
        name: String,
        expected: &'static str,
        field: String,
    },
    InvalidMapKeyType {
        kind: String,
        field: String,
    },
    InvalidOneofField {
        field: String,
        oneof: String,
    },
    EmptyEnum {
        name: String,
    },
    DuplicateEnumValueName {
        name: String,
        enum_name: String,
    },
    DuplicateEnumNumber {
        number: i32,
        first: String,
        second: String,
    },
}

impl DescriptorError {
    pub(super) fn new(errors: Vec<DescriptorErrorKind>) -> DescriptorError {
        debug_assert!(!errors.is_empty());
        DescriptorError {
            inner: errors.into(),
        }
    }

    /// The full name of the definition at which the first error was found, e.g. `my.package.MyMessage.my_field`.
    pub fn location(&self) -> &str {
        self.first().location()
    }

    /// The number of problems found while building the pool.
    pub fn error_count(&self) -> usize {
        self.inner.len()
    }

    #[cfg(test)]
    pub(super) fn kinds(&self) -> &[DescriptorErrorKind] {
        &self.inner
    }

    fn first(&self) -> &DescriptorErrorKind {
        &self.inner[0]
    }
}

impl std::error::Error for DescriptorError {}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.first().fmt(f)
    }
}

#[cfg(feature = "miette")]
#[cfg_attr(docsrs, doc(cfg(feature = "miette")))]
impl miette::Diagnostic for DescriptorError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.first().code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.first().help()
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn miette::Diagnostic> + 'a>> {
        if self.inner.len() > 1 {
            Some(Box::new(
                self.inner
                    .iter()
                    .map(|e| e as &dyn miette::Diagnostic)
                    .skip(1),
            ))
        } else {
            None
        }
    }
}

impl DescriptorErrorKind {
    fn location(&self) -> &str {
        match self {
            DescriptorErrorKind::DuplicateName { name } => name,
            DescriptorErrorKind::InvalidFieldNumber { field, .. } => field,
            DescriptorErrorKind::ReservedFieldNumber { field, .. } => field,
            DescriptorErrorKind::DuplicateFieldNumber { second, .. } => second,
            DescriptorErrorKind::DuplicateFieldName { message, .. } => message,
            DescriptorErrorKind::NameNotFound { field, .. } => field,
            DescriptorErrorKind::InvalidType { field, .. } => field,
            DescriptorErrorKind::InvalidMapKeyType { field, .. } => field,
            DescriptorErrorKind::InvalidOneofField { field, .. } => field,
            DescriptorErrorKind::EmptyEnum { name } => name,
            DescriptorErrorKind::DuplicateEnumValueName { enum_name, .. } => enum_name,
            DescriptorErrorKind::DuplicateEnumNumber { second, .. } => second,
        }
    }
}

impl std::error::Error for DescriptorErrorKind {}

impl fmt::Display for DescriptorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorErrorKind::DuplicateName { name } => {
                write!(f, "name '{}' is defined twice", name)
            }
            DescriptorErrorKind::InvalidFieldNumber { number, field } => {
                write!(f, "invalid number '{}' for field '{}'", number, field)
            }
            DescriptorErrorKind::ReservedFieldNumber { number, field } => write!(
                f,
                "number '{}' for field '{}' is reserved for the protobuf implementation",
                number, field
            ),
            DescriptorErrorKind::DuplicateFieldNumber {
                number,
                first,
                second,
            } => write!(
                f,
                "field number '{}' of '{}' is already used by '{}'",
                number, second, first
            ),
            DescriptorErrorKind::DuplicateFieldName { name, message } => {
                write!(f, "a field named '{}' is already defined in '{}'", name, message)
            }
            DescriptorErrorKind::NameNotFound { name, field } => {
                write!(f, "name '{}' used by field '{}' is not defined", name, field)
            }
            DescriptorErrorKind::InvalidType {
                name,
                expected,
                field,
            } => write!(
                f,
                "'{}' used by field '{}' is not {}",
                name, field, expected
            ),
            DescriptorErrorKind::InvalidMapKeyType { kind, field } => write!(
                f,
                "'{}' is not a valid key type for map field '{}'",
                kind, field
            ),
            DescriptorErrorKind::InvalidOneofField { field, oneof } => write!(
                f,
                "repeated field '{}' cannot be a member of oneof '{}'",
                field, oneof
            ),
            DescriptorErrorKind::EmptyEnum { name } => {
                write!(f, "enum '{}' must have at least one value", name)
            }
            DescriptorErrorKind::DuplicateEnumValueName { name, enum_name } => write!(
                f,
                "a value named '{}' is already defined in enum '{}'",
                name, enum_name
            ),
            DescriptorErrorKind::DuplicateEnumNumber {
                number,
                first,
                second,
            } => write!(
                f,
                "enum number '{}' of '{}' is already used by '{}'",
                number, second, first
            ),
        }
    }
}

#[cfg(feature = "miette")]
#[cfg_attr(docsrs, doc(cfg(feature = "miette")))]
impl miette::Diagnostic for DescriptorErrorKind {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            DescriptorErrorKind::DuplicateName { .. } => "protodyn::duplicate_name",
            DescriptorErrorKind::InvalidFieldNumber { .. } => "protodyn::invalid_field_number",
            DescriptorErrorKind::ReservedFieldNumber { .. } => "protodyn::reserved_field_number",
            DescriptorErrorKind::DuplicateFieldNumber { .. } => "protodyn::duplicate_field_number",
            DescriptorErrorKind::DuplicateFieldName { .. } => "protodyn::duplicate_field_name",
            DescriptorErrorKind::NameNotFound { .. } => "protodyn::name_not_found",
            DescriptorErrorKind::InvalidType { .. } => "protodyn::invalid_type",
            DescriptorErrorKind::InvalidMapKeyType { .. } => "protodyn::invalid_map_key_type",
            DescriptorErrorKind::InvalidOneofField { .. } => "protodyn::invalid_oneof_field",
            DescriptorErrorKind::EmptyEnum { .. } => "protodyn::empty_enum",
            DescriptorErrorKind::DuplicateEnumValueName { .. } => {
                "protodyn::duplicate_enum_value_name"
            }
            DescriptorErrorKind::DuplicateEnumNumber { .. } => "protodyn::duplicate_enum_number",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            DescriptorErrorKind::InvalidFieldNumber { .. } => Some(Box::new(
                "field numbers must be between 1 and 536,870,911",
            )),
            DescriptorErrorKind::ReservedFieldNumber { .. } => Some(Box::new(
                "field numbers 19,000 through 19,999 are reserved",
            )),
            DescriptorErrorKind::NameNotFound { .. } => Some(Box::new(
                "names are resolved relative to the enclosing message, then outwards; prefix the name with '.' to make it fully qualified",
            )),
            DescriptorErrorKind::InvalidMapKeyType { .. } => Some(Box::new(
                "map keys must be an integer type, bool or string",
            )),
            DescriptorErrorKind::DuplicateEnumNumber { .. } => Some(Box::new(
                "call 'allow_alias(true)' on the enum builder to permit re-using enum numbers",
            )),
            _ => None,
        }
    }
}
