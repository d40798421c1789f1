mod names;
mod resolve;

use std::{borrow::Cow, fmt, iter, sync::Arc};

use crate::{
    descriptor::{Definition, DescriptorPoolInner},
    Cardinality, DescriptorError, DescriptorPool,
};

/// Builds an immutable [`DescriptorPool`] from message and enum definitions.
///
/// Type references between definitions are given as names, and are resolved when
/// [`build`][DescriptorPoolBuilder::build] is called. Names are looked up relative to the
/// message in which they are used, then each enclosing scope in turn, in the same way as the
/// protobuf compiler. A name beginning with `.` is always fully qualified.
///
/// # Examples
///
/// ```
/// # use protodyn::*;
/// let pool = DescriptorPoolBuilder::new()
///     .package("my.package")
///     .message(
///         MessageBuilder::new("Person")
///             .field(FieldBuilder::new("name", 1, FieldType::String))
///             .field(FieldBuilder::new("role", 2, FieldType::enumeration("Role")))
///             .field(FieldBuilder::map("tags", 3, FieldType::String, FieldType::Int32)),
///     )
///     .enumeration(EnumBuilder::new("Role").value("UNKNOWN", 0).value("ADMIN", 1))
///     .build()
///     .unwrap();
///
/// let person = pool.get_message_by_name("my.package.Person").unwrap();
/// assert_eq!(person.fields().len(), 3);
/// assert!(person.get_field_by_name("tags").unwrap().is_map());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DescriptorPoolBuilder {
    package: String,
    messages: Vec<MessageBuilder>,
    enums: Vec<EnumBuilder>,
}

/// A message definition to be added to a [`DescriptorPoolBuilder`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    name: String,
    fields: Vec<FieldBuilder>,
    messages: Vec<MessageBuilder>,
    enums: Vec<EnumBuilder>,
    map_entry: bool,
}

/// A field definition to be added to a [`MessageBuilder`].
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    number: u32,
    ty: FieldType,
    cardinality: Cardinality,
    oneof: Option<String>,
    map: Option<(FieldType, FieldType)>,
}

/// An enum definition to be added to a [`DescriptorPoolBuilder`] or [`MessageBuilder`].
#[derive(Debug, Clone)]
pub struct EnumBuilder {
    name: String,
    values: Vec<(String, i32)>,
    allow_alias: bool,
}

/// The type of a field in a [`FieldBuilder`].
///
/// Message and enum types are referred to by name, and resolved when the pool is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
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
    /// A reference to a message type.
    Message(String),
    /// A reference to an enum type.
    Enum(String),
    /// The deprecated protobuf `group` type.
    Group,
    /// A field whose type is not known.
    Unknown,
}

impl DescriptorPoolBuilder {
    /// Creates a new, empty [`DescriptorPoolBuilder`].
    pub fn new() -> Self {
        DescriptorPoolBuilder::default()
    }

    /// Sets the package which all top-level definitions are placed in, e.g. `my.package`.
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Adds a top-level message definition.
    pub fn message(mut self, message: MessageBuilder) -> Self {
        self.messages.push(message);
        self
    }

    /// Adds a top-level enum definition.
    pub fn enumeration(mut self, enum_: EnumBuilder) -> Self {
        self.enums.push(enum_);
        self
    }

    /// Validates all definitions and creates a [`DescriptorPool`] containing them.
    ///
    /// # Errors
    ///
    /// Returns an error describing every problem found, for example if two fields share a number, or a
    /// field refers to a type which is not defined.
    pub fn build(self) -> Result<DescriptorPool, DescriptorError> {
        let mut inner = DescriptorPoolInner {
            package: self.package.into(),
            ..Default::default()
        };
        let mut errors = Vec::new();

        let package = inner.package.clone();
        let pending = inner.collect_names(&package, self.messages, self.enums, &mut errors);
        inner.resolve_names(pending, &mut errors);

        if !errors.is_empty() {
            debug!(
                package = %inner.package,
                errors = errors.len(),
                "failed to build descriptor pool"
            );
            return Err(DescriptorError::new(errors));
        }

        debug!(
            package = %inner.package,
            messages = inner.messages.len(),
            enums = inner.enums.len(),
            "built descriptor pool"
        );
        Ok(DescriptorPool {
            inner: Arc::new(inner),
        })
    }
}

impl MessageBuilder {
    /// Creates a new message definition with the given short name, e.g. `MyMessage`.
    pub fn new(name: impl Into<String>) -> Self {
        MessageBuilder {
            name: name.into(),
            fields: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            map_entry: false,
        }
    }

    /// Adds a field to this message.
    ///
    /// Fields are encoded in the order they are added.
    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a message type nested inside this message.
    pub fn message(mut self, message: MessageBuilder) -> Self {
        self.messages.push(message);
        self
    }

    /// Adds an enum type nested inside this message.
    pub fn enumeration(mut self, enum_: EnumBuilder) -> Self {
        self.enums.push(enum_);
        self
    }
}

impl FieldBuilder {
    /// Creates a new optional field with the given name, number and type.
    pub fn new(name: impl Into<String>, number: u32, ty: FieldType) -> Self {
        FieldBuilder {
            name: name.into(),
            number,
            ty,
            cardinality: Cardinality::Optional,
            oneof: None,
            map: None,
        }
    }

    /// Creates a new map field.
    ///
    /// A nested map entry message named after the field (for example `LabelsEntry` for a field named
    /// `labels`) is added to the containing message, with the key at field number 1 and the value
    /// at field number 2.
    pub fn map(name: impl Into<String>, number: u32, key: FieldType, value: FieldType) -> Self {
        FieldBuilder {
            name: name.into(),
            number,
            ty: FieldType::Unknown,
            cardinality: Cardinality::Repeated,
            oneof: None,
            map: Some((key, value)),
        }
    }

    /// Marks this field as repeated.
    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    /// Marks this field as required.
    pub fn required(mut self) -> Self {
        self.cardinality = Cardinality::Required;
        self
    }

    /// Adds this field to the oneof with the given name.
    ///
    /// The oneof is created when the first field naming it is added to a message.
    pub fn oneof(mut self, name: impl Into<String>) -> Self {
        self.oneof = Some(name.into());
        self
    }
}

impl EnumBuilder {
    /// Creates a new enum definition with the given short name, e.g. `MyEnum`.
    pub fn new(name: impl Into<String>) -> Self {
        EnumBuilder {
            name: name.into(),
            values: Vec::new(),
            allow_alias: false,
        }
    }

    /// Adds a value to this enum. The first value added is the default.
    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push((name.into(), number));
        self
    }

    /// Permits several values of this enum to share a number.
    pub fn allow_alias(mut self, allow: bool) -> Self {
        self.allow_alias = allow;
        self
    }
}

impl FieldType {
    /// Creates a reference to the message type with the given name.
    pub fn message(name: impl Into<String>) -> Self {
        FieldType::Message(name.into())
    }

    /// Creates a reference to the enum type with the given name.
    pub fn enumeration(name: impl Into<String>) -> Self {
        FieldType::Enum(name.into())
    }

    fn is_valid_map_key(&self) -> bool {
        matches!(
            self,
            FieldType::Int32
                | FieldType::Int64
                | FieldType::Uint32
                | FieldType::Uint64
                | FieldType::Sint32
                | FieldType::Sint64
                | FieldType::Fixed32
                | FieldType::Fixed64
                | FieldType::Sfixed32
                | FieldType::Sfixed64
                | FieldType::Bool
                | FieldType::String
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Double => write!(f, "double"),
            FieldType::Float => write!(f, "float"),
            FieldType::Int32 => write!(f, "int32"),
            FieldType::Int64 => write!(f, "int64"),
            FieldType::Uint32 => write!(f, "uint32"),
            FieldType::Uint64 => write!(f, "uint64"),
            FieldType::Sint32 => write!(f, "sint32"),
            FieldType::Sint64 => write!(f, "sint64"),
            FieldType::Fixed32 => write!(f, "fixed32"),
            FieldType::Fixed64 => write!(f, "fixed64"),
            FieldType::Sfixed32 => write!(f, "sfixed32"),
            FieldType::Sfixed64 => write!(f, "sfixed64"),
            FieldType::Bool => write!(f, "bool"),
            FieldType::String => write!(f, "string"),
            FieldType::Bytes => write!(f, "bytes"),
            FieldType::Message(name) | FieldType::Enum(name) => write!(f, "{}", name),
            FieldType::Group => write!(f, "group"),
            FieldType::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum ResolveNameFilter {
    Message,
    Enum,
}

enum ResolveNameResult<'b> {
    Found(Definition),
    InvalidType { name: Cow<'b, str> },
    NotFound,
}

impl<'b> ResolveNameResult<'b> {
    fn new(
        pool: &DescriptorPoolInner,
        name: impl Into<Cow<'b, str>>,
        filter: ResolveNameFilter,
    ) -> Self {
        let name = name.into();
        match pool.names.get(name.as_ref()) {
            None => ResolveNameResult::NotFound,
            Some(&def) => match (def, filter) {
                (Definition::Message(_), ResolveNameFilter::Message)
                | (Definition::Enum(_), ResolveNameFilter::Enum) => ResolveNameResult::Found(def),
                _ => ResolveNameResult::InvalidType { name },
            },
        }
    }

    fn into_owned(self) -> ResolveNameResult<'static> {
        match self {
            ResolveNameResult::Found(def) => ResolveNameResult::Found(def),
            ResolveNameResult::InvalidType { name } => ResolveNameResult::InvalidType {
                name: Cow::Owned(name.into_owned()),
            },
            ResolveNameResult::NotFound => ResolveNameResult::NotFound,
        }
    }

    fn is_found(&self) -> bool {
        matches!(self, ResolveNameResult::Found(_))
    }
}

fn resolve_name<'b>(
    pool: &DescriptorPoolInner,
    scope: &str,
    name: &'b str,
    filter: ResolveNameFilter,
) -> ResolveNameResult<'b> {
    match name.strip_prefix('.') {
        Some(full_name) => ResolveNameResult::new(pool, full_name, filter),
        None if scope.is_empty() => ResolveNameResult::new(pool, name, filter),
        None => resolve_relative_name(pool, scope, name, filter),
    }
}

fn resolve_relative_name(
    pool: &DescriptorPoolInner,
    scope: &str,
    relative_name: &str,
    filter: ResolveNameFilter,
) -> ResolveNameResult<'static> {
    let mut err = ResolveNameResult::NotFound;

    for candidate in resolve_relative_name_candidates(scope, relative_name) {
        let res = ResolveNameResult::new(pool, candidate, filter);
        if res.is_found() {
            return res.into_owned();
        } else if matches!(err, ResolveNameResult::NotFound) {
            err = res;
        }
    }

    err.into_owned()
}

fn resolve_relative_name_candidates<'b: 'c, 'c>(
    scope: &'c str,
    relative_name: &'b str,
) -> impl Iterator<Item = Cow<'b, str>> + 'c {
    iter::once(Cow::Owned(format!("{scope}.{relative_name}")))
        .chain(
            scope
                .rmatch_indices('.')
                .map(move |(i, _)| Cow::Owned(format!("{}.{relative_name}", &scope[..i]))),
        )
        .chain(iter::once(Cow::Borrowed(relative_name)))
}

fn join_name<'a>(namespace: &str, name: &'a str) -> Cow<'a, str> {
    if namespace.is_empty() {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{}.{}", namespace, name))
    }
}

/// Converts a field name such as `my_labels` to the name of its map entry message, `MyLabelsEntry`.
fn map_entry_name(field_name: &str) -> String {
    let mut result = String::with_capacity(field_name.len() + 5);
    let mut uppercase_next = true;

    for ch in field_name.chars() {
        if ch == '_' {
            uppercase_next = true
        } else if uppercase_next {
            result.push(ch.to_ascii_uppercase());
            uppercase_next = false;
        } else {
            result.push(ch);
        }
    }

    result.push_str("Entry");
    result
}

#[test]
fn test_resolve_relative_name_candidates() {
    let candidates: Vec<_> = resolve_relative_name_candidates("a.b.C", "D.e").collect();
    assert_eq!(candidates, ["a.b.C.D.e", "a.b.D.e", "a.D.e", "D.e"]);
}

#[test]
fn test_map_entry_name() {
    assert_eq!(map_entry_name("labels"), "LabelsEntry");
    assert_eq!(map_entry_name("string_map"), "StringMapEntry");
    assert_eq!(map_entry_name("a_b_c"), "ABCEntry");
}
