//! This crate provides dynamic protobuf messages, whose structure is defined at runtime by a
//! schema rather than by generated code.
//!
//! A [`DescriptorPool`] is built from message and enum definitions using a
//! [`DescriptorPoolBuilder`]. Each [`MessageDescriptor`] in the pool can then be used to create,
//! inspect and modify [`DynamicMessage`] instances, and to encode and decode them using the
//! protobuf binary wire format.
//!
//! # Example
//!
//! ```
//! use protodyn::{
//!     DescriptorPoolBuilder, DynamicMessage, FieldBuilder, FieldType, MessageBuilder, Value,
//! };
//!
//! let pool = DescriptorPoolBuilder::new()
//!     .package("example")
//!     .message(
//!         MessageBuilder::new("Person")
//!             .field(FieldBuilder::new("id", 1, FieldType::Int32))
//!             .field(FieldBuilder::new("name", 2, FieldType::String)),
//!     )
//!     .build()
//!     .unwrap();
//! let desc = pool.get_message_by_name("example.Person").unwrap();
//!
//! let mut message = DynamicMessage::new(desc.clone());
//! message.set_field_by_name("id", Value::I64(42));
//! message.try_set_field_by_name("name", Value::from("Ada")).unwrap();
//!
//! let bytes = message.encode_to_vec().unwrap();
//! assert_eq!(bytes[..2], [0x08, 0x2A]);
//!
//! let decoded = DynamicMessage::decode(desc, bytes.as_slice()).unwrap();
//! assert_eq!(decoded, message);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]

#[macro_use]
mod macros;

mod descriptor;
mod dynamic;
pub mod encoding;

pub use {prost, prost::bytes};

pub use self::descriptor::{
    Cardinality, DescriptorError, DescriptorPool, DescriptorPoolBuilder, EnumBuilder,
    EnumDescriptor, EnumValueDescriptor, FieldBuilder, FieldDescriptor, FieldType, Kind,
    MessageBuilder, MessageDescriptor, OneofDescriptor,
};
pub use self::dynamic::{
    DecodeOptions, DynamicMessage, EnumValue, MapKey, SetFieldError, TranscodeError, Value,
};
pub use self::encoding::{DecodeError, EncodeError};
