use std::collections::{btree_map, hash_map};

use crate::{
    descriptor::{
        build::{
            join_name, names::PendingMessage, resolve_name, FieldBuilder, FieldType,
            ResolveNameFilter, ResolveNameResult,
        },
        error::DescriptorErrorKind,
        to_index, Definition, DescriptorPoolInner, FieldDescriptorInner, Identity, KindIndex,
        MessageIndex, OneofDescriptorInner, RESERVED_MESSAGE_FIELD_NUMBERS,
        VALID_MESSAGE_FIELD_NUMBERS,
    },
    Cardinality,
};

impl DescriptorPoolInner {
    /// Adds the fields of every message, resolving type names now that all definitions are known.
    pub(super) fn resolve_names(
        &mut self,
        pending: Vec<PendingMessage>,
        errors: &mut Vec<DescriptorErrorKind>,
    ) {
        for PendingMessage { index, fields } in pending {
            for field in fields {
                self.add_field(index, field, errors);
            }
        }
    }

    fn add_field(
        &mut self,
        message_index: MessageIndex,
        field: FieldBuilder,
        errors: &mut Vec<DescriptorErrorKind>,
    ) {
        let scope = self.messages[message_index as usize]
            .id
            .full_name()
            .to_owned();
        let full_name = join_name(&scope, &field.name).into_owned();

        if !VALID_MESSAGE_FIELD_NUMBERS.contains(&field.number) {
            errors.push(DescriptorErrorKind::InvalidFieldNumber {
                number: field.number,
                field: full_name.clone(),
            });
        } else if RESERVED_MESSAGE_FIELD_NUMBERS.contains(&field.number) {
            errors.push(DescriptorErrorKind::ReservedFieldNumber {
                number: field.number,
                field: full_name.clone(),
            });
        }

        let kind = self.resolve_field_type(&field.ty, &scope, &full_name, errors);

        let message = &mut self.messages[message_index as usize];
        let field_index = to_index(message.fields.len());

        match message.field_numbers.entry(field.number) {
            btree_map::Entry::Occupied(entry) => {
                errors.push(DescriptorErrorKind::DuplicateFieldNumber {
                    number: field.number,
                    first: message.fields[*entry.get() as usize]
                        .id
                        .full_name()
                        .to_owned(),
                    second: full_name.clone(),
                })
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(field_index);
            }
        }

        match message.field_names.entry(field.name.as_str().into()) {
            hash_map::Entry::Occupied(_) => errors.push(DescriptorErrorKind::DuplicateFieldName {
                name: field.name.clone(),
                message: scope.clone(),
            }),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(field_index);
            }
        }

        let oneof = match field.oneof.as_deref() {
            Some(oneof_name) => {
                let oneof_index = match message
                    .oneofs
                    .iter()
                    .position(|oneof| oneof.id.name() == oneof_name)
                {
                    Some(index) => to_index(index),
                    None => {
                        message.oneofs.push(OneofDescriptorInner {
                            id: Identity::new(&join_name(&scope, oneof_name), oneof_name),
                            fields: Vec::new(),
                        });
                        to_index(message.oneofs.len() - 1)
                    }
                };

                let oneof = &mut message.oneofs[oneof_index as usize];
                if field.cardinality == Cardinality::Repeated {
                    errors.push(DescriptorErrorKind::InvalidOneofField {
                        field: full_name.clone(),
                        oneof: oneof.id.full_name().to_owned(),
                    });
                }
                oneof.fields.push(field_index);
                Some(oneof_index)
            }
            None => None,
        };

        message.fields.push(FieldDescriptorInner {
            id: Identity::new(&full_name, &field.name),
            number: field.number,
            kind,
            oneof,
            cardinality: field.cardinality,
        });
    }

    fn resolve_field_type(
        &self,
        ty: &FieldType,
        scope: &str,
        field: &str,
        errors: &mut Vec<DescriptorErrorKind>,
    ) -> KindIndex {
        match ty {
            FieldType::Double => KindIndex::Double,
            FieldType::Float => KindIndex::Float,
            FieldType::Int32 => KindIndex::Int32,
            FieldType::Int64 => KindIndex::Int64,
            FieldType::Uint32 => KindIndex::Uint32,
            FieldType::Uint64 => KindIndex::Uint64,
            FieldType::Sint32 => KindIndex::Sint32,
            FieldType::Sint64 => KindIndex::Sint64,
            FieldType::Fixed32 => KindIndex::Fixed32,
            FieldType::Fixed64 => KindIndex::Fixed64,
            FieldType::Sfixed32 => KindIndex::Sfixed32,
            FieldType::Sfixed64 => KindIndex::Sfixed64,
            FieldType::Bool => KindIndex::Bool,
            FieldType::String => KindIndex::String,
            FieldType::Bytes => KindIndex::Bytes,
            FieldType::Group => KindIndex::Group,
            FieldType::Unknown => KindIndex::Unknown,
            FieldType::Message(type_name) => {
                let filter = ResolveNameFilter::Message;
                match self.resolve_type_name(scope, type_name, filter, field, errors) {
                    Some(Definition::Message(index)) => KindIndex::Message(index),
                    _ => KindIndex::Unknown,
                }
            }
            FieldType::Enum(type_name) => {
                let filter = ResolveNameFilter::Enum;
                match self.resolve_type_name(scope, type_name, filter, field, errors) {
                    Some(Definition::Enum(index)) => KindIndex::Enum(index),
                    _ => KindIndex::Unknown,
                }
            }
        }
    }

    fn resolve_type_name(
        &self,
        scope: &str,
        type_name: &str,
        filter: ResolveNameFilter,
        field: &str,
        errors: &mut Vec<DescriptorErrorKind>,
    ) -> Option<Definition> {
        match resolve_name(self, scope, type_name, filter) {
            ResolveNameResult::Found(def) => Some(def),
            ResolveNameResult::InvalidType { name } => {
                errors.push(DescriptorErrorKind::InvalidType {
                    name: name.into_owned(),
                    expected: match filter {
                        ResolveNameFilter::Message => "a message type",
                        ResolveNameFilter::Enum => "an enum type",
                    },
                    field: field.to_owned(),
                });
                None
            }
            ResolveNameResult::NotFound => {
                errors.push(DescriptorErrorKind::NameNotFound {
                    name: type_name.to_owned(),
                    field: field.to_owned(),
                });
                None
            }
        }
    }
}
