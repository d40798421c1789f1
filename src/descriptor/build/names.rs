use std::collections::{hash_map, BTreeMap, HashMap};

use crate::descriptor::{
    build::{join_name, map_entry_name, EnumBuilder, FieldBuilder, FieldType, MessageBuilder},
    error::DescriptorErrorKind,
    to_index, Definition, DescriptorPoolInner, EnumDescriptorInner, EnumValueDescriptorInner,
    Identity, MessageDescriptorInner, MessageIndex, MAP_ENTRY_KEY_NUMBER, MAP_ENTRY_VALUE_NUMBER,
};

/// The fields of a message, waiting for every type name in the pool to be known.
pub(super) struct PendingMessage {
    pub(super) index: MessageIndex,
    pub(super) fields: Vec<FieldBuilder>,
}

impl DescriptorPoolInner {
    /// Assigns an index and full name to every message and enum, and builds enums in full.
    pub(super) fn collect_names(
        &mut self,
        package: &str,
        messages: Vec<MessageBuilder>,
        enums: Vec<EnumBuilder>,
        errors: &mut Vec<DescriptorErrorKind>,
    ) -> Vec<PendingMessage> {
        let mut collector = NameCollector {
            pool: self,
            pending: Vec::new(),
            errors,
        };
        for message in messages {
            collector.add_message(None, package, message);
        }
        for enum_ in enums {
            collector.add_enum(None, package, enum_);
        }
        collector.pending
    }
}

struct NameCollector<'a> {
    pool: &'a mut DescriptorPoolInner,
    pending: Vec<PendingMessage>,
    errors: &'a mut Vec<DescriptorErrorKind>,
}

impl NameCollector<'_> {
    fn add_message(&mut self, parent: Option<MessageIndex>, scope: &str, message: MessageBuilder) {
        let MessageBuilder {
            name,
            mut fields,
            mut messages,
            enums,
            map_entry,
        } = message;

        let full_name = join_name(scope, &name).into_owned();
        let index = to_index(self.pool.messages.len());
        self.add_name(&full_name, Definition::Message(index));

        self.pool.messages.push(MessageDescriptorInner {
            id: Identity::new(&full_name, &name),
            parent,
            is_map_entry: map_entry,
            fields: Vec::with_capacity(fields.len()),
            field_numbers: BTreeMap::new(),
            field_names: HashMap::with_capacity(fields.len()),
            oneofs: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
        });
        if let Some(parent) = parent {
            self.pool.messages[parent as usize].messages.push(index);
        }

        for field in &mut fields {
            if let Some((key, value)) = field.map.take() {
                if !key.is_valid_map_key() {
                    self.errors.push(DescriptorErrorKind::InvalidMapKeyType {
                        kind: key.to_string(),
                        field: join_name(&full_name, &field.name).into_owned(),
                    });
                }

                let entry_name = map_entry_name(&field.name);
                field.ty = FieldType::Message(format!(".{}.{}", full_name, entry_name));
                messages.push(MessageBuilder {
                    name: entry_name,
                    fields: vec![
                        FieldBuilder::new("key", MAP_ENTRY_KEY_NUMBER, key),
                        FieldBuilder::new("value", MAP_ENTRY_VALUE_NUMBER, value),
                    ],
                    messages: Vec::new(),
                    enums: Vec::new(),
                    map_entry: true,
                });
            }
        }

        self.pending.push(PendingMessage { index, fields });

        for nested in messages {
            self.add_message(Some(index), &full_name, nested);
        }
        for nested in enums {
            self.add_enum(Some(index), &full_name, nested);
        }
    }

    fn add_enum(&mut self, parent: Option<MessageIndex>, scope: &str, enum_: EnumBuilder) {
        let full_name = join_name(scope, &enum_.name).into_owned();
        let index = to_index(self.pool.enums.len());
        self.add_name(&full_name, Definition::Enum(index));

        if enum_.values.is_empty() {
            self.errors.push(DescriptorErrorKind::EmptyEnum {
                name: full_name.clone(),
            });
        }

        let mut values = Vec::with_capacity(enum_.values.len());
        let mut value_names = HashMap::with_capacity(enum_.values.len());
        let mut value_numbers = Vec::with_capacity(enum_.values.len());
        for (name, number) in &enum_.values {
            let value_index = to_index(values.len());
            match value_names.entry(Box::<str>::from(name.as_str())) {
                hash_map::Entry::Occupied(_) => {
                    self.errors
                        .push(DescriptorErrorKind::DuplicateEnumValueName {
                            name: name.clone(),
                            enum_name: full_name.clone(),
                        })
                }
                hash_map::Entry::Vacant(entry) => {
                    entry.insert(value_index);
                }
            }

            // Enum values are scoped as siblings of their enum, not children.
            values.push(EnumValueDescriptorInner {
                id: Identity::new(&join_name(scope, name), name),
                number: *number,
            });
            value_numbers.push((*number, value_index));
        }

        value_numbers.sort_by_key(|&(number, _)| number);
        if !enum_.allow_alias {
            for pair in value_numbers.windows(2) {
                let (number, first) = pair[0];
                let (next, second) = pair[1];
                if number == next {
                    self.errors.push(DescriptorErrorKind::DuplicateEnumNumber {
                        number,
                        first: values[first as usize].id.full_name().to_owned(),
                        second: values[second as usize].id.full_name().to_owned(),
                    });
                }
            }
        }

        self.pool.enums.push(EnumDescriptorInner {
            id: Identity::new(&full_name, &enum_.name),
            parent,
            values,
            value_numbers,
            value_names,
            allow_alias: enum_.allow_alias,
        });
        if let Some(parent) = parent {
            self.pool.messages[parent as usize].enums.push(index);
        }
    }

    fn add_name(&mut self, full_name: &str, def: Definition) {
        match self.pool.names.entry(full_name.into()) {
            hash_map::Entry::Occupied(_) => self.errors.push(DescriptorErrorKind::DuplicateName {
                name: full_name.to_owned(),
            }),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(def);
            }
        }
    }
}
