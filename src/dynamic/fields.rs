use std::collections::BTreeMap;

use prost::bytes::Bytes;

use super::{unknown::UnknownFieldSet, DynamicMessage, MapKey, Value};
use crate::{FieldDescriptor, MessageDescriptor, OneofDescriptor};

/// The set fields of a [`DynamicMessage`], keyed by field number.
///
/// Setting a member of a oneof removes whichever sibling was previously active.
#[derive(Debug, Default, Clone)]
pub(super) struct DynamicMessageFieldSet {
    values: BTreeMap<u32, Value>,
    oneofs: BTreeMap<u32, u32>,
    unknown: UnknownFieldSet,
}

impl DynamicMessageFieldSet {
    pub(super) fn has(&self, number: u32) -> bool {
        self.values.contains_key(&number)
    }

    pub(super) fn get(&self, number: u32) -> Option<&Value> {
        self.values.get(&number)
    }

    pub(super) fn get_mut(&mut self, number: u32) -> Option<&mut Value> {
        self.values.get_mut(&number)
    }

    pub(super) fn values(&self) -> &BTreeMap<u32, Value> {
        &self.values
    }

    pub(super) fn set(&mut self, desc: &FieldDescriptor, value: Value) {
        self.clear_oneof_fields(desc);
        self.values.insert(desc.number(), value);
    }

    /// Removes the value for `number` and returns it, leaving the oneof bookkeeping unchanged.
    pub(super) fn take(&mut self, number: u32) -> Option<Value> {
        self.values.remove(&number)
    }

    pub(super) fn clear(&mut self, desc: &FieldDescriptor) {
        if let Some(oneof) = desc.containing_oneof() {
            if self.oneofs.get(&oneof.index()) == Some(&desc.number()) {
                self.oneofs.remove(&oneof.index());
            }
        }
        self.values.remove(&desc.number());
    }

    pub(super) fn clear_all(&mut self) {
        self.values.clear();
        self.oneofs.clear();
        self.unknown.clear();
    }

    pub(super) fn which_oneof(&self, oneof: &OneofDescriptor) -> Option<u32> {
        self.oneofs.get(&oneof.index()).copied()
    }

    /// Gets the list stored for `desc`, replacing any value which is not a list.
    pub(super) fn get_list_mut(&mut self, desc: &FieldDescriptor) -> &mut Vec<Value> {
        let value = self.get_or_insert_with(desc, || Value::List(Vec::new()));
        if !matches!(value, Value::List(_)) {
            *value = Value::List(Vec::new());
        }
        match value {
            Value::List(list) => list,
            _ => unreachable!(),
        }
    }

    /// Gets the map stored for `desc`, replacing any value which is not a map.
    pub(super) fn get_map_mut(&mut self, desc: &FieldDescriptor) -> &mut BTreeMap<MapKey, Value> {
        let value = self.get_or_insert_with(desc, || Value::Map(BTreeMap::new()));
        if !matches!(value, Value::Map(_)) {
            *value = Value::Map(BTreeMap::new());
        }
        match value {
            Value::Map(map) => map,
            _ => unreachable!(),
        }
    }

    /// Gets the message stored for the singular message field `desc`, inserting an empty one
    /// if it is unset or holds a message of the wrong type.
    pub(super) fn get_message_mut(
        &mut self,
        desc: &FieldDescriptor,
        message_desc: &MessageDescriptor,
    ) -> &mut DynamicMessage {
        let value = self.get_or_insert_with(desc, || {
            Value::Message(DynamicMessage::new(message_desc.clone()))
        });
        if !matches!(value, Value::Message(message) if message.descriptor() == message_desc) {
            *value = Value::Message(DynamicMessage::new(message_desc.clone()));
        }
        match value {
            Value::Message(message) => message,
            _ => unreachable!(),
        }
    }

    fn get_or_insert_with(
        &mut self,
        desc: &FieldDescriptor,
        default: impl FnOnce() -> Value,
    ) -> &mut Value {
        self.clear_oneof_fields(desc);
        self.values.entry(desc.number()).or_insert_with(default)
    }

    fn clear_oneof_fields(&mut self, desc: &FieldDescriptor) {
        if let Some(oneof) = desc.containing_oneof() {
            if let Some(active) = self.oneofs.insert(oneof.index(), desc.number()) {
                if active != desc.number() {
                    self.values.remove(&active);
                }
            }
        }
    }

    pub(super) fn unknown(&self) -> &UnknownFieldSet {
        &self.unknown
    }

    pub(super) fn add_unknown(&mut self, number: u32, span: Bytes) {
        self.unknown.add(number, span);
    }
}
