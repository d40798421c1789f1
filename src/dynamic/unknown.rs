use std::collections::BTreeMap;

use prost::bytes::{BufMut, Bytes};

/// Fields read from the wire whose numbers are not declared by the message descriptor.
///
/// Each occurrence is kept as the exact bytes consumed for it, key included, so that it can be
/// written back unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct UnknownFieldSet {
    fields: BTreeMap<u32, Vec<Bytes>>,
}

impl UnknownFieldSet {
    pub(super) fn add(&mut self, number: u32, span: Bytes) {
        self.fields.entry(number).or_default().push(span);
    }

    pub(super) fn get(&self, number: u32) -> Option<&[Bytes]> {
        self.fields.get(&number).map(Vec::as_slice)
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (u32, &[Bytes])> + '_ {
        self.fields
            .iter()
            .map(|(&number, spans)| (number, spans.as_slice()))
    }

    pub(super) fn clear(&mut self) {
        self.fields.clear();
    }

    pub(super) fn encode(&self, buf: &mut impl BufMut) {
        for span in self.fields.values().flatten() {
            buf.put_slice(span);
        }
    }

    pub(super) fn encoded_len(&self) -> usize {
        self.fields.values().flatten().map(Bytes::len).sum()
    }
}
