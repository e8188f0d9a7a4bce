//! Transaction - Writes queued inside a watch, committed as one batch.

use super::FieldMap;

/// A single queued write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Delete { key: String },
    HashSet { key: String, fields: FieldMap },
    SetAdd { key: String, member: String },
    SetRemove { key: String, member: String },
}

impl Op {
    /// The key this write touches.
    pub fn key(&self) -> &str {
        match self {
            Op::Delete { key }
            | Op::HashSet { key, .. }
            | Op::SetAdd { key, .. }
            | Op::SetRemove { key, .. } => key,
        }
    }
}

/// Builder for the writes of one optimistic transaction.
///
/// Nothing is sent to the store while the batch is being built; the store
/// applies the queued ops in order when the watch body returns.
#[derive(Debug, Default)]
pub struct Transaction {
    ops: Vec<Op>,
}

impl Transaction {
    pub fn new() -> Self {
        Self { ops: vec![] }
    }

    /// Queue a delete of `key`. Deleting a missing key inside a batch is not an error.
    pub fn delete(&mut self, key: &str) -> &mut Self {
        self.ops.push(Op::Delete {
            key: key.to_string(),
        });
        self
    }

    /// Queue a write of `fields` into the hash at `key`.
    pub fn hash_set(&mut self, key: &str, fields: &FieldMap) -> &mut Self {
        self.ops.push(Op::HashSet {
            key: key.to_string(),
            fields: fields.clone(),
        });
        self
    }

    /// Queue adding `member` to the set at `key`.
    pub fn set_add(&mut self, key: &str, member: &str) -> &mut Self {
        self.ops.push(Op::SetAdd {
            key: key.to_string(),
            member: member.to_string(),
        });
        self
    }

    /// Queue removing `member` from the set at `key`.
    pub fn set_remove(&mut self, key: &str, member: &str) -> &mut Self {
        self.ops.push(Op::SetRemove {
            key: key.to_string(),
            member: member.to_string(),
        });
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_ops(self) -> Vec<Op> {
        self.ops
    }
}
