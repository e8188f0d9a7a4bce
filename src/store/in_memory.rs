//! InMemoryStore - HashMap-backed key-value store for testing and development.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use super::{FieldMap, KeyValueStore, Op, StoreError, Transaction};

/// Internal stored representation of a value.
#[derive(Debug, Clone)]
enum Value {
    Hash(FieldMap),
    Set(HashSet<String>),
}

#[derive(Default)]
struct State {
    values: HashMap<String, Value>,
    /// Bumped on every write to a key, deletes included. Entries are never
    /// removed so a delete-then-recreate still reads as a modification.
    revisions: HashMap<String, u64>,
}

impl State {
    fn revision(&self, key: &str) -> u64 {
        self.revisions.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &str) {
        *self.revisions.entry(key.to_string()).or_insert(0) += 1;
    }

    fn hash_set(&mut self, key: &str, fields: &FieldMap) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        match self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(FieldMap::new()))
        {
            Value::Hash(hash) => {
                hash.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Value::Set(_) => return Err(StoreError::WrongType { key: key.to_string() }),
        }
        self.touch(key);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> bool {
        let existed = self.values.remove(key).is_some();
        if existed {
            self.touch(key);
        }
        existed
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<bool, StoreError> {
        let added = match self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(HashSet::new()))
        {
            Value::Set(set) => set.insert(member.to_string()),
            Value::Hash(_) => return Err(StoreError::WrongType { key: key.to_string() }),
        };
        if added {
            self.touch(key);
        }
        Ok(added)
    }

    fn set_remove(&mut self, key: &str, member: &str) -> Result<bool, StoreError> {
        let (removed, now_empty) = match self.values.get_mut(key) {
            None => return Ok(false),
            Some(Value::Set(set)) => (set.remove(member), set.is_empty()),
            Some(Value::Hash(_)) => return Err(StoreError::WrongType { key: key.to_string() }),
        };
        // An emptied set disappears, like any other empty collection.
        if now_empty {
            self.values.remove(key);
        }
        if removed {
            self.touch(key);
        }
        Ok(removed)
    }

    /// Apply a committed batch. The touched keys are staged first so an op
    /// failing midway leaves the store as it was.
    fn apply_batch(&mut self, ops: Vec<Op>) -> Result<(), StoreError> {
        let mut staged = State::default();
        for op in &ops {
            let key = op.key();
            if let Some(value) = self.values.get(key) {
                staged.values.insert(key.to_string(), value.clone());
            }
            staged.revisions.insert(key.to_string(), self.revision(key));
        }

        for op in &ops {
            match op {
                Op::Delete { key } => {
                    staged.delete(key);
                }
                Op::HashSet { key, fields } => staged.hash_set(key, fields)?,
                Op::SetAdd { key, member } => {
                    staged.set_add(key, member)?;
                }
                Op::SetRemove { key, member } => {
                    staged.set_remove(key, member)?;
                }
            }
        }

        let State {
            mut values,
            revisions,
        } = staged;
        for (key, revision) in revisions {
            match values.remove(&key) {
                Some(value) => {
                    self.values.insert(key.clone(), value);
                }
                None => {
                    self.values.remove(&key);
                }
            }
            self.revisions.insert(key, revision);
        }
        Ok(())
    }
}

/// In-memory key-value store backed by a HashMap.
///
/// Watches are emulated with per-key revision counters: a transaction
/// records the revisions of its watched keys before running the body and
/// commits only if none of them moved. Clone-friendly via Arc; clones share
/// the same data, which makes them behave like separate clients of one server.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently holding a value.
    pub fn len(&self) -> Result<usize, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(state.values.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Whether `key` currently holds a value.
    pub fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(state.values.contains_key(key))
    }
}

impl KeyValueStore for InMemoryStore {
    fn watch<F>(&self, keys: &[&str], body: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), StoreError>,
    {
        let watched: Vec<(String, u64)> = {
            let state = self
                .state
                .read()
                .map_err(|_| StoreError::LockPoisoned("watch"))?;
            keys.iter()
                .map(|key| (key.to_string(), state.revision(key)))
                .collect()
        };

        // The body runs without holding the lock; other clients may write meanwhile.
        let mut tx = Transaction::new();
        body(&mut tx)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("exec"))?;

        let modified: Vec<String> = watched
            .into_iter()
            .filter(|(key, revision)| state.revision(key) != *revision)
            .map(|(key, _)| key)
            .collect();
        if !modified.is_empty() {
            return Err(StoreError::Conflict { keys: modified });
        }

        state.apply_batch(tx.into_ops())
    }

    fn hash_get_all(&self, key: &str) -> Result<FieldMap, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        match state.values.get(key) {
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(Value::Set(_)) => Err(StoreError::WrongType { key: key.to_string() }),
            None => Err(StoreError::NotFound { key: key.to_string() }),
        }
    }

    fn hash_set(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        state.hash_set(key, fields)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        if state.delete(key) {
            Ok(())
        } else {
            Err(StoreError::NotFound { key: key.to_string() })
        }
    }

    fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        state.set_add(key, member)
    }

    fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        state.set_remove(key, member)
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        match state.values.get(key) {
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(Value::Hash(_)) => Err(StoreError::WrongType { key: key.to_string() }),
            None => Ok(vec![]),
        }
    }
}
