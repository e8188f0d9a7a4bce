use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use presetmap_store::{FieldMap, InMemoryStore, KeyValueStore, PresetMap, StoreError, Transaction};

pub fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Sorted names, so listings compare as sets.
pub fn names(presets: &[PresetMap]) -> Vec<String> {
    let mut names: Vec<String> = presets.iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}

/// In-memory store where a rival client writes the watched key once, while
/// the next transaction is between watch and commit.
#[derive(Clone)]
pub struct ContendedStore {
    inner: InMemoryStore,
    rival_fields: FieldMap,
    armed: Arc<AtomicBool>,
}

impl ContendedStore {
    pub fn new(inner: InMemoryStore, rival_fields: FieldMap) -> Self {
        Self {
            inner,
            rival_fields,
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Interfere with the next transaction.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for ContendedStore {
    fn watch<F>(&self, keys: &[&str], body: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), StoreError>,
    {
        let rival = self.inner.clone();
        let fire = self.armed.swap(false, Ordering::SeqCst);
        self.inner.watch(keys, |tx| {
            if fire {
                for key in keys {
                    rival.hash_set(key, &self.rival_fields)?;
                }
            }
            body(tx)
        })
    }

    fn hash_get_all(&self, key: &str) -> Result<FieldMap, StoreError> {
        self.inner.hash_get_all(key)
    }

    fn hash_set(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError> {
        self.inner.hash_set(key, fields)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.set_add(key, member)
    }

    fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.set_remove(key, member)
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.inner.set_members(key)
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// In-memory store that runs a hook once, right after the next hash read
/// has been answered. Lets another client act between a read and the write
/// that depends on it.
pub struct InterleavedStore {
    inner: InMemoryStore,
    after_next_read: Mutex<Option<Hook>>,
}

impl InterleavedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            after_next_read: Mutex::new(None),
        }
    }

    pub fn after_next_read(&self, hook: impl FnOnce() + Send + 'static) {
        *self.after_next_read.lock().unwrap() = Some(Box::new(hook));
    }
}

impl KeyValueStore for InterleavedStore {
    fn watch<F>(&self, keys: &[&str], body: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), StoreError>,
    {
        self.inner.watch(keys, body)
    }

    fn hash_get_all(&self, key: &str) -> Result<FieldMap, StoreError> {
        let result = self.inner.hash_get_all(key);
        let hook = self.after_next_read.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        result
    }

    fn hash_set(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError> {
        self.inner.hash_set(key, fields)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.set_add(key, member)
    }

    fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.set_remove(key, member)
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.inner.set_members(key)
    }
}
