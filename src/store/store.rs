//! KeyValueStore - Abstract hash/set storage with optimistic transactions.

use super::{FieldMap, StoreError, Transaction};

/// Abstract key-value storage with hash records, set records and
/// watch-based transactions.
///
/// Handles are expected to be cheap to clone and to share one backend, so
/// several repositories (or threads) can write through the same store.
pub trait KeyValueStore: Send + Sync {
    /// Watch `keys`, let `body` queue writes on a [`Transaction`], then commit
    /// the queued writes atomically.
    ///
    /// Returns [`StoreError::Conflict`] without applying anything if any
    /// watched key was written by another client after the watch began. No
    /// retry is attempted. An error from `body` abandons the batch and is
    /// returned as is.
    fn watch<F>(&self, keys: &[&str], body: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), StoreError>;

    /// Load every field of the hash at `key`.
    ///
    /// Returns [`StoreError::NotFound`] when the key does not exist.
    fn hash_get_all(&self, key: &str) -> Result<FieldMap, StoreError>;

    /// Write `fields` into the hash at `key`, keeping fields not named in
    /// `fields`. An empty field map is a no-op.
    fn hash_set(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError>;

    /// Delete `key`. Returns [`StoreError::NotFound`] when it did not exist.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Add `member` to the set at `key`. Returns true if it was not already a member.
    fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Remove `member` from the set at `key`. Returns true if it was a member;
    /// removing an absent member is not an error.
    fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// All members of the set at `key`, in no particular order. A missing key
    /// is an empty set.
    fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;
}
