//! Key-value store boundary used by the repositories.
//!
//! A store offers hash records, set records, single-key deletes with a
//! not-found signal, and watch-based optimistic transactions. Writes queued
//! inside [`KeyValueStore::watch`] are committed as one atomic batch, or
//! rejected with [`StoreError::Conflict`] when a watched key was written by
//! someone else after the watch began.
//!
//! ## Example
//!
//! ```ignore
//! use presetmap_store::{InMemoryStore, KeyValueStore};
//!
//! let store = InMemoryStore::new();
//! store.watch(&["preset:web"], |tx| {
//!     tx.hash_set("preset:web", &fields).set_add("presets", "web");
//!     Ok(())
//! })?;
//! ```

mod in_memory;
#[cfg(feature = "redis")]
mod redis_store;
mod store;
mod transaction;

use std::collections::HashMap;
use std::fmt;

/// Flat field-name to string-value representation of a hash record.
pub type FieldMap = HashMap<String, String>;

/// Error type for key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key does not exist.
    NotFound { key: String },
    /// A watched key was modified before the transaction committed.
    Conflict { keys: Vec<String> },
    /// The key holds a value of a different type than the operation expects.
    WrongType { key: String },
    /// An in-process lock was poisoned.
    LockPoisoned(&'static str),
    /// Transport or server error from the backend.
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { key } => write!(f, "key not found: {}", key),
            StoreError::Conflict { keys } => write!(
                f,
                "transaction aborted, watched keys modified: {}",
                keys.join(", ")
            ),
            StoreError::WrongType { key } => {
                write!(f, "operation against a key holding the wrong kind of value: {}", key)
            }
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub use self::in_memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use self::redis_store::RedisStore;
pub use self::store::KeyValueStore;
pub use self::transaction::{Op, Transaction};
