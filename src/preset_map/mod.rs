//! Preset maps - Named provider-to-preset mappings kept in a key-value store.
//!
//! Each preset map is a hash record at `preset:<name>`. The set at `presets`
//! indexes every stored name so listing never scans the keyspace.
//!
//! ## Example
//!
//! ```ignore
//! use presetmap_store::{InMemoryStore, KvPresetMapRepository, PresetMap, PresetMapRepository};
//!
//! let repo = KvPresetMapRepository::new(InMemoryStore::new());
//! let preset = PresetMap::new("720p").with_provider("elastictranscoder", "1351620000001-000010");
//! repo.create(&preset)?;
//! let loaded = repo.get("720p")?;
//! ```

mod error;
mod repository;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named mapping from provider name to that provider's preset identifier.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetMap {
    #[serde(rename = "presetmap_name")]
    pub name: String,
    #[serde(rename = "pmapping", default)]
    pub provider_mapping: HashMap<String, String>,
}

impl PresetMap {
    /// A preset map with no provider entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_mapping: HashMap::new(),
        }
    }

    pub fn with_provider(
        mut self,
        provider: impl Into<String>,
        preset_id: impl Into<String>,
    ) -> Self {
        self.provider_mapping.insert(provider.into(), preset_id.into());
        self
    }

    /// The preset id registered for `provider`, if any.
    pub fn preset_for(&self, provider: &str) -> Option<&str> {
        self.provider_mapping.get(provider).map(String::as_str)
    }
}

pub use error::PresetMapError;
pub use repository::{
    preset_key, KvPresetMapRepository, PresetMapRepository, PRESETS_SET_KEY, PRESET_KEY_PREFIX,
};
