use tracing::{debug, warn};

use super::{PresetMap, PresetMapError};
use crate::codec::{HashCodec, RecordCodec};
use crate::store::{KeyValueStore, StoreError};

/// Key of the set indexing every stored preset map name.
pub const PRESETS_SET_KEY: &str = "presets";

/// Prefix of the hash record key holding one preset map.
pub const PRESET_KEY_PREFIX: &str = "preset:";

/// Key of the hash record for the preset map called `name`.
pub fn preset_key(name: &str) -> String {
    format!("{}{}", PRESET_KEY_PREFIX, name)
}

/// CRUD over preset maps.
pub trait PresetMapRepository {
    /// Store a new preset map. Fails with `AlreadyExists` if one with the same
    /// name can already be read.
    fn create(&self, preset: &PresetMap) -> Result<(), PresetMapError>;

    /// Replace the stored preset map with the same name. Fails with
    /// `NotFound` if there is none.
    fn update(&self, preset: &PresetMap) -> Result<(), PresetMapError>;

    /// Remove the preset map with the same name. Fails with `NotFound` if
    /// there is none.
    fn delete(&self, preset: &PresetMap) -> Result<(), PresetMapError>;

    fn get(&self, name: &str) -> Result<PresetMap, PresetMapError>;

    /// Every indexed preset map, in no particular order.
    fn list(&self) -> Result<Vec<PresetMap>, PresetMapError>;
}

/// Preset map repository over any [`KeyValueStore`].
///
/// Writes are guarded by a watch on the record key only. Two known gaps:
///
/// - the existence check in `create`/`update` and the write that follows are
///   separate round trips, so two concurrent creates of a new name both
///   succeed and the last one wins;
/// - `delete` removes the record and the index entry in two independent
///   steps; if the second fails the index keeps a dangling name, which
///   `list` skips.
#[derive(Debug, Clone)]
pub struct KvPresetMapRepository<S, C = HashCodec> {
    store: S,
    codec: C,
}

impl<S: KeyValueStore> KvPresetMapRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_codec(store, HashCodec)
    }
}

impl<S, C> KvPresetMapRepository<S, C> {
    pub fn with_codec(store: S, codec: C) -> Self {
        Self { store, codec }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

fn not_found(name: &str) -> impl FnOnce(StoreError) -> PresetMapError + '_ {
    move |err| match err {
        StoreError::NotFound { .. } => PresetMapError::NotFound {
            name: name.to_string(),
        },
        other => PresetMapError::Store(other),
    }
}

fn validate(preset: &PresetMap) -> Result<(), PresetMapError> {
    if preset.name.is_empty() {
        return Err(PresetMapError::InvalidName);
    }
    Ok(())
}

impl<S, C> KvPresetMapRepository<S, C>
where
    S: KeyValueStore,
    C: RecordCodec<PresetMap>,
{
    fn exists(&self, name: &str) -> Result<bool, PresetMapError> {
        match self.get(name) {
            Ok(_) => Ok(true),
            Err(PresetMapError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Replace the record and index the name in one watched transaction.
    fn save(&self, preset: &PresetMap) -> Result<(), PresetMapError> {
        let fields = self.codec.to_fields(preset)?;
        let key = preset_key(&preset.name);

        self.store.watch(&[key.as_str()], |tx| {
            // Clear first so fields from the previous mapping do not survive.
            tx.delete(&key)
                .hash_set(&key, &fields)
                .set_add(PRESETS_SET_KEY, &preset.name);
            Ok(())
        })?;

        debug!(name = %preset.name, fields = fields.len(), "saved preset map");
        Ok(())
    }
}

impl<S, C> PresetMapRepository for KvPresetMapRepository<S, C>
where
    S: KeyValueStore,
    C: RecordCodec<PresetMap>,
{
    fn create(&self, preset: &PresetMap) -> Result<(), PresetMapError> {
        validate(preset)?;
        if self.exists(&preset.name)? {
            return Err(PresetMapError::AlreadyExists {
                name: preset.name.clone(),
            });
        }
        self.save(preset)
    }

    fn update(&self, preset: &PresetMap) -> Result<(), PresetMapError> {
        validate(preset)?;
        if !self.exists(&preset.name)? {
            return Err(PresetMapError::NotFound {
                name: preset.name.clone(),
            });
        }
        self.save(preset)
    }

    fn delete(&self, preset: &PresetMap) -> Result<(), PresetMapError> {
        self.store
            .delete(&preset_key(&preset.name))
            .map_err(not_found(&preset.name))?;

        if let Err(err) = self.store.set_remove(PRESETS_SET_KEY, &preset.name) {
            warn!(name = %preset.name, error = %err, "failed to remove preset map from index");
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<PresetMap, PresetMapError> {
        let fields = self
            .store
            .hash_get_all(&preset_key(name))
            .map_err(not_found(name))?;

        let mut preset = PresetMap::new(name);
        self.codec.load_fields(&fields, &mut preset)?;
        Ok(preset)
    }

    fn list(&self) -> Result<Vec<PresetMap>, PresetMapError> {
        let names = self.store.set_members(PRESETS_SET_KEY)?;

        let mut presets = Vec::with_capacity(names.len());
        for name in names {
            match self.get(&name) {
                Ok(preset) => presets.push(preset),
                Err(PresetMapError::NotFound { .. }) => {
                    debug!(name = %name, "skipping indexed preset map without a record");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(presets)
    }
}
