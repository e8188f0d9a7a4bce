mod codec;
mod config;
mod preset_map;
mod store;

pub use codec::{CodecError, HashCodec, RecordCodec};
pub use config::{ConfigError, RedisConfig};
pub use preset_map::{
    preset_key, KvPresetMapRepository, PresetMap, PresetMapError, PresetMapRepository,
    PRESETS_SET_KEY, PRESET_KEY_PREFIX,
};
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use store::{FieldMap, InMemoryStore, KeyValueStore, Op, StoreError, Transaction};
