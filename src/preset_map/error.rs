use std::fmt;

use crate::codec::CodecError;
use crate::store::StoreError;

/// Outcome kinds of preset map operations.
///
/// `AlreadyExists` and `NotFound` are expected results callers match on;
/// store and codec failures are carried unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetMapError {
    AlreadyExists { name: String },
    NotFound { name: String },
    InvalidName,
    Store(StoreError),
    Codec(CodecError),
}

impl PresetMapError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PresetMapError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, PresetMapError::AlreadyExists { .. })
    }
}

impl fmt::Display for PresetMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetMapError::AlreadyExists { name } => {
                write!(f, "preset map {} already exists", name)
            }
            PresetMapError::NotFound { name } => write!(f, "preset map {} not found", name),
            PresetMapError::InvalidName => write!(f, "preset map name must not be empty"),
            PresetMapError::Store(err) => write!(f, "{}", err),
            PresetMapError::Codec(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PresetMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresetMapError::Store(err) => Some(err),
            PresetMapError::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for PresetMapError {
    fn from(err: StoreError) -> Self {
        PresetMapError::Store(err)
    }
}

impl From<CodecError> for PresetMapError {
    fn from(err: CodecError) -> Self {
        PresetMapError::Codec(err)
    }
}
