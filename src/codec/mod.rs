//! Record codecs - Convert entities to and from flat field maps.
//!
//! A hash record stores one string per field. Codecs decide how an entity's
//! attributes map onto those fields and back.

mod hash;

use std::fmt;

use crate::store::FieldMap;

/// Converts between an entity and its hash-record representation.
pub trait RecordCodec<T>: Send + Sync {
    /// Encode `record` as a field map.
    fn to_fields(&self, record: &T) -> Result<FieldMap, CodecError>;

    /// Populate an existing `record` from `fields`.
    ///
    /// The instance passed in determines the shape of the result: an
    /// attribute initialized as an (empty) map is filled from its flattened
    /// fields, and scalar attributes absent from `fields` keep their value.
    fn load_fields(&self, fields: &FieldMap, record: &mut T) -> Result<(), CodecError>;
}

/// Error type for record codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The entity does not serialize to a struct-like record.
    NotARecord,
    /// The attribute has a shape hash records cannot hold.
    Unsupported { field: String },
    /// A stored field could not be read back as the attribute's type.
    InvalidValue { field: String, value: String },
    /// Serialization/deserialization error.
    Serde(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::NotARecord => write!(f, "value does not encode as a record"),
            CodecError::Unsupported { field } => {
                write!(f, "field {} cannot be stored in a hash record", field)
            }
            CodecError::InvalidValue { field, value } => {
                write!(f, "invalid value {:?} for field {}", value, field)
            }
            CodecError::Serde(msg) => write!(f, "record serialization error: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Serde(err.to_string())
    }
}

pub use hash::HashCodec;
