//! HashCodec - serde-driven field mapping for hash records.
//!
//! Field names are the serde names of the entity's attributes. Scalars are
//! stored as their string form; a map attribute `m` is expanded into one
//! field per entry, named `m_<key>`.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::{CodecError, RecordCodec};
use crate::store::FieldMap;

const EXPAND_SEPARATOR: char = '_';

/// Generic codec for any serde record with scalar and string-map attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashCodec;

impl HashCodec {
    pub fn new() -> Self {
        HashCodec
    }
}

fn scalar_to_string(field: &str, value: &Value) -> Result<Option<String>, CodecError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(_) | Value::Number(_) => Ok(Some(value.to_string())),
        Value::Array(_) | Value::Object(_) => Err(CodecError::Unsupported {
            field: field.to_string(),
        }),
    }
}

/// Read a stored string back as the JSON type `template` currently holds.
fn parse_scalar(field: &str, raw: &str, template: &Value) -> Result<Value, CodecError> {
    let invalid = || CodecError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
    };
    match template {
        Value::Bool(_) => raw.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
        Value::Number(_) => match serde_json::from_str::<Value>(raw) {
            Ok(number @ Value::Number(_)) => Ok(number),
            _ => Err(invalid()),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn record_object<T: Serialize>(record: &T) -> Result<Map<String, Value>, CodecError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotARecord),
    }
}

impl<T> RecordCodec<T> for HashCodec
where
    T: Serialize + DeserializeOwned,
{
    fn to_fields(&self, record: &T) -> Result<FieldMap, CodecError> {
        let mut fields = FieldMap::new();

        for (name, value) in record_object(record)? {
            match value {
                Value::Object(entries) => {
                    for (key, entry) in entries {
                        let field = format!("{}{}{}", name, EXPAND_SEPARATOR, key);
                        if let Some(s) = scalar_to_string(&field, &entry)? {
                            fields.insert(field, s);
                        }
                    }
                }
                other => {
                    if let Some(s) = scalar_to_string(&name, &other)? {
                        fields.insert(name, s);
                    }
                }
            }
        }

        Ok(fields)
    }

    fn load_fields(&self, fields: &FieldMap, record: &mut T) -> Result<(), CodecError> {
        let shape = record_object(&*record)?;
        let mut loaded = Map::with_capacity(shape.len());

        for (name, template) in shape {
            let value = match template {
                Value::Object(_) => {
                    let prefix = format!("{}{}", name, EXPAND_SEPARATOR);
                    let entries: Map<String, Value> = fields
                        .iter()
                        .filter_map(|(field, raw)| {
                            field
                                .strip_prefix(&prefix)
                                .map(|key| (key.to_string(), Value::String(raw.clone())))
                        })
                        .collect();
                    Value::Object(entries)
                }
                Value::Array(_) => return Err(CodecError::Unsupported { field: name }),
                scalar => match fields.get(&name) {
                    Some(raw) => parse_scalar(&name, raw, &scalar)?,
                    None => scalar,
                },
            };
            loaded.insert(name, value);
        }

        *record = serde_json::from_value(Value::Object(loaded))?;
        Ok(())
    }
}
