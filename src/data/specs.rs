//! Auxiliary per-id metadata that the primary game records do not carry,
//! e.g. which talent a module overrides and which keys it strips.
//! Loaded from `data/specs.yaml` (JSON is accepted too).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::data::DataError;

pub const DEFAULT_SPECS_PATH: &str = "data/specs.yaml";

/// Keyed lookup of opaque metadata values, `lookup("uniequip_002_x", "remove_keys")`.
pub trait SpecsLookup {
    fn lookup(&self, id: &str, key: &str) -> Option<Value>;
}

/// Lookup with no entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpecs;

impl SpecsLookup for NoSpecs {
    fn lookup(&self, _id: &str, _key: &str) -> Option<Value> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpecsTable {
    entries: HashMap<String, HashMap<String, Value>>,
}

impl SpecsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, key: impl Into<String>, value: Value) {
        self.entries
            .entry(id.into())
            .or_default()
            .insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, DataError> {
        let entries = serde_yaml::from_str(raw).map_err(|err| DataError::Parse {
            path: "<yaml>".to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { entries })
    }

    /// Load from a `.json` or YAML file. A missing file yields an empty table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("specs file '{}' not found; module overrides disabled", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| DataError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let parsed = if is_json {
            serde_json::from_str(&raw).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str(&raw).map_err(|err| err.to_string())
        };
        let entries = parsed.map_err(|message| DataError::Parse {
            path: path.display().to_string(),
            message,
        })?;
        Ok(Self { entries })
    }
}

impl SpecsLookup for SpecsTable {
    fn lookup(&self, id: &str, key: &str) -> Option<Value> {
        self.entries.get(id)?.get(key).cloned()
    }
}

/// Loose truthiness of a metadata value: `false`, `0`, `""` and `null` are off.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a metadata value as the string it is compared by; off values give `None`.
pub fn as_key_string(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(_) => Some("true".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_table_resolves_nested_keys() {
        let table = SpecsTable::from_yaml_str(
            "uniequip_002_amiya:\n  override_talent: 1\n  override_trait: true\n  remove_keys: [atk]\n",
        )
        .expect("yaml should parse");

        assert_eq!(table.lookup("uniequip_002_amiya", "override_talent"), Some(json!(1)));
        assert_eq!(table.lookup("uniequip_002_amiya", "remove_keys"), Some(json!(["atk"])));
        assert_eq!(table.lookup("uniequip_002_amiya", "token"), None);
        assert_eq!(table.lookup("missing", "override_talent"), None);
    }

    #[test]
    fn key_strings_follow_truthiness() {
        assert_eq!(as_key_string(&json!(2)), Some("2".to_string()));
        assert_eq!(as_key_string(&json!("1+")), Some("1+".to_string()));
        assert_eq!(as_key_string(&json!(false)), None);
        assert_eq!(as_key_string(&json!(0)), None);
        assert_eq!(as_key_string(&json!("")), None);
    }
}
