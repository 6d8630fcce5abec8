//! Load operator records and resolve them by id or name. Accepts either a
//! JSON array of operators or a `character_table`-style id -> record map.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::data::operator::Operator;
use crate::data::DataError;

pub const DEFAULT_OPERATORS_PATH: &str = "data/operators.json";

const WRAPPER_KEY: &str = "operators";

fn parse_record(record: Value, context: &str) -> Result<Operator, String> {
    serde_json::from_value(record).map_err(|err| format!("{context}: {err}"))
}

fn parse_list(records: Vec<Value>) -> Result<Vec<Operator>, String> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let context = match record.get("id").and_then(Value::as_str) {
                Some(id) => format!("operator #{index} ('{id}')"),
                None => format!("operator #{index}"),
            };
            parse_record(record, &context)
        })
        .collect()
}

fn parse_table(table: Map<String, Value>) -> Result<Vec<Operator>, String> {
    table
        .into_iter()
        .map(|(id, record)| {
            let mut operator = parse_record(record, &format!("operator '{id}'"))?;
            operator.id.get_or_insert(id);
            Ok(operator)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize a string for lookup: lowercase, collapse spaces/underscores.
fn normalize_lookup(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, Default)]
pub struct DataStore {
    operators: Vec<Operator>,
}

impl DataStore {
    pub fn new(mut operators: Vec<Operator>) -> Self {
        operators.sort_by(|a, b| a.id().cmp(b.id()));
        Self { operators }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DataError> {
        Self::parse(raw, "<inline>")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DataError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::parse(&raw, &path.display().to_string())?;
        tracing::info!(
            "loaded {} operator(s) from '{}'",
            store.operators.len(),
            path.display()
        );
        Ok(store)
    }

    /// Accepts a bare array, `{"operators": [...]}`, or an id -> record
    /// table. Errors name the record that failed.
    fn parse(raw: &str, origin: &str) -> Result<Self, DataError> {
        let parse_error = |message: String| DataError::Parse {
            path: origin.to_string(),
            message,
        };
        let parsed: Value = serde_json::from_str(raw).map_err(|err| parse_error(err.to_string()))?;
        let operators = match parsed {
            Value::Array(records) => parse_list(records),
            Value::Object(mut map) => match map.remove(WRAPPER_KEY) {
                Some(Value::Array(records)) => parse_list(records),
                Some(record) => {
                    map.insert(WRAPPER_KEY.to_string(), record);
                    parse_table(map)
                }
                None => parse_table(map),
            },
            other => Err(format!(
                "expected an array or object of operators, found {}",
                json_kind(&other)
            )),
        }
        .map_err(parse_error)?;
        Ok(Self::new(operators))
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Resolve by exact id first, then by normalized id or name.
    pub fn resolve(&self, name_or_id: &str) -> Option<&Operator> {
        if let Some(found) = self.operators.iter().find(|op| op.id() == name_or_id) {
            return Some(found);
        }
        let normalized = normalize_lookup(name_or_id);
        self.operators.iter().find(|op| {
            normalize_lookup(op.id()) == normalized || normalize_lookup(&op.name) == normalized
        })
    }
}
