//! Blackboards: ordered `(key, value)` modifier bags from the game data,
//! resolved into an insertion-ordered key -> value map.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackboardEntry {
    pub key: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_str: Option<String>,
}

impl BlackboardEntry {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
            value_str: None,
        }
    }
}

/// Insertion-ordered map. Overwriting a key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    entries: Vec<(String, f64)>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| *value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Copies every entry of `other` into self; keys from `other` win.
    pub fn merge(&mut self, other: &Blackboard) {
        for (key, value) in &other.entries {
            self.insert(key.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Blackboard {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut board = Blackboard::new();
        for (key, value) in iter {
            board.insert(key, value);
        }
        board
    }
}

impl Serialize for Blackboard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Resolve a blackboard entry list. Later duplicates overwrite earlier ones.
pub fn resolve_blackboard(entries: &[BlackboardEntry]) -> Blackboard {
    entries
        .iter()
        .map(|entry| (entry.key.as_str(), entry.value))
        .collect()
}
