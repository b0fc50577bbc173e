//! Mapping between original rows and the rows they were ungrouped into

use std::io::{Read, Write};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Original row key to the ordered set of keys generated from it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HiliteMapping {
    map: IndexMap<String, IndexSet<String>>,
    /// Derived key to original key
    #[serde(skip)]
    reverse: FxHashMap<String, String>,
}

impl HiliteMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the keys derived from `original`, replacing any earlier entry
    pub fn insert(&mut self, original: impl Into<String>, derived: IndexSet<String>) {
        let original = original.into();
        for key in &derived {
            self.reverse.insert(key.clone(), original.clone());
        }
        if let Some(replaced) = self.map.insert(original, derived) {
            for key in replaced {
                if !self.map.values().any(|keys| keys.contains(&key)) {
                    self.reverse.remove(&key);
                }
            }
        }
    }

    /// Keys derived from an original row
    pub fn derived_keys(&self, original: &str) -> Option<&IndexSet<String>> {
        self.map.get(original)
    }

    /// Original row a derived key came from
    pub fn original_key(&self, derived: &str) -> Option<&str> {
        self.reverse.get(derived).map(String::as_str)
    }

    /// Translate a selection of original keys to the derived rows
    pub fn map_to_derived<'a>(&self, originals: impl IntoIterator<Item = &'a str>) -> IndexSet<String> {
        originals
            .into_iter()
            .filter_map(|key| self.map.get(key))
            .flat_map(|keys| keys.iter().cloned())
            .collect()
    }

    /// Translate a selection of derived keys back to their original rows
    pub fn map_to_original<'a>(&self, derived: impl IntoIterator<Item = &'a str>) -> IndexSet<String> {
        derived
            .into_iter()
            .filter_map(|key| self.reverse.get(key))
            .cloned()
            .collect()
    }

    /// Number of original rows with an entry
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Write the mapping as a JSON object
    pub fn save(&self, writer: impl Write) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }

    /// Read a mapping written by [`HiliteMapping::save`]
    pub fn load(reader: impl Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}

impl<'de> Deserialize<'de> for HiliteMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = IndexMap::<String, IndexSet<String>>::deserialize(deserializer)?;
        let mut mapping = HiliteMapping::new();
        for (original, derived) in map {
            mapping.insert(original, derived);
        }
        Ok(mapping)
    }
}
