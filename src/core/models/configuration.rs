use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Hierarchical delimiter used by configuration keys.
pub const KEY_DELIMITER: &str = ":";

/// Which filter produced a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Shared secrets: names without a known environment prefix.
    Excluding,
    /// Secrets scoped to the active environment, prefix stripped.
    Prefixed,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluding => f.write_str("excluding"),
            Self::Prefixed => f.write_str("prefixed"),
        }
    }
}

/// Lookup form of a configuration key. Keys compare case-insensitively.
fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// A single resolved key-value pair in a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    pub key: String,
    pub value: String,
}

/// Key-value pairs produced by one load pass against one vault.
///
/// Keeps insertion order. A repeated key, in any letter case, keeps its
/// first position and takes the latest spelling and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationLayer {
    endpoint: String,
    pass: PassKind,
    entries: Vec<LayerEntry>,
    index: HashMap<String, usize>,
}

impl ConfigurationLayer {
    pub fn new(endpoint: impl Into<String>, pass: PassKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            pass,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a finished layer from key-value pairs.
    pub fn from_pairs<K, V>(
        endpoint: impl Into<String>,
        pass: PassKind,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut layer = Self::new(endpoint, pass);
        for (key, value) in pairs {
            layer.insert(key.into(), value.into());
        }
        layer
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        let folded = fold(&key);
        if let Some(&idx) = self.index.get(&folded) {
            self.entries[idx] = LayerEntry { key, value };
        } else {
            self.index.insert(folded, self.entries.len());
            self.entries.push(LayerEntry { key, value });
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn pass(&self) -> PassKind {
        self.pass
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(&fold(key))
            .map(|&idx| self.entries[idx].value.as_str())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LayerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The merged, read-only configuration view.
///
/// Keys are case-insensitive: `Db:Host` and `db:host` name the same
/// entry, and the spelling of the last layer that set it is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationTree {
    values: BTreeMap<String, LayerEntry>,
    delimiter: String,
}

impl Default for ConfigurationTree {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            delimiter: KEY_DELIMITER.to_string(),
        }
    }
}

impl ConfigurationTree {
    /// Reduce `layers` left to right with `:` as the key delimiter.
    pub fn from_layers<'a>(layers: impl IntoIterator<Item = &'a ConfigurationLayer>) -> Self {
        Self::from_layers_with(layers, KEY_DELIMITER)
    }

    /// Reduce `layers` left to right. A later layer overwrites any key an
    /// earlier layer set, whatever its letter case.
    pub fn from_layers_with<'a>(
        layers: impl IntoIterator<Item = &'a ConfigurationLayer>,
        delimiter: &str,
    ) -> Self {
        let mut values = BTreeMap::new();
        for layer in layers {
            for entry in layer.entries() {
                values.insert(fold(&entry.key), entry.clone());
            }
        }
        Self {
            values,
            delimiter: delimiter.to_string(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&fold(key)).map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(&fold(key))
    }

    /// Immediate child segment names under `path`, sorted and deduplicated
    /// case-insensitively.
    ///
    /// An empty `path` lists the top-level segments.
    pub fn child_keys(&self, path: &str) -> Vec<&str> {
        let mut children: BTreeMap<String, &str> = BTreeMap::new();
        for entry in self.values.values() {
            if let Some(rest) = self.strip_section(&entry.key, path) {
                let child = rest.split(self.delimiter.as_str()).next().unwrap_or(rest);
                children.entry(fold(child)).or_insert(child);
            }
        }
        children.into_values().collect()
    }

    /// The subtree under `path`, with the section prefix removed from keys.
    pub fn section(&self, path: &str) -> Self {
        let values = self
            .values
            .values()
            .filter_map(|entry| {
                self.strip_section(&entry.key, path).map(|rest| {
                    (
                        fold(rest),
                        LayerEntry {
                            key: rest.to_string(),
                            value: entry.value.clone(),
                        },
                    )
                })
            })
            .collect();
        Self {
            values,
            delimiter: self.delimiter.clone(),
        }
    }

    fn strip_section<'k>(&self, key: &'k str, path: &str) -> Option<&'k str> {
        if path.is_empty() {
            return Some(key);
        }
        let head = key.get(..path.len())?;
        if fold(head) != fold(path) {
            return None;
        }
        key[path.len()..].strip_prefix(self.delimiter.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .values()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat JSON object of every key and value, for diagnostics.
    ///
    /// Values are secrets; never log the result.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect(),
        )
    }
}

/// A merged tree plus when it was loaded and how often it should be refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfiguration {
    pub tree: ConfigurationTree,
    pub layer_count: usize,
    pub loaded_at: DateTime<Utc>,
    pub reload_interval: Option<Duration>,
}

impl LoadedConfiguration {
    /// True once `reload_interval` has elapsed since `loaded_at`.
    /// Without an interval the configuration never goes stale.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let Some(interval) = self.reload_interval else {
            return false;
        };
        TimeDelta::from_std(interval)
            .map(|interval| now.signed_duration_since(self.loaded_at) >= interval)
            .unwrap_or(false)
    }
}
