use std::collections::{BTreeMap, BTreeSet};

use crate::core::errors::{Result, VaultLayerError};
use crate::core::services::prefix_codec::SEPARATOR;

/// Maps a deployment environment to the short prefix used in vault names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentPrefix {
    pub environment: String,
    pub prefix: String,
}

impl EnvironmentPrefix {
    pub fn new(environment: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            prefix: prefix.into(),
        }
    }
}

/// The environments shipped by default, in declaration order.
pub const DEFAULT_PREFIXES: [(&str, &str); 3] = [
    ("Development", "dev"),
    ("Staging", "qa"),
    ("Production", "prod"),
];

/// Immutable lookup from environment name to vault-name prefix.
///
/// Built once at startup. Prefixes are non-empty and unique, so every
/// scoped secret belongs to exactly one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentPrefixTable {
    entries: BTreeMap<String, String>,
}

impl Default for EnvironmentPrefixTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_PREFIXES
                .iter()
                .map(|(env, prefix)| (env.to_string(), prefix.to_string()))
                .collect(),
        }
    }
}

impl EnvironmentPrefixTable {
    /// Build a table from injected entries.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when an environment is listed twice, or a prefix is
    /// empty, contains the `--` separator, or is shared by two environments.
    pub fn new(entries: impl IntoIterator<Item = EnvironmentPrefix>) -> Result<Self> {
        let mut table = BTreeMap::new();
        let mut seen_prefixes = BTreeSet::new();

        for entry in entries {
            if entry.prefix.is_empty() {
                return Err(VaultLayerError::InvalidConfig {
                    detail: format!("environment '{}' has an empty prefix", entry.environment),
                });
            }
            if entry.prefix.contains(SEPARATOR) {
                return Err(VaultLayerError::InvalidConfig {
                    detail: format!(
                        "prefix '{}' for environment '{}' must not contain '{SEPARATOR}'",
                        entry.prefix, entry.environment
                    ),
                });
            }
            if !seen_prefixes.insert(entry.prefix.clone()) {
                return Err(VaultLayerError::InvalidConfig {
                    detail: format!("prefix '{}' is used by more than one environment", entry.prefix),
                });
            }
            if table.contains_key(&entry.environment) {
                return Err(VaultLayerError::InvalidConfig {
                    detail: format!("environment '{}' is listed twice", entry.environment),
                });
            }
            table.insert(entry.environment, entry.prefix);
        }

        Ok(Self { entries: table })
    }

    /// Look up the prefix for `environment` (exact, case-sensitive).
    ///
    /// # Errors
    ///
    /// `UnknownEnvironment` when the table has no entry. Callers must treat
    /// this as fatal: an empty prefix would silently route nothing.
    pub fn resolve(&self, environment: &str) -> Result<&str> {
        self.entries
            .get(environment)
            .map(String::as_str)
            .ok_or_else(|| VaultLayerError::UnknownEnvironment {
                name: environment.to_string(),
                available: self.environments().collect::<Vec<_>>().join(", "),
            })
    }

    /// Every registered prefix; the exclusion set for the shared pass.
    pub fn all_prefixes(&self) -> BTreeSet<String> {
        self.entries.values().cloned().collect()
    }

    /// Registered environment names, sorted.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_resolves_known_environments() {
        let table = EnvironmentPrefixTable::default();

        assert_eq!(table.resolve("Development").unwrap(), "dev");
        assert_eq!(table.resolve("Staging").unwrap(), "qa");
        assert_eq!(table.resolve("Production").unwrap(), "prod");
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let table = EnvironmentPrefixTable::default();

        assert!(table.resolve("development").is_err());
        assert!(table.resolve("PRODUCTION").is_err());
    }

    #[test]
    fn resolve_unknown_environment_fails() {
        let table = EnvironmentPrefixTable::default();

        let err = table.resolve("QA2").unwrap_err();

        assert!(matches!(err, VaultLayerError::UnknownEnvironment { .. }));
        let msg = err.to_string();
        assert!(msg.contains("QA2"));
        assert!(msg.contains("Development, Production, Staging"));
    }

    #[test]
    fn all_prefixes_covers_every_environment() {
        let table = EnvironmentPrefixTable::default();

        let prefixes: Vec<String> = table.all_prefixes().into_iter().collect();

        assert_eq!(prefixes, vec!["dev", "prod", "qa"]);
    }

    #[test]
    fn injected_table_replaces_defaults() {
        let table = EnvironmentPrefixTable::new([
            EnvironmentPrefix::new("Local", "loc"),
            EnvironmentPrefix::new("Production", "prd"),
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("Production").unwrap(), "prd");
        assert!(table.resolve("Development").is_err());
    }

    #[test]
    fn injected_table_rejects_empty_prefix() {
        let result = EnvironmentPrefixTable::new([EnvironmentPrefix::new("Local", "")]);

        assert!(matches!(result, Err(VaultLayerError::InvalidConfig { .. })));
    }

    #[test]
    fn injected_table_rejects_duplicate_prefix() {
        let result = EnvironmentPrefixTable::new([
            EnvironmentPrefix::new("Staging", "qa"),
            EnvironmentPrefix::new("Testing", "qa"),
        ]);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("more than one environment"));
    }

    #[test]
    fn injected_table_rejects_separator_in_prefix() {
        let result = EnvironmentPrefixTable::new([EnvironmentPrefix::new("Local", "lo--c")]);

        assert!(result.is_err());
    }

    #[test]
    fn injected_table_rejects_duplicate_environment() {
        let result = EnvironmentPrefixTable::new([
            EnvironmentPrefix::new("Local", "a"),
            EnvironmentPrefix::new("Local", "b"),
        ]);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("listed twice"));
    }
}
