use std::collections::BTreeSet;

use crate::core::models::configuration::KEY_DELIMITER;

/// Structural separator inside vault secret names. Vaults reject `:`.
pub const SEPARATOR: &str = "--";

/// Replace every `--` in a vault name with the configuration delimiter.
///
/// A key with no remaining separator passes through unchanged.
pub fn to_config_key(name: &str, delimiter: &str) -> String {
    name.replace(SEPARATOR, delimiter)
}

/// Decides which secrets a load pass takes, and under which key.
///
/// Both variants are total: every name gets a decision, nothing fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretFilter {
    /// Only `{prefix}--...` names, loaded with the prefix stripped.
    Prefixed {
        /// Prefix including the trailing separator, e.g. `dev--`.
        marker: String,
        delimiter: String,
    },
    /// Every name whose leading segment is not a known environment prefix.
    Excluding {
        prefixes: BTreeSet<String>,
        delimiter: String,
    },
}

impl SecretFilter {
    pub fn prefixed(prefix: &str) -> Self {
        Self::Prefixed {
            marker: format!("{prefix}{SEPARATOR}"),
            delimiter: KEY_DELIMITER.to_string(),
        }
    }

    pub fn excluding<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Excluding {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            delimiter: KEY_DELIMITER.to_string(),
        }
    }

    /// Use `delimiter` instead of `:` when building keys.
    pub fn with_delimiter(self, delimiter: &str) -> Self {
        match self {
            Self::Prefixed { marker, .. } => Self::Prefixed {
                marker,
                delimiter: delimiter.to_string(),
            },
            Self::Excluding { prefixes, .. } => Self::Excluding {
                prefixes,
                delimiter: delimiter.to_string(),
            },
        }
    }

    /// Whether `name` belongs to this pass.
    ///
    /// The excluding variant compares the whole segment before the first
    /// `--` against the prefix set. `devops--X` is shared even when `dev`
    /// is a known prefix.
    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::Prefixed { marker, .. } => name.starts_with(marker.as_str()),
            Self::Excluding { prefixes, .. } => match name.find(SEPARATOR) {
                Some(i) => !prefixes.contains(&name[..i]),
                None => true,
            },
        }
    }

    /// Configuration key for a name this filter includes.
    ///
    /// `dev--` alone maps to the empty key under `Prefixed("dev")`.
    pub fn key_for(&self, name: &str) -> String {
        match self {
            Self::Prefixed { marker, delimiter } => {
                let rest = name.strip_prefix(marker.as_str()).unwrap_or(name);
                to_config_key(rest, delimiter)
            }
            Self::Excluding { delimiter, .. } => to_config_key(name, delimiter),
        }
    }

    /// `includes` and `key_for` in one step.
    pub fn apply(&self, name: &str) -> Option<String> {
        self.includes(name).then(|| self.key_for(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> SecretFilter {
        SecretFilter::excluding(["dev", "qa", "prod"])
    }

    #[test]
    fn prefixed_includes_only_its_marker() {
        let filter = SecretFilter::prefixed("dev");

        assert!(filter.includes("dev--Foo"));
        assert!(filter.includes("dev--Foo--Bar"));
        assert!(!filter.includes("prod--Foo"));
        assert!(!filter.includes("dev-Foo"));
        assert!(!filter.includes("devFoo"));
        assert!(!filter.includes("Foo--dev--Bar"));
    }

    #[test]
    fn prefixed_strips_prefix_and_maps_separators() {
        let filter = SecretFilter::prefixed("dev");

        assert_eq!(filter.key_for("dev--Foo--Bar"), "Foo:Bar");
        assert_eq!(filter.key_for("dev--Secret1"), "Secret1");
    }

    #[test]
    fn prefixed_strips_only_the_leading_marker() {
        let filter = SecretFilter::prefixed("dev");

        assert_eq!(filter.key_for("dev--dev--X"), "dev:X");
    }

    #[test]
    fn prefixed_bare_marker_gives_empty_key() {
        let filter = SecretFilter::prefixed("dev");

        assert!(filter.includes("dev--"));
        assert_eq!(filter.key_for("dev--"), "");
    }

    #[test]
    fn excluding_takes_names_without_separator() {
        let filter = known();

        assert!(filter.includes("ConnectionString"));
        assert!(filter.includes("dev"));
        assert_eq!(filter.key_for("ConnectionString"), "ConnectionString");
    }

    #[test]
    fn excluding_rejects_known_environment_segments() {
        let filter = known();

        assert!(!filter.includes("dev--Foo"));
        assert!(!filter.includes("qa--Foo--Bar"));
        assert!(!filter.includes("prod--Foo"));
        assert!(!filter.includes("prod--"));
    }

    #[test]
    fn excluding_keeps_unregistered_segments() {
        let filter = known();

        assert!(filter.includes("Serilog--MinimumLevel"));
        assert_eq!(filter.key_for("Serilog--MinimumLevel"), "Serilog:MinimumLevel");
    }

    #[test]
    fn excluding_matches_whole_segment_only() {
        let filter = known();

        assert!(filter.includes("devops--Token"));
        assert!(filter.includes("Dev--Token"));
        assert!(filter.includes("de--Token"));
        assert_eq!(filter.key_for("devops--Token"), "devops:Token");
    }

    #[test]
    fn excluding_uses_first_separator() {
        let filter = known();

        assert!(filter.includes("App--dev--Foo"));
        assert_eq!(filter.key_for("App--dev--Foo"), "App:dev:Foo");
    }

    #[test]
    fn excluding_leading_separator_has_empty_segment() {
        let filter = known();

        assert!(filter.includes("--Foo"));
        assert_eq!(filter.key_for("--Foo"), ":Foo");
    }

    #[test]
    fn excluding_with_empty_set_takes_everything() {
        let filter = SecretFilter::excluding(Vec::<String>::new());

        assert!(filter.includes("dev--Foo"));
    }

    #[test]
    fn apply_combines_decision_and_key() {
        assert_eq!(
            SecretFilter::prefixed("qa").apply("qa--Db--Host"),
            Some("Db:Host".to_string())
        );
        assert_eq!(SecretFilter::prefixed("qa").apply("dev--Db"), None);
        assert_eq!(known().apply("qa--Db"), None);
    }

    #[test]
    fn custom_delimiter() {
        let filter = SecretFilter::prefixed("dev").with_delimiter("__");

        assert_eq!(filter.key_for("dev--Db--Host"), "Db__Host");
    }

    #[test]
    fn triple_dash_splits_at_first_pair() {
        assert_eq!(to_config_key("A---B", ":"), "A:-B");
    }
}
