use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace};

use crate::core::errors::{Result, VaultLayerError};
use crate::core::models::configuration::{
    ConfigurationLayer, ConfigurationTree, KEY_DELIMITER, LoadedConfiguration, PassKind,
};
use crate::core::models::environment::EnvironmentPrefixTable;
use crate::core::services::prefix_codec::SecretFilter;
use crate::core::traits::secret_source::SecretSource;

/// One scheduled load pass: which endpoint, which filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPass {
    pub endpoint_index: usize,
    pub kind: PassKind,
}

/// Loads vault secrets in two passes per endpoint and merges the layers.
///
/// For every endpoint, in list order:
/// 1. the excluding pass loads shared secrets (no known environment prefix);
/// 2. the prefixed pass, when a prefix is active, loads the environment's
///    own secrets with the prefix stripped.
///
/// Layers are reduced in exactly that order, so a later layer wins any key
/// collision regardless of which pass finished first.
#[derive(Debug, Clone)]
pub struct VaultLoader {
    prefix: String,
    excluded: BTreeSet<String>,
    delimiter: String,
    reload_interval: Option<Duration>,
}

impl VaultLoader {
    /// `prefix` may be empty, which skips the prefixed pass.
    pub fn new(prefix: impl Into<String>, excluded: BTreeSet<String>) -> Self {
        Self {
            prefix: prefix.into(),
            excluded,
            delimiter: KEY_DELIMITER.to_string(),
            reload_interval: None,
        }
    }

    /// Resolve `environment` against `table`.
    ///
    /// # Errors
    ///
    /// `UnknownEnvironment` before any vault is contacted.
    pub fn for_environment(environment: &str, table: &EnvironmentPrefixTable) -> Result<Self> {
        let prefix = table.resolve(environment)?;
        Ok(Self::new(prefix, table.all_prefixes()))
    }

    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    /// Recorded on each load; the loader never acts on it by itself.
    pub fn with_reload_interval(mut self, interval: Option<Duration>) -> Self {
        self.reload_interval = interval;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        self.reload_interval
    }

    /// Filters applied to every endpoint, in order.
    pub fn filters(&self) -> Vec<(PassKind, SecretFilter)> {
        let mut filters = vec![(
            PassKind::Excluding,
            SecretFilter::excluding(self.excluded.iter().cloned()).with_delimiter(&self.delimiter),
        )];
        if !self.prefix.is_empty() {
            filters.push((
                PassKind::Prefixed,
                SecretFilter::prefixed(&self.prefix).with_delimiter(&self.delimiter),
            ));
        }
        filters
    }

    /// The pass schedule for `endpoint_count` endpoints.
    pub fn plan(&self, endpoint_count: usize) -> Vec<LoadPass> {
        let kinds: Vec<PassKind> = self.filters().into_iter().map(|(kind, _)| kind).collect();
        (0..endpoint_count)
            .flat_map(|endpoint_index| {
                kinds.iter().map(move |&kind| LoadPass {
                    endpoint_index,
                    kind,
                })
            })
            .collect()
    }

    /// Run one pass against one source.
    ///
    /// Enumerates every page, skips disabled secrets and fetches values
    /// only for names the filter includes. Retrying is the source's job, so a
    /// transient error surfacing here is returned as `VaultUnavailable`.
    pub fn load_pass<S: SecretSource + ?Sized>(
        &self,
        source: &S,
        kind: PassKind,
        filter: &SecretFilter,
    ) -> Result<ConfigurationLayer> {
        let mut layer = ConfigurationLayer::new(source.endpoint(), kind);
        let mut skipped = 0usize;

        for properties in source.list_all().map_err(VaultLayerError::into_terminal)? {
            if !properties.enabled {
                trace!(name = %properties.name, "Skipping disabled secret");
                skipped += 1;
                continue;
            }
            let Some(key) = filter.apply(&properties.name) else {
                skipped += 1;
                continue;
            };
            let value = match properties.value {
                Some(value) => value,
                None => source
                    .get_secret(&properties.name)
                    .map_err(VaultLayerError::into_terminal)?,
            };
            layer.insert(key, value);
        }

        debug!(
            endpoint = source.endpoint(),
            pass = %kind,
            loaded = layer.len(),
            skipped,
            "Loaded vault layer"
        );
        Ok(layer)
    }

    /// Produce every layer in merge order. Stops at the first failing pass.
    pub fn load_layers<S: SecretSource>(&self, sources: &[S]) -> Result<Vec<ConfigurationLayer>> {
        let filters = self.filters();
        let mut layers = Vec::with_capacity(sources.len() * filters.len());
        for source in sources {
            for (kind, filter) in &filters {
                layers.push(self.load_pass(source, *kind, filter)?);
            }
        }
        Ok(layers)
    }

    /// Load and merge every endpoint.
    pub fn load<S: SecretSource>(&self, sources: &[S]) -> Result<LoadedConfiguration> {
        self.load_at(sources, Utc::now())
    }

    /// Reload when `current` has gone stale at `now`.
    ///
    /// Returns `None` while `current` is still fresh.
    pub fn refresh<S: SecretSource>(
        &self,
        current: &LoadedConfiguration,
        sources: &[S],
        now: DateTime<Utc>,
    ) -> Result<Option<LoadedConfiguration>> {
        if !current.is_stale(now) {
            return Ok(None);
        }
        debug!(loaded_at = %current.loaded_at, "Vault configuration is stale, reloading");
        self.load_at(sources, now).map(Some)
    }

    fn load_at<S: SecretSource>(
        &self,
        sources: &[S],
        now: DateTime<Utc>,
    ) -> Result<LoadedConfiguration> {
        let layers = self.load_layers(sources)?;
        let tree = ConfigurationTree::from_layers_with(&layers, &self.delimiter);

        info!(
            endpoints = sources.len(),
            layers = layers.len(),
            keys = tree.len(),
            "Loaded vault configuration"
        );

        Ok(LoadedConfiguration {
            tree,
            layer_count: layers.len(),
            loaded_at: now,
            reload_interval: self.reload_interval,
        })
    }
}
