use tracing::debug;

use crate::config::vault_options::{VaultOptions, VaultSettings};
use crate::core::errors::Result;
use crate::core::models::configuration::LoadedConfiguration;
use crate::core::models::environment::EnvironmentPrefixTable;
use crate::core::services::vault_loader::VaultLoader;
use crate::core::traits::secret_source::SecretSourceFactory;

/// Loads the vault configuration for a hosting environment.
pub struct VaultConfiguration;

impl VaultConfiguration {
    /// Resolve `environment`, connect to every configured vault and load.
    ///
    /// The environment is resolved before any endpoint is parsed or any
    /// vault is contacted, so an unknown name fails fast.
    ///
    /// # Errors
    ///
    /// - `UnknownEnvironment` when `table` has no entry for `environment`.
    /// - `InvalidConfig` / `InvalidClientSecret` for unusable options.
    /// - Whatever the factory or a source reports, e.g. `VaultUnavailable`.
    pub fn for_environment<F: SecretSourceFactory>(
        environment: &str,
        options: &VaultOptions,
        table: &EnvironmentPrefixTable,
        factory: &F,
    ) -> Result<LoadedConfiguration> {
        let loader = VaultLoader::for_environment(environment, table)?
            .with_reload_interval(options.reload_interval());

        let endpoints = options.endpoints()?;
        let credential = options.credential()?;
        let retry = options.retry_policy();

        debug!(
            environment,
            prefix = loader.prefix(),
            endpoints = endpoints.len(),
            "Connecting to vaults"
        );

        let sources = endpoints
            .iter()
            .map(|endpoint| factory.connect(endpoint, &credential, &retry))
            .collect::<Result<Vec<_>>>()?;

        loader.load(&sources)
    }

    /// Same as [`Self::for_environment`], using parsed startup settings.
    pub fn from_settings<F: SecretSourceFactory>(
        environment: &str,
        settings: &VaultSettings,
        factory: &F,
    ) -> Result<LoadedConfiguration> {
        Self::for_environment(environment, &settings.options, &settings.prefixes, factory)
    }
}
