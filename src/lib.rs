//! Load environment-scoped vault secrets into a layered configuration tree.
//!
//! A single vault namespace is shared by every deployment environment.
//! Secret names carry the environment as a leading segment
//! (`dev--Database--Host`); names without a known environment segment are
//! shared by all environments (`Serilog--MinimumLevel`). For each vault the
//! loader runs a shared pass then an environment pass, and merges the
//! resulting layers so that later layers win.

pub mod adapters;
pub mod config;
pub mod core;

pub use crate::adapters::retry::retrying_source::{RetryingSource, Sleeper, ThreadSleeper};
pub use crate::adapters::sources::in_memory::InMemorySecretSource;
pub use crate::adapters::sources::json_file::{JsonFileSecretSource, JsonFileSourceFactory};
pub use crate::config::vault_options::{DEFAULT_SECTION, VaultOptions, VaultSettings};
pub use crate::core::errors::{Result, VaultLayerError};
pub use crate::core::models::configuration::{
    ConfigurationLayer, ConfigurationTree, KEY_DELIMITER, LoadedConfiguration, PassKind,
};
pub use crate::core::models::credential::Credential;
pub use crate::core::models::environment::{EnvironmentPrefix, EnvironmentPrefixTable};
pub use crate::core::models::retry::{RetryMode, RetryPolicy};
pub use crate::core::models::secret::{SecretEntry, SecretPage, SecretProperties};
pub use crate::core::services::prefix_codec::{SEPARATOR, SecretFilter, to_config_key};
pub use crate::core::services::vault_configuration::VaultConfiguration;
pub use crate::core::services::vault_loader::{LoadPass, VaultLoader};
pub use crate::core::traits::secret_source::{SecretSource, SecretSourceFactory};
