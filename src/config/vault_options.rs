use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use secrecy::SecretString;
use serde::Deserialize;

use crate::core::errors::{Result, VaultLayerError};
use crate::core::models::credential::Credential;
use crate::core::models::environment::{EnvironmentPrefix, EnvironmentPrefixTable};
use crate::core::models::retry::RetryPolicy;

/// Section read when the caller does not name one.
pub const DEFAULT_SECTION: &str = "vault";

/// Separator between endpoints in `base_url`.
const ENDPOINT_SEPARATOR: char = ';';

static CLIENT_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn client_id_pattern() -> &'static Regex {
    CLIENT_ID_PATTERN.get_or_init(|| {
        Regex::new(
            r"^\{?[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\}?$",
        )
        .unwrap_or_else(|e| unreachable!("client id pattern is valid: {e}"))
    })
}

/// Vault startup options, e.g. the `[vault]` section of `vault.toml`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct VaultOptions {
    /// One or more vault URLs separated by `;`.
    pub base_url: String,
    pub tenant_id: String,
    /// Service principal id; must look like a GUID when set.
    pub client_id: String,
    /// Base64 encoding of the service principal secret.
    pub client_secret: String,
    pub reload_interval_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl fmt::Debug for VaultOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultOptions")
            .field("base_url", &self.base_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("reload_interval_secs", &self.reload_interval_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl VaultOptions {
    /// Vault endpoints in the order they were listed.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when no endpoint is listed or one has no scheme.
    pub fn endpoints(&self) -> Result<Vec<String>> {
        let endpoints: Vec<String> = self
            .base_url
            .split(ENDPOINT_SEPARATOR)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();

        if endpoints.is_empty() {
            return Err(VaultLayerError::InvalidConfig {
                detail: "base_url must list at least one vault endpoint".into(),
            });
        }
        if let Some(bad) = endpoints.iter().find(|e| !e.contains("://")) {
            return Err(VaultLayerError::InvalidConfig {
                detail: format!("vault endpoint '{bad}' is not a URL"),
            });
        }
        Ok(endpoints)
    }

    /// Service principal credential when tenant, client and secret are all
    /// set; otherwise the ambient credential of the host.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a malformed client id, `InvalidClientSecret`
    /// when the secret is not base64-encoded UTF-8.
    pub fn credential(&self) -> Result<Credential> {
        let client_id = self.client_id.trim();
        if !client_id.is_empty() && !client_id_pattern().is_match(client_id) {
            return Err(VaultLayerError::InvalidConfig {
                detail: format!("client_id '{client_id}' must be a valid GUID"),
            });
        }

        let tenant_id = self.tenant_id.trim();
        let encoded = self.client_secret.trim();
        if tenant_id.is_empty() || client_id.is_empty() || encoded.is_empty() {
            return Ok(Credential::Ambient);
        }

        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| VaultLayerError::InvalidClientSecret {
                reason: e.to_string(),
            })?;
        let secret = String::from_utf8(bytes).map_err(|e| VaultLayerError::InvalidClientSecret {
            reason: e.to_string(),
        })?;

        Ok(Credential::ClientSecret {
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: SecretString::from(secret),
        })
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        self.reload_interval_secs.map(Duration::from_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::default();
        match self.max_retries {
            Some(max_retries) => policy.with_max_retries(max_retries),
            None => policy,
        }
    }
}

/// Startup settings: vault options plus the environment prefix table.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub options: VaultOptions,
    pub prefixes: EnvironmentPrefixTable,
}

impl VaultSettings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path, section: &str) -> Result<Self> {
        if !path.exists() {
            return Err(VaultLayerError::InvalidConfig {
                detail: format!("{} not found", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, section)
    }

    /// Parse settings from TOML.
    ///
    /// Options come from `[section]`. An `[environments]` table, when
    /// present, replaces the default prefix table.
    pub fn from_toml_str(content: &str, section: &str) -> Result<Self> {
        let document: toml::Table = toml::from_str(content).map_err(|e| {
            VaultLayerError::InvalidConfig {
                detail: format!("Failed to parse vault settings: {e}"),
            }
        })?;

        let options = match document.get(section) {
            Some(value) => value.clone().try_into::<VaultOptions>().map_err(|e| {
                VaultLayerError::InvalidConfig {
                    detail: format!("Invalid [{section}] section: {e}"),
                }
            })?,
            None => {
                return Err(VaultLayerError::InvalidConfig {
                    detail: format!("Missing [{section}] section"),
                });
            }
        };

        let prefixes = match document.get("environments") {
            Some(value) => {
                let entries: BTreeMap<String, String> =
                    value.clone().try_into().map_err(|e| VaultLayerError::InvalidConfig {
                        detail: format!("Invalid [environments] table: {e}"),
                    })?;
                EnvironmentPrefixTable::new(
                    entries
                        .into_iter()
                        .map(|(env, prefix)| EnvironmentPrefix::new(env, prefix)),
                )?
            }
            None => EnvironmentPrefixTable::default(),
        };

        Ok(Self { options, prefixes })
    }
}
