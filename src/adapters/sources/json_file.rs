use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::{Result, VaultLayerError};
use crate::core::models::credential::Credential;
use crate::core::models::retry::RetryPolicy;
use crate::core::models::secret::{SecretPage, SecretProperties};
use crate::core::traits::secret_source::{SecretSource, SecretSourceFactory};

/// One record of a vault export file.
#[derive(Debug, Clone, Deserialize)]
struct ExportedSecret {
    name: String,
    value: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Secret source reading a JSON vault export.
///
/// The file holds an array of `{ "name", "value", "enabled" }` objects
/// (`enabled` defaults to `true`). It is read once when the source is
/// opened, so a reload needs a fresh source.
#[derive(Debug, Clone)]
pub struct JsonFileSecretSource {
    endpoint: String,
    secrets: Vec<ExportedSecret>,
}

impl JsonFileSecretSource {
    /// Open `path`, labelling layers with the file path.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_as(path, &path.display().to_string())
    }

    /// Open `path`, labelling layers with `endpoint`.
    pub fn open_as(path: &Path, endpoint: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content, endpoint, path)
    }

    fn from_json(content: &str, endpoint: &str, path: &Path) -> Result<Self> {
        let secrets: Vec<ExportedSecret> =
            serde_json::from_str(content).map_err(|e| VaultLayerError::InvalidConfig {
                detail: format!("Malformed vault export {}: {e}", path.display()),
            })?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            secrets,
        })
    }

    /// Endpoint for a `file://` URL, or `None` for other schemes.
    pub fn path_from_endpoint(endpoint: &str) -> Option<PathBuf> {
        endpoint.strip_prefix("file://").map(PathBuf::from)
    }
}

impl SecretSource for JsonFileSecretSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn list_page(&self, _next: Option<&str>) -> Result<SecretPage> {
        Ok(SecretPage {
            items: self
                .secrets
                .iter()
                .map(|s| SecretProperties {
                    name: s.name.clone(),
                    enabled: s.enabled,
                    value: Some(s.value.clone()),
                })
                .collect(),
            next: None,
        })
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        self.secrets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value.clone())
            .ok_or_else(|| VaultLayerError::SecretNotFound {
                endpoint: self.endpoint.clone(),
                name: name.to_string(),
            })
    }
}

/// Connects `file://` endpoints to JSON vault exports.
///
/// Credentials and retry policy do not apply to local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileSourceFactory;

impl SecretSourceFactory for JsonFileSourceFactory {
    type Source = JsonFileSecretSource;

    fn connect(
        &self,
        endpoint: &str,
        _credential: &Credential,
        _retry: &RetryPolicy,
    ) -> Result<Self::Source> {
        let path = JsonFileSecretSource::path_from_endpoint(endpoint).ok_or_else(|| {
            VaultLayerError::InvalidConfig {
                detail: format!("'{endpoint}' is not a file:// endpoint"),
            }
        })?;
        JsonFileSecretSource::open_as(&path, endpoint).map_err(|e| match e {
            VaultLayerError::Io(io) => VaultLayerError::VaultUnavailable {
                endpoint: endpoint.to_string(),
                reason: io.to_string(),
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<JsonFileSecretSource> {
        JsonFileSecretSource::from_json(content, "file://export.json", Path::new("export.json"))
    }

    #[test]
    fn parses_export_with_default_enabled() {
        let source = parse(
            r#"[
                {"name": "dev--Db--Host", "value": "localhost"},
                {"name": "Legacy", "value": "x", "enabled": false}
            ]"#,
        )
        .unwrap();

        let page = source.list_page(None).unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].enabled);
        assert!(!page.items[1].enabled);
        assert_eq!(page.items[0].value.as_deref(), Some("localhost"));
        assert_eq!(page.next, None);
    }

    #[test]
    fn malformed_export_is_invalid_config() {
        let err = parse("{ not json").unwrap_err();

        assert!(matches!(err, VaultLayerError::InvalidConfig { .. }));
        assert!(err.to_string().contains("export.json"));
    }

    #[test]
    fn get_secret_by_name() {
        let source = parse(r#"[{"name": "A", "value": "1"}]"#).unwrap();

        assert_eq!(source.get_secret("A").unwrap(), "1");
        assert!(source.get_secret("B").is_err());
    }

    #[test]
    fn factory_rejects_non_file_endpoints() {
        let result = JsonFileSourceFactory.connect(
            "https://a.vault.azure.net/",
            &Credential::Ambient,
            &RetryPolicy::default(),
        );

        assert!(matches!(result, Err(VaultLayerError::InvalidConfig { .. })));
    }

    #[test]
    fn factory_reports_missing_export_as_unavailable() {
        let result = JsonFileSourceFactory.connect(
            "file:///definitely/not/here.json",
            &Credential::Ambient,
            &RetryPolicy::default(),
        );

        assert!(matches!(
            result,
            Err(VaultLayerError::VaultUnavailable { .. })
        ));
    }

    #[test]
    fn file_endpoint_maps_to_path() {
        assert_eq!(
            JsonFileSecretSource::path_from_endpoint("file:///etc/vault.json"),
            Some(PathBuf::from("/etc/vault.json"))
        );
        assert_eq!(
            JsonFileSecretSource::path_from_endpoint("https://a.vault.azure.net/"),
            None
        );
    }
}
