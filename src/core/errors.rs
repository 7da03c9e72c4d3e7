/// All domain errors for vaultlayer.
///
/// Each variant provides enough context to diagnose the issue
/// without needing a debugger.
#[derive(Debug, thiserror::Error)]
pub enum VaultLayerError {
    #[error(
        "Environment '{name}' has no secret prefix\n\n  \
         Known environments: {available}\n  \
         Check the hosting environment name (matching is case-sensitive)\n  \
         or add an entry to the [environments] table."
    )]
    UnknownEnvironment { name: String, available: String },

    #[error(
        "Vault '{endpoint}' is unavailable: {reason}\n\n  \
         The vault client exhausted its retries.\n  \
         Check network access and the credentials configured for this vault."
    )]
    VaultUnavailable { endpoint: String, reason: String },

    #[error("Transient failure talking to vault '{endpoint}': {reason}")]
    Transient { endpoint: String, reason: String },

    #[error("Secret '{name}' not found in vault '{endpoint}'")]
    SecretNotFound { endpoint: String, name: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "Client secret is not valid base64: {reason}\n\n  \
         The client_secret option must hold the base64 encoding of the secret."
    )]
    InvalidClientSecret { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VaultLayerError {
    /// Whether the vault client may retry the failed call.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Report a transient failure as terminal once no retry is left to take.
    pub fn into_terminal(self) -> Self {
        match self {
            Self::Transient { endpoint, reason } => Self::VaultUnavailable { endpoint, reason },
            other => other,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VaultLayerError>;
