use std::fmt;

use secrecy::SecretString;

/// How a vault client should authenticate.
///
/// Token acquisition itself happens in the client, outside this crate.
#[derive(Clone)]
pub enum Credential {
    /// Service principal with a decoded client secret.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: SecretString,
    },
    /// Whatever the host provides (managed identity, developer login, ...).
    Ambient,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
            Self::Ambient => f.write_str("Ambient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_client_secret() {
        let credential = Credential::ClientSecret {
            tenant_id: "tenant".into(),
            client_id: "client".into(),
            client_secret: SecretString::from("hunter2".to_string()),
        };

        let debug = format!("{credential:?}");

        assert!(debug.contains("tenant"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
