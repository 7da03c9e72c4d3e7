/// Listing metadata for one secret, as returned by a vault page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretProperties {
    /// Raw vault name, e.g. `dev--Database--Host`.
    pub name: String,
    /// Disabled secrets are listed by vaults but never loaded.
    pub enabled: bool,
    /// Some vaults return the value inline with the listing.
    pub value: Option<String>,
}

/// A secret name with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEntry {
    pub name: String,
    pub value: String,
}

impl SecretEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One page of a secret enumeration.
///
/// `next` is an opaque continuation token; `None` marks the last page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretPage {
    pub items: Vec<SecretProperties>,
    pub next: Option<String>,
}
