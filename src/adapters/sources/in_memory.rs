use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::errors::{Result, VaultLayerError};
use crate::core::models::secret::{SecretEntry, SecretPage, SecretProperties};
use crate::core::traits::secret_source::SecretSource;

const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone)]
struct StoredSecret {
    entry: SecretEntry,
    enabled: bool,
}

/// Secret source backed by a fixed list, paged like a real vault.
///
/// Useful for embedding static secrets and for exercising the loader
/// without a network. Call counters and failure injection let tests
/// observe how the source was used.
#[derive(Debug)]
pub struct InMemorySecretSource {
    endpoint: String,
    secrets: Vec<StoredSecret>,
    page_size: usize,
    inline_values: bool,
    unavailable: Option<String>,
    transient_failures: AtomicUsize,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl InMemorySecretSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            secrets: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            inline_values: false,
            unavailable: None,
            transient_failures: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// Add an enabled secret.
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.push(StoredSecret {
            entry: SecretEntry::new(name, value),
            enabled: true,
        });
        self
    }

    /// Add a secret that is listed but disabled.
    pub fn with_disabled_secret(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.secrets.push(StoredSecret {
            entry: SecretEntry::new(name, value),
            enabled: false,
        });
        self
    }

    pub fn with_secrets<I, N, V>(self, secrets: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        secrets
            .into_iter()
            .fold(self, |source, (name, value)| source.with_secret(name, value))
    }

    /// Items per listing page (at least one).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Return values in listing pages instead of via `get_secret`.
    pub fn with_inline_values(mut self) -> Self {
        self.inline_values = true;
        self
    }

    /// Fail every call with `VaultUnavailable`.
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }

    /// Fail the next `count` calls with a transient error.
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Number of `list_page` calls made so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_secret` calls made so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if let Some(reason) = &self.unavailable {
            return Err(VaultLayerError::VaultUnavailable {
                endpoint: self.endpoint.clone(),
                reason: reason.clone(),
            });
        }
        let consumed = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            return Err(VaultLayerError::Transient {
                endpoint: self.endpoint.clone(),
                reason: "simulated throttling".into(),
            });
        }
        Ok(())
    }
}

impl SecretSource for InMemorySecretSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn list_page(&self, next: Option<&str>) -> Result<SecretPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let start = match next {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| VaultLayerError::VaultUnavailable {
                    endpoint: self.endpoint.clone(),
                    reason: format!("invalid continuation token '{token}'"),
                })?,
        };
        let end = start.saturating_add(self.page_size).min(self.secrets.len());

        let items = self.secrets[start.min(end)..end]
            .iter()
            .map(|s| SecretProperties {
                name: s.entry.name.clone(),
                enabled: s.enabled,
                value: self.inline_values.then(|| s.entry.value.clone()),
            })
            .collect();

        Ok(SecretPage {
            items,
            next: (end < self.secrets.len()).then(|| end.to_string()),
        })
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        self.secrets
            .iter()
            .find(|s| s.entry.name == name)
            .map(|s| s.entry.value.clone())
            .ok_or_else(|| VaultLayerError::SecretNotFound {
                endpoint: self.endpoint.clone(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_follow_continuation_tokens() {
        let source = InMemorySecretSource::new("mem://a")
            .with_secrets([("A", "1"), ("B", "2"), ("C", "3")])
            .with_page_size(2);

        let first = source.list_page(None).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next.as_deref(), Some("2"));

        let second = source.list_page(first.next.as_deref()).unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.next, None);
    }

    #[test]
    fn out_of_range_token_gives_empty_last_page() {
        let source = InMemorySecretSource::new("mem://a")
            .with_secrets([("A", "1"), ("B", "2")])
            .with_page_size(2);

        let page = source.list_page(Some(&usize::MAX.to_string())).unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn list_all_collects_every_page() {
        let source = InMemorySecretSource::new("mem://a")
            .with_secrets([("A", "1"), ("B", "2"), ("C", "3"), ("D", "4"), ("E", "5")])
            .with_page_size(2);

        let names: Vec<String> = source.list_all().unwrap().into_iter().map(|p| p.name).collect();

        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(source.list_calls(), 3);
    }

    #[test]
    fn empty_source_lists_one_empty_page() {
        let source = InMemorySecretSource::new("mem://a");

        let page = source.list_page(None).unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn values_are_not_inline_by_default() {
        let source = InMemorySecretSource::new("mem://a").with_secret("A", "1");

        let page = source.list_page(None).unwrap();

        assert_eq!(page.items[0].value, None);
        assert_eq!(source.get_secret("A").unwrap(), "1");
    }

    #[test]
    fn missing_secret_is_reported() {
        let source = InMemorySecretSource::new("mem://a");

        let err = source.get_secret("nope").unwrap_err();

        assert!(matches!(err, VaultLayerError::SecretNotFound { .. }));
    }

    #[test]
    fn disabled_secrets_are_listed_as_disabled() {
        let source = InMemorySecretSource::new("mem://a").with_disabled_secret("Old", "x");

        let page = source.list_page(None).unwrap();

        assert!(!page.items[0].enabled);
    }

    #[test]
    fn transient_failures_run_out() {
        let source = InMemorySecretSource::new("mem://a").with_transient_failures(2);

        assert!(source.list_page(None).unwrap_err().is_transient());
        assert!(source.list_page(None).unwrap_err().is_transient());
        assert!(source.list_page(None).is_ok());
    }

    #[test]
    fn unavailable_source_fails_every_call() {
        let source = InMemorySecretSource::new("mem://a").unavailable("connection refused");

        assert!(matches!(
            source.list_page(None),
            Err(VaultLayerError::VaultUnavailable { .. })
        ));
        assert!(source.get_secret("A").is_err());
    }
}
