use crate::core::errors::Result;
use crate::core::models::credential::Credential;
use crate::core::models::retry::RetryPolicy;
use crate::core::models::secret::{SecretPage, SecretProperties};

/// Port for reading secrets from one vault endpoint.
///
/// Implementations live in `adapters::sources`. The loader only depends
/// on this trait. Implementations own their retry behaviour: an `Err`
/// returned here is terminal for the current load.
pub trait SecretSource: Send + Sync {
    /// Address of the vault this source reads, used to label layers.
    fn endpoint(&self) -> &str;

    /// Fetch one listing page. `None` requests the first page.
    fn list_page(&self, next: Option<&str>) -> Result<SecretPage>;

    /// Fetch the current value of a secret.
    fn get_secret(&self, name: &str) -> Result<String>;

    /// Follow continuation tokens until the listing is exhausted.
    fn list_all(&self) -> Result<Vec<SecretProperties>> {
        let mut items = Vec::new();
        let mut page = self.list_page(None)?;
        loop {
            items.append(&mut page.items);
            match page.next.take() {
                Some(token) => page = self.list_page(Some(&token))?,
                None => break,
            }
        }
        Ok(items)
    }
}

impl<S: SecretSource + ?Sized> SecretSource for Box<S> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn list_page(&self, next: Option<&str>) -> Result<SecretPage> {
        (**self).list_page(next)
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        (**self).get_secret(name)
    }
}

/// Port for connecting to a vault endpoint.
///
/// Client construction, transport and authentication happen behind this
/// trait; the returned source is only used for the duration of a load.
pub trait SecretSourceFactory {
    type Source: SecretSource;

    /// Build a source for `endpoint`. The client applies `retry` itself.
    fn connect(
        &self,
        endpoint: &str,
        credential: &Credential,
        retry: &RetryPolicy,
    ) -> Result<Self::Source>;
}
