use std::time::Duration;

use tracing::warn;

use crate::core::errors::{Result, VaultLayerError};
use crate::core::models::retry::RetryPolicy;
use crate::core::models::secret::SecretPage;
use crate::core::traits::secret_source::SecretSource;

/// Blocks the current thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Wraps a source and retries its transient failures.
///
/// Terminal errors pass through untouched. Once the policy's retries are
/// spent the last transient error becomes `VaultUnavailable`, which the
/// loader propagates without retrying again.
pub struct RetryingSource<S, Z = ThreadSleeper> {
    inner: S,
    policy: RetryPolicy,
    sleeper: Z,
}

impl<S: SecretSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleeper: ThreadSleeper,
        }
    }
}

impl<S: SecretSource, Z: Sleeper> RetryingSource<S, Z> {
    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> RetryingSource<S, Z2> {
        RetryingSource {
            inner: self.inner,
            policy: self.policy,
            sleeper,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn run<T>(&self, operation: &str, call: impl Fn(&S) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match call(&self.inner) {
                Err(e) if e.is_transient() => {
                    if attempt >= self.policy.max_retries {
                        return Err(VaultLayerError::VaultUnavailable {
                            endpoint: self.inner.endpoint().to_string(),
                            reason: format!("{e} (gave up after {attempt} retries)"),
                        });
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        endpoint = self.inner.endpoint(),
                        operation,
                        attempt = attempt + 1,
                        delay_ms = millis(delay),
                        "Transient vault failure, retrying"
                    );
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl<S: SecretSource, Z: Sleeper> SecretSource for RetryingSource<S, Z> {
    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    fn list_page(&self, next: Option<&str>) -> Result<SecretPage> {
        self.run("list", |source| source.list_page(next))
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        self.run("get", |source| source.get_secret(name))
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
