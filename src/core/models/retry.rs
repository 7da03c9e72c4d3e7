use std::time::Duration;

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    Fixed,
    Exponential,
}

/// Backoff policy handed to vault clients.
///
/// The loader never retries on its own; this policy is applied once,
/// inside the client, so failures are not retried twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(16),
            max_retries: 2,
            mode: RetryMode::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = match self.mode {
            RetryMode::Fixed => self.base_delay,
            RetryMode::Exponential => 2u32
                .checked_pow(attempt)
                .and_then(|factor| self.base_delay.checked_mul(factor))
                .unwrap_or(self.max_delay),
        };
        delay.min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_vault_client_settings() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.max_delay, Duration::from_secs(16));
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.mode, RetryMode::Exponential);
    }

    #[test]
    fn exponential_delay_doubles_then_caps() {
        let policy = RetryPolicy::default();

        let delays: Vec<u64> = (0..6).map(|a| policy.delay_for(a).as_secs()).collect();

        assert_eq!(delays, vec![2, 4, 8, 16, 16, 16]);
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(200), Duration::from_secs(16));
    }

    #[test]
    fn fixed_delay_stays_constant() {
        let policy = RetryPolicy {
            mode: RetryMode::Fixed,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay_for(0), policy.delay_for(5));
    }
}
