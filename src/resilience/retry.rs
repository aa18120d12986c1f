use crate::{
    error::{ClassifiedError, ProshotsError, Result},
    resilience::{
        classifier::{classify, RemoteFailure},
        credentials::CredentialProvider,
    },
};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How many times a call is attempted and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_jitter: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            multiplier: 3,
            max_jitter: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile analysis: a single expensive call the whole session depends on.
    pub fn analysis() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(3000),
            ..Default::default()
        }
    }

    pub fn generation() -> Self {
        Self::default()
    }

    pub fn tools() -> Self {
        Self {
            max_attempts: 2,
            ..Default::default()
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `retry_index` (0 for the first retry), without jitter.
    pub fn backoff(&self, retry_index: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(retry_index);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        (self.backoff(retry_index) + jitter).min(self.max_delay)
    }
}

/// Runs remote calls under a [`RetryPolicy`], checking the credential before
/// every attempt.
#[derive(Clone)]
pub struct RetryController {
    credentials: Arc<dyn CredentialProvider>,
}

impl RetryController {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// Shorthand for the default policy capped at `max_attempts`.
    pub async fn with_retry<T, F, Fut>(&self, operation: F, max_attempts: u32) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = std::result::Result<T, RemoteFailure>>,
    {
        let policy = RetryPolicy::default().with_max_attempts(max_attempts);
        self.execute_with_policy(&policy, None, operation).await
    }

    pub async fn execute_with_policy<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        cancel: Option<&CancellationToken>,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = std::result::Result<T, RemoteFailure>>,
    {
        let max_attempts = policy.attempts();
        let mut attempt = 0;

        loop {
            let api_key = self
                .credentials
                .api_key()
                .ok_or_else(ClassifiedError::missing_credential)?;

            attempt += 1;
            let failure = match operation(api_key).await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            let classified = classify(&failure);
            if !classified.is_retryable() {
                log::debug!(
                    "Attempt {} failed with {}, not retrying: {}",
                    attempt,
                    classified.kind_name(),
                    failure
                );
                return Err(classified.into());
            }

            if attempt >= max_attempts {
                log::error!(
                    "Giving up after {} attempts: {}",
                    attempt,
                    classified.message()
                );
                return Err(ClassifiedError::QuotaExceeded {
                    message: format!(
                        "retries exhausted after {} attempts: {}",
                        attempt,
                        classified.message()
                    ),
                }
                .into());
            }

            let delay = policy.delay_for(attempt - 1);
            log::warn!(
                "Attempt {}/{} failed with {} ({}), retrying in {}ms",
                attempt,
                max_attempts,
                classified.kind_name(),
                classified.message(),
                delay.as_millis()
            );

            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(ProshotsError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}
