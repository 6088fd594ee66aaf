use super::EmbeddingClientError;
use app_state::RetrySettings;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff for calls to the embedding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Coefficient to multiply `initial_interval` with for every past attempt.
    pub backoff_coefficient: u32,
    /// The backoff interval for the first retry.
    pub initial_interval: Duration,
    /// The maximum possible backoff between retries.
    pub maximum_interval: Duration,
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            backoff_coefficient: settings.backoff_coefficient,
            initial_interval: settings.initial_interval,
            maximum_interval: settings.maximum_interval,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt + 1`, without jitter.
    #[must_use]
    pub fn time_until_next_retry(&self, attempt: u32) -> Duration {
        self.backoff_coefficient
            .checked_pow(attempt)
            .and_then(|factor| self.initial_interval.checked_mul(factor))
            .map_or(self.maximum_interval, |interval| {
                interval.min(self.maximum_interval)
            })
    }

    /// A random delay between half and all of the backoff, so clients that
    /// failed together don't retry together.
    fn jittered(&self, attempt: u32) -> Duration {
        let full = self.time_until_next_retry(attempt).as_millis() as u64;
        if full == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::random_range(full / 2..=full))
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget runs out.
    ///
    /// Transient failures that exhaust the budget become
    /// [`EmbeddingClientError::Unavailable`]; permanent ones are returned as is.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, EmbeddingClientError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, EmbeddingClientError>>,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempt + 1 >= self.max_attempts => {
                    return Err(EmbeddingClientError::Unavailable {
                        attempts: attempt + 1,
                        cause: err.to_string(),
                    });
                }
                Err(err) => {
                    let delay = self.jittered(attempt);
                    warn!(
                        "Embedding attempt {} of {} failed: {err}. Retrying in {delay:?}.",
                        attempt + 1,
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
