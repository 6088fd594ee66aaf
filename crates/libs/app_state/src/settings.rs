use crate::{
    DatabaseSettings, LoggingSettings, RawContestSettings, RawEmbeddingServiceSettings,
    RawRetrySettings, RawSettings, SecretSettings,
};
use common_types::ContestPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub logging: LoggingSettings,
    pub secrets: SecretSettings,
    pub database: DatabaseSettings,
    pub embedding_service: EmbeddingServiceSettings,
    pub contest: ContestSettings,
}

#[derive(Debug, Clone)]
pub struct EmbeddingServiceSettings {
    pub url: String,
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry: RetrySettings,
}

impl EmbeddingServiceSettings {
    /// Full url of the embed endpoint.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

/// Exponential backoff: `initial_interval * backoff_coefficient^attempt`, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub backoff_coefficient: u32,
    pub maximum_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ContestSettings {
    pub policy: ContestPolicy,
    pub max_ranking_attempts: u32,
}

impl From<RawSettings> for AppSettings {
    fn from(raw: RawSettings) -> Self {
        Self {
            logging: raw.logging,
            secrets: raw.secrets,
            database: raw.database,
            embedding_service: raw.embedding_service.into(),
            contest: raw.contest.into(),
        }
    }
}

impl From<RawEmbeddingServiceSettings> for EmbeddingServiceSettings {
    fn from(raw: RawEmbeddingServiceSettings) -> Self {
        Self {
            url: raw.url,
            endpoint: raw.endpoint,
            connect_timeout: Duration::from_secs(raw.connect_timeout_secs),
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            retry: raw.retry.into(),
        }
    }
}

impl From<RawRetrySettings> for RetrySettings {
    fn from(raw: RawRetrySettings) -> Self {
        Self {
            max_attempts: raw.max_attempts.max(1),
            initial_interval: Duration::from_millis(raw.initial_interval_ms),
            backoff_coefficient: raw.backoff_coefficient.max(1),
            maximum_interval: Duration::from_millis(raw.maximum_interval_ms),
        }
    }
}

impl From<RawContestSettings> for ContestSettings {
    fn from(raw: RawContestSettings) -> Self {
        Self {
            policy: ContestPolicy {
                entry_statuses: raw.entry_statuses,
                ranking_statuses: raw.ranking_statuses,
            },
            max_ranking_attempts: raw.max_ranking_attempts.max(1),
        }
    }
}
