use common_types::ContestStatus;
use serde::Deserialize;

/// Settings exactly as they appear in `config/settings.yaml` (plus `APP__*` overrides).
#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub logging: LoggingSettings,
    pub secrets: SecretSettings,
    pub database: DatabaseSettings,
    pub embedding_service: RawEmbeddingServiceSettings,
    pub contest: RawContestSettings,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSettings {
    pub database_url: String,
}

/// Database connection and related configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub min_connection: u32,
    pub max_lifetime: u64,
    pub idle_timeout: u64,
    pub acquire_timeout: u64,
    /// Length of generated `id` for photo records.
    pub photo_id_length: usize,
    pub contest_id_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEmbeddingServiceSettings {
    /// Base url of the inference service, e.g. `http://localhost:5000`.
    pub url: String,
    /// Path of the embed endpoint, relative to `url`.
    pub endpoint: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub retry: RawRetrySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawRetrySettings {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub backoff_coefficient: u32,
    pub maximum_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawContestSettings {
    /// Statuses in which a contest accepts new entries.
    pub entry_statuses: Vec<ContestStatus>,
    /// Statuses in which `rank_entries` may run.
    pub ranking_statuses: Vec<ContestStatus>,
    /// How often a ranking is recomputed when a concurrent write invalidates it.
    pub max_ranking_attempts: u32,
}
