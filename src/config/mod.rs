use std::collections::HashSet;

use serde::Deserialize;
use serde::de::Deserializer;

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

use self::types as cfg;
use crate::batch::{DEFAULT_CHUNK_SIZE, MAX_PERMITTED_DATA_INCREASE, MAX_TRANSACTION_SIZE};

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_logging_profile() -> cfg::LoggingProfile {
    cfg::LoggingProfile::Lean
}

pub(crate) fn default_timezone_offset_hours() -> i8 {
    0
}

pub(crate) fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

pub(crate) fn default_max_per_call() -> usize {
    MAX_PERMITTED_DATA_INCREASE
}

pub(crate) fn default_max_transaction_size() -> usize {
    MAX_TRANSACTION_SIZE
}

pub(crate) fn default_concurrency() -> usize {
    2
}

pub(crate) fn default_max_retries() -> usize {
    3
}

pub(crate) fn default_confirm_timeout_ms() -> u64 {
    60_000
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    500
}

pub(crate) fn default_shard_count() -> u8 {
    crate::program::SHARD_COUNT
}

pub(crate) fn default_prometheus_listen() -> String {
    "0.0.0.0:9898".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RpcUrlField {
    Single(String),
    Multiple(Vec<String>),
}

pub(crate) fn deserialize_rpc_urls<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let helper = Option::<RpcUrlField>::deserialize(deserializer)?;
    let values = match helper {
        Some(RpcUrlField::Single(url)) => vec![url],
        Some(RpcUrlField::Multiple(list)) => list,
        None => Vec::new(),
    };
    Ok(dedup_urls(values))
}

pub(crate) fn dedup_urls(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            urls.push(trimmed.to_string());
        }
    }
    urls
}

impl Default for cfg::LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            json: false,
            profile: default_logging_profile(),
            timezone_offset_hours: default_timezone_offset_hours(),
        }
    }
}

impl Default for cfg::BatchSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_per_call: default_max_per_call(),
            max_transaction_size: default_max_transaction_size(),
            compute_unit_price_micro_lamports: 0,
            compute_unit_limit: None,
        }
    }
}

impl Default for cfg::DispatchSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            commitment: cfg::CommitmentLevel::default(),
            skip_preflight: false,
            rpc_max_retries: None,
            confirm_timeout_ms: default_confirm_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for cfg::InscriptionSettings {
    fn default() -> Self {
        Self {
            shard_count: default_shard_count(),
        }
    }
}

impl Default for cfg::PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            listen: default_prometheus_listen(),
        }
    }
}
