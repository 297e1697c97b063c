use std::fmt;

use serde::Deserialize;
use solana_commitment_config::CommitmentConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InscriberConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub inscription: InscriptionSettings,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalConfig {
    #[serde(default, deserialize_with = "super::deserialize_rpc_urls")]
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GlobalConfig {
    pub fn rpc_urls(&self) -> &[String] {
        &self.rpc_urls
    }

    pub fn primary_rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// 私钥：JSON 数组、逗号分隔字节或 base58；也可以是 keypair 文件路径。
    #[serde(default)]
    pub private_key: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingProfile {
    #[default]
    Lean,
    Verbose,
}

impl LoggingProfile {
    pub fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    pub fn is_lean(self) -> bool {
        matches!(self, Self::Lean)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "super::default_logging_profile")]
    pub profile: LoggingProfile,
    #[serde(default = "super::default_timezone_offset_hours")]
    pub timezone_offset_hours: i8,
}

/// `[batch]`：分块、分配与交易打包参数。
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "super::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "super::default_max_per_call")]
    pub max_per_call: usize,
    #[serde(default = "super::default_max_transaction_size")]
    pub max_transaction_size: usize,
    /// 为 0 时不追加 compute budget 前缀
    #[serde(default)]
    pub compute_unit_price_micro_lamports: u64,
    #[serde(default)]
    pub compute_unit_limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentLevel {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl CommitmentLevel {
    pub fn as_config(self) -> CommitmentConfig {
        match self {
            Self::Processed => CommitmentConfig::processed(),
            Self::Confirmed => CommitmentConfig::confirmed(),
            Self::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl fmt::Display for CommitmentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// `[dispatch]`：并发提交与重试。
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    #[serde(default = "super::default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "super::default_max_retries")]
    pub max_retries: usize,
    #[serde(default)]
    pub commitment: CommitmentLevel,
    #[serde(default)]
    pub skip_preflight: bool,
    /// 透传给 RPC 节点的重广播次数
    #[serde(default)]
    pub rpc_max_retries: Option<usize>,
    #[serde(default = "super::default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    #[serde(default = "super::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl DispatchSettings {
    pub fn commitment_config(&self) -> CommitmentConfig {
        self.commitment.as_config()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InscriptionSettings {
    #[serde(default = "super::default_shard_count")]
    pub shard_count: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "super::default_prometheus_listen")]
    pub listen: String,
}
