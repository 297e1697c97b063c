use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{InscriberConfig, dedup_urls};

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["inscriber.toml", "config/inscriber.toml"];
pub const PRIVATE_KEY_ENV: &str = "INSCRIBER_PRIVATE_KEY";
pub const RPC_URL_ENV: &str = "INSCRIBER_RPC_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// 显式路径必须可读；未指定时依次尝试默认路径，都不存在则使用默认配置。
/// 随后应用环境变量覆盖。
pub fn load_config(path: Option<PathBuf>) -> Result<InscriberConfig, ConfigError> {
    let mut config = load_file_or_default(path)?;
    apply_env_overrides(
        &mut config,
        env::var(PRIVATE_KEY_ENV).ok(),
        env::var(RPC_URL_ENV).ok(),
    );
    Ok(config)
}

fn load_file_or_default(path: Option<PathBuf>) -> Result<InscriberConfig, ConfigError> {
    if let Some(explicit) = path {
        return load_file(&explicit);
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(Path::new) {
        if candidate.exists() {
            return load_file(candidate);
        }
    }

    Ok(InscriberConfig::default())
}

fn load_file(path: &Path) -> Result<InscriberConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: InscriberConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(config)
}

/// 环境变量中的私钥覆盖配置文件；RPC 地址被放到列表首位。
pub(crate) fn apply_env_overrides(
    config: &mut InscriberConfig,
    private_key: Option<String>,
    rpc_url: Option<String>,
) {
    if let Some(key) = private_key.filter(|value| !value.trim().is_empty()) {
        config.global.wallet.private_key = key.trim().to_string();
    }
    if let Some(url) = rpc_url.filter(|value| !value.trim().is_empty()) {
        let existing = std::mem::take(&mut config.global.rpc_urls);
        config.global.rpc_urls = dedup_urls(std::iter::once(url).chain(existing));
    }
}
