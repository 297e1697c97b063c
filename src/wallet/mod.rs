use std::fs;
use std::path::Path;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use thiserror::Error;

use crate::config::{PRIVATE_KEY_ENV, WalletConfig};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("缺少私钥配置，请提供 global.wallet.private_key 或环境变量 {PRIVATE_KEY_ENV}")]
    Missing,
    #[error("读取 keypair 文件 {path} 失败: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("私钥格式非法: {0}")]
    Invalid(String),
}

/// 付费与签名身份。
#[derive(Clone)]
pub struct Identity {
    pub pubkey: Pubkey,
    pub signer: Arc<Keypair>,
}

impl Identity {
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            pubkey: keypair.pubkey(),
            signer: Arc::new(keypair),
        }
    }

    pub fn from_wallet(wallet: &WalletConfig) -> Result<Self, WalletError> {
        let raw = wallet.private_key.trim();
        if raw.is_empty() {
            return Err(WalletError::Missing);
        }

        let keypair = if looks_like_path(raw) {
            let contents = fs::read_to_string(raw).map_err(|source| WalletError::Io {
                path: raw.to_string(),
                source,
            })?;
            parse_keypair_string(&contents)?
        } else {
            parse_keypair_string(raw)?
        };
        Ok(Self::from_keypair(keypair))
    }

    pub fn keypair(&self) -> &Keypair {
        &self.signer
    }
}

fn looks_like_path(raw: &str) -> bool {
    !raw.starts_with('[') && (raw.ends_with(".json") || Path::new(raw).is_file())
}

/// 支持 JSON 字节数组、逗号分隔字节和 base58 三种写法。
pub fn parse_keypair_string(raw: &str) -> Result<Keypair, WalletError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WalletError::Invalid("keypair string empty".into()));
    }

    let bytes = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(trimmed)
            .map_err(|err| WalletError::Invalid(err.to_string()))?
    } else if trimmed.contains(',') {
        trimmed
            .split(',')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| WalletError::Invalid(err.to_string()))?
    } else {
        bs58::decode(trimmed)
            .into_vec()
            .map_err(|err| WalletError::Invalid(err.to_string()))?
    };

    Keypair::try_from(bytes.as_slice()).map_err(|err| WalletError::Invalid(err.to_string()))
}
