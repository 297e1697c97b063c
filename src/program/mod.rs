//! Metaplex Inscription 程序的客户端封装：PDA 推导、指令编码与账户解码。

pub mod instruction;
pub mod pda;
pub mod state;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub use instruction::*;
pub use pda::*;
pub use state::{InscriptionMetadata, InscriptionShard};

pub const ID: Pubkey = solana_sdk::pubkey!("1NSCRfGeyo7wPUazGbaPBUsTM49e1k2aXewHGARfzSo");

pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

pub const PREFIX: &[u8] = b"Inscription";
pub const ASSOCIATION: &[u8] = b"Association";
pub const SHARD: &[u8] = b"Shard";

/// 程序维护的计数分片总数。
pub const SHARD_COUNT: u8 = 32;

/// 单个 PDA seed 的长度上限。
pub const MAX_SEED_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("关联标签非法 `{tag}`: 长度需在 1..={max} 字节之间")]
    InvalidTag { tag: String, max: usize },
    #[error("指令参数编码失败: {0}")]
    Encode(#[from] std::io::Error),
}
