//! 批量交易构建：把任意长度的铭文数据拆成 allocate / write 两个阶段的指令，
//! 再按交易尺寸上限贪心打包并统一签名。

mod allocate;
mod error;
mod sign;
mod split;
mod write;

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use crate::program::InscriptionKeys;

pub use allocate::{AllocationPlan, build_allocate};
pub use error::BatchError;
pub use sign::{SignedTransaction, prepare_and_sign, sign_groups};
pub use split::InstructionBatch;
pub use write::build_chunked_write;

/// Solana 单次账户扩容上限（MAX_PERMITTED_DATA_INCREASE）。
pub const MAX_PERMITTED_DATA_INCREASE: usize = 10_240;
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// 交易序列化后的字节上限（PACKET_DATA_SIZE）。
pub const MAX_TRANSACTION_SIZE: usize = 1_232;

/// 写入目标：铭文账户 + 元数据账户 + 关联标签。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InscriptionTarget {
    pub account: Pubkey,
    pub metadata: Pubkey,
    pub tag: Option<String>,
}

impl InscriptionTarget {
    pub fn new(account: Pubkey, metadata: Pubkey, tag: Option<&str>) -> Self {
        Self {
            account,
            metadata,
            tag: tag.map(str::to_string),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn keys(&self, payer: &Pubkey) -> InscriptionKeys {
        InscriptionKeys {
            inscription: self.account,
            metadata: self.metadata,
            payer: *payer,
        }
    }
}

/// 待落链的不可变字节序列。
#[derive(Debug, Clone)]
pub struct WritePayload {
    target: InscriptionTarget,
    bytes: Arc<[u8]>,
}

impl WritePayload {
    pub fn new(target: InscriptionTarget, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            target,
            bytes: bytes.into(),
        }
    }

    pub fn target(&self) -> &InscriptionTarget {
        &self.target
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
