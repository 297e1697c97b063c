use solana_client::client_error::ClientError;
use solana_sdk::signer::SignerError;
use thiserror::Error;

use crate::program::ProgramError;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("分片大小必须大于 0")]
    InvalidChunkSize,
    #[error("单次扩容上限必须大于 0")]
    InvalidAllocationStep,
    #[error("数据长度 {0} 超出 u32 上限")]
    PayloadTooLarge(usize),
    #[error("第 {index} 条指令单独成交易也超出上限: {size} > {limit} 字节")]
    OversizedInstruction {
        index: usize,
        size: usize,
        limit: usize,
    },
    #[error("构建铭文指令失败: {0}")]
    Program(#[from] ProgramError),
    #[error("序列化交易失败: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("交易签名失败: {0}")]
    Signer(#[from] SignerError),
    #[error("获取区块哈希失败: {0}")]
    Rpc(#[from] ClientError),
}
