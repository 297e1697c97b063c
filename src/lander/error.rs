use std::fmt;

use solana_client::client_error::ClientError;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

use crate::batch::SignedTransaction;

use super::dispatcher::Phase;

#[derive(Debug, Error)]
pub enum LanderError {
    #[error("RPC 提交失败: {0}")]
    Rpc(#[from] ClientError),
    #[error("交易 {signature} 执行失败: {error}")]
    Transaction {
        signature: Signature,
        error: TransactionError,
    },
    #[error("交易 {0} 的区块哈希已过期，未能确认")]
    BlockhashExpired(Signature),
    #[error("等待交易 {0} 确认超时")]
    ConfirmTimeout(Signature),
    #[error("{phase} 阶段重试耗尽，仍有 {} 笔交易未确认", .unconfirmed.len())]
    PhaseExhausted {
        phase: Phase,
        confirmed: Vec<Signature>,
        unconfirmed: Vec<SignedTransaction>,
    },
    #[error("{phase} 阶段已取消，{} 笔交易未确认", .unconfirmed.len())]
    Cancelled {
        phase: Phase,
        confirmed: Vec<Signature>,
        unconfirmed: Vec<SignedTransaction>,
    },
    #[error("{0}")]
    Fatal(String),
}

impl LanderError {
    pub fn fatal(reason: impl fmt::Display) -> Self {
        Self::Fatal(reason.to_string())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rpc(_) => "rpc",
            Self::Transaction { .. } => "transaction",
            Self::BlockhashExpired(_) => "blockhash_expired",
            Self::ConfirmTimeout(_) => "confirm_timeout",
            Self::PhaseExhausted { .. } => "phase_exhausted",
            Self::Cancelled { .. } => "cancelled",
            Self::Fatal(_) => "fatal",
        }
    }
}
