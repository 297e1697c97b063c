use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::batch::{BatchError, SignedTransaction};
use crate::lander::{LanderError, Phase};
use crate::program::ProgramError;

#[derive(Debug, Error)]
pub enum InscriptionError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error("RPC 请求失败: {0}")]
    Rpc(#[from] ClientError),
    #[error(transparent)]
    Lander(LanderError),
    #[error(
        "{phase} 阶段未完成{}: 已确认 {} 笔，{} 笔未确认，可重新执行以补发",
        cancel_note(.cancelled),
        .confirmed.len(),
        .unconfirmed.len()
    )]
    Phase {
        phase: Phase,
        confirmed: Vec<Signature>,
        unconfirmed: Vec<SignedTransaction>,
        cancelled: bool,
    },
    #[error("mint {0} 已经存在铭文，请使用 update")]
    AlreadyInscribed(Pubkey),
    #[error("mint {0} 尚未铭刻")]
    NotInscribed(Pubkey),
    #[error("mint {0} 在同一批次中出现多次")]
    DuplicateMint(Pubkey),
    #[error("没有需要铭刻的请求")]
    EmptyRequest,
    #[error("分片数量必须在 1..=255 之间")]
    InvalidShardCount,
}

fn cancel_note(cancelled: &bool) -> &'static str {
    if *cancelled { "（已取消）" } else { "" }
}

impl From<LanderError> for InscriptionError {
    fn from(err: LanderError) -> Self {
        match err {
            LanderError::PhaseExhausted {
                phase,
                confirmed,
                unconfirmed,
            } => Self::Phase {
                phase,
                confirmed,
                unconfirmed,
                cancelled: false,
            },
            LanderError::Cancelled {
                phase,
                confirmed,
                unconfirmed,
            } => Self::Phase {
                phase,
                confirmed,
                unconfirmed,
                cancelled: true,
            },
            other => Self::Lander(other),
        }
    }
}
