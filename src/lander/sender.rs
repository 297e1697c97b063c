use std::sync::Arc;

use async_trait::async_trait;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;

use crate::batch::SignedTransaction;

use super::error::LanderError;

/// 单笔交易的提交与确认；成功时返回已达到目标承诺级别的签名。
#[async_trait]
pub trait TransactionSender: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send_and_confirm(
        &self,
        transaction: &SignedTransaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, LanderError>;
}

#[async_trait]
impl<T> TransactionSender for Arc<T>
where
    T: TransactionSender + ?Sized,
{
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    async fn send_and_confirm(
        &self,
        transaction: &SignedTransaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, LanderError> {
        self.as_ref().send_and_confirm(transaction, commitment).await
    }
}
