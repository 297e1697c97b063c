use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use tracing::{debug, info};

use crate::batch::SignedTransaction;
use crate::config::DispatchSettings;

use super::error::LanderError;
use super::sender::TransactionSender;

#[derive(Clone)]
pub struct RpcSender {
    client: Arc<RpcClient>,
    config: RpcSendTransactionConfig,
    poll_interval: Duration,
    confirm_timeout: Duration,
}

impl RpcSender {
    pub fn new(client: Arc<RpcClient>, settings: &DispatchSettings) -> Self {
        let mut config = RpcSendTransactionConfig::default();
        config.skip_preflight = settings.skip_preflight;
        if let Some(retries) = settings.rpc_max_retries {
            config.max_retries = Some(retries);
        }

        Self {
            client,
            config,
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(50)),
            confirm_timeout: Duration::from_millis(settings.confirm_timeout_ms.max(1)),
        }
    }

    /// 查询一次签名状态：落地返回 `Some(Ok)`，执行失败返回 `Some(Err)`，尚未出现返回 `None`。
    async fn landed(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<Option<Result<(), LanderError>>, LanderError> {
        let status = self
            .client
            .get_signature_status_with_commitment(signature, commitment)
            .await?;
        Ok(status.map(|result| {
            result.map_err(|error| LanderError::Transaction {
                signature: *signature,
                error,
            })
        }))
    }

    /// 轮询签名状态直到落地、执行失败、区块哈希过期或超过确认时限。
    async fn await_confirmation(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        commitment: CommitmentConfig,
    ) -> Result<(), LanderError> {
        let started = Instant::now();
        loop {
            if let Some(outcome) = self.landed(signature, commitment).await? {
                return outcome;
            }
            if !self.client.is_blockhash_valid(blockhash, commitment).await? {
                return Err(LanderError::BlockhashExpired(*signature));
            }
            if started.elapsed() >= self.confirm_timeout {
                return Err(LanderError::ConfirmTimeout(*signature));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl TransactionSender for RpcSender {
    fn name(&self) -> &'static str {
        "rpc"
    }

    /// 重试轮次会再次调用本方法，因此提交前先查询签名：上一轮超时但已落地的交易
    /// 直接视为确认；区块哈希已过期且链上无记录的交易不再重发。
    async fn send_and_confirm(
        &self,
        transaction: &SignedTransaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, LanderError> {
        let signature = transaction.signature();
        if let Some(outcome) = self.landed(&signature, commitment).await? {
            debug!(
                target: "lander::rpc",
                signature = %signature,
                ok = outcome.is_ok(),
                "transaction already on chain, skip resend"
            );
            return outcome.map(|()| signature);
        }
        if !self
            .client
            .is_blockhash_valid(&transaction.blockhash, commitment)
            .await?
        {
            return Err(LanderError::BlockhashExpired(signature));
        }

        let mut config = self.config.clone();
        config.preflight_commitment = Some(commitment.commitment);

        let started = Instant::now();
        if let Err(err) = self
            .client
            .send_transaction_with_config(&transaction.transaction, config)
            .await
        {
            // 节点可能拒绝重复提交，以链上状态为准
            return match self.landed(&signature, commitment).await? {
                Some(outcome) => outcome.map(|()| signature),
                None => Err(err.into()),
            };
        }
        debug!(
            target: "lander::rpc",
            signature = %signature,
            blockhash = %transaction.blockhash,
            skip_preflight = self.config.skip_preflight,
            "transaction submitted via rpc client"
        );

        self.await_confirmation(&signature, &transaction.blockhash, commitment)
            .await?;

        info!(
            target: "lander::rpc",
            signature = %signature,
            commitment = ?commitment.commitment,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "交易已确认"
        );
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use serde_json::{Value, json};
    use solana_client::rpc_request::RpcRequest;
    use solana_sdk::instruction::{AccountMeta, Instruction};
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Keypair;

    use crate::batch::sign_groups;

    fn transaction() -> SignedTransaction {
        let groups = vec![vec![Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(Pubkey::new_unique(), false)],
            data: vec![1],
        }]];
        sign_groups(&Keypair::new(), groups, &[], Hash::new_from_array([7u8; 32]))
            .unwrap()
            .remove(0)
    }

    fn sender(
        url: &str,
        mocks: Vec<(RpcRequest, Value)>,
        settings: DispatchSettings,
    ) -> RpcSender {
        let mocks: HashMap<RpcRequest, Value> = mocks.into_iter().collect();
        let client = RpcClient::new_mock_with_mocks(url.to_string(), mocks);
        RpcSender::new(Arc::new(client), &settings)
    }

    fn status_not_found() -> (RpcRequest, Value) {
        (
            RpcRequest::GetSignatureStatuses,
            json!({ "context": { "slot": 1 }, "value": [null] }),
        )
    }

    #[tokio::test]
    async fn confirms_after_submit() {
        let tx = transaction();
        let rpc = sender("succeeds", vec![status_not_found()], DispatchSettings::default());
        let signature = rpc
            .send_and_confirm(&tx, CommitmentConfig::confirmed())
            .await
            .unwrap();
        assert_eq!(signature, tx.signature());
    }

    #[tokio::test]
    async fn landed_transaction_resolves_without_resend() {
        let tx = transaction();
        let rpc = sender("succeeds", Vec::new(), DispatchSettings::default());
        let signature = rpc
            .send_and_confirm(&tx, CommitmentConfig::confirmed())
            .await
            .unwrap();
        assert_eq!(signature, tx.signature());
    }

    #[tokio::test]
    async fn rejected_send_falls_back_to_chain_status() {
        let tx = transaction();
        let rpc = sender(
            "succeeds",
            vec![
                status_not_found(),
                (RpcRequest::SendTransaction, json!("bogus")),
            ],
            DispatchSettings::default(),
        );
        let signature = rpc
            .send_and_confirm(&tx, CommitmentConfig::confirmed())
            .await
            .unwrap();
        assert_eq!(signature, tx.signature());
    }

    #[tokio::test]
    async fn rejected_send_without_status_surfaces_rpc_error() {
        let tx = transaction();
        let rpc = sender(
            "sig_not_found",
            vec![(RpcRequest::SendTransaction, json!("bogus"))],
            DispatchSettings::default(),
        );
        let err = rpc
            .send_and_confirm(&tx, CommitmentConfig::confirmed())
            .await
            .unwrap_err();
        assert!(matches!(err, LanderError::Rpc(_)));
    }

    #[tokio::test]
    async fn execution_error_is_reported() {
        let tx = transaction();
        let rpc = sender(
            "instruction_error",
            vec![status_not_found()],
            DispatchSettings::default(),
        );
        let err = rpc
            .send_and_confirm(&tx, CommitmentConfig::confirmed())
            .await
            .unwrap_err();
        assert!(
            matches!(err, LanderError::Transaction { signature, .. } if signature == tx.signature())
        );
    }

    #[tokio::test]
    async fn expired_blockhash_is_not_resent() {
        let tx = transaction();
        // 若仍然提交，伪造的发送结果会让错误变成 Rpc
        let rpc = sender(
            "sig_not_found",
            vec![
                (
                    RpcRequest::IsBlockhashValid,
                    json!({ "context": { "slot": 1 }, "value": false }),
                ),
                (RpcRequest::SendTransaction, json!("bogus")),
            ],
            DispatchSettings::default(),
        );
        let err = rpc
            .send_and_confirm(&tx, CommitmentConfig::confirmed())
            .await
            .unwrap_err();
        assert!(matches!(err, LanderError::BlockhashExpired(sig) if sig == tx.signature()));
    }

    #[tokio::test]
    async fn unseen_signature_times_out() {
        let tx = transaction();
        let settings = DispatchSettings {
            confirm_timeout_ms: 1,
            ..DispatchSettings::default()
        };
        let rpc = sender("sig_not_found", Vec::new(), settings);
        let err = rpc
            .send_and_confirm(&tx, CommitmentConfig::confirmed())
            .await
            .unwrap_err();
        assert!(matches!(err, LanderError::ConfirmTimeout(sig) if sig == tx.signature()));
    }
}
