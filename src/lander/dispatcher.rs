use std::fmt;
use std::sync::Arc;

use futures::{StreamExt, stream};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch::SignedTransaction;
use crate::config::DispatchSettings;
use crate::monitoring::events;

use super::error::LanderError;
use super::sender::TransactionSender;

/// 铭文流程中的分发阶段。写入阶段只在准备阶段全部确认后才会开始。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 分配空间、初始化账户、清空旧数据
    Setup,
    Write,
    Close,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Write => "write",
            Phase::Close => "close",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// 阶段开始前发出，`transactions` 为本阶段待确认的交易数
    PhaseStarted {
        phase: Phase,
        transactions: usize,
    },
    Confirmed {
        phase: Phase,
        signature: Signature,
    },
    Failed {
        phase: Phase,
        attempt: usize,
        error: String,
    },
    RoundFinished {
        phase: Phase,
        attempt: usize,
        remaining: usize,
    },
}

pub type ProgressSink = UnboundedSender<DispatchEvent>;

#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub concurrency: usize,
    pub max_retries: usize,
    pub commitment: CommitmentConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            max_retries: 3,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

impl DispatchConfig {
    pub fn from_settings(settings: &DispatchSettings) -> Self {
        Self {
            concurrency: settings.concurrency.max(1),
            max_retries: settings.max_retries,
            commitment: settings.commitment_config(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DispatchResult {
    pub signatures: Vec<Signature>,
    pub unconfirmed: Vec<SignedTransaction>,
    /// 实际执行的轮数，1 表示没有发生重试
    pub attempts: usize,
}

impl DispatchResult {
    pub fn is_complete(&self) -> bool {
        self.unconfirmed.is_empty()
    }

    pub fn retries(&self) -> usize {
        self.attempts.saturating_sub(1)
    }
}

pub struct Dispatcher<S> {
    sender: Arc<S>,
    config: DispatchConfig,
    events: Option<ProgressSink>,
    cancel: CancellationToken,
}

impl<S> Dispatcher<S>
where
    S: TransactionSender + 'static,
{
    pub fn new(sender: Arc<S>, config: DispatchConfig) -> Self {
        Self {
            sender,
            config,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, events: ProgressSink) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn emit(&self, event: DispatchEvent) {
        if let Some(events) = &self.events {
            // 接收端关闭只意味着没人关心进度
            let _ = events.send(event);
        }
    }

    /// 以有限并发提交全部交易，失败的交易进入下一轮，最多 `max_retries + 1` 轮。
    pub async fn dispatch(&self, phase: Phase, txs: Vec<SignedTransaction>) -> DispatchResult {
        let total_passes = self.config.max_retries.saturating_add(1);
        let concurrency = self.config.concurrency.max(1);
        let mut signatures = Vec::with_capacity(txs.len());
        let mut remaining = txs;
        let mut attempt = 0usize;
        if !remaining.is_empty() {
            self.emit(DispatchEvent::PhaseStarted {
                phase,
                transactions: remaining.len(),
            });
        }

        while !remaining.is_empty() && attempt < total_passes {
            if self.cancel.is_cancelled() {
                break;
            }

            let round = attempt;
            let outcomes: Vec<(SignedTransaction, Result<Signature, LanderError>)> =
                stream::iter(remaining.into_iter().map(|tx| self.submit(phase, round, tx)))
                    .buffer_unordered(concurrency)
                    .collect()
                    .await;

            let mut next_round = Vec::new();
            for (tx, result) in outcomes {
                match result {
                    Ok(signature) => {
                        events::tx_confirmed(phase, round);
                        self.emit(DispatchEvent::Confirmed { phase, signature });
                        signatures.push(signature);
                    }
                    Err(err) => {
                        events::tx_failed(phase, round, &err);
                        warn!(
                            target: "lander::dispatch",
                            phase = %phase,
                            attempt = round,
                            tx_signature = %tx.signature(),
                            error = %err,
                            "{}",
                            format_args!("交易提交失败: 阶段={} 尝试={}", phase, round)
                        );
                        self.emit(DispatchEvent::Failed {
                            phase,
                            attempt: round,
                            error: err.to_string(),
                        });
                        next_round.push(tx);
                    }
                }
            }

            remaining = next_round;
            attempt += 1;
            events::dispatch_round(phase, round, signatures.len(), remaining.len());
            self.emit(DispatchEvent::RoundFinished {
                phase,
                attempt: round,
                remaining: remaining.len(),
            });
            debug!(
                target: "lander::dispatch",
                phase = %phase,
                attempt = round,
                confirmed = signatures.len(),
                remaining = remaining.len(),
                "dispatch round finished"
            );
        }

        info!(
            target: "lander::dispatch",
            phase = %phase,
            attempts = attempt,
            confirmed = signatures.len(),
            unconfirmed = remaining.len(),
            cancelled = self.cancel.is_cancelled(),
            "phase dispatch finished"
        );

        DispatchResult {
            signatures,
            unconfirmed: remaining,
            attempts: attempt,
        }
    }

    /// 与 `dispatch` 相同，但未全部确认时返回阶段级错误。
    pub async fn dispatch_phase(
        &self,
        phase: Phase,
        txs: Vec<SignedTransaction>,
    ) -> Result<Vec<Signature>, LanderError> {
        let result = self.dispatch(phase, txs).await;
        if result.is_complete() {
            return Ok(result.signatures);
        }

        if self.cancel.is_cancelled() {
            Err(LanderError::Cancelled {
                phase,
                confirmed: result.signatures,
                unconfirmed: result.unconfirmed,
            })
        } else {
            Err(LanderError::PhaseExhausted {
                phase,
                confirmed: result.signatures,
                unconfirmed: result.unconfirmed,
            })
        }
    }

    async fn submit(
        &self,
        phase: Phase,
        attempt: usize,
        tx: SignedTransaction,
    ) -> (SignedTransaction, Result<Signature, LanderError>) {
        if self.cancel.is_cancelled() {
            let err = LanderError::fatal(format!("{phase} 阶段已取消，跳过提交"));
            return (tx, Err(err));
        }

        debug!(
            target: "lander::dispatch",
            phase = %phase,
            attempt,
            sender = self.sender.name(),
            tx_signature = %tx.signature(),
            "submitting transaction"
        );
        let result = self
            .sender
            .send_and_confirm(&tx, self.config.commitment)
            .await;
        (tx, result)
    }
}
