use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lander::{DispatchEvent, ProgressSink};

/// 分发事件的终端进度条；stderr 不是终端时只消费事件。
/// 总数随各阶段开始累加，重试不会增加总数。
pub struct DispatchProgress {
    sink: ProgressSink,
    handle: JoinHandle<Summary>,
    bar: Option<ProgressBar>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub confirmed: usize,
    pub failures: usize,
    pub rounds: usize,
}

impl DispatchProgress {
    pub fn spawn() -> Self {
        let (sink, rx) = mpsc::unbounded_channel();
        let bar = std::io::stderr()
            .is_terminal()
            .then(create_dispatch_bar);
        let handle = tokio::spawn(consume(rx, bar.clone()));
        Self { sink, handle, bar }
    }

    pub fn sink(&self) -> ProgressSink {
        self.sink.clone()
    }

    /// 等待所有发送端释放后结束展示。
    pub async fn finish(self) -> Summary {
        drop(self.sink);
        let summary = self.handle.await.unwrap_or_default();
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
        summary
    }
}

fn create_dispatch_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message("等待交易确认…");
    bar
}

async fn consume(
    mut rx: mpsc::UnboundedReceiver<DispatchEvent>,
    bar: Option<ProgressBar>,
) -> Summary {
    let mut summary = Summary::default();
    while let Some(event) = rx.recv().await {
        let message = match &event {
            DispatchEvent::PhaseStarted {
                phase,
                transactions,
            } => {
                if let Some(bar) = &bar {
                    bar.inc_length(*transactions as u64);
                }
                format!("[{phase}] 开始，共 {transactions} 笔")
            }
            DispatchEvent::Confirmed { phase, signature } => {
                summary.confirmed += 1;
                if let Some(bar) = &bar {
                    bar.inc(1);
                }
                format!("[{phase}] 最新 {signature}")
            }
            DispatchEvent::Failed {
                phase,
                attempt,
                error,
            } => {
                summary.failures += 1;
                format!("[{phase}] 第 {attempt} 轮失败：{error}")
            }
            DispatchEvent::RoundFinished {
                phase,
                attempt,
                remaining,
            } => {
                summary.rounds += 1;
                format!("[{phase}] 第 {attempt} 轮结束，剩余 {remaining} 笔")
            }
        };
        if let Some(bar) = &bar {
            bar.set_message(message);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lander::Phase;
    use solana_sdk::signature::Signature;

    #[tokio::test]
    async fn bar_tracks_confirmed_out_of_started_total() {
        let (tx, rx) = mpsc::unbounded_channel();
        let bar = ProgressBar::hidden();
        let handle = tokio::spawn(consume(rx, Some(bar.clone())));
        tx.send(DispatchEvent::PhaseStarted {
            phase: Phase::Setup,
            transactions: 2,
        })
        .unwrap();
        tx.send(DispatchEvent::PhaseStarted {
            phase: Phase::Write,
            transactions: 3,
        })
        .unwrap();
        for _ in 0..4 {
            tx.send(DispatchEvent::Confirmed {
                phase: Phase::Write,
                signature: Signature::default(),
            })
            .unwrap();
        }
        tx.send(DispatchEvent::Failed {
            phase: Phase::Write,
            attempt: 0,
            error: "timeout".to_string(),
        })
        .unwrap();
        drop(tx);

        let summary = handle.await.unwrap();
        assert_eq!(summary.confirmed, 4);
        assert_eq!(bar.length(), Some(5));
        assert_eq!(bar.position(), 4);
    }

    #[tokio::test]
    async fn summary_counts_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(consume(rx, None));
        tx.send(DispatchEvent::Confirmed {
            phase: Phase::Setup,
            signature: Signature::default(),
        })
        .unwrap();
        tx.send(DispatchEvent::Failed {
            phase: Phase::Write,
            attempt: 1,
            error: "timeout".to_string(),
        })
        .unwrap();
        tx.send(DispatchEvent::RoundFinished {
            phase: Phase::Write,
            attempt: 1,
            remaining: 1,
        })
        .unwrap();
        drop(tx);

        let summary = handle.await.unwrap();
        assert_eq!(
            summary,
            Summary {
                confirmed: 1,
                failures: 1,
                rounds: 1
            }
        );
    }
}
