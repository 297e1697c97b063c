use metrics::{counter, histogram};
use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::lander::{LanderError, Phase};

use super::metrics::prometheus_enabled;

pub fn tx_confirmed(phase: Phase, attempt: usize) {
    if prometheus_enabled() {
        let retried = if attempt > 0 { "true" } else { "false" };
        counter!(
            "inscriber_tx_confirmed_total",
            "phase" => phase.as_str(),
            "retried" => retried
        )
        .increment(1);
    }
}

pub fn tx_failed(phase: Phase, attempt: usize, err: &LanderError) {
    if prometheus_enabled() {
        counter!(
            "inscriber_tx_failed_total",
            "phase" => phase.as_str(),
            "reason" => err.label()
        )
        .increment(1);
        histogram!("inscriber_tx_failed_attempt", "phase" => phase.as_str()).record(attempt as f64);
    }
}

pub fn dispatch_round(phase: Phase, attempt: usize, confirmed: usize, remaining: usize) {
    if prometheus_enabled() {
        counter!("inscriber_dispatch_rounds", "phase" => phase.as_str()).increment(1);
        histogram!("inscriber_dispatch_remaining", "phase" => phase.as_str())
            .record(remaining as f64);
        histogram!("inscriber_dispatch_confirmed", "phase" => phase.as_str())
            .record(confirmed as f64);
        histogram!("inscriber_dispatch_attempt", "phase" => phase.as_str()).record(attempt as f64);
    }
}

pub fn batch_prepared(phase: Phase, instructions: usize, transactions: usize) {
    info!(
        target: "monitoring::batch",
        event = "prepared",
        phase = %phase,
        instructions,
        transactions,
        "batch prepared"
    );

    if prometheus_enabled() {
        histogram!("inscriber_batch_transactions", "phase" => phase.as_str())
            .record(transactions as f64);
        histogram!("inscriber_batch_instructions", "phase" => phase.as_str())
            .record(instructions as f64);
    }
}

/// 单个 mint 的完成事件；交易由整批共享，笔数只在 `inscriptions_dispatched` 中记录。
pub fn inscription_finished(mint: &Pubkey, bytes: usize) {
    info!(
        target: "monitoring::inscription",
        event = "finished",
        mint = %mint,
        bytes,
        "inscription finished"
    );

    if prometheus_enabled() {
        counter!("inscriber_inscriptions_total").increment(1);
        histogram!("inscriber_inscription_bytes").record(bytes as f64);
    }
}

pub fn inscriptions_dispatched(mints: usize, transactions: usize) {
    info!(
        target: "monitoring::inscription",
        event = "dispatched",
        mints,
        transactions,
        "inscription batch dispatched"
    );

    if prometheus_enabled() {
        histogram!("inscriber_inscription_batch_transactions").record(transactions as f64);
    }
}

pub fn shard_created(shard_number: u8) {
    info!(
        target: "monitoring::inscription",
        event = "shard_created",
        shard_number,
        "inscription shard created"
    );

    if prometheus_enabled() {
        counter!("inscriber_shards_created_total").increment(1);
    }
}
