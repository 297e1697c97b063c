use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;

use crate::config::BatchSettings;

/// 每笔交易前置的 compute budget 指令；价格与上限都为空时返回空序列。
pub fn compute_budget_prefix(unit_price: u64, unit_limit: Option<u32>) -> Vec<Instruction> {
    let mut seq = Vec::with_capacity(2);
    if let Some(limit) = unit_limit.filter(|limit| *limit > 0) {
        seq.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
    }
    if unit_price > 0 {
        seq.push(ComputeBudgetInstruction::set_compute_unit_price(unit_price));
    }
    seq
}

pub fn prefix_from_settings(settings: &BatchSettings) -> Vec<Instruction> {
    compute_budget_prefix(
        settings.compute_unit_price_micro_lamports,
        settings.compute_unit_limit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_when_unconfigured() {
        assert!(compute_budget_prefix(0, None).is_empty());
        assert!(compute_budget_prefix(0, Some(0)).is_empty());
    }

    #[test]
    fn limit_precedes_price() {
        let seq = compute_budget_prefix(5_000, Some(200_000));
        assert_eq!(seq.len(), 2);
        assert!(
            seq.iter()
                .all(|ix| ix.program_id == solana_compute_budget_interface::id())
        );
        assert_eq!(
            seq[0],
            ComputeBudgetInstruction::set_compute_unit_limit(200_000)
        );
        assert_eq!(seq[1], ComputeBudgetInstruction::set_compute_unit_price(5_000));
    }
}
