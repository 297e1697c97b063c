use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

use crate::program;

use super::{BatchError, InscriptionTarget, MAX_PERMITTED_DATA_INCREASE};

/// 由目标长度与单次扩容上限推导出需要多少条 allocate 指令。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPlan {
    pub current_size: usize,
    pub target_size: usize,
    pub max_per_call: usize,
}

impl AllocationPlan {
    pub fn new(target_size: usize) -> Self {
        Self {
            current_size: 0,
            target_size,
            max_per_call: MAX_PERMITTED_DATA_INCREASE,
        }
    }

    pub fn with_current_size(mut self, current_size: usize) -> Self {
        self.current_size = current_size;
        self
    }

    pub fn with_max_per_call(mut self, max_per_call: usize) -> Self {
        self.max_per_call = max_per_call;
        self
    }

    pub fn needs_growth(&self) -> bool {
        self.current_size < self.target_size
    }

    /// 不需要扩容时仍然保留一次 allocate 调用（包括 target_size == 0）。
    pub fn instruction_count(&self) -> usize {
        if self.needs_growth() {
            (self.target_size - self.current_size).div_ceil(self.max_per_call.max(1))
        } else {
            1
        }
    }
}

pub fn build_allocate(
    payer: &Pubkey,
    target: &InscriptionTarget,
    plan: &AllocationPlan,
) -> Result<Vec<Instruction>, BatchError> {
    if plan.max_per_call == 0 {
        return Err(BatchError::InvalidAllocationStep);
    }
    let target_size =
        u32::try_from(plan.target_size).map_err(|_| BatchError::PayloadTooLarge(plan.target_size))?;
    let keys = target.keys(payer);

    (0..plan.instruction_count())
        .map(|_| {
            program::allocate(&keys, target.tag(), target_size).map_err(BatchError::from)
        })
        .collect()
}
