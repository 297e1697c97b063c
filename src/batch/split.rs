use std::mem;

use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use tracing::debug;

use super::BatchError;

/// 有序指令列表；阶段内与阶段间的顺序都需要保留。
#[derive(Debug, Clone, Default)]
pub struct InstructionBatch {
    instructions: Vec<Instruction>,
}

impl InstructionBatch {
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction>) {
        self.instructions.extend(instructions);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn split(
        &self,
        payer: &Pubkey,
        prefix: &[Instruction],
        max_size: usize,
    ) -> Result<Vec<Vec<Instruction>>, BatchError> {
        split_by_transaction_size(payer, &self.instructions, prefix, max_size)
    }
}

impl From<Vec<Instruction>> for InstructionBatch {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

/// 以占位签名与区块哈希序列化后的交易字节数。
pub fn transaction_size(payer: &Pubkey, instructions: &[Instruction]) -> Result<usize, BatchError> {
    let message = Message::new_with_blockhash(instructions, Some(payer), &Hash::default());
    let transaction = Transaction::new_unsigned(message);
    let encoded = bincode::serde::encode_to_vec(&transaction, bincode::config::legacy())?;
    Ok(encoded.len())
}

/// 贪心打包：当前交易放不下下一条指令时另起一笔，单条指令不会跨交易。
/// `prefix`（例如 compute budget 指令）计入每笔交易的尺寸，但不出现在返回的分组中。
pub fn split_by_transaction_size(
    payer: &Pubkey,
    instructions: &[Instruction],
    prefix: &[Instruction],
    max_size: usize,
) -> Result<Vec<Vec<Instruction>>, BatchError> {
    let mut groups = Vec::new();
    let mut current: Vec<Instruction> = Vec::new();

    for (index, instruction) in instructions.iter().enumerate() {
        current.push(instruction.clone());
        if fits(payer, prefix, &current, max_size)? {
            continue;
        }

        current.pop();
        if current.is_empty() {
            return Err(oversized(payer, prefix, instruction, index, max_size)?);
        }
        groups.push(mem::take(&mut current));

        current.push(instruction.clone());
        if !fits(payer, prefix, &current, max_size)? {
            return Err(oversized(payer, prefix, instruction, index, max_size)?);
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    debug!(
        target: "batch::split",
        instructions = instructions.len(),
        transactions = groups.len(),
        max_size,
        "instructions packed by transaction size"
    );

    Ok(groups)
}

fn fits(
    payer: &Pubkey,
    prefix: &[Instruction],
    group: &[Instruction],
    max_size: usize,
) -> Result<bool, BatchError> {
    let size = if prefix.is_empty() {
        transaction_size(payer, group)?
    } else {
        let combined: Vec<Instruction> = prefix.iter().chain(group.iter()).cloned().collect();
        transaction_size(payer, &combined)?
    };
    Ok(size <= max_size)
}

fn oversized(
    payer: &Pubkey,
    prefix: &[Instruction],
    instruction: &Instruction,
    index: usize,
    limit: usize,
) -> Result<BatchError, BatchError> {
    let combined: Vec<Instruction> = prefix
        .iter()
        .chain(std::iter::once(instruction))
        .cloned()
        .collect();
    let size = transaction_size(payer, &combined)?;
    Ok(BatchError::OversizedInstruction { index, size, limit })
}
