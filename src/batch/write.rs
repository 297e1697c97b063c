use std::ops::Range;

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::program;

use super::{BatchError, WritePayload};

/// 把 `[0, len)` 切成首尾相接、互不重叠的区间。
pub fn chunk_ranges(len: usize, chunk_size: usize) -> impl Iterator<Item = Range<usize>> {
    let step = chunk_size.max(1);
    (0..len)
        .step_by(step)
        .map(move |start| start..(start + step).min(len))
}

pub fn build_chunked_write(
    payer: &Pubkey,
    payload: &WritePayload,
    chunk_size: usize,
) -> Result<Vec<Instruction>, BatchError> {
    if chunk_size == 0 {
        return Err(BatchError::InvalidChunkSize);
    }
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    if u32::try_from(payload.len()).is_err() {
        return Err(BatchError::PayloadTooLarge(payload.len()));
    }

    let target = payload.target();
    let keys = target.keys(payer);
    let bytes = payload.bytes();

    let instructions = chunk_ranges(bytes.len(), chunk_size)
        .map(|range| {
            let offset = range.start as u32;
            program::write_data(&keys, target.tag(), offset, &bytes[range])
                .map_err(BatchError::from)
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        target: "batch::write",
        account = %target.account,
        tag = target.tag().unwrap_or("-"),
        bytes = bytes.len(),
        chunks = instructions.len(),
        "chunked write prepared"
    );

    Ok(instructions)
}
