use solana_sdk::pubkey::Pubkey;

use super::{ASSOCIATION, ID, MAX_SEED_LEN, PREFIX, ProgramError, SHARD, TOKEN_METADATA_PROGRAM_ID};

/// 以 mint 为种子的主铭文账户。
pub fn find_mint_inscription_pda(mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PREFIX, ID.as_ref(), mint.as_ref()], &ID)
}

pub fn find_inscription_metadata_pda(inscription: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PREFIX, ID.as_ref(), inscription.as_ref()], &ID)
}

/// 关联铭文（例如 `image`）挂在元数据账户之下。
pub fn find_associated_inscription_pda(
    tag: &str,
    metadata: &Pubkey,
) -> Result<(Pubkey, u8), ProgramError> {
    validate_tag(tag)?;
    Ok(Pubkey::find_program_address(
        &[PREFIX, ASSOCIATION, tag.as_bytes(), metadata.as_ref()],
        &ID,
    ))
}

pub fn find_inscription_shard_pda(shard_number: u8) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PREFIX, SHARD, ID.as_ref(), &[shard_number]], &ID)
}

pub fn find_token_metadata_pda(mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            b"metadata",
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
}

pub fn validate_tag(tag: &str) -> Result<(), ProgramError> {
    if tag.is_empty() || tag.len() > MAX_SEED_LEN {
        return Err(ProgramError::InvalidTag {
            tag: tag.to_string(),
            max: MAX_SEED_LEN,
        });
    }
    Ok(())
}
