use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_system_interface::program as system_program;

use super::{ID, ProgramError};

/// 指令判别字节，与链上程序的指令枚举顺序一致。
pub mod discriminant {
    pub const INITIALIZE_FROM_MINT: u8 = 1;
    pub const CLOSE: u8 = 2;
    pub const WRITE_DATA: u8 = 3;
    pub const CLEAR_DATA: u8 = 4;
    pub const CREATE_SHARD: u8 = 7;
    pub const INITIALIZE_ASSOCIATED_INSCRIPTION: u8 = 8;
    pub const ALLOCATE: u8 = 9;
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CloseInscriptionArgs {
    pub associated_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct WriteDataArgs {
    pub associated_tag: Option<String>,
    pub offset: u32,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ClearDataArgs {
    pub associated_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateShardArgs {
    pub shard_number: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AssociatedInscriptionAccountArgs {
    pub association_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AllocateArgs {
    pub associated_tag: Option<String>,
    pub target_size: u32,
}

/// 初始化/写入类指令共用的账户集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InscriptionKeys {
    pub inscription: Pubkey,
    pub metadata: Pubkey,
    pub payer: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeFromMintKeys {
    pub inscription: Pubkey,
    pub metadata: Pubkey,
    pub mint: Pubkey,
    pub token_metadata: Pubkey,
    pub token_account: Pubkey,
    pub shard: Pubkey,
    pub payer: Pubkey,
}

pub fn initialize_from_mint(keys: &InitializeFromMintKeys) -> Instruction {
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(keys.inscription, false),
            AccountMeta::new(keys.metadata, false),
            AccountMeta::new_readonly(keys.mint, false),
            AccountMeta::new_readonly(keys.token_metadata, false),
            AccountMeta::new_readonly(keys.token_account, false),
            AccountMeta::new(keys.shard, false),
            AccountMeta::new(keys.payer, true),
            absent_authority(),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: vec![discriminant::INITIALIZE_FROM_MINT],
    }
}

pub fn initialize_associated_inscription(
    metadata: &Pubkey,
    association: &Pubkey,
    payer: &Pubkey,
    tag: &str,
) -> Result<Instruction, ProgramError> {
    super::validate_tag(tag)?;
    let args = AssociatedInscriptionAccountArgs {
        association_tag: tag.to_string(),
    };
    Ok(Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*metadata, false),
            AccountMeta::new(*association, false),
            AccountMeta::new(*payer, true),
            absent_authority(),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: encode(discriminant::INITIALIZE_ASSOCIATED_INSCRIPTION, &args)?,
    })
}

pub fn allocate(
    keys: &InscriptionKeys,
    associated_tag: Option<&str>,
    target_size: u32,
) -> Result<Instruction, ProgramError> {
    let args = AllocateArgs {
        associated_tag: associated_tag.map(str::to_string),
        target_size,
    };
    Ok(inscription_instruction(
        keys,
        encode(discriminant::ALLOCATE, &args)?,
    ))
}

pub fn write_data(
    keys: &InscriptionKeys,
    associated_tag: Option<&str>,
    offset: u32,
    value: &[u8],
) -> Result<Instruction, ProgramError> {
    let args = WriteDataArgs {
        associated_tag: associated_tag.map(str::to_string),
        offset,
        value: value.to_vec(),
    };
    Ok(inscription_instruction(
        keys,
        encode(discriminant::WRITE_DATA, &args)?,
    ))
}

pub fn clear_data(
    keys: &InscriptionKeys,
    associated_tag: Option<&str>,
) -> Result<Instruction, ProgramError> {
    let args = ClearDataArgs {
        associated_tag: associated_tag.map(str::to_string),
    };
    Ok(inscription_instruction(
        keys,
        encode(discriminant::CLEAR_DATA, &args)?,
    ))
}

pub fn close(
    keys: &InscriptionKeys,
    associated_tag: Option<&str>,
) -> Result<Instruction, ProgramError> {
    let args = CloseInscriptionArgs {
        associated_tag: associated_tag.map(str::to_string),
    };
    Ok(inscription_instruction(
        keys,
        encode(discriminant::CLOSE, &args)?,
    ))
}

pub fn create_shard(
    shard: &Pubkey,
    payer: &Pubkey,
    shard_number: u8,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*shard, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: encode(discriminant::CREATE_SHARD, &CreateShardArgs { shard_number })?,
    })
}

fn inscription_instruction(keys: &InscriptionKeys, data: Vec<u8>) -> Instruction {
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(keys.inscription, false),
            AccountMeta::new(keys.metadata, false),
            AccountMeta::new(keys.payer, true),
            absent_authority(),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

// 可选账户缺省时以程序 ID 占位。
fn absent_authority() -> AccountMeta {
    AccountMeta::new_readonly(ID, false)
}

fn encode<T: BorshSerialize>(discriminant: u8, args: &T) -> Result<Vec<u8>, ProgramError> {
    let mut data = vec![discriminant];
    borsh::to_writer(&mut data, args)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> InscriptionKeys {
        InscriptionKeys {
            inscription: Pubkey::new_unique(),
            metadata: Pubkey::new_unique(),
            payer: Pubkey::new_unique(),
        }
    }

    #[test]
    fn write_data_encodes_offset_and_value() {
        let keys = keys();
        let ix = write_data(&keys, Some("image"), 1_600, &[7, 8, 9]).unwrap();
        assert_eq!(ix.program_id, ID);
        assert_eq!(ix.data[0], discriminant::WRITE_DATA);

        let args = WriteDataArgs::try_from_slice(&ix.data[1..]).unwrap();
        assert_eq!(args.associated_tag.as_deref(), Some("image"));
        assert_eq!(args.offset, 1_600);
        assert_eq!(args.value, vec![7, 8, 9]);

        assert!(ix.accounts[2].is_signer);
        assert_eq!(ix.accounts[2].pubkey, keys.payer);
        assert_eq!(ix.accounts[4].pubkey, system_program::ID);
    }

    #[test]
    fn allocate_carries_target_size() {
        let ix = allocate(&keys(), None, 25_000).unwrap();
        assert_eq!(ix.data[0], discriminant::ALLOCATE);
        let args = AllocateArgs::try_from_slice(&ix.data[1..]).unwrap();
        assert_eq!(args.associated_tag, None);
        assert_eq!(args.target_size, 25_000);
    }

    #[test]
    fn associated_inscription_rejects_empty_tag() {
        let metadata = Pubkey::new_unique();
        let association = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        assert!(initialize_associated_inscription(&metadata, &association, &payer, "").is_err());
    }
}
