use std::collections::HashSet;

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::batch::{
    AllocationPlan, InstructionBatch, WritePayload, build_allocate, build_chunked_write,
};
use crate::config::BatchSettings;
use crate::program::{self, InitializeFromMintKeys};

use super::shard::Shard;
use super::{IMAGE_TAG, InscriptionAccounts, InscriptionError};

/// 单个 mint 的铭刻请求：必填 JSON，可选图片。
#[derive(Debug, Clone)]
pub struct InscribeRequest {
    pub mint: Pubkey,
    pub json: Vec<u8>,
    pub image: Option<Vec<u8>>,
}

/// 构建指令所需的付款人与分块参数。
#[derive(Debug, Clone, Copy)]
pub struct PlanContext {
    pub payer: Pubkey,
    pub chunk_size: usize,
    pub max_per_call: usize,
}

impl PlanContext {
    pub fn new(payer: Pubkey, settings: &BatchSettings) -> Self {
        Self {
            payer,
            chunk_size: settings.chunk_size,
            max_per_call: settings.max_per_call,
        }
    }
}

/// 两阶段指令集合：`setup` 全部确认后才能发送 `writes`。
#[derive(Debug, Clone, Default)]
pub struct InscriptionPlan {
    pub setup: InstructionBatch,
    pub writes: InstructionBatch,
    /// 每个目标账户的数据长度，用于租金估算
    pub target_sizes: Vec<usize>,
}

impl InscriptionPlan {
    pub fn total_bytes(&self) -> usize {
        self.target_sizes.iter().sum()
    }

    fn push_allocation(
        &mut self,
        ctx: &PlanContext,
        payload: &WritePayload,
        current_size: usize,
    ) -> Result<(), InscriptionError> {
        let allocation = AllocationPlan::new(payload.len())
            .with_current_size(current_size)
            .with_max_per_call(ctx.max_per_call);
        self.setup
            .extend(build_allocate(&ctx.payer, payload.target(), &allocation)?);
        self.target_sizes.push(payload.len());
        Ok(())
    }

    fn push_writes(
        &mut self,
        ctx: &PlanContext,
        payload: &WritePayload,
    ) -> Result<(), InscriptionError> {
        self.writes
            .extend(build_chunked_write(&ctx.payer, payload, ctx.chunk_size)?);
        Ok(())
    }
}

/// 新铭文：initialize-from-mint、分配 JSON 空间，若有图片再初始化关联账户并分配。
/// 写入阶段先写图片再写 JSON。同一批次内 mint 不能重复。
pub fn plan_new_inscription(
    ctx: &PlanContext,
    requests: &[(InscribeRequest, Shard)],
) -> Result<InscriptionPlan, InscriptionError> {
    if requests.is_empty() {
        return Err(InscriptionError::EmptyRequest);
    }
    let mut seen = HashSet::with_capacity(requests.len());
    if let Some((request, _)) = requests.iter().find(|(request, _)| !seen.insert(request.mint)) {
        return Err(InscriptionError::DuplicateMint(request.mint));
    }

    let mut plan = InscriptionPlan::default();
    for (request, shard) in requests {
        let accounts = InscriptionAccounts::derive(&request.mint);
        plan.setup
            .push(program::initialize_from_mint(&InitializeFromMintKeys {
                inscription: accounts.inscription,
                metadata: accounts.metadata,
                mint: request.mint,
                token_metadata: program::find_token_metadata_pda(&request.mint).0,
                token_account: spl_associated_token_account::get_associated_token_address(
                    &ctx.payer,
                    &request.mint,
                ),
                shard: shard.address,
                payer: ctx.payer,
            }));

        let json = WritePayload::new(accounts.json_target(), request.json.clone());
        plan.push_allocation(ctx, &json, 0)?;

        if let Some(image_bytes) = &request.image {
            plan.setup.push(program::initialize_associated_inscription(
                &accounts.metadata,
                &accounts.image,
                &ctx.payer,
                IMAGE_TAG,
            )?);
            let image = WritePayload::new(accounts.image_target(), image_bytes.clone());
            plan.push_allocation(ctx, &image, 0)?;
            plan.push_writes(ctx, &image)?;
        }

        plan.push_writes(ctx, &json)?;

        debug!(
            target: "inscription::plan",
            mint = %request.mint,
            shard = shard.number,
            json_bytes = request.json.len(),
            image_bytes = request.image.as_ref().map(Vec::len).unwrap_or(0),
            "new inscription planned"
        );
    }

    Ok(plan)
}

/// 覆盖已有铭文：关联账户不存在时先初始化，否则清空；随后重新分配并写入。
pub fn plan_update(
    ctx: &PlanContext,
    accounts: &InscriptionAccounts,
    tag: Option<&str>,
    bytes: &[u8],
    associated_exists: bool,
) -> Result<InscriptionPlan, InscriptionError> {
    let target = accounts.target(tag)?;
    let mut plan = InscriptionPlan::default();

    match tag {
        Some(tag) if !associated_exists => {
            plan.setup.push(program::initialize_associated_inscription(
                &accounts.metadata,
                &target.account,
                &ctx.payer,
                tag,
            )?);
        }
        _ => {
            plan.setup
                .push(program::clear_data(&target.keys(&ctx.payer), tag)?);
        }
    }

    let payload = WritePayload::new(target, bytes.to_vec());
    plan.push_allocation(ctx, &payload, 0)?;
    plan.push_writes(ctx, &payload)?;

    debug!(
        target: "inscription::plan",
        mint = %accounts.mint,
        tag = tag.unwrap_or("-"),
        bytes = bytes.len(),
        setup = plan.setup.len(),
        writes = plan.writes.len(),
        "update planned"
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{AllocateArgs, WriteDataArgs, discriminant};
    use borsh::BorshDeserialize;
    use solana_sdk::instruction::Instruction;

    fn ctx() -> PlanContext {
        PlanContext {
            payer: Pubkey::new_unique(),
            chunk_size: 800,
            max_per_call: 10_240,
        }
    }

    fn discriminants(instructions: &[Instruction]) -> Vec<u8> {
        instructions.iter().map(|ix| ix.data[0]).collect()
    }

    #[test]
    fn json_only_inscription_has_init_and_single_allocate() {
        let request = InscribeRequest {
            mint: Pubkey::new_unique(),
            json: vec![b'{'; 2_000],
            image: None,
        };
        let plan = plan_new_inscription(&ctx(), &[(request, Shard::new(3))]).unwrap();

        assert_eq!(
            discriminants(plan.setup.instructions()),
            vec![discriminant::INITIALIZE_FROM_MINT, discriminant::ALLOCATE]
        );
        assert_eq!(plan.writes.len(), 3);
        assert_eq!(plan.target_sizes, vec![2_000]);
        let shard = Shard::new(3).address;
        assert!(
            plan.setup.instructions()[0]
                .accounts
                .iter()
                .any(|meta| meta.pubkey == shard)
        );
    }

    #[test]
    fn image_is_allocated_in_steps_and_written_first() {
        let request = InscribeRequest {
            mint: Pubkey::new_unique(),
            json: vec![b'x'; 100],
            image: Some(vec![7u8; 25_000]),
        };
        let accounts = InscriptionAccounts::derive(&request.mint);
        let plan = plan_new_inscription(&ctx(), &[(request, Shard::new(0))]).unwrap();

        assert_eq!(
            discriminants(plan.setup.instructions()),
            vec![
                discriminant::INITIALIZE_FROM_MINT,
                discriminant::ALLOCATE,
                discriminant::INITIALIZE_ASSOCIATED_INSCRIPTION,
                discriminant::ALLOCATE,
                discriminant::ALLOCATE,
                discriminant::ALLOCATE,
            ]
        );
        let image_allocate =
            AllocateArgs::try_from_slice(&plan.setup.instructions()[3].data[1..]).unwrap();
        assert_eq!(image_allocate.target_size, 25_000);
        assert_eq!(image_allocate.associated_tag.as_deref(), Some("image"));

        // 32 个图片分块 + 1 个 JSON 分块，图片在前
        let writes = plan.writes.instructions();
        assert_eq!(writes.len(), 33);
        assert!(writes[..32].iter().all(|ix| ix.accounts[0].pubkey == accounts.image));
        assert_eq!(writes[32].accounts[0].pubkey, accounts.inscription);
        let last_image = WriteDataArgs::try_from_slice(&writes[31].data[1..]).unwrap();
        assert_eq!(last_image.offset, 24_800);
        assert_eq!(last_image.value.len(), 200);
        assert_eq!(plan.total_bytes(), 25_100);
    }

    #[test]
    fn empty_request_list_is_rejected() {
        assert!(matches!(
            plan_new_inscription(&ctx(), &[]),
            Err(InscriptionError::EmptyRequest)
        ));
    }

    #[test]
    fn repeated_mint_is_rejected() {
        let mint = Pubkey::new_unique();
        let request = |json: &[u8]| InscribeRequest {
            mint,
            json: json.to_vec(),
            image: None,
        };
        let requests = vec![
            (request(b"{}"), Shard::new(0)),
            (
                InscribeRequest {
                    mint: Pubkey::new_unique(),
                    json: b"{}".to_vec(),
                    image: None,
                },
                Shard::new(1),
            ),
            (request(b"{\"a\":1}"), Shard::new(2)),
        ];
        assert!(matches!(
            plan_new_inscription(&ctx(), &requests),
            Err(InscriptionError::DuplicateMint(dup)) if dup == mint
        ));
    }

    #[test]
    fn update_clears_existing_data() {
        let accounts = InscriptionAccounts::derive(&Pubkey::new_unique());
        let plan = plan_update(&ctx(), &accounts, None, &[1u8; 1_000], true).unwrap();
        assert_eq!(
            discriminants(plan.setup.instructions()),
            vec![discriminant::CLEAR_DATA, discriminant::ALLOCATE]
        );
        assert_eq!(plan.writes.len(), 2);
    }

    #[test]
    fn update_initializes_missing_image_account() {
        let accounts = InscriptionAccounts::derive(&Pubkey::new_unique());
        let plan = plan_update(&ctx(), &accounts, Some("image"), &[1u8; 10], false).unwrap();
        assert_eq!(
            discriminants(plan.setup.instructions()),
            vec![
                discriminant::INITIALIZE_ASSOCIATED_INSCRIPTION,
                discriminant::ALLOCATE
            ]
        );
        assert!(
            plan.writes
                .instructions()
                .iter()
                .all(|ix| ix.accounts[0].pubkey == accounts.image)
        );

        let existing = plan_update(&ctx(), &accounts, Some("image"), &[1u8; 10], true).unwrap();
        assert_eq!(existing.setup.instructions()[0].data[0], discriminant::CLEAR_DATA);
    }
}
