use std::collections::BTreeMap;
use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::{info, warn};

use crate::batch::{InstructionBatch, prepare_and_sign};
use crate::config::{BatchSettings, InscriptionSettings};
use crate::instructions::prefix_from_settings;
use crate::lander::{Dispatcher, Phase, TransactionSender};
use crate::monitoring::events;
use crate::program::{self, InscriptionShard};
use crate::wallet::Identity;

use super::plan::{
    InscribeRequest, InscriptionPlan, PlanContext, plan_new_inscription, plan_update,
};
use super::reader::{InscriptionView, fetch_accounts, fetch_inscription};
use super::shard::{Shard, all_shards, inscription_count, pick_shard};
use super::{InscriptionAccounts, InscriptionError};

/// 一次铭刻/更新的全部签名，按阶段归类。
#[derive(Debug, Clone, Default)]
pub struct InscribeReport {
    pub shard_signatures: Vec<Signature>,
    pub setup_signatures: Vec<Signature>,
    pub write_signatures: Vec<Signature>,
}

impl InscribeReport {
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.shard_signatures
            .iter()
            .chain(&self.setup_signatures)
            .chain(&self.write_signatures)
    }

    pub fn transaction_count(&self) -> usize {
        self.shard_signatures.len() + self.setup_signatures.len() + self.write_signatures.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShardReport {
    pub created: Vec<u8>,
    pub existing: Vec<u8>,
    pub signatures: Vec<Signature>,
    /// 检查前链上已有的铭文总数
    pub inscription_count: u64,
}

pub struct Inscriber<S> {
    rpc: Arc<RpcClient>,
    identity: Identity,
    dispatcher: Dispatcher<S>,
    batch: BatchSettings,
    inscription: InscriptionSettings,
}

impl<S> Inscriber<S>
where
    S: TransactionSender + 'static,
{
    pub fn new(
        rpc: Arc<RpcClient>,
        identity: Identity,
        dispatcher: Dispatcher<S>,
        batch: BatchSettings,
        inscription: InscriptionSettings,
    ) -> Self {
        Self {
            rpc,
            identity,
            dispatcher,
            batch,
            inscription,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    fn plan_context(&self) -> PlanContext {
        PlanContext::new(self.identity.pubkey, &self.batch)
    }

    fn prefix(&self) -> Vec<Instruction> {
        prefix_from_settings(&self.batch)
    }

    /// 为每个请求随机挑选分片并生成指令计划，不访问网络。
    pub fn plan(
        &self,
        requests: Vec<InscribeRequest>,
    ) -> Result<(InscriptionPlan, Vec<Shard>), InscriptionError> {
        let mut rng = rand::rng();
        let with_shards = requests
            .into_iter()
            .map(|request| {
                pick_shard(&mut rng, self.inscription.shard_count).map(|shard| (request, shard))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let shards = with_shards.iter().map(|(_, shard)| *shard).collect();
        let plan = plan_new_inscription(&self.plan_context(), &with_shards)?;
        Ok((plan, shards))
    }

    /// 两个阶段各需多少笔交易，只做拆分。
    pub fn transaction_counts(
        &self,
        plan: &InscriptionPlan,
    ) -> Result<(usize, usize), InscriptionError> {
        let prefix = self.prefix();
        let count = |batch: &InstructionBatch| -> Result<usize, InscriptionError> {
            if batch.is_empty() {
                return Ok(0);
            }
            let groups = batch.split(
                &self.identity.pubkey,
                &prefix,
                self.batch.max_transaction_size,
            )?;
            Ok(groups.len())
        };
        Ok((count(&plan.setup)?, count(&plan.writes)?))
    }

    /// 拆分、签名并分发一个阶段；空批次直接返回。
    async fn run_phase(
        &self,
        phase: Phase,
        batch: &InstructionBatch,
    ) -> Result<Vec<Signature>, InscriptionError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let prefix = self.prefix();
        let groups = batch.split(
            &self.identity.pubkey,
            &prefix,
            self.batch.max_transaction_size,
        )?;
        events::batch_prepared(phase, batch.len(), groups.len());

        let txs = prepare_and_sign(&self.rpc, self.identity.keypair(), groups, &prefix).await?;
        Ok(self.dispatcher.dispatch_phase(phase, txs).await?)
    }

    /// 完整两阶段流程：准备阶段全部确认后才会开始写入。
    pub async fn inscribe(
        &self,
        requests: Vec<InscribeRequest>,
    ) -> Result<InscribeReport, InscriptionError> {
        if requests.is_empty() {
            return Err(InscriptionError::EmptyRequest);
        }
        let mints: Vec<_> = requests.iter().map(|request| request.mint).collect();
        let sizes: Vec<usize> = requests
            .iter()
            .map(|request| request.json.len() + request.image.as_ref().map_or(0, Vec::len))
            .collect();
        let (plan, shards) = self.plan(requests)?;

        let mut unique_shards: BTreeMap<u8, Shard> = BTreeMap::new();
        for shard in &shards {
            unique_shards.insert(shard.number, *shard);
        }

        let keys: Vec<Pubkey> = mints
            .iter()
            .map(|mint| InscriptionAccounts::derive(mint).inscription)
            .chain(unique_shards.values().map(|shard| shard.address))
            .collect();
        let fetched = fetch_accounts(&self.rpc, &keys).await?;
        let exists = |idx: usize| fetched.get(idx).is_some_and(Option::is_some);

        if let Some(idx) = (0..mints.len()).find(|idx| exists(*idx)) {
            return Err(InscriptionError::AlreadyInscribed(mints[idx]));
        }

        let missing: Vec<Shard> = unique_shards
            .values()
            .enumerate()
            .filter(|(offset, _)| !exists(mints.len() + offset))
            .map(|(_, shard)| *shard)
            .collect();

        let mut report = InscribeReport {
            shard_signatures: self.create_shards(&missing).await?,
            ..InscribeReport::default()
        };

        info!(
            target: "inscription::inscribe",
            mints = mints.len(),
            setup_instructions = plan.setup.len(),
            write_instructions = plan.writes.len(),
            bytes = plan.total_bytes(),
            "开始铭刻"
        );

        report.setup_signatures = self.run_phase(Phase::Setup, &plan.setup).await?;
        report.write_signatures = self.run_phase(Phase::Write, &plan.writes).await?;

        for (mint, bytes) in mints.iter().zip(sizes) {
            events::inscription_finished(mint, bytes);
        }
        events::inscriptions_dispatched(mints.len(), report.transaction_count());
        Ok(report)
    }

    /// 覆盖主铭文（`tag == None`）或关联铭文的数据。
    pub async fn update(
        &self,
        mint: &Pubkey,
        tag: Option<&str>,
        bytes: &[u8],
    ) -> Result<InscribeReport, InscriptionError> {
        let accounts = InscriptionAccounts::derive(mint);
        let associated = accounts.associated(tag)?;
        let fetched = self
            .rpc
            .get_multiple_accounts(&[accounts.inscription, associated])
            .await?;
        let inscribed = fetched.first().is_some_and(Option::is_some);
        if !inscribed {
            return Err(InscriptionError::NotInscribed(*mint));
        }
        let associated_exists = fetched.get(1).is_some_and(Option::is_some);

        let plan = plan_update(&self.plan_context(), &accounts, tag, bytes, associated_exists)?;
        info!(
            target: "inscription::update",
            mint = %mint,
            tag = tag.unwrap_or("-"),
            bytes = bytes.len(),
            initialize = tag.is_some() && !associated_exists,
            "开始更新铭文"
        );

        let setup_signatures = self.run_phase(Phase::Setup, &plan.setup).await?;
        let write_signatures = self.run_phase(Phase::Write, &plan.writes).await?;
        events::inscription_finished(mint, bytes.len());
        events::inscriptions_dispatched(1, setup_signatures.len() + write_signatures.len());
        Ok(InscribeReport {
            shard_signatures: Vec::new(),
            setup_signatures,
            write_signatures,
        })
    }

    /// 关闭铭文账户，租金退回付款人。
    pub async fn close(
        &self,
        mint: &Pubkey,
        tag: Option<&str>,
    ) -> Result<Vec<Signature>, InscriptionError> {
        let accounts = InscriptionAccounts::derive(mint);
        let target = accounts.target(tag)?;
        let batch = InstructionBatch::from(vec![program::close(
            &target.keys(&self.identity.pubkey),
            tag,
        )?]);
        let signatures = self.run_phase(Phase::Close, &batch).await?;
        info!(
            target: "inscription::close",
            mint = %mint,
            account = %target.account,
            tag = tag.unwrap_or("-"),
            "铭文账户已关闭"
        );
        Ok(signatures)
    }

    /// 检查前 `count` 个分片，仅创建不存在的分片，可重复执行。
    /// 计数总是读取全部分片，与 `count` 无关。
    pub async fn ensure_shards(&self, count: u8) -> Result<ShardReport, InscriptionError> {
        if count == 0 {
            return Err(InscriptionError::InvalidShardCount);
        }
        let shards: Vec<Shard> = all_shards(count.max(program::SHARD_COUNT)).collect();
        let addresses: Vec<_> = shards.iter().map(|shard| shard.address).collect();
        let fetched = fetch_accounts(&self.rpc, &addresses).await?;
        let decoded: Vec<Option<InscriptionShard>> = (0..shards.len())
            .map(|idx| {
                fetched
                    .get(idx)
                    .and_then(Option::as_ref)
                    .and_then(|account| InscriptionShard::decode(&account.data))
            })
            .collect();

        let mut report = ShardReport {
            inscription_count: inscription_count(decoded.iter().flatten()),
            ..ShardReport::default()
        };
        let mut missing = Vec::new();
        for (shard, state) in shards.iter().zip(&decoded).take(usize::from(count)) {
            if state.is_some() {
                report.existing.push(shard.number);
            } else {
                report.created.push(shard.number);
                missing.push(*shard);
            }
        }
        report.signatures = self.create_shards(&missing).await?;
        Ok(report)
    }

    async fn create_shards(&self, shards: &[Shard]) -> Result<Vec<Signature>, InscriptionError> {
        if shards.is_empty() {
            return Ok(Vec::new());
        }
        let payer = self.identity.pubkey;
        let instructions = shards
            .iter()
            .map(|shard| program::create_shard(&shard.address, &payer, shard.number))
            .collect::<Result<Vec<_>, _>>()?;
        warn!(
            target: "inscription::shard",
            missing = shards.len(),
            "分片账户不存在，先行创建"
        );
        let signatures = self
            .run_phase(Phase::Setup, &InstructionBatch::from(instructions))
            .await?;
        for shard in shards {
            events::shard_created(shard.number);
        }
        Ok(signatures)
    }

    pub async fn fetch(
        &self,
        mint: &Pubkey,
    ) -> Result<InscriptionView, InscriptionError> {
        fetch_inscription(&self.rpc, mint).await
    }
}
