use std::future::Future;

use serde_json::Value;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;

use crate::payload::{ImageFormat, decode_json};
use crate::program::InscriptionMetadata;

use super::{InscriptionAccounts, InscriptionError};

/// 从链上读回的铭文状态。
#[derive(Debug, Clone)]
pub struct InscriptionView {
    pub accounts: InscriptionAccounts,
    pub metadata: Option<InscriptionMetadata>,
    pub json_bytes: Option<Vec<u8>>,
    /// 尽力解码，字节损坏时为 `None`
    pub json: Option<Value>,
    pub image: Option<Vec<u8>>,
    pub rent_lamports: u64,
}

impl InscriptionView {
    pub fn from_accounts(
        accounts: InscriptionAccounts,
        inscription: Option<Account>,
        metadata: Option<Account>,
        image: Option<Account>,
    ) -> Self {
        let rent_lamports = [&inscription, &metadata, &image]
            .iter()
            .filter_map(|account| account.as_ref().map(|acc| acc.lamports))
            .sum();
        let json_bytes = inscription.map(|account| account.data);
        let json = json_bytes.as_deref().and_then(decode_json);
        Self {
            accounts,
            metadata: metadata.and_then(|account| InscriptionMetadata::decode(&account.data)),
            json,
            json_bytes,
            image: image.map(|account| account.data),
            rent_lamports,
        }
    }

    pub fn is_inscribed(&self) -> bool {
        self.json_bytes.is_some()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn image_format(&self) -> Option<ImageFormat> {
        self.image.as_deref().map(ImageFormat::sniff)
    }

    pub fn inscription_rank(&self) -> Option<u64> {
        self.metadata.as_ref().map(|meta| meta.inscription_rank)
    }
}

pub async fn fetch_inscription(
    rpc: &RpcClient,
    mint: &Pubkey,
) -> Result<InscriptionView, InscriptionError> {
    let accounts = InscriptionAccounts::derive(mint);
    let mut fetched = rpc
        .get_multiple_accounts(&[accounts.inscription, accounts.metadata, accounts.image])
        .await?
        .into_iter();
    let inscription = fetched.next().flatten();
    let metadata = fetched.next().flatten();
    let image = fetched.next().flatten();
    Ok(InscriptionView::from_accounts(
        accounts,
        inscription,
        metadata,
        image,
    ))
}

/// `getMultipleAccounts` 单次请求的账户上限。
pub(crate) const MAX_RPC_BATCH_SIZE: usize = 100;

/// 按上限分批读取账户，结果顺序与 `pubkeys` 一致。
pub(crate) async fn fetch_accounts(
    rpc: &RpcClient,
    pubkeys: &[Pubkey],
) -> Result<Vec<Option<Account>>, InscriptionError> {
    Ok(fetch_in_batches(pubkeys, move |chunk| rpc.get_multiple_accounts(chunk)).await?)
}

async fn fetch_in_batches<'a, F, Fut>(
    pubkeys: &'a [Pubkey],
    mut fetch: F,
) -> Result<Vec<Option<Account>>, ClientError>
where
    F: FnMut(&'a [Pubkey]) -> Fut,
    Fut: Future<Output = Result<Vec<Option<Account>>, ClientError>>,
{
    let mut accounts = Vec::with_capacity(pubkeys.len());
    for chunk in pubkeys.chunks(MAX_RPC_BATCH_SIZE) {
        accounts.extend(fetch(chunk).await?);
    }
    Ok(accounts)
}
