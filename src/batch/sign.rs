use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tracing::debug;

use super::BatchError;

/// 已签名、可直接提交的交易。
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub blockhash: Hash,
    pub instruction_count: usize,
}

impl SignedTransaction {
    pub fn signature(&self) -> Signature {
        self.transaction
            .signatures
            .first()
            .copied()
            .unwrap_or_default()
    }
}

/// 拉取一次最新区块哈希，并为每个分组生成一笔交易后一次性签名。
pub async fn prepare_and_sign(
    rpc: &RpcClient,
    signer: &Keypair,
    groups: Vec<Vec<Instruction>>,
    prefix: &[Instruction],
) -> Result<Vec<SignedTransaction>, BatchError> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }
    let blockhash = rpc.get_latest_blockhash().await?;
    sign_groups(signer, groups, prefix, blockhash)
}

pub fn sign_groups(
    signer: &Keypair,
    groups: Vec<Vec<Instruction>>,
    prefix: &[Instruction],
    blockhash: Hash,
) -> Result<Vec<SignedTransaction>, BatchError> {
    let payer = signer.pubkey();
    let signed = groups
        .into_iter()
        .map(|group| {
            let instruction_count = group.len();
            let instructions: Vec<Instruction> = if prefix.is_empty() {
                group
            } else {
                prefix.iter().cloned().chain(group).collect()
            };
            let mut transaction = Transaction::new_with_payer(&instructions, Some(&payer));
            transaction.try_sign(&[signer], blockhash)?;
            Ok(SignedTransaction {
                transaction,
                blockhash,
                instruction_count,
            })
        })
        .collect::<Result<Vec<_>, BatchError>>()?;

    debug!(
        target: "batch::sign",
        payer = %payer,
        blockhash = %blockhash,
        transactions = signed.len(),
        "transactions signed"
    );

    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::AccountMeta;
    use solana_sdk::pubkey::Pubkey;

    fn instruction(tag: u8) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(Pubkey::new_unique(), false)],
            data: vec![tag],
        }
    }

    #[test]
    fn signs_every_group_with_shared_blockhash() {
        let signer = Keypair::new();
        let blockhash = Hash::new_from_array([7u8; 32]);
        let groups = vec![vec![instruction(1), instruction(2)], vec![instruction(3)]];

        let signed = sign_groups(&signer, groups, &[], blockhash).unwrap();
        assert_eq!(signed.len(), 2);
        assert_eq!(signed[0].instruction_count, 2);
        assert_eq!(signed[1].instruction_count, 1);
        for tx in &signed {
            assert_eq!(tx.blockhash, blockhash);
            assert_eq!(tx.transaction.message.recent_blockhash, blockhash);
            assert_ne!(tx.signature(), Signature::default());
            assert!(tx.transaction.verify().is_ok());
        }
    }

    #[test]
    fn prefix_is_prepended_but_not_counted() {
        let signer = Keypair::new();
        let prefix = vec![instruction(9)];
        let blockhash = Hash::new_from_array([3u8; 32]);
        let signed = sign_groups(&signer, vec![vec![instruction(1)]], &prefix, blockhash).unwrap();
        assert_eq!(signed[0].instruction_count, 1);
        assert_eq!(signed[0].transaction.message.instructions.len(), 2);
    }

    #[tokio::test]
    async fn empty_groups_skip_blockhash_fetch() {
        let rpc = RpcClient::new_mock("fails".to_string());
        let signed = prepare_and_sign(&rpc, &Keypair::new(), Vec::new(), &[])
            .await
            .unwrap();
        assert!(signed.is_empty());
    }
}
