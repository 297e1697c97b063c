use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

/// 账户类型标记（首字节）。
pub mod key {
    pub const UNINITIALIZED: u8 = 0;
    pub const INSCRIPTION_SHARD: u8 = 1;
    pub const INSCRIPTION_METADATA: u8 = 2;
    pub const MINT_INSCRIPTION_METADATA: u8 = 3;
}

#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct InscriptionShard {
    pub key: u8,
    pub bump: u8,
    pub shard_number: u8,
    pub count: u64,
}

impl InscriptionShard {
    pub fn decode(data: &[u8]) -> Option<Self> {
        let shard = Self::deserialize(&mut &data[..]).ok()?;
        (shard.key == key::INSCRIPTION_SHARD).then_some(shard)
    }

    /// 该分片最近分配出的全局序号；各分片交错编号，取最大值即为铭文总数。
    pub fn latest_rank(&self) -> u64 {
        self.count * u64::from(super::SHARD_COUNT) + u64::from(self.shard_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct AssociatedInscription {
    pub tag: String,
    pub bump: u8,
    pub data_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
struct RawMetadata {
    key: u8,
    bump: u8,
    state: u8,
    inscription_rank: u64,
    inscription_bump: Option<u8>,
    update_authorities: Vec<[u8; 32]>,
    associated_inscriptions: Vec<AssociatedInscription>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InscriptionMetadata {
    pub key: u8,
    pub bump: u8,
    pub state: u8,
    pub inscription_rank: u64,
    pub inscription_bump: Option<u8>,
    pub update_authorities: Vec<Pubkey>,
    pub associated_inscriptions: Vec<AssociatedInscription>,
}

impl InscriptionMetadata {
    /// 按前缀解码，尾部的预留空间忽略；布局不符时返回 `None`。
    pub fn decode(data: &[u8]) -> Option<Self> {
        let raw = RawMetadata::deserialize(&mut &data[..]).ok()?;
        if raw.key != key::INSCRIPTION_METADATA && raw.key != key::MINT_INSCRIPTION_METADATA {
            return None;
        }
        Some(Self {
            key: raw.key,
            bump: raw.bump,
            state: raw.state,
            inscription_rank: raw.inscription_rank,
            inscription_bump: raw.inscription_bump,
            update_authorities: raw
                .update_authorities
                .into_iter()
                .map(Pubkey::new_from_array)
                .collect(),
            associated_inscriptions: raw.associated_inscriptions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_shard_with_trailing_bytes() {
        let mut data = vec![key::INSCRIPTION_SHARD, 254, 5];
        data.extend_from_slice(&42u64.to_le_bytes());
        data.extend_from_slice(&[0u8; 16]);

        let shard = InscriptionShard::decode(&data).unwrap();
        assert_eq!(shard.shard_number, 5);
        assert_eq!(shard.count, 42);
        assert_eq!(shard.latest_rank(), 42 * 32 + 5);
    }

    #[test]
    fn rejects_wrong_key() {
        let mut data = vec![key::UNINITIALIZED, 0, 0];
        data.extend_from_slice(&0u64.to_le_bytes());
        assert!(InscriptionShard::decode(&data).is_none());
        assert!(InscriptionMetadata::decode(&[]).is_none());
    }

    #[test]
    fn decodes_metadata_associations() {
        let authority = Pubkey::new_unique();
        let mut data = vec![key::MINT_INSCRIPTION_METADATA, 253, 0];
        data.extend_from_slice(&7u64.to_le_bytes());
        data.extend_from_slice(&[1, 252]);
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(authority.as_ref());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&5u32.to_le_bytes());
        data.extend_from_slice(b"image");
        data.extend_from_slice(&[251, 1]);

        let metadata = InscriptionMetadata::decode(&data).unwrap();
        assert_eq!(metadata.inscription_rank, 7);
        assert_eq!(metadata.inscription_bump, Some(252));
        assert_eq!(metadata.update_authorities, vec![authority]);
        assert_eq!(metadata.associated_inscriptions.len(), 1);
        assert_eq!(metadata.associated_inscriptions[0].tag, "image");
    }
}
