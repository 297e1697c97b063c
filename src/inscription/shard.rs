use rand::Rng;
use solana_sdk::pubkey::Pubkey;

use crate::program::{InscriptionShard, find_inscription_shard_pda};

use super::InscriptionError;

/// 铭文计数分片，初始化铭文时随机挑选以分散写入竞争。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub number: u8,
    pub address: Pubkey,
}

impl Shard {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            address: find_inscription_shard_pda(number).0,
        }
    }
}

pub fn pick_shard<R: Rng + ?Sized>(rng: &mut R, shard_count: u8) -> Result<Shard, InscriptionError> {
    if shard_count == 0 {
        return Err(InscriptionError::InvalidShardCount);
    }
    Ok(Shard::new(rng.random_range(0..shard_count)))
}

pub fn all_shards(shard_count: u8) -> impl Iterator<Item = Shard> {
    (0..shard_count).map(Shard::new)
}

/// 全局铭文计数：所有分片中最大的 `latest_rank`。
pub fn inscription_count<'a>(shards: impl IntoIterator<Item = &'a InscriptionShard>) -> u64 {
    shards
        .into_iter()
        .map(InscriptionShard::latest_rank)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_within_range() {
        let mut rng = rand::rng();
        for _ in 0..64 {
            let shard = pick_shard(&mut rng, 4).unwrap();
            assert!(shard.number < 4);
            assert_eq!(shard, Shard::new(shard.number));
        }
        assert!(matches!(
            pick_shard(&mut rng, 0),
            Err(InscriptionError::InvalidShardCount)
        ));
    }

    #[test]
    fn enumerates_every_shard() {
        let shards: Vec<Shard> = all_shards(3).collect();
        assert_eq!(
            shards.iter().map(|s| s.number).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_ne!(shards[0].address, shards[1].address);
    }

    #[test]
    fn counter_takes_highest_interleaved_rank() {
        let shard = |shard_number, count| InscriptionShard {
            key: crate::program::state::key::INSCRIPTION_SHARD,
            bump: 255,
            shard_number,
            count,
        };
        assert_eq!(inscription_count(std::iter::empty()), 0);
        // 分片 31 第 2 次分配 (2*32+31=95) 晚于分片 0 的第 2 次 (64)
        let shards = [shard(0, 2), shard(31, 2), shard(7, 1)];
        assert_eq!(inscription_count(&shards), 95);
        assert_eq!(inscription_count(&shards[..1]), 64);
    }
}
