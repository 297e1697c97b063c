use solana_sdk::pubkey::Pubkey;

use crate::batch::InscriptionTarget;
use crate::program::{
    ProgramError, find_associated_inscription_pda, find_inscription_metadata_pda,
    find_mint_inscription_pda,
};

use super::IMAGE_TAG;

/// 一个 mint 对应的全部铭文账户地址。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InscriptionAccounts {
    pub mint: Pubkey,
    pub inscription: Pubkey,
    pub metadata: Pubkey,
    pub image: Pubkey,
}

impl InscriptionAccounts {
    pub fn derive(mint: &Pubkey) -> Self {
        let (inscription, _) = find_mint_inscription_pda(mint);
        let (metadata, _) = find_inscription_metadata_pda(&inscription);
        let (image, _) = find_associated_inscription_pda(IMAGE_TAG, &metadata)
            .unwrap_or_else(|_| (Pubkey::default(), 0));
        Self {
            mint: *mint,
            inscription,
            metadata,
            image,
        }
    }

    /// `None` 指主铭文账户（JSON），其它标签对应关联账户。
    pub fn associated(&self, tag: Option<&str>) -> Result<Pubkey, ProgramError> {
        match tag {
            None => Ok(self.inscription),
            Some(IMAGE_TAG) => Ok(self.image),
            Some(other) => Ok(find_associated_inscription_pda(other, &self.metadata)?.0),
        }
    }

    pub fn target(&self, tag: Option<&str>) -> Result<InscriptionTarget, ProgramError> {
        Ok(InscriptionTarget::new(
            self.associated(tag)?,
            self.metadata,
            tag,
        ))
    }

    pub fn json_target(&self) -> InscriptionTarget {
        InscriptionTarget::new(self.inscription, self.metadata, None)
    }

    pub fn image_target(&self) -> InscriptionTarget {
        InscriptionTarget::new(self.image, self.metadata, Some(IMAGE_TAG))
    }
}
