//! 铭文流程编排：账户推导、两阶段指令计划、分片维护与链上读回。

mod accounts;
mod error;
mod inscriber;
mod plan;
mod reader;
mod shard;

pub use accounts::InscriptionAccounts;
pub use error::InscriptionError;
pub use inscriber::{InscribeReport, Inscriber};
pub use plan::InscribeRequest;
pub use reader::InscriptionView;

/// 图片关联铭文使用的标签。
pub const IMAGE_TAG: &str = "image";
