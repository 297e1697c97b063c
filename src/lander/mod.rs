pub mod error;
mod dispatcher;
mod rpc;
mod sender;

pub use dispatcher::{
    DispatchConfig, DispatchEvent, DispatchResult, Dispatcher, Phase, ProgressSink,
};
pub use error::LanderError;
pub use rpc::RpcSender;
pub use sender::TransactionSender;
