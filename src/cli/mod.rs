//! CLI 模块负责解析命令行参数并分发到各子命令处理逻辑。

mod inscribe;
mod manage;
mod progress;
mod runner;

pub mod args;
pub mod context;

pub use runner::run;
