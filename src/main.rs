use anyhow::Result;
use clap::Parser;

mod batch;
mod cli;
mod config;
mod inscription;
mod instructions;
mod lander;
mod monitoring;
mod payload;
mod program;
mod wallet;

use cli::args::Cli;
use cli::context::{init_tracing, load_configuration};

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone())?;
    init_tracing(&config.global.logging)?;
    cli::run(cli, config).await
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}
