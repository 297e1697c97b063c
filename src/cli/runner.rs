use anyhow::Result;

use crate::cli::args::{Cli, Command};
use crate::cli::context::init_configs;
use crate::cli::{inscribe, manage};
use crate::config::InscriberConfig;

pub async fn run(cli: Cli, config: InscriberConfig) -> Result<()> {
    crate::monitoring::try_init_prometheus(&config.prometheus)?;

    match cli.command {
        Command::Inscribe(cmd) => inscribe::run(cmd, &config).await?,
        Command::Update(cmd) => manage::update(cmd, &config).await?,
        Command::Close(cmd) => manage::close(cmd, &config).await?,
        Command::Show(cmd) => manage::show(cmd, &config).await?,
        Command::Shards(cmd) => manage::shards(cmd, &config).await?,
        Command::Init(args) => init_configs(args)?,
    }

    Ok(())
}
