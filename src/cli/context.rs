use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use solana_client::nonblocking::rpc_client::RpcClient;
use time::{UtcOffset, macros::format_description};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{
    ConfigError, DispatchSettings, GlobalConfig, InscriberConfig, LoggingConfig, load_config,
};
use crate::inscription::Inscriber;
use crate::lander::{DispatchConfig, Dispatcher, ProgressSink, RpcSender};
use crate::wallet::Identity;

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// 初始化 tracing，兼顾 JSON 与文本输出模式。
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.profile.is_lean() {
        const QUIET_TARGETS: &[(&str, &str)] = &[
            ("hyper", "warn"),
            ("hyper_util::client::legacy", "warn"),
            ("reqwest", "info"),
            ("solana_rpc_client", "info"),
            ("batch", "info"),
        ];
        for (module, level) in QUIET_TARGETS {
            if !config.level.contains(module) {
                if let Ok(directive) = format!("{module}={level}").parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }
    }

    if config.profile.is_verbose() {
        const VERBOSE_TARGETS: &[(&str, &str)] = &[
            ("batch::split", "debug"),
            ("batch::write", "debug"),
            ("lander::dispatch", "debug"),
            ("lander::rpc", "debug"),
            ("inscription::plan", "debug"),
        ];
        for (module, level) in VERBOSE_TARGETS {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::from_hms(config.timezone_offset_hours, 0, 0).map_err(|err| {
        anyhow!(
            "invalid logging timezone offset {}: {err}",
            config.timezone_offset_hours
        )
    })?;
    let offset_timer = OffsetTime::new(offset, time_format);

    let base = fmt()
        .with_timer(offset_timer)
        .with_writer(std::io::stderr)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true)
        .with_level(true);

    if config.json {
        base.json()
            .with_current_span(false)
            .with_span_list(false)
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    } else {
        base.with_env_filter(filter)
            .event_format(fmt::format().compact())
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    }
    Ok(())
}

/// 加载主配置；用于 `inscriber --config` 的入口。
pub fn load_configuration(path: Option<PathBuf>) -> Result<InscriberConfig, ConfigError> {
    load_config(path)
}

pub fn resolve_rpc_client(global: &GlobalConfig, dispatch: &DispatchSettings) -> Arc<RpcClient> {
    let url = global.primary_rpc_url().unwrap_or_else(|| {
        warn!(target: "cli", "未配置 RPC 地址，回退到 {DEFAULT_RPC_URL}");
        DEFAULT_RPC_URL
    });
    if global.rpc_urls().len() > 1 {
        info!(
            target: "cli",
            rpc = url,
            configured = global.rpc_urls().len(),
            "使用列表中的第一个 RPC 地址"
        );
    }
    Arc::new(RpcClient::new_with_commitment(
        url.to_string(),
        dispatch.commitment_config(),
    ))
}

/// 组装 RPC、身份与分发器。
pub fn build_inscriber(
    config: &InscriberConfig,
    cancel: CancellationToken,
    events: Option<ProgressSink>,
) -> Result<Inscriber<RpcSender>> {
    let rpc = resolve_rpc_client(&config.global, &config.dispatch);
    let identity = Identity::from_wallet(&config.global.wallet).map_err(|err| anyhow!(err))?;
    let sender = Arc::new(RpcSender::new(rpc.clone(), &config.dispatch));

    let mut dispatcher = Dispatcher::new(sender, DispatchConfig::from_settings(&config.dispatch))
        .with_cancellation(cancel);
    if let Some(events) = events {
        dispatcher = dispatcher.with_events(events);
    }

    info!(
        target: "cli",
        payer = %identity.pubkey,
        concurrency = dispatcher.config().concurrency,
        max_retries = dispatcher.config().max_retries,
        commitment = %config.dispatch.commitment,
        "inscriber ready"
    );

    Ok(Inscriber::new(
        rpc,
        identity,
        dispatcher,
        config.batch.clone(),
        config.inscription.clone(),
    ))
}

/// Ctrl+C 触发取消：已在途的交易继续等待确认，不再发起新的提交。
pub fn spawn_ctrl_c_cancel(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(target: "cli", "收到终止信号，停止提交新的交易…");
            cancel.cancel();
        }
    });
}

pub fn init_configs(args: crate::cli::args::InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(&output_dir)?;

    let templates: [(&str, &str); 1] = [(
        "inscriber.toml",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/inscriber.toml")),
    )];

    for (filename, contents) in templates {
        let target_path = output_dir.join(filename);
        if target_path.exists() && !args.force {
            println!(
                "跳过 {}（文件已存在，如需覆盖请加 --force）",
                target_path.display()
            );
            continue;
        }

        fs::write(&target_path, contents)?;
        println!("已写入 {}", target_path.display());
    }

    Ok(())
}
