use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::InscribeCmd;
use crate::cli::context::{build_inscriber, spawn_ctrl_c_cancel};
use crate::cli::progress::DispatchProgress;
use crate::config::InscriberConfig;
use crate::inscription::{InscribeReport, InscribeRequest, InscriptionError};
use crate::payload::{PayloadSource, estimate_rent, load_image, load_json};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// 清单中的一条铭刻请求，路径相对于清单所在目录。
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub mint: String,
    pub json: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    inscription: Vec<ManifestEntry>,
}

pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("读取清单 {} 失败", path.display()))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("解析清单 {} 失败", path.display()))?;
    if manifest.inscription.is_empty() {
        bail!("清单 {} 中没有 [[inscription]] 条目", path.display());
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(manifest
        .inscription
        .into_iter()
        .map(|entry| ManifestEntry {
            json: resolve_source(base, &entry.json),
            image: entry.image.as_deref().map(|raw| resolve_source(base, raw)),
            mint: entry.mint,
        })
        .collect())
}

fn resolve_source(base: &Path, raw: &str) -> String {
    match PayloadSource::parse(raw) {
        PayloadSource::File(path) if path.is_relative() => base.join(path).display().to_string(),
        _ => raw.trim().to_string(),
    }
}

fn entries_from_args(cmd: &InscribeCmd) -> Result<Vec<ManifestEntry>> {
    if let Some(path) = &cmd.manifest {
        return load_manifest(path);
    }
    match (&cmd.mint, &cmd.json) {
        (Some(mint), Some(json)) => Ok(vec![ManifestEntry {
            mint: mint.clone(),
            json: json.clone(),
            image: cmd.image.clone(),
        }]),
        _ => Err(anyhow!("需要 --mint 与 --json，或使用 --manifest 指定清单")),
    }
}

pub fn parse_mint(raw: &str) -> Result<Pubkey> {
    Pubkey::from_str(raw.trim()).map_err(|err| anyhow!("无效的 mint 地址 {raw}: {err}"))
}

async fn load_requests(entries: Vec<ManifestEntry>) -> Result<Vec<InscribeRequest>> {
    let mut requests = Vec::with_capacity(entries.len());
    for entry in entries {
        let mint = parse_mint(&entry.mint)?;
        let (json, _) = load_json(&entry.json).await?;
        let image = match entry.image.as_deref() {
            Some(raw) => {
                let image = load_image(raw).await?;
                info!(
                    target: "cli",
                    mint = %mint,
                    format = image.format.mime(),
                    bytes = image.bytes.len(),
                    "已加载图片"
                );
                Some(image.bytes)
            }
            None => None,
        };
        requests.push(InscribeRequest { mint, json, image });
    }
    Ok(requests)
}

pub async fn run(cmd: InscribeCmd, config: &InscriberConfig) -> Result<()> {
    let entries = entries_from_args(&cmd)?;
    let requests = load_requests(entries).await?;
    let mints: Vec<Pubkey> = requests.iter().map(|request| request.mint).collect();

    if cmd.dry_run {
        return dry_run(requests, config).await;
    }

    let cancel = CancellationToken::new();
    spawn_ctrl_c_cancel(cancel.clone());
    let progress = DispatchProgress::spawn();
    let inscriber = build_inscriber(config, cancel, Some(progress.sink()))?;

    let outcome = inscriber.inscribe(requests).await;
    drop(inscriber);
    let summary = progress.finish().await;
    info!(
        target: "cli",
        confirmed = summary.confirmed,
        failures = summary.failures,
        rounds = summary.rounds,
        "分发结束"
    );

    match outcome {
        Ok(report) => {
            print_report(&mints, &report);
            Ok(())
        }
        Err(err) => Err(report_failure(err)),
    }
}

async fn dry_run(requests: Vec<InscribeRequest>, config: &InscriberConfig) -> Result<()> {
    let inscriber = build_inscriber(config, CancellationToken::new(), None)?;
    let (plan, shards) = inscriber.plan(requests)?;
    let (setup_txs, write_txs) = inscriber.transaction_counts(&plan)?;
    let rent = estimate_rent(inscriber.rpc(), &plan.target_sizes).await?;

    println!("付款人: {}", inscriber.identity().pubkey);
    for shard in &shards {
        println!("分片: #{} {}", shard.number, shard.address);
    }
    println!(
        "准备阶段: {} 条指令 / {} 笔交易",
        plan.setup.len(),
        setup_txs
    );
    println!(
        "写入阶段: {} 条指令 / {} 笔交易",
        plan.writes.len(),
        write_txs
    );
    println!("写入字节: {}", plan.total_bytes());
    println!(
        "预计租金: {} lamports（约 {:.6} SOL）",
        rent,
        rent as f64 / LAMPORTS_PER_SOL
    );
    Ok(())
}

pub fn print_report(mints: &[Pubkey], report: &InscribeReport) {
    for mint in mints {
        println!("已铭刻 {mint}");
    }
    print_signatures("分片", &report.shard_signatures);
    print_signatures("准备", &report.setup_signatures);
    print_signatures("写入", &report.write_signatures);
    println!("共 {} 笔交易", report.transaction_count());
}

pub fn print_signatures(label: &str, signatures: &[solana_sdk::signature::Signature]) {
    for signature in signatures {
        println!("{label}\t{signature}");
    }
}

/// 阶段失败时列出未确认交易，便于重新执行后核对。
pub fn report_failure(err: InscriptionError) -> anyhow::Error {
    if let InscriptionError::Phase {
        phase,
        confirmed,
        unconfirmed,
        ..
    } = &err
    {
        print_signatures("已确认", confirmed);
        for tx in unconfirmed {
            warn!(
                target: "cli",
                phase = %phase,
                signature = %tx.signature(),
                instructions = tx.instruction_count,
                "交易未确认"
            );
        }
    }
    anyhow!(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn manifest_paths_resolve_against_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.toml");
        fs::write(
            &path,
            r#"
[[inscription]]
mint = "So11111111111111111111111111111111111111112"
json = "meta/1.json"
image = "https://arweave.net/abc"

[[inscription]]
mint = "So11111111111111111111111111111111111111112"
json = "/abs/2.json"
"#,
        )
        .unwrap();

        let entries = load_manifest(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            PathBuf::from(&entries[0].json),
            dir.path().join("meta/1.json")
        );
        assert_eq!(entries[0].image.as_deref(), Some("https://arweave.net/abc"));
        assert_eq!(entries[1].json, "/abs/2.json");
        assert!(entries[1].image.is_none());
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        fs::write(&path, "").unwrap();
        assert!(load_manifest(&path).is_err());
    }

    #[test]
    fn single_mint_requires_json() {
        let cmd = InscribeCmd {
            mint: Some("M".to_string()),
            json: None,
            image: None,
            manifest: None,
            dry_run: false,
        };
        assert!(entries_from_args(&cmd).is_err());
    }

    #[tokio::test]
    async fn load_requests_rejects_bad_mint() {
        let entries = vec![ManifestEntry {
            mint: "not-a-key".to_string(),
            json: "missing.json".to_string(),
            image: None,
        }];
        let err = load_requests(entries).await.unwrap_err();
        assert!(err.to_string().contains("not-a-key"));
    }
}
