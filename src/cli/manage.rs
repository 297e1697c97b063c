use anyhow::Result;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::args::{CloseCmd, ShardsCmd, ShowCmd, UpdateCmd};
use crate::cli::context::{build_inscriber, spawn_ctrl_c_cancel};
use crate::cli::inscribe::{parse_mint, print_report, print_signatures, report_failure};
use crate::cli::progress::DispatchProgress;
use crate::config::InscriberConfig;
use crate::inscription::{IMAGE_TAG, InscriptionView};
use crate::payload::{load_image, load_json};

pub async fn update(cmd: UpdateCmd, config: &InscriberConfig) -> Result<()> {
    let mint = parse_mint(&cmd.mint)?;
    let mut payloads: Vec<(Option<&str>, Vec<u8>)> = Vec::new();
    if let Some(raw) = cmd.json.as_deref() {
        payloads.push((None, load_json(raw).await?.0));
    }
    if let Some(raw) = cmd.image.as_deref() {
        payloads.push((Some(IMAGE_TAG), load_image(raw).await?.bytes));
    }

    let cancel = CancellationToken::new();
    spawn_ctrl_c_cancel(cancel.clone());
    let progress = DispatchProgress::spawn();
    let inscriber = build_inscriber(config, cancel, Some(progress.sink()))?;

    let mut outcome = Ok(Vec::new());
    for (tag, bytes) in &payloads {
        match inscriber.update(&mint, *tag, bytes).await {
            Ok(report) => {
                if let Ok(reports) = outcome.as_mut() {
                    reports.push(report);
                }
            }
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }
    drop(inscriber);
    progress.finish().await;

    for report in outcome.map_err(report_failure)? {
        print_report(&[mint], &report);
    }
    Ok(())
}

pub async fn close(cmd: CloseCmd, config: &InscriberConfig) -> Result<()> {
    let mint = parse_mint(&cmd.mint)?;
    let tag = cmd.image.then_some(IMAGE_TAG);
    let inscriber = build_inscriber(config, CancellationToken::new(), None)?;
    let signatures = inscriber.close(&mint, tag).await.map_err(report_failure)?;
    print_signatures("关闭", &signatures);
    Ok(())
}

pub async fn show(cmd: ShowCmd, config: &InscriberConfig) -> Result<()> {
    let mint = parse_mint(&cmd.mint)?;
    let inscriber = build_inscriber(config, CancellationToken::new(), None)?;
    let view = inscriber.fetch(&mint).await?;
    for line in describe(&view) {
        println!("{line}");
    }
    if let Some(json) = &view.json {
        println!("{}", serde_json::to_string_pretty(json)?);
    }
    Ok(())
}

pub async fn shards(cmd: ShardsCmd, config: &InscriberConfig) -> Result<()> {
    let count = cmd.count.unwrap_or(config.inscription.shard_count);
    let inscriber = build_inscriber(config, CancellationToken::new(), None)?;
    let report = inscriber.ensure_shards(count).await.map_err(report_failure)?;
    info!(
        target: "cli",
        existing = report.existing.len(),
        created = report.created.len(),
        inscriptions = report.inscription_count,
        "分片检查完成"
    );
    println!(
        "已存在 {} 个分片，新建 {} 个",
        report.existing.len(),
        report.created.len()
    );
    println!("链上铭文总数: {}", report.inscription_count);
    print_signatures("分片", &report.signatures);
    Ok(())
}

fn describe(view: &InscriptionView) -> Vec<String> {
    let mut lines = vec![
        format!("铭文账户: {}", view.accounts.inscription),
        format!("元数据账户: {}", view.accounts.metadata),
    ];
    if !view.is_inscribed() {
        lines.push("状态: 未铭刻".to_string());
        return lines;
    }
    if let Some(rank) = view.inscription_rank() {
        lines.push(format!("铭文序号: {rank}"));
    }
    if let Some(metadata) = &view.metadata {
        for authority in &metadata.update_authorities {
            lines.push(format!("更新权限: {authority}"));
        }
    }
    let json_len = view.json_bytes.as_ref().map_or(0, Vec::len);
    let json_state = match &view.json {
        Some(Value::Object(map)) => format!("{} 个字段", map.len()),
        Some(_) => "非对象 JSON".to_string(),
        None => "无法解析".to_string(),
    };
    lines.push(format!("JSON: {json_len} 字节，{json_state}"));
    if view.has_image() {
        let len = view.image.as_ref().map_or(0, Vec::len);
        let mime = view.image_format().map_or("-", |format| format.mime());
        lines.push(format!("图片: {len} 字节，{mime} ({})", view.accounts.image));
    } else {
        lines.push("图片: 无".to_string());
    }
    lines.push(format!("租金: {} lamports", view.rent_lamports));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::account::Account;
    use solana_sdk::pubkey::Pubkey;

    use crate::inscription::InscriptionAccounts;

    fn account(data: &[u8]) -> Account {
        Account {
            lamports: 100,
            data: data.to_vec(),
            owner: Pubkey::new_unique(),
            executable: false,
            rent_epoch: 0,
        }
    }

    #[test]
    fn describes_missing_inscription() {
        let view = InscriptionView::from_accounts(
            InscriptionAccounts::derive(&Pubkey::new_unique()),
            None,
            None,
            None,
        );
        let lines = describe(&view);
        assert_eq!(lines.last().map(String::as_str), Some("状态: 未铭刻"));
    }

    #[test]
    fn describes_json_and_image() {
        let view = InscriptionView::from_accounts(
            InscriptionAccounts::derive(&Pubkey::new_unique()),
            Some(account(br#"{"name":"a","symbol":"b"}"#)),
            None,
            Some(account(b"\x89PNG\r\n\x1a\n")),
        );
        let lines = describe(&view);
        assert!(lines.iter().any(|line| line.contains("2 个字段")));
        assert!(lines.iter().any(|line| line.contains("image/png")));
        assert!(lines.iter().any(|line| line == "租金: 200 lamports"));
    }
}
