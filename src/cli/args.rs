use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "inscriber", version, about = "NFT 链上铭文批量写入工具")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 inscriber.toml 或 config/inscriber.toml）"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 为 mint 创建铭文并写入 JSON（可选图片）
    Inscribe(InscribeCmd),
    /// 覆盖已有铭文的 JSON 或图片
    Update(UpdateCmd),
    /// 关闭铭文账户并回收租金
    Close(CloseCmd),
    /// 读取并展示铭文内容
    Show(ShowCmd),
    /// 检查并创建缺失的分片账户
    Shards(ShardsCmd),
    /// 初始化配置模版文件
    Init(InitCmd),
}

#[derive(Args, Debug)]
pub struct InscribeCmd {
    #[arg(long, value_name = "MINT", help = "NFT mint 地址", requires = "json")]
    pub mint: Option<String>,
    #[arg(long, value_name = "PATH|URL", help = "JSON 元数据文件路径或 http(s) 地址")]
    pub json: Option<String>,
    #[arg(long, value_name = "PATH|URL", help = "可选图片文件路径或 http(s) 地址")]
    pub image: Option<String>,
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["mint", "json", "image"],
        help = "批量铭刻清单（TOML，[[inscription]] 数组）"
    )]
    pub manifest: Option<PathBuf>,
    #[arg(long, help = "只生成计划与租金估算，不发送交易")]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("payload").required(true).args(["json", "image"])))]
pub struct UpdateCmd {
    #[arg(long, value_name = "MINT", help = "NFT mint 地址")]
    pub mint: String,
    #[arg(long, value_name = "PATH|URL", help = "新的 JSON 元数据")]
    pub json: Option<String>,
    #[arg(long, value_name = "PATH|URL", help = "新的图片数据")]
    pub image: Option<String>,
}

#[derive(Args, Debug)]
pub struct CloseCmd {
    #[arg(long, value_name = "MINT", help = "NFT mint 地址")]
    pub mint: String,
    #[arg(long, help = "只关闭图片关联铭文")]
    pub image: bool,
}

#[derive(Args, Debug)]
pub struct ShowCmd {
    #[arg(long, value_name = "MINT", help = "NFT mint 地址")]
    pub mint: String,
}

#[derive(Args, Debug)]
pub struct ShardsCmd {
    #[arg(long, value_name = "N", help = "检查的分片数量，默认取配置 inscription.shard_count")]
    pub count: Option<u8>,
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_requires_a_payload() {
        assert!(Cli::try_parse_from(["inscriber", "update", "--mint", "M"]).is_err());
        let cli =
            Cli::try_parse_from(["inscriber", "update", "--mint", "M", "--json", "a.json"]).unwrap();
        assert!(matches!(cli.command, Command::Update(ref cmd) if cmd.json.as_deref() == Some("a.json")));
    }

    #[test]
    fn manifest_conflicts_with_single_mint() {
        assert!(
            Cli::try_parse_from([
                "inscriber",
                "inscribe",
                "--manifest",
                "m.toml",
                "--mint",
                "M",
                "--json",
                "a.json"
            ])
            .is_err()
        );
        let cli = Cli::try_parse_from(["inscriber", "inscribe", "--manifest", "m.toml", "--dry-run"])
            .unwrap();
        assert!(matches!(cli.command, Command::Inscribe(ref cmd) if cmd.dry_run));
    }
}
