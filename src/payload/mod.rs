//! 铭文数据来源：本地文件或 HTTP(S) 地址。

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("读取文件 {path} 失败: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("下载 {url} 失败: {source}")]
    Http { url: Url, source: reqwest::Error },
    #[error("{source_name} 不是合法的 JSON: {source}")]
    InvalidJson {
        source_name: String,
        source: serde_json::Error,
    },
    #[error("{0} 内容为空")]
    Empty(String),
    #[error("查询租金失败: {0}")]
    Rpc(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    File(PathBuf),
    Remote(Url),
}

impl PayloadSource {
    /// `http://` 与 `https://` 视为远程地址，其余一律当作本地路径。
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::File(PathBuf::from(trimmed)),
        }
    }

    pub async fn read(&self) -> Result<Vec<u8>, PayloadError> {
        let bytes = match self {
            Self::File(path) => tokio::fs::read(path)
                .await
                .map_err(|source| PayloadError::Io {
                    path: path.clone(),
                    source,
                })?,
            Self::Remote(url) => fetch_remote(url).await?,
        };
        debug!(
            target: "payload",
            source = %self,
            bytes = bytes.len(),
            "payload loaded"
        );
        Ok(bytes)
    }
}

impl fmt::Display for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

async fn fetch_remote(url: &Url) -> Result<Vec<u8>, PayloadError> {
    let http_error = |source| PayloadError::Http {
        url: url.clone(),
        source,
    };
    let response = reqwest::get(url.clone())
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(http_error)?;
    let bytes = response.bytes().await.map_err(http_error)?;
    Ok(bytes.to_vec())
}

/// 读取并校验 JSON，返回紧凑序列化后的字节与解析结果。
pub async fn load_json(raw: &str) -> Result<(Vec<u8>, Value), PayloadError> {
    let source = PayloadSource::parse(raw);
    let bytes = source.read().await?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|err| PayloadError::InvalidJson {
            source_name: source.to_string(),
            source: err,
        })?;
    let compact = serde_json::to_vec(&value).map_err(|err| PayloadError::InvalidJson {
        source_name: source.to_string(),
        source: err,
    })?;
    Ok((compact, value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Unknown,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes {
            [0x89, b'P', b'N', b'G', ..] => Self::Png,
            [0xFF, 0xD8, 0xFF, ..] => Self::Jpeg,
            [b'G', b'I', b'F', b'8', ..] => Self::Gif,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Self::Webp,
            _ => Self::Unknown,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Unknown => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

pub async fn load_image(raw: &str) -> Result<ImagePayload, PayloadError> {
    let source = PayloadSource::parse(raw);
    let bytes = source.read().await?;
    if bytes.is_empty() {
        return Err(PayloadError::Empty(source.to_string()));
    }
    let format = ImageFormat::sniff(&bytes);
    Ok(ImagePayload { bytes, format })
}

/// 链上读回的 JSON 可能带有尾部零填充或非法 UTF-8，解码失败时返回 `None`。
pub fn decode_json(bytes: &[u8]) -> Option<Value> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        if let Ok(value) = serde_json::from_str(text) {
            return Some(value);
        }
    }

    let end = bytes
        .iter()
        .rposition(|byte| *byte != 0)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let text = String::from_utf8_lossy(&bytes[..end]);
    serde_json::from_str(text.trim()).ok()
}

/// 所有目标尺寸的免租金额总和（lamports）。
pub async fn estimate_rent(rpc: &RpcClient, sizes: &[usize]) -> Result<u64, PayloadError> {
    let mut total = 0u64;
    for size in sizes {
        let lamports = rpc.get_minimum_balance_for_rent_exemption(*size).await?;
        total = total.saturating_add(lamports);
    }
    Ok(total)
}
