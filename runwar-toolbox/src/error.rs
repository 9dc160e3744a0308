//! 统一错误类型定义

use serde::Serialize;
use thiserror::Error;

/// 工具箱错误类型
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ToolboxError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 网络错误
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 页面或响应解析错误
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// 工具箱 Result 类型别名
pub type ToolboxResult<T> = std::result::Result<T, ToolboxError>;

/// Errors surfaced by a [`ProbeTransport`](crate::ProbeTransport).
///
/// Messages are kept short so they can be shown in a report column.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum TransportError {
    /// The round-trip did not finish within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection (or proxy handshake) could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Anything else: bad proxy URL, body read failure, ...
    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for ToolboxError {
    fn from(err: TransportError) -> Self {
        Self::NetworkError(err.to_string())
    }
}
