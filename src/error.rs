//! 引擎错误类型

use thiserror::Error;

/// 安装/状态引擎的错误
///
/// 进程启动失败、超时、非零退出和解析失败都在发生处被记录并降级为本地失败值，
/// 只有 `Cancelled` 会从批量安装中传播给调用方。
#[derive(Error, Debug)]
pub enum EngineError {
    /// 子进程无法启动
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// 超出单次调用的时间预算
    #[error("Command timeout")]
    Timeout,

    /// 调用方请求中止，`attempted` 为取消前已尝试的安装数
    #[error("cancelled after {attempted} item(s)")]
    Cancelled { attempted: usize },

    /// 结构化输出（show --json）与预期格式不符
    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled { .. })
    }
}
