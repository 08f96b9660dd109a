//! PackageManager 相关数据类型定义

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 单次命令调用结果
///
/// `succeeded` 当且仅当进程以退出码 0 结束。超时、取消、启动失败时
/// `stdout` 为空，`stderr` 携带原因。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: reason.into(),
        }
    }
}

/// 批量安装结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    /// 失败的包标识，保持遇到的顺序
    pub failed: Vec<String>,
}

impl InstallOutcome {
    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// 进度采样：(总数, 已完成数, 当前标签)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSample {
    pub total: usize,
    pub completed: usize,
    pub label: String,
}

impl ProgressSample {
    pub fn new(total: usize, completed: usize, label: impl Into<String>) -> Self {
        Self {
            total,
            completed,
            label: label.into(),
        }
    }

    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// 安装范围，原样透传给外部工具的 `--scope`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Scope {
    User,
    System,
}

impl Scope {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Scope::User => "User",
            Scope::System => "System",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// 读取可选的安装范围：缺失、`null` 与空字符串都表示不传 `--scope`
///
/// 取值不区分大小写，未知取值仍然报错。
pub fn deserialize_scope<'de, D>(deserializer: D) -> Result<Option<Scope>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("user") => Ok(Some(Scope::User)),
        Some(s) if s.eq_ignore_ascii_case("system") => Ok(Some(Scope::System)),
        Some(s) => Err(serde::de::Error::unknown_variant(s, &["User", "System"])),
    }
}

/// `show --json` 中取出的包元数据，缺失字段保持 None
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub publisher: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

impl PackageInfo {
    pub fn is_empty(&self) -> bool {
        self.publisher.is_none()
            && self.version.is_none()
            && self.description.is_none()
            && self.homepage.is_none()
    }

    /// 以 (键, 值) 形式列出已存在的字段
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Publisher", &self.publisher),
            ("Version", &self.version),
            ("Description", &self.description),
            ("Homepage", &self.homepage),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
        .collect()
    }
}
