//! 软件目录：条目定义与 JSON 读写

use crate::error::{EngineError, Result};
use crate::package_manager::types::deserialize_scope;
use crate::package_manager::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// 安装状态，由状态检查写入
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstallStatus {
    #[default]
    NotInstalled,
    Installed,
    UpdateAvailable,
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallStatus::NotInstalled => "NotInstalled",
            InstallStatus::Installed => "Installed",
            InstallStatus::UpdateAvailable => "UpdateAvailable",
        };
        f.write_str(s)
    }
}

/// 目录中的一个软件条目
///
/// 生命周期归目录所有；状态检查只改写 `status` 与 `installed_version`。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageRecord {
    #[serde(alias = "id")]
    pub id: String,
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "publisher")]
    pub publisher: String,
    /// 目录声明的版本
    #[serde(alias = "version")]
    pub version: String,
    #[serde(alias = "category")]
    pub category: String,
    #[serde(alias = "description")]
    pub description: String,
    /// 估计下载大小（字节）
    #[serde(alias = "size")]
    pub size: u64,
    /// 外部工具使用的包标识，如 `Microsoft.PowerToys`
    #[serde(rename = "WingetId", alias = "wingetId")]
    pub package_id: String,
    /// 空字符串表示不传 `--scope`
    #[serde(alias = "scope", deserialize_with = "deserialize_scope")]
    pub scope: Option<Scope>,
    #[serde(alias = "isSelected")]
    pub is_selected: bool,
    #[serde(skip)]
    pub status: InstallStatus,
    #[serde(skip)]
    pub installed_version: String,
}

impl PackageRecord {
    pub fn new(package_id: &str, version: &str) -> Self {
        Self {
            id: package_id.to_string(),
            name: package_id.to_string(),
            version: version.to_string(),
            package_id: package_id.to_string(),
            ..Self::default()
        }
    }

    /// 日志与进度使用的显示名
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.package_id
        } else {
            &self.name
        }
    }
}

/// 读取目录；文件不存在时写出并返回内置默认目录
pub fn load(path: &Path) -> Result<Vec<PackageRecord>> {
    if !path.exists() {
        log::warn!("未找到软件目录 {}，使用默认目录", path.display());
        let records = default_catalog();
        if let Err(e) = save(path, &records) {
            log::warn!("写出默认目录失败: {}", e);
        }
        return Ok(records);
    }

    let content = fs::read_to_string(path)?;
    let records: Vec<PackageRecord> = serde_json::from_str(&content)
        .map_err(|e| EngineError::Catalog(format!("{}: {}", path.display(), e)))?;
    for record in records.iter().filter(|r| r.package_id.is_empty()) {
        log::warn!("条目 {} 缺少 WingetId，将跳过状态检查与安装", record.label());
    }
    log::info!("已加载 {} 个软件条目", records.len());
    Ok(records)
}

pub fn save(path: &Path, records: &[PackageRecord]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

/// 被勾选安装的条目
pub fn selected(records: &[PackageRecord]) -> Vec<&PackageRecord> {
    records.iter().filter(|r| r.is_selected).collect()
}

fn default_catalog() -> Vec<PackageRecord> {
    const MIB: u64 = 1024 * 1024;
    let entries: [(&str, &str, &str, &str, &str, u64, &str); 10] = [
        (
            "Visual Studio Code",
            "Microsoft",
            "1.84.0",
            "Development",
            "Code editor",
            100 * MIB,
            "Microsoft.VisualStudioCode",
        ),
        (
            "Git",
            "The Git Development Community",
            "2.42.0",
            "Development",
            "Version control system",
            60 * MIB,
            "Git.Git",
        ),
        (
            ".NET SDK",
            "Microsoft",
            "8.0",
            "Development",
            ".NET development framework",
            600 * MIB,
            "Microsoft.DotNet.SDK.8",
        ),
        (
            "NodeJS",
            "OpenJS Foundation",
            "20.0.0",
            "Development",
            "JavaScript runtime",
            50 * MIB,
            "OpenJS.NodeJS",
        ),
        (
            "Python",
            "Python Software Foundation",
            "3.11.0",
            "Development",
            "Python programming language",
            100 * MIB,
            "Python.Python.3.11",
        ),
        (
            "7-Zip",
            "Igor Pavlov",
            "23.0",
            "Utilities",
            "Archive utility",
            3 * MIB / 2,
            "7zip.7zip",
        ),
        (
            "VLC Media Player",
            "VideoLAN",
            "3.0.0",
            "Media",
            "Media player",
            40 * MIB,
            "VideoLAN.VLC",
        ),
        (
            "Notepad++",
            "Don Ho",
            "8.5.0",
            "Development",
            "Text editor",
            7 * MIB,
            "Notepad++.Notepad++",
        ),
        (
            "Google Chrome",
            "Google",
            "117.0.0",
            "Browsers",
            "Web browser",
            150 * MIB,
            "Google.Chrome",
        ),
        (
            "Mozilla Firefox",
            "Mozilla",
            "117.0.0",
            "Browsers",
            "Web browser",
            80 * MIB,
            "Mozilla.Firefox",
        ),
    ];

    entries
        .iter()
        .enumerate()
        .map(
            |(i, (name, publisher, version, category, description, size, package_id))| {
                PackageRecord {
                    id: (i + 1).to_string(),
                    name: name.to_string(),
                    publisher: publisher.to_string(),
                    version: version.to_string(),
                    category: category.to_string(),
                    description: description.to_string(),
                    size: *size,
                    package_id: package_id.to_string(),
                    scope: Some(Scope::User),
                    ..PackageRecord::default()
                }
            },
        )
        .collect()
}
