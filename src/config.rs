use crate::error::{EngineError, Result};
use crate::package_manager::types::deserialize_scope;
use crate::package_manager::Scope;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 外部包管理工具的可执行文件
    pub tool_path: String,
    /// 单次命令超时（秒）
    pub timeout_secs: u64,
    /// 默认安装范围，写成 `scope = ""` 表示不传 `--scope`
    #[serde(deserialize_with = "deserialize_scope")]
    pub scope: Option<Scope>,
    /// 软件目录 JSON
    pub catalog_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool_path: "winget".to_string(),
            timeout_secs: 300,
            scope: Some(Scope::User),
            catalog_path: config_dir().join("software_list.json"),
        }
    }
}

fn config_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/lian-setup")
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        let config_path = config_dir().join("config.toml");

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tool_path.trim().is_empty() {
            return Err(EngineError::Config("tool_path 不能为空".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(EngineError::Config("timeout_secs 必须大于 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
