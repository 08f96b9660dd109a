//! 已安装列表缓存
//!
//! 会话内只调用一次外部工具的 `list`，之后所有查询都读同一份不可变快照。
//! 并发的首次访问在 `OnceCell` 上汇合，只产生一次进程调用。
//! 调用失败时缓存以空集合完成，不重试；快照在会话内不会刷新。

use crate::package_manager::parser::{parse_listing_lines, version_token};
use crate::package_manager::CommandRunner;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// `list` 输出的行集合（大小写不敏感去重，保留原始顺序）
#[derive(Debug, Default)]
pub struct InstalledSet {
    lines: Vec<String>,
    lowered: Vec<String>,
}

impl InstalledSet {
    pub fn from_output(output: &str) -> Self {
        let mut seen = HashSet::new();
        let mut set = Self::default();
        for line in parse_listing_lines(output) {
            let lower = line.to_lowercase();
            if seen.insert(lower.clone()) {
                set.lines.push(line);
                set.lowered.push(lower);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 第一条包含该标识的行（大小写不敏感的子串匹配，不做字段解析）
    pub fn find(&self, package_id: &str) -> Option<&str> {
        if package_id.is_empty() {
            return None;
        }
        let needle = package_id.to_lowercase();
        self.lowered
            .iter()
            .position(|line| line.contains(&needle))
            .map(|i| self.lines[i].as_str())
    }

    pub fn contains(&self, package_id: &str) -> bool {
        self.find(package_id).is_some()
    }

    pub fn installed_version(&self, package_id: &str) -> Option<&str> {
        self.find(package_id).and_then(version_token)
    }
}

pub struct InstalledSetCache {
    runner: Arc<dyn CommandRunner>,
    set: OnceCell<InstalledSet>,
}

impl InstalledSetCache {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            set: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.set.initialized()
    }

    /// 确保缓存已建立并返回快照
    pub async fn ensure_loaded(&self) -> &InstalledSet {
        self.set
            .get_or_init(|| async {
                let result = self.runner.run(&["list".to_string()], None).await;
                if !result.succeeded {
                    log::error!("缓存已安装列表失败: {}", result.stderr.trim());
                    return InstalledSet::default();
                }
                let set = InstalledSet::from_output(&result.stdout);
                log::info!("已缓存 {} 条已安装记录", set.len());
                set
            })
            .await
    }
}
