//! 安装状态判定

use super::cache::{InstalledSet, InstalledSetCache};
use crate::catalog::{InstallStatus, PackageRecord};
use crate::package_manager::CommandRunner;
use std::sync::Arc;

/// 状态检查会话，持有本次运行的已安装列表缓存
pub struct StatusClassifier {
    cache: InstalledSetCache,
}

impl StatusClassifier {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            cache: InstalledSetCache::new(runner),
        }
    }

    pub fn cache(&self) -> &InstalledSetCache {
        &self.cache
    }

    /// 判定单个条目并写回 `status` / `installed_version`，从不失败
    pub async fn classify(&self, record: &mut PackageRecord) {
        if record.package_id.is_empty() {
            record.status = InstallStatus::NotInstalled;
            record.installed_version.clear();
            return;
        }

        let set = self.cache.ensure_loaded().await;
        let (status, installed) = status_for(set, &record.package_id, &record.version);
        log::debug!("{} ({}): {} {}", record.label(), record.package_id, status, installed);
        record.status = status;
        record.installed_version = installed;
    }

    /// 按顺序逐个判定
    pub async fn classify_all(&self, records: &mut [PackageRecord]) {
        for record in records.iter_mut() {
            self.classify(record).await;
        }
    }
}

fn status_for(set: &InstalledSet, package_id: &str, declared: &str) -> (InstallStatus, String) {
    if !set.contains(package_id) {
        return (InstallStatus::NotInstalled, String::new());
    }
    let installed = set.installed_version(package_id).unwrap_or_default();
    let status = if needs_update(declared, installed) {
        InstallStatus::UpdateAvailable
    } else {
        InstallStatus::Installed
    };
    (status, installed.to_string())
}

/// 版本比较：两者都非空且字符串不相等即视为有更新，不做语义化版本比较
pub fn needs_update(declared: &str, installed: &str) -> bool {
    !declared.is_empty() && !installed.is_empty() && declared != installed
}
