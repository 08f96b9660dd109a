//! 包管理器模块 — 对 winget 风格命令行工具的封装

pub mod parser;
pub mod runner;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

// 重新导出常用类型和函数
pub use runner::{CommandRunner, ProcessRunner, DEFAULT_TIMEOUT};
pub use types::{InstallOutcome, PackageInfo, ProcessResult, ProgressSample, Scope};

use crate::config::Config;
use crate::error::{EngineError, Result};
use parser::{parse_installed_list, parse_show_json};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct PackageManager {
    runner: Arc<dyn CommandRunner>,
}

impl PackageManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub fn from_config(config: &Config) -> Self {
        let runner = ProcessRunner::new(&config.tool_path).with_timeout(config.timeout());
        Self::new(Arc::new(runner))
    }

    /// 共享底层执行器（状态缓存也经由它调用 `list`）
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }

    // ===== 查询 =====

    /// 在源中搜索包 (search <id>)
    pub async fn search(&self, package_id: &str) -> bool {
        let result = self.runner.run(&args(&["search", package_id]), None).await;
        result.succeeded && result.stdout.contains(package_id)
    }

    /// 获取包元数据 (show <id> --json)
    pub async fn show(&self, package_id: &str) -> PackageInfo {
        let result = self
            .runner
            .run(&args(&["show", package_id, "--json"]), None)
            .await;
        if !result.succeeded {
            log::error!("获取包信息失败 {}: {}", package_id, result.stderr.trim());
            return PackageInfo::default();
        }
        match parse_show_json(&result.stdout) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("解析 {} 的 JSON 失败: {}", package_id, e);
                PackageInfo::default()
            }
        }
    }

    /// 已安装包列表 (list)
    pub async fn list_installed(&self) -> Vec<String> {
        let result = self.runner.run(&args(&["list"]), None).await;
        if !result.succeeded {
            log::error!("获取已安装包列表失败: {}", result.stderr.trim());
            return Vec::new();
        }
        parse_installed_list(&result.stdout)
    }

    // ===== 安装 =====

    /// 安装单个包，静默并接受全部协议；失败只记录日志并返回 false
    pub async fn install(
        &self,
        package_id: &str,
        scope: Option<Scope>,
        cancel: Option<&CancellationToken>,
    ) -> bool {
        let result = self.runner.run(&install_args(package_id, scope), cancel).await;
        if result.succeeded {
            log::info!("✓ 安装成功: {}", package_id);
        } else {
            log::error!("✗ 安装失败 {}: {}", package_id, result.stderr.trim());
        }
        result.succeeded
    }

    /// 依次安装多个包
    ///
    /// 严格串行：安装操作会争用包管理器的全局锁。每一项开始前检查取消令牌，
    /// 已在运行的安装不会被打断，只跳过后续项。进度在每项开始前发送，
    /// `completed` 是即将开始的下标。
    ///
    /// 被取消时返回 `EngineError::Cancelled`，而不是部分结果。
    pub async fn install_many(
        &self,
        package_ids: &[String],
        scope: Option<Scope>,
        progress: Option<&mpsc::UnboundedSender<ProgressSample>>,
        cancel: &CancellationToken,
    ) -> Result<InstallOutcome> {
        let total = package_ids.len();
        let mut outcome = InstallOutcome::default();

        for (i, package_id) in package_ids.iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("安装已取消：{}/{} 已处理", i, total);
                return Err(EngineError::Cancelled { attempted: i });
            }

            if let Some(tx) = progress {
                let _ = tx.send(ProgressSample::new(total, i, package_id.as_str()));
            }

            if self.install(package_id, scope, None).await {
                outcome.success_count += 1;
            } else {
                outcome.failure_count += 1;
                outcome.failed.push(package_id.clone());
            }
        }

        log::info!(
            "批量安装完成: {} 成功, {} 失败",
            outcome.success_count,
            outcome.failure_count
        );
        Ok(outcome)
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// install 子命令参数
pub fn install_args(package_id: &str, scope: Option<Scope>) -> Vec<String> {
    let mut cmd = args(&[
        "install",
        package_id,
        "--silent",
        "--accept-package-agreements",
        "--accept-source-agreements",
    ]);
    if let Some(scope) = scope {
        cmd.push("--scope".to_string());
        cmd.push(scope.as_arg().to_string());
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;
    use std::time::Duration;

    fn manager(runner: ScriptedRunner) -> (PackageManager, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (PackageManager::new(runner.clone()), runner)
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn install_args_carry_silent_flags_and_scope() {
        assert_eq!(
            install_args("Git.Git", None),
            ids(&[
                "install",
                "Git.Git",
                "--silent",
                "--accept-package-agreements",
                "--accept-source-agreements"
            ])
        );
        let scoped = install_args("Git.Git", Some(Scope::System));
        assert_eq!(&scoped[scoped.len() - 2..], &ids(&["--scope", "System"])[..]);
    }

    #[tokio::test]
    async fn single_install_reports_boolean() {
        let (pm, runner) = manager(ScriptedRunner::listing("").fail_install("Bad.Pkg"));
        assert!(pm.install("Good.Pkg", Some(Scope::User), None).await);
        assert!(!pm.install("Bad.Pkg", None, None).await);
        assert_eq!(runner.installed_ids(), ids(&["Good.Pkg", "Bad.Pkg"]));
    }

    #[tokio::test]
    async fn batch_aggregates_in_order() {
        let (pm, runner) = manager(
            ScriptedRunner::listing("")
                .fail_install("B.B")
                .fail_install("D.D"),
        );
        let batch = ids(&["A.A", "B.B", "C.C", "D.D"]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = pm
            .install_many(&batch, None, Some(&tx), &CancellationToken::new())
            .await
            .expect("not cancelled");

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.failure_count, 2);
        assert_eq!(outcome.attempted(), batch.len());
        assert_eq!(outcome.failed, ids(&["B.B", "D.D"]));
        assert_eq!(runner.installed_ids(), batch);

        let mut samples = Vec::new();
        while let Ok(sample) = rx.try_recv() {
            samples.push(sample);
        }
        assert_eq!(
            samples,
            vec![
                ProgressSample::new(4, 0, "A.A"),
                ProgressSample::new(4, 1, "B.B"),
                ProgressSample::new(4, 2, "C.C"),
                ProgressSample::new(4, 3, "D.D"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_batch_is_empty_outcome() {
        let (pm, runner) = manager(ScriptedRunner::listing(""));
        let outcome = pm
            .install_many(&[], None, None, &CancellationToken::new())
            .await
            .expect("not cancelled");
        assert_eq!(outcome, InstallOutcome::default());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_first_item_installs_nothing() {
        let (pm, runner) = manager(ScriptedRunner::listing(""));
        let token = CancellationToken::new();
        token.cancel();

        let err = pm
            .install_many(&ids(&["A.A", "B.B"]), None, None, &token)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, EngineError::Cancelled { attempted: 0 }));
        assert_eq!(runner.count("install"), 0);
    }

    #[tokio::test]
    async fn cancellation_observed_at_item_boundary() {
        let token = CancellationToken::new();
        let (pm, runner) =
            manager(ScriptedRunner::listing("").cancel_after_installs(2, token.clone()));

        let err = pm
            .install_many(&ids(&["A.A", "B.B", "C.C", "D.D"]), None, None, &token)
            .await
            .expect_err("cancelled");

        assert!(matches!(err, EngineError::Cancelled { attempted: 2 }));
        assert_eq!(runner.installed_ids(), ids(&["A.A", "B.B"]));
    }

    #[tokio::test]
    async fn cancel_during_slow_install_lets_it_finish() {
        let token = CancellationToken::new();
        let (pm, runner) = manager(
            ScriptedRunner::listing("").with_install_delay(Duration::from_millis(100)),
        );

        let interrupt = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            interrupt.cancel();
        });

        let err = pm
            .install_many(&ids(&["A.A", "B.B", "C.C"]), None, None, &token)
            .await
            .expect_err("cancelled");

        assert!(matches!(err, EngineError::Cancelled { attempted: 1 }));
        assert_eq!(runner.installed_ids(), ids(&["A.A"]));
    }

    #[tokio::test]
    async fn search_requires_id_in_output() {
        let (pm, _) = manager(ScriptedRunner::listing("").with_search("Git  Git.Git  2.42.0"));
        assert!(pm.search("Git.Git").await);
        assert!(!pm.search("Mozilla.Firefox").await);
    }

    #[tokio::test]
    async fn show_parses_metadata_and_degrades_on_bad_json() {
        let (pm, _) = manager(
            ScriptedRunner::listing("")
                .with_show(
                    r#"{"Data": {"Publisher": "VideoLAN", "Homepage": "https://videolan.org"}}"#,
                ),
        );
        let info = pm.show("VideoLAN.VLC").await;
        assert_eq!(info.publisher.as_deref(), Some("VideoLAN"));
        assert!(info.version.is_none());

        let (pm, _) = manager(ScriptedRunner::listing("").with_show("not json"));
        assert!(pm.show("VideoLAN.VLC").await.is_empty());

        let (pm, _) = manager(ScriptedRunner::listing(""));
        assert!(pm.show("VideoLAN.VLC").await.is_empty());
    }

    #[tokio::test]
    async fn list_installed_failure_is_empty() {
        let (pm, _) = manager(ScriptedRunner::broken_list());
        assert!(pm.list_installed().await.is_empty());

        let (pm, _) = manager(ScriptedRunner::listing(
            "Name Id Version\n----\nGit Git.Git 2.42.0\n",
        ));
        assert_eq!(pm.list_installed().await, ids(&["Git Git.Git 2.42.0"]));
    }
}
