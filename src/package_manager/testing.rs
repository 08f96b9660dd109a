//! 测试用的脚本化执行器：记录调用，按子命令返回预设输出

use super::runner::CommandRunner;
use super::types::ProcessResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct ScriptedRunner {
    list_output: Option<String>,
    list_delay: Duration,
    install_delay: Duration,
    failing: HashSet<String>,
    show_output: Option<String>,
    search_output: Option<String>,
    cancel_after: Option<(usize, CancellationToken)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// `list` 成功并返回给定输出
    pub fn listing(output: &str) -> Self {
        Self {
            list_output: Some(output.to_string()),
            ..Self::default()
        }
    }

    /// `list` 调用失败
    pub fn broken_list() -> Self {
        Self::default()
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn with_install_delay(mut self, delay: Duration) -> Self {
        self.install_delay = delay;
        self
    }

    pub fn fail_install(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn with_show(mut self, output: &str) -> Self {
        self.show_output = Some(output.to_string());
        self
    }

    pub fn with_search(mut self, output: &str) -> Self {
        self.search_output = Some(output.to_string());
        self
    }

    /// 第 n 次 install 调用结束后触发取消
    pub fn cancel_after_installs(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, subcommand: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.first().map(String::as_str) == Some(subcommand))
            .count()
    }

    /// 按顺序列出被安装的包
    pub fn installed_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.first().map(String::as_str) == Some("install"))
            .filter_map(|c| c.get(1).cloned())
            .collect()
    }

    fn reply(output: &Option<String>) -> ProcessResult {
        match output {
            Some(out) => ProcessResult {
                succeeded: true,
                stdout: out.clone(),
                stderr: String::new(),
            },
            None => ProcessResult::failure("scripted failure"),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, args: &[String], _cancel: Option<&CancellationToken>) -> ProcessResult {
        self.calls.lock().unwrap().push(args.to_vec());

        match args.first().map(String::as_str) {
            Some("list") => {
                tokio::time::sleep(self.list_delay).await;
                Self::reply(&self.list_output)
            }
            Some("install") => {
                tokio::time::sleep(self.install_delay).await;
                let id = args.get(1).cloned().unwrap_or_default();
                if let Some((n, token)) = &self.cancel_after {
                    if self.count("install") >= *n {
                        token.cancel();
                    }
                }
                if self.failing.contains(&id) {
                    ProcessResult::failure("installer exited with code 1603")
                } else {
                    ProcessResult {
                        succeeded: true,
                        stdout: format!("Successfully installed {}", id),
                        stderr: String::new(),
                    }
                }
            }
            Some("show") => Self::reply(&self.show_output),
            Some("search") => Self::reply(&self.search_output),
            _ => ProcessResult::failure("unknown subcommand"),
        }
    }
}
