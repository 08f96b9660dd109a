//! 外部命令执行（超时 / 取消 / 进程组隔离）

use super::types::ProcessResult;
use crate::error::EngineError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// 单次调用默认超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub const CANCELLED_MESSAGE: &str = "Command cancelled";

/// 执行一次外部工具调用
///
/// 实现方不得返回错误：启动失败、超时、取消都折叠进 `ProcessResult`。
/// 内部不做重试。
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[String], cancel: Option<&CancellationToken>) -> ProcessResult;
}

/// 基于 tokio 子进程的真实执行器
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String], cancel: Option<&CancellationToken>) -> ProcessResult {
        let command_line = format!("{} {}", self.program, args.join(" "));

        if cancel.is_some_and(|c| c.is_cancelled()) {
            log::warn!("命令未启动（已取消）: {}", command_line);
            return ProcessResult::failure(CANCELLED_MESSAGE);
        }

        log::debug!("执行: {}", command_line);

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        isolate_process_group(&mut cmd);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = EngineError::Spawn {
                    program: self.program.clone(),
                    reason: e.to_string(),
                };
                log::error!("{}", err);
                return ProcessResult::failure(err.to_string());
            }
        };
        let pid = child.id();

        // 没有取消令牌时用一个永不触发的占位
        let never = CancellationToken::new();
        let cancel = cancel.unwrap_or(&never);

        tokio::select! {
            output = child.wait_with_output() => match output {
                Ok(out) => ProcessResult {
                    succeeded: out.status.success(),
                    stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                },
                Err(e) => {
                    log::error!("等待 {} 失败: {}", command_line, e);
                    ProcessResult::failure(e.to_string())
                }
            },
            _ = tokio::time::sleep(self.timeout) => {
                log::error!("命令超时（{}s）: {}", self.timeout.as_secs_f32(), command_line);
                kill_process_group(pid);
                ProcessResult::failure(EngineError::Timeout.to_string())
            },
            _ = cancel.cancelled() => {
                log::warn!("命令已取消: {}", command_line);
                kill_process_group(pid);
                ProcessResult::failure(CANCELLED_MESSAGE)
            },
        }
    }
}

/// 子进程放进独立进程组，父进程退出时收到 SIGTERM
#[cfg(unix)]
fn isolate_process_group(cmd: &mut Command) {
    unsafe {
        cmd.pre_exec(|| {
            libc::setpgid(0, 0);
            #[cfg(target_os = "linux")]
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
            Ok(())
        });
    }
}

/// 杀死整个进程组（外部工具可能再派生安装器子进程）
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
}

// 非 unix 平台依赖 kill_on_drop 结束直接子进程
#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
