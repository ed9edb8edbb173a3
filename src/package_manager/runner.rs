//! winget 进程执行：启动、超时/取消、输出捕获

use super::types::{combine_streams, Invocation};
use crate::error::{Result, UpdError};
use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BINARY: &str = "winget";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// 外部包管理工具的执行接口
pub trait ToolRunner: Send + Sync {
    /// 工具名称（用于错误信息）
    fn name(&self) -> &str;

    /// 轻量探测：工具能否被启动
    fn is_installed(&self) -> impl Future<Output = bool> + Send;

    /// 执行 `<command> <options>`，在超时或取消前读完全部输出
    fn run(
        &self,
        command: &str,
        options: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Invocation>> + Send;
}

/// 以子进程方式驱动 winget
#[derive(Debug, Clone)]
pub struct WinGet {
    binary: String,
    probe_timeout: Duration,
}

impl Default for WinGet {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl WinGet {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }
}

enum Outcome {
    Finished(std::io::Result<(Vec<u8>, Vec<u8>, ExitStatus)>),
    TimedOut,
    Cancelled,
}

impl ToolRunner for WinGet {
    fn name(&self) -> &str {
        &self.binary
    }

    async fn is_installed(&self) -> bool {
        probe(&self.binary, self.probe_timeout).await
    }

    async fn run(
        &self,
        command: &str,
        options: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Invocation> {
        if cancel.is_cancelled() {
            return Err(UpdError::Cancelled);
        }

        let args: Vec<&str> = command
            .split_whitespace()
            .chain(options.split_whitespace())
            .collect();
        if args.is_empty() {
            return Err(UpdError::InvalidInput("winget 命令不能为空".to_string()));
        }
        let call = format!("{} {}", self.binary, args.join(" "));

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                // 独立进程组，超时时可以连同安装程序一起结束
                libc::setpgid(0, 0);
                #[cfg(target_os = "linux")]
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| UpdError::ToolUnavailable {
            binary: self.binary.clone(),
            reason: e.to_string(),
        })?;
        let started = Instant::now();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = {
            let collect = async {
                tokio::try_join!(read_pipe(stdout), read_pipe(stderr), child.wait())
            };
            tokio::select! {
                result = collect => Outcome::Finished(result),
                _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
                _ = cancel.cancelled() => Outcome::Cancelled,
            }
        };

        match outcome {
            Outcome::Finished(result) => {
                let (stdout, stderr, status) = result?;
                let output = combine_streams(
                    &String::from_utf8_lossy(&stdout),
                    &String::from_utf8_lossy(&stderr),
                );
                let exit_code = status.code().unwrap_or(-1);
                log::debug!(
                    "{} -> exit={} ({} 字节, {:?})",
                    call,
                    exit_code,
                    output.len(),
                    started.elapsed()
                );
                Ok(Invocation::new(call, output, exit_code))
            }
            Outcome::TimedOut => {
                terminate(&mut child).await;
                log::warn!("{} 超时（{} 秒），进程已终止", call, timeout.as_secs());
                Err(UpdError::ToolTimeout {
                    call,
                    seconds: timeout.as_secs(),
                })
            }
            Outcome::Cancelled => {
                terminate(&mut child).await;
                log::debug!("{} 已取消", call);
                Err(UpdError::Cancelled)
            }
        }
    }
}

/// 读取管道直到 EOF
async fn read_pipe(pipe: Option<impl AsyncRead + Unpin>) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = pipe {
        reader.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}

/// 结束子进程（及其进程组）并回收
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    if let Err(e) = child.kill().await {
        log::debug!("终止子进程失败: {}", e);
    }
}

/// `<binary> --version` 探测。
///
/// 只要能启动就视为已安装（退出码不重要）；超过 `timeout` 仍未退出的进程会被杀掉。
async fn probe(binary: &str, timeout: Duration) -> bool {
    let mut child = match Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            log::debug!("{} 无法启动: {}", binary, e);
            return false;
        }
    };

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => log::debug!("{} --version -> {:?}", binary, status),
        Err(_) => {
            log::debug!("{} --version 在 {:?} 内未退出，已终止", binary, timeout);
            if let Err(e) = child.kill().await {
                log::debug!("终止探测进程失败: {}", e);
            }
        }
    }
    true
}
