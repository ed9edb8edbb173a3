//! 包管理器模块：对 winget 的封装

pub mod logger;
pub mod parser;
pub mod runner;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use logger::FileLogger;
pub use runner::{ToolRunner, WinGet};
pub use types::{Invocation, ListOutcome};

use crate::error::{Result, UpdError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// search / list 的默认超时
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
/// 安装程序可能运行很久，upgrade 给足时间
pub const DEFAULT_UPGRADE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// 对单个包执行 search / list / upgrade，并把每次调用写入审计日志
pub struct PackageManager<R> {
    runner: R,
    logger: Option<Arc<FileLogger>>,
    markers: Vec<String>,
    query_timeout: Duration,
    upgrade_timeout: Duration,
}

impl<R: ToolRunner> PackageManager<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            logger: None,
            markers: parser::default_available_markers(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            upgrade_timeout: DEFAULT_UPGRADE_TIMEOUT,
        }
    }

    pub fn with_logger(mut self, logger: Option<Arc<FileLogger>>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_markers(mut self, markers: Vec<String>) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_timeouts(mut self, query: Duration, upgrade: Duration) -> Self {
        self.query_timeout = query;
        self.upgrade_timeout = upgrade;
        self
    }

    pub fn is_logging(&self) -> bool {
        self.logger.is_some()
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// 包是否存在于 winget 目录中
    pub async fn search_package(&self, package: &str, cancel: &CancellationToken) -> Result<bool> {
        let invocation = self
            .invoke("search", package, self.query_timeout, cancel)
            .await?;
        Ok(parser::classify_search(&invocation, package))
    }

    /// 包是否已安装、是否可更新
    pub async fn list_package(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<ListOutcome> {
        let invocation = self
            .invoke("list", package, self.query_timeout, cancel)
            .await?;
        parser::classify_list(&invocation, package, &self.markers)
    }

    /// 升级单个包，返回是否成功
    pub async fn upgrade_package(&self, package: &str, cancel: &CancellationToken) -> Result<bool> {
        let invocation = self
            .invoke("upgrade", package, self.upgrade_timeout, cancel)
            .await?;
        Ok(parser::classify_upgrade(&invocation))
    }

    async fn invoke(
        &self,
        command: &str,
        package: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Invocation> {
        if package.trim().is_empty() {
            return Err(UpdError::InvalidInput("包 ID 不能为空".to_string()));
        }

        let options = format!("--exact --id {}", package);
        match self.runner.run(command, &options, timeout, cancel).await {
            Ok(invocation) => {
                self.audit(&invocation.call, &invocation.output).await?;
                Ok(invocation)
            }
            Err(UpdError::ToolTimeout { call, seconds }) => {
                let message = format!("超时：{} 秒内未结束，进程已终止", seconds);
                self.audit(&call, &message).await?;
                Err(UpdError::ToolTimeout { call, seconds })
            }
            Err(e) => Err(e),
        }
    }

    async fn audit(&self, call: &str, output: &str) -> Result<()> {
        match &self.logger {
            Some(logger) => logger.record(call, output).await,
            None => Ok(()),
        }
    }
}
