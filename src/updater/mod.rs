//! 分析 / 更新流程编排
//!
//! 每个包依次经过 search → list → upgrade，任一步骤得到否定结果即停止。
//! winget 并发运行时会因共享的源刷新状态报错（"Failed in attempting to
//! update the source"），因此默认逐个处理；并行模式需要调用方显式开启。

pub mod progress;
pub mod record;

pub use progress::{ProgressEvent, ProgressSink, ProgressStatus};
pub use record::PackageRecord;

use crate::error::{Result, UpdError};
use crate::package_manager::{
    FileLogger, ListOutcome, PackageManager, ToolRunner, DEFAULT_QUERY_TIMEOUT,
    DEFAULT_UPGRADE_TIMEOUT,
};
use progress::report;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// 整批调用的结果：外层错误中断整批，内层与输入一一对应
pub type BatchResult<T> = Result<Vec<Result<T>>>;

/// 包的调度方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// 按输入顺序逐个处理
    #[default]
    Sequential,
    /// 每个包一个并发任务，全部结束后汇总
    Parallel,
}

/// 日志文件设置
#[derive(Debug, Clone)]
struct LogSettings {
    path: PathBuf,
    /// 为 true 时预检失败直接报错，否则仅警告并关闭日志
    required: bool,
}

/// 一次性完成前置检查，得到可直接使用的 [`Updater`]
pub struct UpdaterBuilder<R> {
    runner: R,
    log: Option<LogSettings>,
    markers: Option<Vec<String>>,
    query_timeout: Duration,
    upgrade_timeout: Duration,
    schedule: Schedule,
}

impl<R: ToolRunner + 'static> UpdaterBuilder<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            log: None,
            markers: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            upgrade_timeout: DEFAULT_UPGRADE_TIMEOUT,
            schedule: Schedule::default(),
        }
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>, required: bool) -> Self {
        self.log = Some(LogSettings {
            path: path.into(),
            required,
        });
        self
    }

    pub fn available_markers(mut self, markers: Vec<String>) -> Self {
        self.markers = Some(markers);
        self
    }

    pub fn timeouts(mut self, query: Duration, upgrade: Duration) -> Self {
        self.query_timeout = query;
        self.upgrade_timeout = upgrade;
        self
    }

    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub async fn build(self) -> Result<Updater<R>> {
        if !self.runner.is_installed().await {
            return Err(UpdError::ToolUnavailable {
                binary: self.runner.name().to_string(),
                reason: "似乎没有安装".to_string(),
            });
        }

        let logger = match self.log {
            Some(settings) => {
                let logger = FileLogger::new(&settings.path);
                if logger.can_write().await {
                    log::info!("winget 调用记录写入 {}", logger.path().display());
                    Some(Arc::new(logger))
                } else if settings.required {
                    return Err(UpdError::LogWrite {
                        path: settings.path,
                        reason: "无法创建日志文件，目录可能没有写权限".to_string(),
                    });
                } else {
                    log::warn!(
                        "无法创建日志文件 {}，本次运行不记录 winget 调用",
                        settings.path.display()
                    );
                    None
                }
            }
            None => None,
        };

        let mut manager = PackageManager::new(self.runner)
            .with_logger(logger)
            .with_timeouts(self.query_timeout, self.upgrade_timeout);
        if let Some(markers) = self.markers {
            if markers.iter().all(|m| m.trim().is_empty()) {
                return Err(UpdError::InvalidInput("可用标记列表不能为空".to_string()));
            }
            manager = manager.with_markers(markers);
        }

        log::info!("初始化完成（{:?}）", self.schedule);
        Ok(Updater {
            manager: Arc::new(manager),
            schedule: self.schedule,
        })
    }
}

/// 分析并更新一组包
pub struct Updater<R> {
    manager: Arc<PackageManager<R>>,
    schedule: Schedule,
}

impl<R: ToolRunner + 'static> Updater<R> {
    pub fn builder(runner: R) -> UpdaterBuilder<R> {
        UpdaterBuilder::new(runner)
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn is_logging(&self) -> bool {
        self.manager.is_logging()
    }

    /// 对每个包执行 search → list，返回与输入一一对应的结果。
    ///
    /// 顺序模式下第一个错误直接中断整批；并行模式下错误只属于出错的那个包，
    /// 其余包的结果照常返回。
    pub async fn analyze_packages(
        &self,
        packages: &[String],
        progress: Option<ProgressSink>,
        cancel: &CancellationToken,
    ) -> BatchResult<PackageRecord> {
        validate_packages(packages)?;
        log::info!("分析 {} 个包", packages.len());

        self.run_all(packages.to_vec(), cancel, move |manager, package, cancel| {
            analyze_package(manager, package, progress.clone(), cancel)
        })
        .await
    }

    /// 对标记为可更新的包执行 upgrade，结果与 `records` 一一对应：
    /// `Ok(true)` 表示已更新，`Ok(false)` 表示跳过或 upgrade 失败
    pub async fn update_packages(
        &self,
        records: &[PackageRecord],
        progress: Option<ProgressSink>,
        cancel: &CancellationToken,
    ) -> BatchResult<bool> {
        if records.is_empty() {
            return Err(UpdError::InvalidInput("包分析结果列表为空".to_string()));
        }
        log::info!(
            "更新 {} 个包",
            records.iter().filter(|r| r.is_updatable()).count()
        );

        self.run_all(records.to_vec(), cancel, move |manager, record, cancel| {
            update_package(manager, record, progress.clone(), cancel)
        })
        .await
    }

    async fn run_all<T, O, F, Fut>(
        &self,
        items: Vec<T>,
        cancel: &CancellationToken,
        step: F,
    ) -> BatchResult<O>
    where
        T: Send + 'static,
        O: Send + 'static,
        F: Fn(Arc<PackageManager<R>>, T, CancellationToken) -> Fut,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        match self.schedule {
            Schedule::Sequential => {
                let mut results = Vec::with_capacity(items.len());
                for item in items {
                    if cancel.is_cancelled() {
                        return Err(UpdError::Cancelled);
                    }
                    results.push(Ok(step(Arc::clone(&self.manager), item, cancel.clone()).await?));
                }
                Ok(results)
            }
            Schedule::Parallel => {
                let count = items.len();
                let mut tasks = JoinSet::new();
                for (index, item) in items.into_iter().enumerate() {
                    let pipeline = step(Arc::clone(&self.manager), item, cancel.clone());
                    tasks.spawn(async move { (index, pipeline.await) });
                }

                let mut slots: Vec<Option<Result<O>>> = (0..count).map(|_| None).collect();
                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok((index, result)) => {
                            if let Err(e) = &result {
                                log::warn!("第 {} 个包处理失败: {}", index + 1, e);
                            }
                            slots[index] = Some(result);
                        }
                        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                        Err(e) => log::debug!("任务被中止: {}", e),
                    }
                }

                // 被中止而没有结果的任务按取消处理
                Ok(slots
                    .into_iter()
                    .map(|slot| slot.unwrap_or(Err(UpdError::Cancelled)))
                    .collect())
            }
        }
    }
}

fn validate_packages(packages: &[String]) -> Result<()> {
    if packages.is_empty() {
        return Err(UpdError::InvalidInput("包列表为空".to_string()));
    }
    if let Some(bad) = packages
        .iter()
        .find(|p| p.trim().is_empty() || p.chars().any(char::is_whitespace))
    {
        return Err(UpdError::InvalidInput(format!(
            "包列表中包含空白或带空格的条目: '{}'",
            bad
        )));
    }
    Ok(())
}

async fn analyze_package<R: ToolRunner>(
    manager: Arc<PackageManager<R>>,
    package: String,
    progress: Option<ProgressSink>,
    cancel: CancellationToken,
) -> Result<PackageRecord> {
    let sink = progress.as_ref();
    let record = PackageRecord::builder(package.as_str());

    if !manager.search_package(&package, &cancel).await? {
        report(sink, &package, ProgressStatus::NotValid);
        return Ok(record.not_valid());
    }
    report(sink, &package, ProgressStatus::Valid);
    let record = record.valid();

    let (installed_version, available_version) = match manager.list_package(&package, &cancel).await? {
        ListOutcome::NotInstalled => {
            report(sink, &package, ProgressStatus::NotInstalled);
            return Ok(record.not_installed());
        }
        ListOutcome::Installed {
            installed_version,
            available_version,
        } => (installed_version, available_version),
    };
    report(sink, &package, ProgressStatus::Installed);
    let record = record.installed(installed_version);

    match available_version {
        Some(available_version) => {
            report(sink, &package, ProgressStatus::Updatable);
            Ok(record.updatable(available_version))
        }
        None => {
            report(sink, &package, ProgressStatus::NotUpdatable);
            Ok(record.not_updatable())
        }
    }
}

async fn update_package<R: ToolRunner>(
    manager: Arc<PackageManager<R>>,
    record: PackageRecord,
    progress: Option<ProgressSink>,
    cancel: CancellationToken,
) -> Result<bool> {
    let sink = progress.as_ref();
    let package = record.package();

    let checks = [
        (record.is_valid(), ProgressStatus::Valid, ProgressStatus::NotValid),
        (record.is_installed(), ProgressStatus::Installed, ProgressStatus::NotInstalled),
        (record.is_updatable(), ProgressStatus::Updatable, ProgressStatus::NotUpdatable),
    ];
    for (passed, yes, no) in checks {
        if !passed {
            report(sink, package, no);
            return Ok(false);
        }
        report(sink, package, yes);
    }

    if manager.upgrade_package(package, &cancel).await? {
        report(sink, package, ProgressStatus::Updated);
        Ok(true)
    } else {
        report(sink, package, ProgressStatus::NotUpdated);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_manager::testing::{list_installed, list_updatable, search_hit, ScriptedRunner};
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    fn ids(packages: &[&str]) -> Vec<String> {
        packages.iter().map(|p| p.to_string()).collect()
    }

    /// 三个包：一个无效、一个已安装、一个可更新
    fn mixed_runner() -> ScriptedRunner {
        ScriptedRunner::new()
            .respond("search", "Git.Git", 0, &search_hit("Git.Git"))
            .respond("list", "Git.Git", 0, &list_installed("Git.Git", "2.40.0"))
            .respond("search", "Foo.Bar", 0, &search_hit("Foo.Bar"))
            .respond("list", "Foo.Bar", 0, &list_updatable("Foo.Bar", "1.2.3", "1.3.0"))
            .respond("upgrade", "Foo.Bar", 0, "Successfully installed")
    }

    async fn updater(runner: ScriptedRunner, schedule: Schedule) -> Updater<ScriptedRunner> {
        Updater::builder(runner).schedule(schedule).build().await.unwrap()
    }

    /// 整批都成功时取出每个包的结果
    fn all_ok<T>(batch: Vec<Result<T>>) -> Vec<T> {
        batch
            .into_iter()
            .map(|result| result.unwrap_or_else(|e| panic!("unexpected error: {}", e)))
            .collect()
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn statuses_for(events: &[ProgressEvent], package: &str) -> Vec<ProgressStatus> {
        events
            .iter()
            .filter(|e| e.package == package)
            .map(|e| e.status)
            .collect()
    }

    #[tokio::test]
    async fn test_analyze_returns_one_record_per_package_in_order() {
        let updater = updater(mixed_runner(), Schedule::Sequential).await;
        let packages = ids(&["Nope.Nope", "Git.Git", "Foo.Bar"]);

        let records = all_ok(
            updater
                .analyze_packages(&packages, None, &CancellationToken::new())
                .await
                .unwrap(),
        );

        let names: Vec<&str> = records.iter().map(|r| r.package()).collect();
        assert_eq!(names, vec!["Nope.Nope", "Git.Git", "Foo.Bar"]);

        assert_eq!(records[0], PackageRecord::builder("Nope.Nope").not_valid());
        assert_eq!(
            records[1],
            PackageRecord::builder("Git.Git").valid().installed("2.40.0").not_updatable()
        );
        assert_eq!(
            records[2],
            PackageRecord::builder("Foo.Bar").valid().installed("1.2.3").updatable("1.3.0")
        );
    }

    #[tokio::test]
    async fn test_valid_but_not_installed() {
        let runner = ScriptedRunner::new()
            .respond("search", "Git.Git", 0, &search_hit("Git.Git"))
            .respond("list", "Git.Git", 0, "No installed package found matching input criteria.");
        let updater = updater(runner, Schedule::Sequential).await;

        let records = all_ok(
            updater
                .analyze_packages(&ids(&["Git.Git"]), None, &CancellationToken::new())
                .await
                .unwrap(),
        );

        assert!(records[0].is_valid());
        assert!(!records[0].is_installed());
        assert!(!records[0].is_updatable());
    }

    #[tokio::test]
    async fn test_invalid_package_skips_list() {
        let runner = ScriptedRunner::new().respond("search", "X", 0, "No package found");
        let updater = updater(runner, Schedule::Sequential).await;

        let records = all_ok(
            updater
                .analyze_packages(&ids(&["X"]), None, &CancellationToken::new())
                .await
                .unwrap(),
        );

        assert!(!records[0].is_valid());
        assert_eq!(updater.manager.runner_calls(), vec!["search X"]);
    }

    #[tokio::test]
    async fn test_analyze_is_idempotent() {
        let updater = updater(mixed_runner(), Schedule::Sequential).await;
        let packages = ids(&["Nope.Nope", "Git.Git", "Foo.Bar"]);
        let cancel = CancellationToken::new();

        let first = all_ok(updater.analyze_packages(&packages, None, &cancel).await.unwrap());
        let second = all_ok(updater.analyze_packages(&packages, None, &cancel).await.unwrap());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_input_before_running() {
        let updater = updater(mixed_runner(), Schedule::Sequential).await;
        let cancel = CancellationToken::new();

        for packages in [ids(&[]), ids(&["Git.Git", "  "]), ids(&["Git Git"])] {
            let result = updater.analyze_packages(&packages, None, &cancel).await;
            assert!(matches!(result, Err(UpdError::InvalidInput(_))));
        }
        assert!(updater.manager.runner_calls().is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_strictly_increasing_per_package() {
        let updater = updater(mixed_runner(), Schedule::Sequential).await;
        let (tx, rx) = mpsc::unbounded_channel();

        updater
            .analyze_packages(&ids(&["Nope.Nope", "Git.Git", "Foo.Bar"]), Some(tx), &CancellationToken::new())
            .await
            .unwrap();
        let events = drain(rx);

        assert_eq!(statuses_for(&events, "Nope.Nope"), vec![ProgressStatus::NotValid]);
        assert_eq!(
            statuses_for(&events, "Git.Git"),
            vec![ProgressStatus::Valid, ProgressStatus::Installed, ProgressStatus::NotUpdatable]
        );
        assert_eq!(
            statuses_for(&events, "Foo.Bar"),
            vec![ProgressStatus::Valid, ProgressStatus::Installed, ProgressStatus::Updatable]
        );
    }

    #[tokio::test]
    async fn test_parse_error_aborts_sequential_batch() {
        let runner = ScriptedRunner::new()
            .respond("search", "Foo.Bar", 0, &search_hit("Foo.Bar"))
            .respond("list", "Foo.Bar", 0, "Name Id Version\nFoo Foo.Bar 1.0.0 1.1.0 1.2.0")
            .respond("search", "Git.Git", 0, &search_hit("Git.Git"));
        let updater = updater(runner, Schedule::Sequential).await;

        let result = updater
            .analyze_packages(&ids(&["Foo.Bar", "Git.Git"]), None, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(UpdError::Parse(_))));
        assert_eq!(updater.manager.runner_calls(), vec!["search Foo.Bar", "list Foo.Bar"]);
    }

    #[tokio::test]
    async fn test_timeout_aborts_sequential_batch() {
        let runner = mixed_runner().time_out("search", "Git.Git");
        let updater = updater(runner, Schedule::Sequential).await;

        let result = updater
            .analyze_packages(&ids(&["Git.Git", "Foo.Bar"]), None, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(UpdError::ToolTimeout { .. })));
        assert_eq!(updater.manager.runner_calls(), vec!["search Git.Git"]);
    }

    #[tokio::test]
    async fn test_parallel_preserves_order_and_matches_sequential() {
        let packages = ids(&["Nope.Nope", "Git.Git", "Foo.Bar"]);
        let cancel = CancellationToken::new();

        let sequential = all_ok(
            updater(mixed_runner(), Schedule::Sequential)
                .await
                .analyze_packages(&packages, None, &cancel)
                .await
                .unwrap(),
        );
        let parallel = all_ok(
            updater(mixed_runner(), Schedule::Parallel)
                .await
                .analyze_packages(&packages, None, &cancel)
                .await
                .unwrap(),
        );

        assert_eq!(sequential, parallel);
    }

    #[tokio::test]
    async fn test_parallel_failure_does_not_abort_siblings() {
        let runner = mixed_runner().time_out("search", "Git.Git");
        let updater = updater(runner, Schedule::Parallel).await;

        let results = updater
            .analyze_packages(&ids(&["Git.Git", "Foo.Bar"]), None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0], Err(UpdError::ToolTimeout { call, .. }) if call.contains("Git.Git")));
        assert_eq!(
            results[1].as_ref().unwrap(),
            &PackageRecord::builder("Foo.Bar").valid().installed("1.2.3").updatable("1.3.0")
        );
        assert!(updater
            .manager
            .runner_calls()
            .contains(&"list Foo.Bar".to_string()));
    }

    #[tokio::test]
    async fn test_cancellation_stops_remaining_packages() {
        let runner = mixed_runner().hang("search", "Git.Git");
        let updater = updater(runner, Schedule::Sequential).await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = updater
            .analyze_packages(&ids(&["Git.Git", "Foo.Bar"]), None, &cancel)
            .await;

        assert!(matches!(result, Err(UpdError::Cancelled)));
        assert_eq!(updater.manager.runner_calls(), vec!["search Git.Git"]);
    }

    #[tokio::test]
    async fn test_parallel_cancellation() {
        let runner = mixed_runner()
            .hang("search", "Git.Git")
            .hang("search", "Foo.Bar");
        let updater = updater(runner, Schedule::Parallel).await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let results = updater
            .analyze_packages(&ids(&["Git.Git", "Foo.Bar"]), None, &cancel)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| matches!(r, Err(UpdError::Cancelled))));
    }

    #[tokio::test]
    async fn test_update_only_upgrades_updatable_records() {
        let updater = updater(mixed_runner(), Schedule::Sequential).await;
        let cancel = CancellationToken::new();
        let records = all_ok(
            updater
                .analyze_packages(&ids(&["Nope.Nope", "Git.Git", "Foo.Bar"]), None, &cancel)
                .await
                .unwrap(),
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let updated = all_ok(updater.update_packages(&records, Some(tx), &cancel).await.unwrap());

        assert_eq!(updated, vec![false, false, true]);
        let upgrades: Vec<String> = updater
            .manager
            .runner_calls()
            .into_iter()
            .filter(|c| c.starts_with("upgrade"))
            .collect();
        assert_eq!(upgrades, vec!["upgrade Foo.Bar"]);

        let events = drain(rx);
        assert_eq!(statuses_for(&events, "Nope.Nope"), vec![ProgressStatus::NotValid]);
        assert_eq!(
            statuses_for(&events, "Git.Git"),
            vec![ProgressStatus::Valid, ProgressStatus::Installed, ProgressStatus::NotUpdatable]
        );
        assert_eq!(
            statuses_for(&events, "Foo.Bar"),
            vec![
                ProgressStatus::Valid,
                ProgressStatus::Installed,
                ProgressStatus::Updatable,
                ProgressStatus::Updated
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_upgrade_is_not_reported_as_updated() {
        let runner = mixed_runner().respond("upgrade", "Foo.Bar", 1, "Installer failed");
        let updater = updater(runner, Schedule::Parallel).await;
        let record = PackageRecord::builder("Foo.Bar").valid().installed("1.2.3").updatable("1.3.0");
        let (tx, rx) = mpsc::unbounded_channel();

        let updated = all_ok(
            updater
                .update_packages(&[record], Some(tx), &CancellationToken::new())
                .await
                .unwrap(),
        );

        assert_eq!(updated, vec![false]);
        let last = drain(rx).pop().unwrap();
        assert_eq!(last.status, ProgressStatus::NotUpdated);
    }

    #[tokio::test]
    async fn test_parallel_upgrade_timeout_keeps_other_results() {
        let runner = mixed_runner()
            .respond("upgrade", "Git.Git", 0, "Successfully installed")
            .time_out("upgrade", "Foo.Bar");
        let updater = updater(runner, Schedule::Parallel).await;
        let records = [
            PackageRecord::builder("Foo.Bar").valid().installed("1.2.3").updatable("1.3.0"),
            PackageRecord::builder("Git.Git").valid().installed("2.40.0").updatable("2.41.0"),
        ];

        let results = updater
            .update_packages(&records, None, &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(results[0], Err(UpdError::ToolTimeout { .. })));
        assert!(matches!(results[1], Ok(true)));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_records() {
        let updater = updater(mixed_runner(), Schedule::Sequential).await;
        let result = updater.update_packages(&[], None, &CancellationToken::new()).await;
        assert!(matches!(result, Err(UpdError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_build_fails_when_tool_missing() {
        let result = Updater::builder(ScriptedRunner::new().not_installed()).build().await;
        assert!(matches!(result, Err(UpdError::ToolUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_build_with_unwritable_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("wingetupd.log");

        let required = Updater::builder(ScriptedRunner::new())
            .log_file(&path, true)
            .build()
            .await;
        assert!(matches!(required, Err(UpdError::LogWrite { .. })));

        let optional = Updater::builder(ScriptedRunner::new())
            .log_file(&path, false)
            .build()
            .await
            .unwrap();
        assert!(!optional.is_logging());
    }

    #[tokio::test]
    async fn test_build_with_log_writes_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wingetupd.log");
        let updater = Updater::builder(mixed_runner())
            .log_file(&path, true)
            .build()
            .await
            .unwrap();
        assert!(updater.is_logging());

        updater
            .analyze_packages(&ids(&["Git.Git", "Foo.Bar"]), None, &CancellationToken::new())
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let calls: HashMap<&str, usize> = content
            .lines()
            .filter_map(|l| l.strip_prefix("\twinget "))
            .fold(HashMap::new(), |mut acc, call| {
                *acc.entry(call).or_default() += 1;
                acc
            });
        assert_eq!(calls.len(), 4);
    }

    #[tokio::test]
    async fn test_build_rejects_empty_marker_set() {
        let result = Updater::builder(ScriptedRunner::new())
            .available_markers(vec![" ".to_string()])
            .build()
            .await;
        assert!(matches!(result, Err(UpdError::InvalidInput(_))));
    }

    impl PackageManager<ScriptedRunner> {
        fn runner_calls(&self) -> Vec<String> {
            self.runner().calls()
        }
    }
}
