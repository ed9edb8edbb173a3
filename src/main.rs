mod config;
mod error;
mod package_file;
mod package_manager;
mod updater;

use anyhow::{Context, Result};
use clap::Parser;
use error::UpdError;
use package_file::PackageFileReader;
use package_manager::WinGet;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use updater::{PackageRecord, ProgressEvent, ProgressStatus, Schedule, Updater};

/// 检查 packages.txt 中列出的 winget 包是否有更新，并在确认后升级
#[derive(Parser, Debug)]
#[command(name = "wingetupd", version, about)]
struct Args {
    /// 不写 winget 调用日志
    #[arg(long)]
    no_log: bool,

    /// 不询问，直接更新
    #[arg(long)]
    no_confirm: bool,

    /// 并行处理所有包（winget 可能因源刷新冲突而报错）
    #[arg(long)]
    parallel: bool,

    /// 包列表文件
    #[arg(long, value_name = "PATH")]
    package_file: Option<PathBuf>,

    /// 配置文件
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!();
            eprintln!("错误: {}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    // 加载配置
    let config = config::Config::load_or_default(args.config.as_deref())?;

    let package_file =
        PackageFileReader::new(args.package_file.unwrap_or_else(|| config.package_file.clone()));
    if !package_file.exists().await {
        anyhow::bail!("找不到包列表文件 {}", package_file.path().display());
    }

    let runner = WinGet::new(config.binary.clone()).with_probe_timeout(config.probe_timeout());
    let mut builder = Updater::builder(runner)
        .available_markers(config.available_markers.clone())
        .timeouts(config.query_timeout(), config.upgrade_timeout())
        .schedule(if args.parallel || config.parallel {
            Schedule::Parallel
        } else {
            Schedule::Sequential
        });
    match (args.no_log, config.write_log) {
        (true, _) | (false, Some(false)) => {}
        (false, Some(true)) => builder = builder.log_file(&config.log_file, true),
        (false, None) => builder = builder.log_file(&config.log_file, false),
    }
    let updater = builder.build().await?;
    log::debug!("调度方式: {:?}, 日志: {}", updater.schedule(), updater.is_logging());

    let packages = package_file.read_entries().await?;

    // Ctrl-C 取消正在运行的 winget 进程
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("收到 Ctrl-C，正在取消");
            trigger.cancel();
        }
    });

    print!("正在处理");
    flush();
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_printer(rx, print_analysis_event);
    let records = updater.analyze_packages(&packages, Some(tx), &cancel).await;
    let _ = printer.await;
    println!(" 完成");
    println!();
    let (records, failures) = split_results(&packages, records?);

    if let Some(code) = show_problems(&records, &failures) {
        return Ok(code);
    }

    let updatable: Vec<&PackageRecord> = records.iter().filter(|r| r.is_updatable()).collect();
    if updatable.is_empty() {
        println!("所有包都是最新的。");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} 个包可以更新:", updatable.len());
    for record in &updatable {
        println!(
            "  - {} {} → {}",
            record.package(),
            record.installed_version(),
            record.available_version()
        );
    }
    println!();

    if !args.no_confirm && !confirm("是否更新这些包？[y/N] ").await? {
        println!("已取消更新。");
        return Ok(ExitCode::SUCCESS);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_printer(rx, print_update_event);
    let updated = updater.update_packages(&records, Some(tx), &cancel).await;
    let _ = printer.await;
    let package_ids: Vec<String> = records.iter().map(|r| r.package().to_string()).collect();
    let (updated, failures) = split_results(&package_ids, updated?);
    let updated = updated.into_iter().filter(|done| *done).count();

    println!();
    for (package, error) in &failures {
        println!("  {} 更新出错: {}", package, describe_update_error(error));
    }
    println!("已更新 {} 个包。", updated);
    Ok(if updated == updatable.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn spawn_printer(
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
    print: fn(&ProgressEvent),
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print(&event);
        }
    })
}

/// 每个包的每个阶段打印一个点
fn print_analysis_event(_event: &ProgressEvent) {
    print!(".");
    flush();
}

fn print_update_event(event: &ProgressEvent) {
    match event.status {
        ProgressStatus::Updatable => println!("正在更新 {} ...", event.package),
        ProgressStatus::Updated => println!("  {} 更新成功", event.package),
        ProgressStatus::NotUpdated => println!("  {} 更新失败", event.package),
        _ => {}
    }
}

/// 按包拆分成功结果和出错的包
fn split_results<T>(
    packages: &[String],
    results: Vec<Result<T, UpdError>>,
) -> (Vec<T>, Vec<(String, UpdError)>) {
    let mut done = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (package, result) in packages.iter().zip(results) {
        match result {
            Ok(value) => done.push(value),
            Err(e) => failures.push((package.clone(), e)),
        }
    }
    (done, failures)
}

/// 存在无效、未安装或分析出错的包时打印出来并返回退出码
fn show_problems(records: &[PackageRecord], failures: &[(String, UpdError)]) -> Option<ExitCode> {
    let invalid: Vec<&str> = records
        .iter()
        .filter(|r| !r.is_valid())
        .map(|r| r.package())
        .collect();
    let not_installed: Vec<&str> = records
        .iter()
        .filter(|r| r.is_valid() && !r.is_installed())
        .map(|r| r.package())
        .collect();

    if invalid.is_empty() && not_installed.is_empty() && failures.is_empty() {
        return None;
    }

    if !failures.is_empty() {
        println!("以下包分析出错:");
        for (package, error) in failures {
            println!("  - {}: {}", package, describe_update_error(error));
        }
    }

    if !invalid.is_empty() {
        println!("以下包 ID 在 winget 中不存在:");
        for package in &invalid {
            println!("  - {}", package);
        }
    }
    if !not_installed.is_empty() {
        println!("以下包没有安装:");
        for package in &not_installed {
            println!("  - {}", package);
        }
    }
    println!();
    println!("请修正包列表文件后重试。");
    Some(ExitCode::FAILURE)
}

async fn confirm(question: &str) -> Result<bool> {
    print!("{}", question);
    flush();

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("无法读取输入")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn flush() {
    let _ = std::io::stdout().flush();
}

fn describe(error: &anyhow::Error) -> String {
    match error.downcast_ref::<UpdError>() {
        Some(e) => describe_update_error(e),
        None => format!("{:#}", error),
    }
}

fn describe_update_error(error: &UpdError) -> String {
    match error {
        UpdError::ToolUnavailable { binary, .. } => {
            format!("{} 似乎没有安装或无法运行，请先安装 WinGet", binary)
        }
        UpdError::ToolTimeout { call, seconds } => {
            format!("'{}' 在 {} 秒内没有结束，已终止", call, seconds)
        }
        UpdError::Cancelled => "操作已取消".to_string(),
        UpdError::LogWrite { path, .. } => format!(
            "无法写入日志文件 {}（可使用 --no-log 跳过日志）",
            path.display()
        ),
        e => e.to_string(),
    }
}
