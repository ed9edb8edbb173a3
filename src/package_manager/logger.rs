//! winget 调用审计日志

use super::parser::{repair_mojibake, sanitize_output};
use crate::error::{Result, UpdError};
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S:%3f";

/// 将每次 winget 调用（命令行 + 输出）追加到日志文件。
///
/// 写入通过互斥锁串行化，并发调用不会交错出半条记录。
pub struct FileLogger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 启动时的预检：创建（并清空）日志文件，返回是否可写
    pub async fn can_write(&self) -> bool {
        let _guard = self.lock.lock().await;
        match tokio::fs::write(&self.path, b"").await {
            Ok(()) => true,
            Err(e) => {
                log::debug!("日志文件 {} 不可写: {}", self.path.display(), e);
                false
            }
        }
    }

    /// 追加一条记录：时间戳、命令行、输出块
    pub async fn record(&self, call: &str, output: &str) -> Result<()> {
        if call.trim().is_empty() {
            return Err(UpdError::InvalidInput("日志记录的命令行不能为空".to_string()));
        }

        let _guard = self.lock.lock().await;

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let entry = format_record(&timestamp, call, output);

        let write = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(entry.as_bytes()).await?;
            file.flush().await
        };
        write.await.map_err(|e| UpdError::LogWrite {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// 生成三行格式的日志记录（输出块内部每行都缩进一个制表符）
fn format_record(timestamp: &str, call: &str, output: &str) -> String {
    let cleaned = sanitize_output(output);
    let repaired = repair_mojibake(&cleaned);
    format!("{}\n\t{}\n{}\n", timestamp, call.trim(), indent_output(&repaired))
}

fn indent_output(output: &str) -> String {
    if output.trim().is_empty() {
        return String::new();
    }
    let indented = output.replace('\n', "\n\t");
    format!("\t{}", indented.trim_end_matches(['\t', '\n']))
}
