//! 包列表文件：每行一个 winget 包 ID

use crate::error::{Result, UpdError};
use std::path::{Path, PathBuf};

pub const DEFAULT_PACKAGE_FILE: &str = "packages.txt";

pub struct PackageFileReader {
    path: PathBuf,
}

impl PackageFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// 读取包 ID；去掉首尾空白，跳过空行和以 `#` 开头的注释行
    pub async fn read_entries(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let entries = parse_entries(&content);
        if entries.is_empty() {
            return Err(UpdError::InvalidInput(format!(
                "包列表文件 {} 中没有任何包",
                self.path.display()
            )));
        }
        log::debug!("从 {} 读取到 {} 个包", self.path.display(), entries.len());
        Ok(entries)
    }
}

fn parse_entries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
