use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::package_file::DEFAULT_PACKAGE_FILE;
use crate::package_manager::parser::default_available_markers;
use crate::package_manager::runner::DEFAULT_BINARY;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub binary: String,
    pub package_file: PathBuf,
    pub log_file: PathBuf,
    /// 未设置时日志可选：无法写入只警告；显式为 true 时无法写入直接报错
    pub write_log: Option<bool>,
    pub parallel: bool,
    pub query_timeout_secs: u64,
    pub upgrade_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub available_markers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            package_file: PathBuf::from(DEFAULT_PACKAGE_FILE),
            log_file: PathBuf::from("wingetupd.log"),
            write_log: None,
            parallel: false,
            query_timeout_secs: 30,
            upgrade_timeout_secs: 60 * 60,
            probe_timeout_secs: 5,
            available_markers: default_available_markers(),
        }
    }
}

impl Config {
    /// 读取配置文件；未指定路径时使用 ~/.config/wingetupd/config.toml，文件不存在则使用默认值
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("无法读取配置文件 {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("配置文件 {} 格式错误", config_path.display()))?;
            Ok(config)
        } else if path.is_some() {
            anyhow::bail!("配置文件 {} 不存在", config_path.display())
        } else {
            Ok(Self::default())
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn upgrade_timeout(&self) -> Duration {
        Duration::from_secs(self.upgrade_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/wingetupd/config.toml")
}
