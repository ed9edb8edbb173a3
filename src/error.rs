use std::path::PathBuf;
use thiserror::Error;

/// 引擎内部统一的错误类型
#[derive(Error, Debug)]
pub enum UpdError {
    /// 外部工具无法启动（未安装或不可执行）
    #[error("{binary} 无法启动: {reason}")]
    ToolUnavailable { binary: String, reason: String },

    /// 单次调用超过截止时间，进程已被终止
    #[error("'{call}' 在 {seconds} 秒后超时，进程已终止")]
    ToolTimeout { call: String, seconds: u64 },

    /// 调用方主动取消
    #[error("操作已取消")]
    Cancelled,

    /// 输出格式与预期不符
    #[error("无法解析输出: {0}")]
    Parse(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("日志文件 '{path}' 写入失败: {reason}")]
    LogWrite { path: PathBuf, reason: String },

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UpdError>;
