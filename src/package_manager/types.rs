//! PackageManager 相关数据类型定义

/// 一次外部工具调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// 完整命令行，例如 `winget search --exact --id Git.Git`
    pub call: String,
    /// stdout 与 stderr 合并后的文本
    pub output: String,
    pub exit_code: i32,
}

impl Invocation {
    pub fn new(call: impl Into<String>, output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            call: call.into(),
            output: output.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// 合并两个输出流：都非空时以换行分隔，否则取非空的那个
pub fn combine_streams(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) if stdout.ends_with('\n') => format!("{}{}", stdout, stderr),
        (false, false) => format!("{}\n{}", stdout, stderr),
        (false, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (true, true) => String::new(),
    }
}

/// `list` 命令的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    NotInstalled,
    Installed {
        installed_version: String,
        /// 仅在可更新时为 Some
        available_version: Option<String>,
    },
}
