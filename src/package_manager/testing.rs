//! 测试用的脚本化 winget 替身

use super::runner::ToolRunner;
use super::types::Invocation;
use crate::error::{Result, UpdError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Response {
    Output(i32, String),
    Timeout,
    /// 一直挂起，直到被取消
    Hang,
}

/// 按 "命令 + 包 ID" 返回预设输出，并记录每次调用
pub struct ScriptedRunner {
    installed: bool,
    responses: HashMap<String, Response>,
    calls: Mutex<Vec<(String, String, Duration)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            installed: true,
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn not_installed(mut self) -> Self {
        self.installed = false;
        self
    }

    pub fn respond(mut self, command: &str, package: &str, exit_code: i32, output: &str) -> Self {
        self.responses.insert(
            key(command, package),
            Response::Output(exit_code, output.to_string()),
        );
        self
    }

    pub fn time_out(mut self, command: &str, package: &str) -> Self {
        self.responses.insert(key(command, package), Response::Timeout);
        self
    }

    pub fn hang(mut self, command: &str, package: &str) -> Self {
        self.responses.insert(key(command, package), Response::Hang);
        self
    }

    /// 已执行的调用，形如 "search Git.Git"
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(command, options, _)| {
                key(command, options.split_whitespace().last().unwrap_or_default())
            })
            .collect()
    }

    pub fn options(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(command, options, _)| format!("{} {}", command, options))
            .collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(_, _, t)| *t).collect()
    }
}

fn key(command: &str, package: &str) -> String {
    format!("{} {}", command, package)
}

impl ToolRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "winget"
    }

    async fn is_installed(&self) -> bool {
        self.installed
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

        let package = options.split_whitespace().last().unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), options.to_string(), timeout));

        let call = format!("winget {} {}", command, options);
        let response = self.responses.get(&key(command, package)).cloned();
        match response {
            Some(Response::Output(exit_code, output)) => Ok(Invocation::new(call, output, exit_code)),
            Some(Response::Timeout) => Err(UpdError::ToolTimeout {
                call,
                seconds: timeout.as_secs(),
            }),
            Some(Response::Hang) => {
                cancel.cancelled().await;
                Err(UpdError::Cancelled)
            }
            None => Ok(Invocation::new(
                call,
                "No package found matching input criteria.",
                -1978335212,
            )),
        }
    }
}

pub fn search_hit(package: &str) -> String {
    format!(
        "Name    Id         Version Source\n----------------------------------\nPackage {} 1.0.0   winget",
        package
    )
}

pub fn list_installed(package: &str, version: &str) -> String {
    format!(
        "Name    Id         Version Source\n----------------------------------\nPackage {} {}   winget",
        package, version
    )
}

pub fn list_updatable(package: &str, installed: &str, available: &str) -> String {
    format!(
        "Name    Id         Version Available Source\n--------------------------------------------\nPackage {} {}   {}     winget",
        package, installed, available
    )
}
