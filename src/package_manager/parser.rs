//! 输出解析函数

use super::types::{Invocation, ListOutcome};
use crate::error::{Result, UpdError};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// 默认识别的 "可用" 列标题（英文 / 德文）
pub const DEFAULT_AVAILABLE_MARKERS: &[&str] = &["Available", "Verfügbar"];

/// 控制台代码页不匹配时产生的乱码及其正确写法
const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[("Verf├╝gbar", "Verfügbar")];

/// winget 旋转进度指示器使用的字符，总是跟在退格符之后
const SPINNER_GLYPHS: &[char] = &['|', '/', '-', '\\'];

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)+").expect("version regex is valid"));

pub fn default_available_markers() -> Vec<String> {
    DEFAULT_AVAILABLE_MARKERS.iter().map(|m| m.to_string()).collect()
}

/// 清理 winget 输出中的进度指示器、ANSI 转义序列和其他控制字符
pub fn sanitize_output(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x08' => {
                if chars.peek().is_some_and(|next| SPINNER_GLYPHS.contains(next)) {
                    chars.next();
                }
            }
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    // CSI 以 0x40..=0x7E 范围内的字节结束
                    while let Some(next) = chars.next() {
                        if ('\x40'..='\x7e').contains(&next) {
                            break;
                        }
                    }
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => result.push(c),
        }
    }

    result.trim().to_string()
}

/// 修正已知的乱码单词；没有乱码时原样借用
pub fn repair_mojibake(input: &str) -> Cow<'_, str> {
    let mut output = Cow::Borrowed(input);
    for (garbled, correct) in MOJIBAKE_REPAIRS {
        if output.contains(garbled) {
            output = Cow::Owned(output.replace(garbled, correct));
        }
    }
    output
}

/// 输出中是否包含被单个空格包围的 "可用" 标记。
///
/// 先检查原始文本，只有未命中时才尝试修正乱码后再检查一次，
/// 以免修正逻辑破坏本来就正确的 ASCII 输出。
pub fn has_available_marker(text: &str, markers: &[String]) -> bool {
    let contains_any = |haystack: &str| {
        markers
            .iter()
            .filter(|m| !m.trim().is_empty())
            .any(|m| haystack.contains(&format!(" {} ", m.trim())))
    };

    if contains_any(text) {
        return true;
    }
    match repair_mojibake(text) {
        Cow::Owned(repaired) => contains_any(&repaired),
        Cow::Borrowed(_) => false,
    }
}

/// 退出码为 0 且输出中出现了包 ID
fn is_listed(invocation: &Invocation, text: &str, package: &str) -> bool {
    invocation.success() && text.contains(package)
}

/// `search` 分类：包是否在 winget 目录中存在
pub fn classify_search(invocation: &Invocation, package: &str) -> bool {
    let text = sanitize_output(&invocation.output);
    is_listed(invocation, &text, package)
}

/// `list` 分类：包是否已安装、是否可更新以及版本号
pub fn classify_list(
    invocation: &Invocation,
    package: &str,
    markers: &[String],
) -> Result<ListOutcome> {
    let text = sanitize_output(&invocation.output);
    if !is_listed(invocation, &text, package) {
        return Ok(ListOutcome::NotInstalled);
    }

    let mut versions = extract_versions(&text, package)?.into_iter();
    let installed_version = versions.next().unwrap_or_default();
    let available_version = versions
        .next()
        .filter(|_| has_available_marker(&text, markers));

    Ok(ListOutcome::Installed {
        installed_version,
        available_version,
    })
}

/// `upgrade` 分类：只看退出码
pub fn classify_upgrade(invocation: &Invocation) -> bool {
    invocation.success()
}

/// 从包所在的那一行中提取版本号。
///
/// winget list 输出示例：
///   `Name                         ID                                    Version Verfügbar Quelle`
///   `Visual Studio Community 2022 Microsoft.VisualStudio.2022.Community 17.1.6  17.2.0    winget`
///
/// 恰好一个版本号表示只有已安装版本，两个表示 "已安装, 可用"；
/// 其余情况说明输出格式与预期不符，直接报错。
pub fn extract_versions(text: &str, package: &str) -> Result<Vec<String>> {
    let line = text
        .lines()
        .find(|line| line.contains(package))
        .ok_or_else(|| UpdError::Parse(format!("list 输出中没有包含 '{}' 的行", package)))?;

    // 包 ID 本身可能带有数字，例如 Python.Python.3.11
    let without_id = line.replace(package, " ");
    let versions: Vec<String> = VERSION_RE
        .find_iter(&without_id)
        .map(|m| m.as_str().to_string())
        .collect();

    match versions.len() {
        0 => Err(UpdError::Parse(format!(
            "'{}' 的 list 输出中不包含任何版本号",
            package
        ))),
        1 | 2 => Ok(versions),
        n => Err(UpdError::Parse(format!(
            "'{}' 的 list 输出中包含 {} 个版本号（最多 2 个）",
            package, n
        ))),
    }
}
