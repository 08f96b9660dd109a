//! 输出解析函数

use super::types::PackageInfo;
use crate::error::{EngineError, Result};
use serde_json::Value;

/// 清理终端输出中的 ANSI 转义序列和特殊字符
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\r' => {
                if chars.peek() != Some(&'\n') && !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => result.push(c),
        }
    }

    result
        .lines()
        .filter(|line| !is_spinner_frame(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// winget 在输出表格前会用 `\r` 刷新 `-\|/` 旋转字符和进度块
fn is_spinner_frame(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.chars().count() == 1 {
        return matches!(trimmed.chars().next(), Some('-' | '\\' | '|' | '/'));
    }
    trimmed.chars().all(|c| matches!(c, '█' | '▒' | ' '))
}

/// 把 `list` 原始输出切成缓存行：逐行 trim，丢弃空行
pub fn parse_listing_lines(output: &str) -> Vec<String> {
    clean_terminal_output(output)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 已安装列表（去掉表头与分隔线两行）
pub fn parse_installed_list(output: &str) -> Vec<String> {
    clean_terminal_output(output)
        .lines()
        .filter(|line| !line.is_empty())
        .skip(2)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 行内第二个空白分隔的 token 视为已安装版本
///
/// 依赖外部工具 `Id Version ...` 的表格布局，是刻意宽松的启发式。
pub fn version_token(line: &str) -> Option<&str> {
    line.split_whitespace().nth(1)
}

/// 解析 `show <id> --json`：`{"Data": {"Publisher", "Version", "Description", "Homepage"}}`
pub fn parse_show_json(output: &str) -> Result<PackageInfo> {
    let root: Value = serde_json::from_str(output.trim())
        .map_err(|e| EngineError::Parse(format!("show 输出不是合法 JSON: {}", e)))?;
    let data = root
        .get("Data")
        .ok_or_else(|| EngineError::Parse("缺少 Data 字段".to_string()))?;

    let field = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(PackageInfo {
        publisher: field("Publisher"),
        version: field("Version"),
        description: field("Description"),
        homepage: field("Homepage"),
    })
}
