// ==========================================
// 课程体系管理 - 粘贴文本分词器
// ==========================================
// 职责: 原始粘贴文本 → 行 × 单元格 网格
// 分隔符检测优先级: Tab > 竖线 > 两个及以上连续空白
// 限制: 整段输入使用同一分隔符，混合分隔符会产生错位行（不纠正）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use regex::Regex;
use std::sync::LazyLock;

/// 软列分隔: 两个及以上连续空白
static SOFT_COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Invalid column gap regex"));

/// Markdown 表格分隔行: 只含 - : | + 空白
static PIPE_RULE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s|:+\-]+$").expect("Invalid rule line regex"));

/// 列分隔符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Pipe,
    Whitespace,
}

impl Delimiter {
    /// 检测整段输入的分隔符
    pub fn detect<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut has_pipe = false;
        for line in lines {
            if line.contains('\t') {
                return Delimiter::Tab;
            }
            if line.contains('|') {
                has_pipe = true;
            }
        }
        if has_pipe {
            Delimiter::Pipe
        } else {
            Delimiter::Whitespace
        }
    }

    /// 该分隔符下多行单元格是否被拆成了多行（需要续行合并）
    pub fn splits_multiline_cells(&self) -> bool {
        !matches!(self, Delimiter::Tab)
    }

    fn split_line(&self, line: &str) -> Vec<String> {
        match self {
            Delimiter::Tab => line.split('\t').map(|c| c.trim().to_string()).collect(),
            Delimiter::Pipe => {
                let mut cells: Vec<String> =
                    line.split('|').map(|c| c.trim().to_string()).collect();
                // "| a | b |" 外框产生的首尾空单元格
                if line.trim_start().starts_with('|') && !cells.is_empty() {
                    cells.remove(0);
                }
                if line.trim_end().ends_with('|') && !cells.is_empty() {
                    cells.pop();
                }
                cells
            }
            Delimiter::Whitespace => SOFT_COLUMN_GAP
                .split(line.trim_end())
                .map(|c| c.trim().to_string())
                .collect(),
        }
    }
}

/// 分词结果
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedText {
    pub delimiter: Delimiter,
    pub rows: Vec<Vec<String>>,
}

/// 将粘贴文本切分为单元格网格
///
/// # 返回
/// - Err(Validation): 输入为空
pub fn tokenize(text: &str) -> ImportResult<TokenizedText> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(ImportError::validation("no input"));
    }

    let delimiter = Delimiter::detect(lines.iter().copied());
    let rows = match delimiter {
        Delimiter::Tab => split_tab_records(text),
        Delimiter::Pipe => lines
            .iter()
            .filter(|line| !PIPE_RULE_LINE.is_match(line))
            .map(|line| delimiter.split_line(line))
            .collect(),
        Delimiter::Whitespace => lines.iter().map(|line| delimiter.split_line(line)).collect(),
    };

    Ok(TokenizedText { delimiter, rows })
}

/// Tab 分隔文本: 支持电子表格剪贴板的引号多行单元格
///
/// 以 `"` 开头且引号未配对的单元格会吞并后续物理行，直到引号配对
fn split_tab_records(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut open_cell: Option<String> = None;

    for line in text.lines() {
        if open_cell.is_none() && line.trim().is_empty() {
            continue;
        }

        for (idx, field) in line.split('\t').enumerate() {
            if let Some(mut pending) = open_cell.take() {
                // 行首字段接在换行之后，其余字段接在 Tab 之后
                pending.push(if idx == 0 { '\n' } else { '\t' });
                pending.push_str(field);
                if quotes_balanced(&pending) {
                    current.push(unquote_cell(&pending));
                } else {
                    open_cell = Some(pending);
                }
                continue;
            }

            let trimmed = field.trim_start();
            if !trimmed.starts_with('"') {
                current.push(field.trim().to_string());
            } else if quotes_balanced(trimmed) {
                current.push(unquote_cell(trimmed));
            } else {
                open_cell = Some(trimmed.to_string());
            }
        }

        if open_cell.is_none() {
            rows.push(std::mem::take(&mut current));
        }
    }

    // 引号未闭合: 按原样收尾
    if let Some(pending) = open_cell {
        current.push(pending.trim().to_string());
    }
    if !current.is_empty() {
        rows.push(current);
    }

    rows.retain(|row| row.iter().any(|cell| !cell.is_empty()));
    rows
}

fn quotes_balanced(value: &str) -> bool {
    value.matches('"').count() % 2 == 0
}

/// 去掉外层引号，"" → "
fn unquote_cell(value: &str) -> String {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(trimmed);
    inner.replace("\"\"", "\"").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_validation_error() {
        let err = tokenize("  \n\n \t ").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("no input"));
    }

    #[test]
    fn test_tab_wins_over_pipe() {
        let result = tokenize("a|b\tc\nd\te").unwrap();
        assert_eq!(result.delimiter, Delimiter::Tab);
        assert_eq!(result.rows[0], vec!["a|b", "c"]);
    }

    #[test]
    fn test_pipe_over_whitespace() {
        let result = tokenize("| Тема | Заняття |\n|---|---|\n| Ethics  | Consent |").unwrap();
        assert_eq!(result.delimiter, Delimiter::Pipe);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1], vec!["Ethics", "Consent"]);
    }

    #[test]
    fn test_whitespace_soft_columns() {
        let text = "Назва теми    Заняття    Всього\nEthics        Заняття 1. Consent    2\n";
        let result = tokenize(text).unwrap();
        assert_eq!(result.delimiter, Delimiter::Whitespace);
        assert_eq!(result.rows[1], vec!["Ethics", "Заняття 1. Consent", "2"]);
    }

    #[test]
    fn test_whitespace_indented_line_keeps_empty_first_cell() {
        let result = tokenize("a    b\n      1) Why?").unwrap();
        assert_eq!(result.rows[1], vec!["", "1) Why?"]);
    }

    #[test]
    fn test_blank_lines_discarded() {
        let result = tokenize("a\tb\n\n\nc\td\n").unwrap();
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_quoted_multiline_tab_cell() {
        let text = "Ethics\t\"Заняття 1. Consent\n1) Why consent matters?\"\t2\nNext\tx\t1";
        let result = tokenize(text).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(
            result.rows[0],
            vec!["Ethics", "Заняття 1. Consent\n1) Why consent matters?", "2"]
        );
        assert_eq!(result.rows[1], vec!["Next", "x", "1"]);
    }

    #[test]
    fn test_escaped_quotes_in_tab_cell() {
        let result = tokenize("a\t\"say \"\"hi\"\"\"").unwrap();
        assert_eq!(result.rows[0], vec!["a", "say \"hi\""]);
    }
}
