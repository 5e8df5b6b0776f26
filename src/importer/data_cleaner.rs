// ==========================================
// 课程体系管理 - 文本清洗
// ==========================================
// 职责: TRIM / 空白折叠 / 规范化键 / 宽容数值提取 / 序号拆分
// 纯函数，不访问数据库
// ==========================================

use regex::Regex;
use std::sync::LazyLock;

/// 单元格中的第一个十进制数（逗号可作小数点）
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("Invalid number regex"));

/// "<N>) 文本" / "<N>. 文本"（点号后须有空白，避免把 "1.5" 当作序号）
static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?:\)|\.\s)\s*(.+?)\s*$").expect("Invalid numbered line regex")
});

/// "<N>) 文本"（仅括号形式）
static PAREN_NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*\)\s*(.+?)\s*$").expect("Invalid numbered line regex"));

/// "Заняття <N>. 标题" / "Lesson <N>: 标题"（关键字形式）
static KEYWORD_ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:заняття|занятие|урок|lesson)\s*№?\s*(\d+)\s*[.:)\-–—]?\s*(.*?)\s*$")
        .expect("Invalid lesson ordinal regex")
});

/// "Тема <N>. 标题" / "Topic <N>: 标题"
static TOPIC_KEYWORD_ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:тема|розділ|topic)\s*№?\s*(\d+)\s*[.:)\-–—]?\s*(.*?)\s*$")
        .expect("Invalid topic ordinal regex")
});

/// 折叠连续空白为单个空格并去除首尾空白
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 规范化键: 小写 + 空白折叠
///
/// 用于学科/主题/课次/问题的合并匹配
pub fn normalize_key(value: &str) -> String {
    collapse_whitespace(&value.to_lowercase())
}

/// 标准化 NULL 值（空字符串/空白 → None）
pub fn normalize_null(value: Option<&str>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 宽容数值提取: 取文本中第一个十进制数，忽略单位/说明文字
///
/// # 示例
/// - "2" → 2.0
/// - "1,5 год." → 1.5
/// - "—" → None
pub fn extract_number(value: &str) -> Option<f64> {
    FIRST_NUMBER
        .find(value)
        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
}

/// 拆分 "<N>) 文本" / "<N>. 文本"
pub fn split_numbered_line(line: &str) -> Option<(u32, String)> {
    let caps = NUMBERED_LINE.captures(line)?;
    let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let text = caps.get(2)?.as_str().trim().to_string();
    Some((number, text))
}

/// 是否为 "<N>) 文本" 形式（续行问题判定）
pub fn is_paren_numbered_line(line: &str) -> bool {
    PAREN_NUMBERED_LINE.is_match(line)
}

/// 拆分课次关键字序号，返回 (序号, 标题)；标题可能为空
pub fn split_lesson_keyword_ordinal(line: &str) -> Option<(u32, String)> {
    let caps = KEYWORD_ORDINAL.captures(line)?;
    let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let title = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
    Some((number, title))
}

/// 拆分主题序号（关键字形式或编号形式），返回 (序号, 标题)
pub fn split_topic_ordinal(line: &str) -> Option<(u32, String)> {
    if let Some(caps) = TOPIC_KEYWORD_ORDINAL.captures(line) {
        let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
        let title = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
        return Some((number, title));
    }
    split_numbered_line(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Вступ   до\tЕтики "), "вступ до етики");
        assert_eq!(normalize_key("CONSENT"), normalize_key("consent"));
    }

    #[test]
    fn test_normalize_null() {
        assert_eq!(normalize_null(Some("  ")), None);
        assert_eq!(normalize_null(Some(" a ")), Some("a".to_string()));
        assert_eq!(normalize_null(None), None);
    }

    #[test]
    fn test_extract_number_tolerant() {
        assert_eq!(extract_number("2"), Some(2.0));
        assert_eq!(extract_number("1,5 год."), Some(1.5));
        assert_eq!(extract_number("всього: 4.25"), Some(4.25));
        assert_eq!(extract_number("—"), None);
        assert_eq!(extract_number(""), None);
    }

    #[test]
    fn test_split_numbered_line() {
        assert_eq!(
            split_numbered_line("1) Why consent matters?"),
            Some((1, "Why consent matters?".to_string()))
        );
        assert_eq!(
            split_numbered_line(" 12.  Поняття згоди "),
            Some((12, "Поняття згоди".to_string()))
        );
        assert_eq!(split_numbered_line("Без номера"), None);
        assert_eq!(split_numbered_line("1.5"), None);
    }

    #[test]
    fn test_split_lesson_keyword_ordinal() {
        assert_eq!(
            split_lesson_keyword_ordinal("Заняття 1. Consent"),
            Some((1, "Consent".to_string()))
        );
        assert_eq!(
            split_lesson_keyword_ordinal("lesson №3: Ethics of care"),
            Some((3, "Ethics of care".to_string()))
        );
        assert_eq!(split_lesson_keyword_ordinal("Заняття 4"), Some((4, String::new())));
        assert_eq!(split_lesson_keyword_ordinal("1) Consent"), None);
    }

    #[test]
    fn test_split_topic_ordinal() {
        assert_eq!(
            split_topic_ordinal("Тема 2. Біоетика"),
            Some((2, "Біоетика".to_string()))
        );
        assert_eq!(split_topic_ordinal("3. Право"), Some((3, "Право".to_string())));
        assert_eq!(split_topic_ordinal("Ethics"), None);
    }

    #[test]
    fn test_paren_numbered_line() {
        assert!(is_paren_numbered_line("1) Why?"));
        assert!(!is_paren_numbered_line("1. Why?"));
    }
}
