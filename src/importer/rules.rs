// ==========================================
// 课程体系管理 - 导入关键字规则表
// ==========================================
// 职责: 表头识别 / 列角色 / 汇总行 / 课次类型 的有序规则
// 规则: 自上而下求值，首个命中生效
// 存储: 内置默认值；可被 config_kv 中的 JSON 覆写（见 ConfigManager）
// ==========================================

use crate::domain::{ColumnRole, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::importer::data_cleaner::normalize_key;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 列角色规则: 表头单元格包含任一关键字即命中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub role: ColumnRole,
    pub keywords: Vec<String>,
}

/// 课次类型规则: 课次首行包含关键字即命中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonTypeRule {
    pub keyword: String,
    pub lesson_type: String,
}

/// 导入规则集
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportRules {
    /// 表头行须同时包含主题标记与课次标记
    pub topic_header_markers: Vec<String>,
    pub lesson_header_markers: Vec<String>,
    /// 列角色规则（顺序即优先级）
    pub column_rules: Vec<ColumnRule>,
    /// 汇总行标记（首个非空单元格以其开头）
    pub summary_markers: Vec<String>,
    /// 课次类型规则（更具体的短语在前）
    pub lesson_type_rules: Vec<LessonTypeRule>,
    /// 导入问题的难度
    pub default_question_difficulty: i32,
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn lesson_type_rule(keyword: &str, lesson_type: &str) -> LessonTypeRule {
    LessonTypeRule {
        keyword: keyword.to_string(),
        lesson_type: lesson_type.to_string(),
    }
}

impl Default for ImportRules {
    fn default() -> Self {
        Self {
            topic_header_markers: words(&["назва теми", "тема", "topic"]),
            lesson_header_markers: words(&["заняття", "lesson"]),
            column_rules: vec![
                ColumnRule {
                    role: ColumnRole::Topic,
                    keywords: words(&["назва теми", "тема", "topic"]),
                },
                ColumnRule {
                    role: ColumnRole::Lesson,
                    keywords: words(&["заняття", "lesson"]),
                },
                ColumnRule {
                    role: ColumnRole::TotalHours,
                    keywords: words(&["всього", "усього", "разом", "total", "altogether"]),
                },
                ColumnRule {
                    role: ColumnRole::ClassroomHours,
                    keywords: words(&[
                        "аудиторн", "лекці", "практичн", "classroom", "lecture", "practical",
                    ]),
                },
                ColumnRule {
                    role: ColumnRole::SelfStudyHours,
                    keywords: words(&["самостійн", "срс", "self-study", "self study"]),
                },
                ColumnRule {
                    role: ColumnRole::Questions,
                    keywords: words(&["питання", "questions"]),
                },
            ],
            summary_markers: words(&[
                "всього за темою",
                "усього за темою",
                "разом за темою",
                "total for topic",
                "всього:",
                "разом:",
            ]),
            lesson_type_rules: vec![
                lesson_type_rule("контрольне заняття", "Контрольне заняття"),
                lesson_type_rule("control class", "Контрольне заняття"),
                lesson_type_rule("групове заняття", "Групове заняття"),
                lesson_type_rule("group class", "Групове заняття"),
                lesson_type_rule("практичне", "Практичне заняття"),
                lesson_type_rule("practical", "Практичне заняття"),
                lesson_type_rule("семінар", "Семінар"),
                lesson_type_rule("seminar", "Семінар"),
                lesson_type_rule("лекці", "Лекція"),
                lesson_type_rule("lecture", "Лекція"),
            ],
            default_question_difficulty: MIN_DIFFICULTY,
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .map(|n| normalize_key(n))
        .any(|n| !n.is_empty() && haystack.contains(&n))
}

impl ImportRules {
    /// 整行文本（已规范化）是否为表头
    pub fn is_header_text(&self, normalized_row: &str) -> bool {
        contains_any(normalized_row, &self.topic_header_markers)
            && contains_any(normalized_row, &self.lesson_header_markers)
    }

    /// 为表头单元格匹配列角色
    ///
    /// 按规则顺序取第一个命中且尚未被占用的角色
    pub fn match_column_role(
        &self,
        normalized_cell: &str,
        taken: &HashSet<ColumnRole>,
    ) -> Option<ColumnRole> {
        self.column_rules
            .iter()
            .filter(|rule| !taken.contains(&rule.role))
            .find(|rule| contains_any(normalized_cell, &rule.keywords))
            .map(|rule| rule.role)
    }

    /// 首个非空单元格（已规范化）是否为汇总行标记开头
    pub fn is_summary_text(&self, normalized_first_cell: &str) -> bool {
        self.summary_markers
            .iter()
            .map(|m| normalize_key(m))
            .any(|m| !m.is_empty() && normalized_first_cell.starts_with(&m))
    }

    /// 识别课次类型，首个命中生效；未命中返回 None
    pub fn detect_lesson_type(&self, text: &str) -> Option<&str> {
        let normalized = normalize_key(text);
        self.lesson_type_rules
            .iter()
            .find(|rule| {
                let keyword = normalize_key(&rule.keyword);
                !keyword.is_empty() && normalized.contains(&keyword)
            })
            .map(|rule| rule.lesson_type.as_str())
    }

    /// 规则表引用的课次类型名称（去重，保持顺序）
    pub fn lesson_type_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.lesson_type_rules
            .iter()
            .map(|rule| rule.lesson_type.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// 规则集自检
    ///
    /// # 返回
    /// - Err(String): 第一处不合法的描述
    pub fn validate(&self) -> Result<(), String> {
        if self.topic_header_markers.is_empty() || self.lesson_header_markers.is_empty() {
            return Err("表头标记不能为空".to_string());
        }
        for role in [ColumnRole::Topic, ColumnRole::Lesson] {
            let has_keywords = self
                .column_rules
                .iter()
                .any(|rule| rule.role == role && !rule.keywords.is_empty());
            if !has_keywords {
                return Err(format!("必需列 {} 缺少关键字", role));
            }
        }
        if let Some(rule) = self
            .lesson_type_rules
            .iter()
            .find(|rule| rule.lesson_type.trim().is_empty())
        {
            return Err(format!("课次类型规则 '{}' 的类型名称为空", rule.keyword));
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.default_question_difficulty) {
            return Err(format!(
                "问题难度 {} 超出范围 [{}, {}]",
                self.default_question_difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY
            ));
        }
        Ok(())
    }
}
