// ==========================================
// 课程体系管理 - 行结构解析
// ==========================================
// 职责: 单元格网格 → CurriculumTopic[]
// 状态: 显式折叠累加器 ParseState（当前主题 = topics 最后一项）
// 红线: 纯函数，不访问数据库，只产生 Validation 错误
// ==========================================

use crate::domain::{ColumnRole, CurriculumLesson, CurriculumQuestion, CurriculumTopic};
use crate::importer::data_cleaner::{
    collapse_whitespace, extract_number, is_paren_numbered_line, normalize_key,
    split_lesson_keyword_ordinal, split_numbered_line, split_topic_ordinal,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{resolve_columns, ColumnMap};
use crate::importer::rules::ImportRules;
use crate::importer::tokenizer::tokenize;
use tracing::{debug, info, warn};

/// 解析粘贴文本（内置规则）
pub fn parse(text: &str) -> ImportResult<Vec<CurriculumTopic>> {
    parse_with_rules(text, &ImportRules::default())
}

/// 解析粘贴文本（指定规则）
pub fn parse_with_rules(text: &str, rules: &ImportRules) -> ImportResult<Vec<CurriculumTopic>> {
    let tokenized = tokenize(text)?;
    debug!(delimiter = ?tokenized.delimiter, rows = tokenized.rows.len(), "分词完成");
    parse_grid(
        &tokenized.rows,
        rules,
        tokenized.delimiter.splits_multiline_cells(),
    )
}

/// 解析单元格网格（文件来源: 多行单元格保持完整，不做续行合并）
///
/// # 返回
/// - Err(Validation): 找不到表头、缺少必需列或课次序号越界
pub fn parse_rows(rows: &[Vec<String>], rules: &ImportRules) -> ImportResult<Vec<CurriculumTopic>> {
    parse_grid(rows, rules, false)
}

fn parse_grid(
    rows: &[Vec<String>],
    rules: &ImportRules,
    merge_continuations: bool,
) -> ImportResult<Vec<CurriculumTopic>> {
    let columns = resolve_columns(rows, rules)?;

    let state = rows
        .iter()
        .skip(columns.header_row + 1)
        .try_fold(ParseState::new(merge_continuations), |state, row| {
            state.step(row, &columns, rules)
        })?;

    if state.orphan_lessons > 0 {
        warn!(count = state.orphan_lessons, "主题出现之前的课次已丢弃");
    }
    info!(
        topics = state.topics.len(),
        lessons = state.topics.iter().map(|t| t.lessons.len()).sum::<usize>(),
        "课程文本解析完成"
    );

    Ok(state.topics)
}

// ==========================================
// 折叠状态
// ==========================================

#[derive(Debug)]
struct ParseState {
    topics: Vec<CurriculumTopic>,
    /// 当前主题内下一个自动课次序号（u64: 显式序号 u32::MAX 之后不回绕）
    next_lesson_number: u64,
    /// 最近一个课次是否以 "Заняття N" 关键字形式引入
    last_lesson_keyword_form: bool,
    /// 仅空白/竖线分隔的粘贴需要把续行并回上一课次
    merge_continuations: bool,
    orphan_lessons: usize,
}

/// 一行中的课时值
#[derive(Debug, Default, Clone, Copy)]
struct RowHours {
    total: Option<f64>,
    classroom: Option<f64>,
    self_study: Option<f64>,
}

impl RowHours {
    fn read(row: &[String], columns: &ColumnMap) -> Self {
        let number = |role| columns.cell(row, role).and_then(extract_number);
        Self {
            total: number(ColumnRole::TotalHours),
            classroom: number(ColumnRole::ClassroomHours),
            self_study: number(ColumnRole::SelfStudyHours),
        }
    }

    fn is_empty(&self) -> bool {
        self.total.is_none() && self.classroom.is_none() && self.self_study.is_none()
    }

    /// 总课时缺失且两项分课时齐全时推导
    fn resolved_total(&self) -> Option<f64> {
        match (self.total, self.classroom, self.self_study) {
            (Some(total), _, _) => Some(total),
            (None, Some(classroom), Some(self_study)) => Some(classroom + self_study),
            _ => None,
        }
    }
}

impl ParseState {
    fn new(merge_continuations: bool) -> Self {
        Self {
            topics: Vec::new(),
            next_lesson_number: 1,
            last_lesson_keyword_form: false,
            merge_continuations,
            orphan_lessons: 0,
        }
    }

    fn step(
        mut self,
        row: &[String],
        columns: &ColumnMap,
        rules: &ImportRules,
    ) -> ImportResult<Self> {
        let first_cell = row.iter().map(|c| c.trim()).find(|c| !c.is_empty());
        let Some(first_cell) = first_cell else {
            return Ok(self);
        };
        if rules.is_summary_text(&normalize_key(first_cell)) {
            debug!(row = %first_cell, "跳过汇总行");
            return Ok(self);
        }

        let topic_cell = columns.cell(row, ColumnRole::Topic);
        let lesson_cell = columns.cell(row, ColumnRole::Lesson);
        let questions_cell = columns.cell(row, ColumnRole::Questions);
        let hours = RowHours::read(row, columns);

        if topic_cell.is_none() && hours.is_empty() {
            if let Some(cell) = lesson_cell {
                if self.is_continuation(cell) {
                    let questions = question_lines(cell.lines().chain(lines_of(questions_cell)));
                    if let Some(lesson) = self.current_lesson_mut() {
                        debug!(count = questions.len(), "续行问题并入上一课次");
                        lesson.questions.extend(questions);
                    }
                    return Ok(self);
                }
            }
        }

        if let Some(cell) = topic_cell {
            self.start_topic(cell);
        }

        if let Some(cell) = lesson_cell {
            if self.topics.is_empty() {
                warn!(lesson = %first_line(cell), "课次出现在任何主题之前，已丢弃");
                self.orphan_lessons += 1;
            } else {
                self.push_lesson(cell, questions_cell, hours, rules)?;
            }
        }

        Ok(self)
    }

    fn start_topic(&mut self, cell: &str) {
        let text = collapse_whitespace(cell);
        let (number, title) = match split_topic_ordinal(&text) {
            Some((number, title)) if !title.is_empty() => (Some(number), title),
            _ => (None, text),
        };
        self.topics.push(CurriculumTopic {
            number,
            title,
            lessons: Vec::new(),
        });
        self.next_lesson_number = 1;
        self.last_lesson_keyword_form = false;
    }

    fn push_lesson(
        &mut self,
        cell: &str,
        questions_cell: Option<&str>,
        hours: RowHours,
        rules: &ImportRules,
    ) -> ImportResult<()> {
        let header = first_line(cell);
        let (explicit, title, keyword_form) = split_lesson_header(&header);

        let number = match explicit {
            Some(n) => n,
            None => u32::try_from(self.next_lesson_number).map_err(|_| {
                ImportError::validation(format!("课次自动序号超出范围: {}", header))
            })?,
        };
        self.next_lesson_number = u64::from(number) + 1;
        self.last_lesson_keyword_form = keyword_form;

        let inline = cell.lines().skip(1);
        let lesson = CurriculumLesson {
            number: Some(number),
            explicit_number: explicit.is_some(),
            title,
            lesson_type: rules.detect_lesson_type(&header).map(str::to_string),
            total_hours: hours.resolved_total(),
            classroom_hours: hours.classroom,
            self_study_hours: hours.self_study,
            questions: question_lines(inline.chain(lines_of(questions_cell))),
        };

        if let Some(topic) = self.topics.last_mut() {
            topic.lessons.push(lesson);
        }
        Ok(())
    }

    fn is_continuation(&self, cell: &str) -> bool {
        self.merge_continuations
            && self.last_lesson_keyword_form
            && self.has_current_lesson()
            && is_paren_numbered_line(&first_line(cell))
    }

    fn has_current_lesson(&self) -> bool {
        self.topics.last().is_some_and(|t| !t.lessons.is_empty())
    }

    fn current_lesson_mut(&mut self) -> Option<&mut CurriculumLesson> {
        self.topics.last_mut().and_then(|t| t.lessons.last_mut())
    }
}

// ==========================================
// 单元格级解析
// ==========================================

fn first_line(cell: &str) -> String {
    cell.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(collapse_whitespace)
        .unwrap_or_default()
}

fn lines_of(cell: Option<&str>) -> std::str::Lines<'_> {
    cell.unwrap_or_default().lines()
}

/// 课次首行 → (显式序号, 标题, 是否关键字形式)
fn split_lesson_header(header: &str) -> (Option<u32>, String, bool) {
    if let Some((number, title)) = split_lesson_keyword_ordinal(header) {
        let title = if title.is_empty() {
            header.to_string()
        } else {
            title
        };
        return (Some(number), title, true);
    }
    if let Some((number, title)) = split_numbered_line(header) {
        return (Some(number), title, false);
    }
    (None, header.to_string(), false)
}

/// 问题行: "<N>) 文本" / "<N>. 文本"，其余行丢弃
fn question_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<CurriculumQuestion> {
    lines
        .filter_map(split_numbered_line)
        .map(|(number, content)| CurriculumQuestion {
            number: Some(number),
            content: collapse_whitespace(&content),
        })
        .filter(|q| !q.content.is_empty())
        .collect()
}
