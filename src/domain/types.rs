// ==========================================
// 课程体系管理 - 领域类型定义
// ==========================================
// 职责: 导入器与仓储层共享的枚举/常量
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 列角色 (Column Role)
// ==========================================
// 表头单元格 → 语义列
// 声明顺序即匹配优先级: 主题 → 课次 → 总学时 → 课堂学时 → 自学学时 → 问题
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    Topic,          // 主题名称（必需）
    Lesson,         // 课次（必需，多行单元格）
    TotalHours,     // 总学时
    ClassroomHours, // 课堂学时
    SelfStudyHours, // 自学学时
    Questions,      // 问题列
}

impl ColumnRole {
    /// 是否为必需列
    pub fn is_mandatory(&self) -> bool {
        matches!(self, ColumnRole::Topic | ColumnRole::Lesson)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Topic => write!(f, "TOPIC"),
            ColumnRole::Lesson => write!(f, "LESSON"),
            ColumnRole::TotalHours => write!(f, "TOTAL_HOURS"),
            ColumnRole::ClassroomHours => write!(f, "CLASSROOM_HOURS"),
            ColumnRole::SelfStudyHours => write!(f, "SELF_STUDY_HOURS"),
            ColumnRole::Questions => write!(f, "QUESTIONS"),
        }
    }
}

// ==========================================
// 有序关联 (Ordered Link)
// ==========================================
// 父子关联表，每条关联带 order_index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderedLink {
    ProgramDiscipline, // 培养方案 → 学科
    DisciplineTopic,   // 学科 → 主题
    TopicLesson,       // 主题 → 课次
    LessonQuestion,    // 课次 → 问题
}

impl OrderedLink {
    /// (表名, 父列, 子列)
    pub fn table_columns(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            OrderedLink::ProgramDiscipline => ("program_discipline", "program_id", "discipline_id"),
            OrderedLink::DisciplineTopic => ("discipline_topic", "discipline_id", "topic_id"),
            OrderedLink::TopicLesson => ("topic_lesson", "topic_id", "lesson_id"),
            OrderedLink::LessonQuestion => ("lesson_question", "lesson_id", "question_id"),
        }
    }
}

impl fmt::Display for OrderedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_columns().0)
    }
}

// ==========================================
// 问题难度
// ==========================================
// 大纲导入不携带难度，统一取最低级
pub const MIN_DIFFICULTY: i32 = 1;
pub const MAX_DIFFICULTY: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_role_mandatory() {
        assert!(ColumnRole::Topic.is_mandatory());
        assert!(ColumnRole::Lesson.is_mandatory());
        assert!(!ColumnRole::Questions.is_mandatory());
    }

    #[test]
    fn test_column_role_serde_format() {
        let json = serde_json::to_string(&ColumnRole::SelfStudyHours).unwrap();
        assert_eq!(json, "\"SELF_STUDY_HOURS\"");
        assert_eq!(ColumnRole::SelfStudyHours.to_string(), "SELF_STUDY_HOURS");
    }

    #[test]
    fn test_ordered_link_table_columns() {
        assert_eq!(
            OrderedLink::TopicLesson.table_columns(),
            ("topic_lesson", "topic_id", "lesson_id")
        );
    }
}
