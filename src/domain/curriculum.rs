// ==========================================
// 课程体系管理 - 课程领域模型
// ==========================================
// 层级: 培养方案 → 学科 → 主题 → 课次 → 问题
// 持久化实体由仓储层管理，导入器只通过 CurriculumStore 读写
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// 持久化实体
// ==========================================

/// 培养方案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
}

/// 学科（合并键: 方案内规范化名称）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discipline {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub position: i64,
}

/// 主题（合并键: 学科内规范化标题）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub position: i64,
}

/// 课次（合并键: (所属主题, 规范化标题)）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub lesson_type_id: Option<i64>,
    pub total_hours: Option<f64>,
    pub classroom_hours: Option<f64>,
    pub self_study_hours: Option<f64>,
}

/// 学科下已有课次（带所属主题）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicLessonRecord {
    pub topic_id: i64,
    pub lesson: Lesson,
}

/// 新建课次的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLesson {
    pub title: String,
    pub lesson_type_id: Option<i64>,
    pub total_hours: Option<f64>,
    pub classroom_hours: Option<f64>,
    pub self_study_hours: Option<f64>,
}

/// 补缺更新：仅包含需要写入的字段（None = 不动）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonGapFill {
    pub lesson_type_id: Option<i64>,
    pub total_hours: Option<f64>,
    pub classroom_hours: Option<f64>,
    pub self_study_hours: Option<f64>,
}

impl LessonGapFill {
    pub fn is_empty(&self) -> bool {
        self.lesson_type_id.is_none()
            && self.total_hours.is_none()
            && self.classroom_hours.is_none()
            && self.self_study_hours.is_none()
    }
}

/// 问题（合并键: (所属课次, 规范化内容)，重复跳过不更新）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub content: String,
    pub answer: Option<String>,
    pub difficulty: i32,
}

/// 课次类型（受控词表，按名称精确识别）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonType {
    pub id: i64,
    pub name: String,
}

/// 导入批次（审计记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub program_id: i64,
    pub discipline_id: i64,
    pub topics_added: usize,
    pub lessons_added: usize,
    pub questions_added: usize,
    pub lessons_updated: usize,
    pub source_rows: usize,
    pub imported_at: DateTime<Utc>,
}

// ==========================================
// 导入中间结构（仅在一次导入调用内存在）
// ==========================================

/// 解析出的主题
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumTopic {
    pub number: Option<u32>,
    pub title: String,
    pub lessons: Vec<CurriculumLesson>,
}

/// 解析出的课次
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumLesson {
    /// 显式序号或主题内自动计数值
    pub number: Option<u32>,
    /// number 是否来自文本中的显式序号（自动计数的课次落库时接在已有课次之后）
    #[serde(default)]
    pub explicit_number: bool,
    pub title: String,
    pub lesson_type: Option<String>,
    pub total_hours: Option<f64>,
    pub classroom_hours: Option<f64>,
    pub self_study_hours: Option<f64>,
    pub questions: Vec<CurriculumQuestion>,
}

impl CurriculumLesson {
    /// 落库时强制使用的排序位置（仅显式序号）
    pub fn explicit_order(&self) -> Option<i64> {
        if self.explicit_number {
            self.number.map(i64::from)
        } else {
            None
        }
    }
}

/// 解析出的问题
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumQuestion {
    pub number: Option<u32>,
    pub content: String,
}

// ==========================================
// 读模型：学科树（CLI 展示 / 测试校验）
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonNode {
    pub order_index: i64,
    pub lesson: Lesson,
    pub lesson_type: Option<String>,
    pub questions: Vec<(i64, Question)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    pub order_index: i64,
    pub topic: Topic,
    pub lessons: Vec<LessonNode>,
}
