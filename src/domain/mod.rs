// ==========================================
// 课程体系管理 - 领域模型层
// ==========================================
// 职责: 定义领域实体、导入中间结构、共享类型
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod curriculum;
pub mod types;

// 重导出核心类型
pub use curriculum::{
    CurriculumLesson, CurriculumQuestion, CurriculumTopic, Discipline, ImportBatch, Lesson,
    LessonGapFill, LessonNode, LessonType, NewLesson, Program, Question, Topic, TopicLessonRecord,
    TopicNode,
};
pub use types::{ColumnRole, OrderedLink, MAX_DIFFICULTY, MIN_DIFFICULTY};
