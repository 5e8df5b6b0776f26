// ==========================================
// 课程体系管理 - 导入所需数据访问 Trait
// ==========================================
// 职责: 定义导入器消费的持久化操作（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD + 有序关联
// 约束: 所有操作必须能在同一事务内调用
// ==========================================

use crate::domain::{
    Discipline, ImportBatch, LessonGapFill, LessonType, NewLesson, OrderedLink, Topic,
    TopicLessonRecord,
};
use crate::repository::error::RepositoryResult;

// ==========================================
// CurriculumStore Trait
// ==========================================
// 用途: 导入对账引擎的持久化接口
// 实现者: SqliteCurriculumStore（借用一个 rusqlite 事务）
pub trait CurriculumStore {
    // ===== 培养方案 / 学科 =====

    /// 培养方案是否存在
    fn program_exists(&self, program_id: i64) -> RepositoryResult<bool>;

    /// 按 ID 查询学科
    ///
    /// # 返回
    /// - Ok(Some(Discipline)): 找到
    /// - Ok(None): 未找到
    fn find_discipline(&self, discipline_id: i64) -> RepositoryResult<Option<Discipline>>;

    /// 查询方案下已关联的学科（按 order_index 排序）
    fn disciplines_for_program(&self, program_id: i64) -> RepositoryResult<Vec<Discipline>>;

    /// 创建学科
    ///
    /// # 参数
    /// - name: 学科名称
    /// - description: 描述（可选）
    /// - position: 同级位置
    ///
    /// # 返回
    /// - Ok(i64): 新学科 ID
    fn create_discipline(
        &self,
        name: &str,
        description: Option<&str>,
        position: i64,
    ) -> RepositoryResult<i64>;

    fn link_discipline_to_program(
        &self,
        program_id: i64,
        discipline_id: i64,
        order_index: i64,
    ) -> RepositoryResult<()> {
        self.link_child(OrderedLink::ProgramDiscipline, program_id, discipline_id, order_index)
    }

    // ===== 有序关联 =====

    /// 父子是否已关联
    fn is_linked(&self, link: OrderedLink, parent_id: i64, child_id: i64) -> RepositoryResult<bool>;

    /// 在 order_index 位置建立父子关联
    fn link_child(
        &self,
        link: OrderedLink,
        parent_id: i64,
        child_id: i64,
        order_index: i64,
    ) -> RepositoryResult<()>;

    /// 父节点下当前最大 order_index（无子节点时为 0）
    fn max_order_index(&self, link: OrderedLink, parent_id: i64) -> RepositoryResult<i64>;

    /// 父节点下下一个可用 order_index
    fn next_order_index(&self, link: OrderedLink, parent_id: i64) -> RepositoryResult<i64> {
        Ok(self.max_order_index(link, parent_id)? + 1)
    }

    // ===== 课次类型 =====

    fn list_lesson_types(&self) -> RepositoryResult<Vec<LessonType>>;

    fn create_lesson_type(&self, name: &str) -> RepositoryResult<i64>;

    // ===== 主题 =====

    /// 学科下已有主题（含当前字段值）
    fn topics_for_discipline(&self, discipline_id: i64) -> RepositoryResult<Vec<Topic>>;

    fn create_topic(
        &self,
        title: &str,
        description: Option<&str>,
        position: i64,
    ) -> RepositoryResult<i64>;

    fn link_topic_to_discipline(
        &self,
        discipline_id: i64,
        topic_id: i64,
        order_index: i64,
    ) -> RepositoryResult<()> {
        self.link_child(OrderedLink::DisciplineTopic, discipline_id, topic_id, order_index)
    }

    // ===== 课次 =====

    /// 学科下所有主题的已有课次（含当前字段值与所属主题）
    fn lessons_for_discipline(&self, discipline_id: i64) -> RepositoryResult<Vec<TopicLessonRecord>>;

    fn create_lesson(&self, lesson: &NewLesson) -> RepositoryResult<i64>;

    /// 补缺更新：只写入 patch 中为 Some 的字段
    fn update_lesson_gaps(&self, lesson_id: i64, patch: &LessonGapFill) -> RepositoryResult<()>;

    fn link_lesson_to_topic(
        &self,
        topic_id: i64,
        lesson_id: i64,
        order_index: i64,
    ) -> RepositoryResult<()> {
        self.link_child(OrderedLink::TopicLesson, topic_id, lesson_id, order_index)
    }

    // ===== 问题 =====

    /// 课次下已关联问题的内容
    fn question_contents_for_lesson(&self, lesson_id: i64) -> RepositoryResult<Vec<String>>;

    fn create_question(
        &self,
        content: &str,
        answer: Option<&str>,
        difficulty: i32,
    ) -> RepositoryResult<i64>;

    fn link_question_to_lesson(
        &self,
        lesson_id: i64,
        question_id: i64,
        order_index: i64,
    ) -> RepositoryResult<()> {
        self.link_child(OrderedLink::LessonQuestion, lesson_id, question_id, order_index)
    }

    // ===== 审计 =====

    fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;
}
