// ==========================================
// 课程体系管理 - 导入对账引擎
// ==========================================
// 职责: CurriculumTopic[] → 持久化（合并已有数据）
// 流程: 解析学科 → 补齐课次类型 → 预加载索引 → 主题 → 课次 → 问题 → 批次审计
// 事务: 调用方提供的 store 借用同一事务；任一步失败整体回滚
// 合并策略: 规范化键匹配；课次补缺更新（不覆盖已有值）；问题重复跳过
// ==========================================

use crate::domain::{
    CurriculumLesson, CurriculumTopic, ImportBatch, Lesson, LessonGapFill, NewLesson,
    OrderedLink,
};
use crate::importer::data_cleaner::{normalize_key, normalize_null};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::rules::ImportRules;
use crate::repository::{CurriculumStore, RepositoryError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// 导入目标与结果
// ==========================================

/// 目标学科
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisciplineTarget {
    /// 已有学科 ID
    Existing(i64),
    /// 新建学科（同方案下规范化同名则复用）
    New {
        name: String,
        description: Option<String>,
    },
}

impl DisciplineTarget {
    /// 从界面输入构造: 学科 ID 优先，其次非空新名称
    ///
    /// # 返回
    /// - Err(Validation): 两者都没有
    pub fn from_ui(discipline_id: Option<i64>, new_name: Option<&str>) -> ImportResult<Self> {
        if let Some(id) = discipline_id {
            return Ok(DisciplineTarget::Existing(id));
        }
        match normalize_null(new_name) {
            Some(name) => Ok(DisciplineTarget::New {
                name,
                description: None,
            }),
            None => Err(ImportError::validation("未指定目标学科（学科 ID 或新学科名称）")),
        }
    }
}

/// 导入结果摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub topics_added: usize,
    pub lessons_added: usize,
    pub questions_added: usize,
    /// 补缺更新实际改动了字段的已有课次数
    pub lessons_updated: usize,
    pub discipline_id: i64,
    pub batch_id: String,
    pub dry_run: bool,
}

/// 写入前置校验（在打开事务之前调用）
///
/// # 返回
/// - Err(Validation): 主题列表为空或目标学科不合法
pub fn validate_request(topics: &[CurriculumTopic], target: &DisciplineTarget) -> ImportResult<()> {
    if topics.is_empty() {
        return Err(ImportError::validation("没有可导入的主题"));
    }
    if let DisciplineTarget::New { name, .. } = target {
        if name.trim().is_empty() {
            return Err(ImportError::validation("新学科名称不能为空"));
        }
    }
    Ok(())
}

/// 使用内置规则导入
pub fn import<S: CurriculumStore>(
    store: &S,
    program_id: i64,
    target: &DisciplineTarget,
    topics: &[CurriculumTopic],
) -> ImportResult<ImportSummary> {
    let rules = ImportRules::default();
    CurriculumImporter::new(store, &rules).import(program_id, target, topics)
}

// ==========================================
// ReconcileIndex - 单次导入内的查找缓存
// ==========================================

#[derive(Debug, Default)]
struct ReconcileIndex {
    /// 规范化标题 → 主题 ID
    topics: HashMap<String, i64>,
    /// (主题 ID, 规范化标题) → 课次当前值
    lessons: HashMap<(i64, String), Lesson>,
    /// 课次类型名称 → ID
    lesson_types: HashMap<String, i64>,
}

impl ReconcileIndex {
    fn load<S: CurriculumStore>(store: &S, discipline_id: i64) -> ImportResult<Self> {
        let topics = store
            .topics_for_discipline(discipline_id)?
            .into_iter()
            .map(|topic| (normalize_key(&topic.title), topic.id))
            .collect();
        let lessons = store
            .lessons_for_discipline(discipline_id)?
            .into_iter()
            .map(|record| ((record.topic_id, normalize_key(&record.lesson.title)), record.lesson))
            .collect();
        let lesson_types = store
            .list_lesson_types()?
            .into_iter()
            .map(|lt| (lt.name, lt.id))
            .collect();

        Ok(Self {
            topics,
            lessons,
            lesson_types,
        })
    }

    /// 课次类型 ID（缺失时创建）
    fn lesson_type_id<S: CurriculumStore>(&mut self, store: &S, name: &str) -> ImportResult<i64> {
        if let Some(id) = self.lesson_types.get(name) {
            return Ok(*id);
        }
        let id = store.create_lesson_type(name)?;
        debug!(lesson_type = %name, id, "创建课次类型");
        self.lesson_types.insert(name.to_string(), id);
        Ok(id)
    }
}

// ==========================================
// CurriculumImporter - 对账引擎
// ==========================================

pub struct CurriculumImporter<'a, S: CurriculumStore> {
    store: &'a S,
    rules: &'a ImportRules,
}

#[derive(Debug, Default)]
struct Counters {
    topics_added: usize,
    lessons_added: usize,
    questions_added: usize,
    lessons_updated: usize,
}

impl<'a, S: CurriculumStore> CurriculumImporter<'a, S> {
    pub fn new(store: &'a S, rules: &'a ImportRules) -> Self {
        Self { store, rules }
    }

    /// 执行导入
    ///
    /// # 参数
    /// - program_id: 目标培养方案
    /// - target: 目标学科
    /// - topics: 解析结果
    ///
    /// # 返回
    /// - Ok(ImportSummary): 新增/更新计数
    /// - Err(Validation): 前置校验失败（未写入任何数据）
    /// - Err(Persistence): 写入失败（调用方回滚事务）
    #[instrument(skip(self, target, topics), fields(topics = topics.len(), batch_id))]
    pub fn import(
        &self,
        program_id: i64,
        target: &DisciplineTarget,
        topics: &[CurriculumTopic],
    ) -> ImportResult<ImportSummary> {
        validate_request(topics, target)?;

        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(program_id, "开始导入课程结构");

        // === 步骤 1: 解析学科 ===
        let discipline_id = self.resolve_discipline(program_id, target)?;

        // === 步骤 2: 补齐课次类型 ===
        let mut index = ReconcileIndex::load(self.store, discipline_id)?;
        for name in self.rules.lesson_type_names() {
            index.lesson_type_id(self.store, name)?;
        }

        // === 步骤 3-6: 主题 / 课次 / 问题 ===
        let mut counters = Counters::default();
        for (position, topic) in topics.iter().enumerate() {
            let topic_id =
                self.reconcile_topic(&mut index, &mut counters, discipline_id, position, topic)?;

            let mut running = self.store.next_order_index(OrderedLink::TopicLesson, topic_id)?;
            for lesson in &topic.lessons {
                let lesson_id =
                    self.reconcile_lesson(&mut index, &mut counters, topic_id, &mut running, lesson)?;
                self.reconcile_questions(&mut counters, lesson_id, lesson)?;
            }
        }

        // === 步骤 7: 批次审计 ===
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            program_id,
            discipline_id,
            topics_added: counters.topics_added,
            lessons_added: counters.lessons_added,
            questions_added: counters.questions_added,
            lessons_updated: counters.lessons_updated,
            source_rows: topics.iter().map(|t| t.lessons.len()).sum(),
            imported_at: Utc::now(),
        };
        self.store.insert_import_batch(&batch)?;

        info!(
            discipline_id,
            topics_added = counters.topics_added,
            lessons_added = counters.lessons_added,
            questions_added = counters.questions_added,
            lessons_updated = counters.lessons_updated,
            "课程结构导入完成"
        );

        Ok(ImportSummary {
            topics_added: counters.topics_added,
            lessons_added: counters.lessons_added,
            questions_added: counters.questions_added,
            lessons_updated: counters.lessons_updated,
            discipline_id,
            batch_id,
            dry_run: false,
        })
    }

    fn resolve_discipline(&self, program_id: i64, target: &DisciplineTarget) -> ImportResult<i64> {
        if !self.store.program_exists(program_id)? {
            return Err(RepositoryError::not_found("Program", program_id).into());
        }

        let discipline_id = match target {
            DisciplineTarget::Existing(id) => self
                .store
                .find_discipline(*id)?
                .map(|d| d.id)
                .ok_or_else(|| RepositoryError::not_found("Discipline", id))?,
            DisciplineTarget::New { name, description } => {
                let key = normalize_key(name);
                let existing = self
                    .store
                    .disciplines_for_program(program_id)?
                    .into_iter()
                    .find(|d| normalize_key(&d.name) == key);
                match existing {
                    Some(discipline) => {
                        debug!(discipline_id = discipline.id, "复用同名学科");
                        discipline.id
                    }
                    None => {
                        let position = self
                            .store
                            .next_order_index(OrderedLink::ProgramDiscipline, program_id)?;
                        let id = self.store.create_discipline(
                            name.trim(),
                            description.as_deref(),
                            position,
                        )?;
                        info!(discipline_id = id, name = %name.trim(), "创建学科");
                        id
                    }
                }
            }
        };

        if !self
            .store
            .is_linked(OrderedLink::ProgramDiscipline, program_id, discipline_id)?
        {
            let order = self
                .store
                .next_order_index(OrderedLink::ProgramDiscipline, program_id)?;
            self.store
                .link_discipline_to_program(program_id, discipline_id, order)?;
        }

        Ok(discipline_id)
    }

    fn reconcile_topic(
        &self,
        index: &mut ReconcileIndex,
        counters: &mut Counters,
        discipline_id: i64,
        position: usize,
        topic: &CurriculumTopic,
    ) -> ImportResult<i64> {
        let key = normalize_key(&topic.title);
        if let Some(id) = index.topics.get(&key) {
            return Ok(*id);
        }

        let topic_id = self
            .store
            .create_topic(topic.title.trim(), None, position as i64 + 1)?;
        let order = self
            .store
            .next_order_index(OrderedLink::DisciplineTopic, discipline_id)?;
        self.store
            .link_topic_to_discipline(discipline_id, topic_id, order)?;

        debug!(topic_id, title = %topic.title, order, "新增主题");
        index.topics.insert(key, topic_id);
        counters.topics_added += 1;
        Ok(topic_id)
    }

    fn reconcile_lesson(
        &self,
        index: &mut ReconcileIndex,
        counters: &mut Counters,
        topic_id: i64,
        running: &mut i64,
        lesson: &CurriculumLesson,
    ) -> ImportResult<i64> {
        let lesson_type_id = match lesson.lesson_type.as_deref() {
            Some(name) => Some(index.lesson_type_id(self.store, name)?),
            None => None,
        };
        let key = (topic_id, normalize_key(&lesson.title));

        if let Some(existing) = index.lessons.get_mut(&key) {
            let patch = gap_fill(existing, lesson, lesson_type_id);
            if !patch.is_empty() {
                self.store.update_lesson_gaps(existing.id, &patch)?;
                apply_gap_fill(existing, &patch);
                counters.lessons_updated += 1;
                debug!(lesson_id = existing.id, "课次补缺更新");
            }
            return Ok(existing.id);
        }

        let new_lesson = NewLesson {
            title: lesson.title.trim().to_string(),
            lesson_type_id,
            total_hours: lesson.total_hours,
            classroom_hours: lesson.classroom_hours,
            self_study_hours: lesson.self_study_hours,
        };
        let lesson_id = self.store.create_lesson(&new_lesson)?;
        let order = lesson.explicit_order().unwrap_or(*running);
        self.store.link_lesson_to_topic(topic_id, lesson_id, order)?;
        *running = (*running).max(order + 1);

        debug!(lesson_id, title = %lesson.title, order, "新增课次");
        index.lessons.insert(
            key,
            Lesson {
                id: lesson_id,
                title: new_lesson.title,
                lesson_type_id: new_lesson.lesson_type_id,
                total_hours: new_lesson.total_hours,
                classroom_hours: new_lesson.classroom_hours,
                self_study_hours: new_lesson.self_study_hours,
            },
        );
        counters.lessons_added += 1;
        Ok(lesson_id)
    }

    fn reconcile_questions(
        &self,
        counters: &mut Counters,
        lesson_id: i64,
        lesson: &CurriculumLesson,
    ) -> ImportResult<()> {
        if lesson.questions.is_empty() {
            return Ok(());
        }

        let mut seen: HashSet<String> = self
            .store
            .question_contents_for_lesson(lesson_id)?
            .iter()
            .map(|content| normalize_key(content))
            .collect();
        let mut running = self
            .store
            .max_order_index(OrderedLink::LessonQuestion, lesson_id)?;

        for question in &lesson.questions {
            let key = normalize_key(&question.content);
            if key.is_empty() || !seen.insert(key) {
                continue;
            }

            let question_id = self.store.create_question(
                question.content.trim(),
                None,
                self.rules.default_question_difficulty,
            )?;
            let order = question.number.map(i64::from).unwrap_or(running + 1);
            self.store
                .link_question_to_lesson(lesson_id, question_id, order)?;
            running = running.max(order);
            counters.questions_added += 1;
        }

        Ok(())
    }
}

// ==========================================
// 补缺更新
// ==========================================

fn is_blank_hours(value: Option<f64>) -> bool {
    value.map_or(true, |v| v == 0.0)
}

/// 仅当已存值为空/0 且解析值不同时写入
fn gap_hours(stored: Option<f64>, parsed: Option<f64>) -> Option<f64> {
    match parsed {
        Some(value) if is_blank_hours(stored) && stored != Some(value) => Some(value),
        _ => None,
    }
}

fn gap_fill(
    stored: &Lesson,
    parsed: &CurriculumLesson,
    lesson_type_id: Option<i64>,
) -> LessonGapFill {
    LessonGapFill {
        lesson_type_id: match stored.lesson_type_id {
            None => lesson_type_id,
            Some(_) => None,
        },
        total_hours: gap_hours(stored.total_hours, parsed.total_hours),
        classroom_hours: gap_hours(stored.classroom_hours, parsed.classroom_hours),
        self_study_hours: gap_hours(stored.self_study_hours, parsed.self_study_hours),
    }
}

fn apply_gap_fill(lesson: &mut Lesson, patch: &LessonGapFill) {
    if patch.lesson_type_id.is_some() {
        lesson.lesson_type_id = patch.lesson_type_id;
    }
    if patch.total_hours.is_some() {
        lesson.total_hours = patch.total_hours;
    }
    if patch.classroom_hours.is_some() {
        lesson.classroom_hours = patch.classroom_hours;
    }
    if patch.self_study_hours.is_some() {
        lesson.self_study_hours = patch.self_study_hours;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurriculumQuestion;

    fn stored_lesson(total: Option<f64>, classroom: Option<f64>) -> Lesson {
        Lesson {
            id: 1,
            title: "Consent".to_string(),
            lesson_type_id: None,
            total_hours: total,
            classroom_hours: classroom,
            self_study_hours: Some(0.0),
        }
    }

    fn parsed_lesson(total: Option<f64>, classroom: Option<f64>) -> CurriculumLesson {
        CurriculumLesson {
            number: Some(1),
            title: "Consent".to_string(),
            total_hours: total,
            classroom_hours: classroom,
            self_study_hours: Some(0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_gap_fill_never_overwrites_populated_fields() {
        let patch = gap_fill(
            &stored_lesson(Some(2.0), None),
            &parsed_lesson(Some(4.0), Some(3.0)),
            Some(7),
        );
        assert_eq!(patch.total_hours, None);
        assert_eq!(patch.classroom_hours, Some(3.0));
        assert_eq!(patch.lesson_type_id, Some(7));
        // 0 → 0 不算更新
        assert_eq!(patch.self_study_hours, None);
    }

    #[test]
    fn test_gap_fill_zero_counts_as_empty() {
        let patch = gap_fill(
            &stored_lesson(Some(0.0), None),
            &parsed_lesson(Some(2.0), None),
            None,
        );
        assert_eq!(patch.total_hours, Some(2.0));
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_identical_values_produce_empty_patch() {
        let patch = gap_fill(
            &stored_lesson(Some(2.0), Some(2.0)),
            &parsed_lesson(Some(2.0), Some(2.0)),
            None,
        );
        assert!(patch.is_empty());
    }

    #[test]
    fn test_target_from_ui() {
        assert_eq!(
            DisciplineTarget::from_ui(Some(5), Some("Ignored")).unwrap(),
            DisciplineTarget::Existing(5)
        );
        assert_eq!(
            DisciplineTarget::from_ui(None, Some("  Ethics ")).unwrap(),
            DisciplineTarget::New {
                name: "Ethics".to_string(),
                description: None
            }
        );
        assert!(DisciplineTarget::from_ui(None, Some("   "))
            .unwrap_err()
            .is_validation());
        assert!(DisciplineTarget::from_ui(None, None).unwrap_err().is_validation());
    }

    #[test]
    fn test_validate_request_rejects_empty_topics() {
        let err = validate_request(&[], &DisciplineTarget::Existing(1)).unwrap_err();
        assert!(err.is_validation());

        let topics = vec![CurriculumTopic {
            number: None,
            title: "Ethics".to_string(),
            lessons: vec![CurriculumLesson {
                title: "Consent".to_string(),
                questions: vec![CurriculumQuestion {
                    number: Some(1),
                    content: "Why?".to_string(),
                }],
                ..Default::default()
            }],
        }];
        assert!(validate_request(&topics, &DisciplineTarget::Existing(1)).is_ok());
    }
}
