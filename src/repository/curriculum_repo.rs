// ==========================================
// 课程体系管理 - 课程数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 用途: 培养方案 CRUD + 学科树读模型（CLI 展示 / 集成测试校验）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{Discipline, LessonNode, Program, Question, Topic, TopicNode};
use crate::repository::curriculum_store_impl::{map_discipline_row, map_lesson_row, map_topic_row};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// CurriculumRepository - 课程仓储
// ==========================================
pub struct CurriculumRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CurriculumRepository {
    /// 创建新的 CurriculumRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 培养方案 =====

    /// 创建培养方案，返回新 ID
    pub fn create_program(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO program (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_programs(&self) -> RepositoryResult<Vec<Program>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM program ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Program {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn find_program(&self, program_id: i64) -> RepositoryResult<Option<Program>> {
        let conn = self.get_conn()?;
        let program = conn
            .query_row(
                "SELECT id, name FROM program WHERE id = ?1",
                params![program_id],
                |row| {
                    Ok(Program {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(program)
    }

    // ===== 学科 =====

    /// 方案下的学科（按关联顺序）
    pub fn list_disciplines(&self, program_id: i64) -> RepositoryResult<Vec<Discipline>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT d.id, d.name, d.description, d.position
            FROM discipline d
            JOIN program_discipline pd ON pd.discipline_id = d.id
            WHERE pd.program_id = ?1
            ORDER BY pd.order_index, d.id
            "#,
        )?;
        let rows = stmt.query_map(params![program_id], map_discipline_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ===== 学科树 =====

    /// 读取学科下完整的 主题 → 课次 → 问题 树（均按 order_index 排序）
    ///
    /// # 返回
    /// - Err(NotFound): 学科不存在
    pub fn discipline_tree(&self, discipline_id: i64) -> RepositoryResult<Vec<TopicNode>> {
        let conn = self.get_conn()?;

        let exists = conn
            .query_row(
                "SELECT 1 FROM discipline WHERE id = ?1",
                params![discipline_id],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepositoryError::not_found("discipline", discipline_id));
        }

        let mut topic_stmt = conn.prepare(
            r#"
            SELECT dt.order_index, t.id, t.title, t.description, t.position
            FROM topic t
            JOIN discipline_topic dt ON dt.topic_id = t.id
            WHERE dt.discipline_id = ?1
            ORDER BY dt.order_index, t.id
            "#,
        )?;
        let mut lesson_stmt = conn.prepare(
            r#"
            SELECT tl.order_index, lt.name,
                   l.id, l.title, l.lesson_type_id, l.total_hours, l.classroom_hours, l.self_study_hours
            FROM lesson l
            JOIN topic_lesson tl ON tl.lesson_id = l.id
            LEFT JOIN lesson_type lt ON lt.id = l.lesson_type_id
            WHERE tl.topic_id = ?1
            ORDER BY tl.order_index, l.id
            "#,
        )?;
        let mut question_stmt = conn.prepare(
            r#"
            SELECT lq.order_index, q.id, q.content, q.answer, q.difficulty
            FROM question q
            JOIN lesson_question lq ON lq.question_id = q.id
            WHERE lq.lesson_id = ?1
            ORDER BY lq.order_index, q.id
            "#,
        )?;

        let topics = topic_stmt
            .query_map(params![discipline_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Topic {
                        id: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        position: row.get(4)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tree = Vec::with_capacity(topics.len());
        for (order_index, topic) in topics {
            let lessons = lesson_stmt
                .query_map(params![topic.id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        map_lesson_row(row, 2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut lesson_nodes = Vec::with_capacity(lessons.len());
            for (lesson_order, lesson_type, lesson) in lessons {
                let questions = question_stmt
                    .query_map(params![lesson.id], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            Question {
                                id: row.get(1)?,
                                content: row.get(2)?,
                                answer: row.get(3)?,
                                difficulty: row.get(4)?,
                            },
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                lesson_nodes.push(LessonNode {
                    order_index: lesson_order,
                    lesson,
                    lesson_type,
                    questions,
                });
            }

            tree.push(TopicNode {
                order_index,
                topic,
                lessons: lesson_nodes,
            });
        }

        Ok(tree)
    }

    /// 学科下的全部主题（不含子节点）
    pub fn list_topics(&self, discipline_id: i64) -> RepositoryResult<Vec<Topic>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.title, t.description, t.position
            FROM topic t
            JOIN discipline_topic dt ON dt.topic_id = t.id
            WHERE dt.discipline_id = ?1
            ORDER BY dt.order_index, t.id
            "#,
        )?;
        let rows = stmt.query_map(params![discipline_id], map_topic_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};

    fn setup() -> CurriculumRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        CurriculumRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_create_and_list_programs() {
        let repo = setup();
        let id = repo.create_program("Бакалавр права").unwrap();

        let programs = repo.list_programs().unwrap();
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].id, id);
        assert!(repo.find_program(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_discipline_tree_unknown_discipline() {
        let repo = setup();
        let err = repo.discipline_tree(7).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
