// ==========================================
// 课程体系管理 - CurriculumStore 的 SQLite 实现
// ==========================================
// 借用一个 &Connection（通常是 &Transaction 解引用而来），
// 因此导入过程中的全部读写共享调用方的事务
// ==========================================

use crate::domain::{
    Discipline, ImportBatch, Lesson, LessonGapFill, LessonType, NewLesson, OrderedLink, Topic,
    TopicLessonRecord,
};
use crate::repository::curriculum_store::CurriculumStore;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub struct SqliteCurriculumStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCurriculumStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

pub(crate) fn map_discipline_row(row: &Row) -> rusqlite::Result<Discipline> {
    Ok(Discipline {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        position: row.get(3)?,
    })
}

pub(crate) fn map_topic_row(row: &Row) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        position: row.get(3)?,
    })
}

/// 列顺序: id, title, lesson_type_id, total_hours, classroom_hours, self_study_hours
pub(crate) fn map_lesson_row(row: &Row, offset: usize) -> rusqlite::Result<Lesson> {
    Ok(Lesson {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        lesson_type_id: row.get(offset + 2)?,
        total_hours: row.get(offset + 3)?,
        classroom_hours: row.get(offset + 4)?,
        self_study_hours: row.get(offset + 5)?,
    })
}

impl CurriculumStore for SqliteCurriculumStore<'_> {
    fn program_exists(&self, program_id: i64) -> RepositoryResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM program WHERE id = ?1", params![program_id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn find_discipline(&self, discipline_id: i64) -> RepositoryResult<Option<Discipline>> {
        let discipline = self
            .conn
            .query_row(
                "SELECT id, name, description, position FROM discipline WHERE id = ?1",
                params![discipline_id],
                map_discipline_row,
            )
            .optional()?;
        Ok(discipline)
    }

    fn disciplines_for_program(&self, program_id: i64) -> RepositoryResult<Vec<Discipline>> {
        let mut stmt = self.conn.prepare(
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

    fn create_discipline(
        &self,
        name: &str,
        description: Option<&str>,
        position: i64,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO discipline (name, description, position) VALUES (?1, ?2, ?3)",
            params![name, description, position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn is_linked(&self, link: OrderedLink, parent_id: i64, child_id: i64) -> RepositoryResult<bool> {
        let (table, parent_col, child_col) = link.table_columns();
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2",
            table, parent_col, child_col
        );
        let found = self
            .conn
            .query_row(&sql, params![parent_id, child_id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn link_child(
        &self,
        link: OrderedLink,
        parent_id: i64,
        child_id: i64,
        order_index: i64,
    ) -> RepositoryResult<()> {
        let (table, parent_col, child_col) = link.table_columns();
        let sql = format!(
            "INSERT INTO {} ({}, {}, order_index) VALUES (?1, ?2, ?3)",
            table, parent_col, child_col
        );
        self.conn.execute(&sql, params![parent_id, child_id, order_index])?;
        Ok(())
    }

    fn max_order_index(&self, link: OrderedLink, parent_id: i64) -> RepositoryResult<i64> {
        let (table, parent_col, _) = link.table_columns();
        let sql = format!(
            "SELECT COALESCE(MAX(order_index), 0) FROM {} WHERE {} = ?1",
            table, parent_col
        );
        let max: i64 = self.conn.query_row(&sql, params![parent_id], |row| row.get(0))?;
        Ok(max)
    }

    fn list_lesson_types(&self) -> RepositoryResult<Vec<LessonType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM lesson_type ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(LessonType {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_lesson_type(&self, name: &str) -> RepositoryResult<i64> {
        self.conn
            .execute("INSERT INTO lesson_type (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn topics_for_discipline(&self, discipline_id: i64) -> RepositoryResult<Vec<Topic>> {
        let mut stmt = self.conn.prepare(
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

    fn create_topic(
        &self,
        title: &str,
        description: Option<&str>,
        position: i64,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO topic (title, description, position) VALUES (?1, ?2, ?3)",
            params![title, description, position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn lessons_for_discipline(&self, discipline_id: i64) -> RepositoryResult<Vec<TopicLessonRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tl.topic_id,
                   l.id, l.title, l.lesson_type_id, l.total_hours, l.classroom_hours, l.self_study_hours
            FROM lesson l
            JOIN topic_lesson tl ON tl.lesson_id = l.id
            JOIN discipline_topic dt ON dt.topic_id = tl.topic_id
            WHERE dt.discipline_id = ?1
            ORDER BY dt.order_index, tl.order_index, l.id
            "#,
        )?;
        let rows = stmt.query_map(params![discipline_id], |row| {
            Ok(TopicLessonRecord {
                topic_id: row.get(0)?,
                lesson: map_lesson_row(row, 1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_lesson(&self, lesson: &NewLesson) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO lesson (
                title, lesson_type_id, total_hours, classroom_hours, self_study_hours
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                lesson.title,
                lesson.lesson_type_id,
                lesson.total_hours,
                lesson.classroom_hours,
                lesson.self_study_hours,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_lesson_gaps(&self, lesson_id: i64, patch: &LessonGapFill) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            UPDATE lesson SET
                lesson_type_id = COALESCE(?2, lesson_type_id),
                total_hours = COALESCE(?3, total_hours),
                classroom_hours = COALESCE(?4, classroom_hours),
                self_study_hours = COALESCE(?5, self_study_hours)
            WHERE id = ?1
            "#,
            params![
                lesson_id,
                patch.lesson_type_id,
                patch.total_hours,
                patch.classroom_hours,
                patch.self_study_hours,
            ],
        )?;
        Ok(())
    }

    fn question_contents_for_lesson(&self, lesson_id: i64) -> RepositoryResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT q.content
            FROM question q
            JOIN lesson_question lq ON lq.question_id = q.id
            WHERE lq.lesson_id = ?1
            ORDER BY lq.order_index, q.id
            "#,
        )?;
        let rows = stmt.query_map(params![lesson_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_question(
        &self,
        content: &str,
        answer: Option<&str>,
        difficulty: i32,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO question (content, answer, difficulty) VALUES (?1, ?2, ?3)",
            params![content, answer, difficulty],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, program_id, discipline_id,
                topics_added, lessons_added, questions_added, lessons_updated,
                source_rows, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                batch.batch_id,
                batch.program_id,
                batch.discipline_id,
                batch.topics_added as i64,
                batch.lessons_added as i64,
                batch.questions_added as i64,
                batch.lessons_updated as i64,
                batch.source_rows as i64,
                batch.imported_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_max_order_index_empty_parent_is_zero() {
        let conn = setup();
        let store = SqliteCurriculumStore::new(&conn);

        assert_eq!(store.max_order_index(OrderedLink::TopicLesson, 42).unwrap(), 0);
        assert_eq!(store.next_order_index(OrderedLink::TopicLesson, 42).unwrap(), 1);
    }

    #[test]
    fn test_link_and_order_index() {
        let conn = setup();
        let store = SqliteCurriculumStore::new(&conn);

        let discipline_id = store.create_discipline("Етика", None, 1).unwrap();
        let t1 = store.create_topic("Вступ", None, 1).unwrap();
        let t2 = store.create_topic("Згода", None, 2).unwrap();
        store.link_topic_to_discipline(discipline_id, t1, 1).unwrap();
        store.link_topic_to_discipline(discipline_id, t2, 5).unwrap();

        assert!(store.is_linked(OrderedLink::DisciplineTopic, discipline_id, t1).unwrap());
        assert_eq!(
            store.max_order_index(OrderedLink::DisciplineTopic, discipline_id).unwrap(),
            5
        );

        let topics = store.topics_for_discipline(discipline_id).unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].title, "Вступ");
    }

    #[test]
    fn test_duplicate_link_rejected() {
        let conn = setup();
        let store = SqliteCurriculumStore::new(&conn);

        let discipline_id = store.create_discipline("Етика", None, 1).unwrap();
        let topic_id = store.create_topic("Вступ", None, 1).unwrap();
        store.link_topic_to_discipline(discipline_id, topic_id, 1).unwrap();

        let err = store
            .link_topic_to_discipline(discipline_id, topic_id, 2)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::repository::error::RepositoryError::UniqueConstraintViolation(_)
        ));
    }

    #[test]
    fn test_update_lesson_gaps_only_touches_some_fields() {
        let conn = setup();
        let store = SqliteCurriculumStore::new(&conn);

        let lesson_id = store
            .create_lesson(&NewLesson {
                title: "Згода".to_string(),
                total_hours: Some(2.0),
                ..Default::default()
            })
            .unwrap();

        store
            .update_lesson_gaps(
                lesson_id,
                &LessonGapFill {
                    classroom_hours: Some(1.5),
                    ..Default::default()
                },
            )
            .unwrap();

        let (total, classroom, self_study): (Option<f64>, Option<f64>, Option<f64>) = conn
            .query_row(
                "SELECT total_hours, classroom_hours, self_study_hours FROM lesson WHERE id = ?1",
                params![lesson_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(total, Some(2.0));
        assert_eq!(classroom, Some(1.5));
        assert_eq!(self_study, None);
    }

    #[test]
    fn test_lessons_for_discipline_carries_topic_id() {
        let conn = setup();
        let store = SqliteCurriculumStore::new(&conn);

        let discipline_id = store.create_discipline("Етика", None, 1).unwrap();
        let topic_id = store.create_topic("Вступ", None, 1).unwrap();
        store.link_topic_to_discipline(discipline_id, topic_id, 1).unwrap();
        let lesson_id = store
            .create_lesson(&NewLesson {
                title: "Згода".to_string(),
                ..Default::default()
            })
            .unwrap();
        store.link_lesson_to_topic(topic_id, lesson_id, 1).unwrap();

        let lessons = store.lessons_for_discipline(discipline_id).unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].topic_id, topic_id);
        assert_eq!(lessons[0].lesson.id, lesson_id);
    }
}
