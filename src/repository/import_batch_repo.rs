// ==========================================
// 课程体系管理 - 导入批次仓储
// ==========================================
// 写入由 CurriculumStore 在导入事务内完成，本仓储只负责查询
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::ImportBatch;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct ImportBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

const BATCH_COLUMNS: &str = r#"
    batch_id, program_id, discipline_id,
    topics_added, lessons_added, questions_added, lessons_updated,
    source_rows, imported_at
"#;

fn map_batch_row(row: &Row) -> rusqlite::Result<ImportBatch> {
    let imported_at: String = row.get(8)?;
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        program_id: row.get(1)?,
        discipline_id: row.get(2)?,
        topics_added: row.get::<_, i64>(3)? as usize,
        lessons_added: row.get::<_, i64>(4)? as usize,
        questions_added: row.get::<_, i64>(5)? as usize,
        lessons_updated: row.get::<_, i64>(6)? as usize,
        source_rows: row.get::<_, i64>(7)? as usize,
        imported_at: DateTime::parse_from_rfc3339(&imported_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
            })?,
    })
}

impl ImportBatchRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 最近的导入批次（按导入时间倒序）
    pub fn recent(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM import_batch ORDER BY imported_at DESC, rowid DESC LIMIT ?1",
            BATCH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], map_batch_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn find(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM import_batch WHERE batch_id = ?1", BATCH_COLUMNS);
        let batch = conn
            .query_row(&sql, params![batch_id], map_batch_row)
            .optional()?;
        Ok(batch)
    }

    /// 某学科的导入批次数
    pub fn count_for_discipline(&self, discipline_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM import_batch WHERE discipline_id = ?1",
            params![discipline_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};
    use crate::repository::curriculum_store::CurriculumStore;
    use crate::repository::curriculum_store_impl::SqliteCurriculumStore;

    #[test]
    fn test_insert_then_read_batch() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let batch = ImportBatch {
            batch_id: "b-1".to_string(),
            program_id: 1,
            discipline_id: 2,
            topics_added: 1,
            lessons_added: 3,
            questions_added: 4,
            lessons_updated: 0,
            source_rows: 6,
            imported_at: Utc::now(),
        };
        SqliteCurriculumStore::new(&conn).insert_import_batch(&batch).unwrap();

        let repo = ImportBatchRepository::from_connection(Arc::new(Mutex::new(conn)));
        let found = repo.find("b-1").unwrap().expect("batch should exist");
        assert_eq!(found.lessons_added, 3);
        assert_eq!(repo.recent(10).unwrap().len(), 1);
        assert_eq!(repo.count_for_discipline(2).unwrap(), 1);
    }
}
