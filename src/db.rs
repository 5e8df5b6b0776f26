// ==========================================
// 课程体系管理 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 提供幂等建表（CREATE TABLE IF NOT EXISTS），不做迁移
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 关联表统一结构: (parent_id, child_id, order_index)，UNIQUE(parent_id, child_id)
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS program (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS discipline (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            position INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS topic (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            position INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS lesson_type (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS lesson (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            lesson_type_id INTEGER REFERENCES lesson_type(id),
            total_hours REAL,
            classroom_hours REAL,
            self_study_hours REAL
        );

        CREATE TABLE IF NOT EXISTS question (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            answer TEXT,
            difficulty INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS program_discipline (
            program_id INTEGER NOT NULL REFERENCES program(id) ON DELETE CASCADE,
            discipline_id INTEGER NOT NULL REFERENCES discipline(id) ON DELETE CASCADE,
            order_index INTEGER NOT NULL,
            UNIQUE (program_id, discipline_id)
        );

        CREATE TABLE IF NOT EXISTS discipline_topic (
            discipline_id INTEGER NOT NULL REFERENCES discipline(id) ON DELETE CASCADE,
            topic_id INTEGER NOT NULL REFERENCES topic(id) ON DELETE CASCADE,
            order_index INTEGER NOT NULL,
            UNIQUE (discipline_id, topic_id)
        );

        CREATE TABLE IF NOT EXISTS topic_lesson (
            topic_id INTEGER NOT NULL REFERENCES topic(id) ON DELETE CASCADE,
            lesson_id INTEGER NOT NULL REFERENCES lesson(id) ON DELETE CASCADE,
            order_index INTEGER NOT NULL,
            UNIQUE (topic_id, lesson_id)
        );

        CREATE TABLE IF NOT EXISTS lesson_question (
            lesson_id INTEGER NOT NULL REFERENCES lesson(id) ON DELETE CASCADE,
            question_id INTEGER NOT NULL REFERENCES question(id) ON DELETE CASCADE,
            order_index INTEGER NOT NULL,
            UNIQUE (lesson_id, question_id)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            program_id INTEGER NOT NULL,
            discipline_id INTEGER NOT NULL,
            topics_added INTEGER NOT NULL,
            lessons_added INTEGER NOT NULL,
            questions_added INTEGER NOT NULL,
            lessons_updated INTEGER NOT NULL,
            source_rows INTEGER NOT NULL,
            imported_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
