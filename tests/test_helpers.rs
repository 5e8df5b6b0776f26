// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use curriculum_importer::db::{ensure_schema, open_sqlite_connection};
use curriculum_importer::repository::CurriculumRepository;
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 示例粘贴文本（按列对齐的纯文本，问题行单独成行）
pub const ALIGNED_PASTE: &str = "Назва теми    Заняття    Всього    Аудиторні    Самостійна\n\
Ethics        Заняття 1. Consent    2    2    0\n\
\x20             1) Why consent matters?\n";

/// 两个主题的 Tab 分隔课程计划
pub const TWO_TOPIC_PLAN: &str = "Назва теми\tЗаняття\tВсього\tАудиторні\tСамостійна\tПитання\n\
Тема 1. Ethics\tЗаняття 1. Consent\t2\t2\t0\t1) Why consent matters?\n\
\tЗаняття 2. Семінар: Privacy\t\t1,5\t0,5\t1) What is private?\n\
Всього за темою\t\t4\t3,5\t0,5\t\n\
Тема 2. Law\tЗаняття 1. Liability\t3\t2\t1\t\n";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开已配置的连接（外键开启）
pub fn open_conn(db_path: &str) -> Connection {
    open_sqlite_connection(db_path).expect("Failed to open db")
}

/// 插入一个培养方案，返回 ID
pub fn seed_program(db_path: &str, name: &str) -> i64 {
    CurriculumRepository::new(db_path)
        .expect("Failed to create CurriculumRepository")
        .create_program(name)
        .expect("Failed to create program")
}

/// 统计表行数
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .expect("Failed to count rows")
}
