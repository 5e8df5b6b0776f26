// ==========================================
// 课程体系管理 - 应用层
// ==========================================
// 职责: 应用级共享状态（供命令行/界面层复用）
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
