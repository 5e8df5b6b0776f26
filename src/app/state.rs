// ==========================================
// 课程体系管理 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use crate::api::{ApiResult, CurriculumApi, ImportApi};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CURRICULUM_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 课程API
    pub curriculum_api: Arc<CurriculumApi>,

    /// 课程导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建AppState实例（打开数据库并确保表结构存在）
    pub fn new(db_path: String) -> ApiResult<Self> {
        let curriculum_api = Arc::new(CurriculumApi::new(&db_path)?);
        let import_api = Arc::new(ImportApi::new(db_path.clone()));

        info!(db_path = %db_path, "AppState 初始化完成");

        Ok(Self {
            db_path,
            curriculum_api,
            import_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 CURRICULUM_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./curriculum.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("curriculum-importer");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("curriculum.db");
        }
    }

    path.to_string_lossy().to_string()
}
