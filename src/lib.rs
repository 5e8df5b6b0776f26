// ==========================================
// 课程体系管理 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 把粘贴的课程计划表合并进 培养方案 → 学科 → 主题 → 课次 → 问题 层级
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析与对账
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/表结构）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{ColumnRole, OrderedLink};

// 领域实体
pub use domain::{
    CurriculumLesson, CurriculumQuestion, CurriculumTopic, Discipline, ImportBatch, Lesson,
    Program, Question, Topic, TopicNode,
};

// 导入
pub use importer::{
    import, parse, CurriculumImporter, DisciplineTarget, ImportError, ImportRules, ImportSummary,
};

// 仓储
pub use repository::{CurriculumStore, RepositoryError, SqliteCurriculumStore};

// API
pub use api::{ApiError, CurriculumApi, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "课程体系导入工具";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
