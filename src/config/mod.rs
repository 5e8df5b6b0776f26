// ==========================================
// 课程体系管理 - 配置层
// ==========================================
// 职责: 导入规则等系统配置的读取与覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, GLOBAL_SCOPE};
pub use import_config_trait::ImportConfigReader;
