// ==========================================
// 课程体系管理 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供界面层与命令行调用
// ==========================================

pub mod curriculum_api;
pub mod error;
pub mod import_api;

// 重导出核心类型
pub use curriculum_api::CurriculumApi;
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
