// ==========================================
// 课程体系管理 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod curriculum_repo;
pub mod curriculum_store;
pub mod curriculum_store_impl;
pub mod error;
pub mod import_batch_repo;

// 重导出核心仓储
pub use curriculum_repo::CurriculumRepository;
pub use curriculum_store::CurriculumStore;
pub use curriculum_store_impl::SqliteCurriculumStore;
pub use error::{RepositoryError, RepositoryResult};
pub use import_batch_repo::ImportBatchRepository;
