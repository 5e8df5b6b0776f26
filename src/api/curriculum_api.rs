// ==========================================
// 课程体系管理 - 课程 API
// ==========================================
// 职责: 培养方案维护、学科列表、学科树查询
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::{Discipline, Program, TopicNode};
use crate::repository::CurriculumRepository;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 课程API
pub struct CurriculumApi {
    repo: CurriculumRepository,
}

impl CurriculumApi {
    /// 打开数据库并确保表结构存在
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            repo: CurriculumRepository::from_connection(Arc::new(Mutex::new(conn))),
        })
    }

    /// 新建培养方案
    pub fn create_program(&self, name: &str) -> ApiResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("培养方案名称不能为空".to_string()));
        }
        let id = self.repo.create_program(name)?;
        info!(program_id = id, name, "创建培养方案");
        Ok(id)
    }

    pub fn list_programs(&self) -> ApiResult<Vec<Program>> {
        Ok(self.repo.list_programs()?)
    }

    /// 方案下的学科
    ///
    /// # 返回
    /// - Err(NotFound): 培养方案不存在
    pub fn list_disciplines(&self, program_id: i64) -> ApiResult<Vec<Discipline>> {
        if self.repo.find_program(program_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Program(id={})不存在", program_id)));
        }
        Ok(self.repo.list_disciplines(program_id)?)
    }

    /// 学科树: 主题 → 课次 → 问题
    pub fn discipline_tree(&self, discipline_id: i64) -> ApiResult<Vec<TopicNode>> {
        Ok(self.repo.discipline_tree(discipline_id)?)
    }
}
