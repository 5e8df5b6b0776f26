// ==========================================
// 课程导入API
// ==========================================
// 职责: 封装解析 / 导入 / 预演 / 批次查询
// 连接: 每次调用打开一条已配置连接并确保表结构存在
// 事务: 对账在单个事务内执行；预演结束后回滚
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::{CurriculumTopic, ImportBatch};
use crate::importer::{
    parse_with_rules, validate_request, CurriculumImporter, DisciplineTarget,
    ImportRules, ImportSummary, UniversalFileParser,
};
use crate::repository::{ImportBatchRepository, RepositoryError, SqliteCurriculumStore};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    fn load_rules(&self, conn: &Arc<Mutex<Connection>>) -> ApiResult<ImportRules> {
        let config = ConfigManager::from_connection(conn.clone())?;
        Ok(config.get_import_rules()?)
    }

    // ==========================================
    // 解析（不写库）
    // ==========================================

    /// 解析粘贴文本
    pub fn parse_text(&self, text: &str) -> ApiResult<Vec<CurriculumTopic>> {
        let conn = self.open()?;
        let rules = self.load_rules(&conn)?;
        Ok(parse_with_rules(text, &rules)?)
    }

    /// 解析文件（.txt/.tsv/.csv/.xlsx/.xls）
    pub fn parse_file(&self, file_path: impl AsRef<Path>) -> ApiResult<Vec<CurriculumTopic>> {
        let conn = self.open()?;
        let rules = self.load_rules(&conn)?;
        Ok(UniversalFileParser.parse_topics(file_path, &rules)?)
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 导入粘贴文本
    ///
    /// # 参数
    /// - program_id: 目标培养方案
    /// - discipline_id: 已有学科（优先）
    /// - new_discipline_name: 新学科名称
    /// - text: 粘贴文本
    pub fn import_text(
        &self,
        program_id: i64,
        discipline_id: Option<i64>,
        new_discipline_name: Option<&str>,
        text: &str,
    ) -> ApiResult<ImportSummary> {
        let target = DisciplineTarget::from_ui(discipline_id, new_discipline_name)?;
        let conn = self.open()?;
        let rules = self.load_rules(&conn)?;
        let topics = parse_with_rules(text, &rules)?;
        self.run_import(&conn, &rules, program_id, &target, &topics, false)
    }

    /// 导入文件
    pub fn import_file(
        &self,
        program_id: i64,
        discipline_id: Option<i64>,
        new_discipline_name: Option<&str>,
        file_path: impl AsRef<Path>,
        dry_run: bool,
    ) -> ApiResult<ImportSummary> {
        let target = DisciplineTarget::from_ui(discipline_id, new_discipline_name)?;
        let conn = self.open()?;
        let rules = self.load_rules(&conn)?;
        let topics = UniversalFileParser.parse_topics(file_path, &rules)?;
        self.run_import(&conn, &rules, program_id, &target, &topics, dry_run)
    }

    /// 预演导入: 完整执行对账后回滚，返回将产生的计数
    pub fn preview_text(
        &self,
        program_id: i64,
        discipline_id: Option<i64>,
        new_discipline_name: Option<&str>,
        text: &str,
    ) -> ApiResult<ImportSummary> {
        let target = DisciplineTarget::from_ui(discipline_id, new_discipline_name)?;
        let conn = self.open()?;
        let rules = self.load_rules(&conn)?;
        let topics = parse_with_rules(text, &rules)?;
        self.run_import(&conn, &rules, program_id, &target, &topics, true)
    }

    /// 导入已解析的主题（界面先预览解析结果、再确认导入时使用）
    pub fn import_topics(
        &self,
        program_id: i64,
        target: &DisciplineTarget,
        topics: &[CurriculumTopic],
        dry_run: bool,
    ) -> ApiResult<ImportSummary> {
        let conn = self.open()?;
        let rules = self.load_rules(&conn)?;
        self.run_import(&conn, &rules, program_id, target, topics, dry_run)
    }

    #[instrument(skip(self, conn, rules, target, topics))]
    fn run_import(
        &self,
        conn: &Arc<Mutex<Connection>>,
        rules: &ImportRules,
        program_id: i64,
        target: &DisciplineTarget,
        topics: &[CurriculumTopic],
        dry_run: bool,
    ) -> ApiResult<ImportSummary> {
        // 前置校验在事务之外完成
        validate_request(topics, target)?;

        let mut guard = conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))?;
        let tx = guard
            .transaction()
            .map_err(RepositoryError::transaction)?;

        let mut summary = {
            let store = SqliteCurriculumStore::new(&tx);
            CurriculumImporter::new(&store, rules).import(program_id, target, topics)?
        };

        if dry_run {
            tx.rollback()
                .map_err(RepositoryError::transaction)?;
            summary.dry_run = true;
            info!(batch_id = %summary.batch_id, "预演完成，已回滚");
        } else {
            tx.commit()
                .map_err(RepositoryError::transaction)?;
            info!(batch_id = %summary.batch_id, "导入已提交");
        }

        Ok(summary)
    }

    // ==========================================
    // 批次查询
    // ==========================================

    /// 最近的导入批次（新→旧）
    pub fn recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let conn = self.open()?;
        let repo = ImportBatchRepository::from_connection(conn);
        Ok(repo.recent(limit)?)
    }
}
