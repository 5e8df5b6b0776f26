// ==========================================
// 课程体系管理 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::rules::ImportRules;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// 全局作用域
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;

        debug!(config_key = key, "配置已写入");
        Ok(())
    }

    /// 删除 global scope 的配置值
    ///
    /// # 返回
    /// - true: 删除了一条配置
    pub fn remove_global_config_value(&self, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 保存导入规则集（先校验，再以 JSON 写入）
    pub fn set_import_rules(&self, rules: &ImportRules) -> ImportResult<()> {
        rules.validate().map_err(|message| ImportError::ConfigError {
            key: config_keys::IMPORT_RULES.to_string(),
            message,
        })?;
        let json = serde_json::to_string(rules).map_err(|e| ImportError::ConfigError {
            key: config_keys::IMPORT_RULES.to_string(),
            message: e.to_string(),
        })?;
        self.set_global_config_value(config_keys::IMPORT_RULES, &json)?;
        Ok(())
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_import_rules(&self) -> ImportResult<ImportRules> {
        let Some(raw) = self.get_global_config_value(config_keys::IMPORT_RULES)? else {
            return Ok(ImportRules::default());
        };

        let rules: ImportRules = serde_json::from_str(&raw).map_err(|e| {
            warn!(config_key = config_keys::IMPORT_RULES, error = %e, "导入规则配置格式错误");
            ImportError::ConfigError {
                key: config_keys::IMPORT_RULES.to_string(),
                message: e.to_string(),
            }
        })?;

        rules.validate().map_err(|message| ImportError::ConfigError {
            key: config_keys::IMPORT_RULES.to_string(),
            message,
        })?;

        debug!(config_key = config_keys::IMPORT_RULES, "使用配置覆写的导入规则");
        Ok(rules)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入规则集 (JSON)
    pub const IMPORT_RULES: &str = "import.rules";
}
