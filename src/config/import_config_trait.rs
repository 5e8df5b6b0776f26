// ==========================================
// 课程体系管理 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::rules::ImportRules;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader {
    /// 获取导入规则集
    ///
    /// # 返回
    /// - 未配置: ImportRules::default()
    /// - 已配置: JSON 覆写（缺省字段沿用默认值）
    /// - Err(ConfigError): JSON 格式错误或规则集不合法
    fn get_import_rules(&self) -> ImportResult<ImportRules>;

    /// 获取导入问题的默认难度
    ///
    /// # 默认值
    /// - 1
    fn get_default_question_difficulty(&self) -> ImportResult<i32> {
        Ok(self.get_import_rules()?.default_question_difficulty)
    }
}
