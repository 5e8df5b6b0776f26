// ==========================================
// 课程体系管理 - 导入层
// ==========================================
// 职责: 粘贴文本/文件 → 课程结构 → 合并入库
// 流程: 分词 → 表头定位 → 行解析（纯函数） → 对账写入（单事务）
// 支持: 文本粘贴, Excel, CSV
// ==========================================

// 模块声明
pub mod curriculum_importer;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod row_parser;
pub mod rules;
pub mod tokenizer;

// 重导出核心类型
pub use curriculum_importer::{
    import, validate_request, CurriculumImporter, DisciplineTarget, ImportSummary,
};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{locate_header, map_columns, resolve_columns, ColumnMap};
pub use file_parser::{CsvParser, ExcelParser, FileParser, TextParser, UniversalFileParser};
pub use row_parser::{parse, parse_rows, parse_with_rules};
pub use rules::{ColumnRule, ImportRules, LessonTypeRule};
pub use tokenizer::{tokenize, Delimiter, TokenizedText};
