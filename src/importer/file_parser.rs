// ==========================================
// 课程体系管理 - 文件来源解析
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv) / 文本 (.txt/.tsv/无扩展名)
// 输出: 行 × 单元格 网格，交给表头定位与行解析
// 文本文件按粘贴文本处理（同一分隔符检测与续行规则）
// ==========================================

use crate::domain::CurriculumTopic;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_parser::{parse_rows, parse_with_rules};
use crate::importer::rules::ImportRules;
use crate::importer::tokenizer::tokenize;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 文件 → 单元格网格
pub trait FileParser {
    fn parse_to_rows(&self, file_path: &Path) -> ImportResult<Vec<Vec<String>>>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从首行猜测分隔符（分号多于逗号时用分号）
    fn sniff_delimiter(content: &str) -> u8 {
        let first_line = content.lines().next().unwrap_or_default();
        if first_line.matches(';').count() > first_line.matches(',').count() {
            b';'
        } else {
            b','
        }
    }
}

impl FileParser for CsvParser {
    fn parse_to_rows(&self, file_path: &Path) -> ImportResult<Vec<Vec<String>>> {
        ensure_exists(file_path)?;

        let content = fs::read_to_string(file_path)?;
        let delimiter = Self::sniff_delimiter(&content);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
            // 跳过完全空白的行
            if is_blank_row(&row) {
                continue;
            }
            rows.push(row);
        }

        debug!(rows = rows.len(), delimiter = %(delimiter as char), "CSV 解析完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// 单元格文本；整数值浮点数不带 ".0"
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string().trim().to_string(),
    }
}

impl FileParser for ExcelParser {
    fn parse_to_rows(&self, file_path: &Path) -> ImportResult<Vec<Vec<String>>> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))??;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row| !is_blank_row(row))
            .collect();

        debug!(rows = rows.len(), "Excel 解析完成");
        Ok(rows)
    }
}

// ==========================================
// 文本 Parser 实现（与粘贴文本同一分词规则）
// ==========================================
pub struct TextParser;

impl FileParser for TextParser {
    fn parse_to_rows(&self, file_path: &Path) -> ImportResult<Vec<Vec<String>>> {
        ensure_exists(file_path)?;
        let content = fs::read_to_string(file_path)?;
        Ok(tokenize(&content)?.rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<Vec<String>>> {
        let path = file_path.as_ref();
        ensure_exists(path)?;

        let ext = extension_of(path);
        match ext.as_str() {
            "csv" => CsvParser.parse_to_rows(path),
            "xlsx" | "xls" => ExcelParser.parse_to_rows(path),
            "txt" | "tsv" | "" => TextParser.parse_to_rows(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// 文件 → 主题树
    ///
    /// 文本文件走粘贴文本路径（空白/竖线对齐时合并续行）；
    /// CSV/Excel 的多行单元格本身完整，按网格解析
    pub fn parse_topics<P: AsRef<Path>>(
        &self,
        file_path: P,
        rules: &ImportRules,
    ) -> ImportResult<Vec<CurriculumTopic>> {
        let path = file_path.as_ref();
        ensure_exists(path)?;

        if matches!(extension_of(path).as_str(), "txt" | "tsv" | "") {
            let content = fs::read_to_string(path)?;
            return parse_with_rules(&content, rules);
        }
        parse_rows(&self.parse(path)?, rules)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with_suffix(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_csv_parser_comma() {
        let file = temp_with_suffix(".csv", "Тема,Заняття,Всього\nEthics,Consent,2\n");
        let rows = CsvParser.parse_to_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Ethics", "Consent", "2"]);
    }

    #[test]
    fn test_csv_parser_semicolon_and_quoted_multiline() {
        let file = temp_with_suffix(
            ".csv",
            "Тема;Заняття;Всього\nEthics;\"Заняття 1. Consent\n1) Why?\";\"1,5\"\n",
        );
        let rows = CsvParser.parse_to_rows(file.path()).unwrap();

        assert_eq!(rows[1][1], "Заняття 1. Consent\n1) Why?");
        assert_eq!(rows[1][2], "1,5");
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let file = temp_with_suffix(".csv", "a,b\n,\nc,d\n");
        let rows = CsvParser.parse_to_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_text_file_uses_tokenizer() {
        let file = temp_with_suffix(".txt", "Тема\tЗаняття\nEthics\tConsent\n");
        let rows = UniversalFileParser.parse(file.path()).unwrap();
        assert_eq!(rows[1], vec!["Ethics", "Consent"]);
    }

    #[test]
    fn test_aligned_text_file_merges_continuation_rows() {
        let file = temp_with_suffix(
            ".txt",
            "Тема    Заняття\nEthics    Заняття 1. Consent\n          1) Why consent matters?\n",
        );
        let topics = UniversalFileParser
            .parse_topics(file.path(), &ImportRules::default())
            .unwrap();

        assert_eq!(topics[0].lessons.len(), 1);
        assert_eq!(topics[0].lessons[0].questions.len(), 1);
    }

    #[test]
    fn test_csv_rows_after_keyword_lesson_stay_lessons() {
        let file = temp_with_suffix(".csv", "Тема;Заняття\nEthics;Заняття 1. Consent\n;2) Privacy\n");
        let topics = UniversalFileParser
            .parse_topics(file.path(), &ImportRules::default())
            .unwrap();
        assert_eq!(topics[0].lessons.len(), 2);
    }

    #[test]
    fn test_file_not_found() {
        let err = UniversalFileParser.parse("non_existent.csv").unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let file = temp_with_suffix(".pdf", "x");
        let err = UniversalFileParser.parse(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "pdf"));
    }

    #[test]
    fn test_whole_float_cells_render_without_fraction() {
        assert_eq!(cell_text(&Data::Float(2.0)), "2");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String(" Consent ".to_string())), "Consent");
    }
}
