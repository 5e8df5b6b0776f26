// ==========================================
// 课程体系管理 - 表头定位与列映射
// ==========================================
// 职责: 找到表头行，并把表头单元格映射为语义列角色
// 规则: 见 ImportRules（有序关键字，首个命中生效）
// ==========================================

use crate::domain::ColumnRole;
use crate::importer::data_cleaner::normalize_key;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::rules::ImportRules;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 列映射结果
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    /// 表头所在行（网格下标）
    pub header_row: usize,
    columns: HashMap<ColumnRole, usize>,
}

impl ColumnMap {
    /// 角色对应的列下标
    pub fn index_of(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    /// 取行中某角色的单元格（去空白后为空则 None）
    pub fn cell<'a>(&self, row: &'a [String], role: ColumnRole) -> Option<&'a str> {
        self.index_of(role)
            .and_then(|idx| row.get(idx))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn is_mapped(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }
}

/// 自上而下查找第一行同时包含主题标记与课次标记的行
///
/// # 返回
/// - Err(Validation): 找不到表头
pub fn locate_header(rows: &[Vec<String>], rules: &ImportRules) -> ImportResult<usize> {
    rows.iter()
        .position(|row| rules.is_header_text(&normalize_key(&row.join(" "))))
        .ok_or_else(|| ImportError::validation("未找到表头行（需同时包含主题名称与课次列）"))
}

/// 把表头单元格映射为列角色
///
/// # 规则
/// - 每个单元格按优先级取第一个命中的角色
/// - 已被前面单元格占用的角色不再分配
///
/// # 返回
/// - Err(Validation): 缺少主题列或课次列
pub fn map_columns(
    header: &[String],
    header_row: usize,
    rules: &ImportRules,
) -> ImportResult<ColumnMap> {
    let mut columns = HashMap::new();
    let mut taken = HashSet::new();

    for (idx, cell) in header.iter().enumerate() {
        let normalized = normalize_key(cell);
        if normalized.is_empty() {
            continue;
        }
        if let Some(role) = rules.match_column_role(&normalized, &taken) {
            debug!(column = idx, header = %cell, role = %role, "列角色映射");
            taken.insert(role);
            columns.insert(role, idx);
        }
    }

    for role in [ColumnRole::Topic, ColumnRole::Lesson] {
        if !columns.contains_key(&role) {
            return Err(ImportError::validation(format!("表头缺少必需列: {}", role)));
        }
    }

    Ok(ColumnMap {
        header_row,
        columns,
    })
}

/// 定位表头并完成列映射
pub fn resolve_columns(rows: &[Vec<String>], rules: &ImportRules) -> ImportResult<ColumnMap> {
    let header_row = locate_header(rows, rules)?;
    map_columns(&rows[header_row], header_row, rules)
}
