// ==========================================
// 课程体系管理 - 日志
// ==========================================
// 日志一律写 stderr，stdout 只放命令结果（JSON 树 / 摘要）
// 过滤: RUST_LOG，缺省 info
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 终端可读文本（带模块与行号）
    #[default]
    Text,
    /// 每条事件一行 JSON，导入批次的 batch_id 等字段可直接被脚本过滤
    Json,
}

/// RUST_LOG 指令无法解析时退回缺省级别
fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// 安装全局订阅者（CLI 启动时调用一次）
///
/// ```no_run
/// use curriculum_importer::logging::{self, LogFormat};
/// logging::init(LogFormat::Json);
/// ```
pub fn init(format: LogFormat) {
    let directives = std::env::var("RUST_LOG").ok();
    let filter = filter_from(directives.as_deref());
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(true).with_line_number(true).init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// 测试用: debug 级别，输出交给测试框架捕获，可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_info() {
        assert_eq!(filter_from(None).to_string(), "info");
    }

    #[test]
    fn test_filter_uses_directives() {
        assert_eq!(filter_from(Some("debug")).to_string(), "debug");
    }

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
    }
}
