// ==========================================
// 服装生产管理系统 - 日志初始化
// ==========================================
// 级别: RUST_LOG（缺省 info）
// 格式: GARMENT_PRODUCTION_LOG_FORMAT=json 时输出 JSON 行,供采集
// 引擎: info=流转成功, warn=规则拒绝, debug=入产明细
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "GARMENT_PRODUCTION_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 解析环境变量取值（未设置或无法识别时为文本格式）
    pub fn from_env_value(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// 初始化日志系统
///
/// # 示例
/// ```no_run
/// use garment_production::logging;
/// logging::init();
/// ```
pub fn init() {
    let format = LogFormat::from_env_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref());
    init_with_format(format);
}

/// 按指定格式初始化（重复调用时保留已安装的订阅者）
pub fn init_with_format(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("日志订阅者已存在,跳过初始化");
    }
}

/// 测试环境日志（debug 级别,输出交给测试框架捕获）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
