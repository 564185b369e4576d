// ==========================================
// 服装生产管理系统 - 应用层
// ==========================================
// 职责: 组装仓储/配置/API,提供默认数据库路径
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
