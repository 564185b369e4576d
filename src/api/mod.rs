// ==========================================
// 服装生产管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供界面/命令行调用
// ==========================================

pub mod error;
pub mod production_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use production_api::{parse_stage_id, IngestSummary, ProductionApi};
