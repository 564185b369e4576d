// ==========================================
// 服装生产管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、工序注册表
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod job;
pub mod job_order;
pub mod stage;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use job::{ProductionJob, QcInspection};
pub use job_order::JobOrderRecord;
pub use stage::{StageDefinition, StageId, StageInstance, PRODUCTION_STAGES};
pub use types::{OrderStatus, ProductionStatus, QcResult, QualityStatus, StageStatus};
