// ==========================================
// 服装生产管理系统 - 引擎层
// ==========================================
// 职责: 实现生产工作流规则,不拼 SQL
// 红线: Engine 不做持久化,校验先于变更
// ==========================================

pub mod error;
pub mod inventory_check;
pub mod job_factory;
pub mod packaging;
pub mod projection;
pub mod quality;
pub mod workflow;

// 重导出核心引擎
pub use error::{WorkflowError, WorkflowResult};
pub use inventory_check::{InventoryCheckEngine, MaterialSufficiency};
pub use job_factory::{FabricUsageTable, ProductionJobFactory};
pub use packaging::PackagingFinalizer;
pub use projection::{BillableJob, ProductionProjection, ProductionStatistics};
pub use quality::{QcInspectionRequest, QualityControlEngine};
pub use workflow::{StageUpdate, WorkflowEngine};
