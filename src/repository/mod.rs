// ==========================================
// 服装生产管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod inventory_repo;
pub mod production_job_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::{InventoryMaterial, InventoryRepository};
pub use production_job_repo::ProductionJobRepository;
