// ==========================================
// 服装生产管理系统 - 核心库
// ==========================================
// 范围: 生产跟踪（工序流转、质检闸门、包装完工、结算移交）
// 技术栈: Rust + SQLite
// 协作方: 订单模块（已审批工单）、库存模块（可用量）、结算模块（可结算工单）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{OrderStatus, ProductionStatus, QcResult, QualityStatus, StageStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, JobOrderRecord, ProductionJob, QcInspection, StageDefinition, StageId,
    StageInstance, PRODUCTION_STAGES,
};

// 引擎
pub use engine::{
    FabricUsageTable, InventoryCheckEngine, PackagingFinalizer, ProductionJobFactory,
    ProductionProjection, QualityControlEngine, WorkflowEngine, WorkflowError,
};

// API
pub use api::{ApiError, ApiResult, ProductionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "服装生产管理系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(PRODUCTION_STAGES.len(), 6);
    }
}
