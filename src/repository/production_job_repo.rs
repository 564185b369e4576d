// ==========================================
// 服装生产管理系统 - 生产工单数据仓储
// ==========================================
// 对齐: schema production_job / production_stage / qc_inspection 表
// 红线: Repository 不含业务逻辑,只做数据映射
// 红线: 质检记录只插入,不更新
// ==========================================

mod core;
mod queries;


pub use core::ProductionJobRepository;
