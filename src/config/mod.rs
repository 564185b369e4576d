// ==========================================
// 服装生产管理系统 - 配置层
// ==========================================
// 职责: 单件用料表、库存单位等运行参数
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_FABRIC_UNIT};
