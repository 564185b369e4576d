// ==========================================
// 服装生产管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::ProductionApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{
    init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION,
};
use crate::repository::{
    action_log_repo::ActionLogRepository, inventory_repo::InventoryRepository,
    production_job_repo::ProductionJobRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "GARMENT_PRODUCTION_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生产跟踪API
    pub production_api: Arc<ProductionApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 库存物料仓储（库存模块同步可用量）
    pub inventory_repo: Arc<InventoryRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并确保表结构存在,拒绝更高版本的schema
    /// 2. 初始化所有Repository
    /// 3. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库表结构初始化失败: {}", e))?;
        let schema_version = read_schema_version(&conn)
            .map_err(|e| format!("读取schema版本失败: {}", e))?
            .unwrap_or(0);
        if schema_version > CURRENT_SCHEMA_VERSION {
            return Err(format!(
                "数据库schema版本({})高于程序支持的版本({}),请升级程序",
                schema_version, CURRENT_SCHEMA_VERSION
            ));
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let job_repo = Arc::new(ProductionJobRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let inventory_repo = Arc::new(InventoryRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let production_api = Arc::new(ProductionApi::new(
            job_repo,
            action_log_repo.clone(),
            inventory_repo.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            production_api,
            config_manager,
            inventory_repo,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 GARMENT_PRODUCTION_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./garment_production.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("garment-production-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("garment-production");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("garment_production.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_bootstraps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert_eq!(state.production_api.get_statistics().unwrap().total, 0);
        assert_eq!(state.config_manager.get_fabric_unit().unwrap(), "meters");

        // 重复打开同一数据库（表结构幂等）
        assert!(AppState::new(db_path).is_ok());
    }

    #[test]
    fn test_app_state_rejects_newer_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("future.db").to_string_lossy().to_string();

        let conn = open_sqlite_connection(&db_path).unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION + 1],
        )
        .unwrap();
        drop(conn);

        let err = AppState::new(db_path).err().unwrap();
        assert!(err.contains("schema"));
    }
}
