// ==========================================
// 服装生产管理系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束分类: 按 SQLite 扩展错误码,不解析消息文本
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 并发控制 =====
    #[error("工单已被并发修改: job_order_id={job_order_id}, 快照revision={expected}, 当前revision={actual}")]
    OptimisticLockFailure {
        job_order_id: String,
        expected: i32,
        actual: i32,
    },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    // ===== 读写 =====
    #[error("{entity}不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("SQL执行失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 存量数据 =====
    #[error("字段{field}取值无法解析: {message}")]
    FieldValueError { field: String, message: String },

    #[error("数据不完整: {0}")]
    InternalError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref cause, ref msg) => {
                let detail = msg.clone().unwrap_or_else(|| cause.to_string());
                match cause.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(detail)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        RepositoryError::ForeignKeyViolation(detail)
                    }
                    _ => RepositoryError::DatabaseQueryError(detail),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "记录".to_string(),
                id: "-".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::FieldValueError {
            field: "checked_items_json".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
