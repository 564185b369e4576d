// ==========================================
// 服装生产管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户友好的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::WorkflowError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 工作流规则错误
    // ==========================================
    /// 工序流转前置条件不满足（工单保持原样）
    #[error("工作流规则违反[{kind}]: {0}", kind = .0.kind())]
    Workflow(#[from] WorkflowError),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 工作流错误类别（非工作流错误返回 None）
    pub fn workflow_kind(&self) -> Option<&'static str> {
        match self {
            ApiError::Workflow(e) => Some(e.kind()),
            _ => None,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                job_order_id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "工单{}已被其他用户修改（期望revision={}，实际revision={}）",
                job_order_id, expected, actual
            )),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 存量数据错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("字段{}取值异常: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
