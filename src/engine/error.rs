// ==========================================
// 服装生产管理系统 - 引擎层错误类型
// ==========================================
// 红线: 全部为前置条件违反,校验先于变更,失败时工单保持原样
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::stage::StageId;
use crate::domain::types::QualityStatus;
use thiserror::Error;

/// 工作流错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    // ===== 工序顺序 =====
    #[error("前序工序未完成: stage={stage}, previous={previous}")]
    PreviousStageIncomplete { stage: StageId, previous: StageId },

    #[error("已有其他工序进行中: stage={stage}, in_progress={in_progress}")]
    ConcurrentStageInProgress { stage: StageId, in_progress: StageId },

    // ===== 工序闸门 =====
    #[error("质检工序只能通过质检登记完成")]
    QcRequiresInspection,

    #[error("质检未合格,不能直接变更包装工序: quality_status={quality_status}")]
    PackagingRequiresPassedQc { quality_status: QualityStatus },

    // ===== 质检 =====
    #[error("生产工序未全部完成,不能质检: pending_stage={pending_stage}")]
    ProductionIncomplete { pending_stage: StageId },

    #[error("返工工序无效: {0}")]
    InvalidReworkTarget(String),

    #[error("质检已合格,不能重复登记")]
    QcAlreadyPassed,

    // ===== 包装 =====
    #[error("质检未合格,不能完成包装: quality_status={quality_status}")]
    QcNotPassed { quality_status: QualityStatus },

    // ===== 通用 =====
    #[error("工单已完工,不可变更: job_order_id={0}")]
    JobAlreadyCompleted(String),

    #[error("未知工序: {0}")]
    UnknownStage(String),

    #[error("工单工序结构异常: job_order_id={0}")]
    MalformedStages(String),
}

impl WorkflowError {
    /// 错误类别代码（供上层展示/统计）
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::PreviousStageIncomplete { .. } => "PreviousStageIncomplete",
            WorkflowError::ConcurrentStageInProgress { .. } => "ConcurrentStageInProgress",
            WorkflowError::QcRequiresInspection => "QCRequiresInspection",
            WorkflowError::PackagingRequiresPassedQc { .. } => "PackagingRequiresPassedQC",
            WorkflowError::ProductionIncomplete { .. } => "ProductionIncomplete",
            WorkflowError::InvalidReworkTarget(_) => "InvalidReworkTarget",
            WorkflowError::QcAlreadyPassed => "QCAlreadyPassed",
            WorkflowError::QcNotPassed { .. } => "QCNotPassed",
            WorkflowError::JobAlreadyCompleted(_) => "JobAlreadyCompleted",
            WorkflowError::UnknownStage(_) => "UnknownStage",
            WorkflowError::MalformedStages(_) => "MalformedStages",
        }
    }
}

/// Result 类型别名
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_stages() {
        let err = WorkflowError::PreviousStageIncomplete {
            stage: StageId::Sewing,
            previous: StageId::Cutting,
        };
        let msg = err.to_string();
        assert!(msg.contains("sewing"));
        assert!(msg.contains("cutting"));
        assert_eq!(err.kind(), "PreviousStageIncomplete");
    }
}
