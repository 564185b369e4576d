// ==========================================
// 服装生产管理系统 - 包装完工
// ==========================================
// 红线: 质检合格是包装完工的唯一前提
// 红线: 这里是工单进入"可结算"的唯一入口
// ==========================================

use crate::domain::job::ProductionJob;
use crate::domain::stage::StageId;
use crate::domain::types::{ProductionStatus, QualityStatus};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::engine::workflow::ensure_stage_layout;
use chrono::NaiveDate;

const DEFAULT_PACKAGING_REMARKS: &str = "Packaging completed";

pub struct PackagingFinalizer {}

impl PackagingFinalizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 完成包装并移交结算
    ///
    /// # 返回
    /// - Ok(ProductionJob): 已完工、可结算的工单
    /// - Err(WorkflowError::QcNotPassed): 质检未合格
    pub fn complete_packaging(
        &self,
        job: &ProductionJob,
        notes: &str,
        today: NaiveDate,
    ) -> WorkflowResult<ProductionJob> {
        ensure_stage_layout(job)?;
        if job.is_completed() {
            return Err(WorkflowError::JobAlreadyCompleted(job.job_order_id.clone()));
        }
        if job.quality_status != QualityStatus::Passed {
            tracing::warn!(
                job_order = %job.job_order_id,
                quality_status = %job.quality_status,
                "质检未合格,拒绝包装完工"
            );
            return Err(WorkflowError::QcNotPassed {
                quality_status: job.quality_status,
            });
        }

        // 质检合格后被重新打开的工序
        if let Some(reopened) = job
            .stages
            .iter()
            .find(|s| s.stage_id != StageId::Packaging && !s.is_completed())
        {
            return Err(WorkflowError::ProductionIncomplete {
                pending_stage: reopened.stage_id,
            });
        }

        let mut next = job.clone();
        let remarks = match notes.trim() {
            "" => DEFAULT_PACKAGING_REMARKS.to_string(),
            n => n.to_string(),
        };
        next.stage_mut(StageId::Packaging).mark_completed(today, remarks);

        next.packaging_completed = true;
        next.packaging_date = Some(today);
        next.current_stage_id = StageId::Packaging;
        next.production_status = ProductionStatus::Completed;
        next.date_completed = Some(today);
        next.ready_for_billing = true;

        tracing::info!(
            job_order = %next.job_order_id,
            quantity = next.quantity,
            "包装完成,工单可结算"
        );
        Ok(next)
    }
}

impl Default for PackagingFinalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job_order::JobOrderRecord;
    use crate::domain::types::{OrderStatus, StageStatus};
    use crate::engine::job_factory::ProductionJobFactory;
    use crate::engine::quality::{QcInspectionRequest, QualityControlEngine};
    use crate::engine::workflow::{StageUpdate, WorkflowEngine};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    fn produced_job() -> ProductionJob {
        let engine = WorkflowEngine::new();
        let mut job = ProductionJobFactory::default().create_job(&JobOrderRecord {
            job_order_number: "JO-3".to_string(),
            order_id: "ORD-3".to_string(),
            order_status: OrderStatus::Approved,
            client_name: Some("Harbor Cafe".to_string()),
            garment_type: Some("Jacket".to_string()),
            quantity: Some(8),
            size_details: None,
            fabric_type: None,
            special_instructions: None,
        });
        for stage in &StageId::ALL[..4] {
            job = engine
                .start_or_advance_stage(
                    &job,
                    &StageUpdate::new(*stage, StageStatus::Completed),
                    today(),
                )
                .unwrap();
        }
        job
    }

    #[test]
    fn test_packaging_rejected_without_passed_qc() {
        let finalizer = PackagingFinalizer::new();
        let job = produced_job();

        let err = finalizer.complete_packaging(&job, "", today()).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::QcNotPassed {
                quality_status: QualityStatus::Pending
            }
        );

        let failed = QualityControlEngine::new()
            .record_inspection(
                &job,
                &QcInspectionRequest::failed("stain", StageId::Cutting),
                today(),
            )
            .unwrap();
        assert!(matches!(
            finalizer.complete_packaging(&failed, "", today()),
            Err(WorkflowError::QcNotPassed { .. })
        ));
    }

    #[test]
    fn test_packaging_marks_job_billable() {
        let finalizer = PackagingFinalizer::new();
        let job = QualityControlEngine::new()
            .record_inspection(&produced_job(), &QcInspectionRequest::passed(["labels"]), today())
            .unwrap();

        let job = finalizer.complete_packaging(&job, "", today()).unwrap();

        let packaging = job.stage(StageId::Packaging);
        assert_eq!(packaging.status, StageStatus::Completed);
        assert_eq!(packaging.remarks, "Packaging completed");
        assert!(job.packaging_completed);
        assert_eq!(job.packaging_date, Some(today()));
        assert_eq!(job.production_status, ProductionStatus::Completed);
        assert_eq!(job.date_completed, Some(today()));
        assert!(job.ready_for_billing);
        assert!(job.invariant_violations().is_empty());

        let err = finalizer.complete_packaging(&job, "again", today()).unwrap_err();
        assert!(matches!(err, WorkflowError::JobAlreadyCompleted(_)));
    }
}
