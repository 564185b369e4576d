// ==========================================
// 服装生产管理系统 - 质检引擎
// ==========================================
// 红线1: 质检是分支点,不是线性工序
// 红线2: 质检记录只追加,不可修改
// 红线3: 不合格必须指定质检之前的返工工序
// ==========================================
// 合格 → 转包装
// 不合格 → 返工工序重置为待开始,工单挂起
// ==========================================

use crate::domain::job::{ProductionJob, QcInspection};
use crate::domain::stage::StageId;
use crate::domain::types::{ProductionStatus, QcResult, QualityStatus};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::engine::workflow::{ensure_stage_layout, refresh_completion};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// QcInspectionRequest - 质检登记请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcInspectionRequest {
    pub result: QcResult,
    pub checked_items: BTreeSet<String>,
    pub defect_notes: String,
    pub return_to_stage_id: Option<StageId>,
}

impl QcInspectionRequest {
    /// 合格
    pub fn passed<I, S>(checked_items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            result: QcResult::Passed,
            checked_items: checked_items.into_iter().map(Into::into).collect(),
            defect_notes: String::new(),
            return_to_stage_id: None,
        }
    }

    /// 不合格并返工
    pub fn failed(defect_notes: impl Into<String>, return_to: StageId) -> Self {
        Self {
            result: QcResult::Failed,
            checked_items: BTreeSet::new(),
            defect_notes: defect_notes.into(),
            return_to_stage_id: Some(return_to),
        }
    }
}

// ==========================================
// QualityControlEngine - 质检引擎
// ==========================================
pub struct QualityControlEngine {}

impl QualityControlEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 登记质检
    ///
    /// # 前置条件
    /// - 工单未完工
    /// - 质检尚未合格
    /// - 质检之前的工序全部完成
    /// - 不合格时返工工序位于质检之前
    ///
    /// # 返回
    /// - Ok(ProductionJob): 追加质检记录后的工单
    /// - Err(WorkflowError): 前置条件不满足,`job` 保持不变
    pub fn record_inspection(
        &self,
        job: &ProductionJob,
        request: &QcInspectionRequest,
        today: NaiveDate,
    ) -> WorkflowResult<ProductionJob> {
        if let Err(e) = check_inspection(job, request) {
            tracing::warn!(
                job_order = %job.job_order_id,
                result = %request.result,
                kind = e.kind(),
                "质检登记被拒绝: {}", e
            );
            return Err(e);
        }

        let mut next = job.clone();

        let inspection = QcInspection {
            inspection_id: uuid::Uuid::new_v4().to_string(),
            date: today,
            result: request.result,
            checked_items: request.checked_items.clone(),
            defect_notes: request.defect_notes.clone(),
            return_to_stage_id: match request.result {
                QcResult::Passed => None,
                QcResult::Failed => request.return_to_stage_id,
            },
        };

        next.quality_status = request.result.as_quality_status();
        next.stage_mut(StageId::QualityControl)
            .mark_completed(today, qc_remarks(request));

        match request.result {
            QcResult::Passed => {
                next.current_stage_id = StageId::Packaging;
                next.production_status = ProductionStatus::InProgress;
            }
            QcResult::Failed => {
                if let Some(target) = inspection.return_to_stage_id {
                    next.stage_mut(target).reset_to_pending();
                    next.current_stage_id = target;
                }
                next.production_status = ProductionStatus::OnHold;
            }
        }

        next.qc_inspections.push(inspection);
        refresh_completion(&mut next, today);

        tracing::info!(
            job_order = %next.job_order_id,
            result = %request.result,
            return_to = ?request.return_to_stage_id,
            attempt = next.qc_inspections.len(),
            "质检已登记"
        );
        Ok(next)
    }

    /// 某工单当前能否质检
    pub fn can_inspect(&self, job: &ProductionJob) -> bool {
        check_preconditions(job).is_ok()
    }
}

impl Default for QualityControlEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_preconditions(job: &ProductionJob) -> WorkflowResult<()> {
    ensure_stage_layout(job)?;
    if job.is_completed() {
        return Err(WorkflowError::JobAlreadyCompleted(job.job_order_id.clone()));
    }
    if job.quality_status == QualityStatus::Passed {
        return Err(WorkflowError::QcAlreadyPassed);
    }

    let qc_index = StageId::QualityControl.sequence_index();
    if let Some(pending) = job.stages[..qc_index].iter().find(|s| !s.is_completed()) {
        return Err(WorkflowError::ProductionIncomplete {
            pending_stage: pending.stage_id,
        });
    }
    Ok(())
}

fn check_inspection(job: &ProductionJob, request: &QcInspectionRequest) -> WorkflowResult<()> {
    check_preconditions(job)?;

    if request.result == QcResult::Failed {
        match request.return_to_stage_id {
            None => {
                return Err(WorkflowError::InvalidReworkTarget(
                    "不合格时必须指定返工工序".to_string(),
                ))
            }
            Some(target)
                if target.sequence_index() >= StageId::QualityControl.sequence_index() =>
            {
                return Err(WorkflowError::InvalidReworkTarget(format!(
                    "返工工序必须位于质检之前: {}",
                    target
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// 质检工序备注: "Result: PASSED" / "Result: FAILED. <缺陷说明>"
fn qc_remarks(request: &QcInspectionRequest) -> String {
    let result = request.result.to_db_str().to_uppercase();
    let notes = request.defect_notes.trim();
    if notes.is_empty() {
        format!("Result: {}", result)
    } else {
        format!("Result: {}. {}", result, notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job_order::JobOrderRecord;
    use crate::domain::types::{OrderStatus, StageStatus};
    use crate::engine::job_factory::ProductionJobFactory;
    use crate::engine::workflow::{StageUpdate, WorkflowEngine};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    fn job_through(last: StageId) -> ProductionJob {
        let engine = WorkflowEngine::new();
        let mut job = ProductionJobFactory::default().create_job(&JobOrderRecord {
            job_order_number: "JO-7".to_string(),
            order_id: "ORD-7".to_string(),
            order_status: OrderStatus::Approved,
            client_name: Some("Blue Line".to_string()),
            garment_type: Some("Uniform".to_string()),
            quantity: Some(50),
            size_details: None,
            fabric_type: Some("Twill".to_string()),
            special_instructions: None,
        });
        for stage in StageId::ALL.iter().take(last.sequence_index() + 1) {
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
    fn test_passed_inspection_moves_to_packaging() {
        let engine = QualityControlEngine::new();
        let job = job_through(StageId::Embroidery);

        let job = engine
            .record_inspection(
                &job,
                &QcInspectionRequest::passed(["stitching", "measurements"]),
                today(),
            )
            .unwrap();

        assert_eq!(job.quality_status, QualityStatus::Passed);
        assert_eq!(job.current_stage_id, StageId::Packaging);
        let qc = job.stage(StageId::QualityControl);
        assert_eq!(qc.status, StageStatus::Completed);
        assert_eq!(qc.completion_date, Some(today()));
        assert_eq!(qc.remarks, "Result: PASSED");
        assert_eq!(job.qc_inspections.len(), 1);
        assert_eq!(job.qc_inspections[0].checked_items.len(), 2);
        assert!(!job.ready_for_billing);
    }

    #[test]
    fn test_failed_inspection_routes_rework() {
        let engine = QualityControlEngine::new();
        let job = job_through(StageId::Embroidery);

        let job = engine
            .record_inspection(
                &job,
                &QcInspectionRequest::failed("loose seams", StageId::Sewing),
                today(),
            )
            .unwrap();

        let sewing = job.stage(StageId::Sewing);
        assert_eq!(sewing.status, StageStatus::Pending);
        assert_eq!(sewing.completion_date, None);
        assert_eq!(job.production_status, ProductionStatus::OnHold);
        assert_eq!(job.current_stage_id, StageId::Sewing);
        assert_eq!(job.quality_status, QualityStatus::Failed);
        assert_eq!(
            job.stage(StageId::QualityControl).remarks,
            "Result: FAILED. loose seams"
        );
        assert!(job.invariant_violations().is_empty());
    }

    #[test]
    fn test_inspection_requires_finished_production() {
        let engine = QualityControlEngine::new();
        let job = job_through(StageId::Sewing);

        let err = engine
            .record_inspection(&job, &QcInspectionRequest::passed(Vec::<String>::new()), today())
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::ProductionIncomplete {
                pending_stage: StageId::Embroidery
            }
        );
        assert!(!engine.can_inspect(&job));
    }

    #[test]
    fn test_rework_target_must_precede_qc() {
        let engine = QualityControlEngine::new();
        let job = job_through(StageId::Embroidery);

        let err = engine
            .record_inspection(
                &job,
                &QcInspectionRequest::failed("wrong fold", StageId::Packaging),
                today(),
            )
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidReworkTarget(_)));

        // 质检工序自身不算"之前"
        let err = engine
            .record_inspection(
                &job,
                &QcInspectionRequest::failed("loose button", StageId::QualityControl),
                today(),
            )
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidReworkTarget(_)));

        // 最后一道生产工序是合法的最晚返工点
        assert!(engine
            .record_inspection(
                &job,
                &QcInspectionRequest::failed("loose thread", StageId::Embroidery),
                today(),
            )
            .is_ok());

        let mut missing = QcInspectionRequest::failed("no target", StageId::Sewing);
        missing.return_to_stage_id = None;
        let err = engine.record_inspection(&job, &missing, today()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidReworkTarget(_)));
        assert!(job.qc_inspections.is_empty());
    }

    #[test]
    fn test_rework_loop_then_pass() {
        let qc = QualityControlEngine::new();
        let workflow = WorkflowEngine::new();
        let job = job_through(StageId::Embroidery);

        let mut job = qc
            .record_inspection(
                &job,
                &QcInspectionRequest::failed("thread color", StageId::Embroidery),
                today(),
            )
            .unwrap();

        // 返工未完成时不能再次质检
        assert!(!qc.can_inspect(&job));

        for status in [StageStatus::InProgress, StageStatus::Completed] {
            job = workflow
                .start_or_advance_stage(
                    &job,
                    &StageUpdate::new(StageId::Embroidery, status),
                    today(),
                )
                .unwrap();
        }
        assert_eq!(job.production_status, ProductionStatus::OnHold);
        assert_eq!(job.current_stage_id, StageId::QualityControl);

        let job = qc
            .record_inspection(&job, &QcInspectionRequest::passed(["color"]), today())
            .unwrap();
        assert_eq!(job.production_status, ProductionStatus::InProgress);
        assert_eq!(job.quality_status, QualityStatus::Passed);
        assert_eq!(job.qc_inspections.len(), 2);
        assert_eq!(job.qc_inspections[0].result, QcResult::Failed);

        let err = qc
            .record_inspection(&job, &QcInspectionRequest::passed(["again"]), today())
            .unwrap_err();
        assert_eq!(err, WorkflowError::QcAlreadyPassed);
    }
}
