// ==========================================
// 服装生产管理系统 - 工序流转引擎
// ==========================================
// 红线1: 工序严格按顺序推进,前序未完成不得开工/完工
// 红线2: 同一工单同一时刻至多一道工序进行中
// 红线3: 质检工序只能经质检登记完成
// 红线4: 质检合格前不得直接变更包装工序
// ==========================================
// 输入: 工单快照 + 工序变更请求
// 输出: 变更后的工单（失败时原工单不变）
// ==========================================

use crate::domain::job::ProductionJob;
use crate::domain::stage::StageId;
use crate::domain::types::{ProductionStatus, QualityStatus, StageStatus};
use crate::engine::error::{WorkflowError, WorkflowResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// StageUpdate - 工序变更请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageUpdate {
    pub stage_id: StageId,
    pub status: StageStatus,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>, // 完工时缺省取当天
    pub remarks: String,
}

impl StageUpdate {
    pub fn new(stage_id: StageId, status: StageStatus) -> Self {
        Self {
            stage_id,
            status,
            start_date: None,
            completion_date: None,
            remarks: String::new(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn with_dates(
        mut self,
        start_date: Option<NaiveDate>,
        completion_date: Option<NaiveDate>,
    ) -> Self {
        self.start_date = start_date;
        self.completion_date = completion_date;
        self
    }
}

// ==========================================
// WorkflowEngine - 工序流转引擎
// ==========================================
/// 无状态引擎,持久化由调用方处理
pub struct WorkflowEngine {}

impl WorkflowEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 开工/推进工序
    ///
    /// # 参数
    /// - `job`: 工单快照
    /// - `update`: 工序变更请求
    /// - `today`: 业务日期
    ///
    /// # 返回
    /// - Ok(ProductionJob): 变更后的工单
    /// - Err(WorkflowError): 前置条件不满足,`job` 保持不变
    pub fn start_or_advance_stage(
        &self,
        job: &ProductionJob,
        update: &StageUpdate,
        today: NaiveDate,
    ) -> WorkflowResult<ProductionJob> {
        self.validate(job, update)?;

        let mut next = job.clone();
        let stage_id = update.stage_id;

        {
            let stage = next.stage_mut(stage_id);
            stage.status = update.status;
            stage.remarks = update.remarks.clone();
            match update.status {
                StageStatus::Pending => {
                    stage.start_date = update.start_date.or(stage.start_date);
                    stage.completion_date = None;
                }
                StageStatus::InProgress => {
                    stage.start_date = update.start_date.or(stage.start_date).or(Some(today));
                    stage.completion_date = None;
                }
                StageStatus::Completed => {
                    let completion = update.completion_date.unwrap_or(today);
                    stage.start_date = update.start_date.or(stage.start_date).or(Some(completion));
                    stage.completion_date = Some(completion);
                }
            }
        }

        if update.status != StageStatus::Pending
            && next.production_status == ProductionStatus::NotStarted
        {
            next.production_status = ProductionStatus::InProgress;
            next.date_started = Some(today);
        }

        if update.status == StageStatus::Completed {
            if let Some(following) = stage_id.next() {
                next.current_stage_id = following;
            }
        }

        refresh_completion(&mut next, today);

        tracing::info!(
            job_order = %next.job_order_id,
            stage = %stage_id,
            status = %update.status,
            "工序状态已更新"
        );
        Ok(next)
    }

    /// 校验工序变更的前置条件（不修改工单）
    pub fn validate(&self, job: &ProductionJob, update: &StageUpdate) -> WorkflowResult<()> {
        let result = check_stage_update(job, update);
        if let Err(ref e) = result {
            tracing::warn!(
                job_order = %job.job_order_id,
                stage = %update.stage_id,
                status = %update.status,
                kind = e.kind(),
                "工序变更被拒绝: {}", e
            );
        }
        result
    }

    /// 某工序当前能否开工（供界面置灰按钮等只读场景）
    pub fn can_start(&self, job: &ProductionJob, stage_id: StageId) -> bool {
        check_stage_update(job, &StageUpdate::new(stage_id, StageStatus::InProgress)).is_ok()
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_stage_update(job: &ProductionJob, update: &StageUpdate) -> WorkflowResult<()> {
    ensure_stage_layout(job)?;
    if job.is_completed() {
        return Err(WorkflowError::JobAlreadyCompleted(job.job_order_id.clone()));
    }

    match update.stage_id {
        StageId::QualityControl => return Err(WorkflowError::QcRequiresInspection),
        StageId::Packaging if job.quality_status != QualityStatus::Passed => {
            return Err(WorkflowError::PackagingRequiresPassedQc {
                quality_status: job.quality_status,
            })
        }
        _ => {}
    }

    if update.status == StageStatus::Pending {
        return Ok(());
    }

    if let Some(previous) = update.stage_id.previous() {
        if !job.stage(previous).is_completed() {
            return Err(WorkflowError::PreviousStageIncomplete {
                stage: update.stage_id,
                previous,
            });
        }
    }

    if let Some(active) = job
        .stages
        .iter()
        .find(|s| s.is_in_progress() && s.stage_id != update.stage_id)
    {
        return Err(WorkflowError::ConcurrentStageInProgress {
            stage: update.stage_id,
            in_progress: active.stage_id,
        });
    }

    Ok(())
}

/// 反序列化得到的工单可能缺少工序,引擎按下标访问前先拦截
pub(crate) fn ensure_stage_layout(job: &ProductionJob) -> WorkflowResult<()> {
    if job.has_standard_stage_layout() {
        Ok(())
    } else {
        Err(WorkflowError::MalformedStages(job.job_order_id.clone()))
    }
}

/// 完工判定
///
/// 全部工序完成 + 质检合格 + 包装完成 → 完工并可结算
pub(crate) fn refresh_completion(job: &mut ProductionJob, today: NaiveDate) {
    let all_completed = job.stages.iter().all(|s| s.is_completed());
    if all_completed
        && job.quality_status == QualityStatus::Passed
        && job.packaging_completed
        && job.production_status != ProductionStatus::Completed
    {
        job.production_status = ProductionStatus::Completed;
        job.date_completed = Some(job.date_completed.unwrap_or(today));
    }
    job.ready_for_billing = job.meets_billing_conditions();
}
