// ==========================================
// 服装生产管理系统 - 生产工单领域模型
// ==========================================
// 聚合根: ProductionJob
// 红线: 工单只能经由引擎层变更,完工工单不可再变更
// 对齐: schema production_job / production_stage / qc_inspection 表
// ==========================================

use crate::domain::stage::{StageId, StageInstance};
use crate::domain::types::{ProductionStatus, QcResult, QualityStatus, StageStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// QcInspection - 质检记录
// ==========================================
// 红线: 创建后不可变,只追加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcInspection {
    pub inspection_id: String,
    pub date: NaiveDate,
    pub result: QcResult,
    pub checked_items: BTreeSet<String>, // 检验清单项
    pub defect_notes: String,
    pub return_to_stage_id: Option<StageId>, // 不合格时的返工工序
}

// ==========================================
// ProductionJob - 生产工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionJob {
    // ===== 主键与关联 =====
    pub job_order_id: String, // 工单号（来自订单模块,唯一）
    pub order_id: String,     // 订单号（只读反查）

    // ===== 订单信息 =====
    pub client_name: String,
    pub garment_type: String,
    pub quantity: u32,
    pub size_breakdown: String, // 尺码明细,如 "S: 10, M: 20"
    pub fabric_type: String,
    pub special_instructions: String,
    pub estimated_fabric_usage: f64, // 预估用料（创建时计算一次）

    // ===== 流程状态 =====
    pub production_status: ProductionStatus,
    pub current_stage_id: StageId, // 待处理工序
    pub quality_status: QualityStatus,
    pub date_started: Option<NaiveDate>,
    pub date_completed: Option<NaiveDate>,

    // ===== 工序与质检 =====
    pub stages: Vec<StageInstance>,      // 固定 6 道,按流水线顺序
    pub qc_inspections: Vec<QcInspection>, // 只追加

    // ===== 包装与结算 =====
    pub packaging_completed: bool,
    pub packaging_date: Option<NaiveDate>,
    pub ready_for_billing: bool,

    // ===== 并发控制 =====
    pub revision: i32, // 乐观锁版本号（仓储层维护）
}

impl ProductionJob {
    /// 按工序标识取工序实例
    pub fn stage(&self, stage_id: StageId) -> &StageInstance {
        &self.stages[stage_id.sequence_index()]
    }

    pub(crate) fn stage_mut(&mut self, stage_id: StageId) -> &mut StageInstance {
        &mut self.stages[stage_id.sequence_index()]
    }

    /// 工序向量是否为完整的 6 道且按流水线顺序排列
    pub fn has_standard_stage_layout(&self) -> bool {
        self.stages.len() == StageId::ALL.len()
            && self
                .stages
                .iter()
                .enumerate()
                .all(|(idx, s)| s.stage_id.sequence_index() == idx)
    }

    /// 当前进行中的工序（至多一道）
    pub fn in_progress_stage(&self) -> Option<&StageInstance> {
        self.stages.iter().find(|s| s.status == StageStatus::InProgress)
    }

    /// 最近一次质检记录
    pub fn latest_inspection(&self) -> Option<&QcInspection> {
        self.qc_inspections.last()
    }

    pub fn is_completed(&self) -> bool {
        self.production_status == ProductionStatus::Completed
    }

    /// 是否满足结算条件
    ///
    /// 完工 + 包装完成 + 质检合格
    pub fn meets_billing_conditions(&self) -> bool {
        self.production_status == ProductionStatus::Completed
            && self.packaging_completed
            && self.quality_status == QualityStatus::Passed
    }

    /// 检查聚合不变式,返回全部违规描述（空 = 合法）
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.stages.len() != StageId::ALL.len() {
            violations.push(format!("工序数量异常: {}", self.stages.len()));
            return violations;
        }

        for (idx, stage) in self.stages.iter().enumerate() {
            if stage.stage_id.sequence_index() != idx {
                violations.push(format!("工序顺序异常: {} 位于 {}", stage.stage_id, idx));
            }
            if stage.completion_date.is_some() != (stage.status == StageStatus::Completed) {
                violations.push(format!("工序 {} 完成日期与状态不一致", stage.stage_id));
            }
        }

        let in_progress = self
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::InProgress)
            .count();
        if in_progress > 1 {
            violations.push(format!("同时进行中的工序数: {}", in_progress));
        }

        if self.ready_for_billing != self.meets_billing_conditions() {
            violations.push("结算标志与完工条件不一致".to_string());
        }

        if self.quality_status == QualityStatus::Failed {
            if self.production_status != ProductionStatus::OnHold {
                violations.push("质检不合格但工单未挂起".to_string());
            }
            match self.latest_inspection().and_then(|i| i.return_to_stage_id) {
                Some(target)
                    if target.sequence_index() >= StageId::QualityControl.sequence_index() =>
                {
                    violations.push(format!("返工工序非法: {}", target));
                }
                Some(_) => {}
                None => violations.push("质检不合格但缺少返工工序".to_string()),
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_job() -> ProductionJob {
        ProductionJob {
            job_order_id: "JO-1".to_string(),
            order_id: "ORD-1".to_string(),
            client_name: "Acme".to_string(),
            garment_type: "T-Shirt".to_string(),
            quantity: 10,
            size_breakdown: "M: 10".to_string(),
            fabric_type: "Cotton".to_string(),
            special_instructions: String::new(),
            estimated_fabric_usage: 12.0,
            production_status: ProductionStatus::NotStarted,
            current_stage_id: StageId::PatternMaking,
            quality_status: QualityStatus::Pending,
            date_started: None,
            date_completed: None,
            stages: StageInstance::initialize_all(),
            qc_inspections: Vec::new(),
            packaging_completed: false,
            packaging_date: None,
            ready_for_billing: false,
            revision: 0,
        }
    }

    #[test]
    fn test_fresh_job_has_no_violations() {
        let job = make_job();
        assert!(job.invariant_violations().is_empty());
        assert!(job.in_progress_stage().is_none());
        assert_eq!(job.stage(StageId::Sewing).stage_id, StageId::Sewing);
    }

    #[test]
    fn test_detects_two_in_progress_stages() {
        let mut job = make_job();
        job.stage_mut(StageId::PatternMaking).status = StageStatus::InProgress;
        job.stage_mut(StageId::Cutting).status = StageStatus::InProgress;
        let violations = job.invariant_violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("同时进行中"));
    }

    #[test]
    fn test_detects_billing_flag_mismatch() {
        let mut job = make_job();
        job.ready_for_billing = true;
        assert!(!job.invariant_violations().is_empty());
    }
}
