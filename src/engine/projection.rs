// ==========================================
// 服装生产管理系统 - 查询投影
// ==========================================
// 职责: 只读统计与结算移交视图
// 红线: 纯函数,不修改工单
// ==========================================

use crate::domain::job::ProductionJob;
use crate::domain::stage::StageId;
use crate::domain::types::ProductionStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionStatistics - 生产状态统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionStatistics {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub on_hold: usize,
    pub completed: usize,
    pub ready_for_billing: usize,
}

// ==========================================
// BillableJob - 结算移交视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillableJob {
    pub job_order_id: String,
    pub order_id: String,
    pub client_name: String,
    pub garment_type: String,
    pub quantity: u32,
    pub date_completed: Option<chrono::NaiveDate>,
    pub packaging_date: Option<chrono::NaiveDate>,
}

impl From<&ProductionJob> for BillableJob {
    fn from(job: &ProductionJob) -> Self {
        Self {
            job_order_id: job.job_order_id.clone(),
            order_id: job.order_id.clone(),
            client_name: job.client_name.clone(),
            garment_type: job.garment_type.clone(),
            quantity: job.quantity,
            date_completed: job.date_completed,
            packaging_date: job.packaging_date,
        }
    }
}

pub struct ProductionProjection {}

impl ProductionProjection {
    pub fn new() -> Self {
        Self {}
    }

    /// 可结算工单
    pub fn billable<'a>(&self, jobs: &'a [ProductionJob]) -> Vec<&'a ProductionJob> {
        jobs.iter()
            .filter(|j| {
                j.ready_for_billing
                    && j.production_status == ProductionStatus::Completed
                    && j.packaging_completed
            })
            .collect()
    }

    /// 按生产状态统计
    pub fn statistics(&self, jobs: &[ProductionJob]) -> ProductionStatistics {
        let mut stats = ProductionStatistics {
            total: jobs.len(),
            ..Default::default()
        };
        for job in jobs {
            match job.production_status {
                ProductionStatus::NotStarted => stats.not_started += 1,
                ProductionStatus::InProgress => stats.in_progress += 1,
                ProductionStatus::OnHold => stats.on_hold += 1,
                ProductionStatus::Completed => stats.completed += 1,
            }
            if job.ready_for_billing {
                stats.ready_for_billing += 1;
            }
        }
        stats
    }

    /// 按工单号/客户名模糊搜索（忽略大小写,空关键字返回全部）
    pub fn search<'a>(&self, jobs: &'a [ProductionJob], term: &str) -> Vec<&'a ProductionJob> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return jobs.iter().collect();
        }
        jobs.iter()
            .filter(|j| {
                j.job_order_id.to_lowercase().contains(&term)
                    || j.client_name.to_lowercase().contains(&term)
            })
            .collect()
    }

    /// 按生产状态/当前工序过滤（None = 不限）
    pub fn filter<'a>(
        &self,
        jobs: &'a [ProductionJob],
        status: Option<ProductionStatus>,
        current_stage: Option<StageId>,
    ) -> Vec<&'a ProductionJob> {
        jobs.iter()
            .filter(|j| status.map_or(true, |s| j.production_status == s))
            .filter(|j| current_stage.map_or(true, |s| j.current_stage_id == s))
            .collect()
    }
}

impl Default for ProductionProjection {
    fn default() -> Self {
        Self::new()
    }
}
