// ==========================================
// 服装生产管理系统 - 生产工单工厂
// ==========================================
// 职责: 把订单模块已审批的工单转换为 ProductionJob
// 红线: 入产幂等,已存在的工单原样保留,集合只增不减
// ==========================================
// 输入: 工单记录（含订单状态） + 现有工单集合
// 输出: 更新后的工单集合
// ==========================================

use crate::domain::job::ProductionJob;
use crate::domain::job_order::JobOrderRecord;
use crate::domain::stage::{StageId, StageInstance};
use crate::domain::types::{ProductionStatus, QualityStatus};
use std::collections::{HashMap, HashSet};

/// 未识别款式时的单件用料
pub const DEFAULT_FABRIC_USAGE_PER_UNIT: f64 = 1.5;

/// 缺失客户名时的占位
pub const UNKNOWN_CLIENT: &str = "Unknown";

// ==========================================
// FabricUsageTable - 单件用料表
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct FabricUsageTable {
    base_usage: HashMap<String, f64>,
    default_per_unit: f64,
}

impl FabricUsageTable {
    /// 标准用料表
    pub fn standard() -> Self {
        let base_usage = [
            ("T-Shirt", 1.2),
            ("Polo Shirt", 1.5),
            ("Dress Shirt", 1.8),
            ("Pants", 2.0),
            ("Jacket", 2.5),
            ("Uniform", 2.2),
            ("Custom", 1.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            base_usage,
            default_per_unit: DEFAULT_FABRIC_USAGE_PER_UNIT,
        }
    }

    /// 覆写某款式的单件用料
    pub fn with_override(mut self, garment_type: &str, per_unit: f64) -> Self {
        self.base_usage.insert(garment_type.to_string(), per_unit);
        self
    }

    /// 覆写默认单件用料
    pub fn with_default(mut self, per_unit: f64) -> Self {
        self.default_per_unit = per_unit;
        self
    }

    /// 查询单件用料（未识别款式取默认值）
    pub fn per_unit(&self, garment_type: &str) -> f64 {
        self.base_usage
            .get(garment_type)
            .copied()
            .unwrap_or(self.default_per_unit)
    }

    /// 预估总用料 = 单件用料 × 数量,保留两位小数
    pub fn estimate(&self, garment_type: &str, quantity: u32) -> f64 {
        let raw = self.per_unit(garment_type) * f64::from(quantity);
        (raw * 100.0).round() / 100.0
    }
}

impl Default for FabricUsageTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ==========================================
// ProductionJobFactory - 工单工厂
// ==========================================
pub struct ProductionJobFactory {
    usage_table: FabricUsageTable,
}

impl ProductionJobFactory {
    pub fn new(usage_table: FabricUsageTable) -> Self {
        Self { usage_table }
    }

    pub fn usage_table(&self) -> &FabricUsageTable {
        &self.usage_table
    }

    /// 入产
    ///
    /// # 参数
    /// - `approved`: 订单模块提供的工单记录（未审批的会被跳过）
    /// - `existing`: 现有工单集合
    ///
    /// # 返回
    /// 现有工单（原样）+ 新建工单
    pub fn ingest(
        &self,
        approved: &[JobOrderRecord],
        existing: Vec<ProductionJob>,
    ) -> Vec<ProductionJob> {
        let existing_ids: HashSet<String> =
            existing.iter().map(|j| j.job_order_id.clone()).collect();
        let created = self.plan_new_jobs(approved, &existing_ids);

        let mut jobs = existing;
        jobs.extend(created);
        jobs
    }

    /// 计算需要新建的工单（不含已存在、重复或空白的工单号）
    pub fn plan_new_jobs(
        &self,
        records: &[JobOrderRecord],
        existing_ids: &HashSet<String>,
    ) -> Vec<ProductionJob> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut created = Vec::new();

        for record in records {
            if !record.is_approved() {
                tracing::debug!(
                    job_order = %record.job_order_number,
                    status = %record.order_status,
                    "订单未审批,跳过"
                );
                continue;
            }
            let id = record.job_order_number.trim();
            if id.is_empty() {
                tracing::warn!(order_id = %record.order_id, "工单号为空,跳过");
                continue;
            }
            if existing_ids.contains(id) || !seen.insert(id) {
                continue;
            }
            created.push(self.create_job(record));
        }

        created
    }

    /// 从单条工单记录创建生产工单
    pub fn create_job(&self, record: &JobOrderRecord) -> ProductionJob {
        let garment_type = non_empty_or(record.garment_type.as_deref(), "Unknown");
        let quantity = record.quantity.unwrap_or(0);

        ProductionJob {
            job_order_id: record.job_order_number.trim().to_string(),
            order_id: record.order_id.clone(),
            client_name: non_empty_or(record.client_name.as_deref(), UNKNOWN_CLIENT),
            estimated_fabric_usage: self.usage_table.estimate(&garment_type, quantity),
            garment_type,
            quantity,
            size_breakdown: record.size_details.clone().unwrap_or_default(),
            fabric_type: record.fabric_type.clone().unwrap_or_default(),
            special_instructions: record.special_instructions.clone().unwrap_or_default(),
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
}

impl Default for ProductionJobFactory {
    fn default() -> Self {
        Self::new(FabricUsageTable::standard())
    }
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
