// ==========================================
// 服装生产管理系统 - 用料齐套检查
// ==========================================
// 输入: 工单预估用料 + 库存可用量（库存模块只读）
// 输出: 是否足量
// 红线: 仅作提示,不影响工序流转
// ==========================================

use crate::domain::job::ProductionJob;
use serde::{Deserialize, Serialize};

/// 未指定面料时的物料名
pub const GENERAL_FABRIC: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSufficiency {
    pub job_order_id: String,
    pub material_name: String,
    pub unit: String,
    pub required: f64,
    pub available: f64,
    pub sufficient: bool,
}

impl MaterialSufficiency {
    /// 缺口（足量时为 0）
    pub fn shortage(&self) -> f64 {
        (self.required - self.available).max(0.0)
    }
}

pub struct InventoryCheckEngine {}

impl InventoryCheckEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 工单对应的面料物料名
    pub fn fabric_material_name(&self, job: &ProductionJob) -> String {
        match job.fabric_type.trim() {
            "" => GENERAL_FABRIC.to_string(),
            fabric => fabric.to_string(),
        }
    }

    /// 比对预估用料与库存可用量
    pub fn evaluate(&self, job: &ProductionJob, available: f64, unit: &str) -> MaterialSufficiency {
        let required = job.estimated_fabric_usage;
        let sufficient = available >= required;
        if !sufficient {
            tracing::warn!(
                job_order = %job.job_order_id,
                required,
                available,
                "面料库存不足"
            );
        }
        MaterialSufficiency {
            job_order_id: job.job_order_id.clone(),
            material_name: self.fabric_material_name(job),
            unit: unit.to_string(),
            required,
            available,
            sufficient,
        }
    }
}

impl Default for InventoryCheckEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job_order::JobOrderRecord;
    use crate::domain::types::OrderStatus;
    use crate::engine::job_factory::ProductionJobFactory;

    fn job(fabric: Option<&str>) -> ProductionJob {
        ProductionJobFactory::default().create_job(&JobOrderRecord {
            job_order_number: "JO-5".to_string(),
            order_id: "ORD-5".to_string(),
            order_status: OrderStatus::Approved,
            client_name: None,
            garment_type: Some("Jacket".to_string()),
            quantity: Some(100),
            size_details: None,
            fabric_type: fabric.map(str::to_string),
            special_instructions: None,
        })
    }

    #[test]
    fn test_insufficient_stock() {
        let engine = InventoryCheckEngine::new();
        let check = engine.evaluate(&job(Some("Denim")), 200.0, "meters");
        assert_eq!(check.material_name, "Denim");
        assert_eq!(check.required, 250.0);
        assert!(!check.sufficient);
        assert_eq!(check.shortage(), 50.0);
    }

    #[test]
    fn test_sufficient_stock_uses_general_when_unspecified() {
        let engine = InventoryCheckEngine::new();
        let check = engine.evaluate(&job(None), 500.0, "meters");
        assert_eq!(check.material_name, "General");
        assert!(check.sufficient);
        assert_eq!(check.shortage(), 0.0);
    }
}
