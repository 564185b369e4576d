// ==========================================
// 服装生产管理系统 - 工单来源记录
// ==========================================
// 来源: 订单管理模块（外部协作方）
// 用途: 生产模块只读,经 ProductionJobFactory 转换为 ProductionJob
// ==========================================

use crate::domain::types::OrderStatus;
use serde::{Deserialize, Serialize};

/// 订单模块提供的工单记录（含关联订单的元数据与状态）
///
/// 元数据缺失时由工厂补默认值,不视为错误
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOrderRecord {
    pub job_order_number: String,
    pub order_id: String,
    pub order_status: OrderStatus,
    pub client_name: Option<String>,
    pub garment_type: Option<String>,
    pub quantity: Option<u32>,
    pub size_details: Option<String>,
    pub fabric_type: Option<String>,
    pub special_instructions: Option<String>,
}

impl JobOrderRecord {
    pub fn is_approved(&self) -> bool {
        self.order_status == OrderStatus::Approved
    }
}
