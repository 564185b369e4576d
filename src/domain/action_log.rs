// ==========================================
// 服装生产管理系统 - 操作日志领域模型
// ==========================================
// 红线: 所有工单写入必须记录
// 用途: 审计追踪（谁在何时把工单推进到了哪一步）
// 对齐: schema action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub job_order_id: String,
    pub action_type: String,      // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,
    pub actor: String,

    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,
}

impl ActionLog {
    /// 创建一条新的操作日志（本地时间戳）
    pub fn new(
        job_order_id: &str,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            job_order_id: job_order_id.to_string(),
            action_type: action_type.to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    IngestJobOrder,     // 工单入产
    UpdateStage,        // 工序状态变更
    RecordQcInspection, // 质检登记
    CompletePackaging,  // 包装完成
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::IngestJobOrder => write!(f, "INGEST_JOB_ORDER"),
            ActionType::UpdateStage => write!(f, "UPDATE_STAGE"),
            ActionType::RecordQcInspection => write!(f, "RECORD_QC_INSPECTION"),
            ActionType::CompletePackaging => write!(f, "COMPLETE_PACKAGING"),
        }
    }
}
