// ==========================================
// 服装生产管理系统 - 工序定义与工序实例
// ==========================================
// 红线: 工序固定 6 道,顺序固定,不可增删
// 打版 → 裁剪 → 缝制 → 刺绣 → 质检 → 包装
// ==========================================

use crate::domain::types::StageStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// StageId - 工序标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    PatternMaking,  // 打版
    Cutting,        // 裁剪
    Sewing,         // 缝制
    Embroidery,     // 刺绣
    QualityControl, // 质检
    Packaging,      // 包装
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl StageId {
    /// 全部工序（按流水线顺序）
    pub const ALL: [StageId; 6] = [
        StageId::PatternMaking,
        StageId::Cutting,
        StageId::Sewing,
        StageId::Embroidery,
        StageId::QualityControl,
        StageId::Packaging,
    ];

    /// 从字符串解析工序标识
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pattern_making" => Some(StageId::PatternMaking),
            "cutting" => Some(StageId::Cutting),
            "sewing" => Some(StageId::Sewing),
            "embroidery" => Some(StageId::Embroidery),
            "quality_control" => Some(StageId::QualityControl),
            "packaging" => Some(StageId::Packaging),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StageId::PatternMaking => "pattern_making",
            StageId::Cutting => "cutting",
            StageId::Sewing => "sewing",
            StageId::Embroidery => "embroidery",
            StageId::QualityControl => "quality_control",
            StageId::Packaging => "packaging",
        }
    }

    /// 流水线位置（0 起）
    pub fn sequence_index(&self) -> usize {
        match self {
            StageId::PatternMaking => 0,
            StageId::Cutting => 1,
            StageId::Sewing => 2,
            StageId::Embroidery => 3,
            StageId::QualityControl => 4,
            StageId::Packaging => 5,
        }
    }

    /// 静态工序定义
    pub fn definition(&self) -> &'static StageDefinition {
        &PRODUCTION_STAGES[self.sequence_index()]
    }

    /// 紧前工序（首道工序返回 None）
    pub fn previous(&self) -> Option<StageId> {
        let idx = self.sequence_index();
        if idx == 0 {
            None
        } else {
            Some(Self::ALL[idx - 1])
        }
    }

    /// 紧后工序（末道工序返回 None）
    pub fn next(&self) -> Option<StageId> {
        Self::ALL.get(self.sequence_index() + 1).copied()
    }

    pub fn is_first(&self) -> bool {
        self.sequence_index() == 0
    }

    pub fn is_last(&self) -> bool {
        self.sequence_index() == Self::ALL.len() - 1
    }
}

// ==========================================
// StageDefinition - 静态工序定义
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDefinition {
    pub id: StageId,
    pub name: &'static str,
    pub department: &'static str, // 负责部门
    pub sequence_index: usize,
}

/// 生产流水线（顺序即工序顺序）
pub const PRODUCTION_STAGES: [StageDefinition; 6] = [
    StageDefinition {
        id: StageId::PatternMaking,
        name: "Pattern Making",
        department: "Pattern Making",
        sequence_index: 0,
    },
    StageDefinition {
        id: StageId::Cutting,
        name: "Cutting",
        department: "Cutting",
        sequence_index: 1,
    },
    StageDefinition {
        id: StageId::Sewing,
        name: "Sewing",
        department: "Sewing",
        sequence_index: 2,
    },
    StageDefinition {
        id: StageId::Embroidery,
        name: "Embroidery",
        department: "Embroidery",
        sequence_index: 3,
    },
    StageDefinition {
        id: StageId::QualityControl,
        name: "Quality Control Inspection",
        department: "Quality Control",
        sequence_index: 4,
    },
    StageDefinition {
        id: StageId::Packaging,
        name: "Packaging",
        department: "Packaging",
        sequence_index: 5,
    },
];

// ==========================================
// StageInstance - 工单上的工序实例
// ==========================================
// 不变式: completion_date 有值 ⇔ status == Completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInstance {
    pub stage_id: StageId,
    pub status: StageStatus,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub remarks: String,
}

impl StageInstance {
    /// 创建待开始的工序实例
    pub fn pending(stage_id: StageId) -> Self {
        Self {
            stage_id,
            status: StageStatus::Pending,
            start_date: None,
            completion_date: None,
            remarks: String::new(),
        }
    }

    /// 按流水线顺序初始化全部工序
    pub fn initialize_all() -> Vec<StageInstance> {
        StageId::ALL.iter().map(|id| StageInstance::pending(*id)).collect()
    }

    pub fn definition(&self) -> &'static StageDefinition {
        self.stage_id.definition()
    }

    pub fn is_completed(&self) -> bool {
        self.status == StageStatus::Completed
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == StageStatus::InProgress
    }

    /// 标记完成
    pub(crate) fn mark_completed(&mut self, date: NaiveDate, remarks: String) {
        self.status = StageStatus::Completed;
        if self.start_date.is_none() {
            self.start_date = Some(date);
        }
        self.completion_date = Some(date);
        self.remarks = remarks;
    }

    /// 重置为待开始（返工）
    pub(crate) fn reset_to_pending(&mut self) {
        self.status = StageStatus::Pending;
        self.completion_date = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_ordered() {
        for (idx, def) in PRODUCTION_STAGES.iter().enumerate() {
            assert_eq!(def.sequence_index, idx);
            assert_eq!(def.id, StageId::ALL[idx]);
            assert_eq!(def.id.sequence_index(), idx);
        }
    }

    #[test]
    fn test_previous_and_next() {
        assert_eq!(StageId::PatternMaking.previous(), None);
        assert_eq!(StageId::Sewing.previous(), Some(StageId::Cutting));
        assert_eq!(StageId::Embroidery.next(), Some(StageId::QualityControl));
        assert_eq!(StageId::Packaging.next(), None);
        assert!(StageId::Packaging.is_last());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(StageId::from_str("quality_control"), Some(StageId::QualityControl));
        assert_eq!(StageId::from_str("ironing"), None);
    }

    #[test]
    fn test_initialize_all_pending() {
        let stages = StageInstance::initialize_all();
        assert_eq!(stages.len(), 6);
        assert!(stages.iter().all(|s| s.status == StageStatus::Pending));
        assert!(stages.iter().all(|s| s.completion_date.is_none()));
        assert_eq!(stages[0].definition().department, "Pattern Making");
    }
}
