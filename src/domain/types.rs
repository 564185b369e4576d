// ==========================================
// 服装生产管理系统 - 领域类型定义
// ==========================================
// 红线: 状态字段一律为封闭枚举,不允许字符串比较
// 序列化格式: snake_case (与数据库、协作模块一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工序状态 (Stage Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,    // 待开始
    InProgress, // 进行中
    Completed,  // 已完成
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl StageStatus {
    /// 从字符串解析工序状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(StageStatus::Pending),
            "in_progress" => Some(StageStatus::InProgress),
            "completed" => Some(StageStatus::Completed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::InProgress => "in_progress",
            StageStatus::Completed => "completed",
        }
    }
}

// ==========================================
// 生产状态 (Production Status)
// ==========================================
// 流转: NotStarted → InProgress ⇄ OnHold → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    NotStarted, // 未开工
    InProgress, // 生产中
    OnHold,     // 质检不合格,返工挂起
    Completed,  // 已完工(终态)
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ProductionStatus {
    /// 从字符串解析生产状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "not_started" => Some(ProductionStatus::NotStarted),
            "in_progress" => Some(ProductionStatus::InProgress),
            "on_hold" => Some(ProductionStatus::OnHold),
            "completed" => Some(ProductionStatus::Completed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProductionStatus::NotStarted => "not_started",
            ProductionStatus::InProgress => "in_progress",
            ProductionStatus::OnHold => "on_hold",
            ProductionStatus::Completed => "completed",
        }
    }
}

// ==========================================
// 质量状态 (Quality Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Pending, // 未检验
    Passed,  // 合格
    Failed,  // 不合格
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl QualityStatus {
    /// 从字符串解析质量状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(QualityStatus::Pending),
            "passed" => Some(QualityStatus::Passed),
            "failed" => Some(QualityStatus::Failed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            QualityStatus::Pending => "pending",
            QualityStatus::Passed => "passed",
            QualityStatus::Failed => "failed",
        }
    }
}

// ==========================================
// 质检结论 (QC Result)
// ==========================================
// 与 QualityStatus 分开: 检验记录不存在 "pending"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcResult {
    Passed,
    Failed,
}

impl fmt::Display for QcResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl QcResult {
    /// 从字符串解析质检结论
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "passed" => Some(QcResult::Passed),
            "failed" => Some(QcResult::Failed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            QcResult::Passed => "passed",
            QcResult::Failed => "failed",
        }
    }

    /// 对应的工单质量状态
    pub fn as_quality_status(&self) -> QualityStatus {
        match self {
            QcResult::Passed => QualityStatus::Passed,
            QcResult::Failed => QualityStatus::Failed,
        }
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 来源: 订单管理模块,只读
// 只有 Approved 的订单才会进入生产
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Approved => write!(f, "approved"),
            OrderStatus::Rejected => write!(f, "rejected"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl OrderStatus {
    /// 从字符串解析订单状态（未知值按 Pending 处理,不会进入生产）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "approved" => OrderStatus::Approved,
            "rejected" => OrderStatus::Rejected,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        }
    }
}
