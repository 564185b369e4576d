// ==========================================
// 服装生产管理系统 - 生产跟踪 API
// ==========================================
// 职责: 工单入产、工序流转、质检登记、包装完工、查询统计
// 流程: 加载工单 → 引擎校验并变更 → 带 revision 保存 → 写操作日志
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::job::ProductionJob;
use crate::domain::job_order::JobOrderRecord;
use crate::domain::stage::StageId;
use crate::domain::types::{ProductionStatus, QcResult, StageStatus};
use crate::engine::error::WorkflowError;
use crate::engine::{
    BillableJob, InventoryCheckEngine, MaterialSufficiency, PackagingFinalizer,
    ProductionJobFactory, ProductionProjection, ProductionStatistics, QcInspectionRequest,
    QualityControlEngine, StageUpdate, WorkflowEngine,
};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::production_job_repo::ProductionJobRepository;

// ==========================================
// IngestSummary - 入产结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub created: Vec<String>, // 新建的工单号
    pub skipped: usize,       // 未审批/已存在/重复的记录数
}

// ==========================================
// ProductionApi - 生产跟踪 API
// ==========================================

/// 生产跟踪API
///
/// 职责：
/// 1. 从订单模块入产已审批的工单（幂等）
/// 2. 工序流转、质检、包装（经引擎校验）
/// 3. 结算移交与统计查询
/// 4. ActionLog记录
pub struct ProductionApi {
    job_repo: Arc<ProductionJobRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    inventory_repo: Arc<InventoryRepository>,
    config_manager: Arc<ConfigManager>,
    workflow: WorkflowEngine,
    quality: QualityControlEngine,
    packaging: PackagingFinalizer,
    projection: ProductionProjection,
    inventory_check: InventoryCheckEngine,
}

impl ProductionApi {
    /// 创建新的ProductionApi实例
    pub fn new(
        job_repo: Arc<ProductionJobRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        inventory_repo: Arc<InventoryRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            job_repo,
            action_log_repo,
            inventory_repo,
            config_manager,
            workflow: WorkflowEngine::new(),
            quality: QualityControlEngine::new(),
            packaging: PackagingFinalizer::new(),
            projection: ProductionProjection::new(),
            inventory_check: InventoryCheckEngine::new(),
        }
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    // ==========================================
    // 入产
    // ==========================================

    /// 入产已审批的工单
    ///
    /// # 参数
    /// - records: 订单模块提供的工单记录（未审批或工单号为空的记录跳过）
    /// - actor: 操作人
    ///
    /// # 返回
    /// - Ok(IngestSummary): 新建工单号与跳过数量
    /// - Err(ApiError): API错误
    pub fn ingest_approved_job_orders(
        &self,
        records: &[JobOrderRecord],
        actor: &str,
    ) -> ApiResult<IngestSummary> {
        let usage_table = self
            .config_manager
            .get_fabric_usage_table()
            .map_err(|e| ApiError::InternalError(format!("读取用料配置失败: {}", e)))?;
        let factory = ProductionJobFactory::new(usage_table);

        let existing_ids = self.job_repo.list_job_order_ids()?;
        let planned = factory.plan_new_jobs(records, &existing_ids);
        let created = self.job_repo.insert_new_with_logs(&planned, |job| {
            ActionLog::new(
                &job.job_order_id,
                ActionType::IngestJobOrder,
                actor,
                Some(json!({
                    "order_id": job.order_id,
                    "garment_type": job.garment_type,
                    "quantity": job.quantity,
                    "estimated_fabric_usage": job.estimated_fabric_usage,
                })),
                Some(format!("工单入产: {} x{}", job.garment_type, job.quantity)),
            )
        })?;

        let summary = IngestSummary {
            skipped: records.len() - created.len(),
            created,
        };
        tracing::info!(
            created = summary.created.len(),
            skipped = summary.skipped,
            "工单入产完成"
        );
        Ok(summary)
    }

    // ==========================================
    // 工序流转
    // ==========================================

    /// 开始/推进工序
    ///
    /// # 参数
    /// - job_order_id: 工单号
    /// - stage_id: 工序ID（如 "cutting"）
    /// - status: 目标状态
    /// - start_date / completion_date: 可选日期（缺省取当天）
    /// - remarks: 备注
    /// - actor: 操作人
    ///
    /// # 返回
    /// - Ok(ProductionJob): 变更后的工单
    /// - Err(ApiError::Workflow): 工序顺序/闸门校验失败,工单未变更
    pub fn update_stage(
        &self,
        job_order_id: &str,
        stage_id: &str,
        status: StageStatus,
        start_date: Option<NaiveDate>,
        completion_date: Option<NaiveDate>,
        remarks: &str,
        actor: &str,
    ) -> ApiResult<ProductionJob> {
        let stage_id = parse_stage_id(stage_id)?;
        let job = self.load_job(job_order_id)?;

        let update = StageUpdate::new(stage_id, status)
            .with_dates(start_date, completion_date)
            .with_remarks(remarks);
        let next = self
            .workflow
            .start_or_advance_stage(&job, &update, Self::today())?;

        let saved = self.persist(
            next,
            ActionType::UpdateStage,
            actor,
            json!({
                "stage_id": stage_id.to_db_str(),
                "status": status.to_db_str(),
                "start_date": start_date.map(|d| d.to_string()),
                "completion_date": completion_date.map(|d| d.to_string()),
                "remarks": remarks,
            }),
            format!("工序 {} → {}", stage_id, status),
        )?;
        Ok(saved)
    }

    /// 登记质检
    ///
    /// # 参数
    /// - result: 合格/不合格
    /// - checked_items: 检查项
    /// - defect_notes: 缺陷说明
    /// - return_to_stage_id: 不合格时返工工序ID
    pub fn record_qc_inspection(
        &self,
        job_order_id: &str,
        result: QcResult,
        checked_items: &[String],
        defect_notes: &str,
        return_to_stage_id: Option<&str>,
        actor: &str,
    ) -> ApiResult<ProductionJob> {
        let return_to = return_to_stage_id
            .filter(|s| !s.trim().is_empty())
            .map(parse_stage_id)
            .transpose()?;
        let job = self.load_job(job_order_id)?;

        let request = QcInspectionRequest {
            result,
            checked_items: checked_items.iter().cloned().collect::<BTreeSet<_>>(),
            defect_notes: defect_notes.to_string(),
            return_to_stage_id: return_to,
        };
        let next = self.quality.record_inspection(&job, &request, Self::today())?;

        let saved = self.persist(
            next,
            ActionType::RecordQcInspection,
            actor,
            json!({
                "result": result.to_db_str(),
                "checked_items": request.checked_items,
                "defect_notes": defect_notes,
                "return_to_stage_id": return_to.map(|s| s.to_db_str()),
            }),
            format!("质检{}", result),
        )?;
        Ok(saved)
    }

    /// 完成包装并移交结算
    pub fn complete_packaging(
        &self,
        job_order_id: &str,
        notes: &str,
        actor: &str,
    ) -> ApiResult<ProductionJob> {
        let job = self.load_job(job_order_id)?;
        let next = self.packaging.complete_packaging(&job, notes, Self::today())?;

        self.persist(
            next,
            ActionType::CompletePackaging,
            actor,
            json!({ "notes": notes }),
            "包装完成,移交结算".to_string(),
        )
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询单个工单
    pub fn get_job(&self, job_order_id: &str) -> ApiResult<ProductionJob> {
        self.load_job(job_order_id)
    }

    /// 查询全部工单
    pub fn list_jobs(&self) -> ApiResult<Vec<ProductionJob>> {
        Ok(self.job_repo.find_all()?)
    }

    /// 按工单号/客户名搜索（忽略大小写,空词返回全部）
    pub fn search_jobs(&self, term: &str) -> ApiResult<Vec<ProductionJob>> {
        let jobs = self.job_repo.find_all()?;
        Ok(self
            .projection
            .search(&jobs, term)
            .into_iter()
            .cloned()
            .collect())
    }

    /// 按生产状态/当前工序过滤
    pub fn filter_jobs(
        &self,
        status: Option<ProductionStatus>,
        current_stage_id: Option<&str>,
    ) -> ApiResult<Vec<ProductionJob>> {
        let current_stage = current_stage_id
            .filter(|s| !s.trim().is_empty())
            .map(parse_stage_id)
            .transpose()?;
        let jobs = self.job_repo.find_all()?;
        Ok(self
            .projection
            .filter(&jobs, status, current_stage)
            .into_iter()
            .cloned()
            .collect())
    }

    /// 可结算工单（供结算模块）
    pub fn list_billable(&self) -> ApiResult<Vec<BillableJob>> {
        let jobs = self.job_repo.find_ready_for_billing()?;
        Ok(self
            .projection
            .billable(&jobs)
            .into_iter()
            .map(BillableJob::from)
            .collect())
    }

    /// 生产状态统计
    pub fn get_statistics(&self) -> ApiResult<ProductionStatistics> {
        let jobs = self.job_repo.find_all()?;
        Ok(self.projection.statistics(&jobs))
    }

    /// 面料齐套检查（仅提示,不影响工序流转）
    pub fn check_material_availability(
        &self,
        job_order_id: &str,
    ) -> ApiResult<MaterialSufficiency> {
        let job = self.load_job(job_order_id)?;
        let material_name = self.inventory_check.fabric_material_name(&job);
        let available = self.inventory_repo.find_available_quantity(&material_name)?;
        let unit = self
            .config_manager
            .get_fabric_unit()
            .map_err(|e| ApiError::InternalError(format!("读取库存单位配置失败: {}", e)))?;

        Ok(self.inventory_check.evaluate(&job, available, &unit))
    }

    /// 工单操作日志
    pub fn list_action_logs(&self, job_order_id: &str) -> ApiResult<Vec<ActionLog>> {
        if job_order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单号不能为空".to_string()));
        }
        Ok(self.action_log_repo.find_by_job_order(job_order_id)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load_job(&self, job_order_id: &str) -> ApiResult<ProductionJob> {
        if job_order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单号不能为空".to_string()));
        }
        self.job_repo
            .find_by_id(job_order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("工单{}不存在", job_order_id)))
    }

    /// 保存（revision 校验）与ActionLog同一事务写入,返回带新 revision 的工单
    fn persist(
        &self,
        mut job: ProductionJob,
        action_type: ActionType,
        actor: &str,
        payload: serde_json::Value,
        detail: String,
    ) -> ApiResult<ProductionJob> {
        let action_log = ActionLog::new(
            &job.job_order_id,
            action_type,
            actor,
            Some(payload),
            Some(detail),
        );
        job.revision = self.job_repo.save_with_log(&job, &action_log)?;

        Ok(job)
    }
}

/// 解析工序ID（未知工序返回 UnknownStage）
pub fn parse_stage_id(raw: &str) -> ApiResult<StageId> {
    StageId::from_str(raw.trim())
        .ok_or_else(|| ApiError::Workflow(WorkflowError::UnknownStage(raw.to_string())))
}
