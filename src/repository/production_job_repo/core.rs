use crate::domain::action_log::ActionLog;
use crate::domain::job::ProductionJob;
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};

pub(super) const DATE_FMT: &str = "%Y-%m-%d";

// ==========================================
// ProductionJobRepository - 生产工单仓储
// ==========================================
pub struct ProductionJobRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionJobRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 批量插入新工单（工单号已存在的跳过）
    ///
    /// # 返回
    /// - `Ok(ids)`: 实际插入的工单号
    pub fn insert_new(&self, jobs: &[ProductionJob]) -> RepositoryResult<Vec<String>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let inserted = insert_jobs(&tx, jobs, |_, _| Ok(()))?;
        tx.commit()?;
        Ok(inserted)
    }

    /// 批量插入新工单,并在同一事务内为每个实际插入的工单写操作日志
    ///
    /// 任一写入失败则整批回滚
    pub fn insert_new_with_logs<F>(
        &self,
        jobs: &[ProductionJob],
        log_for: F,
    ) -> RepositoryResult<Vec<String>>
    where
        F: Fn(&ProductionJob) -> ActionLog,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let inserted = insert_jobs(&tx, jobs, |tx, job| insert_action_log(tx, &log_for(job)))?;
        tx.commit()?;
        Ok(inserted)
    }

    /// 保存工单变更 (带乐观锁检查)
    ///
    /// # 返回
    /// - `Ok(revision)`: 保存后的 revision
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: revision 不匹配 (其他会话已更新)
    /// - `RepositoryError::NotFound`: 工单不存在
    pub fn save(&self, job: &ProductionJob) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let revision = update_job(&tx, job)?;
        tx.commit()?;
        Ok(revision)
    }

    /// 保存工单变更并写操作日志（同一事务,日志写入失败时工单不变）
    pub fn save_with_log(&self, job: &ProductionJob, log: &ActionLog) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let revision = update_job(&tx, job)?;
        insert_action_log(&tx, log)?;
        tx.commit()?;
        Ok(revision)
    }
}

fn insert_jobs<F>(
    tx: &Transaction<'_>,
    jobs: &[ProductionJob],
    mut on_inserted: F,
) -> RepositoryResult<Vec<String>>
where
    F: FnMut(&Transaction<'_>, &ProductionJob) -> RepositoryResult<()>,
{
    let mut inserted = Vec::new();
    for job in jobs {
        let rows = tx.execute(
            r#"
            INSERT OR IGNORE INTO production_job (
                job_order_id, order_id, client_name, garment_type, quantity,
                size_breakdown, fabric_type, special_instructions, estimated_fabric_usage,
                production_status, current_stage_id, quality_status,
                date_started, date_completed,
                packaging_completed, packaging_date, ready_for_billing, revision
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            params![
                job.job_order_id,
                job.order_id,
                job.client_name,
                job.garment_type,
                job.quantity,
                job.size_breakdown,
                job.fabric_type,
                job.special_instructions,
                job.estimated_fabric_usage,
                job.production_status.to_db_str(),
                job.current_stage_id.to_db_str(),
                job.quality_status.to_db_str(),
                job.date_started.map(|d| d.format(DATE_FMT).to_string()),
                job.date_completed.map(|d| d.format(DATE_FMT).to_string()),
                job.packaging_completed,
                job.packaging_date.map(|d| d.format(DATE_FMT).to_string()),
                job.ready_for_billing,
                job.revision,
            ],
        )?;

        if rows == 0 {
            continue;
        }

        for stage in &job.stages {
            tx.execute(
                r#"
                INSERT INTO production_stage (
                    job_order_id, stage_id, sequence_index, status,
                    start_date, completion_date, remarks
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    job.job_order_id,
                    stage.stage_id.to_db_str(),
                    stage.stage_id.sequence_index() as i64,
                    stage.status.to_db_str(),
                    stage.start_date.map(|d| d.format(DATE_FMT).to_string()),
                    stage.completion_date.map(|d| d.format(DATE_FMT).to_string()),
                    stage.remarks,
                ],
            )?;
        }
        insert_inspections(tx, job)?;
        on_inserted(tx, job)?;
        inserted.push(job.job_order_id.clone());
    }
    Ok(inserted)
}

fn update_job(tx: &Transaction<'_>, job: &ProductionJob) -> RepositoryResult<i32> {
    let rows_affected = tx.execute(
        r#"
        UPDATE production_job
           SET production_status = ?1, current_stage_id = ?2, quality_status = ?3,
               date_started = ?4, date_completed = ?5,
               packaging_completed = ?6, packaging_date = ?7, ready_for_billing = ?8,
               revision = revision + 1, updated_at = datetime('now')
         WHERE job_order_id = ?9 AND revision = ?10
        "#,
        params![
            job.production_status.to_db_str(),
            job.current_stage_id.to_db_str(),
            job.quality_status.to_db_str(),
            job.date_started.map(|d| d.format(DATE_FMT).to_string()),
            job.date_completed.map(|d| d.format(DATE_FMT).to_string()),
            job.packaging_completed,
            job.packaging_date.map(|d| d.format(DATE_FMT).to_string()),
            job.ready_for_billing,
            job.job_order_id,
            job.revision,
        ],
    )?;

    if rows_affected == 0 {
        // 判断是记录不存在还是 revision 冲突
        let actual: Option<i32> = tx
            .query_row(
                "SELECT revision FROM production_job WHERE job_order_id = ?1",
                params![job.job_order_id],
                |row| row.get(0),
            )
            .optional()?;
        return match actual {
            Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                job_order_id: job.job_order_id.clone(),
                expected: job.revision,
                actual,
            }),
            None => Err(RepositoryError::NotFound {
                entity: "ProductionJob".to_string(),
                id: job.job_order_id.clone(),
            }),
        };
    }

    for stage in &job.stages {
        tx.execute(
            r#"
            UPDATE production_stage
               SET status = ?1, start_date = ?2, completion_date = ?3, remarks = ?4
             WHERE job_order_id = ?5 AND stage_id = ?6
            "#,
            params![
                stage.status.to_db_str(),
                stage.start_date.map(|d| d.format(DATE_FMT).to_string()),
                stage.completion_date.map(|d| d.format(DATE_FMT).to_string()),
                stage.remarks,
                job.job_order_id,
                stage.stage_id.to_db_str(),
            ],
        )?;
    }
    insert_inspections(tx, job)?;

    Ok(job.revision + 1)
}

/// 追加质检记录（已存在的 inspection_id 不会被改写）
fn insert_inspections(tx: &Transaction<'_>, job: &ProductionJob) -> RepositoryResult<()> {
    for (seq_no, inspection) in job.qc_inspections.iter().enumerate() {
        tx.execute(
            r#"
            INSERT OR IGNORE INTO qc_inspection (
                inspection_id, job_order_id, seq_no, inspection_date, result,
                checked_items_json, defect_notes, return_to_stage_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                inspection.inspection_id,
                job.job_order_id,
                seq_no as i64,
                inspection.date.format(DATE_FMT).to_string(),
                inspection.result.to_db_str(),
                serde_json::to_string(&inspection.checked_items)?,
                inspection.defect_notes,
                inspection.return_to_stage_id.map(|s| s.to_db_str()),
            ],
        )?;
    }
    Ok(())
}
