use super::core::{ProductionJobRepository, DATE_FMT};
use crate::domain::job::{ProductionJob, QcInspection};
use crate::domain::stage::{StageId, StageInstance};
use crate::domain::types::{ProductionStatus, QcResult, QualityStatus, StageStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::collections::{BTreeSet, HashSet};

const JOB_COLUMNS: &str = r#"
    job_order_id, order_id, client_name, garment_type, quantity,
    size_breakdown, fabric_type, special_instructions, estimated_fabric_usage,
    production_status, current_stage_id, quality_status,
    date_started, date_completed,
    packaging_completed, packaging_date, ready_for_billing, revision
"#;

impl ProductionJobRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按工单号查询
    pub fn find_by_id(&self, job_order_id: &str) -> RepositoryResult<Option<ProductionJob>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_job WHERE job_order_id = ?1",
            JOB_COLUMNS
        );
        let mut jobs = load_jobs(&conn, &sql, params![job_order_id])?;
        Ok(jobs.pop())
    }

    /// 查询全部工单（按创建顺序）
    pub fn find_all(&self) -> RepositoryResult<Vec<ProductionJob>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_job ORDER BY created_at ASC, job_order_id ASC",
            JOB_COLUMNS
        );
        load_jobs(&conn, &sql, [])
    }

    /// 按生产状态查询
    pub fn find_by_status(&self, status: ProductionStatus) -> RepositoryResult<Vec<ProductionJob>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_job WHERE production_status = ?1 \
             ORDER BY created_at ASC, job_order_id ASC",
            JOB_COLUMNS
        );
        load_jobs(&conn, &sql, params![status.to_db_str()])
    }

    /// 查询可结算工单
    pub fn find_ready_for_billing(&self) -> RepositoryResult<Vec<ProductionJob>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_job \
             WHERE ready_for_billing = 1 AND production_status = 'completed' AND packaging_completed = 1 \
             ORDER BY date_completed ASC, job_order_id ASC",
            JOB_COLUMNS
        );
        load_jobs(&conn, &sql, [])
    }

    /// 已入产的全部工单号
    pub fn list_job_order_ids(&self) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT job_order_id FROM production_job")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }
}

// ==========================================
// 行映射
// ==========================================

/// production_job 原始行（枚举/日期在闭包外解析,以便返回字段级错误）
struct JobRow {
    job_order_id: String,
    order_id: String,
    client_name: String,
    garment_type: String,
    quantity: u32,
    size_breakdown: String,
    fabric_type: String,
    special_instructions: String,
    estimated_fabric_usage: f64,
    production_status: String,
    current_stage_id: String,
    quality_status: String,
    date_started: Option<String>,
    date_completed: Option<String>,
    packaging_completed: bool,
    packaging_date: Option<String>,
    ready_for_billing: bool,
    revision: i32,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            job_order_id: row.get(0)?,
            order_id: row.get(1)?,
            client_name: row.get(2)?,
            garment_type: row.get(3)?,
            quantity: row.get(4)?,
            size_breakdown: row.get(5)?,
            fabric_type: row.get(6)?,
            special_instructions: row.get(7)?,
            estimated_fabric_usage: row.get(8)?,
            production_status: row.get(9)?,
            current_stage_id: row.get(10)?,
            quality_status: row.get(11)?,
            date_started: row.get(12)?,
            date_completed: row.get(13)?,
            packaging_completed: row.get(14)?,
            packaging_date: row.get(15)?,
            ready_for_billing: row.get(16)?,
            revision: row.get(17)?,
        })
    }

    fn into_job(
        self,
        stages: Vec<StageInstance>,
        qc_inspections: Vec<QcInspection>,
    ) -> RepositoryResult<ProductionJob> {
        Ok(ProductionJob {
            production_status: parse_field(
                "production_status",
                &self.production_status,
                ProductionStatus::from_str,
            )?,
            current_stage_id: parse_field(
                "current_stage_id",
                &self.current_stage_id,
                StageId::from_str,
            )?,
            quality_status: parse_field(
                "quality_status",
                &self.quality_status,
                QualityStatus::from_str,
            )?,
            date_started: parse_date_opt("date_started", self.date_started.as_deref())?,
            date_completed: parse_date_opt("date_completed", self.date_completed.as_deref())?,
            packaging_date: parse_date_opt("packaging_date", self.packaging_date.as_deref())?,
            job_order_id: self.job_order_id,
            order_id: self.order_id,
            client_name: self.client_name,
            garment_type: self.garment_type,
            quantity: self.quantity,
            size_breakdown: self.size_breakdown,
            fabric_type: self.fabric_type,
            special_instructions: self.special_instructions,
            estimated_fabric_usage: self.estimated_fabric_usage,
            stages,
            qc_inspections,
            packaging_completed: self.packaging_completed,
            ready_for_billing: self.ready_for_billing,
            revision: self.revision,
        })
    }
}

fn load_jobs<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepositoryResult<Vec<ProductionJob>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, JobRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut jobs = Vec::with_capacity(rows.len());
    for row in rows {
        let stages = load_stages(conn, &row.job_order_id)?;
        let inspections = load_inspections(conn, &row.job_order_id)?;
        jobs.push(row.into_job(stages, inspections)?);
    }
    Ok(jobs)
}

fn load_stages(conn: &Connection, job_order_id: &str) -> RepositoryResult<Vec<StageInstance>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT stage_id, status, start_date, completion_date, remarks
          FROM production_stage
         WHERE job_order_id = ?1
         ORDER BY sequence_index ASC
        "#,
    )?;
    let raw = stmt
        .query_map(params![job_order_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if raw.len() != StageId::ALL.len() {
        return Err(RepositoryError::InternalError(format!(
            "工单 {} 工序数量异常: {}",
            job_order_id,
            raw.len()
        )));
    }

    raw.into_iter()
        .map(|(stage_id, status, start, completion, remarks)| {
            Ok(StageInstance {
                stage_id: parse_field("stage_id", &stage_id, StageId::from_str)?,
                status: parse_field("status", &status, StageStatus::from_str)?,
                start_date: parse_date_opt("start_date", start.as_deref())?,
                completion_date: parse_date_opt("completion_date", completion.as_deref())?,
                remarks,
            })
        })
        .collect()
}

fn load_inspections(conn: &Connection, job_order_id: &str) -> RepositoryResult<Vec<QcInspection>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT inspection_id, inspection_date, result, checked_items_json,
               defect_notes, return_to_stage_id
          FROM qc_inspection
         WHERE job_order_id = ?1
         ORDER BY seq_no ASC
        "#,
    )?;
    let raw = stmt
        .query_map(params![job_order_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(inspection_id, date, result, items, defect_notes, return_to)| {
            let checked_items: BTreeSet<String> = serde_json::from_str(&items)?;
            Ok(QcInspection {
                inspection_id,
                date: parse_date("inspection_date", &date)?,
                result: parse_field("result", &result, QcResult::from_str)?,
                checked_items,
                defect_notes,
                return_to_stage_id: return_to
                    .as_deref()
                    .map(|s| parse_field("return_to_stage_id", s, StageId::from_str))
                    .transpose()?,
            })
        })
        .collect()
}

fn parse_field<T>(field: &str, raw: &str, parse: fn(&str) -> Option<T>) -> RepositoryResult<T> {
    parse(raw).ok_or_else(|| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("无法识别的取值: {}", raw),
    })
}

fn parse_date(field: &str, raw: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("{} ({})", e, raw),
    })
}

fn parse_date_opt(field: &str, raw: Option<&str>) -> RepositoryResult<Option<NaiveDate>> {
    raw.map(|s| parse_date(field, s)).transpose()
}
