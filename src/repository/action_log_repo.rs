// ==========================================
// 服装生产管理系统 - 操作日志数据仓储
// ==========================================
// 对齐: schema action_log 表
// 红线: 所有工单写入必须记录
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_action_log(&conn, log)?;
        Ok(log.action_id.clone())
    }

    /// 查询某工单的全部日志（按时间正序）
    pub fn find_by_job_order(&self, job_order_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, job_order_id, action_type, action_ts, actor, payload_json, detail
              FROM action_log
             WHERE job_order_id = ?1
             ORDER BY action_ts ASC, rowid ASC
            "#,
        )?;

        let logs = stmt
            .query_map(params![job_order_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// 查询最近的日志
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, job_order_id, action_type, action_ts, actor, payload_json, detail
              FROM action_log
             ORDER BY action_ts DESC, rowid DESC
             LIMIT ?1
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

/// 写入一条操作日志（可在调用方的事务内执行）
pub(crate) fn insert_action_log(conn: &Connection, log: &ActionLog) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO action_log (
            action_id, job_order_id, action_type, action_ts, actor, payload_json, detail
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            log.action_id,
            log.job_order_id,
            log.action_type,
            log.action_ts.format(TS_FMT).to_string(),
            log.actor,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.detail,
        ],
    )?;
    Ok(())
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<ActionLog> {
    let ts: String = row.get(3)?;
    let payload: Option<String> = row.get(5)?;
    Ok(ActionLog {
        action_id: row.get(0)?,
        job_order_id: row.get(1)?,
        action_type: row.get(2)?,
        action_ts: NaiveDateTime::parse_from_str(&ts, TS_FMT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        actor: row.get(4)?,
        payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(6)?,
    })
}
