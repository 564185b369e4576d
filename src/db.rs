// ==========================================
// 服装生产管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 建表脚本集中在此处,保证仓储与测试使用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS production_job (
    job_order_id TEXT PRIMARY KEY,
    order_id TEXT NOT NULL,
    client_name TEXT NOT NULL,
    garment_type TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    size_breakdown TEXT NOT NULL DEFAULT '',
    fabric_type TEXT NOT NULL DEFAULT '',
    special_instructions TEXT NOT NULL DEFAULT '',
    estimated_fabric_usage REAL NOT NULL,
    production_status TEXT NOT NULL,
    current_stage_id TEXT NOT NULL,
    quality_status TEXT NOT NULL,
    date_started TEXT,
    date_completed TEXT,
    packaging_completed INTEGER NOT NULL DEFAULT 0,
    packaging_date TEXT,
    ready_for_billing INTEGER NOT NULL DEFAULT 0,
    revision INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS production_stage (
    job_order_id TEXT NOT NULL REFERENCES production_job(job_order_id) ON DELETE CASCADE,
    stage_id TEXT NOT NULL,
    sequence_index INTEGER NOT NULL,
    status TEXT NOT NULL,
    start_date TEXT,
    completion_date TEXT,
    remarks TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (job_order_id, stage_id)
);

CREATE TABLE IF NOT EXISTS qc_inspection (
    inspection_id TEXT PRIMARY KEY,
    job_order_id TEXT NOT NULL REFERENCES production_job(job_order_id) ON DELETE CASCADE,
    seq_no INTEGER NOT NULL,
    inspection_date TEXT NOT NULL,
    result TEXT NOT NULL,
    checked_items_json TEXT NOT NULL,
    defect_notes TEXT NOT NULL DEFAULT '',
    return_to_stage_id TEXT,
    UNIQUE (job_order_id, seq_no)
);

CREATE TABLE IF NOT EXISTS inventory_material (
    material_name TEXT PRIMARY KEY,
    available_qty REAL NOT NULL,
    unit TEXT NOT NULL DEFAULT 'meters',
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    job_order_id TEXT NOT NULL,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_production_job_status ON production_job(production_status);
CREATE INDEX IF NOT EXISTS idx_action_log_job ON action_log(job_order_id, action_ts);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys / busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
