// ==========================================
// 服装生产管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::engine::job_factory::FabricUsageTable;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 按前缀列出配置项（键已去掉前缀）
    fn get_values_with_prefix(
        &self,
        prefix: &str,
    ) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE key LIKE ?1 || '%'")?;

        let rows = stmt.query_map(params![prefix], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut values = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            if let Some(suffix) = key.strip_prefix(prefix) {
                values.insert(suffix.to_string(), value);
            }
        }
        Ok(values)
    }

    // ===== 用料配置 =====

    /// 单件用料表 = 标准表 + config_kv 覆写
    ///
    /// # 说明
    /// - `fabric_usage.<款式>`: 覆写某款式的单件用料
    /// - `fabric_usage.default`: 覆写未识别款式的默认用料
    /// - 非数值或负数的配置项忽略,保留标准值
    pub fn get_fabric_usage_table(&self) -> Result<FabricUsageTable, Box<dyn Error>> {
        let mut table = FabricUsageTable::standard();

        for (garment, raw) in self.get_values_with_prefix(config_keys::FABRIC_USAGE_PREFIX)? {
            let per_unit = match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    tracing::warn!(
                        config_key = %format!("{}{}", config_keys::FABRIC_USAGE_PREFIX, garment),
                        raw_value = %raw,
                        "单件用料配置格式错误，使用标准值"
                    );
                    continue;
                }
            };

            table = if garment == config_keys::FABRIC_USAGE_DEFAULT_SUFFIX {
                table.with_default(per_unit)
            } else {
                table.with_override(&garment, per_unit)
            };
        }

        Ok(table)
    }

    /// 面料计量单位（默认 meters）
    pub fn get_fabric_unit(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::FABRIC_UNIT, DEFAULT_FABRIC_UNIT)?;
        match value.trim() {
            "" => Ok(DEFAULT_FABRIC_UNIT.to_string()),
            unit => Ok(unit.to_string()),
        }
    }
}

/// 默认面料计量单位
pub const DEFAULT_FABRIC_UNIT: &str = "meters";

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 单件用料
    pub const FABRIC_USAGE_PREFIX: &str = "fabric_usage.";
    pub const FABRIC_USAGE_DEFAULT_SUFFIX: &str = "default";

    // 库存
    pub const FABRIC_UNIT: &str = "inventory.fabric_unit";
}
