// ==========================================
// 服装生产管理系统 - 库存物料仓储
// ==========================================
// 来源: 库存模块（外部协作方）
// 用途: 生产模块只读可用量,做用料齐套提示
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 库存物料
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryMaterial {
    pub material_name: String,
    pub available_qty: f64,
    pub unit: String,
}

pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按物料名查询（忽略大小写）
    pub fn find_by_name(&self, material_name: &str) -> RepositoryResult<Option<InventoryMaterial>> {
        let conn = self.get_conn()?;
        let material = conn
            .query_row(
                r#"
                SELECT material_name, available_qty, unit
                  FROM inventory_material
                 WHERE material_name = ?1 COLLATE NOCASE
                "#,
                params![material_name],
                |row| {
                    Ok(InventoryMaterial {
                        material_name: row.get(0)?,
                        available_qty: row.get(1)?,
                        unit: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(material)
    }

    /// 可用量（未登记的物料视为 0）
    pub fn find_available_quantity(&self, material_name: &str) -> RepositoryResult<f64> {
        Ok(self
            .find_by_name(material_name)?
            .map(|m| m.available_qty)
            .unwrap_or(0.0))
    }

    /// 写入/覆盖物料库存（库存模块同步使用）
    pub fn upsert(&self, material: &InventoryMaterial) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO inventory_material (material_name, available_qty, unit)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(material_name) DO UPDATE
               SET available_qty = ?2, unit = ?3, updated_at = datetime('now')
            "#,
            params![material.material_name, material.available_qty, material.unit],
        )?;
        Ok(())
    }
}
