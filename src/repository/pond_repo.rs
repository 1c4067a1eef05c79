// ==========================================
// 鱼塘养殖管理系统 - 池塘/品种/饲料类型数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::pond::{FeedType, Pond, Species};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PondRepository - 池塘仓储
// ==========================================
/// 池塘仓储
/// 职责: pond / species / feed_type 三张主数据表的读写
pub struct PondRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PondRepository {
    /// 创建新的 PondRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 池塘 =====

    /// 插入池塘，返回新 pond_id
    pub fn insert_pond(&self, pond: &Pond) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO pond (
                owner, name, area_decimal, depth_ft, volume_m3, location, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                pond.owner,
                pond.name,
                pond.area_decimal,
                pond.depth_ft,
                pond.volume_m3,
                pond.location,
                pond.is_active,
                pond.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_pond(&self, pond_id: i64) -> RepositoryResult<Option<Pond>> {
        let conn = self.get_conn()?;
        let pond = conn
            .query_row(
                &format!("SELECT {} FROM pond WHERE pond_id = ?1", POND_COLUMNS),
                params![pond_id],
                map_pond,
            )
            .optional()?;
        Ok(pond)
    }

    /// 查询某用户的池塘（不属于该用户时返回 None）
    pub fn find_owned_pond(&self, owner: &str, pond_id: i64) -> RepositoryResult<Option<Pond>> {
        let conn = self.get_conn()?;
        let pond = conn
            .query_row(
                &format!(
                    "SELECT {} FROM pond WHERE pond_id = ?1 AND owner = ?2",
                    POND_COLUMNS
                ),
                params![pond_id, owner],
                map_pond,
            )
            .optional()?;
        Ok(pond)
    }

    pub fn list_ponds_by_owner(&self, owner: &str) -> RepositoryResult<Vec<Pond>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pond WHERE owner = ?1 ORDER BY pond_id",
            POND_COLUMNS
        ))?;
        let ponds = stmt
            .query_map(params![owner], map_pond)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ponds)
    }

    // ===== 品种 =====

    pub fn insert_species(
        &self,
        name: &str,
        scientific_name: Option<&str>,
        parent_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO species (name, scientific_name, parent_id) VALUES (?1, ?2, ?3)",
            params![name, scientific_name, parent_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_species(&self) -> RepositoryResult<Vec<Species>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT species_id, name, scientific_name, parent_id FROM species ORDER BY species_id",
        )?;
        let species = stmt
            .query_map([], |row| {
                Ok(Species {
                    species_id: row.get(0)?,
                    name: row.get(1)?,
                    scientific_name: row.get(2)?,
                    parent_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(species)
    }

    // ===== 饲料类型 =====

    pub fn insert_feed_type(
        &self,
        name: &str,
        protein_percent: Option<f64>,
        parent_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO feed_type (name, protein_percent, parent_id) VALUES (?1, ?2, ?3)",
            params![name, protein_percent, parent_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_feed_types(&self) -> RepositoryResult<Vec<FeedType>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT feed_type_id, name, protein_percent, parent_id FROM feed_type ORDER BY feed_type_id",
        )?;
        let feed_types = stmt
            .query_map([], |row| {
                Ok(FeedType {
                    feed_type_id: row.get(0)?,
                    name: row.get(1)?,
                    protein_percent: row.get(2)?,
                    parent_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(feed_types)
    }
}

const POND_COLUMNS: &str =
    "pond_id, owner, name, area_decimal, depth_ft, volume_m3, location, is_active, created_at";

fn map_pond(row: &Row) -> rusqlite::Result<Pond> {
    Ok(Pond {
        pond_id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        area_decimal: row.get(3)?,
        depth_ft: row.get(4)?,
        volume_m3: row.get(5)?,
        location: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}
