// ==========================================
// 鱼塘养殖管理系统 - 放养记录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::events::StockingEvent;
use crate::domain::types::DateRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::SCOPE_FILTER;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 放养记录仓储
pub struct StockingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockingRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入放养记录，返回新 stocking_id
    ///
    /// (pond, species, date) 重复时返回 UniqueConstraintViolation
    pub fn insert(&self, stocking: &StockingEvent) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stocking (
                pond_id, species_id, date, pcs, total_weight_kg, cost,
                pieces_per_kg, initial_avg_weight_kg, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                stocking.pond_id,
                stocking.species_id,
                stocking.date,
                stocking.pcs,
                stocking.total_weight_kg,
                stocking.cost,
                stocking.pieces_per_kg,
                stocking.initial_avg_weight_kg,
                stocking.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, stocking_id: i64) -> RepositoryResult<Option<StockingEvent>> {
        let conn = self.get_conn()?;
        let stocking = conn
            .query_row(
                &format!("SELECT {} FROM stocking WHERE stocking_id = ?1", COLUMNS),
                params![stocking_id],
                map_stocking,
            )
            .optional()?;
        Ok(stocking)
    }

    /// 最近一次放养（species 为 None 时取整塘）
    ///
    /// # 参数
    /// - up_to: 只看该日期（含）之前的记录；None 表示不限
    pub fn latest(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        up_to: Option<NaiveDate>,
    ) -> RepositoryResult<Option<StockingEvent>> {
        let conn = self.get_conn()?;
        let stocking = conn
            .query_row(
                &format!(
                    "SELECT {} FROM stocking WHERE {} ORDER BY date DESC, stocking_id DESC LIMIT 1",
                    COLUMNS, SCOPE_FILTER
                ),
                params![pond_id, species_id, Option::<NaiveDate>::None, up_to],
                map_stocking,
            )
            .optional()?;
        Ok(stocking)
    }

    /// 按日期升序列出
    pub fn list(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<Vec<StockingEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM stocking WHERE {} ORDER BY date ASC, stocking_id ASC",
            COLUMNS, SCOPE_FILTER
        ))?;
        let rows = stmt
            .query_map(
                params![pond_id, species_id, range.start, range.end],
                map_stocking,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 累计放养尾数
    pub fn sum_pcs(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COALESCE(SUM(pcs), 0) FROM stocking WHERE {}", SCOPE_FILTER),
            params![pond_id, species_id, range.start, range.end],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 池塘内放养过的品种（按最近放养日期倒序）
    pub fn list_species_ids(&self, pond_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT species_id FROM stocking
            WHERE pond_id = ?1
            GROUP BY species_id
            ORDER BY MAX(date) DESC, species_id ASC
            "#,
        )?;
        let ids = stmt
            .query_map(params![pond_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

const COLUMNS: &str = "stocking_id, pond_id, species_id, date, pcs, total_weight_kg, cost, \
                       pieces_per_kg, initial_avg_weight_kg, notes";

fn map_stocking(row: &Row) -> rusqlite::Result<StockingEvent> {
    Ok(StockingEvent {
        stocking_id: row.get(0)?,
        pond_id: row.get(1)?,
        species_id: row.get(2)?,
        date: row.get(3)?,
        pcs: row.get(4)?,
        total_weight_kg: row.get(5)?,
        cost: row.get(6)?,
        pieces_per_kg: row.get(7)?,
        initial_avg_weight_kg: row.get(8)?,
        notes: row.get(9)?,
    })
}
