// ==========================================
// 鱼塘养殖管理系统 - 捕捞记录数据仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::events::HarvestEvent;
use crate::domain::types::DateRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::SCOPE_FILTER;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 捕捞记录仓储
pub struct HarvestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HarvestRepository {
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

    pub fn insert(&self, harvest: &HarvestEvent) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO harvest (
                pond_id, species_id, date, total_weight_kg, pieces_per_kg,
                price_per_kg, avg_weight_kg, total_count, total_revenue
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                harvest.pond_id,
                harvest.species_id,
                harvest.date,
                harvest.total_weight_kg,
                harvest.pieces_per_kg,
                harvest.price_per_kg,
                harvest.avg_weight_kg,
                harvest.total_count,
                harvest.total_revenue,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按日期升序列出
    pub fn list(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<Vec<HarvestEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT harvest_id, pond_id, species_id, date, total_weight_kg, pieces_per_kg,
                   price_per_kg, avg_weight_kg, total_count, total_revenue
            FROM harvest WHERE {} ORDER BY date ASC, harvest_id ASC
            "#,
            SCOPE_FILTER
        ))?;
        let rows = stmt
            .query_map(
                params![pond_id, species_id, range.start, range.end],
                map_harvest,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 累计捕捞尾数
    pub fn sum_count(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(total_count), 0) FROM harvest WHERE {}",
                SCOPE_FILTER
            ),
            params![pond_id, species_id, range.start, range.end],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 累计捕捞重量 kg
    pub fn sum_weight(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(total_weight_kg), 0.0) FROM harvest WHERE {}",
                SCOPE_FILTER
            ),
            params![pond_id, species_id, range.start, range.end],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

fn map_harvest(row: &Row) -> rusqlite::Result<HarvestEvent> {
    Ok(HarvestEvent {
        harvest_id: row.get(0)?,
        pond_id: row.get(1)?,
        species_id: row.get(2)?,
        date: row.get(3)?,
        total_weight_kg: row.get(4)?,
        pieces_per_kg: row.get(5)?,
        price_per_kg: row.get(6)?,
        avg_weight_kg: row.get(7)?,
        total_count: row.get(8)?,
        total_revenue: row.get(9)?,
    })
}
