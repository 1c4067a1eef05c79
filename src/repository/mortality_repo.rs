// ==========================================
// 鱼塘养殖管理系统 - 死亡记录数据仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::events::MortalityEvent;
use crate::domain::types::DateRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::SCOPE_FILTER;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 死亡记录仓储
pub struct MortalityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MortalityRepository {
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

    pub fn insert(&self, mortality: &MortalityEvent) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO mortality (
                pond_id, species_id, date, count, avg_weight_kg, total_weight_kg, cause, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                mortality.pond_id,
                mortality.species_id,
                mortality.date,
                mortality.count,
                mortality.avg_weight_kg,
                mortality.total_weight_kg,
                mortality.cause,
                mortality.notes,
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
    ) -> RepositoryResult<Vec<MortalityEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT mortality_id, pond_id, species_id, date, count, avg_weight_kg,
                   total_weight_kg, cause, notes
            FROM mortality WHERE {} ORDER BY date ASC, mortality_id ASC
            "#,
            SCOPE_FILTER
        ))?;
        let rows = stmt
            .query_map(
                params![pond_id, species_id, range.start, range.end],
                map_mortality,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 累计死亡尾数
    pub fn sum_count(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COALESCE(SUM(count), 0) FROM mortality WHERE {}", SCOPE_FILTER),
            params![pond_id, species_id, range.start, range.end],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 累计死亡重量 kg（未知均重的记录不计入）
    pub fn sum_weight(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(total_weight_kg), 0.0) FROM mortality WHERE {}",
                SCOPE_FILTER
            ),
            params![pond_id, species_id, range.start, range.end],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

fn map_mortality(row: &Row) -> rusqlite::Result<MortalityEvent> {
    Ok(MortalityEvent {
        mortality_id: row.get(0)?,
        pond_id: row.get(1)?,
        species_id: row.get(2)?,
        date: row.get(3)?,
        count: row.get(4)?,
        avg_weight_kg: row.get(5)?,
        total_weight_kg: row.get(6)?,
        cause: row.get(7)?,
        notes: row.get(8)?,
    })
}
