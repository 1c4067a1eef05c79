// ==========================================
// 鱼塘养殖管理系统 - 水质读数数据仓储
// ==========================================
// 说明: 水样检测与日常记录共表，以 source 区分
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::events::WaterQualityReading;
use crate::domain::types::{DateRange, WaterReadingSource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 水质读数仓储
pub struct WaterQualityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WaterQualityRepository {
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

    pub fn insert(&self, reading: &WaterQualityReading) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO water_quality (
                pond_id, date, source, temperature_c, ph, dissolved_oxygen, ammonia, nitrite
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                reading.pond_id,
                reading.date,
                reading.source.to_db_str(),
                reading.temperature_c,
                reading.ph,
                reading.dissolved_oxygen,
                reading.ammonia,
                reading.nitrite,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按日期升序列出（两种来源都返回）
    pub fn list(&self, pond_id: i64, range: DateRange) -> RepositoryResult<Vec<WaterQualityReading>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reading_id, pond_id, date, source, temperature_c, ph,
                   dissolved_oxygen, ammonia, nitrite
            FROM water_quality
            WHERE pond_id = ?1 AND (?2 IS NULL OR date >= ?2) AND (?3 IS NULL OR date <= ?3)
            ORDER BY date ASC, reading_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![pond_id, range.start, range.end], map_reading)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn map_reading(row: &Row) -> rusqlite::Result<WaterQualityReading> {
    let source: String = row.get(3)?;
    Ok(WaterQualityReading {
        reading_id: row.get(0)?,
        pond_id: row.get(1)?,
        date: row.get(2)?,
        source: WaterReadingSource::from_str(&source),
        temperature_c: row.get(4)?,
        ph: row.get(5)?,
        dissolved_oxygen: row.get(6)?,
        ammonia: row.get(7)?,
        nitrite: row.get(8)?,
    })
}
