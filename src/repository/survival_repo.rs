// ==========================================
// 鱼塘养殖管理系统 - 存活快照数据仓储
// ==========================================
// 说明: 同一 (pond, species, date) 只保留最新一次计算结果
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::survival::SurvivalSnapshot;
use crate::domain::types::MortalityTrend;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 存活快照仓储
pub struct SurvivalSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SurvivalSnapshotRepository {
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

    /// 写入快照，替换同 (pond, species, date) 的旧快照
    pub fn replace(&self, snapshot: &SurvivalSnapshot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM survival_snapshot WHERE pond_id = ?1 AND species_id IS ?2 AND date = ?3",
            params![snapshot.pond_id, snapshot.species_id, snapshot.date],
        )?;
        tx.execute(
            r#"
            INSERT INTO survival_snapshot (
                snapshot_id, pond_id, species_id, date,
                initial_stocked, current_alive, total_mortality, total_harvested,
                survival_rate_percent, mortality_weight_kg, harvested_weight_kg,
                average_weight_kg, total_survival_kg, mortality_trend, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.pond_id,
                snapshot.species_id,
                snapshot.date,
                snapshot.initial_stocked,
                snapshot.current_alive,
                snapshot.total_mortality,
                snapshot.total_harvested,
                snapshot.survival_rate_percent,
                snapshot.mortality_weight_kg,
                snapshot.harvested_weight_kg,
                snapshot.average_weight_kg,
                snapshot.total_survival_kg,
                snapshot.mortality_trend.to_db_str(),
                snapshot.created_at,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn find(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        date: NaiveDate,
    ) -> RepositoryResult<Option<SurvivalSnapshot>> {
        let conn = self.get_conn()?;
        let snapshot = conn
            .query_row(
                &format!(
                    "SELECT {} FROM survival_snapshot WHERE pond_id = ?1 AND species_id IS ?2 AND date = ?3",
                    COLUMNS
                ),
                params![pond_id, species_id, date],
                map_snapshot,
            )
            .optional()?;
        Ok(snapshot)
    }

    /// 池塘快照历史（按日期升序）
    pub fn list_by_pond(&self, pond_id: i64) -> RepositoryResult<Vec<SurvivalSnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM survival_snapshot WHERE pond_id = ?1 ORDER BY date ASC, species_id ASC",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![pond_id], map_snapshot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

const COLUMNS: &str = "snapshot_id, pond_id, species_id, date, initial_stocked, current_alive, \
                       total_mortality, total_harvested, survival_rate_percent, \
                       mortality_weight_kg, harvested_weight_kg, average_weight_kg, \
                       total_survival_kg, mortality_trend, created_at";

fn map_snapshot(row: &Row) -> rusqlite::Result<SurvivalSnapshot> {
    let trend: String = row.get(13)?;
    Ok(SurvivalSnapshot {
        snapshot_id: row.get(0)?,
        pond_id: row.get(1)?,
        species_id: row.get(2)?,
        date: row.get(3)?,
        initial_stocked: row.get(4)?,
        current_alive: row.get(5)?,
        total_mortality: row.get(6)?,
        total_harvested: row.get(7)?,
        survival_rate_percent: row.get(8)?,
        mortality_weight_kg: row.get(9)?,
        harvested_weight_kg: row.get(10)?,
        average_weight_kg: row.get(11)?,
        total_survival_kg: row.get(12)?,
        mortality_trend: MortalityTrend::from_str(&trend),
        created_at: row.get(14)?,
    })
}
