// ==========================================
// 鱼塘养殖管理系统 - 抽样记录数据仓储
// ==========================================
// 职责: fish_sampling 表读写，含生长派生字段回写
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::events::SamplingEvent;
use crate::domain::types::DateRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::SCOPE_FILTER;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 抽样记录仓储
pub struct SamplingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SamplingRepository {
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

    /// 插入抽样记录，返回新 sampling_id
    pub fn insert(&self, sampling: &SamplingEvent) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO fish_sampling (
                pond_id, species_id, date, sample_size, total_weight_kg,
                average_weight_kg, fish_per_kg, condition_factor,
                growth_rate_kg_per_day, biomass_difference_kg, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                sampling.pond_id,
                sampling.species_id,
                sampling.date,
                sampling.sample_size,
                sampling.total_weight_kg,
                sampling.average_weight_kg,
                sampling.fish_per_kg,
                sampling.condition_factor,
                sampling.growth_rate_kg_per_day,
                sampling.biomass_difference_kg,
                sampling.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 整行更新（按 sampling_id）
    pub fn update(&self, sampling: &SamplingEvent) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE fish_sampling SET
                pond_id = ?2, species_id = ?3, date = ?4, sample_size = ?5,
                total_weight_kg = ?6, average_weight_kg = ?7, fish_per_kg = ?8,
                condition_factor = ?9, growth_rate_kg_per_day = ?10,
                biomass_difference_kg = ?11, notes = ?12, updated_at = datetime('now')
            WHERE sampling_id = ?1
            "#,
            params![
                sampling.sampling_id,
                sampling.pond_id,
                sampling.species_id,
                sampling.date,
                sampling.sample_size,
                sampling.total_weight_kg,
                sampling.average_weight_kg,
                sampling.fish_per_kg,
                sampling.condition_factor,
                sampling.growth_rate_kg_per_day,
                sampling.biomass_difference_kg,
                sampling.notes,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "FishSampling".to_string(),
                id: sampling.sampling_id.to_string(),
            });
        }
        Ok(())
    }

    /// 仅回写生长派生字段
    pub fn update_growth(
        &self,
        sampling_id: i64,
        growth_rate_kg_per_day: Option<f64>,
        biomass_difference_kg: Option<f64>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE fish_sampling
            SET growth_rate_kg_per_day = ?2, biomass_difference_kg = ?3, updated_at = datetime('now')
            WHERE sampling_id = ?1
            "#,
            params![sampling_id, growth_rate_kg_per_day, biomass_difference_kg],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "FishSampling".to_string(),
                id: sampling_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete(&self, sampling_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM fish_sampling WHERE sampling_id = ?1",
            params![sampling_id],
        )?;
        Ok(affected > 0)
    }

    pub fn find_by_id(&self, sampling_id: i64) -> RepositoryResult<Option<SamplingEvent>> {
        let conn = self.get_conn()?;
        let sampling = conn
            .query_row(
                &format!("SELECT {} FROM fish_sampling WHERE sampling_id = ?1", COLUMNS),
                params![sampling_id],
                map_sampling,
            )
            .optional()?;
        Ok(sampling)
    }

    /// 是否已存在同 (pond, species, date) 的抽样
    ///
    /// species 精确匹配（None 只匹配混养抽样）；exclude_id 用于更新时排除自身
    pub fn exists_duplicate(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        date: NaiveDate,
        exclude_id: Option<i64>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                r#"
                SELECT 1 FROM fish_sampling
                WHERE pond_id = ?1 AND species_id IS ?2 AND date = ?3
                  AND (?4 IS NULL OR sampling_id <> ?4)
                LIMIT 1
                "#,
                params![pond_id, species_id, date, exclude_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 最近一次抽样（species 为 None 时取整塘）
    pub fn latest(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        up_to: Option<NaiveDate>,
    ) -> RepositoryResult<Option<SamplingEvent>> {
        let conn = self.get_conn()?;
        let sampling = conn
            .query_row(
                &format!(
                    "SELECT {} FROM fish_sampling WHERE {} ORDER BY date DESC, sampling_id DESC LIMIT 1",
                    COLUMNS, SCOPE_FILTER
                ),
                params![pond_id, species_id, Option::<NaiveDate>::None, up_to],
                map_sampling,
            )
            .optional()?;
        Ok(sampling)
    }

    /// 按日期升序列出（同日按 sampling_id）
    pub fn list(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> RepositoryResult<Vec<SamplingEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fish_sampling WHERE {} ORDER BY date ASC, sampling_id ASC",
            COLUMNS, SCOPE_FILTER
        ))?;
        let rows = stmt
            .query_map(
                params![pond_id, species_id, range.start, range.end],
                map_sampling,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

const COLUMNS: &str = "sampling_id, pond_id, species_id, date, sample_size, total_weight_kg, \
                       average_weight_kg, fish_per_kg, condition_factor, \
                       growth_rate_kg_per_day, biomass_difference_kg, notes";

fn map_sampling(row: &Row) -> rusqlite::Result<SamplingEvent> {
    Ok(SamplingEvent {
        sampling_id: row.get(0)?,
        pond_id: row.get(1)?,
        species_id: row.get(2)?,
        date: row.get(3)?,
        sample_size: row.get(4)?,
        total_weight_kg: row.get(5)?,
        average_weight_kg: row.get(6)?,
        fish_per_kg: row.get(7)?,
        condition_factor: row.get(8)?,
        growth_rate_kg_per_day: row.get(9)?,
        biomass_difference_kg: row.get(10)?,
        notes: row.get(11)?,
    })
}
