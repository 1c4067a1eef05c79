// ==========================================
// 鱼塘养殖管理系统 - 投喂建议数据仓储
// ==========================================
// 约束: 建议写入后只允许更新 is_applied / applied_at
// 说明: 列表类字段与分析明细以 JSON 文本存储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::advice::FeedingAdvice;
use crate::domain::types::{Confidence, DataSource, Season};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};

/// 投喂建议仓储
pub struct FeedingAdviceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeedingAdviceRepository {
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

    pub fn insert(&self, advice: &FeedingAdvice) -> RepositoryResult<()> {
        let feeding_times_json = serde_json::to_string(&advice.feeding_times)?;
        let feeding_split_json = serde_json::to_string(&advice.feeding_split)?;
        let adjustments_json = serde_json::to_string(&advice.adjustments)?;
        let learning_json = advice
            .learning
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let medical_warnings_json = serde_json::to_string(&advice.medical_warnings)?;
        let analysis_json = serde_json::to_string(&advice.analysis)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO feeding_advice (
                advice_id, pond_id, species_id, date,
                estimated_fish_count, average_fish_weight_kg, total_biomass_kg,
                stage_name, protein_percent, pellet_size, feeding_frequency,
                feeding_times_json, feeding_split_json,
                base_rate_percent, feeding_rate_percent, base_feed_kg, recommended_feed_kg,
                adjustments_json, learning_json,
                water_temp_c, season, feed_type_id, feed_cost_per_kg, daily_feed_cost,
                data_source, confidence, medical_warnings_json, analysis_json, notes,
                is_applied, applied_at, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32
            )
            "#,
            params![
                advice.advice_id,
                advice.pond_id,
                advice.species_id,
                advice.date,
                advice.estimated_fish_count,
                advice.average_fish_weight_kg,
                advice.total_biomass_kg,
                advice.stage_name,
                advice.protein_percent,
                advice.pellet_size,
                advice.feeding_frequency,
                feeding_times_json,
                feeding_split_json,
                advice.base_rate_percent,
                advice.feeding_rate_percent,
                advice.base_feed_kg,
                advice.recommended_feed_kg,
                adjustments_json,
                learning_json,
                advice.water_temp_c,
                advice.season.to_db_str(),
                advice.feed_type_id,
                advice.feed_cost_per_kg,
                advice.daily_feed_cost,
                advice.data_source.to_db_str(),
                advice.confidence.to_db_str(),
                medical_warnings_json,
                analysis_json,
                advice.notes,
                advice.is_applied,
                advice.applied_at,
                advice.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, advice_id: &str) -> RepositoryResult<Option<FeedingAdvice>> {
        let conn = self.get_conn()?;
        let advice = conn
            .query_row(
                &format!("SELECT {} FROM feeding_advice WHERE advice_id = ?1", COLUMNS),
                params![advice_id],
                map_advice,
            )
            .optional()?;
        Ok(advice)
    }

    /// 标记建议已采纳
    pub fn mark_applied(&self, advice_id: &str, applied_at: NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE feeding_advice SET is_applied = 1, applied_at = ?2 WHERE advice_id = ?1",
            params![advice_id, applied_at],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "FeedingAdvice".to_string(),
                id: advice_id.to_string(),
            });
        }
        Ok(())
    }

    /// 最近采纳的建议（按采纳时间倒序）
    ///
    /// species 精确匹配（None 只匹配未指定品种的建议）
    pub fn list_recent_applied(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        limit: usize,
    ) -> RepositoryResult<Vec<FeedingAdvice>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM feeding_advice
            WHERE pond_id = ?1 AND species_id IS ?2 AND is_applied = 1 AND applied_at IS NOT NULL
            ORDER BY applied_at DESC
            LIMIT ?3
            "#,
            COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![pond_id, species_id, limit as i64], map_advice)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 池塘全部建议（按日期倒序）
    pub fn list_by_pond(&self, pond_id: i64) -> RepositoryResult<Vec<FeedingAdvice>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feeding_advice WHERE pond_id = ?1 ORDER BY date DESC, created_at DESC",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![pond_id], map_advice)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

const COLUMNS: &str = r#"
    advice_id, pond_id, species_id, date,
    estimated_fish_count, average_fish_weight_kg, total_biomass_kg,
    stage_name, protein_percent, pellet_size, feeding_frequency,
    feeding_times_json, feeding_split_json,
    base_rate_percent, feeding_rate_percent, base_feed_kg, recommended_feed_kg,
    adjustments_json, learning_json,
    water_temp_c, season, feed_type_id, feed_cost_per_kg, daily_feed_cost,
    data_source, confidence, medical_warnings_json, analysis_json, notes,
    is_applied, applied_at, created_at
"#;

/// 读取 JSON 文本列
fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_advice(row: &Row) -> rusqlite::Result<FeedingAdvice> {
    let learning_raw: Option<String> = row.get(18)?;
    let learning = learning_raw
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(18, Type::Text, Box::new(e)))
        })
        .transpose()?;
    let season: String = row.get(20)?;
    let data_source: String = row.get(24)?;
    let confidence: String = row.get(25)?;

    Ok(FeedingAdvice {
        advice_id: row.get(0)?,
        pond_id: row.get(1)?,
        species_id: row.get(2)?,
        date: row.get(3)?,
        estimated_fish_count: row.get(4)?,
        average_fish_weight_kg: row.get(5)?,
        total_biomass_kg: row.get(6)?,
        stage_name: row.get(7)?,
        protein_percent: row.get(8)?,
        pellet_size: row.get(9)?,
        feeding_frequency: row.get(10)?,
        feeding_times: json_column(row, 11)?,
        feeding_split: json_column(row, 12)?,
        base_rate_percent: row.get(13)?,
        feeding_rate_percent: row.get(14)?,
        base_feed_kg: row.get(15)?,
        recommended_feed_kg: row.get(16)?,
        adjustments: json_column(row, 17)?,
        learning,
        water_temp_c: row.get(19)?,
        season: Season::from_str(&season),
        feed_type_id: row.get(21)?,
        feed_cost_per_kg: row.get(22)?,
        daily_feed_cost: row.get(23)?,
        data_source: DataSource::from_str(&data_source),
        confidence: Confidence::from_str(&confidence),
        medical_warnings: json_column(row, 26)?,
        analysis: json_column(row, 27)?,
        notes: row.get(28)?,
        is_applied: row.get(29)?,
        applied_at: row.get(30)?,
        created_at: row.get(31)?,
    })
}
