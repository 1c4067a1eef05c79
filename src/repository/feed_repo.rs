// ==========================================
// 鱼塘养殖管理系统 - 投喂记录数据仓储
// ==========================================
// 说明: 投喂记录只到池塘粒度（不区分品种）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::events::FeedEvent;
use crate::domain::types::DateRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const POND_RANGE_FILTER: &str =
    "pond_id = ?1 AND (?2 IS NULL OR date >= ?2) AND (?3 IS NULL OR date <= ?3)";

/// 投喂记录仓储
pub struct FeedRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeedRepository {
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

    pub fn insert(&self, feed: &FeedEvent) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO feed (
                pond_id, feed_type_id, date, amount_kg, packet_size_kg, cost_per_packet,
                cost_per_kg, total_cost, biomass_at_feeding_kg, feeding_rate_percent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                feed.pond_id,
                feed.feed_type_id,
                feed.date,
                feed.amount_kg,
                feed.packet_size_kg,
                feed.cost_per_packet,
                feed.cost_per_kg,
                feed.total_cost,
                feed.biomass_at_feeding_kg,
                feed.feeding_rate_percent,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按日期升序列出
    pub fn list(&self, pond_id: i64, range: DateRange) -> RepositoryResult<Vec<FeedEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feed WHERE {} ORDER BY date ASC, feed_id ASC",
            COLUMNS, POND_RANGE_FILTER
        ))?;
        let rows = stmt
            .query_map(params![pond_id, range.start, range.end], map_feed)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 累计投喂量 kg
    pub fn sum_amount(&self, pond_id: i64, range: DateRange) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(amount_kg), 0.0) FROM feed WHERE {}",
                POND_RANGE_FILTER
            ),
            params![pond_id, range.start, range.end],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 最近一条带价格信息的投喂记录
    pub fn latest_priced(&self, pond_id: i64) -> RepositoryResult<Option<FeedEvent>> {
        let conn = self.get_conn()?;
        let feed = conn
            .query_row(
                &format!(
                    r#"
                    SELECT {} FROM feed
                    WHERE pond_id = ?1 AND (cost_per_kg IS NOT NULL OR cost_per_packet IS NOT NULL)
                    ORDER BY date DESC, feed_id DESC LIMIT 1
                    "#,
                    COLUMNS
                ),
                params![pond_id],
                map_feed,
            )
            .optional()?;
        Ok(feed)
    }
}

const COLUMNS: &str = "feed_id, pond_id, feed_type_id, date, amount_kg, packet_size_kg, \
                       cost_per_packet, cost_per_kg, total_cost, biomass_at_feeding_kg, \
                       feeding_rate_percent";

fn map_feed(row: &Row) -> rusqlite::Result<FeedEvent> {
    Ok(FeedEvent {
        feed_id: row.get(0)?,
        pond_id: row.get(1)?,
        feed_type_id: row.get(2)?,
        date: row.get(3)?,
        amount_kg: row.get(4)?,
        packet_size_kg: row.get(5)?,
        cost_per_packet: row.get(6)?,
        cost_per_kg: row.get(7)?,
        total_cost: row.get(8)?,
        biomass_at_feeding_kg: row.get(9)?,
        feeding_rate_percent: row.get(10)?,
    })
}
