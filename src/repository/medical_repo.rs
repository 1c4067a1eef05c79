// ==========================================
// 鱼塘养殖管理系统 - 病害诊断数据仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::events::MedicalDiagnostic;
use crate::domain::types::DateRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 病害诊断仓储
pub struct MedicalDiagnosticRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MedicalDiagnosticRepository {
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

    pub fn insert(&self, diagnostic: &MedicalDiagnostic) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO medical_diagnostic (
                pond_id, disease_name, confidence_percent, recommended_treatment,
                diagnosed_on, is_applied, applied_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                diagnostic.pond_id,
                diagnostic.disease_name,
                diagnostic.confidence_percent,
                diagnostic.recommended_treatment,
                diagnostic.diagnosed_on,
                diagnostic.is_applied,
                diagnostic.applied_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按诊断日期升序列出
    pub fn list(&self, pond_id: i64, range: DateRange) -> RepositoryResult<Vec<MedicalDiagnostic>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT diagnostic_id, pond_id, disease_name, confidence_percent,
                   recommended_treatment, diagnosed_on, is_applied, applied_at
            FROM medical_diagnostic
            WHERE pond_id = ?1
              AND (?2 IS NULL OR diagnosed_on >= ?2) AND (?3 IS NULL OR diagnosed_on <= ?3)
            ORDER BY diagnosed_on ASC, diagnostic_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![pond_id, range.start, range.end], map_diagnostic)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 标记治疗方案已执行
    pub fn mark_applied(&self, diagnostic_id: i64, applied_at: NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE medical_diagnostic SET is_applied = 1, applied_at = ?2 WHERE diagnostic_id = ?1",
            params![diagnostic_id, applied_at],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MedicalDiagnostic".to_string(),
                id: diagnostic_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_diagnostic(row: &Row) -> rusqlite::Result<MedicalDiagnostic> {
    Ok(MedicalDiagnostic {
        diagnostic_id: row.get(0)?,
        pond_id: row.get(1)?,
        disease_name: row.get(2)?,
        confidence_percent: row.get(3)?,
        recommended_treatment: row.get(4)?,
        diagnosed_on: row.get(5)?,
        is_applied: row.get(6)?,
        applied_at: row.get(7)?,
    })
}
