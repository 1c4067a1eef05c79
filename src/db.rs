// ==========================================
// 鱼塘养殖管理系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys 与 busy_timeout 都需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等），并写入当前 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    let version = read_schema_version(conn)?;
    if version != Some(CURRENT_SCHEMA_VERSION) {
        tracing::warn!(
            expected = CURRENT_SCHEMA_VERSION,
            actual = ?version,
            "数据库 schema_version 与代码不一致"
        );
    }
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS pond (
    pond_id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    name TEXT NOT NULL,
    area_decimal REAL,
    depth_ft REAL,
    volume_m3 REAL,
    location TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pond_owner ON pond(owner);

CREATE TABLE IF NOT EXISTS species (
    species_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    scientific_name TEXT,
    parent_id INTEGER REFERENCES species(species_id)
);

CREATE TABLE IF NOT EXISTS feed_type (
    feed_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    protein_percent REAL,
    parent_id INTEGER REFERENCES feed_type(feed_type_id)
);

CREATE TABLE IF NOT EXISTS stocking (
    stocking_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    species_id INTEGER NOT NULL REFERENCES species(species_id),
    date TEXT NOT NULL,
    pcs INTEGER NOT NULL CHECK (pcs > 0),
    total_weight_kg REAL NOT NULL CHECK (total_weight_kg > 0),
    cost REAL,
    pieces_per_kg REAL NOT NULL,
    initial_avg_weight_kg REAL NOT NULL,
    notes TEXT,
    UNIQUE (pond_id, species_id, date)
);
CREATE INDEX IF NOT EXISTS idx_stocking_pond_date ON stocking(pond_id, date);

CREATE TABLE IF NOT EXISTS fish_sampling (
    sampling_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    species_id INTEGER REFERENCES species(species_id),
    date TEXT NOT NULL,
    sample_size INTEGER NOT NULL CHECK (sample_size > 0),
    total_weight_kg REAL NOT NULL CHECK (total_weight_kg > 0),
    average_weight_kg REAL NOT NULL,
    fish_per_kg REAL NOT NULL,
    condition_factor REAL NOT NULL,
    growth_rate_kg_per_day REAL,
    biomass_difference_kg REAL,
    notes TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_sampling_pond_date ON fish_sampling(pond_id, date);

CREATE TABLE IF NOT EXISTS mortality (
    mortality_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    species_id INTEGER REFERENCES species(species_id),
    date TEXT NOT NULL,
    count INTEGER NOT NULL CHECK (count > 0),
    avg_weight_kg REAL,
    total_weight_kg REAL,
    cause TEXT,
    notes TEXT
);
CREATE INDEX IF NOT EXISTS idx_mortality_pond_date ON mortality(pond_id, date);

CREATE TABLE IF NOT EXISTS harvest (
    harvest_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    species_id INTEGER REFERENCES species(species_id),
    date TEXT NOT NULL,
    total_weight_kg REAL NOT NULL,
    pieces_per_kg REAL,
    price_per_kg REAL,
    avg_weight_kg REAL,
    total_count INTEGER,
    total_revenue REAL
);
CREATE INDEX IF NOT EXISTS idx_harvest_pond_date ON harvest(pond_id, date);

CREATE TABLE IF NOT EXISTS feed (
    feed_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    feed_type_id INTEGER REFERENCES feed_type(feed_type_id),
    date TEXT NOT NULL,
    amount_kg REAL NOT NULL CHECK (amount_kg > 0),
    packet_size_kg REAL,
    cost_per_packet REAL,
    cost_per_kg REAL,
    total_cost REAL,
    biomass_at_feeding_kg REAL,
    feeding_rate_percent REAL
);
CREATE INDEX IF NOT EXISTS idx_feed_pond_date ON feed(pond_id, date);

CREATE TABLE IF NOT EXISTS water_quality (
    reading_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    source TEXT NOT NULL,
    temperature_c REAL,
    ph REAL,
    dissolved_oxygen REAL,
    ammonia REAL,
    nitrite REAL
);
CREATE INDEX IF NOT EXISTS idx_water_pond_date ON water_quality(pond_id, source, date);

CREATE TABLE IF NOT EXISTS medical_diagnostic (
    diagnostic_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    disease_name TEXT NOT NULL,
    confidence_percent REAL NOT NULL,
    recommended_treatment TEXT,
    diagnosed_on TEXT NOT NULL,
    is_applied INTEGER NOT NULL DEFAULT 0,
    applied_at TEXT
);

CREATE TABLE IF NOT EXISTS feeding_advice (
    advice_id TEXT PRIMARY KEY,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    species_id INTEGER REFERENCES species(species_id),
    date TEXT NOT NULL,
    estimated_fish_count INTEGER NOT NULL,
    average_fish_weight_kg REAL NOT NULL,
    total_biomass_kg REAL NOT NULL,
    stage_name TEXT NOT NULL,
    protein_percent INTEGER NOT NULL,
    pellet_size TEXT NOT NULL,
    feeding_frequency INTEGER NOT NULL,
    feeding_times_json TEXT NOT NULL,
    feeding_split_json TEXT NOT NULL,
    base_rate_percent REAL NOT NULL,
    feeding_rate_percent REAL NOT NULL,
    base_feed_kg REAL NOT NULL,
    recommended_feed_kg REAL NOT NULL,
    adjustments_json TEXT NOT NULL,
    learning_json TEXT,
    water_temp_c REAL,
    season TEXT NOT NULL,
    feed_type_id INTEGER REFERENCES feed_type(feed_type_id),
    feed_cost_per_kg REAL,
    daily_feed_cost REAL,
    data_source TEXT NOT NULL,
    confidence TEXT NOT NULL,
    medical_warnings_json TEXT NOT NULL,
    analysis_json TEXT NOT NULL,
    notes TEXT NOT NULL,
    is_applied INTEGER NOT NULL DEFAULT 0,
    applied_at TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_advice_pond_species ON feeding_advice(pond_id, species_id, applied_at);

CREATE TABLE IF NOT EXISTS survival_snapshot (
    snapshot_id TEXT PRIMARY KEY,
    pond_id INTEGER NOT NULL REFERENCES pond(pond_id) ON DELETE CASCADE,
    species_id INTEGER REFERENCES species(species_id),
    date TEXT NOT NULL,
    initial_stocked INTEGER NOT NULL,
    current_alive INTEGER NOT NULL,
    total_mortality INTEGER NOT NULL,
    total_harvested INTEGER NOT NULL,
    survival_rate_percent REAL NOT NULL,
    mortality_weight_kg REAL NOT NULL,
    harvested_weight_kg REAL NOT NULL,
    average_weight_kg REAL,
    total_survival_kg REAL,
    mortality_trend TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_survival_pond_date ON survival_snapshot(pond_id, date);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
