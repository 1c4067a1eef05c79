// ==========================================
// 鱼塘养殖管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::SeasonMonths;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    pub const EXPECTED_GROWTH_BASELINE: &str = "growth/expected_baseline_kg_per_day";
    pub const DEFAULT_GROWTH_RATE: &str = "growth/default_rate_kg_per_day";
    pub const GROWTH_RATE_MIN: &str = "growth/rate_min";
    pub const GROWTH_RATE_MAX: &str = "growth/rate_max";
    pub const STOCKING_FALLBACK_GROWTH: &str = "growth/stocking_fallback_kg_per_day";
    pub const DEFAULT_FCR: &str = "fcr/default";
    pub const FCR_MIN: &str = "fcr/min";
    pub const FCR_MAX: &str = "fcr/max";
    pub const ANALYSIS_WINDOW_DAYS: &str = "analysis/window_days";
    pub const DAILY_LOG_WINDOW_DAYS: &str = "analysis/daily_log_window_days";
    pub const GROWTH_WINDOW_DAYS: &str = "analysis/growth_window_days";
    pub const LEARNING_ADVICE_LIMIT: &str = "learning/advice_limit";
    pub const LEARNING_SAMPLING_LIMIT: &str = "learning/sampling_limit";
    pub const WINTER_MONTHS: &str = "season/winter_months";
    pub const SPRING_MONTHS: &str = "season/spring_months";
    pub const SUMMER_MONTHS: &str = "season/summer_months";
}

/// 计算引擎可调参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 学习修正的期望日增重基线（kg/天/尾）
    pub expected_growth_baseline: f64,
    /// 无抽样时的默认日增重
    pub default_growth_rate: f64,
    pub growth_rate_min: f64,
    pub growth_rate_max: f64,
    /// 放养估算用的线性日增重（0.1 g/天）
    pub stocking_fallback_growth: f64,
    pub default_fcr: f64,
    pub fcr_min: f64,
    pub fcr_max: f64,
    /// 死亡/水样/投喂/诊断分析回看天数
    pub analysis_window_days: i64,
    /// 日常水质记录回看天数
    pub daily_log_window_days: i64,
    /// 生长质量分析回看天数
    pub growth_window_days: i64,
    pub learning_advice_limit: usize,
    pub learning_sampling_limit: usize,
    pub season_months: SeasonMonths,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expected_growth_baseline: 0.015,
            default_growth_rate: 0.005,
            growth_rate_min: 0.001,
            growth_rate_max: 0.1,
            stocking_fallback_growth: 0.0001,
            default_fcr: 1.5,
            fcr_min: 0.8,
            fcr_max: 3.0,
            analysis_window_days: 30,
            daily_log_window_days: 7,
            growth_window_days: 90,
            learning_advice_limit: 5,
            learning_sampling_limit: 3,
            season_months: SeasonMonths::default(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    // ===== 类型化读取 =====

    fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_value(key)?;
        Ok(value
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default))
    }

    fn get_usize_or(&self, key: &str, default: usize) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_value(key)?;
        Ok(value
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(default))
    }

    fn get_months_or(&self, key: &str, default: &[u32]) -> Result<Vec<u32>, Box<dyn Error>> {
        let Some(value) = self.get_config_value(key)? else {
            return Ok(default.to_vec());
        };

        let months: Vec<u32> = value
            .split(',')
            .filter_map(|s| s.trim().parse::<u32>().ok())
            .filter(|&m| (1..=12).contains(&m))
            .collect();

        if months.is_empty() {
            Ok(default.to_vec())
        } else {
            Ok(months)
        }
    }

    /// 读取引擎配置（未配置项取默认值）
    pub fn get_engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        use config_keys::*;
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            expected_growth_baseline: self
                .get_f64_or(EXPECTED_GROWTH_BASELINE, defaults.expected_growth_baseline)?,
            default_growth_rate: self.get_f64_or(DEFAULT_GROWTH_RATE, defaults.default_growth_rate)?,
            growth_rate_min: self.get_f64_or(GROWTH_RATE_MIN, defaults.growth_rate_min)?,
            growth_rate_max: self.get_f64_or(GROWTH_RATE_MAX, defaults.growth_rate_max)?,
            stocking_fallback_growth: self
                .get_f64_or(STOCKING_FALLBACK_GROWTH, defaults.stocking_fallback_growth)?,
            default_fcr: self.get_f64_or(DEFAULT_FCR, defaults.default_fcr)?,
            fcr_min: self.get_f64_or(FCR_MIN, defaults.fcr_min)?,
            fcr_max: self.get_f64_or(FCR_MAX, defaults.fcr_max)?,
            analysis_window_days: self
                .get_usize_or(ANALYSIS_WINDOW_DAYS, defaults.analysis_window_days as usize)?
                as i64,
            daily_log_window_days: self
                .get_usize_or(DAILY_LOG_WINDOW_DAYS, defaults.daily_log_window_days as usize)?
                as i64,
            growth_window_days: self
                .get_usize_or(GROWTH_WINDOW_DAYS, defaults.growth_window_days as usize)?
                as i64,
            learning_advice_limit: self
                .get_usize_or(LEARNING_ADVICE_LIMIT, defaults.learning_advice_limit)?,
            learning_sampling_limit: self
                .get_usize_or(LEARNING_SAMPLING_LIMIT, defaults.learning_sampling_limit)?,
            season_months: SeasonMonths {
                winter: self.get_months_or(WINTER_MONTHS, &defaults.season_months.winter)?,
                spring: self.get_months_or(SPRING_MONTHS, &defaults.season_months.spring)?,
                summer: self.get_months_or(SUMMER_MONTHS, &defaults.season_months.summer)?,
            },
        };

        if config.growth_rate_min > config.growth_rate_max || config.fcr_min > config.fcr_max {
            tracing::warn!("限幅配置上下界颠倒，回退到默认限幅");
            return Ok(EngineConfig {
                growth_rate_min: defaults.growth_rate_min,
                growth_rate_max: defaults.growth_rate_max,
                fcr_min: defaults.fcr_min,
                fcr_max: defaults.fcr_max,
                ..config
            });
        }

        Ok(config)
    }
}
