// ==========================================
// 鱼塘养殖管理系统 - 存活快照
// ==========================================
// 职责: 按累计量重算的存活/存塘数据，不做增量维护
// ==========================================

use crate::domain::types::MortalityTrend;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 某范围内（池塘或池塘+品种）的累计量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationTotals {
    pub total_stocked: i64,
    pub total_mortality: i64,
    pub total_harvested: i64,
    pub mortality_weight_kg: f64,
    pub harvested_weight_kg: f64,
}

impl PopulationTotals {
    /// 当前存活尾数（不小于0）
    pub fn current_alive(&self) -> i64 {
        (self.total_stocked - self.total_mortality - self.total_harvested).max(0)
    }
}

/// 存活快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalSnapshot {
    pub snapshot_id: String,
    pub pond_id: i64,
    pub species_id: Option<i64>,
    pub date: NaiveDate,
    pub initial_stocked: i64,
    pub current_alive: i64,
    pub total_mortality: i64,
    pub total_harvested: i64,
    pub survival_rate_percent: f64,
    pub mortality_weight_kg: f64,
    pub harvested_weight_kg: f64,
    /// 用于估算存塘重量的均重 kg
    pub average_weight_kg: Option<f64>,
    /// 存塘重量 kg = 存活尾数 × 均重
    pub total_survival_kg: Option<f64>,
    pub mortality_trend: MortalityTrend,
    pub created_at: NaiveDateTime,
}
