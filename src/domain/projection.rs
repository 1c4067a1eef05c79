// ==========================================
// 鱼塘养殖管理系统 - 目标生物量预测 / FCR 报告
// ==========================================

use crate::domain::types::{Confidence, DataSource, FcrStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 日增重估算方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthRateMethod {
    /// 近两段区间 70% + 全周期 30%
    Blended,
    /// 仅一段有效区间
    SingleInterval,
    /// 全周期（放养 → 最新抽样）
    WholePeriod,
    /// 默认值
    Default,
}

/// FCR 估算方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FcrMethod {
    /// 近两段 70% + 全部分段均值 30%
    WeightedPeriods,
    SinglePeriod,
    WholePeriod,
    Default,
}

/// 目标生物量预测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub pond_id: i64,
    pub species_id: i64,
    pub as_of: NaiveDate,
    pub target_biomass_kg: f64,
    pub current_biomass_kg: f64,
    pub biomass_gap_kg: f64,
    pub current_fish_count: i64,
    pub current_avg_weight_kg: Option<f64>,

    pub growth_rate_kg_per_day: f64,
    pub growth_rate_method: GrowthRateMethod,
    pub feed_conversion_ratio: f64,
    pub fcr_method: FcrMethod,

    pub estimated_days: i64,
    pub target_date: NaiveDate,
    pub estimated_feed_kg: f64,
    pub daily_feed_kg: f64,
    pub estimated_feed_cost: Option<f64>,

    pub data_source: DataSource,
    pub confidence: Confidence,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

/// 区间 FCR 分析报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcrReport {
    pub pond_id: i64,
    pub species_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub initial_avg_weight_kg: f64,
    pub final_avg_weight_kg: f64,
    pub estimated_fish_count: i64,
    pub total_weight_gain_kg: f64,
    pub total_feed_kg: f64,
    pub fcr: Option<f64>,
    pub status: Option<FcrStatus>,
    /// 末次抽样 ±7 天内的捕捞均重（交叉核对）
    pub harvest_cross_check_avg_kg: Option<f64>,
}

/// 生物量汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomassAnalysis {
    pub pond_id: i64,
    pub species_id: Option<i64>,
    pub stocking_weight_kg: f64,
    pub total_gain_kg: f64,
    pub total_loss_kg: f64,
    pub net_change_kg: f64,
    pub current_biomass_kg: f64,
    pub sampling_count: usize,
}
