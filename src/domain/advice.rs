// ==========================================
// 鱼塘养殖管理系统 - 投喂建议
// ==========================================
// 职责: 投喂建议实体及其调整项明细
// 约束: 建议全部由当前数据重算得出，只允许修改“已采纳”标记与时间
// ==========================================

use crate::domain::types::{Confidence, DataSource, Season};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 加法型调整项（百分比）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedingAdjustments {
    pub water_quality: f64,
    pub temperature: f64,
    pub mortality: f64,
    pub growth: f64,
    pub seasonal: f64,
    pub feeding_consistency: f64,
    /// 环境类调整项合计（已限制在 [-50, 30]）
    pub environmental_total: f64,
    /// 病害调整（不参与上述限幅）
    pub medical: f64,
    /// 最终调整 = environmental_total + medical
    pub total: f64,
}

impl FeedingAdjustments {
    /// 调整系数 = 1 + total/100
    pub fn factor(&self) -> f64 {
        1.0 + self.total / 100.0
    }
}

/// 乘法型调整系数（无抽样数据时的简化估算）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackFactors {
    pub temperature: f64,
    pub seasonal: f64,
    pub medical: f64,
}

impl FallbackFactors {
    pub fn combined(&self) -> f64 {
        self.temperature * self.seasonal * self.medical
    }
}

impl Default for FallbackFactors {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            seasonal: 1.0,
            medical: 1.0,
        }
    }
}

/// 调整明细
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AdjustmentBreakdown {
    Additive(FeedingAdjustments),
    Multiplicative(FallbackFactors),
}

impl AdjustmentBreakdown {
    pub fn factor(&self) -> f64 {
        match self {
            AdjustmentBreakdown::Additive(adj) => adj.factor(),
            AdjustmentBreakdown::Multiplicative(f) => f.combined(),
        }
    }
}

/// 基于历史已采纳建议的学习修正
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningAdjustment {
    /// 参与统计的已采纳建议数
    pub advice_count: usize,
    /// 投喂率修正系数
    pub rate_factor: f64,
    /// 投喂量修正系数
    pub feed_factor: f64,
}

// ==========================================
// FeedingAdvice - 投喂建议
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingAdvice {
    pub advice_id: String,
    pub pond_id: i64,
    pub species_id: Option<i64>,
    pub date: NaiveDate,

    // ===== 存塘估算 =====
    pub estimated_fish_count: i64,
    pub average_fish_weight_kg: f64,
    pub total_biomass_kg: f64,

    // ===== 阶段表 =====
    pub stage_name: String,
    pub protein_percent: u8,
    pub pellet_size: String,
    pub feeding_frequency: u32,
    pub feeding_times: Vec<String>,
    pub feeding_split: Vec<u8>,

    // ===== 投喂量 =====
    pub base_rate_percent: f64,
    pub feeding_rate_percent: f64,
    pub base_feed_kg: f64,
    pub recommended_feed_kg: f64,
    pub adjustments: AdjustmentBreakdown,
    pub learning: Option<LearningAdjustment>,

    // ===== 环境与成本 =====
    pub water_temp_c: Option<f64>,
    pub season: Season,
    pub feed_type_id: Option<i64>,
    pub feed_cost_per_kg: Option<f64>,
    pub daily_feed_cost: Option<f64>,

    // ===== 可解释性 =====
    pub data_source: DataSource,
    pub confidence: Confidence,
    pub medical_warnings: Vec<String>,
    /// 各子分析结果（JSON）
    pub analysis: serde_json::Value,
    pub notes: String,

    // ===== 采纳状态 =====
    pub is_applied: bool,
    pub applied_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}
