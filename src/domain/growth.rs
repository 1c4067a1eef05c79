// ==========================================
// 鱼塘养殖管理系统 - 生长派生记录
// ==========================================
// 职责: 单次抽样相对参照点的生长指标
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 生长计算的参照点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthReference {
    /// 之前的抽样（same_species=false 表示跨品种回退）
    PriorSampling {
        sampling_id: i64,
        date: NaiveDate,
        average_weight_kg: f64,
        same_species: bool,
    },
    /// 放养基线
    Stocking {
        stocking_id: i64,
        date: NaiveDate,
        average_weight_kg: f64,
    },
}

impl GrowthReference {
    pub fn date(&self) -> NaiveDate {
        match self {
            GrowthReference::PriorSampling { date, .. } | GrowthReference::Stocking { date, .. } => *date,
        }
    }

    pub fn average_weight_kg(&self) -> f64 {
        match self {
            GrowthReference::PriorSampling {
                average_weight_kg, ..
            }
            | GrowthReference::Stocking {
                average_weight_kg, ..
            } => *average_weight_kg,
        }
    }
}

/// 生长计算状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthStatus {
    /// 已计算
    Computed,
    /// 无任何参照点（既无前序抽样也无放养）
    NoReference,
    /// 参照点日期不早于本次抽样（天数 ≤ 0）
    InvalidTimeOrdering,
}

/// 生长派生记录（挂在某次抽样上）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRecord {
    pub sampling_id: i64,
    pub pond_id: i64,
    pub species_id: Option<i64>,
    pub date: NaiveDate,
    pub average_weight_kg: f64,
    pub fish_per_kg: f64,
    pub condition_factor: f64,
    pub reference: Option<GrowthReference>,
    pub days_elapsed: Option<i64>,
    pub weight_diff_kg: Option<f64>,
    pub growth_rate_kg_per_day: Option<f64>,
    /// 估算存塘尾数（放养 − 死亡 − 捕捞，不小于0）
    pub estimated_fish_count: i64,
    pub biomass_difference_kg: Option<f64>,
    pub status: GrowthStatus,
}

impl GrowthRecord {
    pub fn is_computed(&self) -> bool {
        self.status == GrowthStatus::Computed
    }
}
