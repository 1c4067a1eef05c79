// ==========================================
// 鱼塘养殖管理系统 - 存活估算引擎
// ==========================================
// 职责: 由累计量重算存活尾数、存活率与存塘重量
// 说明: 每次从全量累计值计算，不做增量维护
// ==========================================

use crate::domain::survival::{PopulationTotals, SurvivalSnapshot};
use crate::domain::types::MortalityTrend;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{NaiveDate, NaiveDateTime};

/// 日均死亡占放养比例阈值
const HIGH_DAILY_MORTALITY_RATIO: f64 = 0.001;
const LOW_DAILY_MORTALITY_RATIO: f64 = 0.0001;

#[derive(Debug, Clone, Default)]
pub struct PopulationEstimator;

impl PopulationEstimator {
    pub fn new() -> Self {
        Self
    }

    /// 生成存活快照
    ///
    /// # 参数
    /// - totals: 范围内累计量（截至 as_of 或窗口末）
    /// - average_weight_kg: 最近抽样均重，无抽样时取最近放养初始均重
    /// - trend: 近期死亡趋势
    ///
    /// # 返回
    /// - Err(MissingBaselineData): 范围内无放养
    pub fn estimate(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        as_of: NaiveDate,
        totals: &PopulationTotals,
        average_weight_kg: Option<f64>,
        trend: MortalityTrend,
        created_at: NaiveDateTime,
    ) -> EngineResult<SurvivalSnapshot> {
        if totals.total_stocked <= 0 {
            return Err(EngineError::MissingBaselineData {
                pond_id,
                species_id,
            });
        }

        let current_alive = totals.current_alive();
        let survival_rate_percent = current_alive as f64 / totals.total_stocked as f64 * 100.0;
        let total_survival_kg = average_weight_kg.map(|avg| current_alive as f64 * avg);

        Ok(SurvivalSnapshot {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            pond_id,
            species_id,
            date: as_of,
            initial_stocked: totals.total_stocked,
            current_alive,
            total_mortality: totals.total_mortality,
            total_harvested: totals.total_harvested,
            survival_rate_percent,
            mortality_weight_kg: totals.mortality_weight_kg,
            harvested_weight_kg: totals.harvested_weight_kg,
            average_weight_kg,
            total_survival_kg,
            mortality_trend: trend,
            created_at,
        })
    }

    /// 死亡趋势：窗口内日均死亡数占累计放养的比例
    pub fn mortality_trend(&self, recent_deaths: i64, window_days: i64, total_stocked: i64) -> MortalityTrend {
        if total_stocked <= 0 || window_days <= 0 {
            return MortalityTrend::Normal;
        }
        let daily_ratio = recent_deaths as f64 / window_days as f64 / total_stocked as f64;
        if daily_ratio > HIGH_DAILY_MORTALITY_RATIO {
            MortalityTrend::High
        } else if daily_ratio < LOW_DAILY_MORTALITY_RATIO {
            MortalityTrend::Low
        } else {
            MortalityTrend::Normal
        }
    }
}
