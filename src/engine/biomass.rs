// ==========================================
// 鱼塘养殖管理系统 - FCR 报告 / 生物量汇总
// ==========================================
// 职责: 区间 FCR 报告（首末抽样之间）与生物量增减汇总
// ==========================================

use crate::domain::events::{FeedEvent, HarvestEvent, SamplingEvent};
use crate::domain::projection::{BiomassAnalysis, FcrReport};
use crate::domain::survival::PopulationTotals;
use crate::domain::types::FcrStatus;
use crate::engine::projection::BiomassProjector;

/// 捕捞交叉核对的日期容差（天）
const HARVEST_CROSS_CHECK_DAYS: i64 = 7;

#[derive(Debug, Clone, Default)]
pub struct FcrAnalyzer;

impl FcrAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// 区间 FCR 报告
    ///
    /// # 参数
    /// - samplings: 范围内 (pond, species) 抽样
    /// - feeds: 池塘投喂记录
    /// - totals: 品种累计量（用于估算尾数）
    /// - harvests: 品种捕捞记录（交叉核对）
    ///
    /// # 返回
    /// - None: 抽样不足两次或首末同日
    pub fn analyze(
        &self,
        pond_id: i64,
        species_id: i64,
        samplings: &[SamplingEvent],
        feeds: &[FeedEvent],
        totals: &PopulationTotals,
        harvests: &[HarvestEvent],
    ) -> Option<FcrReport> {
        let first = samplings.iter().min_by_key(|s| (s.date, s.sampling_id))?;
        let last = samplings.iter().max_by_key(|s| (s.date, s.sampling_id))?;
        let days = (last.date - first.date).num_days();
        if samplings.len() < 2 || days <= 0 {
            return None;
        }

        let estimated_fish_count = totals.current_alive();
        let total_weight_gain_kg =
            estimated_fish_count as f64 * (last.average_weight_kg - first.average_weight_kg);
        let total_feed_kg: f64 = feeds
            .iter()
            .filter(|f| f.date >= first.date && f.date <= last.date)
            .map(|f| f.amount_kg)
            .sum();

        let fcr = (total_weight_gain_kg > 0.0 && total_feed_kg > 0.0)
            .then(|| total_feed_kg / total_weight_gain_kg);

        let harvest_cross_check_avg_kg = harvests
            .iter()
            .filter(|h| (h.date - last.date).num_days().abs() <= HARVEST_CROSS_CHECK_DAYS)
            .min_by_key(|h| (h.date - last.date).num_days().abs())
            .and_then(|h| h.avg_weight_kg);

        Some(FcrReport {
            pond_id,
            species_id,
            start_date: first.date,
            end_date: last.date,
            days,
            initial_avg_weight_kg: first.average_weight_kg,
            final_avg_weight_kg: last.average_weight_kg,
            estimated_fish_count,
            total_weight_gain_kg,
            total_feed_kg,
            fcr,
            status: fcr.map(FcrStatus::from_fcr),
            harvest_cross_check_avg_kg,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BiomassAnalyzer;

impl BiomassAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// 生物量汇总：放养总重 + 正向变化 − 负向变化
    pub fn analyze(
        &self,
        pond_id: i64,
        species_id: Option<i64>,
        stocking_weight_kg: f64,
        samplings: &[SamplingEvent],
    ) -> BiomassAnalysis {
        let diffs: Vec<f64> = samplings.iter().filter_map(|s| s.biomass_difference_kg).collect();
        let total_gain_kg: f64 = diffs.iter().filter(|d| **d > 0.0).sum();
        let total_loss_kg: f64 = diffs.iter().filter(|d| **d < 0.0).map(|d| d.abs()).sum();

        BiomassAnalysis {
            pond_id,
            species_id,
            stocking_weight_kg,
            total_gain_kg,
            total_loss_kg,
            net_change_kg: total_gain_kg - total_loss_kg,
            current_biomass_kg: BiomassProjector::current_biomass_kg(stocking_weight_kg, samplings),
            sampling_count: samplings.len(),
        }
    }
}
