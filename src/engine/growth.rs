// ==========================================
// 鱼塘养殖管理系统 - 生长估算引擎
// ==========================================
// 职责: 计算单次抽样相对参照点的日增重与生物量变化
// 参照点: 同品种前序抽样 → 同塘任意品种前序抽样 → 最近放养
// 输入: 池塘完整历史（纯函数，不访问数据库）
// ==========================================

use crate::domain::events::{HarvestEvent, MortalityEvent, SamplingEvent, StockingEvent};
use crate::domain::growth::{GrowthRecord, GrowthReference, GrowthStatus};
use chrono::NaiveDate;

/// 单个池塘的事件历史（借用）
#[derive(Debug, Clone, Copy)]
pub struct PondHistory<'a> {
    pub samplings: &'a [SamplingEvent],
    pub stockings: &'a [StockingEvent],
    pub mortalities: &'a [MortalityEvent],
    pub harvests: &'a [HarvestEvent],
}

/// 品种范围匹配：scope 为 None 时匹配整塘
fn in_scope(scope: Option<i64>, species_id: Option<i64>) -> bool {
    scope.map_or(true, |s| species_id == Some(s))
}

// ==========================================
// GrowthEstimator - 生长估算
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct GrowthEstimator;

impl GrowthEstimator {
    pub fn new() -> Self {
        Self
    }

    /// 查找参照点
    ///
    /// 1. 同 (pond, species) 且日期严格早于本次的最近抽样
    /// 2. 同塘任意品种的最近前序抽样
    /// 3. 最近放养（品种为空时取整塘）
    pub fn find_reference(
        &self,
        target: &SamplingEvent,
        history: &PondHistory,
    ) -> Option<GrowthReference> {
        let prior = |same_species: bool| {
            history
                .samplings
                .iter()
                .filter(|s| s.sampling_id != target.sampling_id && s.date < target.date)
                .filter(|s| !same_species || s.species_id == target.species_id)
                .max_by_key(|s| (s.date, s.sampling_id))
        };

        let same_species = target.species_id.and_then(|_| prior(true));
        if let Some(s) = same_species {
            return Some(GrowthReference::PriorSampling {
                sampling_id: s.sampling_id,
                date: s.date,
                average_weight_kg: s.average_weight_kg,
                same_species: true,
            });
        }

        if let Some(s) = prior(false) {
            return Some(GrowthReference::PriorSampling {
                sampling_id: s.sampling_id,
                date: s.date,
                average_weight_kg: s.average_weight_kg,
                same_species: target.species_id.is_some() && s.species_id == target.species_id,
            });
        }

        history
            .stockings
            .iter()
            .filter(|st| target.species_id.map_or(true, |sp| st.species_id == sp))
            .max_by_key(|st| (st.date, st.stocking_id))
            .map(|st| GrowthReference::Stocking {
                stocking_id: st.stocking_id,
                date: st.date,
                average_weight_kg: st.initial_avg_weight_kg,
            })
    }

    /// 估算存塘尾数 = 累计放养 − 累计死亡 − 累计捕捞（全历史，不小于0）
    pub fn estimate_fish_count(&self, species_id: Option<i64>, history: &PondHistory) -> i64 {
        let stocked: i64 = history
            .stockings
            .iter()
            .filter(|st| in_scope(species_id, Some(st.species_id)))
            .map(|st| st.pcs)
            .sum();
        let dead: i64 = history
            .mortalities
            .iter()
            .filter(|m| in_scope(species_id, m.species_id))
            .map(|m| m.count)
            .sum();
        let harvested: i64 = history
            .harvests
            .iter()
            .filter(|h| in_scope(species_id, h.species_id))
            .filter_map(|h| h.total_count)
            .sum();

        (stocked - dead - harvested).max(0)
    }

    /// 计算单次抽样的生长记录
    ///
    /// 天数 ≤ 0 时日增重与生物量变化为空（InvalidTimeOrdering），不报错；
    /// 估算尾数为 0 时生物量变化为空。
    pub fn compute(&self, target: &SamplingEvent, history: &PondHistory) -> GrowthRecord {
        let estimated_fish_count = self.estimate_fish_count(target.species_id, history);
        let mut record = GrowthRecord {
            sampling_id: target.sampling_id,
            pond_id: target.pond_id,
            species_id: target.species_id,
            date: target.date,
            average_weight_kg: target.average_weight_kg,
            fish_per_kg: target.fish_per_kg,
            condition_factor: target.condition_factor,
            reference: None,
            days_elapsed: None,
            weight_diff_kg: None,
            growth_rate_kg_per_day: None,
            estimated_fish_count,
            biomass_difference_kg: None,
            status: GrowthStatus::NoReference,
        };

        let Some(reference) = self.find_reference(target, history) else {
            tracing::debug!(
                sampling_id = target.sampling_id,
                pond_id = target.pond_id,
                "无生长参照点"
            );
            return record;
        };

        let days = (target.date - reference.date()).num_days();
        record.days_elapsed = Some(days);
        record.reference = Some(reference.clone());

        if days <= 0 {
            tracing::warn!(
                sampling_id = target.sampling_id,
                pond_id = target.pond_id,
                reference_date = %reference.date(),
                sample_date = %target.date,
                "参照点日期不早于抽样日期，生长指标置空"
            );
            record.status = GrowthStatus::InvalidTimeOrdering;
            return record;
        }

        let weight_diff = target.average_weight_kg - reference.average_weight_kg();
        record.weight_diff_kg = Some(weight_diff);
        record.growth_rate_kg_per_day = Some(weight_diff / days as f64);
        record.biomass_difference_kg =
            (estimated_fish_count > 0).then(|| weight_diff * estimated_fish_count as f64);
        record.status = GrowthStatus::Computed;
        record
    }

    /// 级联重算计划
    ///
    /// 返回同塘中日期 ≥ from_date 的抽样（排除 exclude_id）的新生长记录，
    /// 按日期升序（同日按 sampling_id）。
    pub fn plan_cascade(
        &self,
        history: &PondHistory,
        from_date: NaiveDate,
        exclude_id: Option<i64>,
    ) -> Vec<GrowthRecord> {
        let mut later: Vec<&SamplingEvent> = history
            .samplings
            .iter()
            .filter(|s| s.date >= from_date && Some(s.sampling_id) != exclude_id)
            .collect();
        later.sort_by_key(|s| (s.date, s.sampling_id));

        later.into_iter().map(|s| self.compute(s, history)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    fn stocking(id: i64, species: i64, d: i64, pcs: i64, kg: f64) -> StockingEvent {
        let mut s = StockingEvent::new(1, species, day(d), pcs, kg).unwrap();
        s.stocking_id = id;
        s
    }

    fn sampling(id: i64, species: Option<i64>, d: i64, size: i64, kg: f64) -> SamplingEvent {
        let mut s = SamplingEvent::new(1, species, day(d), size, kg).unwrap();
        s.sampling_id = id;
        s
    }

    #[test]
    fn test_stocking_reference_scenario() {
        let stockings = vec![stocking(1, 7, 0, 1000, 10.0)];
        let samplings = vec![sampling(1, Some(7), 10, 50, 1.0)];
        let history = PondHistory {
            samplings: &samplings,
            stockings: &stockings,
            mortalities: &[],
            harvests: &[],
        };

        let record = GrowthEstimator::new().compute(&samplings[0], &history);
        assert_eq!(record.status, GrowthStatus::Computed);
        assert!((record.growth_rate_kg_per_day.unwrap() - 0.001).abs() < 1e-12);
        // 生物量变化 = 增重 0.01kg × 1000 尾
        assert!((record.biomass_difference_kg.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(record.estimated_fish_count, 1000);
        assert!(matches!(record.reference, Some(GrowthReference::Stocking { .. })));
    }

    #[test]
    fn test_reference_priority() {
        let stockings = vec![stocking(1, 7, 0, 1000, 10.0), stocking(2, 8, 0, 500, 5.0)];
        let samplings = vec![
            sampling(1, Some(7), 10, 10, 0.2),
            sampling(2, Some(8), 15, 10, 0.3),
            sampling(3, Some(7), 20, 10, 0.4),
            sampling(4, Some(9), 25, 10, 0.5),
        ];
        let history = PondHistory {
            samplings: &samplings,
            stockings: &stockings,
            mortalities: &[],
            harvests: &[],
        };
        let estimator = GrowthEstimator::new();

        // 同品种优先，跳过日期更近的其他品种
        match estimator.find_reference(&samplings[2], &history) {
            Some(GrowthReference::PriorSampling { sampling_id, same_species, .. }) => {
                assert_eq!(sampling_id, 1);
                assert!(same_species);
            }
            other => panic!("unexpected reference {:?}", other),
        }

        // 无同品种前序抽样时回退到同塘任意品种
        match estimator.find_reference(&samplings[3], &history) {
            Some(GrowthReference::PriorSampling { sampling_id, same_species, .. }) => {
                assert_eq!(sampling_id, 3);
                assert!(!same_species);
            }
            other => panic!("unexpected reference {:?}", other),
        }
    }

    #[test]
    fn test_negative_growth_preserves_sign() {
        let stockings = vec![stocking(1, 7, 0, 100, 10.0)];
        let samplings = vec![
            sampling(1, Some(7), 10, 10, 2.0),
            sampling(2, Some(7), 20, 10, 1.5),
        ];
        let history = PondHistory {
            samplings: &samplings,
            stockings: &stockings,
            mortalities: &[],
            harvests: &[],
        };
        let record = GrowthEstimator::new().compute(&samplings[1], &history);
        assert!((record.growth_rate_kg_per_day.unwrap() + 0.005).abs() < 1e-12);
        assert!(record.biomass_difference_kg.unwrap() < 0.0);
    }

    #[test]
    fn test_stocking_after_sampling_yields_null_metrics() {
        let stockings = vec![stocking(1, 7, 30, 100, 10.0)];
        let samplings = vec![sampling(1, Some(7), 10, 10, 2.0)];
        let history = PondHistory {
            samplings: &samplings,
            stockings: &stockings,
            mortalities: &[],
            harvests: &[],
        };
        let record = GrowthEstimator::new().compute(&samplings[0], &history);
        assert_eq!(record.status, GrowthStatus::InvalidTimeOrdering);
        assert!(record.growth_rate_kg_per_day.is_none());
        assert!(record.biomass_difference_kg.is_none());
    }

    #[test]
    fn test_fish_count_clamped_and_zero_biomass_null() {
        let stockings = vec![stocking(1, 7, 0, 100, 10.0)];
        let mortalities = vec![MortalityEvent::new(1, Some(7), day(5), 150, None).unwrap()];
        let samplings = vec![sampling(1, Some(7), 10, 10, 2.0)];
        let history = PondHistory {
            samplings: &samplings,
            stockings: &stockings,
            mortalities: &mortalities,
            harvests: &[],
        };
        let record = GrowthEstimator::new().compute(&samplings[0], &history);
        assert_eq!(record.estimated_fish_count, 0);
        assert!(record.growth_rate_kg_per_day.is_some());
        assert!(record.biomass_difference_kg.is_none());
    }

    #[test]
    fn test_cascade_order_and_idempotence() {
        let stockings = vec![stocking(1, 7, 0, 1000, 10.0)];
        let samplings = vec![
            sampling(3, Some(7), 30, 10, 0.5),
            sampling(1, Some(7), 10, 10, 0.2),
            sampling(2, None, 20, 10, 0.3),
        ];
        let history = PondHistory {
            samplings: &samplings,
            stockings: &stockings,
            mortalities: &[],
            harvests: &[],
        };
        let estimator = GrowthEstimator::new();

        let first = estimator.plan_cascade(&history, day(10), Some(1));
        let ids: Vec<i64> = first.iter().map(|r| r.sampling_id).collect();
        assert_eq!(ids, vec![2, 3]);

        let second = estimator.plan_cascade(&history, day(10), Some(1));
        assert_eq!(first, second);
    }
}
