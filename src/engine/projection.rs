// ==========================================
// 鱼塘养殖管理系统 - 目标生物量预测引擎
// ==========================================
// 职责: 估算日增重与 FCR，预测达到目标生物量所需天数与饲料
// 公式: 天数 = ceil(生物量缺口 / (日增重 × 尾数))
//       饲料 = 生物量缺口 × FCR
// 约束: 日增重限幅 [0.001, 0.1]，FCR 限幅 [0.8, 3.0]（可配置）
// ==========================================

use crate::config::EngineConfig;
use crate::domain::events::{FeedEvent, SamplingEvent, StockingEvent};
use crate::domain::projection::{FcrMethod, GrowthRateMethod, ProjectionResult};
use crate::domain::types::{Confidence, DataSource};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Days, NaiveDate};

/// 近期区间权重（其余给全周期）
const RECENT_WEIGHT: f64 = 0.7;
const WHOLE_PERIOD_WEIGHT: f64 = 0.3;
/// 日增重无法估算时的天数上限
const FALLBACK_DAYS: i64 = 365;
/// 预测天数上限（100 年）
pub const MAX_ESTIMATED_DAYS: i64 = 36_500;

const SLOW_GROWTH: f64 = 0.003;
const FAST_GROWTH: f64 = 0.01;
const HIGH_FCR: f64 = 2.0;
const LOW_FCR: f64 = 1.2;
const LONG_TIMELINE_DAYS: i64 = 365;
const SHORT_TIMELINE_DAYS: i64 = 30;
/// 日投喂量占当前生物量的告警比例
const HIGH_DAILY_FEED_RATIO: f64 = 0.05;

/// 预测输入
#[derive(Debug, Clone)]
pub struct ProjectionInputs<'a> {
    pub pond_id: i64,
    pub species_id: i64,
    pub as_of: NaiveDate,
    pub target_biomass_kg: f64,
    /// 最近一次放养（基线）
    pub stocking: &'a StockingEvent,
    /// 同 (pond, species) 抽样，任意顺序
    pub samplings: &'a [SamplingEvent],
    /// 池塘投喂记录，任意顺序
    pub feeds: &'a [FeedEvent],
    /// 当前存活尾数
    pub current_fish_count: i64,
    /// 最近一次带价格的投喂
    pub latest_priced_feed: Option<&'a FeedEvent>,
}

fn sorted_samplings(samplings: &[SamplingEvent]) -> Vec<&SamplingEvent> {
    let mut sorted: Vec<&SamplingEvent> = samplings.iter().collect();
    sorted.sort_by_key(|s| (s.date, s.sampling_id));
    sorted
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ==========================================
// BiomassProjector - 目标生物量预测
// ==========================================
#[derive(Debug, Clone)]
pub struct BiomassProjector {
    config: EngineConfig,
}

impl Default for BiomassProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl BiomassProjector {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    fn clamp_growth(&self, rate: f64) -> f64 {
        rate.clamp(self.config.growth_rate_min, self.config.growth_rate_max)
    }

    fn clamp_fcr(&self, fcr: f64) -> f64 {
        fcr.clamp(self.config.fcr_min, self.config.fcr_max)
    }

    /// 当前生物量 = 放养总重 + Σ 抽样生物量变化
    pub fn current_biomass_kg(stocking_weight_kg: f64, samplings: &[SamplingEvent]) -> f64 {
        stocking_weight_kg
            + samplings
                .iter()
                .filter_map(|s| s.biomass_difference_kg)
                .sum::<f64>()
    }

    /// 全周期日增重：放养 → 最新抽样（已限幅）
    fn whole_period_growth(&self, stocking: &StockingEvent, sorted: &[&SamplingEvent]) -> Option<f64> {
        let latest = sorted.last()?;
        let days = (latest.date - stocking.date).num_days();
        (days > 0).then(|| {
            self.clamp_growth((latest.average_weight_kg - stocking.initial_avg_weight_kg) / days as f64)
        })
    }

    /// 估算日增重
    ///
    /// 相邻抽样构成区间，只取正增重区间：
    /// - ≥2 段：近两段均值 × 0.7 + 全周期 × 0.3（无全周期时用默认值）
    /// - 1 段：该段
    /// - 0 段：全周期，再退到默认值
    pub fn estimate_growth_rate(&self, stocking: &StockingEvent, samplings: &[SamplingEvent]) -> (f64, GrowthRateMethod) {
        let sorted = sorted_samplings(samplings);

        let intervals: Vec<f64> = sorted
            .windows(2)
            .filter_map(|pair| {
                let days = (pair[1].date - pair[0].date).num_days();
                let gain = pair[1].average_weight_kg - pair[0].average_weight_kg;
                (days > 0 && gain > 0.0).then(|| gain / days as f64)
            })
            .collect();
        let whole_period = self.whole_period_growth(stocking, &sorted);

        let (rate, method) = match intervals.len() {
            n if n >= 2 => {
                let recent = mean(&intervals[n - 2..]);
                let whole = whole_period.unwrap_or(self.config.default_growth_rate);
                (
                    RECENT_WEIGHT * recent + WHOLE_PERIOD_WEIGHT * whole,
                    GrowthRateMethod::Blended,
                )
            }
            1 => (intervals[0], GrowthRateMethod::SingleInterval),
            _ => match whole_period {
                Some(rate) => (rate, GrowthRateMethod::WholePeriod),
                None => (self.config.default_growth_rate, GrowthRateMethod::Default),
            },
        };

        (self.clamp_growth(rate), method)
    }

    /// 估算 FCR
    ///
    /// 分段 FCR = (上次抽样, 本次抽样] 内投喂量 / 本次生物量变化（两者都 > 0）
    /// - ≥2 段：近两段均值 × 0.7 + 全部分段均值 × 0.3
    /// - 1 段：该段
    /// - 0 段：放养以来总投喂 / 累计生物量变化，再退到默认值
    pub fn estimate_fcr(
        &self,
        stocking: &StockingEvent,
        samplings: &[SamplingEvent],
        feeds: &[FeedEvent],
        as_of: NaiveDate,
    ) -> (f64, FcrMethod) {
        let sorted = sorted_samplings(samplings);
        let feed_between = |after: NaiveDate, until: NaiveDate| -> f64 {
            feeds
                .iter()
                .filter(|f| f.date > after && f.date <= until)
                .map(|f| f.amount_kg)
                .sum()
        };

        let periods: Vec<f64> = sorted
            .windows(2)
            .filter_map(|pair| {
                let feed = feed_between(pair[0].date, pair[1].date);
                let gain = pair[1].biomass_difference_kg.unwrap_or(0.0);
                (feed > 0.0 && gain > 0.0).then(|| feed / gain)
            })
            .collect();

        let (fcr, method) = match periods.len() {
            n if n >= 2 => (
                RECENT_WEIGHT * mean(&periods[n - 2..]) + WHOLE_PERIOD_WEIGHT * mean(&periods),
                FcrMethod::WeightedPeriods,
            ),
            1 => (periods[0], FcrMethod::SinglePeriod),
            _ => {
                let total_feed: f64 = feeds
                    .iter()
                    .filter(|f| f.date >= stocking.date && f.date <= as_of)
                    .map(|f| f.amount_kg)
                    .sum();
                let total_gain: f64 = samplings.iter().filter_map(|s| s.biomass_difference_kg).sum();
                if total_feed > 0.0 && total_gain > 0.0 {
                    (total_feed / total_gain, FcrMethod::WholePeriod)
                } else {
                    (self.config.default_fcr, FcrMethod::Default)
                }
            }
        };

        (self.clamp_fcr(fcr), method)
    }

    /// 达标天数（日增重或尾数不可用时取 365，不超过 MAX_ESTIMATED_DAYS）
    pub fn estimate_days(gap_kg: f64, growth_rate: f64, fish_count: i64) -> i64 {
        let daily_gain = growth_rate * fish_count as f64;
        if daily_gain <= 0.0 {
            return FALLBACK_DAYS;
        }
        let days = (gap_kg / daily_gain).ceil();
        if !(days < MAX_ESTIMATED_DAYS as f64) {
            return MAX_ESTIMATED_DAYS;
        }
        (days as i64).max(1)
    }

    /// 预测达到目标生物量
    ///
    /// # 返回
    /// - Err(InvalidInput): 目标 ≤ 0
    /// - Err(TargetNotAboveCurrent): 目标不高于当前生物量
    pub fn project(&self, inputs: &ProjectionInputs) -> EngineResult<ProjectionResult> {
        if !(inputs.target_biomass_kg > 0.0 && inputs.target_biomass_kg.is_finite()) {
            return Err(EngineError::InvalidInput(format!(
                "目标生物量必须为大于0的有限值，实际为{}",
                inputs.target_biomass_kg
            )));
        }

        let current_biomass_kg = Self::current_biomass_kg(inputs.stocking.total_weight_kg, inputs.samplings);
        if inputs.target_biomass_kg <= current_biomass_kg {
            return Err(EngineError::TargetNotAboveCurrent {
                target_kg: inputs.target_biomass_kg,
                current_kg: current_biomass_kg,
            });
        }
        let gap = inputs.target_biomass_kg - current_biomass_kg;

        let (growth_rate, growth_method) = self.estimate_growth_rate(inputs.stocking, inputs.samplings);
        let (fcr, fcr_method) = self.estimate_fcr(inputs.stocking, inputs.samplings, inputs.feeds, inputs.as_of);

        let estimated_days = Self::estimate_days(gap, growth_rate, inputs.current_fish_count);
        let estimated_feed_kg = gap * fcr;
        let daily_feed_kg = estimated_feed_kg / estimated_days as f64;
        let estimated_feed_cost = inputs
            .latest_priced_feed
            .and_then(|f| f.effective_cost_per_kg())
            .map(|price| price * estimated_feed_kg);

        let sorted = sorted_samplings(inputs.samplings);
        let current_avg_weight_kg = sorted.last().map(|s| s.average_weight_kg);
        let data_source = if sorted.is_empty() {
            DataSource::StockingBased
        } else {
            DataSource::SamplingBased
        };
        let confidence = match (growth_method, fcr_method) {
            (GrowthRateMethod::Blended, FcrMethod::WeightedPeriods | FcrMethod::SinglePeriod) => Confidence::High,
            _ if !sorted.is_empty() => Confidence::Medium,
            _ => Confidence::Low,
        };

        let mut recommendations = Vec::new();
        let mut warnings = Vec::new();

        if growth_rate < SLOW_GROWTH {
            recommendations.push("日增重偏低，建议检查饲料质量与投喂方案".to_string());
            warnings.push(format!("生长缓慢({:.4} kg/天)，可能推迟出塘", growth_rate));
        } else if growth_rate > FAST_GROWTH {
            recommendations.push("生长表现良好，保持当前养殖管理".to_string());
        }

        if fcr > HIGH_FCR {
            recommendations.push("FCR 偏高，建议优化投喂量与投喂频次".to_string());
            warnings.push(format!("饲料转化效率低(FCR {:.2})，存在投喂浪费", fcr));
        } else if fcr < LOW_FCR {
            recommendations.push("饲料转化效率优秀".to_string());
        }

        if estimated_days >= MAX_ESTIMATED_DAYS {
            warnings.push(format!("预计天数超出 {} 天，已按上限截断", MAX_ESTIMATED_DAYS));
        }
        if estimated_days > LONG_TIMELINE_DAYS {
            recommendations.push("预计周期较长，建议调整目标或强化养殖管理".to_string());
            warnings.push(format!("预计需要 {} 天，目标可能不现实", estimated_days));
        } else if estimated_days < SHORT_TIMELINE_DAYS {
            recommendations.push("预计可快速达标，注意水质与溶氧管理".to_string());
            warnings.push(format!("目标在 {} 天内达成，需防止过度投喂", estimated_days));
        }

        if daily_feed_kg > current_biomass_kg * HIGH_DAILY_FEED_RATIO {
            recommendations.push("日投喂量较大，建议分多次投喂".to_string());
            warnings.push("日投喂量超过当前生物量的5%，注意水质恶化风险".to_string());
        }

        if data_source == DataSource::StockingBased {
            warnings.push("无抽样数据，按放养记录与默认参数估算，置信度低".to_string());
        }

        recommendations.push("定期监测水质（溶氧、氨氮、pH）".to_string());
        recommendations.push("根据季节与水温调整投喂量".to_string());

        Ok(ProjectionResult {
            pond_id: inputs.pond_id,
            species_id: inputs.species_id,
            as_of: inputs.as_of,
            target_biomass_kg: inputs.target_biomass_kg,
            current_biomass_kg,
            biomass_gap_kg: gap,
            current_fish_count: inputs.current_fish_count,
            current_avg_weight_kg,
            growth_rate_kg_per_day: growth_rate,
            growth_rate_method: growth_method,
            feed_conversion_ratio: fcr,
            fcr_method,
            estimated_days,
            target_date: inputs
                .as_of
                .checked_add_days(Days::new(estimated_days.unsigned_abs()))
                .unwrap_or(NaiveDate::MAX),
            estimated_feed_kg,
            daily_feed_kg,
            estimated_feed_cost,
            data_source,
            confidence,
            recommendations,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + chrono::Duration::days(n)
    }

    fn stocking() -> StockingEvent {
        StockingEvent::new(1, 1, day(0), 1000, 100.0).unwrap()
    }

    fn sampling(id: i64, d: i64, avg_kg: f64, biomass: Option<f64>) -> SamplingEvent {
        let mut s = SamplingEvent::new(1, Some(1), day(d), 10, avg_kg * 10.0).unwrap();
        s.sampling_id = id;
        s.biomass_difference_kg = biomass;
        s
    }

    #[test]
    fn test_target_below_current_rejected() {
        let stocking = stocking();
        let samplings = vec![sampling(1, 30, 0.15, Some(50.0))];
        let inputs = ProjectionInputs {
            pond_id: 1,
            species_id: 1,
            as_of: day(31),
            target_biomass_kg: 100.0,
            stocking: &stocking,
            samplings: &samplings,
            feeds: &[],
            current_fish_count: 1000,
            latest_priced_feed: None,
        };
        let result = BiomassProjector::new().project(&inputs);
        assert!(matches!(
            result,
            Err(EngineError::TargetNotAboveCurrent { current_kg, .. }) if (current_kg - 150.0).abs() < 1e-9
        ));

        let zero = ProjectionInputs {
            target_biomass_kg: 0.0,
            ..inputs
        };
        assert!(matches!(
            BiomassProjector::new().project(&zero),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_growth_rate_methods() {
        let projector = BiomassProjector::new();
        let stocking = stocking();

        let (rate, method) = projector.estimate_growth_rate(&stocking, &[]);
        assert_eq!(method, GrowthRateMethod::Default);
        assert!((rate - 0.005).abs() < 1e-12);

        // 放养 0.1 kg → 30 天后 0.4 kg：全周期 0.01
        let one = vec![sampling(1, 30, 0.4, None)];
        let (rate, method) = projector.estimate_growth_rate(&stocking, &one);
        assert_eq!(method, GrowthRateMethod::WholePeriod);
        assert!((rate - 0.01).abs() < 1e-12);

        // 区间: 0.4 → 0.6 (10天, 0.02), 0.6 → 0.9 (10天, 0.03)
        let three = vec![
            sampling(1, 30, 0.4, None),
            sampling(2, 40, 0.6, None),
            sampling(3, 50, 0.9, None),
        ];
        let (rate, method) = projector.estimate_growth_rate(&stocking, &three);
        assert_eq!(method, GrowthRateMethod::Blended);
        // 0.7 × 0.025 + 0.3 × (0.8 / 50)
        assert!((rate - (0.7 * 0.025 + 0.3 * 0.016)).abs() < 1e-12);
    }

    #[test]
    fn test_fcr_periods_and_clamp() {
        let projector = BiomassProjector::new();
        let stocking = stocking();
        let samplings = vec![
            sampling(1, 10, 0.2, Some(100.0)),
            sampling(2, 20, 0.3, Some(100.0)),
            sampling(3, 30, 0.4, Some(100.0)),
        ];
        let feeds: Vec<FeedEvent> = vec![
            FeedEvent::new(1, None, day(15), 150.0).unwrap(),
            FeedEvent::new(1, None, day(25), 130.0).unwrap(),
        ];
        let (fcr, method) = projector.estimate_fcr(&stocking, &samplings, &feeds, day(31));
        assert_eq!(method, FcrMethod::WeightedPeriods);
        // 分段 1.5, 1.3 → 0.7 × 1.4 + 0.3 × 1.4
        assert!((fcr - 1.4).abs() < 1e-9);

        let wasteful = vec![FeedEvent::new(1, None, day(15), 900.0).unwrap()];
        let (fcr, method) = projector.estimate_fcr(&stocking, &samplings, &wasteful, day(31));
        assert_eq!(method, FcrMethod::SinglePeriod);
        assert_eq!(fcr, 3.0);
    }

    #[test]
    fn test_days_and_feed_monotonic_in_target() {
        let projector = BiomassProjector::new();
        let stocking = stocking();
        let samplings = vec![sampling(1, 30, 0.4, Some(300.0))];
        let mut previous: Option<(i64, f64)> = None;

        for target in [500.0, 650.0, 900.0, 1500.0, 4000.0] {
            let inputs = ProjectionInputs {
                pond_id: 1,
                species_id: 1,
                as_of: day(31),
                target_biomass_kg: target,
                stocking: &stocking,
                samplings: &samplings,
                feeds: &[],
                current_fish_count: 1000,
                latest_priced_feed: None,
            };
            let result = projector.project(&inputs).unwrap();
            assert!(result.estimated_days >= 1);
            if let Some((days, feed)) = previous {
                assert!(result.estimated_days >= days);
                assert!(result.estimated_feed_kg >= feed);
            }
            previous = Some((result.estimated_days, result.estimated_feed_kg));
        }
    }

    #[test]
    fn test_zero_fish_uses_fallback_days() {
        assert_eq!(BiomassProjector::estimate_days(100.0, 0.01, 0), 365);
        assert_eq!(BiomassProjector::estimate_days(0.5, 0.01, 1000), 1);
        assert_eq!(BiomassProjector::estimate_days(100.0, 0.01, 1000), 10);
        assert_eq!(BiomassProjector::estimate_days(1.0e15, 0.005, 1), MAX_ESTIMATED_DAYS);
        assert_eq!(BiomassProjector::estimate_days(f64::INFINITY, 0.005, 1), MAX_ESTIMATED_DAYS);
    }

    #[test]
    fn test_stocking_only_projection() {
        let stocking = stocking();
        let priced = FeedEvent::new(1, None, day(2), 10.0)
            .unwrap()
            .with_kg_pricing(5.0)
            .unwrap();
        let inputs = ProjectionInputs {
            pond_id: 1,
            species_id: 1,
            as_of: day(5),
            target_biomass_kg: 200.0,
            stocking: &stocking,
            samplings: &[],
            feeds: &[],
            current_fish_count: 1000,
            latest_priced_feed: Some(&priced),
        };
        let result = BiomassProjector::new().project(&inputs).unwrap();
        assert_eq!(result.data_source, DataSource::StockingBased);
        assert_eq!(result.confidence, Confidence::Low);
        // 缺口 100 kg，默认日增重 0.005 × 1000 尾 → 20 天
        assert_eq!(result.estimated_days, 20);
        assert!((result.estimated_feed_kg - 150.0).abs() < 1e-9);
        assert!((result.estimated_feed_cost.unwrap() - 750.0).abs() < 1e-9);
        assert_eq!(result.target_date, day(25));
    }
}
