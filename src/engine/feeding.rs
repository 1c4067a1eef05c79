// ==========================================
// 鱼塘养殖管理系统 - 投喂建议引擎
// ==========================================
// 职责: 组合各子分析结果，按阶段表 + 调整项生成每日投喂量
// 公式: 日投喂量(kg) = 尾数 × 均重(kg) × (%体重/天 ÷ 100) × 调整系数
// 降级: 无抽样数据时按放养记录估算（乘法系数，低置信度）
// 学习: 基于已采纳建议之后的实际生长表现修正投喂率/投喂量
// ==========================================

use crate::config::EngineConfig;
use crate::domain::advice::{AdjustmentBreakdown, FallbackFactors, FeedingAdjustments, FeedingAdvice, LearningAdjustment};
use crate::domain::events::SamplingEvent;
use crate::domain::types::{
    Confidence, DataSource, DiseaseSeverity, FeedingConsistency, GrowthQuality, Season,
    WaterQualityStatus,
};
use crate::engine::analysis::{
    EnvironmentAnalysis, FeedingPatternAnalysis, GrowthAnalysis, MedicalAnalysis, MortalityAnalysis,
    WaterQualityAnalysis,
};
use crate::engine::feeding_stage::{FeedingStage, FeedingStageTable};
use serde::Serialize;

/// 环境类调整合计的限幅（百分比）
pub const ENVIRONMENTAL_ADJUSTMENT_MIN: f64 = -50.0;
pub const ENVIRONMENTAL_ADJUSTMENT_MAX: f64 = 30.0;

/// 学习修正：实际增重高于/低于期望的倍数阈值
const LEARNING_OVER_PERFORM: f64 = 1.2;
const LEARNING_UNDER_PERFORM: f64 = 0.8;

/// 放养估算的体重分档（kg）
const FALLBACK_SMALL_FISH_KG: f64 = 0.01;
const FALLBACK_LARGE_FISH_KG: f64 = 0.5;

/// 基于抽样数据的建议输入
#[derive(Debug, Clone, Serialize)]
pub struct AdviceInputs {
    pub fish_count: i64,
    pub average_weight_kg: f64,
    pub water: WaterQualityAnalysis,
    pub mortality: MortalityAnalysis,
    pub feeding: FeedingPatternAnalysis,
    pub environment: EnvironmentAnalysis,
    pub growth: GrowthAnalysis,
    pub medical: MedicalAnalysis,
}

/// 放养估算输入
#[derive(Debug, Clone, Serialize)]
pub struct FallbackInputs {
    pub fish_count: i64,
    pub initial_avg_weight_kg: f64,
    pub days_since_stocking: i64,
    pub environment: EnvironmentAnalysis,
    pub medical: MedicalAnalysis,
}

/// 投喂推荐结果（未落库）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedingRecommendation {
    pub stage: FeedingStage,
    pub fish_count: i64,
    pub average_weight_kg: f64,
    pub total_biomass_kg: f64,
    pub base_rate_percent: f64,
    pub feeding_rate_percent: f64,
    pub base_feed_kg: f64,
    pub recommended_feed_kg: f64,
    pub feeding_frequency: u32,
    pub feeding_times: Vec<String>,
    pub feeding_split: Vec<u8>,
    pub adjustments: AdjustmentBreakdown,
    pub learning: Option<LearningAdjustment>,
    pub data_source: DataSource,
    pub confidence: Confidence,
}

// ==========================================
// FeedingRecommendationEngine - 投喂建议引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct FeedingRecommendationEngine {
    config: EngineConfig,
    stages: &'static FeedingStageTable,
}

impl Default for FeedingRecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedingRecommendationEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            stages: FeedingStageTable::standard(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==========================================
    // 调整项
    // ==========================================

    /// 水温调整（先判 >35 再判 >30）
    pub fn temperature_adjustment(water_temp_c: Option<f64>) -> f64 {
        match water_temp_c {
            None => 0.0,
            Some(t) if t > 35.0 => -40.0,
            Some(t) if t > 30.0 => -20.0,
            Some(t) if t < 15.0 => -50.0,
            Some(t) if t < 20.0 => -20.0,
            Some(t) if t < 26.0 => -10.0,
            Some(_) => 0.0,
        }
    }

    pub fn medical_adjustment(severity: DiseaseSeverity) -> f64 {
        match severity {
            DiseaseSeverity::High => -50.0,
            DiseaseSeverity::Medium => -30.0,
            DiseaseSeverity::Low => -10.0,
            DiseaseSeverity::None => 0.0,
        }
    }

    /// 计算加法型调整项
    ///
    /// 环境类合计限制在 [-50, +30]；病害调整单独叠加，不参与该限幅。
    pub fn calculate_adjustments(&self, inputs: &AdviceInputs) -> FeedingAdjustments {
        let water_quality = match inputs.water.status {
            WaterQualityStatus::Poor => -20.0,
            WaterQualityStatus::Excellent => 5.0,
            _ => 0.0,
        };

        let temperature = Self::temperature_adjustment(inputs.environment.water_temp_c);

        let mut mortality = 0.0;
        if inputs.mortality.high_mortality_rate {
            mortality -= 20.0;
        }
        if inputs.mortality.disease_present {
            mortality -= 30.0;
        }

        let growth = match inputs.growth.quality {
            GrowthQuality::Excellent => 10.0,
            GrowthQuality::Poor => -10.0,
            _ => 0.0,
        };

        let seasonal = match inputs.environment.season {
            Season::Winter => -40.0,
            Season::Summer => 10.0,
            _ => 0.0,
        };

        let feeding_consistency = match inputs.feeding.consistency {
            FeedingConsistency::Inconsistent => -10.0,
            _ => 0.0,
        };

        let environmental_total = (water_quality + temperature + mortality + growth + seasonal + feeding_consistency)
            .clamp(ENVIRONMENTAL_ADJUSTMENT_MIN, ENVIRONMENTAL_ADJUSTMENT_MAX);
        let medical = Self::medical_adjustment(inputs.medical.severity);

        FeedingAdjustments {
            water_quality,
            temperature,
            mortality,
            growth,
            seasonal,
            feeding_consistency,
            environmental_total,
            medical,
            total: environmental_total + medical,
        }
    }

    // ==========================================
    // 推荐计算
    // ==========================================

    /// 基于抽样数据的投喂推荐
    pub fn recommend(&self, inputs: &AdviceInputs) -> FeedingRecommendation {
        let average_weight_g = inputs.average_weight_kg * 1000.0;
        let stage = self.stages.lookup(average_weight_g).clone();

        let total_biomass_kg = inputs.fish_count as f64 * inputs.average_weight_kg;
        let base_rate_percent = stage.percent_bw_per_day;
        let base_feed_kg = total_biomass_kg * base_rate_percent / 100.0;

        let adjustments = self.calculate_adjustments(inputs);
        let factor = adjustments.factor();

        let confidence = if inputs.water.status != WaterQualityStatus::Unknown
            && inputs.growth.quality != GrowthQuality::Unknown
        {
            Confidence::High
        } else {
            Confidence::Medium
        };

        FeedingRecommendation {
            fish_count: inputs.fish_count,
            average_weight_kg: inputs.average_weight_kg,
            total_biomass_kg,
            base_rate_percent,
            feeding_rate_percent: base_rate_percent * factor,
            base_feed_kg,
            recommended_feed_kg: base_feed_kg * factor,
            feeding_frequency: stage.feeding_frequency,
            feeding_times: stage.feeding_times.iter().map(|t| t.to_string()).collect(),
            feeding_split: stage.feeding_split.to_vec(),
            adjustments: AdjustmentBreakdown::Additive(adjustments),
            learning: None,
            data_source: DataSource::SamplingBased,
            confidence,
            stage,
        }
    }

    /// 放养估算推荐（无抽样数据）
    ///
    /// 均重 = 放养初始均重 + 线性日增重 × 放养天数；
    /// 基础投喂率 5% (<10g) / 2% (>500g) / 3%，只应用水温、季节、病害乘法系数。
    pub fn recommend_from_stocking(&self, inputs: &FallbackInputs) -> FeedingRecommendation {
        let days = inputs.days_since_stocking.max(0);
        let average_weight_kg = inputs.initial_avg_weight_kg + self.config.stocking_fallback_growth * days as f64;
        let total_biomass_kg = inputs.fish_count as f64 * average_weight_kg;

        let (base_rate_percent, feeding_frequency) = if average_weight_kg < FALLBACK_SMALL_FISH_KG {
            (5.0, 3)
        } else if average_weight_kg > FALLBACK_LARGE_FISH_KG {
            (2.0, 1)
        } else {
            (3.0, 2)
        };

        let factors = FallbackFactors {
            temperature: match inputs.environment.water_temp_c {
                Some(t) if t < 15.0 => 0.5,
                Some(t) if t > 30.0 => 0.8,
                _ => 1.0,
            },
            seasonal: match inputs.environment.season {
                Season::Winter => 0.6,
                Season::Summer => 1.2,
                _ => 1.0,
            },
            medical: if inputs.medical.warnings.is_empty() { 1.0 } else { 0.8 },
        };
        let feeding_rate_percent = base_rate_percent * factors.combined();

        let (feeding_times, feeding_split): (Vec<String>, Vec<u8>) = match feeding_frequency {
            3 => (vec!["8:00".into(), "12:30".into(), "17:00".into()], vec![40, 30, 30]),
            2 => (vec!["8:30".into(), "16:30".into()], vec![60, 40]),
            _ => (vec!["9:00".into()], vec![100]),
        };

        FeedingRecommendation {
            stage: self.stages.lookup(average_weight_kg * 1000.0).clone(),
            fish_count: inputs.fish_count,
            average_weight_kg,
            total_biomass_kg,
            base_rate_percent,
            feeding_rate_percent,
            base_feed_kg: total_biomass_kg * base_rate_percent / 100.0,
            recommended_feed_kg: total_biomass_kg * feeding_rate_percent / 100.0,
            feeding_frequency,
            feeding_times,
            feeding_split,
            adjustments: AdjustmentBreakdown::Multiplicative(factors),
            learning: None,
            data_source: DataSource::StockingBased,
            confidence: Confidence::Low,
        }
    }

    // ==========================================
    // 学习修正
    // ==========================================

    /// 根据已采纳建议之后的实际增重计算修正系数
    ///
    /// # 参数
    /// - applied: 已采纳建议（任意顺序，内部按采纳时间倒序取前 N 条）
    /// - samplings: 同范围抽样记录
    ///
    /// # 返回
    /// - None: 没有任何一条建议之后有足够的抽样（≥2次）
    pub fn learning_adjustment(
        &self,
        applied: &[FeedingAdvice],
        samplings: &[SamplingEvent],
    ) -> Option<LearningAdjustment> {
        let mut advices: Vec<&FeedingAdvice> = applied.iter().filter(|a| a.is_applied).collect();
        advices.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        advices.truncate(self.config.learning_advice_limit);

        let baseline = self.config.expected_growth_baseline;
        let mut factors: Vec<(f64, f64)> = Vec::new();

        for advice in advices {
            let Some(applied_at) = advice.applied_at else {
                continue;
            };
            let applied_on = applied_at.date();

            let mut after: Vec<&SamplingEvent> = samplings.iter().filter(|s| s.date > applied_on).collect();
            after.sort_by_key(|s| (s.date, s.sampling_id));
            after.truncate(self.config.learning_sampling_limit);

            let (Some(first), Some(last)) = (after.first(), after.last()) else {
                continue;
            };
            let days = (last.date - first.date).num_days();
            if after.len() < 2 || days <= 0 {
                continue;
            }

            let actual_rate = (last.average_weight_kg - first.average_weight_kg) / days as f64;
            let pair = if actual_rate >= baseline * LEARNING_OVER_PERFORM {
                (1.1, 1.05)
            } else if actual_rate < baseline * LEARNING_UNDER_PERFORM {
                (0.9, 0.95)
            } else {
                (1.0, 1.0)
            };
            factors.push(pair);
        }

        if factors.is_empty() {
            return None;
        }

        let n = factors.len() as f64;
        Some(LearningAdjustment {
            advice_count: factors.len(),
            rate_factor: factors.iter().map(|f| f.0).sum::<f64>() / n,
            feed_factor: factors.iter().map(|f| f.1).sum::<f64>() / n,
        })
    }

    /// 应用学习修正
    pub fn apply_learning(&self, mut rec: FeedingRecommendation, learning: LearningAdjustment) -> FeedingRecommendation {
        rec.feeding_rate_percent *= learning.rate_factor;
        rec.recommended_feed_kg *= learning.feed_factor;
        rec.learning = Some(learning);
        rec
    }

    // ==========================================
    // 说明文本
    // ==========================================

    /// 生成建议说明
    pub fn compose_notes(
        &self,
        rec: &FeedingRecommendation,
        water: Option<&WaterQualityAnalysis>,
        medical: &MedicalAnalysis,
    ) -> String {
        let mut lines = vec![
            format!("投喂阶段: {}", rec.stage.name),
            format!(
                "均重: {:.1} g，存塘尾数: {}，生物量: {:.2} kg",
                rec.average_weight_kg * 1000.0,
                rec.fish_count,
                rec.total_biomass_kg
            ),
            format!(
                "饲料: 蛋白 {}%，粒径 {}",
                rec.stage.protein_percent, rec.stage.pellet_size
            ),
            format!(
                "投喂率: 基础 {:.2}% → 调整后 {:.2}%",
                rec.base_rate_percent, rec.feeding_rate_percent
            ),
            format!(
                "日投喂量: 基础 {:.2} kg → 建议 {:.2} kg",
                rec.base_feed_kg, rec.recommended_feed_kg
            ),
            format!(
                "每日 {} 次: {}",
                rec.feeding_frequency,
                rec.feeding_times.join(" / ")
            ),
        ];

        match &rec.adjustments {
            AdjustmentBreakdown::Additive(adj) => lines.push(format!(
                "调整: 水质 {:+.0}% 水温 {:+.0}% 死亡 {:+.0}% 生长 {:+.0}% 季节 {:+.0}% 投喂一致性 {:+.0}% (环境合计 {:+.0}%) 病害 {:+.0}%",
                adj.water_quality,
                adj.temperature,
                adj.mortality,
                adj.growth,
                adj.seasonal,
                adj.feeding_consistency,
                adj.environmental_total,
                adj.medical
            )),
            AdjustmentBreakdown::Multiplicative(f) => {
                lines.push("无抽样数据，按放养记录估算，置信度低".to_string());
                lines.push(format!(
                    "系数: 水温 ×{:.2} 季节 ×{:.2} 病害 ×{:.2}",
                    f.temperature, f.seasonal, f.medical
                ));
            }
        }

        if let Some(learning) = &rec.learning {
            lines.push(format!(
                "历史采纳修正({}条): 投喂率 ×{:.3}，投喂量 ×{:.3}",
                learning.advice_count, learning.rate_factor, learning.feed_factor
            ));
        }

        if let Some(water) = water {
            lines.push(format!("水质: {:?} (评分 {}/100)", water.status, water.score));
            lines.extend(water.issues.iter().cloned());
        }

        if medical.active_diseases.is_empty() {
            lines.push("近期无病害诊断".to_string());
        } else {
            lines.extend(medical.warnings.iter().cloned());
            lines.extend(medical.feed_changes.iter().cloned());
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{FeedingConsistency, TemperatureTrend};
    use chrono::NaiveDate;

    fn water(status: WaterQualityStatus, temp: Option<f64>) -> WaterQualityAnalysis {
        WaterQualityAnalysis {
            status,
            score: 0,
            reading_date: None,
            source: None,
            temperature_c: temp,
            ph: None,
            dissolved_oxygen: None,
            ammonia: None,
            issues: Vec::new(),
        }
    }

    fn inputs(season: Season, temp: Option<f64>) -> AdviceInputs {
        AdviceInputs {
            fish_count: 1000,
            average_weight_kg: 0.02,
            water: water(WaterQualityStatus::Good, temp),
            mortality: MortalityAnalysis {
                total_recent_deaths: 0,
                event_count: 0,
                avg_deaths_per_event: 0.0,
                causes: Vec::new(),
                high_mortality_rate: false,
                frequent_events: false,
                disease_present: false,
            },
            feeding: FeedingPatternAnalysis {
                total_feed_kg: 0.0,
                avg_daily_feed_kg: 0.0,
                feeding_days: 0,
                daily_std_dev_kg: None,
                consistency: FeedingConsistency::Unknown,
            },
            environment: EnvironmentAnalysis {
                season,
                water_temp_c: temp,
                temperature_trend: TemperatureTrend::Unknown,
            },
            growth: GrowthAnalysis {
                sampling_count: 0,
                weight_gain_kg: None,
                growth_rate_kg_per_day: None,
                quality: GrowthQuality::Unknown,
            },
            medical: MedicalAnalysis {
                active_diseases: Vec::new(),
                severity: DiseaseSeverity::None,
                warnings: Vec::new(),
                feed_changes: Vec::new(),
            },
        }
    }

    #[test]
    fn test_temperature_steps() {
        assert_eq!(FeedingRecommendationEngine::temperature_adjustment(Some(36.0)), -40.0);
        assert_eq!(FeedingRecommendationEngine::temperature_adjustment(Some(31.0)), -20.0);
        assert_eq!(FeedingRecommendationEngine::temperature_adjustment(Some(14.0)), -50.0);
        assert_eq!(FeedingRecommendationEngine::temperature_adjustment(Some(18.0)), -20.0);
        assert_eq!(FeedingRecommendationEngine::temperature_adjustment(Some(24.0)), -10.0);
        assert_eq!(FeedingRecommendationEngine::temperature_adjustment(Some(28.0)), 0.0);
        assert_eq!(FeedingRecommendationEngine::temperature_adjustment(None), 0.0);
    }

    #[test]
    fn test_environmental_clamp_excludes_medical() {
        let engine = FeedingRecommendationEngine::new();
        let mut inp = inputs(Season::Winter, Some(10.0));
        inp.water.status = WaterQualityStatus::Poor;
        inp.mortality.high_mortality_rate = true;
        inp.mortality.disease_present = true;
        inp.medical.severity = DiseaseSeverity::Medium;

        let adj = engine.calculate_adjustments(&inp);
        assert_eq!(adj.mortality, -50.0);
        assert_eq!(adj.environmental_total, -50.0);
        assert_eq!(adj.medical, -30.0);
        assert_eq!(adj.total, -80.0);
        assert!((adj.factor() - 0.2).abs() < 1e-12);

        let mut best = inputs(Season::Summer, Some(28.0));
        best.water.status = WaterQualityStatus::Excellent;
        best.growth.quality = GrowthQuality::Excellent;
        let adj = engine.calculate_adjustments(&best);
        assert_eq!(adj.environmental_total, 25.0);
    }

    #[test]
    fn test_recommend_uses_stage_table() {
        let engine = FeedingRecommendationEngine::new();
        let rec = engine.recommend(&inputs(Season::Autumn, Some(28.0)));
        assert!(rec.stage.contains(20.0));
        assert!((rec.total_biomass_kg - 20.0).abs() < 1e-9);
        assert!((rec.base_feed_kg - 20.0 * rec.base_rate_percent / 100.0).abs() < 1e-9);
        assert!((rec.recommended_feed_kg - rec.base_feed_kg).abs() < 1e-9);
        assert_eq!(rec.data_source, DataSource::SamplingBased);
        assert_eq!(rec.confidence, Confidence::Medium);
    }

    #[test]
    fn test_stocking_fallback() {
        let engine = FeedingRecommendationEngine::new();
        let fallback = FallbackInputs {
            fish_count: 1000,
            initial_avg_weight_kg: 0.005,
            days_since_stocking: 20,
            environment: EnvironmentAnalysis {
                season: Season::Winter,
                water_temp_c: Some(12.0),
                temperature_trend: TemperatureTrend::Unknown,
            },
            medical: MedicalAnalysis {
                active_diseases: Vec::new(),
                severity: DiseaseSeverity::None,
                warnings: Vec::new(),
                feed_changes: Vec::new(),
            },
        };
        let rec = engine.recommend_from_stocking(&fallback);
        // 0.005 + 0.0001 × 20 = 0.007 kg < 10 g
        assert!((rec.average_weight_kg - 0.007).abs() < 1e-12);
        assert_eq!(rec.base_rate_percent, 5.0);
        assert_eq!(rec.feeding_frequency, 3);
        assert!((rec.feeding_rate_percent - 5.0 * 0.5 * 0.6).abs() < 1e-12);
        assert_eq!(rec.data_source, DataSource::StockingBased);
        assert_eq!(rec.confidence, Confidence::Low);
    }

    fn applied_advice(applied_on: NaiveDate) -> FeedingAdvice {
        let engine = FeedingRecommendationEngine::new();
        let rec = engine.recommend(&inputs(Season::Autumn, None));
        FeedingAdvice {
            advice_id: uuid::Uuid::new_v4().to_string(),
            pond_id: 1,
            species_id: Some(1),
            date: applied_on,
            estimated_fish_count: rec.fish_count,
            average_fish_weight_kg: rec.average_weight_kg,
            total_biomass_kg: rec.total_biomass_kg,
            stage_name: rec.stage.name.clone(),
            protein_percent: rec.stage.protein_percent,
            pellet_size: rec.stage.pellet_size.to_string(),
            feeding_frequency: rec.feeding_frequency,
            feeding_times: rec.feeding_times.clone(),
            feeding_split: rec.feeding_split.clone(),
            base_rate_percent: rec.base_rate_percent,
            feeding_rate_percent: rec.feeding_rate_percent,
            base_feed_kg: rec.base_feed_kg,
            recommended_feed_kg: rec.recommended_feed_kg,
            adjustments: rec.adjustments,
            learning: None,
            water_temp_c: None,
            season: Season::Autumn,
            feed_type_id: None,
            feed_cost_per_kg: None,
            daily_feed_cost: None,
            data_source: rec.data_source,
            confidence: rec.confidence,
            medical_warnings: Vec::new(),
            analysis: serde_json::Value::Null,
            notes: String::new(),
            is_applied: true,
            applied_at: applied_on.and_hms_opt(9, 0, 0),
            created_at: applied_on.and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_learning_adjustment() {
        let engine = FeedingRecommendationEngine::new();
        let d = |n: i64| NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Duration::days(n);

        // 采纳后 10 天内 0.1 → 0.3 kg，日增重 0.02 ≥ 1.2 × 0.015
        let samplings = vec![
            SamplingEvent::new(1, Some(1), d(1), 10, 1.0).unwrap(),
            SamplingEvent::new(1, Some(1), d(11), 10, 3.0).unwrap(),
        ];
        let learning = engine
            .learning_adjustment(&[applied_advice(d(0))], &samplings)
            .unwrap();
        assert_eq!(learning.advice_count, 1);
        assert!((learning.rate_factor - 1.1).abs() < 1e-12);
        assert!((learning.feed_factor - 1.05).abs() < 1e-12);

        // 采纳后只有一次抽样 → 无修正
        assert!(engine
            .learning_adjustment(&[applied_advice(d(5))], &samplings)
            .is_none());
    }

    #[test]
    fn test_learning_under_and_neutral_bands() {
        let engine = FeedingRecommendationEngine::new();
        let d = |n: i64| NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Duration::days(n);

        // 0.1 → 0.105 kg / 10 天，日增重 0.0005 < 0.8 × 0.015
        let slow = vec![
            SamplingEvent::new(1, Some(1), d(1), 10, 1.0).unwrap(),
            SamplingEvent::new(1, Some(1), d(11), 10, 1.05).unwrap(),
        ];
        let learning = engine
            .learning_adjustment(&[applied_advice(d(0))], &slow)
            .unwrap();
        assert!((learning.rate_factor - 0.9).abs() < 1e-12);
        assert!((learning.feed_factor - 0.95).abs() < 1e-12);

        // 0.1 → 0.25 kg / 10 天，日增重 0.015 落在期望区间内
        let on_track = vec![
            SamplingEvent::new(1, Some(1), d(1), 10, 1.0).unwrap(),
            SamplingEvent::new(1, Some(1), d(11), 10, 2.5).unwrap(),
        ];
        let learning = engine
            .learning_adjustment(&[applied_advice(d(0))], &on_track)
            .unwrap();
        assert_eq!(learning.rate_factor, 1.0);
        assert_eq!(learning.feed_factor, 1.0);
    }

    fn mixed_history() -> Vec<SamplingEvent> {
        let d = |n: i64| NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Duration::days(n);
        vec![
            SamplingEvent::new(1, Some(1), d(1), 10, 1.0).unwrap(),
            SamplingEvent::new(1, Some(1), d(6), 10, 2.0).unwrap(),
            SamplingEvent::new(1, Some(1), d(11), 10, 3.0).unwrap(),
            SamplingEvent::new(1, Some(1), d(21), 10, 3.1).unwrap(),
            SamplingEvent::new(1, Some(1), d(31), 10, 3.15).unwrap(),
        ]
    }

    #[test]
    fn test_learning_averages_across_advices() {
        let engine = FeedingRecommendationEngine::new();
        let d = |n: i64| NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Duration::days(n);
        let samplings = mixed_history();

        // d0 采纳: 取其后前 3 次抽样 (0.1 → 0.3)，偏快
        // d15 / d17 采纳: 其后 0.31 → 0.315，偏慢
        let advices = vec![applied_advice(d(0)), applied_advice(d(15)), applied_advice(d(17))];
        let learning = engine.learning_adjustment(&advices, &samplings).unwrap();

        assert_eq!(learning.advice_count, 3);
        assert!((learning.rate_factor - (1.1 + 0.9 + 0.9) / 3.0).abs() < 1e-12);
        assert!((learning.feed_factor - (1.05 + 0.95 + 0.95) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_learning_uses_five_most_recent_advices() {
        let engine = FeedingRecommendationEngine::new();
        let d = |n: i64| NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Duration::days(n);
        let samplings = mixed_history();

        // 最早的偏快建议超出最近 5 条，不参与平均
        let mut advices = vec![applied_advice(d(0))];
        advices.extend((15..20).map(|n| applied_advice(d(n))));
        let learning = engine.learning_adjustment(&advices, &samplings).unwrap();

        assert_eq!(learning.advice_count, 5);
        assert!((learning.rate_factor - 0.9).abs() < 1e-12);
        assert!((learning.feed_factor - 0.95).abs() < 1e-12);

        // 未采纳的建议不计入
        let mut pending = applied_advice(d(19));
        pending.is_applied = false;
        let learning = engine
            .learning_adjustment(&[applied_advice(d(0)), pending], &samplings)
            .unwrap();
        assert_eq!(learning.advice_count, 1);
        assert!((learning.rate_factor - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_apply_learning() {
        let engine = FeedingRecommendationEngine::new();
        let rec = engine.recommend(&inputs(Season::Autumn, Some(28.0)));
        let adjusted = engine.apply_learning(
            rec.clone(),
            LearningAdjustment {
                advice_count: 2,
                rate_factor: 0.9,
                feed_factor: 0.95,
            },
        );
        assert!((adjusted.feeding_rate_percent - rec.feeding_rate_percent * 0.9).abs() < 1e-12);
        assert!((adjusted.recommended_feed_kg - rec.recommended_feed_kg * 0.95).abs() < 1e-12);
        assert!(engine
            .compose_notes(&adjusted, Some(&rec_water()), &inputs(Season::Autumn, None).medical)
            .contains("历史采纳修正"));
    }

    fn rec_water() -> WaterQualityAnalysis {
        water(WaterQualityStatus::Good, Some(28.0))
    }
}
