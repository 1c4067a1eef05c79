// ==========================================
// 鱼塘养殖管理系统 - 投喂建议 API
// ==========================================
// 职责: 汇集存塘/水质/死亡/投喂/环境/生长/病害子分析，生成并保存每日投喂建议
// 降级: 无抽样时按放养记录估算（低置信度）
// 采纳: 只允许修改采纳状态，其余字段写入后不可变
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::population_api::PopulationReader;
use crate::api::validator::{load_engine_config, PondAccessValidator};
use crate::config::ConfigManager;
use crate::domain::advice::FeedingAdvice;
use crate::domain::types::{DataSource, DateRange, WaterQualityStatus};
use crate::engine::analysis::{
    analyze_environment, analyze_feed_history, analyze_feeding_pattern, analyze_growth,
    analyze_medical, analyze_mortality, analyze_water_quality, EnvironmentAnalysis,
    FeedHistoryAnalysis, FeedingPatternAnalysis, GrowthAnalysis, MedicalAnalysis,
    MortalityAnalysis, WaterQualityAnalysis,
};
use crate::engine::error::EngineError;
use crate::engine::events::{MetricsEvent, MetricsEventType, OptionalEventPublisher};
use crate::engine::feeding::{AdviceInputs, FallbackInputs, FeedingRecommendationEngine};
use crate::perf::PerfGuard;
use crate::repository::{
    FeedRepository, FeedingAdviceRepository, MedicalDiagnosticRepository, MortalityRepository,
    PondRepository, SamplingRepository, StockingRepository, WaterQualityRepository,
};

/// 建议附带的子分析结果
#[derive(Debug, Clone, Serialize)]
struct AnalysisBundle<'a> {
    water_quality: &'a WaterQualityAnalysis,
    mortality: &'a MortalityAnalysis,
    feeding_pattern: &'a FeedingPatternAnalysis,
    environment: &'a EnvironmentAnalysis,
    growth: &'a GrowthAnalysis,
    medical: &'a MedicalAnalysis,
    feed_history: &'a FeedHistoryAnalysis,
}

/// 批量生成结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoAdviceReport {
    pub advices: Vec<FeedingAdvice>,
    /// 按放养记录估算的品种
    pub stocking_based_species: Vec<i64>,
    /// 跳过的品种及原因（无存活鱼等）
    pub skipped: Vec<SkippedSpecies>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSpecies {
    pub species_id: i64,
    pub reason: String,
}

// ==========================================
// FeedingApi - 投喂建议 API
// ==========================================
pub struct FeedingApi {
    reader: PopulationReader,
    stocking_repo: Arc<StockingRepository>,
    sampling_repo: Arc<SamplingRepository>,
    mortality_repo: Arc<MortalityRepository>,
    feed_repo: Arc<FeedRepository>,
    water_repo: Arc<WaterQualityRepository>,
    medical_repo: Arc<MedicalDiagnosticRepository>,
    advice_repo: Arc<FeedingAdviceRepository>,
    config_manager: Arc<ConfigManager>,
    publisher: OptionalEventPublisher,
    access: PondAccessValidator,
}

impl FeedingApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pond_repo: Arc<PondRepository>,
        reader: PopulationReader,
        stocking_repo: Arc<StockingRepository>,
        sampling_repo: Arc<SamplingRepository>,
        mortality_repo: Arc<MortalityRepository>,
        feed_repo: Arc<FeedRepository>,
        water_repo: Arc<WaterQualityRepository>,
        medical_repo: Arc<MedicalDiagnosticRepository>,
        advice_repo: Arc<FeedingAdviceRepository>,
        config_manager: Arc<ConfigManager>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            reader,
            stocking_repo,
            sampling_repo,
            mortality_repo,
            feed_repo,
            water_repo,
            medical_repo,
            advice_repo,
            config_manager,
            publisher,
            access: PondAccessValidator::new(pond_repo),
        }
    }

    /// 生成投喂建议
    ///
    /// # 参数
    /// - species_id: None 时取池塘最近一次放养的品种
    /// - as_of: 建议日期
    ///
    /// # 返回
    /// - Err(MissingBaselineData): 无放养记录
    /// - Err(BusinessRuleViolation): 已无存活鱼
    pub fn generate_feeding_advice(
        &self,
        operator: &str,
        pond_id: i64,
        species_id: Option<i64>,
        as_of: NaiveDate,
    ) -> ApiResult<FeedingAdvice> {
        let _perf = PerfGuard::new("generate_feeding_advice");
        self.access.ensure_owned(operator, pond_id)?;
        self.generate(pond_id, species_id, as_of)
    }

    /// 为池塘内每个放养品种生成建议
    pub fn auto_generate_advice(&self, operator: &str, pond_id: i64, as_of: NaiveDate) -> ApiResult<AutoAdviceReport> {
        let _perf = PerfGuard::new("auto_generate_advice");
        self.access.ensure_owned(operator, pond_id)?;

        let mut report = AutoAdviceReport::default();
        for species_id in self.stocking_repo.list_species_ids(pond_id)? {
            match self.generate(pond_id, Some(species_id), as_of) {
                Ok(advice) => {
                    if advice.data_source == DataSource::StockingBased {
                        report.stocking_based_species.push(species_id);
                    }
                    report.advices.push(advice);
                }
                Err(ApiError::MissingBaselineData(reason)) | Err(ApiError::BusinessRuleViolation(reason)) => {
                    report.skipped.push(SkippedSpecies { species_id, reason });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            pond_id,
            generated = report.advices.len(),
            stocking_based = report.stocking_based_species.len(),
            skipped = report.skipped.len(),
            "批量投喂建议生成完成"
        );
        Ok(report)
    }

    /// 采纳建议（重复采纳保持首次采纳时间）
    pub fn apply_advice(&self, operator: &str, advice_id: &str) -> ApiResult<FeedingAdvice> {
        if advice_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("建议ID不能为空".to_string()));
        }
        let advice = self
            .advice_repo
            .find_by_id(advice_id)?
            .ok_or_else(|| ApiError::NotFound(format!("投喂建议(id={})不存在", advice_id)))?;
        self.access.ensure_owned(operator, advice.pond_id)?;

        if advice.is_applied {
            return Ok(advice);
        }

        let applied_at = chrono::Local::now().naive_local();
        self.advice_repo.mark_applied(advice_id, applied_at)?;
        info!(advice_id, pond_id = advice.pond_id, "投喂建议已采纳");

        Ok(FeedingAdvice {
            is_applied: true,
            applied_at: Some(applied_at),
            ..advice
        })
    }

    pub fn list_advice(&self, operator: &str, pond_id: i64) -> ApiResult<Vec<FeedingAdvice>> {
        self.access.ensure_owned(operator, pond_id)?;
        Ok(self.advice_repo.list_by_pond(pond_id)?)
    }

    // ==========================================
    // 生成流程
    // ==========================================

    #[instrument(skip(self))]
    fn generate(&self, pond_id: i64, species_id: Option<i64>, as_of: NaiveDate) -> ApiResult<FeedingAdvice> {
        let config = load_engine_config(&self.config_manager)?;
        let engine = FeedingRecommendationEngine::with_config(config.clone());

        // 1. 放养基线与品种
        let stocking = self
            .stocking_repo
            .latest(pond_id, species_id, Some(as_of))?
            .ok_or(EngineError::MissingBaselineData { pond_id, species_id })?;
        let species_id = stocking.species_id;
        let scope = Some(species_id);

        // 2. 存塘尾数
        let totals = self.reader.totals(pond_id, scope, DateRange::up_to(as_of))?;
        let fish_count = totals.current_alive();
        if fish_count <= 0 {
            return Err(EngineError::NoLiveFish { pond_id, species_id: scope }.into());
        }

        // 3. 子分析
        let window = DateRange::trailing_days(as_of, config.analysis_window_days.max(config.daily_log_window_days));
        let readings = self.water_repo.list(pond_id, window)?;
        let mortalities = self.mortality_repo.list(pond_id, scope, window)?;
        let feeds = self.feed_repo.list(pond_id, window)?;
        let diagnostics = self.medical_repo.list(pond_id, window)?;
        let samplings = self.sampling_repo.list(pond_id, scope, DateRange::up_to(as_of))?;

        let water = analyze_water_quality(&readings, as_of, config.analysis_window_days, config.daily_log_window_days);
        let mortality = analyze_mortality(&mortalities, as_of, config.analysis_window_days);
        let feeding = analyze_feeding_pattern(&feeds, as_of, config.analysis_window_days);
        let environment = analyze_environment(
            &readings,
            &water,
            as_of,
            config.daily_log_window_days,
            &config.season_months,
        );
        let growth = analyze_growth(&samplings, as_of, config.growth_window_days);
        let medical = analyze_medical(&diagnostics, as_of, config.analysis_window_days);
        let feed_history = analyze_feed_history(&feeds, as_of, config.analysis_window_days);

        // 4. 推荐（抽样优先，缺失时放养估算）
        let latest_sampling = samplings.iter().max_by_key(|s| (s.date, s.sampling_id));
        let mut rec = match latest_sampling {
            Some(sampling) => engine.recommend(&AdviceInputs {
                fish_count,
                average_weight_kg: sampling.average_weight_kg,
                water: water.clone(),
                mortality: mortality.clone(),
                feeding: feeding.clone(),
                environment: environment.clone(),
                growth: growth.clone(),
                medical: medical.clone(),
            }),
            None => {
                tracing::warn!(pond_id, species_id, "无抽样数据，按放养记录估算投喂量");
                engine.recommend_from_stocking(&FallbackInputs {
                    fish_count,
                    initial_avg_weight_kg: stocking.initial_avg_weight_kg,
                    days_since_stocking: (as_of - stocking.date).num_days(),
                    environment: environment.clone(),
                    medical: medical.clone(),
                })
            }
        };

        // 5. 历史采纳修正
        let applied = self
            .advice_repo
            .list_recent_applied(pond_id, scope, config.learning_advice_limit)?;
        if let Some(learning) = engine.learning_adjustment(&applied, &samplings) {
            rec = engine.apply_learning(rec, learning);
        }

        // 6. 成本与说明
        let daily_feed_cost = feed_history.avg_cost_per_kg.map(|c| rec.recommended_feed_kg * c);
        let analysis = serde_json::to_value(AnalysisBundle {
            water_quality: &water,
            mortality: &mortality,
            feeding_pattern: &feeding,
            environment: &environment,
            growth: &growth,
            medical: &medical,
            feed_history: &feed_history,
        })
        .map_err(|e| ApiError::InternalError(format!("分析结果序列化失败: {}", e)))?;
        let water_ref = (water.status != WaterQualityStatus::Unknown).then_some(&water);
        let notes = engine.compose_notes(&rec, water_ref, &medical);

        let advice = FeedingAdvice {
            advice_id: uuid::Uuid::new_v4().to_string(),
            pond_id,
            species_id: scope,
            date: as_of,
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
            adjustments: rec.adjustments.clone(),
            learning: rec.learning.clone(),
            water_temp_c: environment.water_temp_c,
            season: environment.season,
            feed_type_id: feed_history.preferred_feed_type_id,
            feed_cost_per_kg: feed_history.avg_cost_per_kg,
            daily_feed_cost,
            data_source: rec.data_source,
            confidence: rec.confidence,
            medical_warnings: medical.warnings.clone(),
            analysis,
            notes,
            is_applied: false,
            applied_at: None,
            created_at: chrono::Local::now().naive_local(),
        };

        // 7. 落库与事件
        self.advice_repo.insert(&advice)?;
        info!(
            advice_id = %advice.advice_id,
            pond_id,
            species_id,
            recommended_feed_kg = advice.recommended_feed_kg,
            data_source = ?advice.data_source,
            "投喂建议已生成"
        );
        self.publisher.publish_or_warn(MetricsEvent::from_date(
            pond_id,
            scope,
            MetricsEventType::AdviceGenerated,
            Some("FeedingApi".to_string()),
            as_of,
            1,
        ));

        Ok(advice)
    }
}
