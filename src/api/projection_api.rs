// ==========================================
// 鱼塘养殖管理系统 - 生物量预测 / FCR 分析 API
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::population_api::PopulationReader;
use crate::api::validator::{load_engine_config, PondAccessValidator};
use crate::config::ConfigManager;
use crate::domain::projection::{FcrReport, ProjectionResult};
use crate::domain::types::DateRange;
use crate::engine::biomass::FcrAnalyzer;
use crate::engine::error::EngineError;
use crate::engine::projection::{BiomassProjector, ProjectionInputs};
use crate::perf::PerfGuard;
use crate::repository::{
    FeedRepository, HarvestRepository, PondRepository, SamplingRepository, StockingRepository,
};

pub struct ProjectionApi {
    reader: PopulationReader,
    stocking_repo: Arc<StockingRepository>,
    sampling_repo: Arc<SamplingRepository>,
    feed_repo: Arc<FeedRepository>,
    harvest_repo: Arc<HarvestRepository>,
    config_manager: Arc<ConfigManager>,
    access: PondAccessValidator,
}

impl ProjectionApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pond_repo: Arc<PondRepository>,
        reader: PopulationReader,
        stocking_repo: Arc<StockingRepository>,
        sampling_repo: Arc<SamplingRepository>,
        feed_repo: Arc<FeedRepository>,
        harvest_repo: Arc<HarvestRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            reader,
            stocking_repo,
            sampling_repo,
            feed_repo,
            harvest_repo,
            config_manager,
            access: PondAccessValidator::new(pond_repo),
        }
    }

    /// 预测达到目标生物量所需天数与饲料
    ///
    /// # 返回
    /// - Err(MissingBaselineData): 截止日前无该品种放养
    /// - Err(ValidationError): 目标不高于当前生物量（不返回部分结果）
    pub fn project_to_target(
        &self,
        operator: &str,
        pond_id: i64,
        species_id: i64,
        target_biomass_kg: f64,
        as_of: NaiveDate,
    ) -> ApiResult<ProjectionResult> {
        let _perf = PerfGuard::new("project_to_target");
        self.access.ensure_owned(operator, pond_id)?;
        let config = load_engine_config(&self.config_manager)?;

        let stocking = self
            .stocking_repo
            .latest(pond_id, Some(species_id), Some(as_of))?
            .ok_or(EngineError::MissingBaselineData {
                pond_id,
                species_id: Some(species_id),
            })?;
        let samplings = self
            .sampling_repo
            .list(pond_id, Some(species_id), DateRange::up_to(as_of))?;
        let feeds = self.feed_repo.list(pond_id, DateRange::up_to(as_of))?;
        let current_fish_count = self
            .reader
            .totals(pond_id, Some(species_id), DateRange::up_to(as_of))?
            .current_alive();
        let latest_priced_feed = self.feed_repo.latest_priced(pond_id)?;

        let result = BiomassProjector::with_config(config).project(&ProjectionInputs {
            pond_id,
            species_id,
            as_of,
            target_biomass_kg,
            stocking: &stocking,
            samplings: &samplings,
            feeds: &feeds,
            current_fish_count,
            latest_priced_feed: latest_priced_feed.as_ref(),
        })?;

        info!(
            pond_id,
            species_id,
            target_biomass_kg,
            estimated_days = result.estimated_days,
            confidence = ?result.confidence,
            "生物量预测完成"
        );
        Ok(result)
    }

    /// 区间 FCR 报告
    ///
    /// # 返回
    /// - Err(ValidationError): 范围内抽样不足两次
    pub fn fcr_analysis(
        &self,
        operator: &str,
        pond_id: i64,
        species_id: i64,
        range: DateRange,
    ) -> ApiResult<FcrReport> {
        let _perf = PerfGuard::new("fcr_analysis");
        self.access.ensure_owned(operator, pond_id)?;

        let samplings = self.sampling_repo.list(pond_id, Some(species_id), range)?;
        let feeds = self.feed_repo.list(pond_id, range)?;
        let totals = self.reader.totals(pond_id, Some(species_id), DateRange::all())?;
        let harvests = self.harvest_repo.list(pond_id, Some(species_id), DateRange::all())?;

        FcrAnalyzer::new()
            .analyze(pond_id, species_id, &samplings, &feeds, &totals, &harvests)
            .ok_or_else(|| ApiError::ValidationError("FCR 分析至少需要两次不同日期的抽样".to_string()))
    }
}
