// ==========================================
// 鱼塘养殖管理系统 - 存活估算 API
// ==========================================
// 职责: 累计放养/死亡/捕捞汇总 → 存活快照（落库 + 事件）
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::validator::{load_engine_config, PondAccessValidator};
use crate::config::ConfigManager;
use crate::domain::survival::{PopulationTotals, SurvivalSnapshot};
use crate::domain::types::DateRange;
use crate::engine::events::{MetricsEvent, MetricsEventType, OptionalEventPublisher};
use crate::engine::population::PopulationEstimator;
use crate::perf::PerfGuard;
use crate::repository::{
    HarvestRepository, MortalityRepository, PondRepository, RepositoryResult, SamplingRepository,
    StockingRepository, SurvivalSnapshotRepository,
};

// ==========================================
// PopulationReader - 累计量读取
// ==========================================

/// 按范围汇总放养/死亡/捕捞累计量（供存活、投喂、预测共用）
#[derive(Clone)]
pub struct PopulationReader {
    stocking_repo: Arc<StockingRepository>,
    mortality_repo: Arc<MortalityRepository>,
    harvest_repo: Arc<HarvestRepository>,
}

impl PopulationReader {
    pub fn new(
        stocking_repo: Arc<StockingRepository>,
        mortality_repo: Arc<MortalityRepository>,
        harvest_repo: Arc<HarvestRepository>,
    ) -> Self {
        Self {
            stocking_repo,
            mortality_repo,
            harvest_repo,
        }
    }

    pub fn totals(&self, pond_id: i64, species_id: Option<i64>, range: DateRange) -> RepositoryResult<PopulationTotals> {
        Ok(PopulationTotals {
            total_stocked: self.stocking_repo.sum_pcs(pond_id, species_id, range)?,
            total_mortality: self.mortality_repo.sum_count(pond_id, species_id, range)?,
            total_harvested: self.harvest_repo.sum_count(pond_id, species_id, range)?,
            mortality_weight_kg: self.mortality_repo.sum_weight(pond_id, species_id, range)?,
            harvested_weight_kg: self.harvest_repo.sum_weight(pond_id, species_id, range)?,
        })
    }

    /// 窗口内死亡尾数
    pub fn recent_deaths(&self, pond_id: i64, species_id: Option<i64>, as_of: NaiveDate, days: i64) -> RepositoryResult<i64> {
        self.mortality_repo
            .sum_count(pond_id, species_id, DateRange::trailing_days(as_of, days))
    }
}

// ==========================================
// PopulationApi - 存活估算 API
// ==========================================
pub struct PopulationApi {
    reader: PopulationReader,
    stocking_repo: Arc<StockingRepository>,
    sampling_repo: Arc<SamplingRepository>,
    survival_repo: Arc<SurvivalSnapshotRepository>,
    config_manager: Arc<ConfigManager>,
    estimator: PopulationEstimator,
    publisher: OptionalEventPublisher,
    access: PondAccessValidator,
}

impl PopulationApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pond_repo: Arc<PondRepository>,
        reader: PopulationReader,
        stocking_repo: Arc<StockingRepository>,
        sampling_repo: Arc<SamplingRepository>,
        survival_repo: Arc<SurvivalSnapshotRepository>,
        config_manager: Arc<ConfigManager>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            reader,
            stocking_repo,
            sampling_repo,
            survival_repo,
            config_manager,
            estimator: PopulationEstimator::new(),
            publisher,
            access: PondAccessValidator::new(pond_repo),
        }
    }

    /// 计算存活快照（不落库）
    pub fn compute_snapshot(&self, pond_id: i64, species_id: Option<i64>, as_of: NaiveDate) -> ApiResult<SurvivalSnapshot> {
        let config = load_engine_config(&self.config_manager)?;
        let totals = self.reader.totals(pond_id, species_id, DateRange::up_to(as_of))?;

        let average_weight_kg = match self.sampling_repo.latest(pond_id, species_id, Some(as_of))? {
            Some(sampling) => Some(sampling.average_weight_kg),
            None => self
                .stocking_repo
                .latest(pond_id, species_id, Some(as_of))?
                .map(|s| s.initial_avg_weight_kg),
        };

        let recent_deaths = self
            .reader
            .recent_deaths(pond_id, species_id, as_of, config.analysis_window_days)?;
        let trend = self
            .estimator
            .mortality_trend(recent_deaths, config.analysis_window_days, totals.total_stocked);

        Ok(self.estimator.estimate(
            pond_id,
            species_id,
            as_of,
            &totals,
            average_weight_kg,
            trend,
            chrono::Local::now().naive_local(),
        )?)
    }

    /// 存活估算（落库，同日同范围快照覆盖）
    ///
    /// # 参数
    /// - species_id: None 表示整塘
    /// - as_of: 截止日期（含）
    ///
    /// # 返回
    /// - Err(MissingBaselineData): 截止日前无放养
    pub fn estimate_population(
        &self,
        operator: &str,
        pond_id: i64,
        species_id: Option<i64>,
        as_of: NaiveDate,
    ) -> ApiResult<SurvivalSnapshot> {
        let _perf = PerfGuard::new("estimate_population");
        self.access.ensure_owned(operator, pond_id)?;

        let snapshot = self.compute_snapshot(pond_id, species_id, as_of)?;
        self.survival_repo.replace(&snapshot)?;

        info!(
            pond_id,
            species_id = ?species_id,
            current_alive = snapshot.current_alive,
            survival_rate = snapshot.survival_rate_percent,
            "存活快照已更新"
        );
        self.publisher.publish_or_warn(MetricsEvent::from_date(
            pond_id,
            species_id,
            MetricsEventType::SurvivalRecalculated,
            Some("PopulationApi".to_string()),
            as_of,
            1,
        ));
        Ok(snapshot)
    }

    pub fn list_snapshots(&self, operator: &str, pond_id: i64) -> ApiResult<Vec<SurvivalSnapshot>> {
        self.access.ensure_owned(operator, pond_id)?;
        Ok(self.survival_repo.list_by_pond(pond_id)?)
    }
}
