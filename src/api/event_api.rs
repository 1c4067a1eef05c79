// ==========================================
// 鱼塘养殖管理系统 - 养殖事件录入 API
// ==========================================
// 职责: 池塘/品种/饲料类型维护，放养/死亡/捕捞/投喂/水质/诊断录入
// 说明: 放养/死亡/捕捞改变存塘尾数，录入后从其日期刷新生长链
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{require_operator, PondAccessValidator};
use crate::domain::category::CategoryTree;
use crate::domain::events::{
    FeedEvent, HarvestEvent, MedicalDiagnostic, MortalityEvent, StockingEvent, WaterQualityReading,
};
use crate::domain::pond::{FeedType, Pond, Species};
use crate::engine::recalc::GrowthRecalcEngine;
use crate::perf::PerfGuard;
use crate::repository::{
    FeedRepository, HarvestRepository, MedicalDiagnosticRepository, MortalityRepository,
    PondRepository, SamplingRepository, StockingRepository, WaterQualityRepository,
};

// ==========================================
// EventApi - 事件录入 API
// ==========================================
pub struct EventApi {
    pond_repo: Arc<PondRepository>,
    stocking_repo: Arc<StockingRepository>,
    sampling_repo: Arc<SamplingRepository>,
    mortality_repo: Arc<MortalityRepository>,
    harvest_repo: Arc<HarvestRepository>,
    feed_repo: Arc<FeedRepository>,
    water_repo: Arc<WaterQualityRepository>,
    medical_repo: Arc<MedicalDiagnosticRepository>,
    recalc: Arc<GrowthRecalcEngine>,
    access: PondAccessValidator,
}

impl EventApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pond_repo: Arc<PondRepository>,
        stocking_repo: Arc<StockingRepository>,
        sampling_repo: Arc<SamplingRepository>,
        mortality_repo: Arc<MortalityRepository>,
        harvest_repo: Arc<HarvestRepository>,
        feed_repo: Arc<FeedRepository>,
        water_repo: Arc<WaterQualityRepository>,
        medical_repo: Arc<MedicalDiagnosticRepository>,
        recalc: Arc<GrowthRecalcEngine>,
    ) -> Self {
        Self {
            access: PondAccessValidator::new(pond_repo.clone()),
            pond_repo,
            stocking_repo,
            sampling_repo,
            mortality_repo,
            harvest_repo,
            feed_repo,
            water_repo,
            medical_repo,
            recalc,
        }
    }

    // ==========================================
    // 池塘
    // ==========================================

    /// 新建池塘（归属操作人）
    pub fn create_pond(
        &self,
        operator: &str,
        name: &str,
        area_decimal: Option<f64>,
        depth_ft: Option<f64>,
        location: Option<&str>,
    ) -> ApiResult<Pond> {
        require_operator(operator)?;
        let mut pond = Pond::new(operator, name, area_decimal, depth_ft)?;
        pond.location = location.map(str::to_string);
        pond.pond_id = self.pond_repo.insert_pond(&pond)?;
        info!(pond_id = pond.pond_id, owner = %pond.owner, "池塘已创建");
        Ok(pond)
    }

    pub fn list_ponds(&self, operator: &str) -> ApiResult<Vec<Pond>> {
        require_operator(operator)?;
        Ok(self.pond_repo.list_ponds_by_owner(operator.trim())?)
    }

    pub fn get_pond(&self, operator: &str, pond_id: i64) -> ApiResult<Pond> {
        self.access.ensure_owned(operator, pond_id)
    }

    // ==========================================
    // 分类（品种 / 饲料类型）
    // ==========================================

    pub fn create_species(
        &self,
        name: &str,
        scientific_name: Option<&str>,
        parent_id: Option<i64>,
    ) -> ApiResult<i64> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("品种名称不能为空".to_string()));
        }
        Ok(self.pond_repo.insert_species(name.trim(), scientific_name, parent_id)?)
    }

    /// 品种分类树
    pub fn species_tree(&self) -> ApiResult<CategoryTree<Species>> {
        Ok(CategoryTree::build(self.pond_repo.list_species()?)?)
    }

    pub fn create_feed_type(
        &self,
        name: &str,
        protein_percent: Option<f64>,
        parent_id: Option<i64>,
    ) -> ApiResult<i64> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("饲料名称不能为空".to_string()));
        }
        Ok(self.pond_repo.insert_feed_type(name.trim(), protein_percent, parent_id)?)
    }

    /// 饲料类型分类树
    pub fn feed_type_tree(&self) -> ApiResult<CategoryTree<FeedType>> {
        Ok(CategoryTree::build(self.pond_repo.list_feed_types()?)?)
    }

    // ==========================================
    // 存塘变化事件
    // ==========================================

    /// 录入放养
    ///
    /// # 返回
    /// - Err(ValidationConflict): 同 (pond, species, date) 已有放养
    pub fn record_stocking(&self, operator: &str, mut stocking: StockingEvent) -> ApiResult<StockingEvent> {
        let _perf = PerfGuard::new("record_stocking");
        self.access.ensure_owned(operator, stocking.pond_id)?;

        stocking.stocking_id = self.stocking_repo.insert(&stocking)?;
        let refreshed = self.recalc.refresh_pond(stocking.pond_id)?;
        info!(
            stocking_id = stocking.stocking_id,
            pcs = stocking.pcs,
            refreshed = refreshed.len(),
            "放养已记录"
        );
        Ok(stocking)
    }

    /// 录入死亡
    ///
    /// 未给均重且指定了品种时，依次取该品种截至当日的最近抽样均重、最近放养初始均重补齐。
    pub fn record_mortality(&self, operator: &str, mut mortality: MortalityEvent) -> ApiResult<MortalityEvent> {
        let _perf = PerfGuard::new("record_mortality");
        self.access.ensure_owned(operator, mortality.pond_id)?;

        if mortality.avg_weight_kg.is_none() {
            if let Some(species_id) = mortality.species_id {
                let reference = match self
                    .sampling_repo
                    .latest(mortality.pond_id, Some(species_id), Some(mortality.date))?
                {
                    Some(sampling) => Some(sampling.average_weight_kg),
                    None => self
                        .stocking_repo
                        .latest(mortality.pond_id, Some(species_id), Some(mortality.date))?
                        .map(|s| s.initial_avg_weight_kg),
                };
                mortality.fill_average_weight(reference);
            }
        }

        mortality.mortality_id = self.mortality_repo.insert(&mortality)?;
        self.recalc.refresh_pond(mortality.pond_id)?;
        info!(
            mortality_id = mortality.mortality_id,
            count = mortality.count,
            avg_weight_kg = ?mortality.avg_weight_kg,
            "死亡已记录"
        );
        Ok(mortality)
    }

    pub fn record_harvest(&self, operator: &str, mut harvest: HarvestEvent) -> ApiResult<HarvestEvent> {
        let _perf = PerfGuard::new("record_harvest");
        self.access.ensure_owned(operator, harvest.pond_id)?;

        harvest.harvest_id = self.harvest_repo.insert(&harvest)?;
        self.recalc.refresh_pond(harvest.pond_id)?;
        info!(harvest_id = harvest.harvest_id, total_count = ?harvest.total_count, "捕捞已记录");
        Ok(harvest)
    }

    // ==========================================
    // 其他事件
    // ==========================================

    pub fn record_feed(&self, operator: &str, mut feed: FeedEvent) -> ApiResult<FeedEvent> {
        self.access.ensure_owned(operator, feed.pond_id)?;
        feed.feed_id = self.feed_repo.insert(&feed)?;
        Ok(feed)
    }

    pub fn record_water_quality(
        &self,
        operator: &str,
        mut reading: WaterQualityReading,
    ) -> ApiResult<WaterQualityReading> {
        self.access.ensure_owned(operator, reading.pond_id)?;
        reading.reading_id = self.water_repo.insert(&reading)?;
        Ok(reading)
    }

    pub fn record_diagnostic(
        &self,
        operator: &str,
        mut diagnostic: MedicalDiagnostic,
    ) -> ApiResult<MedicalDiagnostic> {
        self.access.ensure_owned(operator, diagnostic.pond_id)?;
        diagnostic.diagnostic_id = self.medical_repo.insert(&diagnostic)?;
        Ok(diagnostic)
    }

    /// 标记诊断的治疗方案已执行
    pub fn apply_diagnostic(&self, operator: &str, pond_id: i64, diagnostic_id: i64) -> ApiResult<()> {
        self.access.ensure_owned(operator, pond_id)?;
        self.medical_repo
            .mark_applied(diagnostic_id, chrono::Local::now().naive_local())?;
        Ok(())
    }
}
