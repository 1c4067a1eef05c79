// ==========================================
// 鱼塘养殖管理系统 - 抽样与生长 API
// ==========================================
// 职责: 抽样录入/修改/删除（触发生长链联动）、全量重算、生物量汇总
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{require_operator, PondAccessValidator};
use crate::domain::events::SamplingEvent;
use crate::domain::growth::GrowthRecord;
use crate::domain::projection::BiomassAnalysis;
use crate::domain::types::DateRange;
use crate::engine::biomass::BiomassAnalyzer;
use crate::engine::recalc::{CascadeOutcome, GrowthRecalcEngine, RecalcSummary};
use crate::perf::PerfGuard;
use crate::repository::{PondRepository, SamplingRepository, StockingRepository};

/// 抽样写入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingResult {
    pub sampling: SamplingEvent,
    pub growth: Option<GrowthRecord>,
    /// 被联动重算的后续抽样数
    pub cascaded_count: usize,
}

impl SamplingResult {
    fn from_outcome(sampling: SamplingEvent, outcome: CascadeOutcome) -> Self {
        Self {
            sampling,
            growth: outcome.record,
            cascaded_count: outcome.cascaded.len(),
        }
    }
}

// ==========================================
// SamplingApi - 抽样 API
// ==========================================
pub struct SamplingApi {
    pond_repo: Arc<PondRepository>,
    sampling_repo: Arc<SamplingRepository>,
    stocking_repo: Arc<StockingRepository>,
    recalc: Arc<GrowthRecalcEngine>,
    access: PondAccessValidator,
}

impl SamplingApi {
    pub fn new(
        pond_repo: Arc<PondRepository>,
        sampling_repo: Arc<SamplingRepository>,
        stocking_repo: Arc<StockingRepository>,
        recalc: Arc<GrowthRecalcEngine>,
    ) -> Self {
        Self {
            access: PondAccessValidator::new(pond_repo.clone()),
            pond_repo,
            sampling_repo,
            stocking_repo,
            recalc,
        }
    }

    /// 录入抽样并计算生长
    ///
    /// # 返回
    /// - Ok(SamplingResult): 含本条生长结果与联动条数
    /// - Err(ValidationConflict): 同 (pond, species, date) 已有抽样
    pub fn record_sampling(&self, operator: &str, sampling: SamplingEvent) -> ApiResult<SamplingResult> {
        let _perf = PerfGuard::new("record_sampling");
        self.access.ensure_owned(operator, sampling.pond_id)?;

        let (stored, outcome) = self.recalc.record_sampling(sampling)?;
        Ok(SamplingResult::from_outcome(stored, outcome))
    }

    /// 修改抽样（日期/品种/称重）
    pub fn update_sampling(&self, operator: &str, sampling: SamplingEvent) -> ApiResult<SamplingResult> {
        let _perf = PerfGuard::new("update_sampling");
        let existing = self
            .sampling_repo
            .find_by_id(sampling.sampling_id)?
            .ok_or_else(|| ApiError::NotFound(format!("抽样记录(id={})不存在", sampling.sampling_id)))?;
        self.access.ensure_owned(operator, existing.pond_id)?;
        if sampling.pond_id != existing.pond_id {
            return Err(ApiError::InvalidInput("抽样记录不能移动到其他池塘".to_string()));
        }

        let (stored, outcome) = self.recalc.update_sampling(sampling)?;
        Ok(SamplingResult::from_outcome(stored, outcome))
    }

    /// 删除抽样并刷新后续生长链
    ///
    /// # 返回
    /// - Ok(usize): 被联动重算的记录数
    pub fn delete_sampling(&self, operator: &str, sampling_id: i64) -> ApiResult<usize> {
        let _perf = PerfGuard::new("delete_sampling");
        let existing = self
            .sampling_repo
            .find_by_id(sampling_id)?
            .ok_or_else(|| ApiError::NotFound(format!("抽样记录(id={})不存在", sampling_id)))?;
        self.access.ensure_owned(operator, existing.pond_id)?;

        let outcome = self.recalc.delete_sampling(sampling_id)?;
        Ok(outcome.cascaded.len())
    }

    pub fn list_samplings(
        &self,
        operator: &str,
        pond_id: i64,
        species_id: Option<i64>,
        range: DateRange,
    ) -> ApiResult<Vec<SamplingEvent>> {
        self.access.ensure_owned(operator, pond_id)?;
        Ok(self.sampling_repo.list(pond_id, species_id, range)?)
    }

    /// 重算操作人名下池塘（或指定池塘）的全部生长派生值
    ///
    /// 按池塘、日期顺序处理，返回发生变化的记录数等汇总。
    pub fn recalculate_all_growth_rates(&self, operator: &str, pond_id: Option<i64>) -> ApiResult<RecalcSummary> {
        let _perf = PerfGuard::new("recalculate_all_growth_rates");
        require_operator(operator)?;

        let pond_ids: Vec<i64> = match pond_id {
            Some(id) => vec![self.access.ensure_owned(operator, id)?.pond_id],
            None => self
                .pond_repo
                .list_ponds_by_owner(operator.trim())?
                .into_iter()
                .map(|p| p.pond_id)
                .collect(),
        };

        let mut summary = RecalcSummary::default();
        for id in pond_ids {
            let pond_summary = self.recalc.recalculate_pond(id)?;
            summary.pond_count += 1;
            summary.sampling_count += pond_summary.sampling_count;
            summary.changed_count += pond_summary.changed_count;
        }

        info!(
            operator,
            pond_count = summary.pond_count,
            changed_count = summary.changed_count,
            "生长派生值全量重算完成"
        );
        Ok(summary)
    }

    /// 生物量汇总
    ///
    /// # 返回
    /// - Err(MissingBaselineData): 范围内无放养
    pub fn biomass_analysis(&self, operator: &str, pond_id: i64, species_id: Option<i64>) -> ApiResult<BiomassAnalysis> {
        self.access.ensure_owned(operator, pond_id)?;

        let stocking = self
            .stocking_repo
            .latest(pond_id, species_id, None)?
            .ok_or_else(|| {
                ApiError::MissingBaselineData(format!("pond_id={}, species_id={:?}", pond_id, species_id))
            })?;
        let samplings = self.sampling_repo.list(pond_id, species_id, DateRange::all())?;

        Ok(BiomassAnalyzer::new().analyze(pond_id, species_id, stocking.total_weight_kg, &samplings))
    }
}
