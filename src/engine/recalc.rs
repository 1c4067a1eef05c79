// ==========================================
// 鱼塘养殖管理系统 - 生长重算/联动引擎
// ==========================================
// 职责: 抽样写入/修改/删除后，按日期升序重算同塘后续抽样的生长派生值；
//       放养/死亡/捕捞改变存塘尾数，重算整条生长链
// 约束: 同一池塘串行执行（池塘锁）；单遍顺序处理，不回滚，
//       中途失败时已处理记录保持更新，后续记录保持旧值
// ==========================================

use crate::domain::events::{HarvestEvent, MortalityEvent, SamplingEvent, StockingEvent};
use crate::domain::growth::GrowthRecord;
use crate::domain::types::DateRange;
use crate::engine::events::{MetricsEvent, MetricsEventPublisher, MetricsEventType, OptionalEventPublisher};
use crate::engine::growth::{GrowthEstimator, PondHistory};
use crate::engine::pond_lock::PondLockRegistry;
use crate::repository::{
    HarvestRepository, MortalityRepository, RepositoryError, SamplingRepository, StockingRepository,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

const EVENT_SOURCE: &str = "GrowthRecalcEngine";

#[derive(Error, Debug)]
pub enum RecalcError {
    /// 同 (pond, species, date) 已有抽样
    #[error("抽样记录重复: pond_id={pond_id}, species_id={species_id:?}, date={date}")]
    DuplicateSampling {
        pond_id: i64,
        species_id: Option<i64>,
        date: NaiveDate,
    },

    #[error("抽样记录不存在: sampling_id={0}")]
    SamplingNotFound(i64),

    #[error("{0}")]
    Lock(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type RecalcResult<T> = Result<T, RecalcError>;

/// 一次写入触发的联动结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeOutcome {
    /// 触发记录本身的生长结果（删除时为空）
    pub record: Option<GrowthRecord>,
    /// 被联动重算的后续记录（按日期升序）
    pub cascaded: Vec<GrowthRecord>,
}

/// 全量重算汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalcSummary {
    pub pond_count: usize,
    pub sampling_count: usize,
    /// 派生值发生变化的记录数
    pub changed_count: usize,
}

/// 单个池塘的完整历史（持有）
struct OwnedHistory {
    samplings: Vec<SamplingEvent>,
    stockings: Vec<StockingEvent>,
    mortalities: Vec<MortalityEvent>,
    harvests: Vec<HarvestEvent>,
}

impl OwnedHistory {
    fn view(&self) -> PondHistory<'_> {
        PondHistory {
            samplings: &self.samplings,
            stockings: &self.stockings,
            mortalities: &self.mortalities,
            harvests: &self.harvests,
        }
    }
}

fn growth_changed(old: &SamplingEvent, record: &GrowthRecord) -> bool {
    old.growth_rate_kg_per_day != record.growth_rate_kg_per_day
        || old.biomass_difference_kg != record.biomass_difference_kg
}

// ==========================================
// GrowthRecalcEngine - 生长重算引擎
// ==========================================
pub struct GrowthRecalcEngine {
    sampling_repo: Arc<SamplingRepository>,
    stocking_repo: Arc<StockingRepository>,
    mortality_repo: Arc<MortalityRepository>,
    harvest_repo: Arc<HarvestRepository>,
    estimator: GrowthEstimator,
    locks: Arc<PondLockRegistry>,
    publisher: OptionalEventPublisher,
}

impl GrowthRecalcEngine {
    pub fn new(
        sampling_repo: Arc<SamplingRepository>,
        stocking_repo: Arc<StockingRepository>,
        mortality_repo: Arc<MortalityRepository>,
        harvest_repo: Arc<HarvestRepository>,
    ) -> Self {
        Self {
            sampling_repo,
            stocking_repo,
            mortality_repo,
            harvest_repo,
            estimator: GrowthEstimator::new(),
            locks: Arc::new(PondLockRegistry::new()),
            publisher: OptionalEventPublisher::none(),
        }
    }

    /// 注入事件发布者
    pub fn with_publisher(mut self, publisher: Arc<dyn MetricsEventPublisher>) -> Self {
        self.publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    /// 共享池塘锁注册表
    pub fn with_lock_registry(mut self, locks: Arc<PondLockRegistry>) -> Self {
        self.locks = locks;
        self
    }

    fn load_history(&self, pond_id: i64) -> Result<OwnedHistory, RepositoryError> {
        Ok(OwnedHistory {
            samplings: self.sampling_repo.list(pond_id, None, DateRange::all())?,
            stockings: self.stocking_repo.list(pond_id, None, DateRange::all())?,
            mortalities: self.mortality_repo.list(pond_id, None, DateRange::all())?,
            harvests: self.harvest_repo.list(pond_id, None, DateRange::all())?,
        })
    }

    /// 按顺序回写派生值，返回实际变化的记录数
    fn persist(&self, history: &OwnedHistory, records: &[GrowthRecord]) -> Result<usize, RepositoryError> {
        let mut changed = 0;
        for record in records {
            let old = history.samplings.iter().find(|s| s.sampling_id == record.sampling_id);
            if old.map_or(true, |s| growth_changed(s, record)) {
                self.sampling_repo.update_growth(
                    record.sampling_id,
                    record.growth_rate_kg_per_day,
                    record.biomass_difference_kg,
                )?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn ensure_unique(&self, sampling: &SamplingEvent, exclude_id: Option<i64>) -> RecalcResult<()> {
        if self
            .sampling_repo
            .exists_duplicate(sampling.pond_id, sampling.species_id, sampling.date, exclude_id)?
        {
            return Err(RecalcError::DuplicateSampling {
                pond_id: sampling.pond_id,
                species_id: sampling.species_id,
                date: sampling.date,
            });
        }
        Ok(())
    }

    /// 在池塘锁内：从 from_date 起联动重算（排除触发记录）
    fn cascade(&self, pond_id: i64, from_date: NaiveDate, exclude_id: Option<i64>) -> RecalcResult<Vec<GrowthRecord>> {
        let history = self.load_history(pond_id)?;
        let cascaded = self.estimator.plan_cascade(&history.view(), from_date, exclude_id);
        self.persist(&history, &cascaded)?;
        Ok(cascaded)
    }

    fn publish_chain_updated(&self, pond_id: i64, species_id: Option<i64>, from: NaiveDate, count: usize) {
        self.publisher.publish_or_warn(MetricsEvent::from_date(
            pond_id,
            species_id,
            MetricsEventType::GrowthChainUpdated,
            Some(EVENT_SOURCE.to_string()),
            from,
            count,
        ));
    }

    /// 新增抽样
    ///
    /// 1. 重复 (pond, species, date) 直接拒绝，不做任何计算
    /// 2. 写入 → 计算自身生长 → 回写
    /// 3. 同塘日期 ≥ 本次的其他抽样按日期升序重算
    #[instrument(skip(self, sampling), fields(pond_id = sampling.pond_id, date = %sampling.date))]
    pub fn record_sampling(&self, sampling: SamplingEvent) -> RecalcResult<(SamplingEvent, CascadeOutcome)> {
        let pond_id = sampling.pond_id;
        self.locks
            .with_pond(pond_id, || -> RecalcResult<(SamplingEvent, CascadeOutcome)> {
                self.ensure_unique(&sampling, None)?;

                let mut stored = sampling;
                stored.growth_rate_kg_per_day = None;
                stored.biomass_difference_kg = None;
                stored.sampling_id = self.sampling_repo.insert(&stored)?;

                let history = self.load_history(pond_id)?;
                let record = self.estimator.compute(&stored, &history.view());
                self.sampling_repo.update_growth(
                    stored.sampling_id,
                    record.growth_rate_kg_per_day,
                    record.biomass_difference_kg,
                )?;
                stored.apply_growth(&record);

                let cascaded = self.cascade(pond_id, stored.date, Some(stored.sampling_id))?;
                tracing::info!(
                    sampling_id = stored.sampling_id,
                    cascaded = cascaded.len(),
                    "抽样已记录，后续生长链已重算"
                );
                self.publish_chain_updated(pond_id, stored.species_id, stored.date, cascaded.len() + 1);

                Ok((
                    stored,
                    CascadeOutcome {
                        record: Some(record),
                        cascaded,
                    },
                ))
            })
            .map_err(RecalcError::Lock)?
    }

    /// 修改抽样（日期/品种/称重），从新旧日期中较早者开始联动
    #[instrument(skip(self, sampling), fields(sampling_id = sampling.sampling_id))]
    pub fn update_sampling(&self, sampling: SamplingEvent) -> RecalcResult<(SamplingEvent, CascadeOutcome)> {
        let existing = self
            .sampling_repo
            .find_by_id(sampling.sampling_id)?
            .ok_or(RecalcError::SamplingNotFound(sampling.sampling_id))?;
        let pond_id = existing.pond_id;

        self.locks
            .with_pond(pond_id, || -> RecalcResult<(SamplingEvent, CascadeOutcome)> {
                self.ensure_unique(&sampling, Some(sampling.sampling_id))?;

                let mut stored = sampling;
                stored.pond_id = pond_id;
                self.sampling_repo.update(&stored)?;

                let history = self.load_history(pond_id)?;
                let record = self.estimator.compute(&stored, &history.view());
                self.sampling_repo.update_growth(
                    stored.sampling_id,
                    record.growth_rate_kg_per_day,
                    record.biomass_difference_kg,
                )?;
                stored.apply_growth(&record);

                let from = existing.date.min(stored.date);
                let cascaded = self.cascade(pond_id, from, Some(stored.sampling_id))?;
                self.publish_chain_updated(pond_id, stored.species_id, from, cascaded.len() + 1);

                Ok((
                    stored,
                    CascadeOutcome {
                        record: Some(record),
                        cascaded,
                    },
                ))
            })
            .map_err(RecalcError::Lock)?
    }

    /// 删除抽样，从其日期开始联动
    #[instrument(skip(self))]
    pub fn delete_sampling(&self, sampling_id: i64) -> RecalcResult<CascadeOutcome> {
        let existing = self
            .sampling_repo
            .find_by_id(sampling_id)?
            .ok_or(RecalcError::SamplingNotFound(sampling_id))?;
        let pond_id = existing.pond_id;

        self.locks
            .with_pond(pond_id, || -> RecalcResult<CascadeOutcome> {
                if !self.sampling_repo.delete(sampling_id)? {
                    return Err(RecalcError::SamplingNotFound(sampling_id));
                }
                let cascaded = self.cascade(pond_id, existing.date, None)?;
                self.publish_chain_updated(pond_id, existing.species_id, existing.date, cascaded.len());
                Ok(CascadeOutcome {
                    record: None,
                    cascaded,
                })
            })
            .map_err(RecalcError::Lock)?
    }

    /// 在池塘锁内：重算池塘全部抽样，返回 (记录总数, 派生值变化的记录)
    fn recompute_all(&self, pond_id: i64) -> RecalcResult<(usize, Vec<GrowthRecord>)> {
        let history = self.load_history(pond_id)?;
        let Some(first) = history.samplings.iter().map(|s| s.date).min() else {
            return Ok((0, Vec::new()));
        };
        let records = self.estimator.plan_cascade(&history.view(), first, None);
        let total = records.len();
        let changed: Vec<GrowthRecord> = records
            .into_iter()
            .filter(|record| {
                history
                    .samplings
                    .iter()
                    .find(|s| s.sampling_id == record.sampling_id)
                    .map_or(true, |old| growth_changed(old, record))
            })
            .collect();
        self.persist(&history, &changed)?;
        Ok((total, changed))
    }

    /// 放养/死亡/捕捞写入后刷新整条生长链
    ///
    /// 存塘尾数取全部历史，尾数变化影响池塘内每一条抽样的生物量变化，
    /// 因此不论事件日期都从最早抽样起重算。返回派生值变化的记录。
    pub fn refresh_pond(&self, pond_id: i64) -> RecalcResult<Vec<GrowthRecord>> {
        self.locks
            .with_pond(pond_id, || -> RecalcResult<Vec<GrowthRecord>> {
                let (_, changed) = self.recompute_all(pond_id)?;
                if let Some(first) = changed.first() {
                    self.publish_chain_updated(pond_id, None, first.date, changed.len());
                }
                Ok(changed)
            })
            .map_err(RecalcError::Lock)?
    }

    /// 全量重算池塘内所有抽样
    #[instrument(skip(self))]
    pub fn recalculate_pond(&self, pond_id: i64) -> RecalcResult<RecalcSummary> {
        self.locks
            .with_pond(pond_id, || -> RecalcResult<RecalcSummary> {
                let (sampling_count, changed) = self.recompute_all(pond_id)?;
                let changed_count = changed.len();

                if changed_count > 0 {
                    self.publisher.publish_or_warn(MetricsEvent::pond_wide(
                        pond_id,
                        MetricsEventType::ManualTrigger,
                        Some(EVENT_SOURCE.to_string()),
                    ));
                }
                tracing::info!(pond_id, sampling_count, changed_count, "池塘生长链全量重算完成");

                Ok(RecalcSummary {
                    pond_count: 1,
                    sampling_count,
                    changed_count,
                })
            })
            .map_err(RecalcError::Lock)?
    }
}
