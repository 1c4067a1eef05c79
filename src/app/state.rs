// ==========================================
// 鱼塘养殖管理系统 - 应用状态
// ==========================================
// 职责: 组装仓储/引擎/API，全部共享同一个数据库连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    ConfigApi, EventApi, FeedingApi, PopulationApi, PopulationReader, ProjectionApi, SamplingApi,
};
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::events::{MetricsEventPublisher, OptionalEventPublisher};
use crate::engine::pond_lock::PondLockRegistry;
use crate::engine::recalc::GrowthRecalcEngine;
use crate::repository::{
    FeedRepository, FeedingAdviceRepository, HarvestRepository, MedicalDiagnosticRepository,
    MortalityRepository, PondRepository, SamplingRepository, StockingRepository,
    SurvivalSnapshotRepository, WaterQualityRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 池塘/分类/事件录入
    pub event_api: Arc<EventApi>,

    /// 抽样与生长链
    pub sampling_api: Arc<SamplingApi>,

    /// 存活估算
    pub population_api: Arc<PopulationApi>,

    /// 投喂建议
    pub feeding_api: Arc<FeedingApi>,

    /// 生物量预测 / FCR
    pub projection_api: Arc<ProjectionApi>,

    /// 引擎参数
    pub config_api: Arc<ConfigApi>,

    /// 池塘级串行锁（生长链联动共用）
    pub pond_locks: Arc<PondLockRegistry>,
}

impl AppState {
    /// 创建新的AppState实例（不发布派生指标事件）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动建库建表）
    ///
    /// # 返回
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_publisher(db_path, None)
    }

    /// 创建AppState并注入事件发布者
    pub fn with_publisher(
        db_path: String,
        publisher: Option<Arc<dyn MetricsEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let pond_repo = Arc::new(PondRepository::from_connection(conn.clone()));
        let stocking_repo = Arc::new(StockingRepository::from_connection(conn.clone()));
        let sampling_repo = Arc::new(SamplingRepository::from_connection(conn.clone()));
        let mortality_repo = Arc::new(MortalityRepository::from_connection(conn.clone()));
        let harvest_repo = Arc::new(HarvestRepository::from_connection(conn.clone()));
        let feed_repo = Arc::new(FeedRepository::from_connection(conn.clone()));
        let water_repo = Arc::new(WaterQualityRepository::from_connection(conn.clone()));
        let medical_repo = Arc::new(MedicalDiagnosticRepository::from_connection(conn.clone()));
        let advice_repo = Arc::new(FeedingAdviceRepository::from_connection(conn.clone()));
        let survival_repo = Arc::new(SurvivalSnapshotRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let event_publisher = match publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };
        let pond_locks = Arc::new(PondLockRegistry::new());

        let mut recalc_engine = GrowthRecalcEngine::new(
            sampling_repo.clone(),
            stocking_repo.clone(),
            mortality_repo.clone(),
            harvest_repo.clone(),
        )
        .with_lock_registry(pond_locks.clone());
        if let Some(p) = event_publisher.inner() {
            recalc_engine = recalc_engine.with_publisher(p);
        }
        let recalc_engine = Arc::new(recalc_engine);

        let reader = PopulationReader::new(stocking_repo.clone(), mortality_repo.clone(), harvest_repo.clone());

        // ==========================================
        // 初始化API层
        // ==========================================
        let event_api = Arc::new(EventApi::new(
            pond_repo.clone(),
            stocking_repo.clone(),
            sampling_repo.clone(),
            mortality_repo.clone(),
            harvest_repo.clone(),
            feed_repo.clone(),
            water_repo.clone(),
            medical_repo.clone(),
            recalc_engine.clone(),
        ));

        let sampling_api = Arc::new(SamplingApi::new(
            pond_repo.clone(),
            sampling_repo.clone(),
            stocking_repo.clone(),
            recalc_engine,
        ));

        let population_api = Arc::new(PopulationApi::new(
            pond_repo.clone(),
            reader.clone(),
            stocking_repo.clone(),
            sampling_repo.clone(),
            survival_repo,
            config_manager.clone(),
            event_publisher.clone(),
        ));

        let feeding_api = Arc::new(FeedingApi::new(
            pond_repo.clone(),
            reader.clone(),
            stocking_repo.clone(),
            sampling_repo.clone(),
            mortality_repo,
            feed_repo.clone(),
            water_repo,
            medical_repo,
            advice_repo,
            config_manager.clone(),
            event_publisher,
        ));

        let projection_api = Arc::new(ProjectionApi::new(
            pond_repo,
            reader,
            stocking_repo,
            sampling_repo,
            feed_repo,
            harvest_repo,
            config_manager.clone(),
        ));

        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            event_api,
            sampling_api,
            population_api,
            feeding_api,
            projection_api,
            config_api,
            pond_locks,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: FISH_FARM_DB_PATH → 用户数据目录 → ./fish_farm_metrics.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FISH_FARM_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fish_farm_metrics.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("fish-farm-metrics-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("fish-farm-metrics");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fish_farm_metrics.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
