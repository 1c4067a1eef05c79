// ==========================================
// 鱼塘养殖管理系统 - 数据仓储层
// ==========================================
// 职责: 养殖事件存储与查询（latest / sum / list）
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod advice_repo;
pub mod error;
pub mod feed_repo;
pub mod harvest_repo;
pub mod medical_repo;
pub mod mortality_repo;
pub mod pond_repo;
pub mod sampling_repo;
pub mod stocking_repo;
pub mod survival_repo;
pub mod water_quality_repo;

// 重导出
pub use advice_repo::FeedingAdviceRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use feed_repo::FeedRepository;
pub use harvest_repo::HarvestRepository;
pub use medical_repo::MedicalDiagnosticRepository;
pub use mortality_repo::MortalityRepository;
pub use pond_repo::PondRepository;
pub use sampling_repo::SamplingRepository;
pub use stocking_repo::StockingRepository;
pub use survival_repo::SurvivalSnapshotRepository;
pub use water_quality_repo::WaterQualityRepository;

/// 按 (pond, species?, date range) 过滤的通用 WHERE 子句
///
/// 参数顺序: ?1 pond_id, ?2 species_id（NULL 表示整塘）, ?3 起始日期, ?4 截止日期
pub(crate) const SCOPE_FILTER: &str = "pond_id = ?1 AND (?2 IS NULL OR species_id = ?2) \
     AND (?3 IS NULL OR date >= ?3) AND (?4 IS NULL OR date <= ?4)";
