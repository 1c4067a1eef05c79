// ==========================================
// 鱼塘养殖管理系统 - 引擎层
// ==========================================
// 职责: 派生指标计算（生长/存活/投喂/预测）与重算联动
// 红线: 计算函数不拼 SQL；仅 recalc 通过仓储读写
// ==========================================

pub mod analysis;
pub mod biomass;
pub mod error;
pub mod events;
pub mod feeding;
pub mod feeding_stage;
pub mod growth;
pub mod pond_lock;
pub mod population;
pub mod projection;
pub mod recalc;

// 重导出核心引擎
pub use biomass::{BiomassAnalyzer, FcrAnalyzer};
pub use error::{EngineError, EngineResult};
pub use events::{
    MetricsEvent, MetricsEventPublisher, MetricsEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use feeding::{AdviceInputs, FallbackInputs, FeedingRecommendation, FeedingRecommendationEngine};
pub use feeding_stage::{FeedingStage, FeedingStageTable};
pub use growth::{GrowthEstimator, PondHistory};
pub use pond_lock::PondLockRegistry;
pub use population::PopulationEstimator;
pub use projection::{BiomassProjector, ProjectionInputs};
pub use recalc::{CascadeOutcome, GrowthRecalcEngine, RecalcError, RecalcResult, RecalcSummary};
