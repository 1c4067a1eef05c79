// ==========================================
// 鱼塘养殖管理系统 - 领域模型层
// ==========================================
// 职责: 定义养殖事件、派生记录、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod advice;
pub mod category;
pub mod error;
pub mod events;
pub mod growth;
pub mod pond;
pub mod projection;
pub mod survival;
pub mod types;

// 重导出核心类型
pub use advice::{
    AdjustmentBreakdown, FallbackFactors, FeedingAdjustments, FeedingAdvice, LearningAdjustment,
};
pub use category::{CategoryNode, CategoryTree};
pub use error::{DomainError, DomainResult};
pub use events::{
    FeedEvent, HarvestEvent, MedicalDiagnostic, MortalityEvent, SamplingEvent, StockingEvent,
    WaterQualityReading,
};
pub use growth::{GrowthRecord, GrowthReference, GrowthStatus};
pub use pond::{FeedType, Pond, Species};
pub use projection::{BiomassAnalysis, FcrMethod, FcrReport, GrowthRateMethod, ProjectionResult};
pub use survival::{PopulationTotals, SurvivalSnapshot};
pub use types::{
    Confidence, DataSource, DateRange, DiseaseSeverity, FcrStatus, FeedingConsistency,
    GrowthQuality, MortalityTrend, Season, SeasonMonths, TemperatureTrend, WaterQualityStatus,
    WaterReadingSource,
};
