// ==========================================
// 鱼塘养殖管理系统 - 派生指标核心库
// ==========================================
// 技术栈: Rust + SQLite
// 职责: 生长/存活/投喂建议/生物量预测等派生指标的计算与重算
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 事件存储
pub mod repository;

// 引擎层 - 指标计算
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计（SQL 计数/慢查询）
pub mod perf;

// API 层 - 计算入口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Confidence, DataSource, DateRange, MortalityTrend, Season};

// 领域实体
pub use domain::{
    FeedEvent, FeedingAdvice, GrowthRecord, HarvestEvent, MedicalDiagnostic, MortalityEvent, Pond,
    ProjectionResult, SamplingEvent, StockingEvent, SurvivalSnapshot, WaterQualityReading,
};

// 引擎
pub use engine::{
    BiomassProjector, FeedingRecommendationEngine, FeedingStageTable, GrowthEstimator,
    GrowthRecalcEngine, PopulationEstimator,
};

// API
pub use api::{ApiError, ApiResult, EventApi, FeedingApi, PopulationApi, ProjectionApi, SamplingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "鱼塘养殖管理系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
