// ==========================================
// 鱼塘养殖管理系统 - API 层
// ==========================================
// 职责: 面向调用方的计算入口，统一校验操作人与池塘归属
// ==========================================

pub mod config_api;
pub mod error;
pub mod event_api;
pub mod feeding_api;
pub mod population_api;
pub mod projection_api;
pub mod sampling_api;
pub mod validator;

// 重导出核心类型
pub use config_api::ConfigApi;
pub use error::{ApiError, ApiResult};
pub use event_api::EventApi;
pub use feeding_api::{AutoAdviceReport, FeedingApi, SkippedSpecies};
pub use population_api::{PopulationApi, PopulationReader};
pub use projection_api::ProjectionApi;
pub use sampling_api::{SamplingApi, SamplingResult};
pub use validator::{require_operator, PondAccessValidator};
