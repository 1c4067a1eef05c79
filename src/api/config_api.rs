// ==========================================
// 鱼塘养殖管理系统 - 配置管理 API
// ==========================================
// 职责: 引擎参数查询、更新、快照
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{load_engine_config, require_operator};
use crate::config::config_manager::{config_keys, ConfigManager, EngineConfig};

/// 允许修改的配置键
const KNOWN_KEYS: &[&str] = &[
    config_keys::EXPECTED_GROWTH_BASELINE,
    config_keys::DEFAULT_GROWTH_RATE,
    config_keys::GROWTH_RATE_MIN,
    config_keys::GROWTH_RATE_MAX,
    config_keys::STOCKING_FALLBACK_GROWTH,
    config_keys::DEFAULT_FCR,
    config_keys::FCR_MIN,
    config_keys::FCR_MAX,
    config_keys::ANALYSIS_WINDOW_DAYS,
    config_keys::DAILY_LOG_WINDOW_DAYS,
    config_keys::GROWTH_WINDOW_DAYS,
    config_keys::LEARNING_ADVICE_LIMIT,
    config_keys::LEARNING_SAMPLING_LIMIT,
    config_keys::WINTER_MONTHS,
    config_keys::SPRING_MONTHS,
    config_keys::SUMMER_MONTHS,
];

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 当前生效的引擎参数（未配置项为默认值）
    pub fn get_engine_config(&self) -> ApiResult<EngineConfig> {
        load_engine_config(&self.config_manager)
    }

    /// 已写入的配置项快照
    pub fn get_config_snapshot(&self) -> ApiResult<BTreeMap<String, String>> {
        let snapshot = self
            .config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        serde_json::from_str(&snapshot).map_err(|e| ApiError::InternalError(e.to_string()))
    }

    /// 更新单个配置
    ///
    /// # 返回
    /// - Err(InvalidInput): 未知配置键或空值
    pub fn update_config(&self, operator: &str, key: &str, value: &str) -> ApiResult<()> {
        require_operator(operator)?;
        if !KNOWN_KEYS.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知配置键: {}", key)));
        }
        if value.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置值不能为空".to_string()));
        }

        self.config_manager
            .set_global_config_value(key, value.trim())
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        tracing::info!(operator, key, value, "引擎参数已修改");
        Ok(())
    }
}
