// ==========================================
// 鱼塘养殖管理系统 - 访问校验
// ==========================================
// 职责: 操作人非空校验、池塘归属校验
// 约定: 不属于操作人的池塘一律按"不存在"处理
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, EngineConfig};
use crate::domain::pond::Pond;
use crate::repository::pond_repo::PondRepository;

/// 操作人非空
pub fn require_operator(operator: &str) -> ApiResult<()> {
    if operator.trim().is_empty() {
        return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
    }
    Ok(())
}

/// 池塘访问校验器
pub struct PondAccessValidator {
    pond_repo: Arc<PondRepository>,
}

impl PondAccessValidator {
    pub fn new(pond_repo: Arc<PondRepository>) -> Self {
        Self { pond_repo }
    }

    /// 校验池塘存在且归属操作人
    ///
    /// # 返回
    /// - Ok(Pond): 池塘
    /// - Err(NotFound): 池塘不存在或不属于操作人
    pub fn ensure_owned(&self, operator: &str, pond_id: i64) -> ApiResult<Pond> {
        require_operator(operator)?;
        self.pond_repo
            .find_owned_pond(operator.trim(), pond_id)?
            .ok_or_else(|| ApiError::NotFound(format!("池塘(id={})不存在", pond_id)))
    }
}

/// 读取引擎配置
pub(crate) fn load_engine_config(config_manager: &ConfigManager) -> ApiResult<EngineConfig> {
    config_manager
        .get_engine_config()
        .map_err(|e| ApiError::InternalError(format!("读取引擎配置失败: {}", e)))
}
