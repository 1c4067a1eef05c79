// ==========================================
// 鱼塘养殖管理系统 - API层错误类型
// ==========================================
// 职责: 汇总仓储/领域/引擎错误，转换为调用方可读的错误消息
// 原则: 只有结构性缺失（池塘/放养基线）才是硬错误；
//       派生指标缺数据时降级为空值，不在此处出现
// ==========================================

use crate::domain::error::DomainError;
use crate::engine::error::EngineError;
use crate::engine::recalc::RecalcError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 数据缺失 / 冲突
    // ==========================================
    /// 无放养记录，无法确定基线
    #[error("缺少放养基线数据: {0}")]
    MissingBaselineData(String),

    /// 重复抽样等写入冲突（在任何派生计算之前拒绝）
    #[error("数据冲突: {0}")]
    ValidationConflict(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationConflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MissingBaselineData { .. } => ApiError::MissingBaselineData(err.to_string()),
            EngineError::TargetNotAboveCurrent { .. } => ApiError::ValidationError(err.to_string()),
            EngineError::NoLiveFish { .. } => ApiError::BusinessRuleViolation(err.to_string()),
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            EngineError::StageTable(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<RecalcError> for ApiError {
    fn from(err: RecalcError) -> Self {
        match err {
            RecalcError::DuplicateSampling { .. } => ApiError::ValidationConflict(err.to_string()),
            RecalcError::SamplingNotFound(id) => ApiError::NotFound(format!("抽样记录(id={})不存在", id)),
            RecalcError::Lock(msg) => ApiError::InternalError(msg),
            RecalcError::Repository(e) => ApiError::from(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
