// ==========================================
// 鱼塘养殖管理系统 - 领域层校验错误
// ==========================================
// 职责: 事件构造时的字段校验失败
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 领域对象校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("字段值错误 (field={field}): {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("分类树结构错误: {0}")]
    InvalidHierarchy(String),
}

impl DomainError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::InvalidField {
            field,
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// 校验数值为有限正数
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> DomainResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DomainError::invalid(field, format!("必须大于0，实际为{}", value)))
    }
}

/// 校验可选数值（若存在）为有限非负数
pub(crate) fn ensure_non_negative_opt(field: &'static str, value: Option<f64>) -> DomainResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(DomainError::invalid(field, format!("不能为负数，实际为{}", v)))
        }
        _ => Ok(()),
    }
}
