// ==========================================
// 鱼塘养殖管理系统 - 池塘与品种
// ==========================================
// 职责: 池塘（含归属人）、养殖品种、饲料类型
// 说明: 品种与饲料类型可挂在父节点下，树结构见 category.rs
// ==========================================

use crate::domain::category::CategoryNode;
use crate::domain::error::{ensure_non_negative_opt, DomainError, DomainResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 1 decimal（孟加拉面积单位）折合平方米
pub const SQM_PER_DECIMAL: f64 = 40.4686;

/// 1 英尺折合米
pub const METERS_PER_FOOT: f64 = 0.3048;

// ==========================================
// Pond - 池塘
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pond {
    pub pond_id: i64,
    /// 归属用户
    pub owner: String,
    pub name: String,
    /// 面积（decimal）
    pub area_decimal: Option<f64>,
    /// 水深（英尺）
    pub depth_ft: Option<f64>,
    /// 水体积（立方米），由面积与水深推导
    pub volume_m3: Option<f64>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Pond {
    /// 创建新池塘（pond_id 由仓储写入后回填）
    pub fn new(
        owner: &str,
        name: &str,
        area_decimal: Option<f64>,
        depth_ft: Option<f64>,
    ) -> DomainResult<Self> {
        if owner.trim().is_empty() {
            return Err(DomainError::invalid("owner", "归属用户不能为空"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::invalid("name", "池塘名称不能为空"));
        }
        ensure_non_negative_opt("area_decimal", area_decimal)?;
        ensure_non_negative_opt("depth_ft", depth_ft)?;

        Ok(Self {
            pond_id: 0,
            owner: owner.trim().to_string(),
            name: name.trim().to_string(),
            area_decimal,
            depth_ft,
            volume_m3: compute_volume_m3(area_decimal, depth_ft),
            location: None,
            is_active: true,
            created_at: chrono::Local::now().naive_local(),
        })
    }

    pub fn is_owned_by(&self, operator: &str) -> bool {
        self.owner == operator
    }
}

/// 体积 = 面积(decimal→m²) × 水深(ft→m)
pub fn compute_volume_m3(area_decimal: Option<f64>, depth_ft: Option<f64>) -> Option<f64> {
    match (area_decimal, depth_ft) {
        (Some(area), Some(depth)) => Some(area * SQM_PER_DECIMAL * depth * METERS_PER_FOOT),
        _ => None,
    }
}

// ==========================================
// Species - 养殖品种
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub species_id: i64,
    pub name: String,
    pub scientific_name: Option<String>,
    pub parent_id: Option<i64>,
}

impl CategoryNode for Species {
    fn node_id(&self) -> i64 {
        self.species_id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

// ==========================================
// FeedType - 饲料类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedType {
    pub feed_type_id: i64,
    pub name: String,
    /// 蛋白含量（%）
    pub protein_percent: Option<f64>,
    pub parent_id: Option<i64>,
}

impl CategoryNode for FeedType {
    fn node_id(&self) -> i64 {
        self.feed_type_id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pond_volume_derivation() {
        let pond = Pond::new("farmer", "一号塘", Some(10.0), Some(5.0)).unwrap();
        let expected = 10.0 * SQM_PER_DECIMAL * 5.0 * METERS_PER_FOOT;
        assert!((pond.volume_m3.unwrap() - expected).abs() < 1e-9);

        let pond = Pond::new("farmer", "二号塘", Some(10.0), None).unwrap();
        assert!(pond.volume_m3.is_none());
    }

    #[test]
    fn test_pond_requires_owner() {
        assert!(Pond::new("  ", "一号塘", None, None).is_err());
        assert!(Pond::new("farmer", "一号塘", Some(-1.0), None).is_err());
    }
}
