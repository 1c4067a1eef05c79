// ==========================================
// 鱼塘养殖管理系统 - 引擎层错误类型
// ==========================================
// 说明: 只有结构性缺失（无放养基线、目标不合法）才是硬错误；
//       派生指标缺数据时降级为空值并带来源标记
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 无放养记录，无法确定基线
    #[error("缺少放养基线数据: pond_id={pond_id}, species_id={species_id:?}")]
    MissingBaselineData {
        pond_id: i64,
        species_id: Option<i64>,
    },

    /// 目标生物量不高于当前生物量
    #[error("目标生物量({target_kg:.2}kg)必须大于当前生物量({current_kg:.2}kg)")]
    TargetNotAboveCurrent { target_kg: f64, current_kg: f64 },

    /// 池塘内已无存活鱼
    #[error("池塘无存活鱼: pond_id={pond_id}, species_id={species_id:?}")]
    NoLiveFish {
        pond_id: i64,
        species_id: Option<i64>,
    },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("投喂阶段表不连续: {0}")]
    StageTable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
