// ==========================================
// 鱼塘养殖管理系统 - 养殖事件
// ==========================================
// 职责: 放养/抽样/死亡/捕捞/投喂/水质/诊断 事件实体
// 说明: 构造函数负责字段校验与“写入即派生”的字段计算
//       （均重、每公斤尾数、总成本、总收入等）
// ==========================================

use crate::domain::error::{ensure_non_negative_opt, ensure_positive, DomainError, DomainResult};
use crate::domain::growth::GrowthRecord;
use crate::domain::types::WaterReadingSource;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// StockingEvent - 放养
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockingEvent {
    pub stocking_id: i64,
    pub pond_id: i64,
    pub species_id: i64,
    pub date: NaiveDate,
    /// 放养尾数
    pub pcs: i64,
    pub total_weight_kg: f64,
    pub cost: Option<f64>,
    /// 每公斤尾数（派生）
    pub pieces_per_kg: f64,
    /// 初始均重 kg（派生）
    pub initial_avg_weight_kg: f64,
    pub notes: Option<String>,
}

impl StockingEvent {
    pub fn new(
        pond_id: i64,
        species_id: i64,
        date: NaiveDate,
        pcs: i64,
        total_weight_kg: f64,
    ) -> DomainResult<Self> {
        if pcs <= 0 {
            return Err(DomainError::invalid("pcs", format!("放养尾数必须大于0，实际为{}", pcs)));
        }
        ensure_positive("total_weight_kg", total_weight_kg)?;

        Ok(Self {
            stocking_id: 0,
            pond_id,
            species_id,
            date,
            pcs,
            total_weight_kg,
            cost: None,
            pieces_per_kg: pcs as f64 / total_weight_kg,
            initial_avg_weight_kg: total_weight_kg / pcs as f64,
            notes: None,
        })
    }

    pub fn with_cost(mut self, cost: f64) -> DomainResult<Self> {
        ensure_non_negative_opt("cost", Some(cost))?;
        self.cost = Some(cost);
        Ok(self)
    }
}

// ==========================================
// SamplingEvent - 抽样称重
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingEvent {
    pub sampling_id: i64,
    pub pond_id: i64,
    /// None 表示混养抽样
    pub species_id: Option<i64>,
    pub date: NaiveDate,
    pub sample_size: i64,
    pub total_weight_kg: f64,
    /// 均重 kg（派生）
    pub average_weight_kg: f64,
    /// 每公斤尾数（派生）
    pub fish_per_kg: f64,
    /// 简化肥满度 = 均重kg × 1000，并非 Fulton K（缺体长数据）
    pub condition_factor: f64,
    /// 日增重 kg/天/尾（派生，无有效参照点时为空）
    pub growth_rate_kg_per_day: Option<f64>,
    /// 生物量变化 kg（派生）
    pub biomass_difference_kg: Option<f64>,
    pub notes: Option<String>,
}

impl SamplingEvent {
    pub fn new(
        pond_id: i64,
        species_id: Option<i64>,
        date: NaiveDate,
        sample_size: i64,
        total_weight_kg: f64,
    ) -> DomainResult<Self> {
        if sample_size <= 0 {
            return Err(DomainError::invalid(
                "sample_size",
                format!("抽样尾数必须大于0，实际为{}", sample_size),
            ));
        }
        ensure_positive("total_weight_kg", total_weight_kg)?;

        let average_weight_kg = total_weight_kg / sample_size as f64;
        Ok(Self {
            sampling_id: 0,
            pond_id,
            species_id,
            date,
            sample_size,
            total_weight_kg,
            average_weight_kg,
            fish_per_kg: sample_size as f64 / total_weight_kg,
            condition_factor: average_weight_kg * 1000.0,
            growth_rate_kg_per_day: None,
            biomass_difference_kg: None,
            notes: None,
        })
    }

    /// 均重（克）
    pub fn average_weight_g(&self) -> f64 {
        self.average_weight_kg * 1000.0
    }

    /// 写回生长派生值
    pub fn apply_growth(&mut self, record: &GrowthRecord) {
        self.growth_rate_kg_per_day = record.growth_rate_kg_per_day;
        self.biomass_difference_kg = record.biomass_difference_kg;
    }
}

// ==========================================
// MortalityEvent - 死亡记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityEvent {
    pub mortality_id: i64,
    pub pond_id: i64,
    pub species_id: Option<i64>,
    pub date: NaiveDate,
    pub count: i64,
    /// 均重 kg，缺省时由最近抽样/放养补齐
    pub avg_weight_kg: Option<f64>,
    /// 死亡总重 kg（派生）
    pub total_weight_kg: Option<f64>,
    pub cause: Option<String>,
    pub notes: Option<String>,
}

impl MortalityEvent {
    pub fn new(
        pond_id: i64,
        species_id: Option<i64>,
        date: NaiveDate,
        count: i64,
        avg_weight_kg: Option<f64>,
    ) -> DomainResult<Self> {
        if count <= 0 {
            return Err(DomainError::invalid("count", format!("死亡尾数必须大于0，实际为{}", count)));
        }
        if let Some(avg) = avg_weight_kg {
            ensure_positive("avg_weight_kg", avg)?;
        }

        Ok(Self {
            mortality_id: 0,
            pond_id,
            species_id,
            date,
            count,
            avg_weight_kg,
            total_weight_kg: avg_weight_kg.map(|avg| avg * count as f64),
            cause: None,
            notes: None,
        })
    }

    pub fn with_cause(mut self, cause: &str) -> Self {
        let cause = cause.trim();
        self.cause = (!cause.is_empty()).then(|| cause.to_string());
        self
    }

    /// 均重缺省时用参考均重补齐，并重算总重
    ///
    /// 已显式给出均重的记录保持不变。
    pub fn fill_average_weight(&mut self, reference_avg_kg: Option<f64>) {
        if self.avg_weight_kg.is_none() {
            self.avg_weight_kg = reference_avg_kg;
        }
        self.total_weight_kg = self.avg_weight_kg.map(|avg| avg * self.count as f64);
    }
}

// ==========================================
// HarvestEvent - 捕捞
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestEvent {
    pub harvest_id: i64,
    pub pond_id: i64,
    pub species_id: Option<i64>,
    pub date: NaiveDate,
    pub total_weight_kg: f64,
    pub pieces_per_kg: Option<f64>,
    pub price_per_kg: Option<f64>,
    /// 均重 kg（派生 = 1 / 每公斤尾数）
    pub avg_weight_kg: Option<f64>,
    pub total_count: Option<i64>,
    /// 总收入（派生）
    pub total_revenue: Option<f64>,
}

impl HarvestEvent {
    /// 创建捕捞记录
    ///
    /// total_count 与 pieces_per_kg 至少给出其一，缺的一项由另一项推导。
    pub fn new(
        pond_id: i64,
        species_id: Option<i64>,
        date: NaiveDate,
        total_weight_kg: f64,
        total_count: Option<i64>,
        pieces_per_kg: Option<f64>,
    ) -> DomainResult<Self> {
        ensure_positive("total_weight_kg", total_weight_kg)?;
        if let Some(count) = total_count {
            if count < 0 {
                return Err(DomainError::invalid("total_count", "捕捞尾数不能为负数"));
            }
        }
        if let Some(ppk) = pieces_per_kg {
            ensure_positive("pieces_per_kg", ppk)?;
        }
        if total_count.is_none() && pieces_per_kg.is_none() {
            return Err(DomainError::invalid(
                "total_count",
                "捕捞尾数与每公斤尾数至少提供一项",
            ));
        }

        let pieces_per_kg = match (pieces_per_kg, total_count) {
            (Some(ppk), _) => Some(ppk),
            (None, Some(count)) if count > 0 => Some(count as f64 / total_weight_kg),
            _ => None,
        };
        let total_count = match (total_count, pieces_per_kg) {
            (Some(count), _) => Some(count),
            (None, Some(ppk)) => Some((total_weight_kg * ppk).floor() as i64),
            _ => None,
        };

        Ok(Self {
            harvest_id: 0,
            pond_id,
            species_id,
            date,
            total_weight_kg,
            pieces_per_kg,
            price_per_kg: None,
            avg_weight_kg: pieces_per_kg.map(|ppk| 1.0 / ppk),
            total_count,
            total_revenue: None,
        })
    }

    pub fn with_price(mut self, price_per_kg: f64) -> DomainResult<Self> {
        ensure_non_negative_opt("price_per_kg", Some(price_per_kg))?;
        self.price_per_kg = Some(price_per_kg);
        self.total_revenue = Some(self.total_weight_kg * price_per_kg);
        Ok(self)
    }
}

// ==========================================
// FeedEvent - 投喂
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub feed_id: i64,
    pub pond_id: i64,
    pub feed_type_id: Option<i64>,
    pub date: NaiveDate,
    pub amount_kg: f64,
    pub packet_size_kg: Option<f64>,
    pub cost_per_packet: Option<f64>,
    pub cost_per_kg: Option<f64>,
    /// 总成本（派生：按包计价优先，其次按公斤计价）
    pub total_cost: Option<f64>,
    pub biomass_at_feeding_kg: Option<f64>,
    /// 投喂率 %（派生）
    pub feeding_rate_percent: Option<f64>,
}

impl FeedEvent {
    pub fn new(
        pond_id: i64,
        feed_type_id: Option<i64>,
        date: NaiveDate,
        amount_kg: f64,
    ) -> DomainResult<Self> {
        ensure_positive("amount_kg", amount_kg)?;
        Ok(Self {
            feed_id: 0,
            pond_id,
            feed_type_id,
            date,
            amount_kg,
            packet_size_kg: None,
            cost_per_packet: None,
            cost_per_kg: None,
            total_cost: None,
            biomass_at_feeding_kg: None,
            feeding_rate_percent: None,
        })
    }

    /// 按包计价
    pub fn with_packet_pricing(mut self, packet_size_kg: f64, cost_per_packet: f64) -> DomainResult<Self> {
        ensure_positive("packet_size_kg", packet_size_kg)?;
        ensure_non_negative_opt("cost_per_packet", Some(cost_per_packet))?;
        self.packet_size_kg = Some(packet_size_kg);
        self.cost_per_packet = Some(cost_per_packet);
        self.derive();
        Ok(self)
    }

    /// 按公斤计价
    pub fn with_kg_pricing(mut self, cost_per_kg: f64) -> DomainResult<Self> {
        ensure_non_negative_opt("cost_per_kg", Some(cost_per_kg))?;
        self.cost_per_kg = Some(cost_per_kg);
        self.derive();
        Ok(self)
    }

    /// 记录投喂时的存塘生物量，用于计算投喂率
    pub fn with_biomass(mut self, biomass_kg: f64) -> DomainResult<Self> {
        ensure_positive("biomass_at_feeding_kg", biomass_kg)?;
        self.biomass_at_feeding_kg = Some(biomass_kg);
        self.derive();
        Ok(self)
    }

    fn derive(&mut self) {
        self.total_cost = match (self.cost_per_packet, self.packet_size_kg, self.cost_per_kg) {
            (Some(per_packet), Some(size), _) if size > 0.0 => Some(self.amount_kg / size * per_packet),
            (_, _, Some(per_kg)) => Some(per_kg * self.amount_kg),
            _ => None,
        };
        self.feeding_rate_percent = self
            .biomass_at_feeding_kg
            .filter(|b| *b > 0.0)
            .map(|b| self.amount_kg / b * 100.0);
    }

    /// 折算每公斤单价（按公斤价优先，其次包价/包重）
    pub fn effective_cost_per_kg(&self) -> Option<f64> {
        if let Some(per_kg) = self.cost_per_kg {
            return Some(per_kg);
        }
        match (self.cost_per_packet, self.packet_size_kg) {
            (Some(per_packet), Some(size)) if size > 0.0 => Some(per_packet / size),
            _ => None,
        }
    }
}

// ==========================================
// WaterQualityReading - 水质读数
// ==========================================
/// 水质读数（水样检测或日常记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterQualityReading {
    pub reading_id: i64,
    pub pond_id: i64,
    pub date: NaiveDate,
    pub source: WaterReadingSource,
    pub temperature_c: Option<f64>,
    pub ph: Option<f64>,
    /// 溶解氧 mg/L
    pub dissolved_oxygen: Option<f64>,
    /// 氨氮 mg/L
    pub ammonia: Option<f64>,
    /// 亚硝酸盐 mg/L
    pub nitrite: Option<f64>,
}

impl WaterQualityReading {
    pub fn new(pond_id: i64, date: NaiveDate, source: WaterReadingSource) -> Self {
        Self {
            reading_id: 0,
            pond_id,
            date,
            source,
            temperature_c: None,
            ph: None,
            dissolved_oxygen: None,
            ammonia: None,
            nitrite: None,
        }
    }

    pub fn with_temperature(mut self, temperature_c: f64) -> Self {
        self.temperature_c = Some(temperature_c);
        self
    }

    pub fn with_ph(mut self, ph: f64) -> Self {
        self.ph = Some(ph);
        self
    }

    pub fn with_dissolved_oxygen(mut self, dissolved_oxygen: f64) -> Self {
        self.dissolved_oxygen = Some(dissolved_oxygen);
        self
    }

    pub fn with_ammonia(mut self, ammonia: f64) -> Self {
        self.ammonia = Some(ammonia);
        self
    }
}

// ==========================================
// MedicalDiagnostic - 病害诊断
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalDiagnostic {
    pub diagnostic_id: i64,
    pub pond_id: i64,
    pub disease_name: String,
    /// 诊断置信度（0-100）
    pub confidence_percent: f64,
    pub recommended_treatment: Option<String>,
    pub diagnosed_on: NaiveDate,
    pub is_applied: bool,
    pub applied_at: Option<NaiveDateTime>,
}

impl MedicalDiagnostic {
    pub fn new(
        pond_id: i64,
        disease_name: &str,
        confidence_percent: f64,
        diagnosed_on: NaiveDate,
    ) -> DomainResult<Self> {
        if disease_name.trim().is_empty() {
            return Err(DomainError::invalid("disease_name", "病害名称不能为空"));
        }
        if !(0.0..=100.0).contains(&confidence_percent) {
            return Err(DomainError::invalid(
                "confidence_percent",
                format!("置信度应在0-100之间，实际为{}", confidence_percent),
            ));
        }
        Ok(Self {
            diagnostic_id: 0,
            pond_id,
            disease_name: disease_name.trim().to_string(),
            confidence_percent,
            recommended_treatment: None,
            diagnosed_on,
            is_applied: false,
            applied_at: None,
        })
    }

    pub fn with_treatment(mut self, treatment: &str) -> Self {
        self.recommended_treatment = Some(treatment.to_string());
        self
    }
}
