// ==========================================
// 鱼塘养殖管理系统 - 领域类型定义
// ==========================================
// 职责: 定义派生指标计算中使用的枚举与值类型
// 约定: 需要落库的枚举提供 to_db_str / from_str
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 日期范围
// ==========================================

/// 闭区间日期范围（两端均可缺省）
///
/// 用于事件仓储的 `sum` / `list` 查询；`DateRange::all()` 表示全历史。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// 全历史
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn since(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn up_to(end: NaiveDate) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// 以 as_of 为终点、向前回看 days 天（含两端）
    pub fn trailing_days(as_of: NaiveDate, days: i64) -> Self {
        Self::between(as_of - chrono::Duration::days(days), as_of)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

// ==========================================
// 季节
// ==========================================

/// 季节（按月份划分，月份表可配置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// 按月份表判定季节，未命中任何表时视为秋季
    pub fn from_month(month: u32, months: &SeasonMonths) -> Self {
        if months.winter.contains(&month) {
            Season::Winter
        } else if months.summer.contains(&month) {
            Season::Summer
        } else if months.spring.contains(&month) {
            Season::Spring
        } else {
            Season::Autumn
        }
    }

    pub fn of_date(date: NaiveDate, months: &SeasonMonths) -> Self {
        Self::from_month(date.month(), months)
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Season::Spring => "SPRING",
            Season::Summer => "SUMMER",
            Season::Autumn => "AUTUMN",
            Season::Winter => "WINTER",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SPRING" => Season::Spring,
            "SUMMER" => Season::Summer,
            "WINTER" => Season::Winter,
            _ => Season::Autumn,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Season::Spring => "春季",
            Season::Summer => "夏季",
            Season::Autumn => "秋季",
            Season::Winter => "冬季",
        };
        write!(f, "{}", name)
    }
}

/// 季节月份表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonMonths {
    pub winter: Vec<u32>,
    pub spring: Vec<u32>,
    pub summer: Vec<u32>,
}

impl Default for SeasonMonths {
    fn default() -> Self {
        Self {
            winter: vec![12, 1, 2],
            spring: vec![3, 4, 5],
            summer: vec![6, 7, 8],
        }
    }
}

// ==========================================
// 分析结论类枚举
// ==========================================

/// 水质状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaterQualityStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

impl WaterQualityStatus {
    /// 按水质评分（0-100）分档
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => WaterQualityStatus::Excellent,
            s if s >= 60 => WaterQualityStatus::Good,
            s if s >= 40 => WaterQualityStatus::Fair,
            _ => WaterQualityStatus::Poor,
        }
    }
}

/// 死亡趋势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MortalityTrend {
    High,
    Normal,
    Low,
}

impl MortalityTrend {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MortalityTrend::High => "HIGH",
            MortalityTrend::Normal => "NORMAL",
            MortalityTrend::Low => "LOW",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "HIGH" => MortalityTrend::High,
            "LOW" => MortalityTrend::Low,
            _ => MortalityTrend::Normal,
        }
    }
}

/// 生长质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthQuality {
    Excellent,
    Good,
    Normal,
    Poor,
    Unknown,
}

impl GrowthQuality {
    /// 按单尾日增重（kg/天）分档
    pub fn from_rate(rate_kg_per_day: f64) -> Self {
        if rate_kg_per_day > 0.02 {
            GrowthQuality::Excellent
        } else if rate_kg_per_day > 0.01 {
            GrowthQuality::Good
        } else if rate_kg_per_day > 0.005 {
            GrowthQuality::Normal
        } else {
            GrowthQuality::Poor
        }
    }
}

/// 投喂一致性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedingConsistency {
    VeryConsistent,
    Consistent,
    Inconsistent,
    Unknown,
}

/// 温度趋势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureTrend {
    Warming,
    Cooling,
    Stable,
    Unknown,
}

/// 疾病严重度（可比较，取最严重者）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiseaseSeverity {
    None,
    Low,
    Medium,
    High,
}

impl DiseaseSeverity {
    /// 按诊断置信度（百分比）分档
    pub fn from_confidence(confidence_percent: f64) -> Self {
        if confidence_percent >= 80.0 {
            DiseaseSeverity::High
        } else if confidence_percent >= 60.0 {
            DiseaseSeverity::Medium
        } else {
            DiseaseSeverity::Low
        }
    }
}

/// FCR 评级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FcrStatus {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl FcrStatus {
    pub fn from_fcr(fcr: f64) -> Self {
        if fcr <= 1.2 {
            FcrStatus::Excellent
        } else if fcr <= 1.5 {
            FcrStatus::Good
        } else if fcr <= 2.0 {
            FcrStatus::NeedsImprovement
        } else {
            FcrStatus::Poor
        }
    }
}

// ==========================================
// 数据来源与置信度
// ==========================================

/// 派生结果的数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// 基于抽样数据
    SamplingBased,
    /// 无抽样数据，基于放养记录估算
    StockingBased,
}

impl DataSource {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DataSource::SamplingBased => "sampling_based",
            DataSource::StockingBased => "stocking_based",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "stocking_based" => DataSource::StockingBased,
            _ => DataSource::SamplingBased,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

/// 结果置信度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "HIGH" => Confidence::High,
            "MEDIUM" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

/// 水质读数来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaterReadingSource {
    /// 水样检测
    WaterSample,
    /// 日常记录
    DailyLog,
}

impl WaterReadingSource {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WaterReadingSource::WaterSample => "WATER_SAMPLE",
            WaterReadingSource::DailyLog => "DAILY_LOG",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "WATER_SAMPLE" => WaterReadingSource::WaterSample,
            _ => WaterReadingSource::DailyLog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_from_month() {
        let months = SeasonMonths::default();
        assert_eq!(Season::from_month(1, &months), Season::Winter);
        assert_eq!(Season::from_month(4, &months), Season::Spring);
        assert_eq!(Season::from_month(7, &months), Season::Summer);
        assert_eq!(Season::from_month(10, &months), Season::Autumn);
        assert_eq!(Season::from_str("winter"), Season::Winter);
    }

    #[test]
    fn test_date_range_contains() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let range = DateRange::between(d(5), d(10));
        assert!(range.contains(d(5)));
        assert!(range.contains(d(10)));
        assert!(!range.contains(d(11)));
        assert!(DateRange::all().contains(d(1)));
        assert!(DateRange::trailing_days(d(31), 7).contains(d(24)));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(DiseaseSeverity::High > DiseaseSeverity::Medium);
        assert_eq!(DiseaseSeverity::from_confidence(80.0), DiseaseSeverity::High);
        assert_eq!(DiseaseSeverity::from_confidence(65.0), DiseaseSeverity::Medium);
        assert_eq!(DiseaseSeverity::from_confidence(10.0), DiseaseSeverity::Low);
    }

    #[test]
    fn test_fcr_status_thresholds() {
        assert_eq!(FcrStatus::from_fcr(1.2), FcrStatus::Excellent);
        assert_eq!(FcrStatus::from_fcr(1.5), FcrStatus::Good);
        assert_eq!(FcrStatus::from_fcr(1.9), FcrStatus::NeedsImprovement);
        assert_eq!(FcrStatus::from_fcr(2.4), FcrStatus::Poor);
    }
}
