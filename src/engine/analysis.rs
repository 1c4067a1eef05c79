// ==========================================
// 鱼塘养殖管理系统 - 投喂前置分析
// ==========================================
// 职责: 水质/死亡/投喂一致性/环境/生长/病害/饲料历史 子分析
// 说明: 全部为纯函数，输入为已按范围取出的事件切片，
//       输出小型结构化结果，由投喂建议引擎组合
// ==========================================

use crate::domain::events::{FeedEvent, MedicalDiagnostic, MortalityEvent, SamplingEvent, WaterQualityReading};
use crate::domain::types::{
    DateRange, DiseaseSeverity, FeedingConsistency, GrowthQuality, Season, SeasonMonths,
    TemperatureTrend, WaterQualityStatus, WaterReadingSource,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

// ==========================================
// 水质
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterQualityAnalysis {
    pub status: WaterQualityStatus,
    /// 0-100
    pub score: u32,
    pub reading_date: Option<NaiveDate>,
    pub source: Option<WaterReadingSource>,
    pub temperature_c: Option<f64>,
    pub ph: Option<f64>,
    pub dissolved_oxygen: Option<f64>,
    pub ammonia: Option<f64>,
    pub issues: Vec<String>,
}

impl WaterQualityAnalysis {
    fn unknown() -> Self {
        Self {
            status: WaterQualityStatus::Unknown,
            score: 0,
            reading_date: None,
            source: None,
            temperature_c: None,
            ph: None,
            dissolved_oxygen: None,
            ammonia: None,
            issues: Vec::new(),
        }
    }
}

/// 分段评分：最优区间 25 分，可接受区间 15 分
fn band_score(value: Option<f64>, optimal: impl Fn(f64) -> bool, acceptable: impl Fn(f64) -> bool) -> u32 {
    match value {
        Some(v) if optimal(v) => 25,
        Some(v) if acceptable(v) => 15,
        _ => 0,
    }
}

/// 水质分析
///
/// 取 window_days 内最近一次水样检测；没有则取 daily_window_days 内最近一次日常记录。
/// 两者都没有时状态为 Unknown（不参与调整）。
pub fn analyze_water_quality(
    readings: &[WaterQualityReading],
    as_of: NaiveDate,
    window_days: i64,
    daily_window_days: i64,
) -> WaterQualityAnalysis {
    let latest = |source: WaterReadingSource, days: i64| {
        let range = DateRange::trailing_days(as_of, days);
        readings
            .iter()
            .filter(|r| r.source == source && range.contains(r.date))
            .max_by_key(|r| (r.date, r.reading_id))
    };

    let Some(reading) = latest(WaterReadingSource::WaterSample, window_days)
        .or_else(|| latest(WaterReadingSource::DailyLog, daily_window_days))
    else {
        return WaterQualityAnalysis::unknown();
    };

    let score = band_score(reading.temperature_c, |t| (20.0..=28.0).contains(&t), |t| (15.0..=32.0).contains(&t))
        + band_score(reading.ph, |p| (6.5..=8.5).contains(&p), |p| (6.0..=9.0).contains(&p))
        + band_score(reading.dissolved_oxygen, |d| d >= 5.0, |d| d >= 3.0)
        + band_score(reading.ammonia, |a| a <= 0.02, |a| a <= 0.05);

    let mut issues = Vec::new();
    if let Some(t) = reading.temperature_c.filter(|t| !(15.0..=32.0).contains(t)) {
        issues.push(format!("水温异常: {:.1}°C", t));
    }
    if let Some(p) = reading.ph.filter(|p| !(6.0..=9.0).contains(p)) {
        issues.push(format!("pH 超出可接受范围: {:.1}", p));
    }
    if let Some(d) = reading.dissolved_oxygen.filter(|d| *d < 3.0) {
        issues.push(format!("溶氧偏低: {:.1} mg/L", d));
    }
    if let Some(a) = reading.ammonia.filter(|a| *a > 0.05) {
        issues.push(format!("氨氮偏高: {:.3} mg/L", a));
    }

    WaterQualityAnalysis {
        status: WaterQualityStatus::from_score(score),
        score,
        reading_date: Some(reading.date),
        source: Some(reading.source),
        temperature_c: reading.temperature_c,
        ph: reading.ph,
        dissolved_oxygen: reading.dissolved_oxygen,
        ammonia: reading.ammonia,
        issues,
    }
}

// ==========================================
// 死亡
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityCause {
    pub cause: String,
    pub deaths: i64,
    pub events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityAnalysis {
    pub total_recent_deaths: i64,
    pub event_count: usize,
    pub avg_deaths_per_event: f64,
    /// 按死亡数降序
    pub causes: Vec<MortalityCause>,
    /// 窗口内死亡 > 10 尾
    pub high_mortality_rate: bool,
    /// 窗口内死亡事件 > 5 次
    pub frequent_events: bool,
    /// 死因含 "disease"
    pub disease_present: bool,
}

const HIGH_MORTALITY_DEATHS: i64 = 10;
const FREQUENT_MORTALITY_EVENTS: usize = 5;
const UNKNOWN_CAUSE: &str = "未记录";

/// 死亡分析（输入为已按池塘/品种过滤的记录）
pub fn analyze_mortality(mortalities: &[MortalityEvent], as_of: NaiveDate, window_days: i64) -> MortalityAnalysis {
    let range = DateRange::trailing_days(as_of, window_days);
    let recent: Vec<&MortalityEvent> = mortalities.iter().filter(|m| range.contains(m.date)).collect();

    let total_recent_deaths: i64 = recent.iter().map(|m| m.count).sum();
    let event_count = recent.len();

    let mut by_cause: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for m in &recent {
        let key = m.cause.clone().unwrap_or_else(|| UNKNOWN_CAUSE.to_string());
        let entry = by_cause.entry(key).or_insert((0, 0));
        entry.0 += m.count;
        entry.1 += 1;
    }
    let mut causes: Vec<MortalityCause> = by_cause
        .into_iter()
        .map(|(cause, (deaths, events))| MortalityCause { cause, deaths, events })
        .collect();
    causes.sort_by(|a, b| b.deaths.cmp(&a.deaths));

    let disease_present = recent.iter().any(|m| {
        m.count > 0
            && m
                .cause
                .as_deref()
                .map_or(false, |c| c.to_lowercase().contains("disease"))
    });

    MortalityAnalysis {
        total_recent_deaths,
        event_count,
        avg_deaths_per_event: if event_count > 0 {
            total_recent_deaths as f64 / event_count as f64
        } else {
            0.0
        },
        causes,
        high_mortality_rate: total_recent_deaths > HIGH_MORTALITY_DEATHS,
        frequent_events: event_count > FREQUENT_MORTALITY_EVENTS,
        disease_present,
    }
}

// ==========================================
// 投喂一致性
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedingPatternAnalysis {
    pub total_feed_kg: f64,
    /// 窗口内日均投喂（总量 / 窗口天数）
    pub avg_daily_feed_kg: f64,
    pub feeding_days: usize,
    pub daily_std_dev_kg: Option<f64>,
    pub consistency: FeedingConsistency,
}

const MIN_FEEDING_DAYS_FOR_CONSISTENCY: usize = 5;

/// 投喂一致性分析（池塘级，投喂记录不区分品种）
pub fn analyze_feeding_pattern(feeds: &[FeedEvent], as_of: NaiveDate, window_days: i64) -> FeedingPatternAnalysis {
    let range = DateRange::trailing_days(as_of, window_days);
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for f in feeds.iter().filter(|f| range.contains(f.date)) {
        *daily.entry(f.date).or_insert(0.0) += f.amount_kg;
    }

    let total_feed_kg: f64 = daily.values().sum();
    let feeding_days = daily.len();

    let (daily_std_dev_kg, consistency) = if feeding_days > MIN_FEEDING_DAYS_FOR_CONSISTENCY {
        let n = feeding_days as f64;
        let mean = total_feed_kg / n;
        let variance = daily.values().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let consistency = if std_dev < mean * 0.2 {
            FeedingConsistency::VeryConsistent
        } else if std_dev < mean * 0.4 {
            FeedingConsistency::Consistent
        } else {
            FeedingConsistency::Inconsistent
        };
        (Some(std_dev), consistency)
    } else {
        (None, FeedingConsistency::Unknown)
    };

    FeedingPatternAnalysis {
        total_feed_kg,
        avg_daily_feed_kg: if window_days > 0 {
            total_feed_kg / window_days as f64
        } else {
            0.0
        },
        feeding_days,
        daily_std_dev_kg,
        consistency,
    }
}

// ==========================================
// 环境
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentAnalysis {
    pub season: Season,
    pub water_temp_c: Option<f64>,
    pub temperature_trend: TemperatureTrend,
}

const TEMPERATURE_TREND_DELTA: f64 = 2.0;

/// 环境分析：季节、水温、近 daily_window_days 天日常记录的温度趋势
pub fn analyze_environment(
    readings: &[WaterQualityReading],
    water: &WaterQualityAnalysis,
    as_of: NaiveDate,
    daily_window_days: i64,
    months: &SeasonMonths,
) -> EnvironmentAnalysis {
    let range = DateRange::trailing_days(as_of, daily_window_days);
    let mut logs: Vec<&WaterQualityReading> = readings
        .iter()
        .filter(|r| r.source == WaterReadingSource::DailyLog && range.contains(r.date))
        .filter(|r| r.temperature_c.is_some())
        .collect();
    logs.sort_by_key(|r| (r.date, r.reading_id));

    let temps: Vec<f64> = logs.iter().filter_map(|r| r.temperature_c).collect();
    let temperature_trend = match (temps.first(), temps.last()) {
        (Some(first), Some(last)) if temps.len() > 1 => {
            let delta = last - first;
            if delta > TEMPERATURE_TREND_DELTA {
                TemperatureTrend::Warming
            } else if delta < -TEMPERATURE_TREND_DELTA {
                TemperatureTrend::Cooling
            } else {
                TemperatureTrend::Stable
            }
        }
        _ => TemperatureTrend::Unknown,
    };

    EnvironmentAnalysis {
        season: Season::of_date(as_of, months),
        water_temp_c: water.temperature_c.or_else(|| temps.last().copied()),
        temperature_trend,
    }
}

// ==========================================
// 生长质量
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthAnalysis {
    pub sampling_count: usize,
    pub weight_gain_kg: Option<f64>,
    pub growth_rate_kg_per_day: Option<f64>,
    pub quality: GrowthQuality,
}

/// 生长质量：窗口内首末两次抽样的日增重（至少两次且间隔 > 0 天）
pub fn analyze_growth(samplings: &[SamplingEvent], as_of: NaiveDate, window_days: i64) -> GrowthAnalysis {
    let range = DateRange::trailing_days(as_of, window_days);
    let mut recent: Vec<&SamplingEvent> = samplings.iter().filter(|s| range.contains(s.date)).collect();
    recent.sort_by_key(|s| (s.date, s.sampling_id));

    let mut analysis = GrowthAnalysis {
        sampling_count: recent.len(),
        weight_gain_kg: None,
        growth_rate_kg_per_day: None,
        quality: GrowthQuality::Unknown,
    };

    if let (Some(first), Some(last)) = (recent.first(), recent.last()) {
        let days = (last.date - first.date).num_days();
        if recent.len() >= 2 && days > 0 {
            let gain = last.average_weight_kg - first.average_weight_kg;
            let rate = gain / days as f64;
            analysis.weight_gain_kg = Some(gain);
            analysis.growth_rate_kg_per_day = Some(rate);
            analysis.quality = GrowthQuality::from_rate(rate);
        }
    }

    analysis
}

// ==========================================
// 病害
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveDisease {
    pub disease_name: String,
    pub confidence_percent: f64,
    pub severity: DiseaseSeverity,
    pub is_applied: bool,
    pub treatment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalAnalysis {
    pub active_diseases: Vec<ActiveDisease>,
    /// 取最严重者
    pub severity: DiseaseSeverity,
    pub warnings: Vec<String>,
    pub feed_changes: Vec<String>,
}

/// 病害分析：窗口内的诊断记录
pub fn analyze_medical(diagnostics: &[MedicalDiagnostic], as_of: NaiveDate, window_days: i64) -> MedicalAnalysis {
    let range = DateRange::trailing_days(as_of, window_days);
    let mut recent: Vec<&MedicalDiagnostic> = diagnostics.iter().filter(|d| range.contains(d.diagnosed_on)).collect();
    recent.sort_by(|a, b| b.diagnosed_on.cmp(&a.diagnosed_on));

    let mut analysis = MedicalAnalysis {
        active_diseases: Vec::new(),
        severity: DiseaseSeverity::None,
        warnings: Vec::new(),
        feed_changes: Vec::new(),
    };

    for d in recent {
        let severity = DiseaseSeverity::from_confidence(d.confidence_percent);
        analysis.severity = analysis.severity.max(severity);

        analysis.warnings.push(match severity {
            DiseaseSeverity::High => format!("高置信度病害: {}，建议投喂量减半", d.disease_name),
            DiseaseSeverity::Medium => format!("中置信度病害: {}，建议减少约30%投喂", d.disease_name),
            _ => format!("疑似病害: {}，注意观察", d.disease_name),
        });

        let name = d.disease_name.to_lowercase();
        let change = if ["bacterial", "infection", "septicemia"].iter().any(|k| name.contains(k)) {
            Some("细菌性感染: 投喂药饵并提高饲料维生素C含量")
        } else if ["parasite", "worm", "gill"].iter().any(|k| name.contains(k)) {
            Some("寄生虫病: 驱虫期间减少投喂，避免残饵")
        } else if ["fungal", "mold"].iter().any(|k| name.contains(k)) {
            Some("真菌感染: 避免使用受潮霉变饲料")
        } else {
            None
        };
        if let Some(change) = change {
            if !analysis.feed_changes.iter().any(|c| c == change) {
                analysis.feed_changes.push(change.to_string());
            }
        }

        analysis.active_diseases.push(ActiveDisease {
            disease_name: d.disease_name.clone(),
            confidence_percent: d.confidence_percent,
            severity,
            is_applied: d.is_applied,
            treatment: d.recommended_treatment.clone(),
        });
    }

    analysis
}

// ==========================================
// 饲料历史
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedHistoryAnalysis {
    /// 近 7 天用量最多者，其次全窗口用量最多者
    pub preferred_feed_type_id: Option<i64>,
    pub avg_cost_per_kg: Option<f64>,
}

const RECENT_FEED_DAYS: i64 = 7;

/// 饲料历史：常用饲料与平均单价
pub fn analyze_feed_history(feeds: &[FeedEvent], as_of: NaiveDate, window_days: i64) -> FeedHistoryAnalysis {
    let window = DateRange::trailing_days(as_of, window_days);
    let recent = DateRange::trailing_days(as_of, RECENT_FEED_DAYS);

    // feed_type_id → (近7天用量, 窗口用量)
    let mut usage: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for f in feeds.iter().filter(|f| window.contains(f.date)) {
        if let Some(type_id) = f.feed_type_id {
            let entry = usage.entry(type_id).or_insert((0.0, 0.0));
            if recent.contains(f.date) {
                entry.0 += f.amount_kg;
            }
            entry.1 += f.amount_kg;
        }
    }

    let preferred_feed_type_id = usage
        .iter()
        .max_by(|a, b| {
            (a.1 .0, a.1 .1)
                .partial_cmp(&(b.1 .0, b.1 .1))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(id, _)| *id);

    let mean = |prices: Vec<f64>| (!prices.is_empty()).then(|| prices.iter().sum::<f64>() / prices.len() as f64);
    let priced = |filter_type: Option<i64>| -> Vec<f64> {
        feeds
            .iter()
            .filter(|f| window.contains(f.date))
            .filter(|f| filter_type.map_or(true, |t| f.feed_type_id == Some(t)))
            .filter_map(|f| f.effective_cost_per_kg())
            .collect()
    };

    let avg_cost_per_kg = preferred_feed_type_id
        .and_then(|t| mean(priced(Some(t))))
        .or_else(|| mean(priced(None)));

    FeedHistoryAnalysis {
        preferred_feed_type_id,
        avg_cost_per_kg,
    }
}
