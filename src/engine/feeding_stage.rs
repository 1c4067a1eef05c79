// ==========================================
// 鱼塘养殖管理系统 - 投喂阶段表
// ==========================================
// 职责: 均重（克）→ 投喂方案 的静态查找表
// 约束: 区间覆盖 [0, ∞)，相邻区间首尾相接，构造时校验
// 查找: 顺序扫描，取第一个满足 weight_g <= upper_g 的区间
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use serde::Serialize;
use std::sync::OnceLock;

/// 单个投喂阶段
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedingStage {
    /// 阶段名，如 "Starter (3000 pcs/kg)"
    pub name: String,
    /// 区间下界（克，不含；首个区间含 0）
    pub lower_g: f64,
    /// 区间上界（克，含）
    pub upper_g: f64,
    /// 日投喂率（% 体重/天）
    pub percent_bw_per_day: f64,
    pub protein_percent: u8,
    pub pellet_size: &'static str,
    /// 标称每公斤尾数
    pub pcs_per_kg: f64,
    pub feeding_frequency: u32,
    pub feeding_times: &'static [&'static str],
    /// 各次投喂占比（%），与 feeding_times 一一对应
    pub feeding_split: &'static [u8],
}

impl FeedingStage {
    /// 该区间是否包含给定均重
    pub fn contains(&self, weight_g: f64) -> bool {
        let above_lower = if self.lower_g == 0.0 {
            weight_g >= 0.0
        } else {
            weight_g > self.lower_g
        };
        above_lower && weight_g <= self.upper_g
    }

    /// 文字版投喂时间，如 "8:00 / 12:30 / 17:00"
    pub fn schedule_text(&self) -> String {
        self.feeding_times.join(" / ")
    }
}

/// 投喂阶段表
#[derive(Debug, Clone)]
pub struct FeedingStageTable {
    stages: Vec<FeedingStage>,
}

impl FeedingStageTable {
    /// 构造并校验阶段表
    ///
    /// # 校验项
    /// - 非空，首区间下界为 0，末区间上界为 ∞
    /// - 每个区间下界等于上一区间上界，且上界大于下界
    /// - 投喂时间数 = 投喂次数 = 占比项数，占比合计 100
    pub fn try_new(stages: Vec<FeedingStage>) -> EngineResult<Self> {
        let first = stages
            .first()
            .ok_or_else(|| EngineError::StageTable("阶段表为空".to_string()))?;
        if first.lower_g != 0.0 {
            return Err(EngineError::StageTable(format!(
                "首区间下界应为0，实际为{}",
                first.lower_g
            )));
        }

        for (idx, stage) in stages.iter().enumerate() {
            if stage.upper_g <= stage.lower_g {
                return Err(EngineError::StageTable(format!(
                    "{}: 上界{}不大于下界{}",
                    stage.name, stage.upper_g, stage.lower_g
                )));
            }
            if idx > 0 && stage.lower_g != stages[idx - 1].upper_g {
                return Err(EngineError::StageTable(format!(
                    "{}: 下界{}与上一区间上界{}不相接",
                    stage.name,
                    stage.lower_g,
                    stages[idx - 1].upper_g
                )));
            }
            let split_total: u32 = stage.feeding_split.iter().map(|&p| p as u32).sum();
            if stage.feeding_times.len() != stage.feeding_frequency as usize
                || stage.feeding_split.len() != stage.feeding_frequency as usize
                || split_total != 100
            {
                return Err(EngineError::StageTable(format!(
                    "{}: 投喂次数/时间/占比不一致",
                    stage.name
                )));
            }
        }

        if stages.last().map_or(true, |s| s.upper_g != f64::INFINITY) {
            return Err(EngineError::StageTable("末区间上界应为无穷大".to_string()));
        }

        Ok(Self { stages })
    }

    /// 内置标准阶段表（首次使用时构造并校验）
    pub fn standard() -> &'static FeedingStageTable {
        static TABLE: OnceLock<FeedingStageTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            FeedingStageTable::try_new(standard_stages()).expect("内置投喂阶段表校验失败")
        })
    }

    /// 按均重（克）查找投喂阶段，任何输入都有结果
    pub fn lookup(&self, weight_g: f64) -> &FeedingStage {
        let w = if weight_g.is_nan() { 0.0 } else { weight_g.max(0.0) };
        let idx = self
            .stages
            .iter()
            .position(|stage| w <= stage.upper_g)
            .unwrap_or(self.stages.len() - 1);
        &self.stages[idx]
    }

    pub fn stages(&self) -> &[FeedingStage] {
        &self.stages
    }
}

const STARTER_TIMES: &[&str] = &["7:30", "9:30", "11:30", "13:30", "15:30", "17:30"];
const STARTER_SPLIT: &[u8] = &[20, 20, 15, 15, 15, 15];
const NURSERY1_TIMES: &[&str] = &["7:30", "10:00", "12:30", "15:00", "17:30"];
const NURSERY1_SPLIT: &[u8] = &[25, 20, 20, 20, 15];
const NURSERY2_TIMES: &[&str] = &["8:00", "11:00", "14:00", "17:00"];
const GROWER1_TIMES: &[&str] = &["8:00", "11:00", "14:30", "17:30"];
const FOUR_MEAL_SPLIT: &[u8] = &[30, 25, 25, 20];
const THREE_MEAL_TIMES: &[&str] = &["8:00", "12:30", "17:00"];
const THREE_MEAL_SPLIT: &[u8] = &[40, 30, 30];
const TWO_MEAL_TIMES: &[&str] = &["8:30", "16:30"];
const TWO_MEAL_SPLIT: &[u8] = &[60, 40];

/// 标准阶段数据
///
/// 区间上界取本规格的标称均重（1000 / pcs_per_kg 克，取整到常用刻度），
/// 首个开口料区间放宽到 0.5 g。
fn standard_stages() -> Vec<FeedingStage> {
    // (阶段, 标称尾数/kg, 上界g, %BW, 蛋白%, 颗粒, 次数, 时间, 占比)
    type Row = (
        &'static str,
        f64,
        f64,
        f64,
        u8,
        &'static str,
        u32,
        &'static [&'static str],
        &'static [u8],
    );
    const INF: f64 = f64::INFINITY;
    let rows: [Row; 29] = [
        ("Starter", 3000.0, 0.5, 28.0, 40, "0.5-0.8 mm", 6, STARTER_TIMES, STARTER_SPLIT),
        ("Starter", 1500.0, 0.67, 24.0, 40, "0.5-0.8 mm", 6, STARTER_TIMES, STARTER_SPLIT),
        ("Starter", 1000.0, 1.0, 20.0, 40, "0.5-0.8 mm", 6, STARTER_TIMES, STARTER_SPLIT),
        ("Nursery-1", 500.0, 2.0, 18.0, 38, "0.8-1.2 mm", 5, NURSERY1_TIMES, NURSERY1_SPLIT),
        ("Nursery-1", 200.0, 5.0, 14.0, 38, "0.8-1.2 mm", 5, NURSERY1_TIMES, NURSERY1_SPLIT),
        ("Nursery-2", 150.0, 6.7, 11.0, 36, "1.2-1.5 mm", 4, NURSERY2_TIMES, FOUR_MEAL_SPLIT),
        ("Nursery-2", 100.0, 10.0, 9.0, 36, "1.2-1.5 mm", 4, NURSERY2_TIMES, FOUR_MEAL_SPLIT),
        ("Grower-1", 80.0, 12.5, 7.0, 34, "1.5-2.0 mm", 4, GROWER1_TIMES, FOUR_MEAL_SPLIT),
        ("Grower-1", 40.0, 25.0, 5.5, 34, "1.5-2.0 mm", 4, GROWER1_TIMES, FOUR_MEAL_SPLIT),
        ("Grower-2", 30.0, 33.0, 4.8, 32, "2.0-2.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-2", 20.0, 50.0, 3.8, 32, "2.0-2.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-3", 15.0, 67.0, 3.6, 30, "2.5-3.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-3", 10.0, 100.0, 2.8, 30, "2.5-3.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-4", 8.0, 125.0, 2.6, 30, "3.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-4", 6.0, 167.0, 2.2, 30, "3.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-5", 5.0, 200.0, 2.1, 30, "3.0-3.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-5", 4.0, 250.0, 1.9, 30, "3.0-3.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-6", 3.3, 300.0, 1.9, 30, "3.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-6", 3.0, 333.0, 1.7, 30, "3.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-7", 2.5, 400.0, 1.7, 30, "3.5-4.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-7", 2.0, 500.0, 1.5, 30, "3.5-4.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-8", 1.7, 600.0, 1.5, 30, "4.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-8", 1.5, 667.0, 1.3, 30, "4.0 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-9", 1.25, 800.0, 1.3, 30, "4.0-4.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Grower-9", 1.0, 1000.0, 1.1, 30, "4.0-4.5 mm", 3, THREE_MEAL_TIMES, THREE_MEAL_SPLIT),
        ("Finisher-1", 0.8, 1250.0, 1.1, 28, "4.5-5.0 mm", 2, TWO_MEAL_TIMES, TWO_MEAL_SPLIT),
        ("Finisher-1", 0.67, 1500.0, 1.0, 28, "4.5-5.0 mm", 2, TWO_MEAL_TIMES, TWO_MEAL_SPLIT),
        ("Finisher-2", 0.57, 1750.0, 1.0, 26, "5.0 mm", 2, TWO_MEAL_TIMES, TWO_MEAL_SPLIT),
        ("Finisher-2", 0.5, INF, 0.9, 26, "5.0 mm", 2, TWO_MEAL_TIMES, TWO_MEAL_SPLIT),
    ];

    let mut lower_g = 0.0;
    rows.iter()
        .map(|&(stage, pcs_per_kg, upper_g, rate, protein, pellet, freq, times, split)| {
            let entry = FeedingStage {
                name: format!("{} ({} pcs/kg)", stage, pcs_per_kg),
                lower_g,
                upper_g,
                percent_bw_per_day: rate,
                protein_percent: protein,
                pellet_size: pellet,
                pcs_per_kg,
                feeding_frequency: freq,
                feeding_times: times,
                feeding_split: split,
            };
            lower_g = upper_g;
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid() {
        let table = FeedingStageTable::standard();
        assert_eq!(table.stages().len(), 29);
        assert_eq!(table.stages()[0].lower_g, 0.0);
        assert!(table.stages().last().unwrap().upper_g.is_infinite());
    }

    #[test]
    fn test_lookup_starter_for_half_gram() {
        let stage = FeedingStageTable::standard().lookup(0.5);
        assert_eq!(stage.name, "Starter (3000 pcs/kg)");
        assert_eq!(stage.percent_bw_per_day, 28.0);
        assert_eq!(stage.feeding_frequency, 6);
    }

    #[test]
    fn test_lookup_boundaries() {
        let table = FeedingStageTable::standard();
        // 上界属于本区间
        assert_eq!(table.lookup(0.5).name, "Starter (3000 pcs/kg)");
        assert_eq!(table.lookup(0.51).name, "Starter (1500 pcs/kg)");
        assert_eq!(table.lookup(2.0).name, "Nursery-1 (500 pcs/kg)");
        assert_eq!(table.lookup(2.0001).name, "Nursery-1 (200 pcs/kg)");
        assert_eq!(table.lookup(1750.0).name, "Finisher-2 (0.57 pcs/kg)");
        assert_eq!(table.lookup(1750.01).name, "Finisher-2 (0.5 pcs/kg)");
        assert_eq!(table.lookup(5000.0).name, "Finisher-2 (0.5 pcs/kg)");
        assert_eq!(table.lookup(-3.0).name, "Starter (3000 pcs/kg)");
        assert_eq!(table.lookup(f64::NAN).name, "Starter (3000 pcs/kg)");
    }

    #[test]
    fn test_band_cut_points_and_rates() {
        let table = FeedingStageTable::standard();
        // (上界g, 阶段, %BW)
        let cases = [
            (0.67, "Starter (1500 pcs/kg)", 24.0),
            (1.0, "Starter (1000 pcs/kg)", 20.0),
            (5.0, "Nursery-1 (200 pcs/kg)", 14.0),
            (6.7, "Nursery-2 (150 pcs/kg)", 11.0),
            (10.0, "Nursery-2 (100 pcs/kg)", 9.0),
            (12.5, "Grower-1 (80 pcs/kg)", 7.0),
            (25.0, "Grower-1 (40 pcs/kg)", 5.5),
            (33.0, "Grower-2 (30 pcs/kg)", 4.8),
            (100.0, "Grower-3 (10 pcs/kg)", 2.8),
            (333.0, "Grower-6 (3 pcs/kg)", 1.7),
            (1000.0, "Grower-9 (1 pcs/kg)", 1.1),
            (1500.0, "Finisher-1 (0.67 pcs/kg)", 1.0),
        ];
        for (upper_g, name, rate) in cases {
            let stage = table.lookup(upper_g);
            assert_eq!(stage.name, name, "{}g", upper_g);
            assert_eq!(stage.percent_bw_per_day, rate);
            assert_ne!(table.lookup(upper_g + 0.001).name, name, "{}g 之后应进入下一区间", upper_g);
        }

        assert_eq!(table.lookup(10.0).percent_bw_per_day, 9.0);
        assert_eq!(table.lookup(20.0).name, "Grower-1 (40 pcs/kg)");
        assert_eq!(table.lookup(20.0).percent_bw_per_day, 5.5);
    }

    #[test]
    fn test_every_weight_matches_exactly_one_band() {
        let table = FeedingStageTable::standard();
        let mut w = 0.0;
        while w < 3000.0 {
            let matches = table.stages().iter().filter(|s| s.contains(w)).count();
            assert_eq!(matches, 1, "weight {}g matched {} bands", w, matches);
            assert!(table.lookup(w).contains(w));
            w += 0.37;
        }
        for stage in table.stages() {
            if stage.upper_g.is_finite() {
                let matches = table.stages().iter().filter(|s| s.contains(stage.upper_g)).count();
                assert_eq!(matches, 1);
            }
        }
    }

    #[test]
    fn test_rejects_gap() {
        let mut stages = standard_stages();
        stages[3].lower_g += 0.5;
        assert!(matches!(
            FeedingStageTable::try_new(stages),
            Err(EngineError::StageTable(_))
        ));
    }

    #[test]
    fn test_rejects_bad_split() {
        let mut stages = standard_stages();
        stages[0].feeding_split = THREE_MEAL_SPLIT;
        assert!(FeedingStageTable::try_new(stages).is_err());
    }
}
