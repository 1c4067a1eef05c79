// ==========================================
// 鱼塘养殖管理系统 - 命令行入口
// ==========================================
// 用法:
//   fish-farm-metrics init
//   fish-farm-metrics survival <pond_id> [species_id]
//   fish-farm-metrics advice <pond_id> [species_id]
//   fish-farm-metrics project <pond_id> <species_id> <target_kg>
//   fish-farm-metrics recalc [pond_id]
//   fish-farm-metrics fcr <pond_id> <species_id>
// 环境变量: FISH_FARM_DB_PATH / FISH_FARM_OPERATOR（默认 admin）
// 输出: JSON（stdout），日志走 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use fish_farm_metrics::app::{get_default_db_path, AppState};
use fish_farm_metrics::domain::types::DateRange;
use fish_farm_metrics::logging;
use serde::Serialize;

const USAGE: &str = "用法: fish-farm-metrics <init|survival|advice|project|recalc|fcr> [参数...]";

fn parse_id(arg: Option<&String>, name: &str) -> Result<i64> {
    let raw = arg.ok_or_else(|| anyhow!("缺少参数 {}\n{}", name, USAGE))?;
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("参数 {} 不是有效整数: {}", name, raw))
}

fn parse_optional_id(arg: Option<&String>, name: &str) -> Result<Option<i64>> {
    arg.map(|_| parse_id(arg, name)).transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    let operator = std::env::var("FISH_FARM_OPERATOR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "admin".to_string());
    let today = chrono::Local::now().date_naive();

    let db_path = get_default_db_path();
    tracing::info!(
        version = fish_farm_metrics::VERSION,
        db_path = %db_path,
        operator = %operator,
        "{}",
        fish_farm_metrics::APP_NAME
    );
    let state = AppState::new(db_path.clone()).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "init" => print_json(&serde_json::json!({ "db_path": db_path, "status": "ready" })),
        "survival" => {
            let pond_id = parse_id(args.get(1), "pond_id")?;
            let species_id = parse_optional_id(args.get(2), "species_id")?;
            let snapshot = state
                .population_api
                .estimate_population(&operator, pond_id, species_id, today)?;
            print_json(&snapshot)
        }
        "advice" => {
            let pond_id = parse_id(args.get(1), "pond_id")?;
            let species_id = parse_optional_id(args.get(2), "species_id")?;
            let advice = state
                .feeding_api
                .generate_feeding_advice(&operator, pond_id, species_id, today)?;
            print_json(&advice)
        }
        "project" => {
            let pond_id = parse_id(args.get(1), "pond_id")?;
            let species_id = parse_id(args.get(2), "species_id")?;
            let target: f64 = args
                .get(3)
                .ok_or_else(|| anyhow!("缺少参数 target_kg\n{}", USAGE))?
                .trim()
                .parse()
                .context("参数 target_kg 不是有效数字")?;
            let result = state
                .projection_api
                .project_to_target(&operator, pond_id, species_id, target, today)?;
            print_json(&result)
        }
        "recalc" => {
            let pond_id = parse_optional_id(args.get(1), "pond_id")?;
            let summary = state
                .sampling_api
                .recalculate_all_growth_rates(&operator, pond_id)?;
            print_json(&summary)
        }
        "fcr" => {
            let pond_id = parse_id(args.get(1), "pond_id")?;
            let species_id = parse_id(args.get(2), "species_id")?;
            let report = state
                .projection_api
                .fcr_analysis(&operator, pond_id, species_id, DateRange::all())?;
            print_json(&report)
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }
}
