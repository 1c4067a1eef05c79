// ==========================================
// 生物量预测 / FCR 集成测试
// ==========================================
// 测试范围:
// 1. 目标不高于当前生物量时拒绝
// 2. 目标递增时天数与饲料量单调不减
// 3. 抽样 + 投喂数据的加权日增重与 FCR
// 4. 区间 FCR 报告
// 5. 引擎参数修改生效
// 6. 极大目标的天数截断
// ==========================================


use fish_farm_metrics::config::config_keys;
use fish_farm_metrics::domain::events::{FeedEvent, HarvestEvent};
use fish_farm_metrics::domain::projection::{FcrMethod, GrowthRateMethod};
use fish_farm_metrics::domain::types::{Confidence, DataSource, FcrStatus};
use fish_farm_metrics::engine::projection::MAX_ESTIMATED_DAYS;
use fish_farm_metrics::logging;
use fish_farm_metrics::{ApiError, DateRange};
use test_helpers::{approx_eq, day, record_sampling, PondFixture, OPERATOR};

fn record_feed(state: &fish_farm_metrics::app::AppState, fixture: &PondFixture, offset: i64, amount_kg: f64) {
    let feed = FeedEvent::new(fixture.pond_id, None, day(offset), amount_kg).expect("构造投喂记录失败");
    state.event_api.record_feed(OPERATOR, feed).expect("录入投喂失败");
}

#[test]
fn test_target_not_above_current_is_rejected() {
    logging::init_test();
    println!("\n=== 测试：目标低于当前生物量 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    for target in [5.0, 10.0] {
        let err = state
            .projection_api
            .project_to_target(OPERATOR, fixture.pond_id, fixture.species_id, target, day(5))
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)), "目标{}kg应被拒绝: {:?}", target, err);
    }

    let err = state
        .projection_api
        .project_to_target(OPERATOR, fixture.pond_id, fixture.species_id, 0.0, day(5))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_projection_is_monotonic_in_target() {
    logging::init_test();
    println!("\n=== 测试：目标递增时预测单调 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    let results: Vec<_> = [15.0, 30.0, 60.0, 120.0, 500.0]
        .iter()
        .map(|&target| {
            state
                .projection_api
                .project_to_target(OPERATOR, fixture.pond_id, fixture.species_id, target, day(5))
                .expect("预测失败")
        })
        .collect();

    for pair in results.windows(2) {
        assert!(pair[1].estimated_days >= pair[0].estimated_days, "天数不应减少");
        assert!(pair[1].estimated_feed_kg >= pair[0].estimated_feed_kg, "饲料量不应减少");
    }

    // 无抽样: 默认日增重 0.005kg × 1000尾，默认 FCR 1.5
    let first = &results[0];
    assert_eq!(first.growth_rate_method, GrowthRateMethod::Default);
    assert_eq!(first.fcr_method, FcrMethod::Default);
    assert_eq!(first.estimated_days, 1);
    assert!(approx_eq(first.estimated_feed_kg, 7.5));
    assert_eq!(first.data_source, DataSource::StockingBased);
    assert_eq!(first.confidence, Confidence::Low);
    assert_eq!(first.target_date, day(6));
}

#[test]
fn test_projection_with_sampling_and_feed_history() {
    logging::init_test();
    println!("\n=== 测试：基于抽样与投喂历史的预测 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    record_sampling(&state, &fixture, day(10), 50, 1.0);
    record_sampling(&state, &fixture, day(20), 50, 2.0);
    record_sampling(&state, &fixture, day(30), 50, 3.0);
    record_feed(&state, &fixture, 5, 15.0);
    record_feed(&state, &fixture, 15, 20.0);
    let priced = FeedEvent::new(fixture.pond_id, None, day(25), 30.0)
        .and_then(|f| f.with_kg_pricing(2.0))
        .expect("构造投喂记录失败");
    state.event_api.record_feed(OPERATOR, priced).expect("录入投喂失败");

    let result = state
        .projection_api
        .project_to_target(OPERATOR, fixture.pond_id, fixture.species_id, 100.0, day(30))
        .expect("预测失败");

    assert!(approx_eq(result.current_biomass_kg, 60.0), "10kg + 10 + 20 + 20");
    assert!(approx_eq(result.biomass_gap_kg, 40.0));
    assert_eq!(result.current_fish_count, 1000);
    assert_eq!(result.current_avg_weight_kg.map(|w| (w * 1000.0).round()), Some(60.0));

    // 近两段 0.002 × 0.7 + 全周期 (0.06-0.01)/30 × 0.3
    assert_eq!(result.growth_rate_method, GrowthRateMethod::Blended);
    assert!(approx_eq(result.growth_rate_kg_per_day, 0.0019));
    // 分段 FCR: 20/20 与 30/20
    assert_eq!(result.fcr_method, FcrMethod::WeightedPeriods);
    assert!(approx_eq(result.feed_conversion_ratio, 1.25));

    assert_eq!(result.estimated_days, 22);
    assert!(approx_eq(result.estimated_feed_kg, 50.0));
    assert!(approx_eq(result.estimated_feed_cost.unwrap(), 100.0));
    assert_eq!(result.data_source, DataSource::SamplingBased);
    assert_eq!(result.confidence, Confidence::High);
    assert!(!result.recommendations.is_empty());
}

#[test]
fn test_fcr_report() {
    logging::init_test();
    println!("\n=== 测试：区间 FCR 报告 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    record_sampling(&state, &fixture, day(10), 10, 1.0);

    let err = state
        .projection_api
        .fcr_analysis(OPERATOR, fixture.pond_id, fixture.species_id, DateRange::all())
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)), "单次抽样不足以计算FCR: {:?}", err);

    record_sampling(&state, &fixture, day(40), 10, 3.0);
    record_feed(&state, &fixture, 20, 180.0);
    record_feed(&state, &fixture, 50, 999.0);
    let harvest = HarvestEvent::new(fixture.pond_id, Some(fixture.species_id), day(43), 25.0, Some(100), None)
        .expect("构造捕捞记录失败");
    state
        .event_api
        .record_harvest(OPERATOR, harvest)
        .expect("录入捕捞失败");

    let report = state
        .projection_api
        .fcr_analysis(OPERATOR, fixture.pond_id, fixture.species_id, DateRange::all())
        .expect("FCR 分析失败");

    assert_eq!(report.start_date, day(10));
    assert_eq!(report.end_date, day(40));
    assert_eq!(report.days, 30);
    assert_eq!(report.estimated_fish_count, 900);
    assert!(approx_eq(report.total_weight_gain_kg, 180.0), "900尾 × 0.2kg");
    assert!(approx_eq(report.total_feed_kg, 180.0), "区间外的投喂不计入");
    assert!(approx_eq(report.fcr.unwrap(), 1.0));
    assert_eq!(report.status, Some(FcrStatus::Excellent));
    assert!(approx_eq(report.harvest_cross_check_avg_kg.unwrap(), 0.25));
}

#[test]
fn test_config_update_changes_projection() {
    logging::init_test();
    println!("\n=== 测试：修改默认 FCR ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    state
        .config_api
        .update_config(OPERATOR, config_keys::DEFAULT_FCR, "2.0")
        .expect("修改配置失败");
    let config = state.config_api.get_engine_config().expect("读取配置失败");
    assert!(approx_eq(config.default_fcr, 2.0));

    let snapshot = state.config_api.get_config_snapshot().expect("读取快照失败");
    assert_eq!(snapshot.get(config_keys::DEFAULT_FCR).map(String::as_str), Some("2.0"));

    let result = state
        .projection_api
        .project_to_target(OPERATOR, fixture.pond_id, fixture.species_id, 30.0, day(5))
        .expect("预测失败");
    assert!(approx_eq(result.feed_conversion_ratio, 2.0));
    assert!(approx_eq(result.estimated_feed_kg, 40.0));

    let err = state
        .config_api
        .update_config(OPERATOR, "unknown/key", "1")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_huge_target_caps_estimated_days() {
    logging::init_test();
    println!("\n=== 测试：极大目标按上限截断天数 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1, 0.01, day(0));

    let result = state
        .projection_api
        .project_to_target(OPERATOR, fixture.pond_id, fixture.species_id, 1.0e15, day(5))
        .expect("预测失败");
    assert_eq!(result.estimated_days, MAX_ESTIMATED_DAYS);
    assert_eq!(result.target_date, day(5) + chrono::Duration::days(MAX_ESTIMATED_DAYS));
    assert!(result.daily_feed_kg.is_finite());
    assert!(result.warnings.iter().any(|w| w.contains("截断")));

    let err = state
        .projection_api
        .project_to_target(OPERATOR, fixture.pond_id, fixture.species_id, f64::INFINITY, day(5))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)), "非有限目标应被拒绝: {:?}", err);
}
