// ==========================================
// 存活估算集成测试
// ==========================================
// 测试范围:
// 1. 死亡均重自动补齐（抽样优先，放养兜底）
// 2. 存活快照计算与同日覆盖
// 3. 截止日期过滤与整塘范围
// 4. 缺少放养基线
// ==========================================


use fish_farm_metrics::domain::events::{HarvestEvent, MortalityEvent};
use fish_farm_metrics::domain::types::MortalityTrend;
use fish_farm_metrics::logging;
use fish_farm_metrics::ApiError;
use test_helpers::{approx_eq, day, record_sampling, stock, PondFixture, OPERATOR};

#[test]
fn test_mortality_weight_filled_from_latest_sampling() {
    logging::init_test();
    println!("\n=== 测试：死亡均重取最近抽样 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));
    record_sampling(&state, &fixture, day(10), 50, 1.0);

    let mortality = MortalityEvent::new(fixture.pond_id, Some(fixture.species_id), day(12), 50, None)
        .expect("构造死亡记录失败");
    let stored = state
        .event_api
        .record_mortality(OPERATOR, mortality)
        .expect("录入死亡失败");

    assert!(stored.mortality_id > 0);
    assert!(approx_eq(stored.avg_weight_kg.unwrap(), 0.02), "均重应取抽样均重0.02kg");
    assert!(approx_eq(stored.total_weight_kg.unwrap(), 1.0), "死亡总重应为1.0kg");
}

#[test]
fn test_mortality_weight_falls_back_to_stocking() {
    logging::init_test();
    println!("\n=== 测试：无抽样时死亡均重取放养均重 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 20.0, day(0));

    // 死亡日期之后的抽样不参与补齐
    record_sampling(&state, &fixture, day(20), 50, 2.0);

    let mortality = MortalityEvent::new(fixture.pond_id, Some(fixture.species_id), day(5), 50, None)
        .expect("构造死亡记录失败")
        .with_cause("缺氧");
    let stored = state
        .event_api
        .record_mortality(OPERATOR, mortality)
        .expect("录入死亡失败");
    assert!(approx_eq(stored.avg_weight_kg.unwrap(), 0.02));
    assert!(approx_eq(stored.total_weight_kg.unwrap(), 1.0));

    // 显式均重保持不变
    let explicit = MortalityEvent::new(fixture.pond_id, Some(fixture.species_id), day(6), 10, Some(0.05))
        .expect("构造死亡记录失败");
    let stored = state
        .event_api
        .record_mortality(OPERATOR, explicit)
        .expect("录入死亡失败");
    assert!(approx_eq(stored.total_weight_kg.unwrap(), 0.5));

    // 未指定品种时不补齐
    let unscoped = MortalityEvent::new(fixture.pond_id, None, day(7), 3, None).expect("构造死亡记录失败");
    let stored = state
        .event_api
        .record_mortality(OPERATOR, unscoped)
        .expect("录入死亡失败");
    assert!(stored.avg_weight_kg.is_none());
    assert!(stored.total_weight_kg.is_none());
}

#[test]
fn test_estimate_population_snapshot() {
    logging::init_test();
    println!("\n=== 测试：存活快照 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    let mortality = MortalityEvent::new(fixture.pond_id, Some(fixture.species_id), day(5), 50, None)
        .expect("构造死亡记录失败");
    state
        .event_api
        .record_mortality(OPERATOR, mortality)
        .expect("录入死亡失败");
    let harvest = HarvestEvent::new(fixture.pond_id, Some(fixture.species_id), day(8), 10.0, Some(100), None)
        .expect("构造捕捞记录失败");
    state
        .event_api
        .record_harvest(OPERATOR, harvest)
        .expect("录入捕捞失败");
    record_sampling(&state, &fixture, day(10), 50, 1.0);

    let snapshot = state
        .population_api
        .estimate_population(OPERATOR, fixture.pond_id, Some(fixture.species_id), day(10))
        .expect("存活估算失败");

    assert_eq!(snapshot.initial_stocked, 1000);
    assert_eq!(snapshot.total_mortality, 50);
    assert_eq!(snapshot.total_harvested, 100);
    assert_eq!(snapshot.current_alive, 850);
    assert!(approx_eq(snapshot.survival_rate_percent, 85.0));
    assert!(approx_eq(snapshot.mortality_weight_kg, 0.5), "死亡重量按放养均重补齐");
    assert!(approx_eq(snapshot.harvested_weight_kg, 10.0));
    assert!(approx_eq(snapshot.average_weight_kg.unwrap(), 0.02));
    assert!(approx_eq(snapshot.total_survival_kg.unwrap(), 17.0));
    assert_eq!(snapshot.mortality_trend, MortalityTrend::High, "30天内死亡5%应判为偏高");

    // 同日重复估算覆盖旧快照
    state
        .population_api
        .estimate_population(OPERATOR, fixture.pond_id, Some(fixture.species_id), day(10))
        .expect("重复估算失败");
    let snapshots = state
        .population_api
        .list_snapshots(OPERATOR, fixture.pond_id)
        .expect("查询快照失败");
    assert_eq!(snapshots.len(), 1, "同日同范围只保留一份快照");
    assert_eq!(snapshots[0].current_alive, 850);
}

#[test]
fn test_snapshot_respects_as_of_and_pond_scope() {
    logging::init_test();
    println!("\n=== 测试：截止日期与整塘范围 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));
    let second = PondFixture {
        pond_id: fixture.pond_id,
        species_id: state
            .event_api
            .create_species("鲢鱼", Some("Hypophthalmichthys molitrix"), None)
            .expect("创建品种失败"),
    };
    stock(&state, &second, 500, 25.0, day(2));

    let harvest = HarvestEvent::new(fixture.pond_id, Some(fixture.species_id), day(8), 10.0, Some(100), None)
        .expect("构造捕捞记录失败");
    state
        .event_api
        .record_harvest(OPERATOR, harvest)
        .expect("录入捕捞失败");

    // 截止日期前的事件才计入
    let early = state
        .population_api
        .compute_snapshot(fixture.pond_id, Some(fixture.species_id), day(6))
        .expect("存活估算失败");
    assert_eq!(early.current_alive, 1000);
    assert!(approx_eq(early.average_weight_kg.unwrap(), 0.01), "无抽样时取放养均重");
    assert_eq!(early.mortality_trend, MortalityTrend::Low);

    // 整塘
    let pond_wide = state
        .population_api
        .estimate_population(OPERATOR, fixture.pond_id, None, day(10))
        .expect("整塘估算失败");
    assert_eq!(pond_wide.species_id, None);
    assert_eq!(pond_wide.initial_stocked, 1500);
    assert_eq!(pond_wide.current_alive, 1400);

    // 放养之前没有基线
    let err = state
        .population_api
        .estimate_population(OPERATOR, second.pond_id, Some(second.species_id), day(1))
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingBaselineData(_)), "应返回缺少基线: {:?}", err);
}
