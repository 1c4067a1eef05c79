// ==========================================
// 生长链集成测试
// ==========================================
// 测试范围:
// 1. 抽样录入 → 生长计算（放养参照）
// 2. 补录早期抽样 → 后续抽样联动重算
// 3. 修改/删除抽样的联动
// 4. 重复抽样拒绝
// 5. 全量重算幂等，尾数变化刷新整条生长链
// 6. 池塘归属校验
// ==========================================


use fish_farm_metrics::domain::growth::{GrowthReference, GrowthStatus};
use fish_farm_metrics::domain::events::{HarvestEvent, MortalityEvent};
use fish_farm_metrics::logging;
use fish_farm_metrics::ApiError;
use test_helpers::{approx_eq, day, find_sampling, record_sampling, sampling, OPERATOR, OTHER_OPERATOR};

#[test]
fn test_sampling_growth_from_stocking_baseline() {
    logging::init_test();
    println!("\n=== 测试：以放养为参照计算日增重 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    let result = state
        .sampling_api
        .record_sampling(OPERATOR, sampling(&fixture, day(10), 50, 1.0))
        .expect("录入抽样失败");

    let growth = result.growth.expect("应返回生长结果");
    assert_eq!(growth.status, GrowthStatus::Computed);
    assert!(matches!(growth.reference, Some(GrowthReference::Stocking { .. })), "参照点应为放养");
    assert_eq!(growth.days_elapsed, Some(10));
    assert!(approx_eq(growth.growth_rate_kg_per_day.unwrap(), 0.001), "日增重应为0.001kg");
    assert_eq!(growth.estimated_fish_count, 1000);
    assert!(approx_eq(growth.biomass_difference_kg.unwrap(), 10.0), "生物量变化应为10kg");
    assert_eq!(result.cascaded_count, 0);

    // 派生值已回写
    let stored = find_sampling(&state, &fixture, day(10));
    assert!(approx_eq(stored.growth_rate_kg_per_day.unwrap(), 0.001));
    assert!(approx_eq(stored.condition_factor, 20.0));

    let biomass = state
        .sampling_api
        .biomass_analysis(OPERATOR, fixture.pond_id, Some(fixture.species_id))
        .expect("生物量汇总失败");
    assert!(approx_eq(biomass.current_biomass_kg, 20.0), "当前生物量 = 放养10kg + 变化10kg");
    assert!(approx_eq(biomass.total_gain_kg, 10.0));
    assert_eq!(biomass.sampling_count, 1);
}

#[test]
fn test_backdated_sampling_cascades_to_later_records() {
    logging::init_test();
    println!("\n=== 测试：补录早期抽样触发后续重算 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    let later = record_sampling(&state, &fixture, day(20), 50, 2.0);
    assert!(approx_eq(later.growth_rate_kg_per_day.unwrap(), 0.0015), "补录前以放养为参照");

    let result = state
        .sampling_api
        .record_sampling(OPERATOR, sampling(&fixture, day(10), 50, 1.0))
        .expect("补录抽样失败");
    assert_eq!(result.cascaded_count, 1, "应联动重算1条后续抽样");

    let later = find_sampling(&state, &fixture, day(20));
    assert!(approx_eq(later.growth_rate_kg_per_day.unwrap(), 0.002), "后续抽样应改用补录抽样为参照");
    assert!(approx_eq(later.biomass_difference_kg.unwrap(), 20.0));
}

#[test]
fn test_update_and_delete_sampling_cascade() {
    logging::init_test();
    println!("\n=== 测试：修改/删除抽样的联动 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    record_sampling(&state, &fixture, day(10), 50, 1.0);
    let middle = record_sampling(&state, &fixture, day(20), 50, 1.5);
    record_sampling(&state, &fixture, day(30), 50, 2.5);

    // 修改中间抽样: 均重 0.03 → 0.04
    let mut updated = sampling(&fixture, day(20), 50, 2.0);
    updated.sampling_id = middle.sampling_id;
    let result = state
        .sampling_api
        .update_sampling(OPERATOR, updated)
        .expect("修改抽样失败");
    assert!(approx_eq(result.growth.unwrap().growth_rate_kg_per_day.unwrap(), 0.002));
    assert_eq!(result.cascaded_count, 1);

    let last = find_sampling(&state, &fixture, day(30));
    assert!(approx_eq(last.growth_rate_kg_per_day.unwrap(), 0.001), "修改后末次抽样应重算");

    // 删除中间抽样，末次抽样改以第一次抽样为参照
    let cascaded = state
        .sampling_api
        .delete_sampling(OPERATOR, middle.sampling_id)
        .expect("删除抽样失败");
    assert_eq!(cascaded, 1);

    let last = find_sampling(&state, &fixture, day(30));
    assert!(approx_eq(last.growth_rate_kg_per_day.unwrap(), 0.0015), "删除后应跨过被删记录");

    // 不能把抽样挪到其他池塘
    let other_pond = state
        .event_api
        .create_pond(OPERATOR, "二号塘", None, None, None)
        .expect("创建池塘失败");
    let mut moved = sampling(&fixture, day(30), 50, 2.5);
    moved.sampling_id = last.sampling_id;
    moved.pond_id = other_pond.pond_id;
    let err = state.sampling_api.update_sampling(OPERATOR, moved).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)), "跨塘修改应被拒绝: {:?}", err);
}

#[test]
fn test_duplicate_sampling_rejected_before_computation() {
    logging::init_test();
    println!("\n=== 测试：同塘同品种同日重复抽样 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    record_sampling(&state, &fixture, day(10), 50, 1.0);
    let err = state
        .sampling_api
        .record_sampling(OPERATOR, sampling(&fixture, day(10), 40, 1.2))
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationConflict(_)), "应返回冲突错误: {:?}", err);

    let samplings = state
        .sampling_api
        .list_samplings(OPERATOR, fixture.pond_id, None, fish_farm_metrics::DateRange::all())
        .expect("查询抽样失败");
    assert_eq!(samplings.len(), 1, "重复抽样不应落库");
    assert!(approx_eq(samplings[0].average_weight_kg, 0.02), "原记录不应被覆盖");
}

#[test]
fn test_recalculate_all_is_idempotent() {
    logging::init_test();
    println!("\n=== 测试：全量重算幂等 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    record_sampling(&state, &fixture, day(10), 50, 1.0);
    record_sampling(&state, &fixture, day(20), 50, 2.0);

    // 补录死亡后整条生长链按900尾重算
    let mortality = MortalityEvent::new(fixture.pond_id, Some(fixture.species_id), day(15), 100, None)
        .expect("构造死亡记录失败");
    state
        .event_api
        .record_mortality(OPERATOR, mortality)
        .expect("录入死亡失败");
    let earlier = find_sampling(&state, &fixture, day(10));
    assert!(approx_eq(earlier.biomass_difference_kg.unwrap(), 9.0));
    let later = find_sampling(&state, &fixture, day(20));
    assert!(approx_eq(later.biomass_difference_kg.unwrap(), 18.0));

    let first = state
        .sampling_api
        .recalculate_all_growth_rates(OPERATOR, Some(fixture.pond_id))
        .expect("全量重算失败");
    assert_eq!(first.pond_count, 1);
    assert_eq!(first.sampling_count, 2);
    assert_eq!(first.changed_count, 0, "写入时已刷新，全量重算不应再有变化");

    let second = state
        .sampling_api
        .recalculate_all_growth_rates(OPERATOR, None)
        .expect("再次重算失败");
    assert_eq!(second.changed_count, 0, "再次重算不应产生变化");
}

#[test]
fn test_later_count_change_refreshes_earlier_samplings() {
    logging::init_test();
    println!("\n=== 测试：晚于抽样的尾数变化刷新早期抽样 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    record_sampling(&state, &fixture, day(10), 50, 1.0);
    let before = find_sampling(&state, &fixture, day(10));
    assert!(approx_eq(before.biomass_difference_kg.unwrap(), 10.0));

    // 抽样之后的死亡
    let mortality = MortalityEvent::new(fixture.pond_id, Some(fixture.species_id), day(20), 500, None)
        .expect("构造死亡记录失败");
    state
        .event_api
        .record_mortality(OPERATOR, mortality)
        .expect("录入死亡失败");
    let after_mortality = find_sampling(&state, &fixture, day(10));
    assert!(approx_eq(after_mortality.biomass_difference_kg.unwrap(), 5.0), "500尾 × 0.01kg");

    // 抽样之后的捕捞
    let harvest = HarvestEvent::new(fixture.pond_id, Some(fixture.species_id), day(25), 5.0, Some(250), None)
        .expect("构造捕捞记录失败");
    state
        .event_api
        .record_harvest(OPERATOR, harvest)
        .expect("录入捕捞失败");
    let earlier = find_sampling(&state, &fixture, day(10));
    assert!(approx_eq(earlier.biomass_difference_kg.unwrap(), 2.5), "250尾 × 0.01kg");
    assert!(approx_eq(earlier.growth_rate_kg_per_day.unwrap(), 0.001), "日增重不受尾数影响");

    let summary = state
        .sampling_api
        .recalculate_all_growth_rates(OPERATOR, Some(fixture.pond_id))
        .expect("全量重算失败");
    assert_eq!(summary.changed_count, 0);
}

#[test]
fn test_other_operator_cannot_access_pond() {
    logging::init_test();
    println!("\n=== 测试：池塘归属校验 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));

    let err = state
        .sampling_api
        .record_sampling(OTHER_OPERATOR, sampling(&fixture, day(10), 50, 1.0))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "非归属用户应视为池塘不存在: {:?}", err);

    let err = state.event_api.get_pond("  ", fixture.pond_id).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)), "空操作人应被拒绝: {:?}", err);

    assert!(state.event_api.list_ponds(OTHER_OPERATOR).unwrap().is_empty());
    assert_eq!(state.event_api.list_ponds(OPERATOR).unwrap().len(), 1);
}
