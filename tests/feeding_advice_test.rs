// ==========================================
// 投喂建议集成测试
// ==========================================
// 测试范围:
// 1. 抽样数据 → 阶段表查找与基础投喂量
// 2. 无抽样时按放养估算（低置信度）
// 3. 环境调整限幅与病害调整叠加
// 4. 无存活鱼 / 批量生成跳过
// 5. 采纳建议与历史学习修正
// ==========================================


use fish_farm_metrics::domain::advice::AdjustmentBreakdown;
use fish_farm_metrics::domain::events::{MedicalDiagnostic, MortalityEvent, WaterQualityReading};
use fish_farm_metrics::domain::types::{Confidence, DataSource, WaterReadingSource};
use fish_farm_metrics::logging;
use fish_farm_metrics::ApiError;
use test_helpers::{approx_eq, day, record_sampling, stock, PondFixture, OPERATOR};

#[test]
fn test_half_gram_fish_use_starter_stage() {
    logging::init_test();
    println!("\n=== 测试：0.5g 鱼苗匹配开口料阶段 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 1.0, day(0));
    record_sampling(&state, &fixture, day(5), 100, 0.05);

    let advice = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, fixture.pond_id, Some(fixture.species_id), day(5))
        .expect("生成投喂建议失败");

    assert_eq!(advice.stage_name, "Starter (3000 pcs/kg)");
    assert!(approx_eq(advice.base_rate_percent, 28.0), "基础投喂率应为28%体重");
    assert_eq!(advice.feeding_frequency, 6);
    assert_eq!(advice.feeding_times.len(), 6);
    assert_eq!(advice.feeding_split.iter().map(|&p| p as u32).sum::<u32>(), 100);
    assert_eq!(advice.protein_percent, 40);

    // 无水质/病害/死亡数据，调整为 0
    match advice.adjustments {
        AdjustmentBreakdown::Additive(adj) => assert!(approx_eq(adj.total, 0.0)),
        other => panic!("抽样数据应使用加法调整: {:?}", other),
    }
    assert_eq!(advice.estimated_fish_count, 1000);
    assert!(approx_eq(advice.total_biomass_kg, 0.5));
    assert!(approx_eq(advice.recommended_feed_kg, 0.14), "0.5kg × 28% = 0.14kg");
    assert_eq!(advice.data_source, DataSource::SamplingBased);
    assert_eq!(advice.confidence, Confidence::Medium, "缺水质数据时置信度为中");
    assert!(!advice.is_applied);

    let listed = state
        .feeding_api
        .list_advice(OPERATOR, fixture.pond_id)
        .expect("查询建议失败");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].advice_id, advice.advice_id);
}

#[test]
fn test_stocking_based_fallback_without_sampling() {
    logging::init_test();
    println!("\n=== 测试：无抽样时按放养估算 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 5.0, day(0));

    // 未指定品种时取最近放养的品种
    let advice = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, fixture.pond_id, None, day(10))
        .expect("生成投喂建议失败");

    assert_eq!(advice.species_id, Some(fixture.species_id));
    assert_eq!(advice.data_source, DataSource::StockingBased);
    assert_eq!(advice.confidence, Confidence::Low);
    // 0.005kg + 10天 × 0.0001kg
    assert!(approx_eq(advice.average_fish_weight_kg, 0.006));
    assert!(approx_eq(advice.base_rate_percent, 5.0));
    assert_eq!(advice.feeding_frequency, 3);
    assert_eq!(advice.feeding_times, vec!["8:00", "12:30", "17:00"]);
    assert!(matches!(advice.adjustments, AdjustmentBreakdown::Multiplicative(_)));
    assert!(approx_eq(advice.recommended_feed_kg, 0.3), "6kg × 5% = 0.3kg");
}

#[test]
fn test_environment_clamp_and_medical_adjustment() {
    logging::init_test();
    println!("\n=== 测试：环境调整限幅，病害调整单独叠加 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));
    record_sampling(&state, &fixture, day(10), 50, 1.0);

    let reading = WaterQualityReading::new(fixture.pond_id, day(10), WaterReadingSource::DailyLog).with_temperature(14.0);
    state
        .event_api
        .record_water_quality(OPERATOR, reading)
        .expect("录入水质失败");
    let diagnostic = MedicalDiagnostic::new(fixture.pond_id, "Bacterial gill disease", 90.0, day(9))
        .expect("构造诊断失败")
        .with_treatment("药饵投喂5天");
    state
        .event_api
        .record_diagnostic(OPERATOR, diagnostic)
        .expect("录入诊断失败");

    let advice = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, fixture.pond_id, Some(fixture.species_id), day(10))
        .expect("生成投喂建议失败");

    let AdjustmentBreakdown::Additive(adj) = advice.adjustments else {
        panic!("抽样数据应使用加法调整");
    };
    assert!(approx_eq(adj.temperature, -50.0), "水温低于15°C调整-50");
    assert!(approx_eq(adj.environmental_total, -50.0), "环境合计限幅到-50");
    assert!(approx_eq(adj.medical, -50.0), "高置信度病害调整-50");
    assert!(approx_eq(adj.total, -100.0));
    assert!(approx_eq(advice.recommended_feed_kg, 0.0));
    assert_eq!(advice.water_temp_c, Some(14.0));
    assert!(!advice.medical_warnings.is_empty());
    assert!(!advice.notes.is_empty());
}

#[test]
fn test_no_live_fish_and_auto_generation() {
    logging::init_test();
    println!("\n=== 测试：无存活鱼与批量生成 ===");

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, day(0));
    let empty = PondFixture {
        pond_id: fixture.pond_id,
        species_id: state
            .event_api
            .create_species("草鱼", None, None)
            .expect("创建品种失败"),
    };
    stock(&state, &empty, 100, 5.0, day(1));
    let mortality = MortalityEvent::new(empty.pond_id, Some(empty.species_id), day(3), 100, None)
        .expect("构造死亡记录失败")
        .with_cause("disease outbreak");
    state
        .event_api
        .record_mortality(OPERATOR, mortality)
        .expect("录入死亡失败");

    let err = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, empty.pond_id, Some(empty.species_id), day(10))
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)), "无存活鱼应拒绝: {:?}", err);

    let report = state
        .feeding_api
        .auto_generate_advice(OPERATOR, fixture.pond_id, day(10))
        .expect("批量生成失败");
    assert_eq!(report.advices.len(), 1);
    assert_eq!(report.advices[0].species_id, Some(fixture.species_id));
    assert_eq!(report.stocking_based_species, vec![fixture.species_id]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].species_id, empty.species_id);

    // 未放养的池塘
    let bare = test_helpers::create_pond(&state, "空塘", "鲫鱼");
    let err = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, bare.pond_id, None, day(10))
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingBaselineData(_)), "无放养应返回缺少基线: {:?}", err);
}

#[test]
fn test_apply_advice_and_learning_adjustment() {
    logging::init_test();
    println!("\n=== 测试：采纳建议后的学习修正 ===");

    // 采纳时间取当前时间，学习只看采纳日之后的抽样
    let today = chrono::Local::now().date_naive();
    let offset = |days: i64| today + chrono::Duration::days(days);

    let (_temp, state) = test_helpers::create_test_state();
    let fixture = test_helpers::seed_stocked_pond(&state, 1000, 10.0, offset(-30));
    record_sampling(&state, &fixture, offset(-10), 100, 2.0);

    let first = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, fixture.pond_id, Some(fixture.species_id), today)
        .expect("生成投喂建议失败");
    assert!(first.learning.is_none(), "无采纳历史时不做学习修正");

    let applied = state
        .feeding_api
        .apply_advice(OPERATOR, &first.advice_id)
        .expect("采纳建议失败");
    assert!(applied.is_applied);
    let applied_at = applied.applied_at.expect("应记录采纳时间");

    // 重复采纳不改变首次采纳时间
    let again = state
        .feeding_api
        .apply_advice(OPERATOR, &first.advice_id)
        .expect("重复采纳失败");
    assert!(again.is_applied);
    let again_at = again.applied_at.expect("应保留采纳时间");
    assert!((again_at - applied_at).num_milliseconds().abs() < 1);

    // 采纳后日增重 0.02kg，高于期望基线的1.2倍
    record_sampling(&state, &fixture, offset(1), 100, 3.0);
    record_sampling(&state, &fixture, offset(11), 100, 23.0);

    // 按采纳当日生成时，之后的抽样尚不可知
    let same_day = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, fixture.pond_id, Some(fixture.species_id), today)
        .expect("生成投喂建议失败");
    assert!(same_day.learning.is_none(), "截止日之后的抽样不参与学习修正");

    let second = state
        .feeding_api
        .generate_feeding_advice(OPERATOR, fixture.pond_id, Some(fixture.species_id), offset(12))
        .expect("生成投喂建议失败");
    let learning = second.learning.expect("应有学习修正");
    assert_eq!(learning.advice_count, 1);
    assert!(approx_eq(learning.rate_factor, 1.1));
    assert!(approx_eq(learning.feed_factor, 1.05));
    assert!(approx_eq(
        second.recommended_feed_kg,
        second.base_feed_kg * second.adjustments.factor() * 1.05
    ));

    let err = state.feeding_api.apply_advice(OPERATOR, "missing-advice").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
