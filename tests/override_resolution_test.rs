// ==========================================
// 分层覆写集成测试
// ==========================================
// 测试目标: 验证 用户自定义 > 产品 > 分类 > 内置默认 的优先级
// 覆盖范围: 数值参数、损耗率表、制法、替代规则、JSON 快照
// ==========================================

mod helpers;

use bake_convert::config::{config_keys, LossRateTable, MethodProfile, OverrideBundle, OverrideLayer};
use bake_convert::domain::substitution::{RuleSource, SubstitutionRule};
use bake_convert::domain::types::{ProcessStage, QualityImpact};
use bake_convert::domain::yield_loss::ProcessStageSelection;
use bake_convert::engine::{EnvironmentAdjustor, SubstitutionResolver, YieldLossChain};
use bake_convert::error::ConfigError;
use std::collections::BTreeMap;

#[test]
fn test_numeric_precedence() {
    let bundle = OverrideBundle::with_builtin_defaults()
        .with_number(OverrideLayer::Category, config_keys::FERMENTATION_BASE_TEMP_C, 25.0)
        .with_number(OverrideLayer::Product, config_keys::FERMENTATION_BASE_TEMP_C, 24.0);

    let resolved = bundle.number(config_keys::FERMENTATION_BASE_TEMP_C).unwrap();
    assert_eq!(resolved.value, 24.0);
    assert_eq!(resolved.layer, OverrideLayer::Product);

    let bundle = bundle.with_number(OverrideLayer::UserCustom, config_keys::FERMENTATION_BASE_TEMP_C, 23.0);
    assert_eq!(EnvironmentAdjustor::from_bundle(&bundle).base_temp_c(), 23.0);

    let untouched = bundle.number(config_keys::FRICTION_STAND).unwrap();
    assert_eq!(untouched.layer, OverrideLayer::BuiltinDefault);
}

#[test]
fn test_missing_numeric_value_falls_back_with_warning() {
    let bundle = OverrideBundle::new();
    let mut issues = Vec::new();
    let value = bundle.number_or(config_keys::DDT_TAP_WATER_TEMP_C, 20.0, &mut issues);
    assert_eq!(value, 20.0);
    assert_eq!(issues.len(), 1);
}

#[test]
fn test_loss_rate_table_layers() {
    let table = LossRateTable::builtin()
        .with_product("baguette", BTreeMap::from([(ProcessStage::Baking, 18.0)]))
        .with_custom(ProcessStage::Cooling, 3.0);

    let resolved = table.resolve(Some("bread"), Some("baguette"));
    assert!(!resolved.has_warnings());
    let rates = resolved.value;
    assert_eq!(rates.rates.baking, 18.0);
    assert_eq!(rates.sources[&ProcessStage::Baking], OverrideLayer::Product);
    assert_eq!(rates.rates.cooling, 3.0);
    assert_eq!(rates.sources[&ProcessStage::Cooling], OverrideLayer::UserCustom);
    // bread 分类层列出了全部阶段
    assert_eq!(rates.sources[&ProcessStage::Mixing], OverrideLayer::Category);
}

#[test]
fn test_unknown_category_falls_back_to_builtin() {
    let table = LossRateTable::builtin();
    let resolved = table.resolve(Some("pizza"), None);
    assert_eq!(resolved.issues.len(), 1);
    assert_eq!(resolved.value.rates.baking, 12.0);

    let chain = YieldLossChain::new();
    let reverse = chain.reverse_with_table(800.0, &table, Some("pizza"), None, &ProcessStageSelection::all());
    assert!((reverse.value.required_input - 980.50).abs() < 0.01);
    assert_eq!(reverse.issues.len(), 1);
}

#[test]
fn test_method_override_replaces_builtin() {
    let bundle = OverrideBundle::with_builtin_defaults().with_method(
        OverrideLayer::UserCustom,
        MethodProfile::new("poolish", "波兰种（家用）")
            .with_split(0.2, 1.0, 0.7)
            .with_fermentation_minutes(100.0),
    );
    let method = bundle.method("poolish").unwrap();
    assert_eq!(method.layer, OverrideLayer::UserCustom);
    assert_eq!(method.value.flour_ratio, Some(0.2));
}

#[test]
fn test_user_substitution_rules_are_additive() {
    let bundle = OverrideBundle::with_builtin_defaults().with_substitution(
        OverrideLayer::UserCustom,
        SubstitutionRule::new("milk", "oat_milk", 1.0, QualityImpact::Minor).with_notes("植物奶"),
    );
    let rules = SubstitutionResolver::new().resolve("Milk", &bundle);
    // 内置 豆奶/杏仁奶/燕麦奶 + 用户规则
    assert_eq!(rules.len(), 4);
    assert_eq!(rules[0].source, RuleSource::BuiltIn);
    assert_eq!(rules[3].source, RuleSource::User);
}

#[test]
fn test_json_snapshot_round_trip() {
    let bundle = OverrideBundle::with_builtin_defaults()
        .with_number(OverrideLayer::UserCustom, config_keys::HUMIDITY_ADJUST_PCT, 3.0)
        .with_loss_rates(LossRateTable::builtin().with_custom(ProcessStage::Baking, 11.0));

    let json = bundle.to_json_string().unwrap();
    let restored = OverrideBundle::from_json_str(&json).unwrap();
    let adjust = restored.number(config_keys::HUMIDITY_ADJUST_PCT).unwrap();
    assert_eq!(adjust.value, 3.0);
    assert_eq!(adjust.layer, OverrideLayer::UserCustom);
    assert_eq!(restored.loss_rates.custom.get(&ProcessStage::Baking), Some(&11.0));
    assert_eq!(restored.methods.keys(), bundle.methods.keys());
    assert_eq!(
        SubstitutionResolver::new().resolve("butter", &restored).len(),
        SubstitutionResolver::new().resolve("butter", &bundle).len()
    );
}

#[test]
fn test_json_snapshot_validation() {
    let bad = OverrideBundle::new().with_number(OverrideLayer::UserCustom, config_keys::PAN_LOAF_TAPER_RATIO, 1.5);
    let json = bad.to_json_string().unwrap();
    match OverrideBundle::from_json_str(&json) {
        Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, config_keys::PAN_LOAF_TAPER_RATIO),
        other => panic!("unexpected: {:?}", other),
    }

    assert!(matches!(OverrideBundle::from_json_str("{not json"), Err(ConfigError::Json(_))));
}
