// ==========================================
// 配方换算引擎 - 内置默认值
// ==========================================
// 职责: 内置默认层的数据（损耗率、摩擦升温、制法、替代规则、装模参数）
// 说明: 数值为常见烘焙经验值，用户/产品/分类层可逐项覆写
// ==========================================

use crate::config::method_profile::MethodProfile;
use crate::config::override_bundle::config_keys;
use crate::config::panning_profile::PanningProfile;
use crate::domain::types::{IngredientCategory, ProcessStage, QualityImpact};
use crate::domain::substitution::SubstitutionRule;
use crate::domain::yield_loss::StageLossRates;
use std::collections::BTreeMap;

/// 数值型配置项默认值
pub fn builtin_numeric() -> Vec<(&'static str, f64)> {
    vec![
        // 烤模
        (config_keys::PAN_LOAF_TAPER_RATIO, 0.85),
        // 发酵 Q10 模型
        (config_keys::FERMENTATION_BASE_TEMP_C, 26.0),
        (config_keys::FERMENTATION_HALVING_STEP_C, 10.0),
        // 面温计算
        (config_keys::DDT_TEMP_FACTOR_COUNT, 3.0),
        (config_keys::DDT_WATER_TEMP_MIN_C, 0.0),
        (config_keys::DDT_WATER_TEMP_MAX_C, 100.0),
        (config_keys::DDT_TAP_WATER_TEMP_C, 20.0),
        // 搅拌摩擦升温
        (config_keys::FRICTION_HAND, 0.0),
        (config_keys::FRICTION_STAND, 24.0),
        (config_keys::FRICTION_SPIRAL, 22.0),
        (config_keys::FRICTION_PLANETARY, 26.0),
        (config_keys::FRICTION_INTENSIVE, 30.0),
        // 湿度
        (config_keys::HUMIDITY_LOW_PCT, 40.0),
        (config_keys::HUMIDITY_HIGH_PCT, 70.0),
        (config_keys::HUMIDITY_ADJUST_PCT, 2.0),
        // 出成
        (config_keys::YIELD_HIGH_LOSS_TIP_PCT, 20.0),
        (config_keys::YIELD_ENVIRONMENT_ADJUSTMENT, 1.0),
    ]
}

/// 默认六阶段损耗率（面包类，与 bread 分类相同）
pub fn builtin_loss_rates() -> StageLossRates {
    stage_rates([2.0, 1.0, 1.5, 1.0, 12.0, 2.0])
}

/// 分类层损耗率（mixing, fermentation, dividing, shaping, baking, cooling）
pub fn builtin_category_loss_rates() -> Vec<(&'static str, BTreeMap<ProcessStage, f64>)> {
    [
        ("bread", [2.0, 1.0, 1.5, 1.0, 12.0, 2.0]),
        ("cake", [3.0, 0.0, 0.0, 0.0, 15.0, 1.5]),
        ("pastry", [1.5, 0.5, 2.0, 2.0, 18.0, 1.0]),
        ("cookie", [2.5, 0.0, 1.0, 1.5, 8.0, 0.5]),
        ("other", [2.0, 0.5, 1.0, 1.0, 12.0, 1.5]),
    ]
    .into_iter()
    .map(|(category, rates)| (category, ProcessStage::ALL.into_iter().zip(rates).collect()))
    .collect()
}

/// 产品层损耗率（只列出与分类不同的阶段）
pub fn builtin_product_loss_rates() -> Vec<(&'static str, BTreeMap<ProcessStage, f64>)> {
    use ProcessStage::{Baking, Fermentation, Mixing, Shaping};
    vec![
        // 面包
        ("pullman", BTreeMap::from([(Baking, 10.0)])),
        ("mountain", BTreeMap::from([(Baking, 13.0)])),
        ("brioche", BTreeMap::from([(Baking, 11.0), (Mixing, 3.0)])),
        ("baguette", BTreeMap::from([(Baking, 18.0), (Shaping, 1.5)])),
        ("ciabatta", BTreeMap::from([(Baking, 16.0), (Mixing, 3.0)])),
        ("sourdough", BTreeMap::from([(Baking, 15.0), (Fermentation, 2.0)])),
        // 蛋糕
        ("genoise", BTreeMap::from([(Baking, 14.0), (Mixing, 4.0)])),
        ("chiffon", BTreeMap::from([(Baking, 13.0), (Mixing, 3.5)])),
        ("pound", BTreeMap::from([(Baking, 10.0), (Mixing, 3.0)])),
        ("brownie", BTreeMap::from([(Baking, 8.0)])),
        ("cheesecake", BTreeMap::from([(Baking, 5.0)])),
        // 起酥
        ("croissant", BTreeMap::from([(Baking, 20.0), (Shaping, 3.0)])),
        ("danish", BTreeMap::from([(Baking, 18.0), (Shaping, 2.5)])),
        ("puff_pastry", BTreeMap::from([(Baking, 22.0)])),
        // 其他
        ("cookie", BTreeMap::from([(Baking, 8.0)])),
        ("scone", BTreeMap::from([(Baking, 12.0)])),
        ("tart", BTreeMap::from([(Baking, 10.0), (Shaping, 2.0)])),
    ]
}

fn stage_rates(rates: [f64; 6]) -> StageLossRates {
    let mut stage_rates = StageLossRates::default();
    for (stage, rate) in ProcessStage::ALL.into_iter().zip(rates) {
        stage_rates.set(stage, rate);
    }
    stage_rates
}

/// 内置制法
///
/// 发酵时间取主面团时间区间的中值
pub fn builtin_methods() -> Vec<MethodProfile> {
    vec![
        MethodProfile::new("straight", "直接法")
            .with_split(0.0, 0.0, 1.0)
            .with_preferment_yeast_ratio(0.0)
            .with_fermentation_minutes(90.0),
        MethodProfile::new("sponge", "中种法")
            .with_split(0.6, 0.65, 0.75)
            .with_preferment_yeast_ratio(1.0)
            .with_fermentation_minutes(45.0),
        MethodProfile::new("poolish", "波兰种")
            .with_split(0.3, 1.0, 0.66)
            .with_preferment_yeast_ratio(0.15)
            .with_fermentation_minutes(90.0),
        MethodProfile::new("biga", "意式硬种")
            .with_split(0.4, 0.55, 0.5)
            .with_preferment_yeast_ratio(0.1)
            .with_fermentation_minutes(120.0),
        MethodProfile::new("tangzhong", "汤种")
            .with_split(0.1, 5.0, 1.0)
            .with_preferment_yeast_ratio(0.0)
            .with_fermentation_minutes(75.0),
        MethodProfile::new("levain", "天然酵种")
            .with_split(0.2, 1.0, 0.0)
            .with_preferment_yeast_ratio(0.0)
            .with_fermentation_minutes(270.0),
        MethodProfile::new("cold_ferment", "冷藏发酵")
            .with_split(0.0, 0.0, 0.4)
            .with_preferment_yeast_ratio(0.0)
            .with_fermentation_minutes(90.0),
        MethodProfile::new("retard", "整形后冷藏")
            .with_split(0.0, 0.0, 1.0)
            .with_preferment_yeast_ratio(0.0)
            .with_fermentation_minutes(45.0),
        MethodProfile::new("autolyse", "自溶法")
            .with_split(1.0, 1.0, 1.0)
            .with_preferment_yeast_ratio(0.0)
            .with_fermentation_minutes(90.0),
    ]
}

/// 内置替代规则
pub fn builtin_substitutions() -> Vec<SubstitutionRule> {
    use IngredientCategory::{Dairy, Egg, Fat, Flavoring, Flour, Leavening, Other, Sugar};
    use QualityImpact::{Minor, Moderate, None as NoImpact};

    vec![
        // 粉类
        SubstitutionRule::new("cake_flour", "all_purpose_flour", 0.93, Minor)
            .with_notes("每 100g 低筋粉换 93g 中筋粉 + 7g 玉米淀粉")
            .with_substitute_category(Flour),
        SubstitutionRule::new("bread_flour", "all_purpose_flour", 1.0, Moderate)
            .with_notes("筋度较低，面包体积略小")
            .with_substitute_category(Flour),
        SubstitutionRule::new("whole_wheat_flour", "all_purpose_flour", 1.0, Moderate)
            .with_notes("风味与纤维减少，吸水略少")
            .with_substitute_category(Flour),
        // 糖类
        SubstitutionRule::new("sugar", "honey", 0.75, Moderate)
            .with_notes("液体减少约 20%，烤温降低 15°C")
            .with_substitute_category(Sugar)
            .with_substitute_moisture(17.0),
        SubstitutionRule::new("sugar", "maple_syrup", 0.75, Moderate)
            .with_notes("液体减少约 20%")
            .with_substitute_category(Sugar)
            .with_substitute_moisture(32.0),
        SubstitutionRule::new("brown_sugar", "sugar", 1.0, Minor)
            .with_notes("可加少量糖蜜补回风味"),
        SubstitutionRule::new("dark_brown_sugar", "sugar", 1.0, Minor)
            .with_notes("可加少量糖蜜补回风味"),
        // 油脂
        SubstitutionRule::new("butter", "vegetable_oil", 0.85, Moderate)
            .with_notes("油脂无含水，口感更湿润、香气较弱")
            .with_substitute_category(Fat)
            .with_substitute_moisture(0.0),
        SubstitutionRule::new("butter", "coconut_oil", 1.0, Minor)
            .with_notes("带椰子风味")
            .with_substitute_category(Fat)
            .with_substitute_moisture(0.0),
        SubstitutionRule::new("butter", "margarine", 1.0, Minor)
            .with_notes("风味略逊，口感接近")
            .with_substitute_category(Fat)
            .with_substitute_moisture(16.0),
        SubstitutionRule::new("butter", "shortening", 1.0, Moderate)
            .with_notes("无黄油风味，口感更酥")
            .with_substitute_category(Fat)
            .with_substitute_moisture(0.0),
        SubstitutionRule::new("lard", "butter", 0.875, Minor)
            .with_notes("每 100g 猪油换 87.5g 黄油")
            .with_substitute_category(Fat)
            .with_substitute_moisture(16.0),
        // 蛋
        SubstitutionRule::new("egg", "flaxseed", 1.0, Moderate)
            .with_notes("亚麻籽粉 1 大勺 + 水 3 大勺代替 1 个蛋")
            .with_substitute_category(Other)
            .with_substitute_moisture(75.0),
        SubstitutionRule::new("egg", "chia_seed", 1.0, Moderate)
            .with_notes("奇亚籽 1 大勺 + 水 3 大勺代替 1 个蛋")
            .with_substitute_category(Other)
            .with_substitute_moisture(75.0),
        SubstitutionRule::new("egg", "applesauce", 1.0, Moderate)
            .with_notes("约 60g 苹果泥代替 1 个蛋，口感更湿润")
            .with_substitute_category(Other)
            .with_substitute_moisture(88.0),
        SubstitutionRule::new("egg", "banana", 1.0, Moderate)
            .with_notes("约 60g 香蕉泥代替 1 个蛋，带香蕉风味")
            .with_substitute_category(Other)
            .with_substitute_moisture(75.0),
        SubstitutionRule::new("egg_white", "aquafaba", 1.0, Minor)
            .with_notes("鹰嘴豆水 30ml 代替 1 个蛋白，可打发")
            .with_substitute_category(Egg),
        // 乳制品
        SubstitutionRule::new("milk", "soy_milk", 1.0, Minor)
            .with_notes("风味略有不同")
            .with_substitute_category(Dairy),
        SubstitutionRule::new("milk", "almond_milk", 1.0, Minor)
            .with_notes("带坚果风味")
            .with_substitute_category(Dairy),
        SubstitutionRule::new("milk", "oat_milk", 1.0, NoImpact)
            .with_notes("口感最接近牛奶")
            .with_substitute_category(Dairy),
        SubstitutionRule::new("buttermilk", "milk", 1.0, NoImpact)
            .with_notes("每 240ml 牛奶加 1 大勺柠檬汁或白醋，静置 5 分钟"),
        SubstitutionRule::new("heavy_cream", "coconut_cream", 1.0, Minor)
            .with_notes("带椰子风味，可打发"),
        SubstitutionRule::new("sour_cream", "greek_yogurt", 1.0, NoImpact)
            .with_notes("口感相近，酸度略高"),
        SubstitutionRule::new("cream_cheese", "mascarpone", 1.0, NoImpact)
            .with_notes("更柔滑，酸度较低"),
        // 膨松剂
        SubstitutionRule::new("baking_powder", "baking_soda", 0.25, Minor)
            .with_notes("需配合酸性原料（酸奶、柠檬汁等）")
            .with_substitute_category(Leavening),
        SubstitutionRule::new("instant_yeast", "active_dry_yeast", 1.25, NoImpact)
            .with_notes("需先用温水溶解活化")
            .with_substitute_category(Leavening),
        SubstitutionRule::new("instant_yeast", "fresh_yeast", 3.0, NoImpact)
            .with_notes("鲜酵母用量约为即发干酵母的 3 倍")
            .with_substitute_category(Leavening)
            .with_substitute_moisture(70.0),
        SubstitutionRule::new("active_dry_yeast", "fresh_yeast", 2.5, NoImpact)
            .with_substitute_category(Leavening)
            .with_substitute_moisture(70.0),
        // 淀粉
        SubstitutionRule::new("cornstarch", "potato_starch", 1.0, NoImpact),
        SubstitutionRule::new("cornstarch", "tapioca_starch", 1.0, Minor)
            .with_notes("口感更有弹性"),
        // 巧克力
        SubstitutionRule::new("dark_chocolate", "cocoa_powder", 0.33, Moderate)
            .with_notes("每 30g 巧克力换 10g 可可粉 + 15g 黄油 + 5g 糖")
            .with_substitute_category(Flavoring),
        SubstitutionRule::new("milk_chocolate", "dark_chocolate", 1.0, Minor)
            .with_notes("甜度降低，可酌情加糖")
            .with_substitute_category(Flavoring),
        // 坚果
        SubstitutionRule::new("almond", "walnut", 1.0, Minor).with_notes("风味不同"),
        SubstitutionRule::new("almond_flour", "hazelnut_flour", 1.0, Minor).with_notes("风味不同"),
        // 其他
        SubstitutionRule::new("gelatin", "agar", 0.5, Moderate)
            .with_notes("琼脂凝固力更强，用量减半"),
        SubstitutionRule::new("vanilla_bean", "vanilla_extract", 1.0, Minor)
            .with_notes("1 根香草荚约等于 1 大勺香草精")
            .with_substitute_category(Flavoring),
    ]
}

/// 内置装模参数（比容积 cm³/g、填充率）
pub fn builtin_panning_profiles() -> Vec<PanningProfile> {
    let profile = |key: &str, category: &str, specific_volume: f64, fill_ratio: f64| {
        PanningProfile::new(key, category, specific_volume, fill_ratio)
    };
    vec![
        // 吐司/面包
        profile("pullman", "bread", 3.6, 0.85).with_tip("二次发酵至模具高度九分满"),
        profile("mountain", "bread", 4.0, 0.70).with_tip("二次发酵至模具高度八分满"),
        profile("milk_bread", "bread", 3.8, 0.80),
        profile("brioche", "bread", 3.5, 0.65),
        profile("baguette", "bread", 5.5, 1.0).with_tip("按整形重量计算"),
        profile("sourdough", "bread", 4.0, 1.0),
        profile("ciabatta", "bread", 5.0, 1.0),
        profile("dinner_roll", "bread", 4.0, 1.0).with_tip("每个 40~50g"),
        profile("sweet_bread", "bread", 3.5, 1.0).with_tip("每个 60~80g"),
        // 蛋糕
        profile("genoise", "cake", 5.8, 0.60).with_tip("面糊只装到模具高度六成"),
        profile("chiffon", "cake", 6.5, 0.55).with_tip("只装五成半，出炉倒扣放凉"),
        profile("pound", "cake", 2.4, 0.70).with_tip("面糊装到模具高度七成"),
        profile("butter_cake", "cake", 3.0, 0.65),
        profile("layer_cake", "cake", 4.0, 0.60),
        profile("cheesecake", "cake", 1.8, 0.85).with_tip("水浴烘烤"),
        profile("brownie", "cake", 1.6, 0.90).with_tip("厚度约 2cm 为宜"),
        profile("financier", "cake", 2.0, 0.85),
        profile("madeleine", "cake", 2.2, 0.80).with_tip("烤出鼓起的肚脐"),
        profile("castella", "cake", 4.5, 0.65),
        // 起酥
        profile("croissant", "pastry", 5.0, 0.50).with_tip("摆盘间距放宽"),
        profile("danish", "pastry", 4.5, 0.55),
        profile("puff_pastry", "pastry", 5.5, 0.45),
        // 其他
        profile("cookie", "other", 1.5, 1.0).with_tip("厚度 0.5~1cm"),
        profile("scone", "other", 2.5, 1.0).with_tip("每个 50~60g"),
        profile("tart", "other", 2.0, 0.80).with_tip("需要盲烤"),
    ]
}
