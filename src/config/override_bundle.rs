// ==========================================
// 配方换算引擎 - 覆写配置包
// ==========================================
// 职责: 承载设置子系统给出的已解析覆写快照
// 红线: 引擎不读取任何全局配置，所有可调参数随调用显式传入
// ==========================================

use crate::config::defaults;
use crate::config::method_profile::MethodProfile;
use crate::config::override_layers::{OverrideLayer, OverrideLayers, Resolved};
use crate::config::panning_profile::PanningProfile;
use crate::domain::ingredient::normalize_key;
use crate::domain::substitution::SubstitutionRule;
use crate::domain::types::ProcessStage;
use crate::domain::yield_loss::StageLossRates;
use crate::error::{Checked, ConfigError, EngineIssue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ==========================================
// LossRateTable - 损耗率表
// ==========================================
// 分类/产品/自定义层只需列出与上一层不同的阶段
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossRateTable {
    #[serde(default)]
    pub builtin: StageLossRates,
    #[serde(default)]
    pub categories: HashMap<String, BTreeMap<ProcessStage, f64>>,
    #[serde(default)]
    pub products: HashMap<String, BTreeMap<ProcessStage, f64>>,
    #[serde(default)]
    pub custom: BTreeMap<ProcessStage, f64>,
}

/// 解析后的六阶段损耗率 + 每阶段命中的层
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLossRates {
    pub rates: StageLossRates,
    pub sources: BTreeMap<ProcessStage, OverrideLayer>,
}

impl LossRateTable {
    /// 内置默认表
    pub fn builtin() -> Self {
        Self {
            builtin: defaults::builtin_loss_rates(),
            categories: defaults::builtin_category_loss_rates()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            products: defaults::builtin_product_loss_rates()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            custom: BTreeMap::new(),
        }
    }

    pub fn with_product(mut self, product: &str, rates: BTreeMap<ProcessStage, f64>) -> Self {
        self.products.insert(product.to_string(), rates);
        self
    }

    pub fn with_custom(mut self, stage: ProcessStage, rate: f64) -> Self {
        self.custom.insert(stage, rate);
        self
    }

    /// 逐阶段解析损耗率
    ///
    /// 分类/产品条目缺失时告警，并回退到更通用的层
    pub fn resolve(&self, category: Option<&str>, product: Option<&str>) -> Checked<ResolvedLossRates> {
        let mut issues = Vec::new();
        let mut layers: OverrideLayers<f64> = OverrideLayers::new();

        for stage in ProcessStage::ALL {
            layers.set(OverrideLayer::BuiltinDefault, stage.as_str(), self.builtin.get(stage));
        }

        if let Some(category) = category {
            match self.categories.get(category) {
                Some(entries) => fill_layer(&mut layers, OverrideLayer::Category, entries),
                None => issues.push(EngineIssue::MissingLossRateEntry {
                    layer: "分类".to_string(),
                    key: category.to_string(),
                }),
            }
        }

        if let Some(product) = product {
            match self.products.get(product) {
                Some(entries) => fill_layer(&mut layers, OverrideLayer::Product, entries),
                None => issues.push(EngineIssue::MissingLossRateEntry {
                    layer: "产品".to_string(),
                    key: product.to_string(),
                }),
            }
        }

        fill_layer(&mut layers, OverrideLayer::UserCustom, &self.custom);

        let mut rates = StageLossRates::default();
        let mut sources = BTreeMap::new();
        for stage in ProcessStage::ALL {
            let resolved = layers
                .resolve(stage.as_str())
                .map(|r| r.map(|v| *v))
                .unwrap_or(Resolved {
                    value: 0.0,
                    layer: OverrideLayer::BuiltinDefault,
                });
            rates.set(stage, resolved.value);
            sources.insert(stage, resolved.layer);
        }

        Checked {
            value: ResolvedLossRates { rates, sources },
            issues,
        }
    }
}

fn fill_layer(layers: &mut OverrideLayers<f64>, layer: OverrideLayer, entries: &BTreeMap<ProcessStage, f64>) {
    for (stage, rate) in entries {
        layers.set(layer, stage.as_str(), *rate);
    }
}

// ==========================================
// OverrideBundle - 覆写配置包
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideBundle {
    /// 数值型可调参数（键见 config_keys）
    #[serde(default)]
    pub numeric: OverrideLayers<f64>,

    /// 六阶段损耗率
    #[serde(default)]
    pub loss_rates: LossRateTable,

    /// 制法参数（键 = 制法ID）
    #[serde(default)]
    pub methods: OverrideLayers<MethodProfile>,

    /// 替代规则（键 = 原料规范化键）
    #[serde(default)]
    pub substitutions: OverrideLayers<Vec<SubstitutionRule>>,

    /// 装模参数（键 = 产品键）
    #[serde(default)]
    pub panning: OverrideLayers<PanningProfile>,
}

impl OverrideBundle {
    /// 空配置包（所有层为空）
    pub fn new() -> Self {
        Self::default()
    }

    /// 以内置默认值填充默认层
    pub fn with_builtin_defaults() -> Self {
        let mut bundle = Self::new();

        for (key, value) in defaults::builtin_numeric() {
            bundle.numeric.set(OverrideLayer::BuiltinDefault, key, value);
        }

        bundle.loss_rates = LossRateTable::builtin();

        for method in defaults::builtin_methods() {
            let id = method.method_id.clone();
            bundle.methods.set(OverrideLayer::BuiltinDefault, &id, method);
        }

        for rule in defaults::builtin_substitutions() {
            bundle
                .substitutions
                .layer_mut(OverrideLayer::BuiltinDefault)
                .entry(normalize_key(&rule.original))
                .or_default()
                .push(rule);
        }

        for profile in defaults::builtin_panning_profiles() {
            let key = profile.key.clone();
            bundle.panning.set(OverrideLayer::BuiltinDefault, &key, profile);
        }

        bundle
    }

    // ==========================================
    // 数值参数
    // ==========================================

    pub fn with_number(mut self, layer: OverrideLayer, key: &str, value: f64) -> Self {
        self.numeric.set(layer, key, value);
        self
    }

    pub fn number(&self, key: &str) -> Option<Resolved<f64>> {
        self.numeric.resolve(key).map(|r| r.map(|v| *v))
    }

    /// 读取数值参数；缺失时使用保守默认值并记录配置告警
    pub fn number_or(&self, key: &str, fallback: f64, issues: &mut Vec<EngineIssue>) -> f64 {
        match self.number(key) {
            Some(resolved) => resolved.value,
            None => {
                issues.push(EngineIssue::MissingConfigValue {
                    key: key.to_string(),
                    fallback,
                });
                fallback
            }
        }
    }

    // ==========================================
    // 制法 / 替代
    // ==========================================

    pub fn method(&self, method_id: &str) -> Option<Resolved<&MethodProfile>> {
        self.methods.resolve(method_id)
    }

    pub fn with_method(mut self, layer: OverrideLayer, profile: MethodProfile) -> Self {
        let id = profile.method_id.clone();
        self.methods.set(layer, &id, profile);
        self
    }

    /// 追加替代规则到指定层
    pub fn with_substitution(mut self, layer: OverrideLayer, rule: SubstitutionRule) -> Self {
        self.substitutions
            .layer_mut(layer)
            .entry(normalize_key(&rule.original))
            .or_default()
            .push(rule);
        self
    }

    pub fn panning_profile(&self, product: &str) -> Option<Resolved<&PanningProfile>> {
        self.panning.resolve(&normalize_key(product))
    }

    pub fn with_panning_profile(mut self, layer: OverrideLayer, profile: PanningProfile) -> Self {
        let key = normalize_key(&profile.key);
        self.panning.set(layer, &key, profile);
        self
    }

    pub fn with_loss_rates(mut self, loss_rates: LossRateTable) -> Self {
        self.loss_rates = loss_rates;
        self
    }

    // ==========================================
    // 快照导入导出
    // ==========================================

    /// 从设置子系统的 JSON 快照构建
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let bundle: OverrideBundle = serde_json::from_str(raw)?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// 校验会导致计算失真的配置值
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, fn(f64) -> bool, &str); 3] = [
            (config_keys::PAN_LOAF_TAPER_RATIO, |v| v > 0.0 && v <= 1.0, "收窄系数应在 (0, 1] 之间"),
            (config_keys::FERMENTATION_HALVING_STEP_C, |v| v > 0.0, "减半步长必须 >0"),
            (config_keys::DDT_TEMP_FACTOR_COUNT, |v| v >= 1.0, "温度因子数必须 ≥1"),
        ];

        for (key, is_valid, message) in checks {
            if let Some(resolved) = self.number(key) {
                if !resolved.value.is_finite() || !is_valid(resolved.value) {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: resolved.value,
                        message: message.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 烤模
    pub const PAN_LOAF_TAPER_RATIO: &str = "pan.loaf_taper_ratio"; // 吐司模底宽收窄系数

    // 发酵 Q10 模型
    pub const FERMENTATION_BASE_TEMP_C: &str = "fermentation.base_temp_c";
    pub const FERMENTATION_HALVING_STEP_C: &str = "fermentation.halving_step_c";

    // 面温计算
    pub const DDT_TEMP_FACTOR_COUNT: &str = "ddt.temp_factor_count";
    pub const DDT_WATER_TEMP_MIN_C: &str = "ddt.water_temp_min_c";
    pub const DDT_WATER_TEMP_MAX_C: &str = "ddt.water_temp_max_c";
    pub const DDT_TAP_WATER_TEMP_C: &str = "ddt.tap_water_temp_c"; // 冰水计算用自来水温

    // 搅拌摩擦升温
    pub const FRICTION_HAND: &str = "friction.hand";
    pub const FRICTION_STAND: &str = "friction.stand";
    pub const FRICTION_SPIRAL: &str = "friction.spiral";
    pub const FRICTION_PLANETARY: &str = "friction.planetary";
    pub const FRICTION_INTENSIVE: &str = "friction.intensive";

    // 湿度
    pub const HUMIDITY_LOW_PCT: &str = "environment.humidity_low_pct";
    pub const HUMIDITY_HIGH_PCT: &str = "environment.humidity_high_pct";
    pub const HUMIDITY_ADJUST_PCT: &str = "environment.humidity_adjust_pct"; // 自动调整时液体增减比例

    // 出成
    pub const YIELD_HIGH_LOSS_TIP_PCT: &str = "yield.high_loss_tip_pct";
    pub const YIELD_ENVIRONMENT_ADJUSTMENT: &str = "yield.environment_adjustment"; // 1 = 按温湿度修正烘烤失重
}
