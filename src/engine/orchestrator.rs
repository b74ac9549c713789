// ==========================================
// 配方换算引擎 - 换算编排器
// ==========================================
// 用途: 协调各引擎完成一次配方换算（烤模 → 批量 → 制法 → 环境 → 替代 → 出成/装模）
// 红线: convert 从不失败；缺失的可选数据一律"跳过该项 + 告警"
// 红线: 必需输入缺失（无原料 / 无正重量）时返回全零结果 + 硬告警
// ==========================================

use crate::config::{config_keys, OverrideBundle};
use crate::domain::conversion::{
    ActiveConversion, ConversionConfig, ConversionKind, ConversionResult, ConversionSummary,
};
use crate::domain::ingredient::{normalize_key, total_weight_grams, Ingredient};
use crate::domain::recipe::{PanConfig, Recipe, RecipeMethod};
use crate::domain::yield_loss::YieldEnvironment;
use crate::engine::{
    BakersPercentageEngine, DdtSolver, DiffEngine, EnvironmentAdjustor, MethodSplitter,
    PanningAdvisor, SubstitutionResolver, VolumeCalculator, YieldLossChain,
};
use crate::error::{ConversionError, EngineIssue};
use tracing::{debug, info, instrument, warn};

// ==========================================
// PanScale - 烤模换算系数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanScale {
    pub factor: f64,
    pub source_volume: Option<f64>,
    pub target_volume: Option<f64>,
    /// 系数是否由两边容积实际算出
    pub applied: bool,
}

// ==========================================
// ConversionOrchestrator - 换算编排器
// ==========================================
// 无状态；各引擎参数按次从 config.overrides 读取
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConversionOrchestrator;

impl ConversionOrchestrator {
    pub fn new() -> Self {
        Self
    }

    /// 校验调用契约（仅 try_convert 使用）
    pub fn validate(&self, recipe: &Recipe, config: &ConversionConfig) -> Result<(), ConversionError> {
        if recipe.ingredients.is_empty() {
            return Err(ConversionError::EmptyIngredients);
        }
        if !recipe.ingredients.iter().any(|i| i.amount_in_grams() > 0.0) {
            return Err(ConversionError::NoPositiveWeight);
        }
        if !config.batch_multiplier.is_finite() || config.batch_multiplier <= 0.0 {
            return Err(ConversionError::InvalidBatchMultiplier(config.batch_multiplier));
        }
        Ok(())
    }

    /// 带契约校验的换算
    pub fn try_convert(&self, recipe: &Recipe, config: &ConversionConfig) -> Result<ConversionResult, ConversionError> {
        self.validate(recipe, config)?;
        Ok(self.convert(recipe, config))
    }

    /// 执行完整换算流程
    #[instrument(skip(self, recipe, config), fields(recipe = %recipe.name, ingredients = recipe.ingredients.len()))]
    pub fn convert(&self, recipe: &Recipe, config: &ConversionConfig) -> ConversionResult {
        info!(
            target_method = ?config.target_method,
            batch_multiplier = config.batch_multiplier,
            has_target_pan = config.target_pan.is_some(),
            "开始配方换算"
        );

        // 必需输入
        if recipe.ingredients.is_empty() {
            return self.empty_result(recipe, EngineIssue::MissingIngredients);
        }
        if !recipe.ingredients.iter().any(|i| i.amount_in_grams() > 0.0) {
            return self.empty_result(recipe, EngineIssue::NoPositiveWeight);
        }

        let bundle = &config.overrides;
        let percentage_engine = BakersPercentageEngine::new(config.precision);
        let mut issues: Vec<EngineIssue> = percentage_engine.unit_issues(&recipe.ingredients);
        let mut active: Vec<ConversionKind> = Vec::new();
        let mut converted = recipe.clone();

        // ==========================================
        // 步骤1: 烤模换算系数
        // ==========================================
        debug!("步骤1: 计算烤模换算系数");
        let pan_factor = match &config.target_pan {
            Some(target_pan) => {
                let scale = self.pan_scale_factor(&recipe.pan, target_pan, bundle, &mut issues);
                if scale.applied {
                    active.push(ConversionKind::Pan);
                    converted.pan = target_pan.clone();
                }
                scale.factor
            }
            None => 1.0,
        };

        // ==========================================
        // 步骤2: 合并批量倍数
        // ==========================================
        let batch_multiplier = if config.batch_multiplier.is_finite() && config.batch_multiplier > 0.0 {
            config.batch_multiplier
        } else {
            issues.push(EngineIssue::InvalidBatchMultiplier(config.batch_multiplier));
            1.0
        };
        if (batch_multiplier - 1.0).abs() > f64::EPSILON {
            active.push(ConversionKind::Batch);
            converted.yield_info.quantity *= batch_multiplier;
        }
        let combined_factor = pan_factor * batch_multiplier;
        debug!(pan_factor, batch_multiplier, combined_factor, "步骤2: 合并换算系数");

        // ==========================================
        // 步骤3: 按系数缩放
        // ==========================================
        let mut ingredients = percentage_engine
            .scale_by_factor(&recipe.ingredients, combined_factor)
            .unpack(&mut issues);

        // ==========================================
        // 步骤4: 制法换算
        // ==========================================
        let mut preferment_split = None;
        let mut fermentation_minutes = recipe.method.fermentation_minutes;
        if let Some(target_method) = config
            .target_method
            .as_deref()
            .filter(|m| normalize_key(m) != normalize_key(&recipe.method.method))
        {
            debug!(target_method, "步骤4: 执行制法换算");
            let conversion = MethodSplitter::new()
                .convert(&ingredients, &recipe.method.method, target_method, bundle)
                .unpack(&mut issues);
            if let Some(conversion) = conversion {
                ingredients = conversion.ingredients;
                preferment_split = conversion.split;
                fermentation_minutes = conversion.fermentation_minutes.or(fermentation_minutes);
                converted.method = RecipeMethod {
                    method: conversion.method_id,
                    fermentation_minutes,
                };
                active.push(ConversionKind::Method);
            }
        }
        if fermentation_minutes.is_none() {
            fermentation_minutes = bundle
                .method(&converted.method.method)
                .and_then(|r| r.value.fermentation_minutes);
        }

        // ==========================================
        // 步骤5: 环境调整
        // ==========================================
        let mut fermentation = None;
        let mut environment_tips = Vec::new();
        if let Some(environment) = &config.environment {
            debug!(
                temperature_c = environment.temperature_c,
                humidity_pct = environment.humidity_pct,
                altitude_m = environment.altitude_m,
                auto_adjust = environment.auto_adjust,
                "步骤5: 环境调整"
            );
            let adjustor = EnvironmentAdjustor::from_bundle(bundle);
            let assessment = adjustor.assess(environment, fermentation_minutes);
            if environment.auto_adjust {
                let (adjusted, changed) = adjustor.apply(&ingredients, &assessment);
                if changed {
                    ingredients = adjusted;
                    active.push(ConversionKind::Environment);
                }
            }
            fermentation = Some(assessment.fermentation);
            environment_tips = assessment.tips;
        }

        // ==========================================
        // 步骤6: 原料替代
        // ==========================================
        if !config.substitutions.is_empty() {
            debug!(count = config.substitutions.len(), "步骤6: 原料替代");
            let before_ids: Vec<String> = ingredients.iter().map(|i| i.id.clone()).collect();
            ingredients = SubstitutionResolver::new()
                .apply_requests(&ingredients, &config.substitutions, bundle)
                .unpack(&mut issues);
            if ingredients.iter().map(|i| &i.id).ne(before_ids.iter()) {
                active.push(ConversionKind::Substitution);
            }
        }

        // ==========================================
        // 步骤7: 舍入 + 重算百分比
        // ==========================================
        debug!("步骤7: 重算烘焙百分比");
        let ingredients = percentage_engine.round_amounts(&ingredients);
        let percentages = percentage_engine.percentages(&ingredients).unpack(&mut issues);

        // ==========================================
        // 步骤8: 差异对比
        // ==========================================
        let diffs = DiffEngine::new().diff(&recipe.ingredients, &ingredients);
        debug!(diffs = diffs.len(), "步骤8: 差异对比完成");

        // 水温 / 出成（可选）
        let water_temperature = config.ddt_settings.as_ref().map(|settings| {
            let water_weight = liquid_weight(&ingredients);
            DdtSolver::from_bundle(bundle).solve_with_water(settings, Some(water_weight))
        });

        let total_converted_weight = total_weight_grams(&ingredients);
        // 有环境设置且未关闭修正时，按温湿度修正烘烤失重
        let yield_environment = config
            .environment
            .as_ref()
            .filter(|_| {
                bundle
                    .number(config_keys::YIELD_ENVIRONMENT_ADJUSTMENT)
                    .map_or(true, |r| r.value != 0.0)
            })
            .map(|env| YieldEnvironment::new(env.humidity_pct, env.temperature_c));
        let yield_projection = config.stage_selection.as_ref().and_then(|selection| {
            YieldLossChain::from_bundle(bundle)
                .forward_in_environment(
                    total_converted_weight,
                    &bundle.loss_rates,
                    recipe.product_category.as_deref(),
                    recipe.product_key.as_deref(),
                    selection,
                    yield_environment.as_ref(),
                )
                .unpack(&mut issues)
        });

        // 装模检查：仅对配置了装模参数的产品
        let panning = recipe
            .product_key
            .as_deref()
            .filter(|product| bundle.panning_profile(product).is_some())
            .and_then(|product| {
                let mut ignored = Vec::new();
                let volume = VolumeCalculator::from_bundle(bundle)
                    .pan_volume(&converted.pan)
                    .unpack(&mut ignored)?;
                PanningAdvisor::from_bundle(bundle)
                    .validate_panning(volume, total_converted_weight, product, bundle)
                    .unpack(&mut issues)
            });

        // ==========================================
        // 步骤9: 汇总
        // ==========================================
        let mut warnings: Vec<String> = Vec::new();
        let ddt_warnings = water_temperature.iter().flat_map(|r| r.warnings.iter().cloned());
        for warning in issues.iter().map(|i| i.to_string()).chain(ddt_warnings) {
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "换算存在告警");
        }

        let summary = ConversionSummary {
            scale_factor: combined_factor,
            total_original_weight: recipe.total_weight(),
            total_converted_weight,
            hydration_original: percentage_engine.hydration(&recipe.ingredients),
            hydration_converted: percentage_engine.hydration(&ingredients),
            warnings,
            active_conversions: active.into_iter().map(ActiveConversion::from).collect(),
        };

        info!(
            scale_factor = summary.scale_factor,
            total_converted_weight = summary.total_converted_weight,
            active = summary.active_conversions.len(),
            warnings = summary.warnings.len(),
            "配方换算完成"
        );

        converted.ingredients = ingredients;
        ConversionResult {
            recipe: converted,
            percentages,
            diffs,
            summary,
            preferment_split,
            fermentation,
            environment_tips,
            water_temperature,
            yield_projection,
            panning,
        }
    }

    /// 烤模换算系数: (目标容积 × 目标填充率) / (原容积 × 原填充率)
    ///
    /// 任一侧容积缺失时系数按 1.0 并告警；调用方据 applied 决定是否换烤模
    pub fn pan_scale_factor(
        &self,
        source: &PanConfig,
        target: &PanConfig,
        bundle: &OverrideBundle,
        issues: &mut Vec<EngineIssue>,
    ) -> PanScale {
        let calculator = VolumeCalculator::from_bundle(bundle);
        let source_volume = calculator.pan_volume(source).unpack(issues);
        let target_volume = calculator.pan_volume(target).unpack(issues);

        let skipped = |which: &str, issues: &mut Vec<EngineIssue>| {
            issues.push(EngineIssue::MissingPanVolume {
                which: which.to_string(),
            });
            PanScale {
                factor: 1.0,
                source_volume,
                target_volume,
                applied: false,
            }
        };

        let Some(source_cm3) = source_volume.filter(|v| *v > 0.0) else {
            return skipped("原", issues);
        };
        let Some(target_cm3) = target_volume.filter(|v| *v > 0.0) else {
            return skipped("目标", issues);
        };

        let source_fill = fill_ratio_or_default(source, "source", issues);
        let target_fill = fill_ratio_or_default(target, "target", issues);

        PanScale {
            factor: (target_cm3 * target_fill) / (source_cm3 * source_fill),
            source_volume,
            target_volume,
            applied: true,
        }
    }

    /// 必需输入缺失：原配方原样返回，数值全部为 0
    fn empty_result(&self, recipe: &Recipe, issue: EngineIssue) -> ConversionResult {
        warn!(issue = %issue, "必需输入缺失，返回空结果");
        ConversionResult {
            recipe: recipe.clone(),
            percentages: Vec::new(),
            diffs: Vec::new(),
            summary: ConversionSummary {
                scale_factor: 0.0,
                total_original_weight: 0.0,
                total_converted_weight: 0.0,
                hydration_original: None,
                hydration_converted: None,
                warnings: vec![issue.to_string()],
                active_conversions: Vec::new(),
            },
            preferment_split: None,
            fermentation: None,
            environment_tips: Vec::new(),
            water_temperature: None,
            yield_projection: None,
            panning: None,
        }
    }
}

fn fill_ratio_or_default(pan: &PanConfig, label: &str, issues: &mut Vec<EngineIssue>) -> f64 {
    if pan.has_valid_fill_ratio() {
        pan.fill_ratio
    } else {
        issues.push(EngineIssue::InvalidFillRatio {
            pan: label.to_string(),
            value: pan.fill_ratio,
        });
        1.0
    }
}

fn liquid_weight(ingredients: &[Ingredient]) -> f64 {
    ingredients
        .iter()
        .filter(|i| i.is_plain_liquid())
        .map(|i| i.amount_in_grams())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::{PanShape, RecipeYield};
    use crate::domain::types::IngredientCategory;

    fn recipe() -> Recipe {
        Recipe {
            name: "white loaf".to_string(),
            ingredients: vec![
                Ingredient::new("flour", "Bread Flour", IngredientCategory::Flour, 500.0),
                Ingredient::new("water", "Water", IngredientCategory::Liquid, 350.0),
                Ingredient::new("salt", "Salt", IngredientCategory::Salt, 10.0),
                Ingredient::new("yeast", "Instant Yeast", IngredientCategory::Leavening, 5.0),
            ],
            pan: PanConfig::new(
                PanShape::Rectangle {
                    length_cm: 20.0,
                    width_cm: 10.0,
                    height_cm: 8.0,
                },
                0.8,
            ),
            method: RecipeMethod::new("straight"),
            yield_info: RecipeYield {
                quantity: 1.0,
                unit: "loaf".to_string(),
            },
            product_category: None,
            product_key: None,
        }
    }

    #[test]
    fn test_identity_conversion() {
        let orchestrator = ConversionOrchestrator::new();
        let result = orchestrator.convert(&recipe(), &ConversionConfig::default());
        assert_eq!(result.summary.scale_factor, 1.0);
        assert!(result.summary.active_conversions.is_empty());
        assert!(result.summary.warnings.is_empty());
        assert!(result
            .diffs
            .iter()
            .all(|d| d.change_type == crate::domain::types::ChangeType::Unchanged));
    }

    #[test]
    fn test_pan_factor_uses_fill_ratio() {
        let orchestrator = ConversionOrchestrator::new();
        let mut issues = Vec::new();
        let target = PanConfig::new(
            PanShape::Rectangle {
                length_cm: 20.0,
                width_cm: 20.0,
                height_cm: 8.0,
            },
            0.8,
        );
        let scale = orchestrator.pan_scale_factor(
            &recipe().pan,
            &target,
            &OverrideBundle::with_builtin_defaults(),
            &mut issues,
        );
        assert!(scale.applied);
        assert!((scale.factor - 2.0).abs() < 1e-12);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_missing_source_volume_skips_pan_term() {
        let orchestrator = ConversionOrchestrator::new();
        let mut base = recipe();
        base.pan = PanConfig::new(PanShape::Custom, 1.0);
        let config = ConversionConfig {
            target_pan: Some(PanConfig::with_volume(2000.0, 1.0)),
            ..ConversionConfig::default()
        };
        let result = orchestrator.convert(&base, &config);
        assert_eq!(result.summary.scale_factor, 1.0);
        assert_eq!(result.summary.warnings.len(), 1);
        assert!(result.summary.active_conversions.is_empty());
        // 系数未生效时不改烤模，结果与原料重量保持一致
        assert_eq!(result.recipe.pan, base.pan);
        assert!(result.summary.warnings[0].contains("配方保留原烤模"));
    }

    #[test]
    fn test_missing_target_volume_keeps_source_pan() {
        let orchestrator = ConversionOrchestrator::new();
        let config = ConversionConfig {
            target_pan: Some(PanConfig::new(PanShape::Custom, 1.0)),
            ..ConversionConfig::default()
        };
        let result = orchestrator.convert(&recipe(), &config);
        assert_eq!(result.recipe.pan, recipe().pan);
        assert_eq!(
            result.summary.warnings,
            vec![EngineIssue::MissingPanVolume { which: "目标".into() }.to_string()]
        );
        assert_eq!(result.summary.total_converted_weight, recipe().total_weight());
    }

    #[test]
    fn test_required_inputs() {
        let orchestrator = ConversionOrchestrator::new();
        let mut empty = recipe();
        empty.ingredients.clear();

        let result = orchestrator.convert(&empty, &ConversionConfig::default());
        assert_eq!(result.summary.total_converted_weight, 0.0);
        assert_eq!(result.summary.warnings, vec![EngineIssue::MissingIngredients.to_string()]);

        assert_eq!(
            orchestrator.try_convert(&empty, &ConversionConfig::default()),
            Err(ConversionError::EmptyIngredients)
        );

        let config = ConversionConfig {
            batch_multiplier: 0.0,
            ..ConversionConfig::default()
        };
        assert_eq!(
            orchestrator.try_convert(&recipe(), &config),
            Err(ConversionError::InvalidBatchMultiplier(0.0))
        );
    }
}
