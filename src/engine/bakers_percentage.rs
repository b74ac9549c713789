// ==========================================
// 配方换算引擎 - 烘焙百分比引擎
// ==========================================
// 职责: 原料重量 ⇄ 粉量基准百分比、线性缩放、水合率
// 红线: 粉量为 0 时百分比全部为 None，禁止除零
// ==========================================

use crate::domain::conversion::IngredientPercentage;
use crate::domain::ingredient::{total_weight_grams, Ingredient};
use crate::domain::types::{IngredientCategory, Precision};
use crate::error::{Checked, EngineIssue};
use serde::{Deserialize, Serialize};
use tracing::instrument;

// 常用比例范围 (%)
const HYDRATION_RANGE: (f64, f64) = (50.0, 100.0);
const SALT_RANGE: (f64, f64) = (1.5, 3.0);
const YEAST_RANGE: (f64, f64) = (0.5, 3.0);

/// 配方比例检查结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioCheck {
    pub hydration: Option<f64>,
    pub salt_pct: Option<f64>,
    pub yeast_pct: Option<f64>,
}

/// 按目标总重缩放的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledIngredients {
    pub ingredients: Vec<Ingredient>,
    pub factor: f64,
    /// 舍入后实际总重（可能与目标略有偏差，用于展示）
    pub achieved_total: f64,
}

// ==========================================
// BakersPercentageEngine - 烘焙百分比引擎
// ==========================================
// 无状态引擎，精度随构造传入
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakersPercentageEngine {
    precision: Precision,
}

impl Default for BakersPercentageEngine {
    fn default() -> Self {
        Self::new(Precision::default())
    }
}

impl BakersPercentageEngine {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    // ==========================================
    // 百分比
    // ==========================================

    /// 粉量基准（克）: category==flour 或 is_flour 的原料之和
    pub fn flour_basis(&self, ingredients: &[Ingredient]) -> f64 {
        ingredients
            .iter()
            .filter(|i| i.counts_as_flour())
            .map(|i| i.amount_in_grams())
            .sum()
    }

    /// 单个原料的烘焙百分比: amount / flour_basis × 100
    pub fn to_percentage(&self, ingredient: &Ingredient, flour_basis: f64) -> Option<f64> {
        if !flour_basis.is_finite() || flour_basis <= 0.0 {
            return None;
        }
        Some(
            self.precision
                .round(ingredient.amount_in_grams() / flour_basis * 100.0),
        )
    }

    /// 全部原料的百分比表
    pub fn percentages(&self, ingredients: &[Ingredient]) -> Checked<Vec<IngredientPercentage>> {
        let basis = self.flour_basis(ingredients);
        let table = ingredients
            .iter()
            .map(|i| IngredientPercentage {
                ingredient_id: i.id.clone(),
                name: i.name.clone(),
                percentage: self.to_percentage(i, basis),
            })
            .collect();

        if basis > 0.0 {
            Checked::ok(table)
        } else {
            Checked::with_issue(table, EngineIssue::EmptyFlourBasis)
        }
    }

    /// 水合率: (液体 + 蛋) / 粉量 × 100
    pub fn hydration(&self, ingredients: &[Ingredient]) -> Option<f64> {
        let basis = self.flour_basis(ingredients);
        if basis <= 0.0 {
            return None;
        }
        let liquid: f64 = ingredients
            .iter()
            .filter(|i| i.is_liquid())
            .map(|i| i.amount_in_grams())
            .sum();
        Some(self.precision.round(liquid / basis * 100.0))
    }

    /// 有效水合率: 计入乳/蛋/油脂等原料自身含水
    pub fn effective_hydration(&self, ingredients: &[Ingredient]) -> Option<f64> {
        let basis = self.flour_basis(ingredients);
        if basis <= 0.0 {
            return None;
        }
        let water: f64 = ingredients
            .iter()
            .filter(|i| !i.counts_as_flour())
            .map(|i| i.water_content_grams())
            .sum();
        Some(self.precision.round(water / basis * 100.0))
    }

    // ==========================================
    // 缩放
    // ==========================================

    /// 按目标总重缩放，每个原料按克独立舍入（非克单位按原单位回写）
    #[instrument(skip(self, ingredients), fields(count = ingredients.len()))]
    pub fn scale_to_total_weight(&self, ingredients: &[Ingredient], target_weight: f64) -> Checked<ScaledIngredients> {
        let current = total_weight_grams(ingredients);

        if !target_weight.is_finite() || target_weight <= 0.0 {
            return Checked::with_issue(
                unchanged(ingredients, current),
                EngineIssue::NonPositiveWeight {
                    context: "target_weight".to_string(),
                    value: target_weight,
                },
            );
        }
        if current <= 0.0 {
            return Checked::with_issue(
                unchanged(ingredients, current),
                EngineIssue::NonPositiveWeight {
                    context: "current_total_weight".to_string(),
                    value: current,
                },
            );
        }

        let factor = target_weight / current;
        let scaled: Vec<Ingredient> = ingredients
            .iter()
            .map(|i| i.with_amount_in_grams(self.precision.round(i.amount_in_grams() * factor)))
            .collect();
        let achieved_total = total_weight_grams(&scaled);

        Checked::ok(ScaledIngredients {
            ingredients: scaled,
            factor,
            achieved_total,
        })
    }

    /// 按单个面团重量 × 个数缩放（分割面包用）
    pub fn adjust_by_piece_weight(
        &self,
        ingredients: &[Ingredient],
        piece_weight: f64,
        quantity: u32,
    ) -> Checked<ScaledIngredients> {
        if quantity == 0 {
            return Checked::with_issue(
                unchanged(ingredients, total_weight_grams(ingredients)),
                EngineIssue::NonPositiveWeight {
                    context: "quantity".to_string(),
                    value: 0.0,
                },
            );
        }
        self.scale_to_total_weight(ingredients, piece_weight * f64::from(quantity))
    }

    /// 按产量缩放: 原产量 → 目标产量
    pub fn adjust_to_yield(&self, ingredients: &[Ingredient], current_yield: f64, target_yield: f64) -> Checked<Vec<Ingredient>> {
        if !current_yield.is_finite() || current_yield <= 0.0 {
            return Checked::with_issue(
                ingredients.to_vec(),
                EngineIssue::NonPositiveWeight {
                    context: "current_yield".to_string(),
                    value: current_yield,
                },
            );
        }
        self.scale_by_factor(ingredients, target_yield / current_yield)
    }

    // ==========================================
    // 比例检查
    // ==========================================

    /// 检查水合率、盐、酵母是否在常用范围内
    ///
    /// 盐按分类或名称识别，酵母只认名称含 yeast/酵母 的膨松剂（泡打粉不计）
    pub fn validate_ratios(&self, ingredients: &[Ingredient]) -> Checked<RatioCheck> {
        let basis = self.flour_basis(ingredients);
        let share = |pred: &dyn Fn(&Ingredient) -> bool| -> Option<f64> {
            let grams: f64 = ingredients
                .iter()
                .filter(|i| pred(*i))
                .map(|i| i.amount_in_grams())
                .sum();
            (basis > 0.0 && grams > 0.0).then(|| self.precision.round(grams / basis * 100.0))
        };

        let check = RatioCheck {
            hydration: self.hydration(ingredients),
            salt_pct: share(&is_salt),
            yeast_pct: share(&is_yeast),
        };
        if basis <= 0.0 {
            return Checked::with_issue(check, EngineIssue::EmptyFlourBasis);
        }

        let mut checked = Checked::ok(check);
        let bounds = [
            ("水合率", checked.value.hydration, HYDRATION_RANGE),
            ("盐", checked.value.salt_pct, SALT_RANGE),
            ("酵母", checked.value.yeast_pct, YEAST_RANGE),
        ];
        for (ratio, value, (min, max)) in bounds {
            if let Some(value) = value.filter(|v| *v < min || *v > max) {
                checked.push(EngineIssue::RatioOutOfRange {
                    ratio: ratio.to_string(),
                    value,
                    min,
                    max,
                });
            }
        }
        checked
    }

    /// 按系数缩放（烤模容积比 × 批量倍数），不舍入
    pub fn scale_by_factor(&self, ingredients: &[Ingredient], factor: f64) -> Checked<Vec<Ingredient>> {
        if !factor.is_finite() || factor <= 0.0 {
            return Checked::with_issue(ingredients.to_vec(), EngineIssue::InvalidScaleFactor(factor));
        }
        Checked::ok(ingredients.iter().map(|i| i.with_amount(i.amount * factor)).collect())
    }

    /// 按精度舍入全部重量
    ///
    /// 舍入单位是克，kg/lb 原料不会被舍成整千克/整磅
    pub fn round_amounts(&self, ingredients: &[Ingredient]) -> Vec<Ingredient> {
        ingredients
            .iter()
            .map(|i| i.with_amount_in_grams(self.precision.round(i.amount_in_grams())))
            .collect()
    }

    /// 无法识别单位的原料（按克处理并告警）
    pub fn unit_issues(&self, ingredients: &[Ingredient]) -> Vec<EngineIssue> {
        ingredients
            .iter()
            .filter(|i| i.weight_unit().is_none())
            .map(|i| EngineIssue::UnknownUnit {
                ingredient: i.name.clone(),
                unit: i.unit.clone(),
            })
            .collect()
    }
}

fn is_salt(ingredient: &Ingredient) -> bool {
    let key = ingredient.lookup_key();
    ingredient.category == IngredientCategory::Salt || key.contains("salt") || key.contains('盐')
}

fn is_yeast(ingredient: &Ingredient) -> bool {
    let key = ingredient.lookup_key();
    ingredient.category == IngredientCategory::Leavening && (key.contains("yeast") || key.contains("酵母"))
}

fn unchanged(ingredients: &[Ingredient], total: f64) -> ScaledIngredients {
    ScaledIngredients {
        ingredients: ingredients.to_vec(),
        factor: 1.0,
        achieved_total: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================
    // 测试数据准备
    // ==========================================

    fn white_bread() -> Vec<Ingredient> {
        vec![
            Ingredient::new("bread_flour", "Bread Flour", IngredientCategory::Flour, 400.0),
            Ingredient::new("ww_flour", "Whole Wheat Flour", IngredientCategory::Flour, 100.0),
            Ingredient::new("water", "Water", IngredientCategory::Liquid, 325.0),
            Ingredient::new("salt", "Salt", IngredientCategory::Salt, 10.0),
            Ingredient::new("yeast", "Instant Yeast", IngredientCategory::Leavening, 5.0),
        ]
    }

    #[test]
    fn test_flour_basis_and_percentages() {
        let engine = BakersPercentageEngine::new(Precision::One);
        let ingredients = white_bread();
        assert_eq!(engine.flour_basis(&ingredients), 500.0);

        let table = engine.percentages(&ingredients);
        assert!(!table.has_warnings());
        let water = table.value.iter().find(|p| p.ingredient_id == "water").unwrap();
        assert_eq!(water.percentage, Some(65.0));

        let flour_total: f64 = table.value[..2].iter().filter_map(|p| p.percentage).sum();
        assert!((flour_total - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_is_flour_flag_counts_toward_basis() {
        let engine = BakersPercentageEngine::default();
        let mut ingredients = white_bread();
        let mut starter = Ingredient::new("starter_flour", "Starter Flour", IngredientCategory::Other, 100.0);
        starter.is_flour = true;
        ingredients.push(starter);
        assert_eq!(engine.flour_basis(&ingredients), 600.0);
    }

    #[test]
    fn test_zero_flour_basis_returns_none_for_all() {
        let engine = BakersPercentageEngine::default();
        let ingredients = vec![
            Ingredient::new("water", "Water", IngredientCategory::Liquid, 100.0),
            Ingredient::new("sugar", "Sugar", IngredientCategory::Sugar, 50.0),
        ];
        let table = engine.percentages(&ingredients);
        assert!(table.value.iter().all(|p| p.percentage.is_none()));
        assert_eq!(table.issues, vec![EngineIssue::EmptyFlourBasis]);
        assert_eq!(engine.hydration(&ingredients), None);
    }

    #[test]
    fn test_scale_to_total_weight_within_rounding_unit() {
        let engine = BakersPercentageEngine::new(Precision::One);
        let ingredients = white_bread();
        let scaled = engine.scale_to_total_weight(&ingredients, 1000.0);
        assert!(!scaled.has_warnings());
        assert!((scaled.value.achieved_total - 1000.0).abs() <= Precision::One.unit() + 1e-9);
        assert!((scaled.value.factor - 1000.0 / 840.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_to_total_weight_rejects_non_positive() {
        let engine = BakersPercentageEngine::default();
        let ingredients = white_bread();

        let scaled = engine.scale_to_total_weight(&ingredients, 0.0);
        assert!(scaled.has_warnings());
        assert_eq!(scaled.value.ingredients, ingredients);

        let empty = engine.scale_to_total_weight(&[], 500.0);
        assert!(empty.has_warnings());
        assert!(empty.value.ingredients.is_empty());
    }

    #[test]
    fn test_scale_by_factor() {
        let engine = BakersPercentageEngine::default();
        let ingredients = white_bread();
        let scaled = engine.scale_by_factor(&ingredients, 1.5);
        assert_eq!(scaled.value[0].amount, 600.0);
        assert_eq!(scaled.value[2].amount, 487.5);
        // 输入未被修改
        assert_eq!(ingredients[0].amount, 400.0);

        let invalid = engine.scale_by_factor(&ingredients, -2.0);
        assert!(invalid.has_warnings());
        assert_eq!(invalid.value, ingredients);
    }

    #[test]
    fn test_hydration_and_effective_hydration() {
        let engine = BakersPercentageEngine::new(Precision::One);
        let mut ingredients = white_bread();
        assert_eq!(engine.hydration(&ingredients), Some(65.0));

        ingredients.push(Ingredient::new("milk", "Milk", IngredientCategory::Dairy, 100.0));
        // 水 325 + 牛奶 87 = 412 → 82.4%
        assert_eq!(engine.effective_hydration(&ingredients), Some(82.4));
        assert_eq!(engine.hydration(&ingredients), Some(65.0));
    }

    #[test]
    fn test_egg_counts_toward_hydration() {
        let engine = BakersPercentageEngine::new(Precision::One);
        let ingredients = vec![
            Ingredient::new("flour", "Bread Flour", IngredientCategory::Flour, 500.0),
            Ingredient::new("water", "Water", IngredientCategory::Liquid, 300.0),
            Ingredient::new("egg", "Whole Egg", IngredientCategory::Egg, 100.0),
        ];
        assert_eq!(engine.hydration(&ingredients), Some(80.0));
    }

    #[test]
    fn test_kg_amounts_round_in_grams() {
        let engine = BakersPercentageEngine::new(Precision::Zero);
        let mut flour = Ingredient::new("flour", "Bread Flour", IngredientCategory::Flour, 1.0);
        flour.unit = "kg".to_string();
        let ingredients = vec![flour, Ingredient::new("water", "Water", IngredientCategory::Liquid, 650.0)];

        let scaled = engine.scale_to_total_weight(&ingredients, 2000.0).value;
        // 1000g × 2000/1650 = 1212.12g → 1212g，仍以 kg 表示
        assert_eq!(scaled.ingredients[0].unit, "kg");
        assert!((scaled.ingredients[0].amount - 1.212).abs() < 1e-12);
        assert!((scaled.achieved_total - 2000.0).abs() <= 1.0);

        let rounded = engine.round_amounts(&ingredients);
        assert!((rounded[0].amount - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_adjust_by_piece_weight() {
        let engine = BakersPercentageEngine::new(Precision::One);
        let scaled = engine.adjust_by_piece_weight(&white_bread(), 60.0, 20);
        assert!(!scaled.has_warnings());
        assert!((scaled.value.achieved_total - 1200.0).abs() <= 0.5);

        let none = engine.adjust_by_piece_weight(&white_bread(), 60.0, 0);
        assert!(none.has_warnings());
        assert_eq!(none.value.ingredients, white_bread());
    }

    #[test]
    fn test_adjust_to_yield() {
        let engine = BakersPercentageEngine::default();
        let doubled = engine.adjust_to_yield(&white_bread(), 12.0, 24.0);
        assert_eq!(doubled.value[0].amount, 800.0);
        assert!(engine.adjust_to_yield(&white_bread(), 0.0, 24.0).has_warnings());
    }

    #[test]
    fn test_validate_ratios() {
        let engine = BakersPercentageEngine::new(Precision::One);
        let lean = engine.validate_ratios(&white_bread());
        assert_eq!(lean.value.hydration, Some(65.0));
        assert_eq!(lean.value.salt_pct, Some(2.0));
        assert_eq!(lean.value.yeast_pct, Some(1.0));
        assert!(!lean.has_warnings());

        let mut salty = white_bread();
        salty[3].amount = 25.0;
        salty[2].amount = 200.0;
        let checked = engine.validate_ratios(&salty);
        assert_eq!(checked.issues.len(), 2);
        assert!(checked.warnings().iter().any(|w| w.contains("水合率 40.0%")));
        assert!(checked.warnings().iter().any(|w| w.contains("盐 5.0%")));
    }

    #[test]
    fn test_unit_issues() {
        let engine = BakersPercentageEngine::default();
        let mut ingredients = white_bread();
        ingredients[4].unit = "packet".to_string();
        let issues = engine.unit_issues(&ingredients);
        assert_eq!(issues.len(), 1);
    }
}
