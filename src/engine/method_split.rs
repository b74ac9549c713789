// ==========================================
// 配方换算引擎 - 制法换算（预发酵拆分）
// ==========================================
// 职责: 按目标制法的 flour_ratio / water_ratio / yeast_adjustment
//       重新拆分预发酵面团与主面团，并按比例调整酵母
// 红线: 拆分不改变总量，预发酵 + 主面团 = 原料总重
// 红线: 目标制法缺少参数时跳过并告警
// ==========================================

use crate::config::{MethodProfile, OverrideBundle};
use crate::domain::conversion::{PrefermentSplit, SplitPortion};
use crate::domain::ingredient::Ingredient;
use crate::domain::types::IngredientCategory;
use crate::error::{Checked, EngineIssue};
use tracing::{debug, instrument};

/// 制法换算结果
#[derive(Debug, Clone, PartialEq)]
pub struct MethodConversion {
    pub method_id: String,
    /// 已调整酵母的原料
    pub ingredients: Vec<Ingredient>,
    /// 目标/来源 酵母倍数之比
    pub yeast_ratio: f64,
    /// 直接法类（无预发酵）为 None
    pub split: Option<PrefermentSplit>,
    pub fermentation_minutes: Option<f64>,
}

// ==========================================
// MethodSplitter - 制法换算
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MethodSplitter;

impl MethodSplitter {
    pub fn new() -> Self {
        Self
    }

    /// 从来源制法换算到目标制法
    ///
    /// 来源制法缺失时酵母基准按 1.0（直接法）计
    #[instrument(skip(self, ingredients, bundle), fields(count = ingredients.len()))]
    pub fn convert(
        &self,
        ingredients: &[Ingredient],
        source_method: &str,
        target_method: &str,
        bundle: &OverrideBundle,
    ) -> Checked<Option<MethodConversion>> {
        let Some(target) = bundle.method(target_method).map(|r| r.value) else {
            return Checked::with_issue(None, EngineIssue::MissingMethodProfile(target_method.to_string()));
        };
        let Some((_, _, target_yeast)) = target.split_parameters() else {
            return Checked::with_issue(None, EngineIssue::IncompleteMethodProfile(target_method.to_string()));
        };

        let source_yeast = bundle
            .method(source_method)
            .and_then(|r| r.value.yeast_adjustment)
            .filter(|y| y.is_finite() && *y > 0.0)
            .unwrap_or(1.0);
        let yeast_ratio = target_yeast / source_yeast;

        let adjusted = self.adjust_yeast(ingredients, yeast_ratio);
        let mut checked = Checked::ok(());
        let split = if target.has_preferment() {
            self.split(&adjusted, target).unpack(&mut checked.issues)
        } else {
            None
        };

        debug!(
            source = source_method,
            target = target_method,
            yeast_ratio,
            has_split = split.is_some(),
            "制法换算完成"
        );

        let conversion = MethodConversion {
            method_id: target.method_id.clone(),
            ingredients: adjusted,
            yeast_ratio,
            split,
            fermentation_minutes: target.fermentation_minutes,
        };
        checked.map(|_| Some(conversion))
    }

    /// 酵母类（leavening）原料按倍数调整
    pub fn adjust_yeast(&self, ingredients: &[Ingredient], yeast_ratio: f64) -> Vec<Ingredient> {
        ingredients
            .iter()
            .map(|i| {
                if i.category == IngredientCategory::Leavening {
                    i.with_amount(i.amount * yeast_ratio)
                } else {
                    i.clone()
                }
            })
            .collect()
    }

    /// 预发酵面团拆分
    ///
    /// - 粉: 各粉类原料按 flour_ratio 取出
    /// - 水: 预发酵粉量 × water_ratio，从液体与蛋按比例取出
    /// - 酵母: 按 preferment_yeast_ratio 进入预发酵，缺省同 flour_ratio
    pub fn split(&self, ingredients: &[Ingredient], profile: &MethodProfile) -> Checked<Option<PrefermentSplit>> {
        let Some((flour_ratio, water_ratio, _)) = profile.split_parameters() else {
            return Checked::with_issue(None, EngineIssue::IncompleteMethodProfile(profile.method_id.clone()));
        };

        let flour_total: f64 = ingredients
            .iter()
            .filter(|i| i.counts_as_flour())
            .map(|i| i.amount_in_grams())
            .sum();
        if flour_total <= 0.0 {
            return Checked::with_issue(None, EngineIssue::EmptyFlourBasis);
        }

        let liquid_total: f64 = ingredients
            .iter()
            .filter(|i| i.is_liquid())
            .map(|i| i.amount_in_grams())
            .sum();
        let yeast_share = profile.preferment_yeast_share(flour_ratio);
        let mut checked = Checked::ok(None);

        let required_water = flour_total * flour_ratio * water_ratio;
        let water_share = if required_water <= 0.0 {
            0.0
        } else if liquid_total <= 0.0 || required_water > liquid_total {
            checked.push(EngineIssue::PrefermentWaterShortage {
                required: required_water,
                available: liquid_total,
            });
            if liquid_total > 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            required_water / liquid_total
        };

        let mut preferment = Vec::new();
        let mut main_dough = Vec::new();
        for ingredient in ingredients {
            let grams = ingredient.amount_in_grams();
            let share = if ingredient.counts_as_flour() {
                flour_ratio
            } else if ingredient.category == IngredientCategory::Leavening {
                yeast_share
            } else if ingredient.is_liquid() {
                water_share
            } else {
                0.0
            };

            let pre_amount = grams * share;
            if pre_amount > 0.0 {
                preferment.push(portion(ingredient, pre_amount));
            }
            let main_amount = grams - pre_amount;
            if main_amount > 0.0 {
                main_dough.push(portion(ingredient, main_amount));
            }
        }

        let preferment_weight = preferment.iter().map(|p| p.amount).sum();
        let main_dough_weight = main_dough.iter().map(|p| p.amount).sum();
        checked.value = Some(PrefermentSplit {
            method_id: profile.method_id.clone(),
            preferment,
            main_dough,
            preferment_weight,
            main_dough_weight,
        });
        checked
    }
}

fn portion(ingredient: &Ingredient, amount: f64) -> SplitPortion {
    SplitPortion {
        ingredient_id: ingredient.id.clone(),
        name: ingredient.name.clone(),
        amount,
    }
}
