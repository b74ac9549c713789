// ==========================================
// 配方换算引擎 - 原料替代解析
// ==========================================
// 职责: 按覆写优先级收集替代规则，并把替代应用到原料
// 红线: 用户规则与内置规则并存（叠加），不互相排斥
// 红线: 替代品换新ID（{原ID}:{替代键}），差异对比表现为 移除 + 新增
// ==========================================

use crate::config::{OverrideBundle, OverrideLayer};
use crate::domain::conversion::SubstitutionRequest;
use crate::domain::ingredient::{normalize_key, Ingredient};
use crate::domain::substitution::SubstitutionRule;
use crate::domain::types::IngredientCategory;
use crate::error::{Checked, EngineIssue};
use tracing::{debug, instrument};

// 含水差异小于该值（克）时不做补偿
const MOISTURE_EPSILON_G: f64 = 0.05;

/// 保水补偿后的替代结果
#[derive(Debug, Clone, PartialEq)]
pub struct CompensatedSubstitution {
    pub substitute: Ingredient,
    /// 需要补回（正）或扣除（负）的液体克数
    pub water_delta: f64,
}

// ==========================================
// SubstitutionResolver - 替代解析
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubstitutionResolver;

impl SubstitutionResolver {
    pub fn new() -> Self {
        Self
    }

    /// 原料的全部可用替代规则
    ///
    /// - 内置/分类/产品层按替代键合并，高优先级层覆盖同键规则
    /// - 用户层规则追加在后（source = User），不覆盖内置规则
    pub fn resolve(&self, ingredient_name: &str, bundle: &OverrideBundle) -> Vec<SubstitutionRule> {
        let key = normalize_key(ingredient_name);
        let mut rules: Vec<SubstitutionRule> = Vec::new();

        for layer in [OverrideLayer::BuiltinDefault, OverrideLayer::Category, OverrideLayer::Product] {
            let Some(layer_rules) = bundle.substitutions.layer(layer).get(&key) else {
                continue;
            };
            for rule in layer_rules {
                match rules.iter_mut().find(|r| r.matches_substitute(&rule.substitute)) {
                    Some(existing) => *existing = rule.clone(),
                    None => rules.push(rule.clone()),
                }
            }
        }

        if let Some(user_rules) = bundle.substitutions.layer(OverrideLayer::UserCustom).get(&key) {
            rules.extend(user_rules.iter().cloned().map(SubstitutionRule::as_user_rule));
        }

        rules
    }

    /// 查找指定替代品的规则（同键时用户规则优先）
    pub fn find_rule(&self, ingredient: &Ingredient, substitute_key: &str, bundle: &OverrideBundle) -> Option<SubstitutionRule> {
        let mut candidates = self.resolve(&ingredient.name, bundle);
        if candidates.is_empty() {
            candidates = self.resolve(&ingredient.id, bundle);
        }
        candidates
            .into_iter()
            .rev()
            .find(|rule| rule.matches_substitute(substitute_key))
    }

    /// 替代品重量 = 原料重量 × ratio
    pub fn apply(&self, ingredient: &Ingredient, rule: &SubstitutionRule) -> Ingredient {
        self.substitute_with_amount(ingredient, rule, ingredient.amount * rule.ratio)
    }

    /// 按 ratio 替代，同时计算保持总含水量所需的液体增减
    pub fn apply_moisture_compensated(&self, ingredient: &Ingredient, rule: &SubstitutionRule) -> CompensatedSubstitution {
        let substitute = self.apply(ingredient, rule);
        let water_delta = ingredient.water_content_grams() - substitute.water_content_grams();
        CompensatedSubstitution {
            substitute,
            water_delta: if water_delta.abs() < MOISTURE_EPSILON_G { 0.0 } else { water_delta },
        }
    }

    fn substitute_with_amount(&self, ingredient: &Ingredient, rule: &SubstitutionRule, amount: f64) -> Ingredient {
        Ingredient {
            id: format!("{}:{}", ingredient.id, rule.substitute),
            name: rule.substitute.clone(),
            category: rule.substitute_category.unwrap_or(ingredient.category),
            amount,
            unit: ingredient.unit.clone(),
            is_flour: ingredient.is_flour,
            moisture_pct: rule.substitute_moisture_pct.or(ingredient.moisture_pct),
        }
    }

    // ==========================================
    // 批量应用替代请求
    // ==========================================

    /// 按请求顺序逐个替代；找不到原料或规则时跳过并告警
    #[instrument(skip(self, ingredients, requests, bundle), fields(requests = requests.len()))]
    pub fn apply_requests(
        &self,
        ingredients: &[Ingredient],
        requests: &[SubstitutionRequest],
        bundle: &OverrideBundle,
    ) -> Checked<Vec<Ingredient>> {
        let mut checked = Checked::ok(ingredients.to_vec());

        for request in requests {
            let Some(index) = checked.value.iter().position(|i| i.id == request.ingredient_id) else {
                checked.push(EngineIssue::UnknownIngredient(request.ingredient_id.clone()));
                continue;
            };
            let original = checked.value[index].clone();

            let Some(rule) = self.find_rule(&original, &request.substitute_key, bundle) else {
                checked.push(EngineIssue::MissingSubstitutionRule {
                    ingredient: original.name.clone(),
                    substitute: request.substitute_key.clone(),
                });
                continue;
            };

            if request.moisture_compensated {
                let outcome = self.apply_moisture_compensated(&original, &rule);
                checked.value[index] = outcome.substitute;
                compensate_liquid(&mut checked.value, outcome.water_delta, &original.id);
            } else {
                checked.value[index] = self.apply(&original, &rule);
            }

            debug!(
                ingredient = %original.id,
                substitute = %rule.substitute,
                ratio = rule.ratio,
                source = ?rule.source,
                "原料替代"
            );
        }

        checked
    }
}

/// 把含水差异计入第一个液体原料；无液体且需补水时新增一项水
fn compensate_liquid(ingredients: &mut Vec<Ingredient>, water_delta: f64, origin_id: &str) {
    if water_delta == 0.0 {
        return;
    }
    match ingredients.iter_mut().find(|i| i.is_plain_liquid()) {
        Some(liquid) => {
            let grams = (liquid.amount_in_grams() + water_delta).max(0.0);
            *liquid = liquid.with_amount_in_grams(grams);
        }
        None if water_delta > 0.0 => {
            ingredients.push(Ingredient::new(
                &format!("{}:water", origin_id),
                "water",
                IngredientCategory::Liquid,
                water_delta,
            ));
        }
        None => debug!(water_delta, "无液体原料可扣减，忽略保水补偿"),
    }
}
