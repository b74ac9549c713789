// ==========================================
// 配方换算引擎 - 原料替代规则
// ==========================================
// 说明: ratio 为乘数，替代品重量 = 原料重量 × ratio
//       quality_impact 只用于展示，不参与计算
// ==========================================

use crate::domain::ingredient::normalize_key;
use crate::domain::types::{IngredientCategory, QualityImpact};
use serde::{Deserialize, Serialize};

/// 规则来源：内置 / 用户自定义（界面区分显示，计算上同等对待）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    BuiltIn,
    User,
}

impl Default for RuleSource {
    fn default() -> Self {
        RuleSource::BuiltIn
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRule {
    pub original: String,                  // 原料键
    pub substitute: String,                // 替代品键
    pub ratio: f64,                        // 重量乘数
    pub quality_impact: QualityImpact,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source: RuleSource,
    /// 替代品所属分类（缺省沿用原料分类）
    #[serde(default)]
    pub substitute_category: Option<IngredientCategory>,
    /// 替代品含水率，用于保水补偿
    #[serde(default)]
    pub substitute_moisture_pct: Option<f64>,
}

impl SubstitutionRule {
    pub fn new(original: &str, substitute: &str, ratio: f64, quality_impact: QualityImpact) -> Self {
        Self {
            original: normalize_key(original),
            substitute: normalize_key(substitute),
            ratio,
            quality_impact,
            notes: String::new(),
            source: RuleSource::BuiltIn,
            substitute_category: None,
            substitute_moisture_pct: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    pub fn with_substitute_category(mut self, category: IngredientCategory) -> Self {
        self.substitute_category = Some(category);
        self
    }

    pub fn with_substitute_moisture(mut self, moisture_pct: f64) -> Self {
        self.substitute_moisture_pct = Some(moisture_pct);
        self
    }

    pub fn as_user_rule(mut self) -> Self {
        self.source = RuleSource::User;
        self
    }

    pub fn matches_original(&self, ingredient_name: &str) -> bool {
        normalize_key(&self.original) == normalize_key(ingredient_name)
    }

    pub fn matches_substitute(&self, substitute_key: &str) -> bool {
        normalize_key(&self.substitute) == normalize_key(substitute_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_matching_is_normalized() {
        let rule = SubstitutionRule::new("Unsalted Butter", "Vegetable Oil", 0.8, QualityImpact::Moderate);
        assert!(rule.matches_original("unsalted butter"));
        assert!(rule.matches_original("UNSALTED-BUTTER"));
        assert!(rule.matches_substitute("vegetable_oil"));
        assert_eq!(rule.source, RuleSource::BuiltIn);
        assert_eq!(rule.as_user_rule().source, RuleSource::User);
    }
}
