// ==========================================
// 配方换算引擎 - 原料领域模型
// ==========================================
// 红线: 烘焙百分比是派生值，不作为事实存储
// ==========================================

use crate::domain::types::IngredientCategory;
use crate::domain::units::WeightUnit;
use serde::{Deserialize, Serialize};

// ==========================================
// Ingredient - 原料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,                    // 原料ID（差异对比的主键）
    pub name: String,                  // 原料名称
    pub category: IngredientCategory,  // 原料分类
    pub amount: f64,                   // 重量（按 unit 计）
    #[serde(default = "default_unit")]
    pub unit: String,                  // 单位 (g/kg/oz/lb)
    #[serde(default)]
    pub is_flour: bool,                // 计入粉量基准（如全麦粉归入其他分类时）
    #[serde(default)]
    pub moisture_pct: Option<f64>,     // 含水率 (%)，缺省按分类默认值
}

fn default_unit() -> String {
    "g".to_string()
}

impl Ingredient {
    /// 以克为单位创建原料
    pub fn new(id: &str, name: &str, category: IngredientCategory, amount: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            amount,
            unit: default_unit(),
            is_flour: false,
            moisture_pct: None,
        }
    }

    /// 是否计入粉量基准
    pub fn counts_as_flour(&self) -> bool {
        self.category == IngredientCategory::Flour || self.is_flour
    }

    /// 是否计入水合率的液体（液体 + 蛋）
    pub fn is_liquid(&self) -> bool {
        matches!(self.category, IngredientCategory::Liquid | IngredientCategory::Egg)
    }

    /// 纯液体（水、果汁等），不含蛋
    ///
    /// 保水补偿与冰水计算只动这一类
    pub fn is_plain_liquid(&self) -> bool {
        self.category == IngredientCategory::Liquid
    }

    /// 识别后的重量单位（无法识别时按克处理）
    pub fn weight_unit(&self) -> Option<WeightUnit> {
        WeightUnit::parse(&self.unit)
    }

    pub fn amount_in_grams(&self) -> f64 {
        self.weight_unit()
            .unwrap_or(WeightUnit::Gram)
            .to_grams(self.amount)
    }

    /// 实际含水率 (%)
    pub fn effective_moisture_pct(&self) -> f64 {
        self.moisture_pct
            .unwrap_or_else(|| self.category.default_moisture_pct())
            .clamp(0.0, 100.0)
    }

    /// 以克为单位的含水量
    pub fn water_content_grams(&self) -> f64 {
        self.amount_in_grams() * self.effective_moisture_pct() / 100.0
    }

    /// 用于替代规则匹配的规范化键
    pub fn lookup_key(&self) -> String {
        normalize_key(&self.name)
    }

    /// 返回替换重量后的新原料（不修改自身）
    pub fn with_amount(&self, amount: f64) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// 以克数设置重量，按原单位回写
    pub fn with_amount_in_grams(&self, grams: f64) -> Self {
        let amount = self
            .weight_unit()
            .unwrap_or(WeightUnit::Gram)
            .from_grams(grams);
        self.with_amount(amount)
    }
}

/// 原料名称规范化：去首尾空白、小写、空白与连字符统一为下划线
pub fn normalize_key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// 原料列表总重（克）
pub fn total_weight_grams(ingredients: &[Ingredient]) -> f64 {
    ingredients.iter().map(|i| i.amount_in_grams()).sum()
}
