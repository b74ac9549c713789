// ==========================================
// 配方换算引擎 - 配方与烤模领域模型
// ==========================================
// 约定: 尺寸单位 cm，容积单位 cm³（与 ml 等价，作为面团容量代理）
// 红线: 配方原料总重 = 面团总重
// ==========================================

use crate::domain::ingredient::{total_weight_grams, Ingredient};
use serde::{Deserialize, Serialize};

// ==========================================
// PanShape - 烤模形状
// ==========================================
// 每种形状只携带与之相关的尺寸，避免可选字段的组合歧义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanShape {
    Rectangle {
        length_cm: f64,
        width_cm: f64,
        height_cm: f64,
    },
    Round {
        diameter_cm: f64,
        height_cm: f64,
    },
    Loaf {
        length_cm: f64,
        width_cm: f64,
        /// 底部内宽；未实测时按 width × 收窄系数估算
        #[serde(default)]
        inner_width_cm: Option<f64>,
        height_cm: f64,
    },
    Chiffon {
        outer_diameter_cm: f64,
        inner_diameter_cm: f64,
        height_cm: f64,
    },
    /// 仅有用户填写的容积
    Custom,
}

impl PanShape {
    pub fn kind(&self) -> &'static str {
        match self {
            PanShape::Rectangle { .. } => "rectangle",
            PanShape::Round { .. } => "round",
            PanShape::Loaf { .. } => "loaf",
            PanShape::Chiffon { .. } => "chiffon",
            PanShape::Custom => "custom",
        }
    }
}

// ==========================================
// PanConfig - 烤模配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanConfig {
    pub shape: PanShape,
    #[serde(default)]
    pub volume_cm3: Option<f64>, // 用户填写的容积（尺寸缺失时使用）
    #[serde(default = "default_fill_ratio")]
    pub fill_ratio: f64,         // 填充率 (0~1)
}

fn default_fill_ratio() -> f64 {
    1.0
}

impl PanConfig {
    pub fn new(shape: PanShape, fill_ratio: f64) -> Self {
        Self {
            shape,
            volume_cm3: None,
            fill_ratio,
        }
    }

    /// 仅凭容积描述的烤模
    pub fn with_volume(volume_cm3: f64, fill_ratio: f64) -> Self {
        Self {
            shape: PanShape::Custom,
            volume_cm3: Some(volume_cm3),
            fill_ratio,
        }
    }

    /// 填充率是否有效 (0, 1]
    pub fn has_valid_fill_ratio(&self) -> bool {
        self.fill_ratio.is_finite() && self.fill_ratio > 0.0 && self.fill_ratio <= 1.0
    }
}

// ==========================================
// RecipeMethod - 制法
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMethod {
    pub method: String,                    // 制法标识 (straight/poolish/...)
    #[serde(default)]
    pub fermentation_minutes: Option<f64>, // 基准温度下的发酵时间
}

impl RecipeMethod {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            fermentation_minutes: None,
        }
    }
}

// ==========================================
// RecipeYield - 产量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeYield {
    pub quantity: f64,
    pub unit: String,
}

// ==========================================
// Recipe - 配方
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<Ingredient>,         // 有序原料列表
    pub pan: PanConfig,
    pub method: RecipeMethod,
    #[serde(rename = "yield")]
    pub yield_info: RecipeYield,
    #[serde(default)]
    pub product_category: Option<String>,     // 产品大类（损耗率分类层）
    #[serde(default)]
    pub product_key: Option<String>,          // 产品键（损耗率产品层）
}

impl Recipe {
    /// 面团总重（克）
    pub fn total_weight(&self) -> f64 {
        total_weight_grams(&self.ingredients)
    }

    pub fn find_ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    /// 返回替换原料列表后的新配方
    pub fn with_ingredients(&self, ingredients: Vec<Ingredient>) -> Self {
        Self {
            ingredients,
            ..self.clone()
        }
    }
}
