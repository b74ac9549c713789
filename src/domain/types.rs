// ==========================================
// 配方换算引擎 - 领域类型定义
// ==========================================
// 职责: 引擎共用的枚举类型
// 序列化格式: snake_case (与前端设置快照一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 原料分类 (Ingredient Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    Flour,     // 粉类
    Liquid,    // 液体
    Fat,       // 油脂
    Sugar,     // 糖类
    Egg,       // 蛋
    Dairy,     // 乳制品
    Leavening, // 酵母/膨松剂
    Salt,      // 盐
    Flavoring, // 风味料
    Other,     // 其他
}

impl IngredientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Flour => "flour",
            IngredientCategory::Liquid => "liquid",
            IngredientCategory::Fat => "fat",
            IngredientCategory::Sugar => "sugar",
            IngredientCategory::Egg => "egg",
            IngredientCategory::Dairy => "dairy",
            IngredientCategory::Leavening => "leavening",
            IngredientCategory::Salt => "salt",
            IngredientCategory::Flavoring => "flavoring",
            IngredientCategory::Other => "other",
        }
    }

    /// 未单独填写含水率时使用的默认含水率（%）
    ///
    /// 液体按 100% 计；粉类等干料按 0 计
    pub fn default_moisture_pct(&self) -> f64 {
        match self {
            IngredientCategory::Liquid => 100.0,
            IngredientCategory::Dairy => 87.0,
            IngredientCategory::Egg => 75.0,
            IngredientCategory::Fat => 16.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for IngredientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IngredientCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flour" => Ok(IngredientCategory::Flour),
            "liquid" => Ok(IngredientCategory::Liquid),
            "fat" => Ok(IngredientCategory::Fat),
            "sugar" => Ok(IngredientCategory::Sugar),
            "egg" => Ok(IngredientCategory::Egg),
            "dairy" => Ok(IngredientCategory::Dairy),
            "leavening" => Ok(IngredientCategory::Leavening),
            "salt" => Ok(IngredientCategory::Salt),
            "flavoring" => Ok(IngredientCategory::Flavoring),
            "other" => Ok(IngredientCategory::Other),
            other => Err(format!("未知原料分类: {}", other)),
        }
    }
}

// ==========================================
// 工序阶段 (Process Stage)
// ==========================================
// 红线: 固定顺序 mixing → fermentation → dividing → shaping → baking → cooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStage {
    Mixing,       // 搅拌
    Fermentation, // 发酵
    Dividing,     // 分割
    Shaping,      // 整形
    Baking,       // 烘烤
    Cooling,      // 冷却
}

impl ProcessStage {
    /// 按工艺顺序排列的全部阶段
    pub const ALL: [ProcessStage; 6] = [
        ProcessStage::Mixing,
        ProcessStage::Fermentation,
        ProcessStage::Dividing,
        ProcessStage::Shaping,
        ProcessStage::Baking,
        ProcessStage::Cooling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStage::Mixing => "mixing",
            ProcessStage::Fermentation => "fermentation",
            ProcessStage::Dividing => "dividing",
            ProcessStage::Shaping => "shaping",
            ProcessStage::Baking => "baking",
            ProcessStage::Cooling => "cooling",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            ProcessStage::Mixing => "搅拌",
            ProcessStage::Fermentation => "发酵",
            ProcessStage::Dividing => "分割",
            ProcessStage::Shaping => "整形",
            ProcessStage::Baking => "烘烤",
            ProcessStage::Cooling => "冷却",
        }
    }
}

impl fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 替代品质影响 (Quality Impact)
// ==========================================
// 仅用于展示，不参与比例计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityImpact {
    None,     // 无影响
    Minor,    // 轻微
    Moderate, // 中等
    #[serde(alias = "significant")]
    Major,    // 明显
}

impl fmt::Display for QualityImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityImpact::None => write!(f, "none"),
            QualityImpact::Minor => write!(f, "minor"),
            QualityImpact::Moderate => write!(f, "moderate"),
            QualityImpact::Major => write!(f, "major"),
        }
    }
}

// ==========================================
// 搅拌机类型 (Mixer Type)
// ==========================================
// 摩擦升温系数默认值见 config::defaults，可按层覆写
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixerType {
    Hand,                       // 手揉
    Stand,                      // 台式
    Spiral,                     // 螺旋
    Planetary,                  // 行星
    Intensive,                  // 高速强力
    Custom { friction_c: f64 }, // 用户自定义摩擦升温
}

impl MixerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MixerType::Hand => "hand",
            MixerType::Stand => "stand",
            MixerType::Spiral => "spiral",
            MixerType::Planetary => "planetary",
            MixerType::Intensive => "intensive",
            MixerType::Custom { .. } => "custom",
        }
    }
}

impl Default for MixerType {
    fn default() -> Self {
        MixerType::Hand
    }
}

// ==========================================
// 原料变更类型 (Change Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Increase,  // 增加
    Decrease,  // 减少
    Unchanged, // 不变
    New,       // 新增
    Removed,   // 移除
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Increase => write!(f, "increase"),
            ChangeType::Decrease => write!(f, "decrease"),
            ChangeType::Unchanged => write!(f, "unchanged"),
            ChangeType::New => write!(f, "new"),
            ChangeType::Removed => write!(f, "removed"),
        }
    }
}

// ==========================================
// 数值精度 (Precision)
// ==========================================
// 重量与烘焙百分比的小数位数: 0 / 1 / 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Zero,
    One,
    Two,
}

impl Precision {
    pub fn decimals(&self) -> u32 {
        match self {
            Precision::Zero => 0,
            Precision::One => 1,
            Precision::Two => 2,
        }
    }

    /// 一个舍入单位（例如 One → 0.1）
    pub fn unit(&self) -> f64 {
        1.0 / 10f64.powi(self.decimals() as i32)
    }

    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.decimals() as i32);
        (value * scale).round() / scale
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision::One
    }
}
