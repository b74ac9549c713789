// ==========================================
// 配方换算引擎 - 换算请求/结果模型
// ==========================================
// 红线: 所有对象按次构造、不可变；引擎不修改输入，只返回新对象
// ==========================================

use crate::config::OverrideBundle;
use crate::domain::recipe::{PanConfig, Recipe};
use crate::domain::types::{ChangeType, MixerType, Precision};
use crate::domain::yield_loss::{ProcessStageSelection, YieldLossResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 输入: 面温 / 环境 / 替代请求
// ==========================================

/// 面温（DDT）计算参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DdtSettings {
    pub target_temp_c: f64,              // 目标面温
    pub room_temp_c: f64,                // 室温
    pub flour_temp_c: f64,               // 粉温
    #[serde(default)]
    pub mixer: MixerType,                // 搅拌机类型
    #[serde(default)]
    pub temp_factor_count: Option<u32>,  // 温度因子数（缺省取配置，通常为 3）
    #[serde(default)]
    pub preferment_temp_c: Option<f64>,  // 预发酵面团温度（4 因子公式）
}

/// 环境条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSettings {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    #[serde(default)]
    pub altitude_m: f64,
    /// true = 将海拔/湿度调整直接应用到原料；false = 仅给出提示
    #[serde(default)]
    pub auto_adjust: bool,
}

/// 原料替代请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRequest {
    pub ingredient_id: String,
    pub substitute_key: String,
    /// 按含水差异补偿替代比例
    #[serde(default)]
    pub moisture_compensated: bool,
}

// ==========================================
// ConversionConfig - 换算配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionConfig {
    #[serde(default)]
    pub target_pan: Option<PanConfig>,
    #[serde(default)]
    pub target_method: Option<String>,
    #[serde(default = "default_batch_multiplier")]
    pub batch_multiplier: f64,
    #[serde(default)]
    pub ddt_settings: Option<DdtSettings>,
    #[serde(default)]
    pub environment: Option<EnvironmentSettings>,
    #[serde(default)]
    pub stage_selection: Option<ProcessStageSelection>,
    #[serde(default)]
    pub substitutions: Vec<SubstitutionRequest>,
    #[serde(default)]
    pub precision: Precision,
    /// 缺省为内置默认层
    #[serde(default = "OverrideBundle::with_builtin_defaults")]
    pub overrides: OverrideBundle,
}

fn default_batch_multiplier() -> f64 {
    1.0
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target_pan: None,
            target_method: None,
            batch_multiplier: default_batch_multiplier(),
            ddt_settings: None,
            environment: None,
            stage_selection: None,
            substitutions: Vec::new(),
            precision: Precision::default(),
            overrides: OverrideBundle::with_builtin_defaults(),
        }
    }
}

// ==========================================
// 输出: 百分比 / 差异 / 摘要
// ==========================================

/// 单个原料的烘焙百分比（粉量为 0 时为 None）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientPercentage {
    pub ingredient_id: String,
    pub name: String,
    pub percentage: Option<f64>,
}

/// 原料差异
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionDiff {
    pub ingredient_id: String,
    pub name: String,
    pub change_type: ChangeType,
    pub original_amount: Option<f64>,
    pub converted_amount: Option<f64>,
    /// 变化百分比；新增原料无基数时为 None
    pub percent_change: Option<f64>,
}

/// 实际生效的换算类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    Pan,
    Batch,
    Method,
    Environment,
    Substitution,
}

impl ConversionKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ConversionKind::Pan => "📐",
            ConversionKind::Batch => "✖️",
            ConversionKind::Method => "🔄",
            ConversionKind::Environment => "🌡️",
            ConversionKind::Substitution => "🔀",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConversionKind::Pan => "烤模换算",
            ConversionKind::Batch => "批量倍数",
            ConversionKind::Method => "制法换算",
            ConversionKind::Environment => "环境调整",
            ConversionKind::Substitution => "原料替代",
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveConversion {
    pub kind: ConversionKind,
    pub icon: String,
    pub label: String,
}

impl From<ConversionKind> for ActiveConversion {
    fn from(kind: ConversionKind) -> Self {
        Self {
            kind,
            icon: kind.icon().to_string(),
            label: kind.label().to_string(),
        }
    }
}

/// 换算摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSummary {
    pub scale_factor: f64,
    pub total_original_weight: f64,
    pub total_converted_weight: f64,
    pub hydration_original: Option<f64>,
    pub hydration_converted: Option<f64>,
    pub warnings: Vec<String>,
    pub active_conversions: Vec<ActiveConversion>,
}

// ==========================================
// 输出: 预发酵拆分 / 发酵指导 / 水温
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitPortion {
    pub ingredient_id: String,
    pub name: String,
    pub amount: f64,
}

/// 预发酵面团 / 主面团拆分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefermentSplit {
    pub method_id: String,
    pub preferment: Vec<SplitPortion>,
    pub main_dough: Vec<SplitPortion>,
    pub preferment_weight: f64,
    pub main_dough_weight: f64,
}

/// 发酵时间指导（Q10 模型）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FermentationGuidance {
    pub temperature_c: f64,
    pub coefficient: f64,
    pub base_minutes: Option<f64>,
    pub adjusted_minutes: Option<f64>,
}

/// 冰水用量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceRequirement {
    pub ice_weight: f64,
    pub tap_water_weight: f64,
    pub tap_water_temp_c: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterTempStatus {
    Feasible,
    Infeasible, // 超出物理可行范围，说明输入有误
}

/// 水温计算结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DdtResult {
    pub water_temp_c: f64,
    pub status: WaterTempStatus,
    pub friction_c: f64,
    pub temp_factor_count: u32,
    #[serde(default)]
    pub ice: Option<IceRequirement>,
    pub warnings: Vec<String>,
}

impl DdtResult {
    pub fn is_feasible(&self) -> bool {
        self.status == WaterTempStatus::Feasible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanningStatus {
    Ok,
    Overfill,  // 面团过多，可能溢出
    Underfill, // 面团过少，烤模偏大
}

/// 装模量检查
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanningCheck {
    pub product: String,
    pub status: PanningStatus,
    /// 实际面团重 / 推荐面团重 × 100
    pub fill_percent: f64,
    pub recommended_weight: f64,
    pub message: String,
    #[serde(default)]
    pub tip: Option<String>,
}

// ==========================================
// ConversionResult - 换算总结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub recipe: Recipe,
    pub percentages: Vec<IngredientPercentage>,
    pub diffs: Vec<ConversionDiff>,
    pub summary: ConversionSummary,
    pub preferment_split: Option<PrefermentSplit>,
    pub fermentation: Option<FermentationGuidance>,
    pub environment_tips: Vec<String>,
    pub water_temperature: Option<DdtResult>,
    pub yield_projection: Option<YieldLossResult>,
    /// 有产品键且烤模容积可算时给出
    #[serde(default)]
    pub panning: Option<PanningCheck>,
}
