// ==========================================
// 配方换算引擎 - 领域模型层
// ==========================================
// 职责: 定义配方、原料、烤模、损耗、换算请求/结果等值对象
// 红线: 不含引擎逻辑，所有对象按值传递、不可变使用
// ==========================================

pub mod conversion;
pub mod ingredient;
pub mod recipe;
pub mod substitution;
pub mod types;
pub mod units;
pub mod yield_loss;

// 重导出核心类型
pub use conversion::{
    ActiveConversion, ConversionConfig, ConversionDiff, ConversionKind, ConversionResult,
    ConversionSummary, DdtResult, DdtSettings, EnvironmentSettings, FermentationGuidance,
    IceRequirement, IngredientPercentage, PanningCheck, PanningStatus, PrefermentSplit,
    SplitPortion, SubstitutionRequest, WaterTempStatus,
};
pub use ingredient::{normalize_key, total_weight_grams, Ingredient};
pub use recipe::{PanConfig, PanShape, Recipe, RecipeMethod, RecipeYield};
pub use substitution::{RuleSource, SubstitutionRule};
pub use types::{
    ChangeType, IngredientCategory, MixerType, Precision, ProcessStage, QualityImpact,
};
pub use units::WeightUnit;
pub use yield_loss::{
    ProcessLoss, ProcessStageSelection, ReverseYieldResult, StageLossRates, YieldEnvironment,
    YieldLossResult,
};
