// ==========================================
// 配方换算引擎 - 引擎层
// ==========================================
// 职责: 纯计算规则（容积、装模、百分比、损耗链、环境、水温、替代、编排）
// 红线: 引擎无状态、无 I/O，相同输入必得相同输出
// ==========================================

pub mod bakers_percentage;
pub mod ddt;
pub mod diff;
pub mod environment;
pub mod method_split;
pub mod orchestrator;
pub mod panning;
pub mod substitution;
pub mod volume;
pub mod yield_loss;

// 重导出核心引擎
pub use bakers_percentage::{BakersPercentageEngine, RatioCheck, ScaledIngredients};
pub use ddt::DdtSolver;
pub use diff::DiffEngine;
pub use environment::{
    AdjustmentRange, AltitudeAdjustment, AltitudeBand, EnvironmentAdjustor, EnvironmentAssessment,
    HumidityAdvisory, HumidityLevel,
};
pub use method_split::{MethodConversion, MethodSplitter};
pub use orchestrator::{ConversionOrchestrator, PanScale};
pub use panning::{PanningAdvice, PanningAdvisor};
pub use substitution::{CompensatedSubstitution, SubstitutionResolver};
pub use volume::{VolumeCalculator, DEFAULT_LOAF_TAPER_RATIO};
pub use yield_loss::YieldLossChain;
