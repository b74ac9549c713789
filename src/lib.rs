// ==========================================
// 配方换算与出成率计算引擎 - 核心库
// ==========================================
// 系统定位: 纯计算核心（无 I/O、无全局状态、同步单线程）
// 职责: 烤模容积、烘焙百分比缩放、出成损耗链、环境调整、面温水温、原料替代
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值对象与类型
pub mod domain;

// 配置层 - 分层覆写
pub mod config;

// 引擎层 - 计算规则
pub mod engine;

// 错误与告警
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ConversionConfig, ConversionResult, Ingredient, IngredientCategory, PanConfig, PanShape,
    ProcessStage, ProcessStageSelection, Recipe, StageLossRates, YieldLossResult,
};

// 配置
pub use config::{config_keys, LossRateTable, OverrideBundle, OverrideLayer};

// 引擎
pub use engine::{
    BakersPercentageEngine, ConversionOrchestrator, DdtSolver, EnvironmentAdjustor,
    PanningAdvisor, SubstitutionResolver, VolumeCalculator, YieldLossChain,
};

// 错误
pub use error::{Checked, ConfigError, ConversionError, EngineIssue, IssueKind};

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const ENGINE_NAME: &str = "配方换算与出成率计算引擎";
