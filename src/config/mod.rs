// ==========================================
// 配方换算引擎 - 配置层
// ==========================================
// 职责: 可调参数的分层覆写（内置默认 < 分类 < 产品 < 用户自定义）
// 红线: 不读取全局配置，配置包随每次调用显式传入
// ==========================================

pub mod defaults;
pub mod method_profile;
pub mod override_bundle;
pub mod override_layers;
pub mod panning_profile;

// 重导出
pub use method_profile::MethodProfile;
pub use override_bundle::{config_keys, LossRateTable, OverrideBundle, ResolvedLossRates};
pub use override_layers::{OverrideLayer, OverrideLayers, Resolved};
pub use panning_profile::PanningProfile;
