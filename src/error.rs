// ==========================================
// 配方换算引擎 - 错误与告警类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 实时重算不得因不完整输入而中断
//       非致命情况一律降级为告警（warnings[]），不返回 Err
// ==========================================

use crate::domain::types::ProcessStage;
use thiserror::Error;

/// 告警分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// 输入错误：尺寸/重量非正、格式不符
    Input,
    /// 计算错误：除零保护（粉量为 0、出成乘数为 0）
    Computation,
    /// 配置错误：覆写数据缺失，回退到更通用的层或保守默认值
    Configuration,
}

// ==========================================
// EngineIssue - 引擎告警
// ==========================================
// Display 文案即 warnings[] 中展示给用户的文本
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineIssue {
    // ===== 输入错误 =====
    #[error("烤模尺寸无效（存在 ≤0 的尺寸）: shape={shape}，容积按 0 计")]
    NonPositiveDimension { shape: String },

    #[error("重量无效: {context}={value}，已跳过计算")]
    NonPositiveWeight { context: String, value: f64 },

    #[error("填充率无效: {pan}={value}（应在 0~1 之间），按 1.0 计算")]
    InvalidFillRatio { pan: String, value: f64 },

    #[error("批量倍数无效: {0}（必须 >0），按 1.0 计算")]
    InvalidBatchMultiplier(f64),

    #[error("缩放系数无效: {0}，原料保持不变")]
    InvalidScaleFactor(f64),

    #[error("无法识别的单位: ingredient={ingredient}, unit={unit}，按克处理")]
    UnknownUnit { ingredient: String, unit: String },

    #[error("损耗率为负: stage={stage}, rate={rate}，按 0 计算")]
    NegativeLossRate { stage: ProcessStage, rate: f64 },

    #[error("损耗率超过 100%: stage={stage}, rate={rate}，按 100 计算")]
    ExcessiveLossRate { stage: ProcessStage, rate: f64 },

    #[error("配方缺少原料，无法换算")]
    MissingIngredients,

    #[error("配方原料总重为 0，无法换算")]
    NoPositiveWeight,

    #[error("{ratio} {value:.1}% 超出常用范围 {min}~{max}%")]
    RatioOutOfRange { ratio: String, value: f64, min: f64, max: f64 },

    // ===== 计算错误 =====
    #[error("粉量基准为 0，无法计算烘焙百分比")]
    EmptyFlourBasis,

    #[error("出成乘数 ≤0（损耗率合计过高），无法反推投料量")]
    ZeroYieldMultiplier,

    #[error("{which}烤模容积缺失或为 0，跳过烤模换算（系数按 1.0，配方保留原烤模）")]
    MissingPanVolume { which: String },

    #[error("计算水温 {value:.1}°C 超出可行范围 [{min}, {max}]°C，请检查室温/粉温输入")]
    InfeasibleWaterTemperature { value: f64, min: f64, max: f64 },

    // ===== 配置错误 =====
    #[error("未找到制法配置: {0}，跳过制法换算")]
    MissingMethodProfile(String),

    #[error("制法配置缺少预发酵比例: {0}，跳过制法换算")]
    IncompleteMethodProfile(String),

    #[error("损耗率表缺少{layer}条目: {key}，回退到上一级")]
    MissingLossRateEntry { layer: String, key: String },

    #[error("配置项缺失: {key}，使用默认值 {fallback}")]
    MissingConfigValue { key: String, fallback: f64 },

    #[error("未找到装模参数: {0}，按比容积 3.5cm³/g、满模估算")]
    MissingPanningProfile(String),

    #[error("未找到替代规则: {ingredient} → {substitute}")]
    MissingSubstitutionRule { ingredient: String, substitute: String },

    #[error("替代请求引用了不存在的原料: {0}")]
    UnknownIngredient(String),

    #[error("预发酵需水 {required:.1}g 超过配方液体 {available:.1}g，按可用液体计算")]
    PrefermentWaterShortage { required: f64, available: f64 },
}

impl EngineIssue {
    pub fn kind(&self) -> IssueKind {
        use EngineIssue::*;
        match self {
            NonPositiveDimension { .. }
            | NonPositiveWeight { .. }
            | InvalidFillRatio { .. }
            | InvalidBatchMultiplier(_)
            | InvalidScaleFactor(_)
            | UnknownUnit { .. }
            | NegativeLossRate { .. }
            | ExcessiveLossRate { .. }
            | MissingIngredients
            | NoPositiveWeight
            | RatioOutOfRange { .. } => IssueKind::Input,

            EmptyFlourBasis
            | ZeroYieldMultiplier
            | MissingPanVolume { .. }
            | InfeasibleWaterTemperature { .. } => IssueKind::Computation,

            MissingMethodProfile(_)
            | IncompleteMethodProfile(_)
            | MissingLossRateEntry { .. }
            | MissingConfigValue { .. }
            | MissingPanningProfile(_)
            | MissingSubstitutionRule { .. }
            | UnknownIngredient(_)
            | PrefermentWaterShortage { .. } => IssueKind::Configuration,
        }
    }

    /// 必需输入缺失（结果整体无效）
    pub fn is_hard(&self) -> bool {
        matches!(self, EngineIssue::MissingIngredients | EngineIssue::NoPositiveWeight)
    }
}

// ==========================================
// Checked - 带告警的计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Checked<T> {
    pub value: T,
    pub issues: Vec<EngineIssue>,
}

impl<T> Checked<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    pub fn with_issue(value: T, issue: EngineIssue) -> Self {
        Self {
            value,
            issues: vec![issue],
        }
    }

    pub fn push(&mut self, issue: EngineIssue) {
        self.issues.push(issue);
    }

    pub fn has_warnings(&self) -> bool {
        !self.issues.is_empty()
    }

    /// 告警文本（warnings[] 展示用）
    pub fn warnings(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.to_string()).collect()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
        Checked {
            value: f(self.value),
            issues: self.issues,
        }
    }

    /// 拆出取值，告警并入调用方的收集器
    pub fn unpack(self, sink: &mut Vec<EngineIssue>) -> T {
        sink.extend(self.issues);
        self.value
    }
}

// ==========================================
// ConversionError - 调用契约违反
// ==========================================
// 仅由显式校验入口返回（try_convert），convert 本身从不失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("配方缺少原料")]
    EmptyIngredients,

    #[error("配方原料没有任何正重量")]
    NoPositiveWeight,

    #[error("批量倍数必须 >0: {0}")]
    InvalidBatchMultiplier(f64),
}

// ==========================================
// ConfigError - 覆写快照解析错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("覆写快照 JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("配置值无效 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: f64,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_kinds() {
        assert_eq!(EngineIssue::EmptyFlourBasis.kind(), IssueKind::Computation);
        assert_eq!(EngineIssue::InvalidScaleFactor(0.0).kind(), IssueKind::Input);
        assert_eq!(
            EngineIssue::MissingMethodProfile("biga".into()).kind(),
            IssueKind::Configuration
        );
        assert!(EngineIssue::MissingIngredients.is_hard());
        assert!(!EngineIssue::EmptyFlourBasis.is_hard());
    }

    #[test]
    fn test_checked_collects_warnings() {
        let mut checked = Checked::ok(1.0);
        assert!(!checked.has_warnings());
        checked.push(EngineIssue::ZeroYieldMultiplier);

        let mut sink = Vec::new();
        let value = checked.clone().unpack(&mut sink);
        assert_eq!(value, 1.0);
        assert_eq!(sink.len(), 1);
        assert_eq!(checked.warnings().len(), 1);
        assert!(checked.warnings()[0].contains("出成乘数"));
    }
}
