// ==========================================
// 配方换算引擎 - 出成率领域模型
// ==========================================
// 红线: 各阶段损耗率作用于"剩余重量"（连乘），不是对原始重量累加
// ==========================================

use crate::domain::types::ProcessStage;
use serde::{Deserialize, Serialize};

// ==========================================
// ProcessStageSelection - 工序选择
// ==========================================
// 六个相互独立的开关；关闭的阶段损耗为 0 但仍在结果中列出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStageSelection {
    pub mixing: bool,
    pub fermentation: bool,
    pub dividing: bool,
    pub shaping: bool,
    pub baking: bool,
    pub cooling: bool,
}

impl ProcessStageSelection {
    pub fn all() -> Self {
        Self {
            mixing: true,
            fermentation: true,
            dividing: true,
            shaping: true,
            baking: true,
            cooling: true,
        }
    }

    pub fn none() -> Self {
        Self {
            mixing: false,
            fermentation: false,
            dividing: false,
            shaping: false,
            baking: false,
            cooling: false,
        }
    }

    pub fn is_active(&self, stage: ProcessStage) -> bool {
        match stage {
            ProcessStage::Mixing => self.mixing,
            ProcessStage::Fermentation => self.fermentation,
            ProcessStage::Dividing => self.dividing,
            ProcessStage::Shaping => self.shaping,
            ProcessStage::Baking => self.baking,
            ProcessStage::Cooling => self.cooling,
        }
    }

    /// 返回切换某阶段后的新选择
    pub fn with_stage(mut self, stage: ProcessStage, active: bool) -> Self {
        match stage {
            ProcessStage::Mixing => self.mixing = active,
            ProcessStage::Fermentation => self.fermentation = active,
            ProcessStage::Dividing => self.dividing = active,
            ProcessStage::Shaping => self.shaping = active,
            ProcessStage::Baking => self.baking = active,
            ProcessStage::Cooling => self.cooling = active,
        }
        self
    }

    /// 按固定顺序返回启用的阶段
    pub fn active_stages(&self) -> Vec<ProcessStage> {
        ProcessStage::ALL
            .iter()
            .copied()
            .filter(|s| self.is_active(*s))
            .collect()
    }
}

impl Default for ProcessStageSelection {
    fn default() -> Self {
        Self::all()
    }
}

// ==========================================
// StageLossRates - 六阶段损耗率 (%)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageLossRates {
    pub mixing: f64,
    pub fermentation: f64,
    pub dividing: f64,
    pub shaping: f64,
    pub baking: f64,
    pub cooling: f64,
}

impl StageLossRates {
    pub fn get(&self, stage: ProcessStage) -> f64 {
        match stage {
            ProcessStage::Mixing => self.mixing,
            ProcessStage::Fermentation => self.fermentation,
            ProcessStage::Dividing => self.dividing,
            ProcessStage::Shaping => self.shaping,
            ProcessStage::Baking => self.baking,
            ProcessStage::Cooling => self.cooling,
        }
    }

    pub fn set(&mut self, stage: ProcessStage, rate: f64) {
        match stage {
            ProcessStage::Mixing => self.mixing = rate,
            ProcessStage::Fermentation => self.fermentation = rate,
            ProcessStage::Dividing => self.dividing = rate,
            ProcessStage::Shaping => self.shaping = rate,
            ProcessStage::Baking => self.baking = rate,
            ProcessStage::Cooling => self.cooling = rate,
        }
    }
}

// ==========================================
// ProcessLoss - 单阶段损耗明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessLoss {
    pub stage: ProcessStage,
    pub active: bool,          // false = 未选中（损耗为 0，仍列出）
    pub loss_percent: f64,     // 本阶段损耗率（作用于剩余重量）
    pub loss_weight: f64,      // 本阶段损耗重量
    pub remaining_weight: f64, // 本阶段结束后剩余重量
}

// ==========================================
// YieldLossResult - 正向出成结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldLossResult {
    pub input_weight: f64,
    pub output_weight: f64,
    pub total_loss_weight: f64,
    pub total_loss_percent: f64,
    pub yield_percent: f64,
    pub process_losses: Vec<ProcessLoss>,
    pub tips: Vec<String>,
}

impl YieldLossResult {
    /// 损耗最大的启用阶段
    pub fn dominant_stage(&self) -> Option<&ProcessLoss> {
        self.process_losses
            .iter()
            .filter(|l| l.active && l.loss_weight > 0.0)
            .max_by(|a, b| a.loss_weight.total_cmp(&b.loss_weight))
    }
}

// ==========================================
// YieldEnvironment - 出成环境
// ==========================================
// 只影响烘烤阶段失重；基准 湿度 60%、室温 25°C
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldEnvironment {
    #[serde(default)]
    pub humidity_pct: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
}

impl YieldEnvironment {
    pub fn new(humidity_pct: f64, temperature_c: f64) -> Self {
        Self {
            humidity_pct: Some(humidity_pct),
            temperature_c: Some(temperature_c),
        }
    }
}

// ==========================================
// ReverseYieldResult - 反推投料结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseYieldResult {
    pub output_weight: f64,
    pub required_input: f64,
    pub multiplier: f64, // Π(1 - rate/100)，启用阶段连乘
}
