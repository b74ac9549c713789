// ==========================================
// 配方换算引擎 - 环境调整
// ==========================================
// 职责: 温度/湿度/海拔 → 发酵时间系数 + 原料比例增减
// 红线: 发酵时间一律使用同一 Q10 公式
//       coefficient = 2^((base_temp - current_temp) / step)
// 红线: 海拔/湿度调整默认只给提示，显式开启 auto_adjust 才改原料
// ==========================================

use crate::config::{config_keys, OverrideBundle};
use crate::domain::conversion::{EnvironmentSettings, FermentationGuidance};
use crate::domain::ingredient::Ingredient;
use crate::domain::types::IngredientCategory;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_BASE_TEMP_C: f64 = 26.0;
const DEFAULT_HALVING_STEP_C: f64 = 10.0;
const DEFAULT_HUMIDITY_LOW_PCT: f64 = 40.0;
const DEFAULT_HUMIDITY_HIGH_PCT: f64 = 70.0;
const DEFAULT_HUMIDITY_ADJUST_PCT: f64 = 2.0;

// 海拔分段（下含上不含）
const ALTITUDE_MODERATE_M: f64 = 900.0;
const ALTITUDE_HIGH_M: f64 = 1500.0;
const ALTITUDE_VERY_HIGH_M: f64 = 2100.0;

/// 调整幅度区间（%，相对原用量）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRange {
    pub min_pct: f64,
    pub max_pct: f64,
}

impl AdjustmentRange {
    pub const NONE: AdjustmentRange = AdjustmentRange::fixed(0.0);

    pub const fn new(min_pct: f64, max_pct: f64) -> Self {
        Self { min_pct, max_pct }
    }

    pub const fn fixed(pct: f64) -> Self {
        Self::new(pct, pct)
    }

    /// 自动调整时取区间中点
    pub fn midpoint(&self) -> f64 {
        (self.min_pct + self.max_pct) / 2.0
    }

    pub fn is_zero(&self) -> bool {
        self.min_pct == 0.0 && self.max_pct == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeBand {
    Low,      // < 900m
    Moderate, // 900 ~ 1500m
    High,     // 1500 ~ 2100m
    VeryHigh, // ≥ 2100m
}

/// 海拔调整建议
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltitudeAdjustment {
    pub band: AltitudeBand,
    pub flour: AdjustmentRange,
    pub sugar: AdjustmentRange,
    pub leavening: AdjustmentRange,
}

impl AltitudeAdjustment {
    pub fn is_none(&self) -> bool {
        self.band == AltitudeBand::Low
    }

    pub fn tip(&self) -> Option<String> {
        if self.is_none() {
            return None;
        }
        Some(format!(
            "高海拔: 粉量 {} / 糖 {} / 酵母 {}",
            format_range(&self.flour),
            format_range(&self.sugar),
            format_range(&self.leavening)
        ))
    }
}

/// 幅度小的一端在前: +2~+4%、-2~-4%
fn format_range(range: &AdjustmentRange) -> String {
    if range.min_pct == range.max_pct {
        return format!("{:+}%", range.min_pct);
    }
    let (near, far) = if range.min_pct.abs() <= range.max_pct.abs() {
        (range.min_pct, range.max_pct)
    } else {
        (range.max_pct, range.min_pct)
    };
    format!("{:+}~{:+}%", near, far)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumidityLevel {
    Low,
    Normal,
    High,
}

/// 湿度建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumidityAdvisory {
    pub level: HumidityLevel,
    /// 液体增减幅度（%，相对原用量）；仅 auto_adjust 时应用
    pub hydration_delta_pct: f64,
    pub tip: Option<String>,
}

/// 环境评估汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentAssessment {
    pub fermentation: FermentationGuidance,
    pub altitude: AltitudeAdjustment,
    pub humidity: HumidityAdvisory,
    pub tips: Vec<String>,
}

// ==========================================
// EnvironmentAdjustor - 环境调整
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentAdjustor {
    base_temp_c: f64,
    halving_step_c: f64,
    humidity_low_pct: f64,
    humidity_high_pct: f64,
    humidity_adjust_pct: f64,
}

impl Default for EnvironmentAdjustor {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentAdjustor {
    pub fn new() -> Self {
        Self {
            base_temp_c: DEFAULT_BASE_TEMP_C,
            halving_step_c: DEFAULT_HALVING_STEP_C,
            humidity_low_pct: DEFAULT_HUMIDITY_LOW_PCT,
            humidity_high_pct: DEFAULT_HUMIDITY_HIGH_PCT,
            humidity_adjust_pct: DEFAULT_HUMIDITY_ADJUST_PCT,
        }
    }

    pub fn from_bundle(bundle: &OverrideBundle) -> Self {
        let read = |key: &str, fallback: f64| bundle.number(key).map(|r| r.value).unwrap_or(fallback);
        let halving_step_c = read(config_keys::FERMENTATION_HALVING_STEP_C, DEFAULT_HALVING_STEP_C);

        Self {
            base_temp_c: read(config_keys::FERMENTATION_BASE_TEMP_C, DEFAULT_BASE_TEMP_C),
            halving_step_c: if halving_step_c > 0.0 {
                halving_step_c
            } else {
                DEFAULT_HALVING_STEP_C
            },
            humidity_low_pct: read(config_keys::HUMIDITY_LOW_PCT, DEFAULT_HUMIDITY_LOW_PCT),
            humidity_high_pct: read(config_keys::HUMIDITY_HIGH_PCT, DEFAULT_HUMIDITY_HIGH_PCT),
            humidity_adjust_pct: read(config_keys::HUMIDITY_ADJUST_PCT, DEFAULT_HUMIDITY_ADJUST_PCT),
        }
    }

    pub fn base_temp_c(&self) -> f64 {
        self.base_temp_c
    }

    // ==========================================
    // 发酵时间
    // ==========================================

    /// 发酵时间系数（Q10）
    ///
    /// - 高于基准温度每 step°C，发酵时间减半（系数 <1）
    /// - 低于基准温度每 step°C，发酵时间加倍（系数 >1）
    pub fn fermentation_time_coefficient(&self, current_temp_c: f64) -> f64 {
        2f64.powf((self.base_temp_c - current_temp_c) / self.halving_step_c)
    }

    /// 按当前温度换算发酵时间
    pub fn adjust_fermentation_minutes(&self, base_minutes: Option<f64>, current_temp_c: f64) -> FermentationGuidance {
        let coefficient = self.fermentation_time_coefficient(current_temp_c);
        let base_minutes = base_minutes.filter(|m| m.is_finite() && *m > 0.0);
        FermentationGuidance {
            temperature_c: current_temp_c,
            coefficient,
            base_minutes,
            adjusted_minutes: base_minutes.map(|m| m * coefficient),
        }
    }

    fn fermentation_tip(&self, guidance: &FermentationGuidance) -> Option<String> {
        let coefficient = guidance.coefficient;
        if (coefficient - 1.0).abs() < 0.05 {
            return None;
        }
        let direction = if coefficient < 1.0 { "加快" } else { "变慢" };
        let minutes = guidance
            .adjusted_minutes
            .map(|m| format!("，建议发酵约 {:.0} 分钟", m))
            .unwrap_or_default();
        Some(format!(
            "环境温度 {:.1}°C，发酵{}（时间系数 ×{:.2}）{}",
            guidance.temperature_c, direction, coefficient, minutes
        ))
    }

    // ==========================================
    // 海拔 / 湿度
    // ==========================================

    /// 海拔分段调整（下含上不含）
    pub fn altitude_adjustment(&self, altitude_m: f64) -> AltitudeAdjustment {
        if altitude_m < ALTITUDE_MODERATE_M || altitude_m.is_nan() {
            AltitudeAdjustment {
                band: AltitudeBand::Low,
                flour: AdjustmentRange::NONE,
                sugar: AdjustmentRange::NONE,
                leavening: AdjustmentRange::NONE,
            }
        } else if altitude_m < ALTITUDE_HIGH_M {
            AltitudeAdjustment {
                band: AltitudeBand::Moderate,
                flour: AdjustmentRange::fixed(1.0),
                sugar: AdjustmentRange::new(-2.0, -1.0),
                leavening: AdjustmentRange::new(-15.0, -8.0),
            }
        } else if altitude_m < ALTITUDE_VERY_HIGH_M {
            AltitudeAdjustment {
                band: AltitudeBand::High,
                flour: AdjustmentRange::new(2.0, 4.0),
                sugar: AdjustmentRange::new(-4.0, -2.0),
                leavening: AdjustmentRange::fixed(-20.0),
            }
        } else {
            AltitudeAdjustment {
                band: AltitudeBand::VeryHigh,
                flour: AdjustmentRange::fixed(4.0),
                sugar: AdjustmentRange::new(-8.0, -4.0),
                leavening: AdjustmentRange::fixed(-25.0),
            }
        }
    }

    /// 湿度建议：<low 增加水量，>high 减少水量，区间内无建议
    pub fn humidity_advisory(&self, humidity_pct: f64) -> HumidityAdvisory {
        if humidity_pct < self.humidity_low_pct {
            HumidityAdvisory {
                level: HumidityLevel::Low,
                hydration_delta_pct: self.humidity_adjust_pct,
                tip: Some(format!(
                    "空气干燥（湿度 {:.0}%），面粉吸水增加，可将水量提高约 {:.0}%，并注意覆盖防止表皮风干",
                    humidity_pct, self.humidity_adjust_pct
                )),
            }
        } else if humidity_pct > self.humidity_high_pct {
            HumidityAdvisory {
                level: HumidityLevel::High,
                hydration_delta_pct: -self.humidity_adjust_pct,
                tip: Some(format!(
                    "空气潮湿（湿度 {:.0}%），面粉已吸湿，可将水量减少约 {:.0}%",
                    humidity_pct, self.humidity_adjust_pct
                )),
            }
        } else {
            HumidityAdvisory {
                level: HumidityLevel::Normal,
                hydration_delta_pct: 0.0,
                tip: None,
            }
        }
    }

    // ==========================================
    // 汇总 / 应用
    // ==========================================

    /// 环境评估（只产出建议，不改原料）
    #[instrument(skip(self, environment))]
    pub fn assess(&self, environment: &EnvironmentSettings, base_minutes: Option<f64>) -> EnvironmentAssessment {
        let fermentation = self.adjust_fermentation_minutes(base_minutes, environment.temperature_c);
        let altitude = self.altitude_adjustment(environment.altitude_m);
        let humidity = self.humidity_advisory(environment.humidity_pct);

        let tips: Vec<String> = [
            self.fermentation_tip(&fermentation),
            altitude.tip(),
            humidity.tip.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        debug!(
            coefficient = fermentation.coefficient,
            altitude_band = ?altitude.band,
            humidity_level = ?humidity.level,
            "环境评估完成"
        );

        EnvironmentAssessment {
            fermentation,
            altitude,
            humidity,
            tips,
        }
    }

    /// 将海拔/湿度调整应用到原料（按区间中点，相对原用量）
    ///
    /// 返回 (新原料列表, 是否有原料被调整)
    pub fn apply(&self, ingredients: &[Ingredient], assessment: &EnvironmentAssessment) -> (Vec<Ingredient>, bool) {
        let altitude = &assessment.altitude;
        let hydration_delta = assessment.humidity.hydration_delta_pct;

        let mut changed = false;
        let adjusted = ingredients
            .iter()
            .map(|ingredient| {
                let delta_pct = if ingredient.counts_as_flour() {
                    altitude.flour.midpoint()
                } else {
                    match ingredient.category {
                        IngredientCategory::Sugar => altitude.sugar.midpoint(),
                        IngredientCategory::Leavening => altitude.leavening.midpoint(),
                        IngredientCategory::Liquid => hydration_delta,
                        _ => 0.0,
                    }
                };
                if delta_pct == 0.0 {
                    return ingredient.clone();
                }
                changed = true;
                ingredient.with_amount(ingredient.amount * (1.0 + delta_pct / 100.0))
            })
            .collect();

        (adjusted, changed)
    }
}
