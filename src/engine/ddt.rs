// ==========================================
// 配方换算引擎 - 面温（DDT）水温求解
// ==========================================
// 公式: water = target × N - room - flour - friction [- preferment]
//       N = 温度因子数（3 因子公式；带预发酵面团时为 4）
// 红线: 结果超出物理可行范围时照常返回 + infeasible 告警，不静默接受
// ==========================================

use crate::config::{config_keys, OverrideBundle};
use crate::domain::conversion::{DdtResult, DdtSettings, IceRequirement, WaterTempStatus};
use crate::domain::types::MixerType;
use crate::error::EngineIssue;
use tracing::{debug, instrument, warn};

const DEFAULT_TEMP_FACTOR_COUNT: u32 = 3;
const DEFAULT_WATER_TEMP_MIN_C: f64 = 0.0;
const DEFAULT_WATER_TEMP_MAX_C: f64 = 100.0;
const DEFAULT_TAP_WATER_TEMP_C: f64 = 20.0;

// 冰的融化潜热 80 cal/g
const ICE_LATENT_HEAT: f64 = 80.0;

// 摩擦升温修正: 长/短搅拌 ±2°C，高/低含水 ∓1°C
const LONG_MIXING_MINUTES: f64 = 15.0;
const SHORT_MIXING_MINUTES: f64 = 5.0;
const HIGH_HYDRATION_PCT: f64 = 75.0;
const LOW_HYDRATION_PCT: f64 = 60.0;

/// 各类搅拌机的摩擦升温（°C）
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrictionTable {
    hand: Option<f64>,
    stand: Option<f64>,
    spiral: Option<f64>,
    planetary: Option<f64>,
    intensive: Option<f64>,
}

impl FrictionTable {
    fn builtin() -> Self {
        Self {
            hand: Some(0.0),
            stand: Some(24.0),
            spiral: Some(22.0),
            planetary: Some(26.0),
            intensive: Some(30.0),
        }
    }
}

// ==========================================
// DdtSolver - 水温求解
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DdtSolver {
    temp_factor_count: u32,
    water_temp_min_c: f64,
    water_temp_max_c: f64,
    tap_water_temp_c: f64,
    friction: FrictionTable,
}

impl Default for DdtSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DdtSolver {
    pub fn new() -> Self {
        Self {
            temp_factor_count: DEFAULT_TEMP_FACTOR_COUNT,
            water_temp_min_c: DEFAULT_WATER_TEMP_MIN_C,
            water_temp_max_c: DEFAULT_WATER_TEMP_MAX_C,
            tap_water_temp_c: DEFAULT_TAP_WATER_TEMP_C,
            friction: FrictionTable::builtin(),
        }
    }

    /// 从覆写配置包读取参数
    ///
    /// 摩擦升温缺失时留空，求解时告警并按 0 计
    pub fn from_bundle(bundle: &OverrideBundle) -> Self {
        let read = |key: &str| bundle.number(key).map(|r| r.value).filter(|v| v.is_finite());

        let temp_factor_count = read(config_keys::DDT_TEMP_FACTOR_COUNT)
            .filter(|v| *v >= 1.0)
            .map(|v| v.round() as u32)
            .unwrap_or(DEFAULT_TEMP_FACTOR_COUNT);

        Self {
            temp_factor_count,
            water_temp_min_c: read(config_keys::DDT_WATER_TEMP_MIN_C).unwrap_or(DEFAULT_WATER_TEMP_MIN_C),
            water_temp_max_c: read(config_keys::DDT_WATER_TEMP_MAX_C).unwrap_or(DEFAULT_WATER_TEMP_MAX_C),
            tap_water_temp_c: read(config_keys::DDT_TAP_WATER_TEMP_C).unwrap_or(DEFAULT_TAP_WATER_TEMP_C),
            friction: FrictionTable {
                hand: read(config_keys::FRICTION_HAND),
                stand: read(config_keys::FRICTION_STAND),
                spiral: read(config_keys::FRICTION_SPIRAL),
                planetary: read(config_keys::FRICTION_PLANETARY),
                intensive: read(config_keys::FRICTION_INTENSIVE),
            },
        }
    }

    pub fn tap_water_temp_c(&self) -> f64 {
        self.tap_water_temp_c
    }

    /// 摩擦升温（Custom 直接使用用户值）
    pub fn friction_for(&self, mixer: MixerType, issues: &mut Vec<EngineIssue>) -> f64 {
        let (key, value) = match mixer {
            MixerType::Custom { friction_c } => return friction_c,
            MixerType::Hand => (config_keys::FRICTION_HAND, self.friction.hand),
            MixerType::Stand => (config_keys::FRICTION_STAND, self.friction.stand),
            MixerType::Spiral => (config_keys::FRICTION_SPIRAL, self.friction.spiral),
            MixerType::Planetary => (config_keys::FRICTION_PLANETARY, self.friction.planetary),
            MixerType::Intensive => (config_keys::FRICTION_INTENSIVE, self.friction.intensive),
        };
        value.unwrap_or_else(|| {
            issues.push(EngineIssue::MissingConfigValue {
                key: key.to_string(),
                fallback: 0.0,
            });
            0.0
        })
    }

    /// 按搅拌时间与面团含水推荐摩擦升温
    ///
    /// 手揉恒为 0；结果不低于 0
    pub fn recommend_friction(
        &self,
        mixer: MixerType,
        mixing_minutes: f64,
        hydration_pct: f64,
        issues: &mut Vec<EngineIssue>,
    ) -> f64 {
        if mixer == MixerType::Hand {
            return 0.0;
        }
        let mut friction = self.friction_for(mixer, issues);
        if mixing_minutes > LONG_MIXING_MINUTES {
            friction += 2.0;
        } else if mixing_minutes < SHORT_MIXING_MINUTES {
            friction -= 2.0;
        }
        if hydration_pct > HIGH_HYDRATION_PCT {
            friction -= 1.0;
        } else if hydration_pct < LOW_HYDRATION_PCT {
            friction += 1.0;
        }
        friction.max(0.0)
    }

    /// 求解所需水温
    pub fn solve(&self, settings: &DdtSettings) -> DdtResult {
        self.solve_with_water(settings, None)
    }

    /// 求解所需水温；给出配方用水量时同时计算冰水配比
    #[instrument(skip(self, settings), fields(target = settings.target_temp_c, mixer = settings.mixer.as_str()))]
    pub fn solve_with_water(&self, settings: &DdtSettings, water_weight: Option<f64>) -> DdtResult {
        let mut issues = Vec::new();
        let friction_c = self.friction_for(settings.mixer, &mut issues);

        // 带预发酵面团温度时为 4 因子公式
        let temp_factor_count = settings.temp_factor_count.filter(|n| *n >= 1).unwrap_or(
            if settings.preferment_temp_c.is_some() {
                self.temp_factor_count + 1
            } else {
                self.temp_factor_count
            },
        );

        let water_temp_c = settings.target_temp_c * f64::from(temp_factor_count)
            - settings.room_temp_c
            - settings.flour_temp_c
            - friction_c
            - settings.preferment_temp_c.unwrap_or(0.0);

        let feasible = water_temp_c.is_finite()
            && water_temp_c >= self.water_temp_min_c
            && water_temp_c <= self.water_temp_max_c;

        let status = if feasible {
            WaterTempStatus::Feasible
        } else {
            warn!(water_temp_c, "水温超出可行范围");
            issues.push(EngineIssue::InfeasibleWaterTemperature {
                value: water_temp_c,
                min: self.water_temp_min_c,
                max: self.water_temp_max_c,
            });
            WaterTempStatus::Infeasible
        };

        let ice = match water_weight {
            Some(weight) if feasible => self.ice_requirement(weight, self.tap_water_temp_c, water_temp_c),
            _ => None,
        };

        debug!(water_temp_c, friction_c, temp_factor_count, "水温求解完成");

        DdtResult {
            water_temp_c,
            status,
            friction_c,
            temp_factor_count,
            ice,
            warnings: issues.iter().map(|i| i.to_string()).collect(),
        }
    }

    /// 冰水配比: ice = W × (tap - target) / (tap + 80)
    ///
    /// 目标水温不低于自来水温时无需加冰，返回 None
    pub fn ice_requirement(&self, total_water: f64, tap_temp_c: f64, water_temp_c: f64) -> Option<IceRequirement> {
        if !total_water.is_finite() || total_water <= 0.0 || water_temp_c >= tap_temp_c {
            return None;
        }
        let ice_weight = total_water * (tap_temp_c - water_temp_c) / (tap_temp_c + ICE_LATENT_HEAT);
        Some(IceRequirement {
            ice_weight,
            tap_water_weight: total_water - ice_weight,
            tap_water_temp_c: tap_temp_c,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverrideLayer;

    fn settings(target: f64, room: f64, flour: f64, mixer: MixerType) -> DdtSettings {
        DdtSettings {
            target_temp_c: target,
            room_temp_c: room,
            flour_temp_c: flour,
            mixer,
            temp_factor_count: None,
            preferment_temp_c: None,
        }
    }

    #[test]
    fn test_stand_mixer_water_temperature() {
        let solver = DdtSolver::new();
        let result = solver.solve(&settings(26.0, 25.0, 24.0, MixerType::Stand));
        // 26×3 - 25 - 24 - 24 = 5
        assert!((result.water_temp_c - 5.0).abs() < 1e-9);
        assert!(result.is_feasible());
        assert_eq!(result.temp_factor_count, 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_custom_friction() {
        let solver = DdtSolver::new();
        let result = solver.solve(&settings(26.0, 22.0, 22.0, MixerType::Custom { friction_c: 10.0 }));
        assert!((result.water_temp_c - 24.0).abs() < 1e-9);
        assert_eq!(result.friction_c, 10.0);
    }

    #[test]
    fn test_infeasible_water_temperature_is_reported() {
        let solver = DdtSolver::new();
        let result = solver.solve(&settings(24.0, 35.0, 33.0, MixerType::Planetary));
        // 72 - 35 - 33 - 26 = -22
        assert!((result.water_temp_c + 22.0).abs() < 1e-9);
        assert_eq!(result.status, WaterTempStatus::Infeasible);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_preferment_uses_four_factors() {
        let solver = DdtSolver::new();
        let mut s = settings(25.0, 24.0, 23.0, MixerType::Hand);
        s.preferment_temp_c = Some(21.0);
        let result = solver.solve(&s);
        // 25×4 - 24 - 23 - 0 - 21 = 32
        assert_eq!(result.temp_factor_count, 4);
        assert!((result.water_temp_c - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_ice_requirement() {
        let solver = DdtSolver::new();
        // 300g 水，自来水 20°C，目标 5°C → 300 × 15 / 100 = 45g 冰
        let ice = solver.ice_requirement(300.0, 20.0, 5.0).unwrap();
        assert!((ice.ice_weight - 45.0).abs() < 1e-9);
        assert!((ice.tap_water_weight - 255.0).abs() < 1e-9);
        assert!(solver.ice_requirement(300.0, 20.0, 25.0).is_none());

        let result = solver.solve_with_water(&settings(26.0, 25.0, 24.0, MixerType::Stand), Some(300.0));
        assert!(result.ice.is_some());
    }

    #[test]
    fn test_intensive_mixer_friction() {
        let solver = DdtSolver::from_bundle(&OverrideBundle::with_builtin_defaults());
        let result = solver.solve(&settings(26.0, 25.0, 24.0, MixerType::Intensive));
        assert_eq!(result.friction_c, 30.0);
        // 78 - 25 - 24 - 30 = -1
        assert!((result.water_temp_c + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommend_friction() {
        let solver = DdtSolver::new();
        let mut issues = Vec::new();
        // 长搅拌 + 低含水: 24 + 2 + 1
        assert_eq!(solver.recommend_friction(MixerType::Stand, 18.0, 55.0, &mut issues), 27.0);
        // 短搅拌 + 高含水: 22 - 2 - 1
        assert_eq!(solver.recommend_friction(MixerType::Spiral, 4.0, 80.0, &mut issues), 19.0);
        assert_eq!(solver.recommend_friction(MixerType::Planetary, 10.0, 65.0, &mut issues), 26.0);
        assert_eq!(solver.recommend_friction(MixerType::Hand, 20.0, 50.0, &mut issues), 0.0);
        assert_eq!(
            solver.recommend_friction(MixerType::Custom { friction_c: 1.0 }, 3.0, 80.0, &mut issues),
            0.0
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_missing_friction_config_warns() {
        let bundle = OverrideBundle::new().with_number(OverrideLayer::UserCustom, config_keys::FRICTION_STAND, 20.0);
        let solver = DdtSolver::from_bundle(&bundle);

        let stand = solver.solve(&settings(26.0, 25.0, 24.0, MixerType::Stand));
        assert_eq!(stand.friction_c, 20.0);

        let spiral = solver.solve(&settings(26.0, 25.0, 24.0, MixerType::Spiral));
        assert_eq!(spiral.friction_c, 0.0);
        assert!(spiral.warnings.iter().any(|w| w.contains(config_keys::FRICTION_SPIRAL)));
    }
}
