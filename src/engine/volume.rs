// ==========================================
// 配方换算引擎 - 烤模容积计算
// ==========================================
// 约定: 尺寸 cm，容积 cm³（与 ml 通用，作为面团容量代理）
// 红线: 几何计算只作参考，任何尺寸 ≤0 返回 0，不报错
// ==========================================

use crate::config::{config_keys, OverrideBundle};
use crate::domain::recipe::{PanConfig, PanShape};
use crate::error::{Checked, EngineIssue};
use std::f64::consts::PI;

/// 吐司模底宽收窄系数默认值（未经实测校准，允许配置覆写）
pub const DEFAULT_LOAF_TAPER_RATIO: f64 = 0.85;

// ==========================================
// VolumeCalculator - 容积计算
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeCalculator {
    loaf_taper_ratio: f64,
}

impl Default for VolumeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeCalculator {
    pub fn new() -> Self {
        Self {
            loaf_taper_ratio: DEFAULT_LOAF_TAPER_RATIO,
        }
    }

    pub fn with_loaf_taper_ratio(loaf_taper_ratio: f64) -> Self {
        Self { loaf_taper_ratio }
    }

    /// 从覆写配置包读取收窄系数
    pub fn from_bundle(bundle: &OverrideBundle) -> Self {
        let ratio = bundle
            .number(config_keys::PAN_LOAF_TAPER_RATIO)
            .map(|r| r.value)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_LOAF_TAPER_RATIO);
        Self::with_loaf_taper_ratio(ratio)
    }

    pub fn loaf_taper_ratio(&self) -> f64 {
        self.loaf_taper_ratio
    }

    // ==========================================
    // 基础几何
    // ==========================================

    /// 长方体
    pub fn rectangular_volume(&self, length: f64, width: f64, height: f64) -> f64 {
        if !all_positive(&[length, width, height]) {
            return 0.0;
        }
        length * width * height
    }

    /// 圆柱 π·(d/2)²·h
    pub fn cylindrical_volume(&self, diameter: f64, height: f64) -> f64 {
        if !all_positive(&[diameter, height]) {
            return 0.0;
        }
        let radius = diameter / 2.0;
        PI * radius * radius * height
    }

    /// 吐司模（梯形截面）: length × (width + inner_width)/2 × height
    ///
    /// inner_width 缺省按 width × 收窄系数
    pub fn loaf_volume(&self, length: f64, width: f64, inner_width: Option<f64>, height: f64) -> f64 {
        let inner_width = inner_width.unwrap_or(width * self.loaf_taper_ratio);
        if !all_positive(&[length, width, inner_width, height]) {
            return 0.0;
        }
        length * ((width + inner_width) / 2.0) * height
    }

    /// 戚风模: 外圆柱 - 中心管
    pub fn chiffon_volume(&self, outer_diameter: f64, inner_diameter: f64, height: f64) -> f64 {
        if !all_positive(&[outer_diameter, inner_diameter, height]) || inner_diameter >= outer_diameter {
            return 0.0;
        }
        self.cylindrical_volume(outer_diameter, height) - self.cylindrical_volume(inner_diameter, height)
    }

    // ==========================================
    // 烤模配置
    // ==========================================

    /// 按形状计算容积（Custom 形状返回 0）
    pub fn shape_volume(&self, shape: &PanShape) -> f64 {
        match shape {
            PanShape::Rectangle {
                length_cm,
                width_cm,
                height_cm,
            } => self.rectangular_volume(*length_cm, *width_cm, *height_cm),
            PanShape::Round {
                diameter_cm,
                height_cm,
            } => self.cylindrical_volume(*diameter_cm, *height_cm),
            PanShape::Loaf {
                length_cm,
                width_cm,
                inner_width_cm,
                height_cm,
            } => self.loaf_volume(*length_cm, *width_cm, *inner_width_cm, *height_cm),
            PanShape::Chiffon {
                outer_diameter_cm,
                inner_diameter_cm,
                height_cm,
            } => self.chiffon_volume(*outer_diameter_cm, *inner_diameter_cm, *height_cm),
            PanShape::Custom => 0.0,
        }
    }

    /// 烤模有效容积
    ///
    /// 优先按尺寸计算；尺寸无效或为 Custom 时回退到用户填写的容积。
    /// 两者都不可用时返回 None。
    pub fn pan_volume(&self, pan: &PanConfig) -> Checked<Option<f64>> {
        let computed = self.shape_volume(&pan.shape);
        if computed > 0.0 {
            return Checked::ok(Some(computed));
        }

        let mut checked = Checked::ok(None);
        if pan.shape != PanShape::Custom {
            checked.push(EngineIssue::NonPositiveDimension {
                shape: pan.shape.kind().to_string(),
            });
        }
        if let Some(volume) = pan.volume_cm3.filter(|v| v.is_finite() && *v > 0.0) {
            checked.value = Some(volume);
        }
        checked
    }

    /// 按比容积推荐面团重量: volume × fill_ratio / specific_volume
    ///
    /// specific_volume 单位 cm³/g（成品体积 / 面团重量）
    pub fn recommended_dough_weight(&self, volume: f64, fill_ratio: f64, specific_volume: f64) -> f64 {
        if !all_positive(&[volume, fill_ratio, specific_volume]) {
            return 0.0;
        }
        volume * fill_ratio.min(1.0) / specific_volume
    }
}

fn all_positive(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_volume() {
        let calc = VolumeCalculator::new();
        assert!((calc.rectangular_volume(20.0, 10.0, 8.0) - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_cylindrical_volume() {
        let calc = VolumeCalculator::new();
        let v = calc.cylindrical_volume(18.0, 5.0);
        assert!((v - PI * 81.0 * 5.0).abs() < 1e-9);
        assert!((v - 1272.3).abs() < 0.1);
    }

    #[test]
    fn test_loaf_volume_default_taper() {
        let calc = VolumeCalculator::new();
        // 20 × (10 + 8.5)/2 × 10 = 1850
        assert!((calc.loaf_volume(20.0, 10.0, None, 10.0) - 1850.0).abs() < 1e-9);
        // 实测内宽优先
        assert!((calc.loaf_volume(20.0, 10.0, Some(9.0), 10.0) - 1900.0).abs() < 1e-9);
    }

    #[test]
    fn test_loaf_taper_is_configurable() {
        let calc = VolumeCalculator::with_loaf_taper_ratio(1.0);
        assert!((calc.loaf_volume(20.0, 10.0, None, 10.0) - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_chiffon_volume_subtracts_tube() {
        let calc = VolumeCalculator::new();
        let expected = calc.cylindrical_volume(17.0, 8.0) - calc.cylindrical_volume(4.0, 8.0);
        assert!((calc.chiffon_volume(17.0, 4.0, 8.0) - expected).abs() < 1e-9);
        assert_eq!(calc.chiffon_volume(4.0, 17.0, 8.0), 0.0);
    }

    #[test]
    fn test_non_positive_dimension_returns_zero() {
        let calc = VolumeCalculator::new();
        assert_eq!(calc.rectangular_volume(0.0, 10.0, 8.0), 0.0);
        assert_eq!(calc.cylindrical_volume(-1.0, 5.0), 0.0);
        assert_eq!(calc.loaf_volume(20.0, 10.0, Some(0.0), 10.0), 0.0);
        assert_eq!(calc.rectangular_volume(f64::NAN, 10.0, 8.0), 0.0);
    }

    #[test]
    fn test_pan_volume_falls_back_to_stored_volume() {
        let calc = VolumeCalculator::new();
        let mut pan = PanConfig::new(
            PanShape::Round {
                diameter_cm: 0.0,
                height_cm: 5.0,
            },
            0.8,
        );
        pan.volume_cm3 = Some(1500.0);

        let checked = calc.pan_volume(&pan);
        assert_eq!(checked.value, Some(1500.0));
        assert_eq!(checked.issues.len(), 1);

        let custom = PanConfig::with_volume(900.0, 1.0);
        let checked = calc.pan_volume(&custom);
        assert_eq!(checked.value, Some(900.0));
        assert!(!checked.has_warnings());
    }

    #[test]
    fn test_recommended_dough_weight() {
        let calc = VolumeCalculator::new();
        // 2000cm³ 吐司模，比容积 4.0 → 500g
        assert!((calc.recommended_dough_weight(2000.0, 1.0, 4.0) - 500.0).abs() < 1e-9);
        assert_eq!(calc.recommended_dough_weight(2000.0, 1.0, 0.0), 0.0);
    }
}
