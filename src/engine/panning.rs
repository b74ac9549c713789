// ==========================================
// 配方换算引擎 - 装模量建议
// ==========================================
// 职责: 按产品比容积与填充率推荐面团重量/烤模容积，并检查装模量
// 红线: 产品无装模参数时按兜底比容积估算并告警
// ==========================================

use crate::config::OverrideBundle;
use crate::domain::conversion::{PanningCheck, PanningStatus};
use crate::engine::volume::VolumeCalculator;
use crate::error::{Checked, EngineIssue};
use tracing::{debug, instrument};

/// 兜底比容积 cm³/g
pub const FALLBACK_SPECIFIC_VOLUME: f64 = 3.5;
/// 实际/推荐 超过此值视为过量装模
pub const OVERFILL_THRESHOLD: f64 = 1.15;
/// 实际/推荐 低于此值视为装模不足
pub const UNDERFILL_THRESHOLD: f64 = 0.85;

/// 推荐值 + 产品提示
#[derive(Debug, Clone, PartialEq)]
pub struct PanningAdvice {
    pub value: f64,
    pub tip: Option<String>,
}

// ==========================================
// PanningAdvisor - 装模量建议
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanningAdvisor {
    volume: VolumeCalculator,
}

impl PanningAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bundle(bundle: &OverrideBundle) -> Self {
        Self {
            volume: VolumeCalculator::from_bundle(bundle),
        }
    }

    /// (比容积, 填充率, 提示)；缺参数时兜底并告警
    fn parameters(&self, product: &str, bundle: &OverrideBundle) -> Checked<(f64, f64, Option<String>)> {
        match bundle.panning_profile(product) {
            Some(resolved) => match resolved.value.parameters() {
                Some((sv, fill)) => Checked::ok((sv, fill, resolved.value.tip.clone())),
                None => Checked::with_issue(
                    (FALLBACK_SPECIFIC_VOLUME, 1.0, None),
                    EngineIssue::MissingPanningProfile(product.to_string()),
                ),
            },
            None => Checked::with_issue(
                (FALLBACK_SPECIFIC_VOLUME, 1.0, None),
                EngineIssue::MissingPanningProfile(product.to_string()),
            ),
        }
    }

    /// 推荐面团重量（克，取整）: volume × fill / specific_volume
    #[instrument(skip(self, bundle))]
    pub fn recommended_panning_weight(
        &self,
        volume: f64,
        product: &str,
        bundle: &OverrideBundle,
    ) -> Checked<PanningAdvice> {
        let mut checked = Checked::ok(PanningAdvice { value: 0.0, tip: None });
        let (sv, fill, tip) = self.parameters(product, bundle).unpack(&mut checked.issues);

        if !(volume.is_finite() && volume > 0.0) {
            checked.push(EngineIssue::NonPositiveWeight {
                context: "pan_volume".to_string(),
                value: volume,
            });
            return checked;
        }

        let weight = self.volume.recommended_dough_weight(volume, fill, sv).round();
        debug!(product, volume, weight, "推荐装模量");
        checked.value = PanningAdvice { value: weight, tip };
        checked
    }

    /// 推荐烤模容积（cm³，取整）: dough × specific_volume / fill
    pub fn recommended_pan_volume(
        &self,
        dough_weight: f64,
        product: &str,
        bundle: &OverrideBundle,
    ) -> Checked<PanningAdvice> {
        let mut checked = Checked::ok(PanningAdvice { value: 0.0, tip: None });
        let (sv, fill, tip) = self.parameters(product, bundle).unpack(&mut checked.issues);

        if !(dough_weight.is_finite() && dough_weight > 0.0) {
            checked.push(EngineIssue::NonPositiveWeight {
                context: "dough_weight".to_string(),
                value: dough_weight,
            });
            return checked;
        }

        checked.value = PanningAdvice {
            value: (dough_weight * sv / fill).round(),
            tip,
        };
        checked
    }

    /// 检查实际面团重相对推荐值的装模状态
    ///
    /// 推荐值无法计算（容积 ≤ 0）时返回 None
    pub fn validate_panning(
        &self,
        volume: f64,
        dough_weight: f64,
        product: &str,
        bundle: &OverrideBundle,
    ) -> Checked<Option<PanningCheck>> {
        let mut checked = Checked::ok(None);
        let advice = self
            .recommended_panning_weight(volume, product, bundle)
            .unpack(&mut checked.issues);
        if advice.value <= 0.0 {
            return checked;
        }

        let ratio = dough_weight / advice.value;
        let fill_percent = (ratio * 100.0).round();
        let (status, message) = if ratio > OVERFILL_THRESHOLD {
            (PanningStatus::Overfill, format!("过量装模 ({}%)，可能溢出", fill_percent))
        } else if ratio < UNDERFILL_THRESHOLD {
            (PanningStatus::Underfill, format!("装模不足 ({}%)，模具可能偏大", fill_percent))
        } else {
            (PanningStatus::Ok, "装模量适中".to_string())
        };

        checked.value = Some(PanningCheck {
            product: product.to_string(),
            status,
            fill_percent,
            recommended_weight: advice.value,
            message,
            tip: advice.tip,
        });
        checked
    }
}
