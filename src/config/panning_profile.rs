use serde::{Deserialize, Serialize};

/// 装模参数（可按层覆写的配置对象）
///
/// 存储位置：OverrideBundle.panning（key = 产品键）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanningProfile {
    /// 产品键（pullman/chiffon/...）
    pub key: String,

    /// 产品大类（bread/cake/pastry/other）
    pub category: String,

    /// 比容积 cm³/g（成品体积 / 面团重量）
    pub specific_volume: f64,

    /// 推荐填充率（0~1）
    pub fill_ratio: f64,

    #[serde(default)]
    pub tip: Option<String>,
}

impl PanningProfile {
    pub fn new(key: &str, category: &str, specific_volume: f64, fill_ratio: f64) -> Self {
        Self {
            key: key.to_string(),
            category: category.to_string(),
            specific_volume,
            fill_ratio,
            tip: None,
        }
    }

    pub fn with_tip(mut self, tip: &str) -> Self {
        self.tip = Some(tip.to_string());
        self
    }

    /// 比容积与填充率都有效时返回 (specific_volume, fill_ratio)
    pub fn parameters(&self) -> Option<(f64, f64)> {
        let valid = self.specific_volume.is_finite()
            && self.specific_volume > 0.0
            && self.fill_ratio.is_finite()
            && self.fill_ratio > 0.0
            && self.fill_ratio <= 1.0;
        valid.then_some((self.specific_volume, self.fill_ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_reject_invalid_values() {
        let pullman = PanningProfile::new("pullman", "bread", 3.6, 0.85);
        assert_eq!(pullman.parameters(), Some((3.6, 0.85)));

        assert!(PanningProfile::new("x", "bread", 0.0, 0.85).parameters().is_none());
        assert!(PanningProfile::new("x", "bread", 3.6, 1.2).parameters().is_none());
    }
}
