use serde::{Deserialize, Serialize};

/// 制法参数（可按层覆写的配置对象）
///
/// 存储位置：OverrideBundle.methods（key = 制法ID）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodProfile {
    /// 制法ID（straight/sponge/poolish/biga/...）
    pub method_id: String,

    /// 显示名称（中文）
    pub title: String,

    /// 预发酵面团占总粉量比例（0~1，直接法为 0）
    #[serde(default)]
    pub flour_ratio: Option<f64>,

    /// 预发酵面团含水量（水/预发酵粉量，如 poolish = 1.0）
    #[serde(default)]
    pub water_ratio: Option<f64>,

    /// 酵母用量相对直接法的倍数（天然酵种为 0，不用商业酵母）
    #[serde(default)]
    pub yeast_adjustment: Option<f64>,

    /// 调整后酵母进入预发酵面团的比例（0~1）；缺省按 flour_ratio
    #[serde(default)]
    pub preferment_yeast_ratio: Option<f64>,

    /// 基准温度下的主发酵时间（分钟）
    #[serde(default)]
    pub fermentation_minutes: Option<f64>,
}

impl MethodProfile {
    pub fn new(method_id: &str, title: &str) -> Self {
        Self {
            method_id: method_id.to_string(),
            title: title.to_string(),
            flour_ratio: None,
            water_ratio: None,
            yeast_adjustment: None,
            preferment_yeast_ratio: None,
            fermentation_minutes: None,
        }
    }

    pub fn with_split(mut self, flour_ratio: f64, water_ratio: f64, yeast_adjustment: f64) -> Self {
        self.flour_ratio = Some(flour_ratio);
        self.water_ratio = Some(water_ratio);
        self.yeast_adjustment = Some(yeast_adjustment);
        self
    }

    pub fn with_preferment_yeast_ratio(mut self, ratio: f64) -> Self {
        self.preferment_yeast_ratio = Some(ratio);
        self
    }

    pub fn with_fermentation_minutes(mut self, minutes: f64) -> Self {
        self.fermentation_minutes = Some(minutes);
        self
    }

    /// 预发酵拆分所需的三项参数是否齐全且有效
    pub fn split_parameters(&self) -> Option<(f64, f64, f64)> {
        let flour_ratio = self.flour_ratio?;
        let water_ratio = self.water_ratio?;
        let yeast_adjustment = self.yeast_adjustment?;

        let valid = (0.0..=1.0).contains(&flour_ratio)
            && water_ratio.is_finite()
            && water_ratio >= 0.0
            && yeast_adjustment.is_finite()
            && yeast_adjustment >= 0.0;

        valid.then_some((flour_ratio, water_ratio, yeast_adjustment))
    }

    pub fn has_preferment(&self) -> bool {
        self.flour_ratio.map(|r| r > 0.0).unwrap_or(false)
    }

    /// 酵母进入预发酵的比例（越界值按 flour_ratio）
    pub fn preferment_yeast_share(&self, flour_ratio: f64) -> f64 {
        self.preferment_yeast_ratio
            .filter(|r| (0.0..=1.0).contains(r))
            .unwrap_or(flour_ratio)
    }
}
