// ==========================================
// 配方换算引擎 - 重量单位
// ==========================================
// 职责: 原料重量单位识别与克换算
// 约定: 引擎内部一律以克计算，输出时保持原单位
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

const GRAMS_PER_KILOGRAM: f64 = 1000.0;
const GRAMS_PER_OUNCE: f64 = 28.349_523_125;
const GRAMS_PER_POUND: f64 = 453.592_37;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Gram,
    Kilogram,
    Ounce,
    Pound,
}

impl WeightUnit {
    /// 解析单位字符串（大小写、复数不敏感）
    ///
    /// 无法识别时返回 None，由调用方决定回退策略
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" | "gr" | "克" => Some(WeightUnit::Gram),
            "kg" | "kilogram" | "kilograms" | "千克" | "公斤" => Some(WeightUnit::Kilogram),
            "oz" | "ounce" | "ounces" => Some(WeightUnit::Ounce),
            "lb" | "lbs" | "pound" | "pounds" => Some(WeightUnit::Pound),
            _ => None,
        }
    }

    pub fn grams_per_unit(&self) -> f64 {
        match self {
            WeightUnit::Gram => 1.0,
            WeightUnit::Kilogram => GRAMS_PER_KILOGRAM,
            WeightUnit::Ounce => GRAMS_PER_OUNCE,
            WeightUnit::Pound => GRAMS_PER_POUND,
        }
    }

    pub fn to_grams(&self, amount: f64) -> f64 {
        amount * self.grams_per_unit()
    }

    pub fn from_grams(&self, grams: f64) -> f64 {
        grams / self.grams_per_unit()
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightUnit::Gram => write!(f, "g"),
            WeightUnit::Kilogram => write!(f, "kg"),
            WeightUnit::Ounce => write!(f, "oz"),
            WeightUnit::Pound => write!(f, "lb"),
        }
    }
}
