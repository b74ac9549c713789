// ==========================================
// 配方换算引擎 - 分层覆写解析
// ==========================================
// 优先级: 用户自定义 > 产品覆写 > 分类覆写 > 内置默认
// 红线: 所有可调参数统一走此处的有序合并，不写逐字段回退链
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ==========================================
// OverrideLayer - 覆写层
// ==========================================
// 顺序: BuiltinDefault < Category < Product < UserCustom
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideLayer {
    BuiltinDefault, // 内置默认
    Category,       // 分类覆写
    Product,        // 产品覆写
    UserCustom,     // 用户自定义
}

impl OverrideLayer {
    /// 解析顺序（高优先级在前）
    pub const PRECEDENCE: [OverrideLayer; 4] = [
        OverrideLayer::UserCustom,
        OverrideLayer::Product,
        OverrideLayer::Category,
        OverrideLayer::BuiltinDefault,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideLayer::BuiltinDefault => "builtin_default",
            OverrideLayer::Category => "category",
            OverrideLayer::Product => "product",
            OverrideLayer::UserCustom => "user_custom",
        }
    }
}

impl fmt::Display for OverrideLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 解析结果：取值 + 命中的层
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolved<T> {
    pub value: T,
    pub layer: OverrideLayer,
}

impl<T> Resolved<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            layer: self.layer,
        }
    }
}

// ==========================================
// OverrideLayers - 四层键值覆写
// ==========================================
// 字段级 default 只要求 HashMap: Default，值类型无需实现 Default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "V: Deserialize<'de>"))]
pub struct OverrideLayers<V> {
    #[serde(default)]
    builtin: HashMap<String, V>,
    #[serde(default)]
    category: HashMap<String, V>,
    #[serde(default)]
    product: HashMap<String, V>,
    #[serde(default)]
    custom: HashMap<String, V>,
}

impl<V> Default for OverrideLayers<V> {
    fn default() -> Self {
        Self {
            builtin: HashMap::new(),
            category: HashMap::new(),
            product: HashMap::new(),
            custom: HashMap::new(),
        }
    }
}

impl<V> OverrideLayers<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, layer: OverrideLayer) -> &HashMap<String, V> {
        match layer {
            OverrideLayer::BuiltinDefault => &self.builtin,
            OverrideLayer::Category => &self.category,
            OverrideLayer::Product => &self.product,
            OverrideLayer::UserCustom => &self.custom,
        }
    }

    pub fn layer_mut(&mut self, layer: OverrideLayer) -> &mut HashMap<String, V> {
        match layer {
            OverrideLayer::BuiltinDefault => &mut self.builtin,
            OverrideLayer::Category => &mut self.category,
            OverrideLayer::Product => &mut self.product,
            OverrideLayer::UserCustom => &mut self.custom,
        }
    }

    /// 写入某层的值
    pub fn set(&mut self, layer: OverrideLayer, key: &str, value: V) {
        self.layer_mut(layer).insert(key.to_string(), value);
    }

    /// 链式写入（构造快照时使用）
    pub fn with(mut self, layer: OverrideLayer, key: &str, value: V) -> Self {
        self.set(layer, key, value);
        self
    }

    /// 清除某层的值，返回被移除的值
    pub fn clear(&mut self, layer: OverrideLayer, key: &str) -> Option<V> {
        self.layer_mut(layer).remove(key)
    }

    /// 按优先级解析键值
    ///
    /// 返回第一个命中的层；四层都缺失时返回 None
    pub fn resolve(&self, key: &str) -> Option<Resolved<&V>> {
        OverrideLayer::PRECEDENCE.iter().find_map(|layer| {
            self.layer(*layer)
                .get(key)
                .map(|value| Resolved { value, layer: *layer })
        })
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.resolve(key).map(|r| r.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.resolve(key).is_some()
    }

    /// 所有层出现过的键（有序）
    pub fn keys(&self) -> BTreeSet<&str> {
        OverrideLayer::PRECEDENCE
            .iter()
            .flat_map(|layer| self.layer(*layer).keys().map(|k| k.as_str()))
            .collect()
    }
}

impl<V: Clone> OverrideLayers<V> {
    /// 解析后的完整视图（用于快照/展示）
    pub fn merged(&self) -> HashMap<String, Resolved<V>> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                self.resolve(key)
                    .map(|r| (key.to_string(), r.map(|v| v.clone())))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layered() -> OverrideLayers<f64> {
        OverrideLayers::new()
            .with(OverrideLayer::BuiltinDefault, "a", 1.0)
            .with(OverrideLayer::BuiltinDefault, "b", 1.0)
            .with(OverrideLayer::BuiltinDefault, "c", 1.0)
            .with(OverrideLayer::Category, "b", 2.0)
            .with(OverrideLayer::Category, "c", 2.0)
            .with(OverrideLayer::Product, "c", 3.0)
            .with(OverrideLayer::UserCustom, "d", 4.0)
    }

    #[test]
    fn test_precedence_order() {
        let layers = layered();
        assert_eq!(layers.resolve("a").map(|r| (*r.value, r.layer)), Some((1.0, OverrideLayer::BuiltinDefault)));
        assert_eq!(layers.resolve("b").map(|r| (*r.value, r.layer)), Some((2.0, OverrideLayer::Category)));
        assert_eq!(layers.resolve("c").map(|r| (*r.value, r.layer)), Some((3.0, OverrideLayer::Product)));
        assert_eq!(layers.resolve("d").map(|r| (*r.value, r.layer)), Some((4.0, OverrideLayer::UserCustom)));
        assert!(layers.resolve("missing").is_none());
    }

    #[test]
    fn test_custom_beats_every_layer() {
        let mut layers = layered();
        layers.set(OverrideLayer::UserCustom, "c", 9.0);
        assert_eq!(layers.get("c"), Some(&9.0));

        // 清除自定义后回落到产品层
        assert_eq!(layers.clear(OverrideLayer::UserCustom, "c"), Some(9.0));
        assert_eq!(layers.get("c"), Some(&3.0));
    }

    #[test]
    fn test_merged_view() {
        let merged = layered().merged();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged["c"].value, 3.0);
        assert_eq!(merged["c"].layer, OverrideLayer::Product);
    }

    #[test]
    fn test_deserialize_value_without_default() {
        // 值类型未实现 Default 也可反序列化，缺省层为空
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Profile {
            ratio: f64,
        }

        let json = r#"{"builtin":{"p":{"ratio":0.3}},"custom":{"p":{"ratio":0.2}}}"#;
        let layers: OverrideLayers<Profile> = serde_json::from_str(json).unwrap();
        assert_eq!(layers.get("p"), Some(&Profile { ratio: 0.2 }));
        assert!(layers.layer(OverrideLayer::Category).is_empty());
        assert_eq!(layers.resolve("p").map(|r| r.layer), Some(OverrideLayer::UserCustom));
    }

    #[test]
    fn test_layer_ordering() {
        assert!(OverrideLayer::UserCustom > OverrideLayer::Product);
        assert!(OverrideLayer::Product > OverrideLayer::Category);
        assert!(OverrideLayer::Category > OverrideLayer::BuiltinDefault);
    }
}
