// ==========================================
// 配方换算引擎 - 原料差异对比
// ==========================================
// 职责: 换算前后原料逐项对比
// 输入: 原配方原料 / 换算后原料（按 ingredient_id 对齐）
// 输出: ConversionDiff[]（原配方顺序在前，新增原料在后）
// ==========================================

use crate::domain::conversion::ConversionDiff;
use crate::domain::ingredient::Ingredient;
use crate::domain::types::ChangeType;
use std::collections::{HashMap, HashSet};

// 视为"不变"的重量差（克）
const UNCHANGED_TOLERANCE_G: f64 = 1e-6;

// ==========================================
// DiffEngine - 差异对比引擎
// ==========================================
// 红线: 无状态引擎，所有方法都是纯函数
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// 生成原料差异
    ///
    /// - 两边都有: increase / decrease / unchanged
    /// - 仅原配方有: removed（percent_change = -100）
    /// - 仅换算后有: new（percent_change = None）
    pub fn diff(&self, original: &[Ingredient], converted: &[Ingredient]) -> Vec<ConversionDiff> {
        let converted_map: HashMap<&str, &Ingredient> =
            converted.iter().map(|i| (i.id.as_str(), i)).collect();
        let original_ids: HashSet<&str> = original.iter().map(|i| i.id.as_str()).collect();

        let mut diffs: Vec<ConversionDiff> = original
            .iter()
            .map(|before| match converted_map.get(before.id.as_str()) {
                Some(after) => self.compare(before, after),
                None => ConversionDiff {
                    ingredient_id: before.id.clone(),
                    name: before.name.clone(),
                    change_type: ChangeType::Removed,
                    original_amount: Some(before.amount_in_grams()),
                    converted_amount: None,
                    percent_change: Some(-100.0),
                },
            })
            .collect();

        diffs.extend(
            converted
                .iter()
                .filter(|after| !original_ids.contains(after.id.as_str()))
                .map(|after| ConversionDiff {
                    ingredient_id: after.id.clone(),
                    name: after.name.clone(),
                    change_type: ChangeType::New,
                    original_amount: None,
                    converted_amount: Some(after.amount_in_grams()),
                    percent_change: None,
                }),
        );

        diffs
    }

    fn compare(&self, before: &Ingredient, after: &Ingredient) -> ConversionDiff {
        let original = before.amount_in_grams();
        let converted = after.amount_in_grams();
        let delta = converted - original;

        let change_type = if delta.abs() <= UNCHANGED_TOLERANCE_G {
            ChangeType::Unchanged
        } else if delta > 0.0 {
            ChangeType::Increase
        } else {
            ChangeType::Decrease
        };

        // 原重量为 0 时无法计算百分比
        let percent_change = if change_type == ChangeType::Unchanged {
            Some(0.0)
        } else if original > 0.0 {
            Some(delta / original * 100.0)
        } else {
            None
        };

        ConversionDiff {
            ingredient_id: before.id.clone(),
            name: after.name.clone(),
            change_type,
            original_amount: Some(original),
            converted_amount: Some(converted),
            percent_change,
        }
    }

    /// 按变更类型计数
    pub fn count(&self, diffs: &[ConversionDiff], change_type: ChangeType) -> usize {
        diffs.iter().filter(|d| d.change_type == change_type).count()
    }
}
