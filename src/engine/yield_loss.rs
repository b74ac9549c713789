// ==========================================
// 配方换算引擎 - 出成率损耗链
// ==========================================
// 红线: 六阶段固定顺序，损耗率作用于剩余重量（连乘）
// 红线: reverse(forward(x).output) == x（浮点容差内）
// ==========================================
// 正向: remaining -= remaining × rate/100（仅启用阶段）
// 反向: required = output / Π(1 - rate/100)
// 环境: 烘烤损耗率 × 环境系数（湿度/室温，限制在 0.8~1.3）
// ==========================================

use crate::config::{config_keys, LossRateTable, OverrideBundle};
use crate::domain::types::ProcessStage;
use crate::domain::yield_loss::{
    ProcessLoss, ProcessStageSelection, ReverseYieldResult, StageLossRates, YieldEnvironment,
    YieldLossResult,
};
use crate::error::{Checked, EngineIssue};
use tracing::{debug, instrument, warn};

const DEFAULT_HIGH_LOSS_TIP_PCT: f64 = 20.0;

const BASE_HUMIDITY_PCT: f64 = 60.0;
const BASE_TEMPERATURE_C: f64 = 25.0;
const HUMIDITY_FACTOR_PER_PCT: f64 = 0.005; // 每 10% 湿度差调整 5%
const TEMPERATURE_FACTOR_PER_C: f64 = 0.01; // 每 5°C 温差调整 5%
const ENVIRONMENT_FACTOR_RANGE: (f64, f64) = (0.8, 1.3);

// ==========================================
// YieldLossChain - 出成率损耗链
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldLossChain {
    high_loss_tip_pct: f64,
}

impl Default for YieldLossChain {
    fn default() -> Self {
        Self::new()
    }
}

impl YieldLossChain {
    pub fn new() -> Self {
        Self {
            high_loss_tip_pct: DEFAULT_HIGH_LOSS_TIP_PCT,
        }
    }

    pub fn from_bundle(bundle: &OverrideBundle) -> Self {
        Self {
            high_loss_tip_pct: bundle
                .number(config_keys::YIELD_HIGH_LOSS_TIP_PCT)
                .map(|r| r.value)
                .unwrap_or(DEFAULT_HIGH_LOSS_TIP_PCT),
        }
    }

    // ==========================================
    // 损耗率校正
    // ==========================================

    /// 负值按 0、超过 100 按 100，逐项告警
    pub fn sanitize_rates(&self, rates: &StageLossRates) -> Checked<StageLossRates> {
        let mut checked = Checked::ok(*rates);
        for stage in ProcessStage::ALL {
            let rate = rates.get(stage);
            if rate.is_nan() || rate < 0.0 {
                checked.push(EngineIssue::NegativeLossRate { stage, rate });
                checked.value.set(stage, 0.0);
            } else if rate > 100.0 {
                checked.push(EngineIssue::ExcessiveLossRate { stage, rate });
                checked.value.set(stage, 100.0);
            }
        }
        checked
    }

    /// 启用阶段的出成乘数 M = Π(1 - rate/100)
    pub fn aggregate_multiplier(&self, rates: &StageLossRates, selection: &ProcessStageSelection) -> f64 {
        selection
            .active_stages()
            .into_iter()
            .fold(1.0, |m, stage| m * (1.0 - rates.get(stage) / 100.0))
    }

    // ==========================================
    // 正向: 投料 → 成品
    // ==========================================

    /// 正向计算出成
    ///
    /// 投料重量 ≤0 时不计算，返回 None 并告警
    #[instrument(skip(self, loss_rates, selection))]
    pub fn forward(
        &self,
        input_weight: f64,
        loss_rates: &StageLossRates,
        selection: &ProcessStageSelection,
    ) -> Checked<Option<YieldLossResult>> {
        if !input_weight.is_finite() || input_weight <= 0.0 {
            warn!(input_weight, "投料重量无效，跳过出成计算");
            return Checked::with_issue(
                None,
                EngineIssue::NonPositiveWeight {
                    context: "input_weight".to_string(),
                    value: input_weight,
                },
            );
        }

        let sanitized = self.sanitize_rates(loss_rates);
        let rates = sanitized.value;

        let mut remaining = input_weight;
        let process_losses: Vec<ProcessLoss> = ProcessStage::ALL
            .iter()
            .map(|&stage| {
                let active = selection.is_active(stage);
                let loss_percent = if active { rates.get(stage) } else { 0.0 };
                let loss_weight = remaining * loss_percent / 100.0;
                remaining -= loss_weight;
                ProcessLoss {
                    stage,
                    active,
                    loss_percent,
                    loss_weight,
                    remaining_weight: remaining,
                }
            })
            .collect();

        let output_weight = remaining;
        let total_loss_weight = input_weight - output_weight;
        let total_loss_percent = 100.0 * (1.0 - output_weight / input_weight);

        let mut result = YieldLossResult {
            input_weight,
            output_weight,
            total_loss_weight,
            total_loss_percent,
            yield_percent: 100.0 - total_loss_percent,
            process_losses,
            tips: Vec::new(),
        };
        result.tips = self.tips(&result, selection);

        debug!(
            input_weight,
            output_weight,
            total_loss_percent,
            "正向出成计算完成"
        );

        Checked {
            value: Some(result),
            issues: sanitized.issues,
        }
    }

    // ==========================================
    // 反向: 目标成品 → 所需投料
    // ==========================================

    /// 反推所需投料重量
    ///
    /// M ≤0 时（损耗率合计 100%）返回 0 并告警
    #[instrument(skip(self, loss_rates, selection))]
    pub fn reverse(
        &self,
        output_weight: f64,
        loss_rates: &StageLossRates,
        selection: &ProcessStageSelection,
    ) -> Checked<ReverseYieldResult> {
        let sanitized = self.sanitize_rates(loss_rates);
        let mut issues = sanitized.issues;
        let multiplier = self.aggregate_multiplier(&sanitized.value, selection);

        if !output_weight.is_finite() || output_weight <= 0.0 {
            issues.push(EngineIssue::NonPositiveWeight {
                context: "output_weight".to_string(),
                value: output_weight,
            });
            return Checked {
                value: ReverseYieldResult {
                    output_weight,
                    required_input: 0.0,
                    multiplier,
                },
                issues,
            };
        }

        if multiplier <= 0.0 {
            warn!(multiplier, "出成乘数 ≤0，无法反推投料量");
            issues.push(EngineIssue::ZeroYieldMultiplier);
            return Checked {
                value: ReverseYieldResult {
                    output_weight,
                    required_input: 0.0,
                    multiplier,
                },
                issues,
            };
        }

        Checked {
            value: ReverseYieldResult {
                output_weight,
                required_input: output_weight / multiplier,
                multiplier,
            },
            issues,
        }
    }

    // ==========================================
    // 结合损耗率表
    // ==========================================

    /// 按分类/产品解析损耗率后正向计算
    pub fn forward_with_table(
        &self,
        input_weight: f64,
        table: &LossRateTable,
        category: Option<&str>,
        product: Option<&str>,
        selection: &ProcessStageSelection,
    ) -> Checked<Option<YieldLossResult>> {
        self.forward_in_environment(input_weight, table, category, product, selection, None)
    }

    /// 按分类/产品解析损耗率，并按环境修正烘烤损耗后正向计算
    ///
    /// 结果附带分类/产品/环境相关的操作提示
    pub fn forward_in_environment(
        &self,
        input_weight: f64,
        table: &LossRateTable,
        category: Option<&str>,
        product: Option<&str>,
        selection: &ProcessStageSelection,
        environment: Option<&YieldEnvironment>,
    ) -> Checked<Option<YieldLossResult>> {
        let mut issues = Vec::new();
        let resolved = table.resolve(category, product).unpack(&mut issues);
        let rates = match environment {
            Some(env) => self.apply_environment(&resolved.rates, env),
            None => resolved.rates,
        };
        let mut result = self.forward(input_weight, &rates, selection).unpack(&mut issues);
        if let Some(result) = result.as_mut() {
            result.tips.extend(context_tips(category, product, environment));
        }
        Checked {
            value: result,
            issues,
        }
    }

    // ==========================================
    // 环境修正
    // ==========================================

    /// 烘烤失重环境系数
    ///
    /// 湿度低于 60% 增加蒸发，室温高于 25°C 增加蒸发；结果限制在 0.8~1.3
    pub fn environment_factor(&self, environment: &YieldEnvironment) -> f64 {
        let mut factor = 1.0;
        if let Some(humidity) = environment.humidity_pct.filter(|h| h.is_finite()) {
            factor *= 1.0 + (BASE_HUMIDITY_PCT - humidity) * HUMIDITY_FACTOR_PER_PCT;
        }
        if let Some(temperature) = environment.temperature_c.filter(|t| t.is_finite()) {
            factor *= 1.0 + (temperature - BASE_TEMPERATURE_C) * TEMPERATURE_FACTOR_PER_C;
        }
        factor.clamp(ENVIRONMENT_FACTOR_RANGE.0, ENVIRONMENT_FACTOR_RANGE.1)
    }

    /// 只修正烘烤阶段
    pub fn apply_environment(&self, rates: &StageLossRates, environment: &YieldEnvironment) -> StageLossRates {
        let factor = self.environment_factor(environment);
        let mut adjusted = *rates;
        adjusted.set(ProcessStage::Baking, rates.get(ProcessStage::Baking) * factor);
        debug!(factor, baking = adjusted.baking, "烘烤损耗环境修正");
        adjusted
    }

    /// 按分类/产品解析损耗率后反推投料
    pub fn reverse_with_table(
        &self,
        output_weight: f64,
        table: &LossRateTable,
        category: Option<&str>,
        product: Option<&str>,
        selection: &ProcessStageSelection,
    ) -> Checked<ReverseYieldResult> {
        let mut issues = Vec::new();
        let resolved = table.resolve(category, product).unpack(&mut issues);
        let reverse = self.reverse(output_weight, &resolved.rates, selection);
        issues.extend(reverse.issues);
        Checked {
            value: reverse.value,
            issues,
        }
    }

    // ==========================================
    // 提示
    // ==========================================

    fn tips(&self, result: &YieldLossResult, selection: &ProcessStageSelection) -> Vec<String> {
        let mut tips = Vec::new();

        if selection.active_stages().is_empty() {
            tips.push("未选择任何工序，出成按 100% 计算".to_string());
            return tips;
        }

        if result.total_loss_percent > self.high_loss_tip_pct {
            tips.push(format!(
                "总损耗 {:.1}% 偏高（>{:.0}%），建议核对各工序损耗率或增加投料",
                result.total_loss_percent, self.high_loss_tip_pct
            ));
        }

        if let Some(dominant) = result.dominant_stage() {
            if dominant.stage == ProcessStage::Baking {
                tips.push(format!(
                    "烘烤失重 {:.1}g 为最大损耗，可通过调整烘烤时间/温度控制水分流失",
                    dominant.loss_weight
                ));
            } else {
                tips.push(format!(
                    "最大损耗来自{}阶段（{:.1}g）",
                    dominant.stage.title_cn(),
                    dominant.loss_weight
                ));
            }
        }

        tips
    }
}

/// 分类/产品/环境操作提示
fn context_tips(category: Option<&str>, product: Option<&str>, environment: Option<&YieldEnvironment>) -> Vec<String> {
    let mut tips: Vec<&str> = Vec::new();

    match category {
        Some("bread") => tips.extend(["搅拌缸内壁喷油防粘", "分割时刮板撒粉"]),
        Some("cake") => tips.extend(["刮净搅拌盆与打蛋头上的面糊", "烤模铺油纸减少粘模损耗"]),
        Some("pastry") => tips.extend(["台面适量撒粉防粘", "保持面团低温操作，防止黄油渗出"]),
        _ => {}
    }

    match product {
        Some("croissant") => tips.push("出炉后立即移至网架，避免底部回潮"),
        Some("baguette") => tips.push("蒸汽烘烤定型表皮，控制水分蒸发"),
        Some("chiffon") => tips.push("烤模不可抹油，以保持高度"),
        _ => {}
    }

    if let Some(env) = environment {
        match env.humidity_pct {
            Some(h) if h < 50.0 => tips.push("环境干燥: 面团加盖防止表面风干"),
            Some(h) if h > 70.0 => tips.push("环境潮湿: 可略延长烘烤时间"),
            _ => {}
        }
        if env.temperature_c.is_some_and(|t| t > 30.0) {
            tips.push("高温环境: 注意控制面团温度");
        }
    }

    tips.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bread_rates() -> StageLossRates {
        StageLossRates {
            mixing: 1.0,
            fermentation: 1.5,
            dividing: 2.0,
            shaping: 1.0,
            baking: 12.0,
            cooling: 2.0,
        }
    }

    #[test]
    fn test_forward_all_stages() {
        let chain = YieldLossChain::new();
        let checked = chain.forward(1000.0, &bread_rates(), &ProcessStageSelection::all());
        let result = checked.value.unwrap();
        let expected = 1000.0 * 0.99 * 0.985 * 0.98 * 0.99 * 0.88 * 0.98;
        assert!((result.output_weight - expected).abs() < 1e-9);
        // 0.99×0.985×0.98×0.99×0.88×0.98 ≈ 0.8159
        assert!((result.output_weight - 815.9).abs() < 0.05);
        assert!((result.total_loss_weight + result.output_weight - 1000.0).abs() < 1e-9);
        assert!((result.yield_percent + result.total_loss_percent - 100.0).abs() < 1e-9);
        assert_eq!(result.process_losses.len(), 6);
        assert!(result.tips.iter().any(|t| t.contains("烘烤")));
        // 总损耗 18.4% 未超过 20% 提示阈值
        assert!(!result.tips.iter().any(|t| t.contains("总损耗")));
    }

    #[test]
    fn test_forward_is_multiplicative_on_remaining() {
        let chain = YieldLossChain::new();
        let rates = StageLossRates {
            mixing: 10.0,
            fermentation: 10.0,
            ..StageLossRates::default()
        };
        let result = chain
            .forward(100.0, &rates, &ProcessStageSelection::all())
            .value
            .unwrap();
        // 100 → 90 → 81（不是 80）
        assert!((result.output_weight - 81.0).abs() < 1e-9);
        assert!((result.process_losses[1].loss_weight - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_skipped_stage_is_reported_with_zero_loss() {
        let chain = YieldLossChain::new();
        let selection = ProcessStageSelection::all().with_stage(ProcessStage::Baking, false);
        let result = chain.forward(1000.0, &bread_rates(), &selection).value.unwrap();
        let baking = &result.process_losses[4];
        assert_eq!(baking.stage, ProcessStage::Baking);
        assert!(!baking.active);
        assert_eq!(baking.loss_weight, 0.0);
        assert_eq!(baking.loss_percent, 0.0);
    }

    #[test]
    fn test_no_active_stage_is_identity() {
        let chain = YieldLossChain::new();
        let result = chain
            .forward(750.0, &bread_rates(), &ProcessStageSelection::none())
            .value
            .unwrap();
        assert_eq!(result.output_weight, 750.0);
        assert_eq!(result.total_loss_percent, 0.0);
        assert_eq!(chain.aggregate_multiplier(&bread_rates(), &ProcessStageSelection::none()), 1.0);
    }

    #[test]
    fn test_forward_rejects_non_positive_input() {
        let chain = YieldLossChain::new();
        let checked = chain.forward(0.0, &bread_rates(), &ProcessStageSelection::all());
        assert!(checked.value.is_none());
        assert!(checked.has_warnings());
    }

    #[test]
    fn test_reverse_guard_zero_multiplier() {
        let chain = YieldLossChain::new();
        let rates = StageLossRates {
            baking: 100.0,
            ..StageLossRates::default()
        };
        let checked = chain.reverse(800.0, &rates, &ProcessStageSelection::all());
        assert_eq!(checked.value.required_input, 0.0);
        assert!(checked.issues.contains(&EngineIssue::ZeroYieldMultiplier));
    }

    #[test]
    fn test_sanitize_rates_clamps() {
        let chain = YieldLossChain::new();
        let rates = StageLossRates {
            mixing: -3.0,
            baking: 140.0,
            ..StageLossRates::default()
        };
        let checked = chain.sanitize_rates(&rates);
        assert_eq!(checked.value.mixing, 0.0);
        assert_eq!(checked.value.baking, 100.0);
        assert_eq!(checked.issues.len(), 2);
    }

    #[test]
    fn test_environment_factor() {
        let chain = YieldLossChain::new();
        assert_eq!(chain.environment_factor(&YieldEnvironment::default()), 1.0);
        assert_eq!(chain.environment_factor(&YieldEnvironment::new(60.0, 25.0)), 1.0);

        // 湿度 40%: 1 + 20 × 0.005 = 1.1；室温 30°C: × 1.05
        let dry_warm = chain.environment_factor(&YieldEnvironment::new(40.0, 30.0));
        assert!((dry_warm - 1.155).abs() < 1e-9);

        // 只给湿度
        let humid = YieldEnvironment {
            humidity_pct: Some(80.0),
            temperature_c: None,
        };
        assert!((chain.environment_factor(&humid) - 0.9).abs() < 1e-9);

        // 极端值被限制
        assert_eq!(chain.environment_factor(&YieldEnvironment::new(0.0, 60.0)), 1.3);
        assert_eq!(chain.environment_factor(&YieldEnvironment::new(100.0, 0.0)), 0.8);
    }

    #[test]
    fn test_environment_only_scales_baking() {
        let chain = YieldLossChain::new();
        let adjusted = chain.apply_environment(&bread_rates(), &YieldEnvironment::new(40.0, 25.0));
        assert!((adjusted.baking - 13.2).abs() < 1e-9);
        assert_eq!(adjusted.mixing, 1.0);
        assert_eq!(adjusted.cooling, 2.0);
    }

    #[test]
    fn test_forward_in_environment_adds_context_tips() {
        let chain = YieldLossChain::new();
        let table = LossRateTable::builtin();
        let env = YieldEnvironment::new(40.0, 32.0);
        let checked = chain.forward_in_environment(
            1000.0,
            &table,
            Some("bread"),
            Some("baguette"),
            &ProcessStageSelection::all(),
            Some(&env),
        );
        let result = checked.value.unwrap();
        let plain = chain
            .forward_with_table(1000.0, &table, Some("bread"), Some("baguette"), &ProcessStageSelection::all())
            .value
            .unwrap();

        // 干燥高温环境烘烤失重更大
        assert!(result.output_weight < plain.output_weight);
        assert!(result.process_losses[4].loss_percent > plain.process_losses[4].loss_percent);
        assert!(result.tips.iter().any(|t| t == "分割时刮板撒粉"));
        assert!(result.tips.iter().any(|t| t.contains("蒸汽烘烤")));
        assert!(result.tips.iter().any(|t| t.starts_with("环境干燥")));
        assert!(result.tips.iter().any(|t| t.starts_with("高温环境")));
        assert!(!plain.tips.iter().any(|t| t.starts_with("环境")));
    }

    #[test]
    fn test_round_trip_for_partial_selection() {
        let chain = YieldLossChain::new();
        let selection = ProcessStageSelection::none()
            .with_stage(ProcessStage::Fermentation, true)
            .with_stage(ProcessStage::Baking, true);
        let forward = chain.forward(1234.5, &bread_rates(), &selection).value.unwrap();
        let reverse = chain.reverse(forward.output_weight, &bread_rates(), &selection);
        assert!((reverse.value.required_input - 1234.5).abs() / 1234.5 < 1e-6);
    }
}
