// ==========================================
// ESBoost 排放配额系统 - 配额余量引擎
// ==========================================
// 职责: 配额余量 / 状态灯 / 缓冲缺口 / 建议
// 输入: PermitInventoryInput
// 输出: PermitsStatus (无效输入以结果返回, 不 panic)
// ==========================================
// 红线: 纯函数, 无 I/O, 不修改输入
// ==========================================

use crate::domain::permit::{
    PermitInventoryInput, PermitsCalculationResult, PermitsError, PermitsStatus,
    DEFAULT_TARGET_BUFFER_MONTHS, DEFAULT_WARNING_THRESHOLD_PCT, MAX_RECOMMENDATIONS,
    PERMIT_UNIT_CAPACITY_T,
};
use crate::domain::types::StatusLight;
use crate::engine::format::{format_months, format_number};
use crate::i18n::{normalize_locale, t_in, t_with_args_in, DEFAULT_LOCALE};
use tracing::{debug, warn};

/// 绿灯下限 (月, 严格大于)
const GREEN_MIN_MONTHS: f64 = 24.0;

/// 黄灯下限 (月, 严格大于)
const YELLOW_MIN_MONTHS: f64 = 12.0;

/// 绿灯下追加长期投资建议的年数 (严格大于)
const LONG_TERM_MIN_YEARS: f64 = 5.0;

// ==========================================
// 校验后的输入 (默认值已补齐)
// ==========================================
#[derive(Debug, Clone, Copy)]
struct ValidatedInput {
    active_permits: u32,
    avg_consumption_rate_t_per_month: f64,
    target_buffer_months: f64,
    warning_threshold_pct: f64,
    cumulative_emissions_t: Option<f64>,
}

// ==========================================
// PermitsEngine - 配额余量引擎
// ==========================================
pub struct PermitsEngine {
    // 输出文案的语言; 引擎本身无状态
    locale: &'static str,
}

impl PermitsEngine {
    /// 构造函数 (英文输出)
    pub fn new() -> Self {
        Self {
            locale: DEFAULT_LOCALE,
        }
    }

    /// 指定输出语言, 不支持的语言回退到英文
    pub fn with_locale(locale: &str) -> Self {
        Self {
            locale: normalize_locale(locale),
        }
    }

    pub fn locale(&self) -> &str {
        self.locale
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算配额状态
    ///
    /// # 参数
    /// - `input`: 配额库存输入
    ///
    /// # 返回
    /// - 有效: `is_valid = true`, 带 data 与最多 3 条建议
    /// - 无效: `is_valid = false`, 带错误文案, 建议为空
    pub fn calculate_permits_status(&self, input: &PermitInventoryInput) -> PermitsStatus {
        let validated = match Self::validate(input) {
            Ok(v) => v,
            Err(err) => {
                warn!(
                    error = ?err,
                    active_permits = ?input.active_permits,
                    avg_consumption = ?input.avg_consumption_rate_t_per_month,
                    "配额输入校验失败"
                );
                return PermitsStatus::invalid(err, t_in(self.locale, err.message_key()));
            }
        };

        let data = Self::compute(&validated);
        let recommendations = self.build_recommendations(&validated, &data);

        debug!(
            active_permits = validated.active_permits,
            months_remaining = data.months_remaining,
            status_light = %data.status_light,
            needed_permits_for_buffer = data.needed_permits_for_buffer,
            recommendations = recommendations.len(),
            "配额状态计算完成"
        );

        PermitsStatus::valid(data, recommendations)
    }

    // ==========================================
    // 输入校验
    // ==========================================

    /// 校验必填字段并补齐默认值
    fn validate(input: &PermitInventoryInput) -> Result<ValidatedInput, PermitsError> {
        let (active_permits, avg_consumption_rate_t_per_month) =
            match (input.active_permits, input.avg_consumption_rate_t_per_month) {
                (Some(permits), Some(rate)) => (permits, rate),
                _ => return Err(PermitsError::MissingRequiredField),
            };

        // NaN 同样视为非正
        if !(avg_consumption_rate_t_per_month > 0.0) {
            return Err(PermitsError::InvalidConsumptionRate);
        }

        Ok(ValidatedInput {
            active_permits,
            avg_consumption_rate_t_per_month,
            target_buffer_months: input
                .target_buffer_months
                .unwrap_or(DEFAULT_TARGET_BUFFER_MONTHS),
            warning_threshold_pct: input
                .warning_threshold_pct
                .unwrap_or(DEFAULT_WARNING_THRESHOLD_PCT),
            cumulative_emissions_t: input.cumulative_emissions_t,
        })
    }

    // ==========================================
    // 指标计算
    // ==========================================

    fn compute(input: &ValidatedInput) -> PermitsCalculationResult {
        let total_capacity_t = f64::from(input.active_permits) * PERMIT_UNIT_CAPACITY_T;
        let months_remaining = total_capacity_t / input.avg_consumption_rate_t_per_month;
        let years_remaining = months_remaining / 12.0;

        let status_light = Self::classify_status(input.active_permits, months_remaining);

        let consumed_pct = input
            .cumulative_emissions_t
            .map(|emissions_t| Self::consumed_pct(emissions_t, total_capacity_t));

        let needed_permits_for_buffer = Self::needed_permits_for_buffer(
            input.avg_consumption_rate_t_per_month,
            months_remaining,
            total_capacity_t,
            input.target_buffer_months,
        );
        let months_to_buffer = Self::months_to_buffer(months_remaining, input.target_buffer_months);

        PermitsCalculationResult {
            total_capacity_t,
            months_remaining,
            years_remaining,
            status_light,
            consumed_pct,
            needed_permits_for_buffer,
            months_to_buffer,
        }
    }

    /// 状态灯判定
    ///
    /// 规则 (按顺序):
    /// - 无配额: RED (不看余量)
    /// - 余量 > 24 月: GREEN
    /// - 余量 > 12 月: YELLOW
    /// - 其他: RED
    fn classify_status(active_permits: u32, months_remaining: f64) -> StatusLight {
        if active_permits == 0 {
            StatusLight::Red
        } else if months_remaining > GREEN_MIN_MONTHS {
            StatusLight::Green
        } else if months_remaining > YELLOW_MIN_MONTHS {
            StatusLight::Yellow
        } else {
            StatusLight::Red
        }
    }

    /// 已消耗比例 (%)
    ///
    /// 容量为 0 时: 有排放记为 +∞, 无排放记为 0
    fn consumed_pct(cumulative_emissions_t: f64, total_capacity_t: f64) -> f64 {
        if total_capacity_t > 0.0 {
            cumulative_emissions_t / total_capacity_t * 100.0
        } else if cumulative_emissions_t > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    /// 达到目标缓冲期还需追加的整数配额
    fn needed_permits_for_buffer(
        avg_consumption_rate_t_per_month: f64,
        months_remaining: f64,
        total_capacity_t: f64,
        target_buffer_months: f64,
    ) -> u64 {
        let total_needed_capacity =
            avg_consumption_rate_t_per_month * (months_remaining + target_buffer_months);
        let shortfall_permits =
            ((total_needed_capacity - total_capacity_t) / PERMIT_UNIT_CAPACITY_T).ceil();
        // `as` 对超过 u64::MAX 的值饱和, NaN 记为 0
        shortfall_permits.max(0.0) as u64
    }

    /// 距缓冲目标的月数
    ///
    /// 公式沿用既有口径: buffer - (remaining - buffer), 即 2*buffer - remaining,
    /// 余量很小时会超过 buffer 本身
    fn months_to_buffer(months_remaining: f64, target_buffer_months: f64) -> f64 {
        (target_buffer_months - (months_remaining - target_buffer_months)).max(0.0)
    }

    // ==========================================
    // 建议生成
    // ==========================================

    /// 生成建议 (最多 3 条, 顺序有意义)
    fn build_recommendations(
        &self,
        input: &ValidatedInput,
        data: &PermitsCalculationResult,
    ) -> Vec<String> {
        // 无配额: 固定两条, 提前返回
        if input.active_permits == 0 {
            return vec![
                self.message("permits.recommendation.no_permits_procure"),
                self.message("permits.recommendation.no_permits_contact"),
            ];
        }

        let permits = data.needed_permits_for_buffer.to_string();
        let buffer_months = format_months(input.target_buffer_months);
        let mut recommendations = Vec::with_capacity(MAX_RECOMMENDATIONS);

        match data.status_light {
            StatusLight::Red => {
                if data.needed_permits_for_buffer > 0 {
                    recommendations.push(self.message_with_args(
                        "permits.recommendation.red_buffer_purchase",
                        &[("permits", &permits), ("months", &buffer_months)],
                    ));
                }
                recommendations.push(self.message("permits.recommendation.red_reduce_emissions"));
                if recommendations.len() < MAX_RECOMMENDATIONS {
                    recommendations
                        .push(self.message("permits.recommendation.red_review_consumption"));
                }
            }
            StatusLight::Yellow => {
                if data.needed_permits_for_buffer > 0 {
                    recommendations.push(self.message_with_args(
                        "permits.recommendation.yellow_buffer_scenario",
                        &[("permits", &permits), ("months", &buffer_months)],
                    ));
                }
                recommendations.push(self.message("permits.recommendation.yellow_evaluate"));
                if recommendations.len() < MAX_RECOMMENDATIONS {
                    let threshold = format_number(input.warning_threshold_pct);
                    recommendations.push(self.message_with_args(
                        "permits.recommendation.yellow_threshold_alert",
                        &[("threshold", &threshold)],
                    ));
                }
            }
            StatusLight::Green => {
                recommendations.push(self.message("permits.recommendation.green_quarterly_review"));
                recommendations.push(self.message("permits.recommendation.green_banking"));
                if data.years_remaining > LONG_TERM_MIN_YEARS {
                    recommendations.push(self.message("permits.recommendation.green_long_term"));
                }
            }
        }

        recommendations.truncate(MAX_RECOMMENDATIONS);
        recommendations
    }

    fn message(&self, key: &str) -> String {
        t_in(self.locale, key)
    }

    fn message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        t_with_args_in(self.locale, key, args)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for PermitsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 以默认语言计算配额状态
pub fn calculate_permits_status(input: &PermitInventoryInput) -> PermitsStatus {
    PermitsEngine::new().calculate_permits_status(input)
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn valid(input: &PermitInventoryInput) -> (PermitsCalculationResult, Vec<String>) {
        let status = PermitsEngine::new().calculate_permits_status(input);
        assert!(status.is_valid, "expected valid status, got {:?}", status.error);
        status.into_result().unwrap()
    }

    #[test]
    fn test_classify_status_boundaries() {
        assert_eq!(PermitsEngine::classify_status(1, 24.0000001), StatusLight::Green);
        assert_eq!(PermitsEngine::classify_status(1, 24.0), StatusLight::Yellow);
        assert_eq!(PermitsEngine::classify_status(1, 12.0000001), StatusLight::Yellow);
        assert_eq!(PermitsEngine::classify_status(1, 12.0), StatusLight::Red);
        assert_eq!(PermitsEngine::classify_status(1, 0.5), StatusLight::Red);
    }

    #[test]
    fn test_classify_status_zero_permits_overrides_runway() {
        assert_eq!(PermitsEngine::classify_status(0, 1000.0), StatusLight::Red);
    }

    #[test]
    fn test_needed_permits_for_buffer() {
        // 10000 * (200 + 12) - 2,000,000 = 120,000 -> 1.2 -> 2
        assert_eq!(
            PermitsEngine::needed_permits_for_buffer(10_000.0, 200.0, 2_000_000.0, 12.0),
            2
        );
        // 缓冲为 0 时无缺口
        assert_eq!(
            PermitsEngine::needed_permits_for_buffer(10_000.0, 10.0, 100_000.0, 0.0),
            0
        );
        // 负缓冲不会产生负数
        assert_eq!(
            PermitsEngine::needed_permits_for_buffer(10_000.0, 10.0, 100_000.0, -24.0),
            0
        );
    }

    #[test]
    fn test_months_to_buffer_quirky_formula() {
        // 2 * 12 - 10 = 14, 大于 buffer 本身
        assert!((PermitsEngine::months_to_buffer(10.0, 12.0) - 14.0).abs() < EPS);
        assert!((PermitsEngine::months_to_buffer(0.0, 12.0) - 24.0).abs() < EPS);
        assert!((PermitsEngine::months_to_buffer(15.625, 12.0) - 8.375).abs() < EPS);
        assert_eq!(PermitsEngine::months_to_buffer(200.0, 12.0), 0.0);
    }

    #[test]
    fn test_consumed_pct_zero_capacity() {
        assert_eq!(PermitsEngine::consumed_pct(0.0, 0.0), 0.0);
        assert!(PermitsEngine::consumed_pct(10.0, 0.0).is_infinite());
        assert!((PermitsEngine::consumed_pct(250_000.0, 500_000.0) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_missing_active_permits() {
        let input = PermitInventoryInput {
            avg_consumption_rate_t_per_month: Some(1000.0),
            ..Default::default()
        };
        let status = PermitsEngine::new().calculate_permits_status(&input);
        assert!(!status.is_valid);
        assert!(status.data.is_none());
        assert!(status.recommendations.is_empty());
        assert_eq!(status.error_kind, Some(PermitsError::MissingRequiredField));
        assert_eq!(
            status.error.as_deref(),
            Some("Insufficient data to calculate permit validity. Please provide active_permits and avg_consumption_rate_t_per_month.")
        );
    }

    #[test]
    fn test_missing_check_precedes_rate_check() {
        let input = PermitInventoryInput {
            avg_consumption_rate_t_per_month: Some(0.0),
            ..Default::default()
        };
        let status = PermitsEngine::new().calculate_permits_status(&input);
        assert_eq!(status.error_kind, Some(PermitsError::MissingRequiredField));
    }

    #[test]
    fn test_non_positive_and_nan_rate() {
        for rate in [0.0, -5.0, f64::NAN] {
            let status =
                PermitsEngine::new().calculate_permits_status(&PermitInventoryInput::new(1, rate));
            assert!(!status.is_valid);
            assert_eq!(status.error_kind, Some(PermitsError::InvalidConsumptionRate));
            assert_eq!(
                status.error.as_deref(),
                Some("Average consumption must be > 0 tCO₂/month.")
            );
        }
    }

    #[test]
    fn test_defaults_applied() {
        let (data, recs) = valid(&PermitInventoryInput::new(5, 32_000.0));
        // 默认 buffer = 12
        assert_eq!(data.needed_permits_for_buffer, 4);
        assert!((data.months_to_buffer - 8.375).abs() < EPS);
        // 默认阈值 = 80
        assert!(recs[2].contains("80%"));
    }

    #[test]
    fn test_red_with_buffer_purchase() {
        let (data, recs) = valid(&PermitInventoryInput::new(1, 10_000.0));
        assert_eq!(data.status_light, StatusLight::Red);
        assert_eq!(data.needed_permits_for_buffer, 2);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains('2'));
        assert!(recs[0].contains("12-month"));
        assert_eq!(
            recs[1],
            "Implement immediate emission reduction measures to extend permit coverage."
        );
        assert_eq!(
            recs[2],
            "Review monthly consumption patterns to identify reduction opportunities."
        );
    }

    #[test]
    fn test_red_without_buffer_purchase() {
        let input = PermitInventoryInput::new(1, 10_000.0).with_target_buffer_months(0.0);
        let (data, recs) = valid(&input);
        assert_eq!(data.status_light, StatusLight::Red);
        assert_eq!(data.needed_permits_for_buffer, 0);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].starts_with("Implement immediate"));
        assert!(recs[1].starts_with("Review monthly"));
    }

    #[test]
    fn test_yellow_without_buffer_purchase() {
        let input = PermitInventoryInput::new(2, 10_000.0)
            .with_target_buffer_months(0.0)
            .with_warning_threshold_pct(75.0);
        let (data, recs) = valid(&input);
        assert_eq!(data.status_light, StatusLight::Yellow);
        assert_eq!(data.needed_permits_for_buffer, 0);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].starts_with("Evaluate emission reduction"));
        assert!(recs[1].contains("75%"));
    }

    #[test]
    fn test_green_short_runway_has_two_recommendations() {
        let (data, recs) = valid(&PermitInventoryInput::new(3, 10_000.0));
        assert_eq!(data.status_light, StatusLight::Green);
        assert!((data.years_remaining - 2.5).abs() < EPS);
        assert_eq!(
            recs,
            vec![
                "Continue quarterly review of permit consumption.".to_string(),
                "Consider banking surplus permits or trading excess allowances.".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_permits_data_still_computed() {
        let (data, recs) = valid(&PermitInventoryInput::new(0, 1000.0));
        assert_eq!(data.total_capacity_t, 0.0);
        assert_eq!(data.months_remaining, 0.0);
        assert_eq!(data.status_light, StatusLight::Red);
        assert_eq!(data.needed_permits_for_buffer, 1);
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_localized_recommendations() {
        let engine = PermitsEngine::with_locale("zh-CN");
        assert_eq!(engine.locale(), "zh-CN");
        let status = engine.calculate_permits_status(&PermitInventoryInput::new(0, 1000.0));
        assert_eq!(status.recommendations[0], "立即采购配额 - 当前没有有效配额。");

        let status = engine.calculate_permits_status(&PermitInventoryInput::new(1, 0.0));
        assert_eq!(status.error.as_deref(), Some("月均排放量必须 > 0 tCO₂/月。"));
    }

    #[test]
    fn test_unsupported_locale_falls_back_to_english() {
        let engine = PermitsEngine::with_locale("fr");
        assert_eq!(engine.locale(), "en");
    }

    #[test]
    fn test_input_not_mutated_and_deterministic() {
        let input = PermitInventoryInput::new(7, 25_000.0).with_cumulative_emissions_t(90_000.0);
        let before = input.clone();
        let engine = PermitsEngine::new();
        let first = engine.calculate_permits_status(&input);
        let second = engine.calculate_permits_status(&input);
        assert_eq!(input, before);
        assert_eq!(first, second);
    }
}
