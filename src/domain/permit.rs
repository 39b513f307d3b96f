// ==========================================
// ESBoost 排放配额系统 - 配额计算输入/输出
// ==========================================
// 职责: 定义配额库存输入、计算结果、校验错误
// 约束: 1 个配额固定代表 100,000 tCO₂ 容量
// ==========================================

use crate::domain::types::StatusLight;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单个配额代表的容量 (tCO₂), 领域常量, 不可配置
pub const PERMIT_UNIT_CAPACITY_T: f64 = 100_000.0;

/// 默认目标缓冲期 (月)
pub const DEFAULT_TARGET_BUFFER_MONTHS: f64 = 12.0;

/// 默认预警阈值 (%)
pub const DEFAULT_WARNING_THRESHOLD_PCT: f64 = 80.0;

/// 建议条数上限
pub const MAX_RECOMMENDATIONS: usize = 3;

// ==========================================
// PermitInventoryInput - 配额库存输入
// ==========================================
/// 调用方提供的配额库存
///
/// `active_permits = None` 表示缺失, 与 `Some(0)` (合法, 无配额) 区分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermitInventoryInput {
    #[serde(default)]
    pub active_permits: Option<u32>,

    #[serde(default)]
    pub avg_consumption_rate_t_per_month: Option<f64>,

    /// 目标缓冲期 (月), 缺省 12
    #[serde(default)]
    pub target_buffer_months: Option<f64>,

    /// 预警阈值 (%), 缺省 80; 只用于建议文案和调用方告警
    #[serde(default)]
    pub warning_threshold_pct: Option<f64>,

    /// 累计排放 (tCO₂)
    #[serde(default)]
    pub cumulative_emissions_t: Option<f64>,
}

impl PermitInventoryInput {
    pub fn new(active_permits: u32, avg_consumption_rate_t_per_month: f64) -> Self {
        Self {
            active_permits: Some(active_permits),
            avg_consumption_rate_t_per_month: Some(avg_consumption_rate_t_per_month),
            ..Self::default()
        }
    }

    pub fn with_target_buffer_months(mut self, months: f64) -> Self {
        self.target_buffer_months = Some(months);
        self
    }

    pub fn with_warning_threshold_pct(mut self, pct: f64) -> Self {
        self.warning_threshold_pct = Some(pct);
        self
    }

    pub fn with_cumulative_emissions_t(mut self, emissions_t: f64) -> Self {
        self.cumulative_emissions_t = Some(emissions_t);
        self
    }
}

// ==========================================
// PermitsCalculationResult - 计算结果
// ==========================================
/// 派生指标, 每次调用重新计算, 不持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitsCalculationResult {
    pub total_capacity_t: f64,
    pub months_remaining: f64,
    pub years_remaining: f64,
    pub status_light: StatusLight,

    /// 仅当输入提供 cumulative_emissions_t 时存在
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_pct: Option<f64>,

    /// 超出 u64 范围的极端输入饱和为 u64::MAX
    pub needed_permits_for_buffer: u64,
    pub months_to_buffer: f64,
}

impl PermitsCalculationResult {
    /// 消耗比例是否达到预警阈值 (调用方告警用)
    ///
    /// 未提供累计排放时恒为 false
    pub fn exceeds_warning_threshold(&self, warning_threshold_pct: f64) -> bool {
        self.consumed_pct
            .map(|pct| pct >= warning_threshold_pct)
            .unwrap_or(false)
    }
}

// ==========================================
// PermitsError - 输入校验错误
// ==========================================
/// 仅有两类输入校验错误, 以结果返回, 不抛出
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitsError {
    #[error("Insufficient data to calculate permit validity. Please provide active_permits and avg_consumption_rate_t_per_month.")]
    MissingRequiredField,

    #[error("Average consumption must be > 0 tCO₂/month.")]
    InvalidConsumptionRate,
}

impl PermitsError {
    /// 对应的 i18n 文案键
    pub fn message_key(&self) -> &'static str {
        match self {
            PermitsError::MissingRequiredField => "permits.error.missing_data",
            PermitsError::InvalidConsumptionRate => "permits.error.invalid_consumption",
        }
    }
}

// ==========================================
// PermitsStatus - 计算结果封装
// ==========================================
/// 调用方必须先检查 `is_valid` 再读取 `data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitsStatus {
    pub is_valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PermitsCalculationResult>,

    /// 本地化后的错误文案
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<PermitsError>,

    pub recommendations: Vec<String>,
}

impl PermitsStatus {
    pub fn valid(data: PermitsCalculationResult, recommendations: Vec<String>) -> Self {
        Self {
            is_valid: true,
            data: Some(data),
            error: None,
            error_kind: None,
            recommendations,
        }
    }

    pub fn invalid(kind: PermitsError, message: String) -> Self {
        Self {
            is_valid: false,
            data: None,
            error: Some(message),
            error_kind: Some(kind),
            recommendations: Vec::new(),
        }
    }

    /// 转为 Result 视图
    pub fn into_result(self) -> Result<(PermitsCalculationResult, Vec<String>), PermitsError> {
        match (self.data, self.error_kind) {
            (Some(data), None) => Ok((data, self.recommendations)),
            (_, Some(kind)) => Err(kind),
            (None, None) => Err(PermitsError::MissingRequiredField),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(consumed_pct: Option<f64>) -> PermitsCalculationResult {
        PermitsCalculationResult {
            total_capacity_t: 500_000.0,
            months_remaining: 15.625,
            years_remaining: 15.625 / 12.0,
            status_light: StatusLight::Yellow,
            consumed_pct,
            needed_permits_for_buffer: 4,
            months_to_buffer: 8.375,
        }
    }

    #[test]
    fn test_input_missing_fields_deserialize_as_none() {
        let input: PermitInventoryInput =
            serde_json::from_str(r#"{"active_permits": 0}"#).unwrap();
        assert_eq!(input.active_permits, Some(0));
        assert_eq!(input.avg_consumption_rate_t_per_month, None);
        assert_eq!(input.target_buffer_months, None);
    }

    #[test]
    fn test_input_builder() {
        let input = PermitInventoryInput::new(5, 32_000.0)
            .with_target_buffer_months(6.0)
            .with_cumulative_emissions_t(100_000.0);
        assert_eq!(input.active_permits, Some(5));
        assert_eq!(input.target_buffer_months, Some(6.0));
        assert_eq!(input.warning_threshold_pct, None);
        assert_eq!(input.cumulative_emissions_t, Some(100_000.0));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PermitsError::MissingRequiredField.to_string(),
            "Insufficient data to calculate permit validity. Please provide active_permits and avg_consumption_rate_t_per_month."
        );
        assert_eq!(
            PermitsError::InvalidConsumptionRate.to_string(),
            "Average consumption must be > 0 tCO₂/month."
        );
    }

    #[test]
    fn test_exceeds_warning_threshold() {
        assert!(sample_result(Some(80.0)).exceeds_warning_threshold(80.0));
        assert!(!sample_result(Some(79.9)).exceeds_warning_threshold(80.0));
        assert!(!sample_result(None).exceeds_warning_threshold(0.0));
    }

    #[test]
    fn test_status_into_result() {
        let ok = PermitsStatus::valid(sample_result(None), vec!["a".to_string()]);
        let (data, recs) = ok.into_result().unwrap();
        assert_eq!(data.total_capacity_t, 500_000.0);
        assert_eq!(recs, vec!["a".to_string()]);

        let err = PermitsStatus::invalid(
            PermitsError::InvalidConsumptionRate,
            PermitsError::InvalidConsumptionRate.to_string(),
        );
        assert!(!err.is_valid);
        assert!(err.recommendations.is_empty());
        assert_eq!(err.into_result().unwrap_err(), PermitsError::InvalidConsumptionRate);
    }

    #[test]
    fn test_invalid_status_serializes_without_data() {
        let status = PermitsStatus::invalid(
            PermitsError::MissingRequiredField,
            PermitsError::MissingRequiredField.to_string(),
        );
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["is_valid"], false);
        assert!(value.get("data").is_none());
        assert_eq!(value["error_kind"], "MISSING_REQUIRED_FIELD");
    }
}
