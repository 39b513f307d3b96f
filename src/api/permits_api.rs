// ==========================================
// ESBoost 排放配额系统 - 配额 API
// ==========================================
// 职责: 配额登记维护、配额状态查询
// 流程: 登记 -> 补齐默认参数 -> 引擎计算 -> 状态文案
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::permit::{PermitInventoryInput, PermitsStatus};
use crate::domain::permit_record::PermitRecord;
use crate::engine::format::status_label;
use crate::engine::permits::PermitsEngine;
use crate::repository::permit_record_repo::PermitRecordRepository;

/// 可登记的年度范围 (EU ETS 自 2005 年起)
const MIN_PERMIT_YEAR: i32 = 2005;
const MAX_PERMIT_YEAR: i32 = 2100;

// ==========================================
// 请求 / 响应 DTO
// ==========================================

/// 配额状态查询参数, 未提供的项取配置默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermitsStatusQuery {
    #[serde(default)]
    pub avg_consumption_rate_t_per_month: Option<f64>,
    #[serde(default)]
    pub cumulative_emissions_t: Option<f64>,
    #[serde(default)]
    pub target_buffer_months: Option<f64>,
    #[serde(default)]
    pub warning_threshold_pct: Option<f64>,
}

/// 配额状态视图 (供看板卡片渲染)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitsStatusView {
    pub record: PermitRecord,
    pub status: PermitsStatus,
    /// 仅有效结果带状态文案
    pub status_label: Option<String>,
    /// 已消耗比例是否达到预警阈值
    pub threshold_alert: bool,
    pub warning_threshold_pct: f64,
    pub locale: String,
}

// ==========================================
// PermitsApi - 配额 API
// ==========================================
pub struct PermitsApi {
    record_repo: Arc<PermitRecordRepository>,
    config: Arc<ConfigManager>,
}

impl PermitsApi {
    /// 创建新的PermitsApi实例
    pub fn new(record_repo: Arc<PermitRecordRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            record_repo,
            config,
        }
    }

    /// 保存配额登记 (同年度覆盖)
    ///
    /// # 返回
    /// - Ok(PermitRecord): 落库后的记录
    /// - Err(ApiError): 输入非法或数据库错误
    pub fn save_permit_record(
        &self,
        user_id: &str,
        permit_year: i32,
        active_permits: u32,
        company_name: &str,
        notes: Option<String>,
    ) -> ApiResult<PermitRecord> {
        validate_user_id(user_id)?;
        validate_permit_year(permit_year)?;
        if company_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("公司名称不能为空".to_string()));
        }

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let record = PermitRecord::new(
            user_id.trim(),
            permit_year,
            active_permits,
            company_name.trim(),
            notes,
        );

        let saved = self.record_repo.upsert(&record)?;
        info!(
            user_id = %saved.user_id,
            permit_year = saved.permit_year,
            active_permits = saved.active_permits,
            "配额登记已保存"
        );
        Ok(saved)
    }

    /// 查询指定年度的配额登记
    pub fn get_permit_record(&self, user_id: &str, permit_year: i32) -> ApiResult<Option<PermitRecord>> {
        validate_user_id(user_id)?;
        Ok(self.record_repo.find_by_user_and_year(user_id.trim(), permit_year)?)
    }

    /// 查询用户全部配额登记 (年度倒序)
    pub fn list_permit_records(&self, user_id: &str) -> ApiResult<Vec<PermitRecord>> {
        validate_user_id(user_id)?;
        Ok(self.record_repo.list_by_user(user_id.trim())?)
    }

    /// 删除配额登记
    pub fn delete_permit_record(&self, user_id: &str, permit_year: i32) -> ApiResult<()> {
        validate_user_id(user_id)?;
        if !self.record_repo.delete(user_id.trim(), permit_year)? {
            return Err(ApiError::NotFound(format!(
                "配额登记(user_id={}, permit_year={})不存在",
                user_id, permit_year
            )));
        }
        info!(user_id = user_id, permit_year = permit_year, "配额登记已删除");
        Ok(())
    }

    /// 查询配额状态
    ///
    /// 输入无效 (如月均排放 <= 0) 时返回 Ok, 由 `status.is_valid` 表达
    ///
    /// # 参数
    /// - user_id: 用户ID
    /// - permit_year: 配额年度; None 取最新年度
    /// - query: 计算参数
    pub fn get_permits_status(
        &self,
        user_id: &str,
        permit_year: Option<i32>,
        query: &PermitsStatusQuery,
    ) -> ApiResult<PermitsStatusView> {
        validate_user_id(user_id)?;
        let user_id = user_id.trim();

        let record = match permit_year {
            Some(year) => self.record_repo.find_by_user_and_year(user_id, year)?,
            None => self.record_repo.find_latest_by_user(user_id)?,
        }
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "配额登记(user_id={}, permit_year={})不存在",
                user_id,
                permit_year.map_or_else(|| "latest".to_string(), |y| y.to_string())
            ))
        })?;

        let defaults = self
            .config
            .get_permits_defaults()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let warning_threshold_pct = query
            .warning_threshold_pct
            .unwrap_or(defaults.warning_threshold_pct);
        let input = PermitInventoryInput {
            active_permits: Some(record.active_permits),
            avg_consumption_rate_t_per_month: Some(
                query
                    .avg_consumption_rate_t_per_month
                    .unwrap_or(defaults.avg_consumption_rate_t_per_month),
            ),
            target_buffer_months: Some(
                query
                    .target_buffer_months
                    .unwrap_or(defaults.target_buffer_months),
            ),
            warning_threshold_pct: Some(warning_threshold_pct),
            cumulative_emissions_t: query.cumulative_emissions_t,
        };

        let engine = PermitsEngine::with_locale(&defaults.locale);
        let status = engine.calculate_permits_status(&input);

        let label = status
            .data
            .as_ref()
            .map(|d| status_label(d.status_light, d.years_remaining, engine.locale()));
        let threshold_alert = status
            .data
            .as_ref()
            .map(|d| d.exceeds_warning_threshold(warning_threshold_pct))
            .unwrap_or(false);

        Ok(PermitsStatusView {
            record,
            status,
            status_label: label,
            threshold_alert,
            warning_threshold_pct,
            locale: engine.locale().to_string(),
        })
    }
}

// ==========================================
// 输入校验
// ==========================================

fn validate_user_id(user_id: &str) -> ApiResult<()> {
    if user_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("用户ID不能为空".to_string()));
    }
    Ok(())
}

fn validate_permit_year(permit_year: i32) -> ApiResult<()> {
    if !(MIN_PERMIT_YEAR..=MAX_PERMIT_YEAR).contains(&permit_year) {
        return Err(ApiError::InvalidInput(format!(
            "配额年度超出范围: {} (允许 {}~{})",
            permit_year, MIN_PERMIT_YEAR, MAX_PERMIT_YEAR
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_permit_year() {
        assert!(validate_permit_year(2005).is_ok());
        assert!(validate_permit_year(2100).is_ok());
        assert!(matches!(validate_permit_year(2004), Err(ApiError::InvalidInput(_))));
        assert!(matches!(validate_permit_year(2101), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("u1").is_ok());
        assert!(matches!(validate_user_id("  "), Err(ApiError::InvalidInput(_))));
    }
}
