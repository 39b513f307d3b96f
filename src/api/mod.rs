// ==========================================
// ESBoost 排放配额系统 - API 层
// ==========================================
// 职责: 组合仓储、配置与引擎, 对外提供业务接口
// ==========================================

pub mod error;
pub mod permits_api;

pub use error::{ApiError, ApiResult};
pub use permits_api::{PermitsApi, PermitsStatusQuery, PermitsStatusView};
