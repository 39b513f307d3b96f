// ==========================================
// ESBoost 排放配额系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: EU ETS 配额余量与合规状态计算
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 配额计算规则
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 命令行计算入口
pub mod cli;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    PermitInventoryInput, PermitRecord, PermitsCalculationResult, PermitsError, PermitsStatus,
    StatusLight, PERMIT_UNIT_CAPACITY_T,
};

pub use engine::{calculate_permits_status, format_number, format_years, status_label, PermitsEngine};

pub use api::{ApiError, ApiResult, PermitsApi, PermitsStatusQuery, PermitsStatusView};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "ESBoost Permits";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
