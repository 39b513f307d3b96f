// ==========================================
// ESBoost 排放配额系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、输入输出结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod permit;
pub mod permit_record;
pub mod types;

// 重导出核心类型
pub use permit::{
    PermitInventoryInput, PermitsCalculationResult, PermitsError, PermitsStatus,
    DEFAULT_TARGET_BUFFER_MONTHS, DEFAULT_WARNING_THRESHOLD_PCT, MAX_RECOMMENDATIONS,
    PERMIT_UNIT_CAPACITY_T,
};
pub use permit_record::PermitRecord;
pub use types::StatusLight;
