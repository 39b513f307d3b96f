// ==========================================
// ESBoost 排放配额系统 - 引擎层
// ==========================================
// 职责: 实现配额计算规则,不拼 SQL
// 红线: Engine 不拼 SQL, 无 I/O
// ==========================================

pub mod format;
pub mod permits;

// 重导出核心引擎
pub use format::{format_number, format_years, status_label};
pub use permits::{calculate_permits_status, PermitsEngine};
