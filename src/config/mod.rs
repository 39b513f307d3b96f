// ==========================================
// ESBoost 排放配额系统 - 配置层
// ==========================================
// 职责: 配额计算默认参数与界面语言
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, PermitsDefaults, DEFAULT_CONSUMPTION_T_PER_MONTH};
